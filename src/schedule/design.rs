//----------------------------------------
// Validated, stratified trial design
//----------------------------------------
use itertools::Itertools;
use tracing::debug;

use crate::error::AhrComputeErr;
use crate::schedule::error::ScheduleError;
use crate::schedule::piecewise::{HazardSchedule, PiecewiseSchedule};
use crate::schedule::types::{EnrollRate, FailRate, StratumWeight};

const PREVALENCE_SUM_TOL: f64 = 1e-8;

/// Enrollment and hazard schedules for one stratum. Enrollment rates here
/// are already scaled by the stratum's prevalence.
#[derive(Debug, Clone, PartialEq)]
pub struct StratumDesign {
    pub name: String,
    pub enrollment: PiecewiseSchedule,
    pub hazard: HazardSchedule,
}

impl StratumDesign {
    pub fn new(
        name: impl Into<String>,
        enrollment: PiecewiseSchedule,
        hazard: HazardSchedule,
    ) -> Self {
        StratumDesign {
            name: name.into(),
            enrollment,
            hazard,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialDesign {
    strata: Vec<StratumDesign>,
}

impl TrialDesign {
    /// Builds a design from the three input tables. Strata are kept in the
    /// order they first appear in `enroll_rate`.
    ///
    /// Without `weights`, enrollment rows are absolute per-stratum rates.
    /// With `weights`, every stratum needs a prevalence in (0, 1], the
    /// prevalences must sum to 1, and each stratum's enrollment rates are
    /// multiplied by its prevalence.
    pub fn new(
        enroll_rate: &[EnrollRate],
        fail_rate: &[FailRate],
        weights: Option<&[StratumWeight]>,
    ) -> Result<Self, AhrComputeErr> {
        let names: Vec<&str> = enroll_rate
            .iter()
            .map(|row| row.stratum.as_str())
            .unique()
            .collect();
        if names.is_empty() {
            return Err(ScheduleError::NoStrata.into());
        }
        if let Some(orphan) = fail_rate
            .iter()
            .find(|row| !names.contains(&row.stratum.as_str()))
        {
            return Err(ScheduleError::MissingEnrollment(orphan.stratum.clone()).into());
        }

        let prevalences = match weights {
            None => vec![1.; names.len()],
            Some(weights) => check_weights(&names, weights)?,
        };

        let strata = names
            .iter()
            .zip(prevalences)
            .map(|(&name, prevalence)| {
                build_stratum(name, prevalence, enroll_rate, fail_rate)
            })
            .collect::<Result<Vec<_>, AhrComputeErr>>()?;

        debug!(n_strata = strata.len(), weighted = weights.is_some(), "built trial design");
        TrialDesign::from_strata(strata)
    }

    /// Builds a design from already-constructed stratum schedules
    pub fn from_strata(strata: Vec<StratumDesign>) -> Result<Self, AhrComputeErr> {
        if strata.is_empty() {
            return Err(ScheduleError::NoStrata.into());
        }
        if let Some(dup) = strata.iter().map(|s| &s.name).duplicates().next() {
            return Err(ScheduleError::DuplicateStratum(dup.clone()).into());
        }
        Ok(TrialDesign { strata })
    }

    pub fn strata(&self) -> &[StratumDesign] {
        &self.strata
    }

    pub fn into_strata(self) -> Vec<StratumDesign> {
        self.strata
    }

    /// Calendar time at which accrual stops in every stratum (infinite when
    /// any stratum enrolls indefinitely)
    pub fn enrollment_end(&self) -> f64 {
        self.strata
            .iter()
            .map(|s| s.enrollment.end())
            .fold(0., f64::max)
    }

    /// Follow-up breakpoints of every stratum's hazard schedule, sorted
    pub fn hazard_breakpoints(&self) -> Vec<f64> {
        self.strata
            .iter()
            .flat_map(|s| s.hazard.breakpoints())
            .sorted_by(f64::total_cmp)
            .collect()
    }
}

fn check_weights(names: &[&str], weights: &[StratumWeight]) -> Result<Vec<f64>, ScheduleError> {
    if let Some(unknown) = weights
        .iter()
        .find(|w| !names.contains(&w.stratum.as_str()))
    {
        return Err(ScheduleError::UnknownWeightStratum(unknown.stratum.clone()));
    }
    if let Some(dup) = weights.iter().map(|w| &w.stratum).duplicates().next() {
        return Err(ScheduleError::DuplicateStratum(dup.clone()));
    }

    let prevalences = names
        .iter()
        .map(|&name| -> Result<f64, ScheduleError> {
            let weight = weights
                .iter()
                .find(|w| w.stratum == name)
                .ok_or_else(|| ScheduleError::MissingWeight(name.to_string()))?;
            if !(weight.prevalence > 0. && weight.prevalence <= 1.) {
                return Err(ScheduleError::PrevalenceOutOfRange {
                    stratum: name.to_string(),
                    prevalence: weight.prevalence,
                });
            }
            Ok(weight.prevalence)
        })
        .collect::<Result<Vec<f64>, ScheduleError>>()?;

    let total: f64 = prevalences.iter().sum();
    if (total - 1.).abs() > PREVALENCE_SUM_TOL {
        return Err(ScheduleError::PrevalenceSum(total));
    }
    Ok(prevalences)
}

fn build_stratum(
    name: &str,
    prevalence: f64,
    enroll_rate: &[EnrollRate],
    fail_rate: &[FailRate],
) -> Result<StratumDesign, AhrComputeErr> {
    let in_stratum = |source| ScheduleError::InStratum {
        stratum: name.to_string(),
        source,
    };

    let (enroll_durations, enroll_rates): (Vec<f64>, Vec<f64>) = enroll_rate
        .iter()
        .filter(|row| row.stratum == name)
        .map(|row| (row.duration, row.rate * prevalence))
        .unzip();
    let enrollment =
        PiecewiseSchedule::enrollment(enroll_durations, enroll_rates).map_err(in_stratum)?;

    let rows: Vec<&FailRate> = fail_rate.iter().filter(|row| row.stratum == name).collect();
    if rows.is_empty() {
        return Err(ScheduleError::MissingFailRate(name.to_string()).into());
    }
    let hazard = HazardSchedule::new(
        rows.iter().map(|row| row.duration).collect(),
        rows.iter().map(|row| row.fail_rate).collect(),
        rows.iter().map(|row| row.hr).collect(),
        rows.iter().map(|row| row.dropout_rate).collect(),
    )
    .map_err(in_stratum)?;

    Ok(StratumDesign::new(name, enrollment, hazard))
}
