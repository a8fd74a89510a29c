//----------------------------------------
// Average hazard ratio and information
//----------------------------------------
use rayon::prelude::*;
use tracing::debug;

use crate::ahr::error::AhrError;
use crate::ahr::types::{AhrOptions, AhrReport, AhrRow, PwInfoRow};
use crate::enrollment::expected_enrollment::expected_enrollment_design;
use crate::error::AhrComputeErr;
use crate::events::error::check_durations;
use crate::schedule::design::TrialDesign;
use crate::settings::ComputeSettings;
use crate::strata::aggregate::aggregate_strata;

/// Event-weighted geometric mean of hazard ratios,
/// `exp(sum(events * ln(hr)) / sum(events))`
pub fn average_hazard_ratio<I>(events_and_hrs: I) -> Result<f64, AhrError>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (total_events, weighted_log_hr) = events_and_hrs
        .into_iter()
        .filter(|&(events, _)| events > 0.)
        .fold((0., 0.), |(total, weighted), (events, hr)| {
            (total + events, weighted + events * hr.ln())
        });
    if total_events <= 0. {
        return Err(AhrError::NoExpectedEvents);
    }
    Ok((weighted_log_hr / total_events).exp())
}

/// Null-hypothesis information for `events` log-rank events under an
/// experimental:control allocation `ratio`
pub fn null_information(events: f64, ratio: f64) -> f64 {
    events * ratio / ((1. + ratio) * (1. + ratio))
}

/// Alternative-hypothesis information of one segment,
/// `1 / (1 / control_events + 1 / experimental_events)`; this is the
/// segment's events times the product of the arms' shares of them. Zero
/// when either arm has no events.
pub fn alternative_information(control_events: f64, experimental_events: f64) -> f64 {
    if control_events <= 0. || experimental_events <= 0. {
        return 0.;
    }
    control_events * experimental_events / (control_events + experimental_events)
}

/// Per-stratum, per-hazard-segment events and information at one duration
pub fn pw_info_at(
    design: &TrialDesign,
    time: f64,
    ratio: f64,
    settings: &ComputeSettings,
) -> Result<Vec<PwInfoRow>, AhrComputeErr> {
    let strata_events = aggregate_strata(design, time, ratio, settings)?;
    let rows = strata_events
        .segments
        .iter()
        .map(|segment| PwInfoRow {
            time,
            stratum: segment.stratum.clone(),
            t: segment.t,
            hr: segment.hr,
            events: segment.events(),
            time_at_risk: segment.time_at_risk,
            info: alternative_information(segment.control_events, segment.experimental_events),
            info0: null_information(segment.events(), ratio),
        })
        .collect();
    Ok(rows)
}

/// [`pw_info_at`] for each of a strictly increasing sequence of durations,
/// concatenated in duration order
pub fn pw_info(
    design: &TrialDesign,
    durations: &[f64],
    ratio: f64,
    settings: &ComputeSettings,
) -> Result<Vec<PwInfoRow>, AhrComputeErr> {
    check_durations(durations)?;
    let per_duration = durations
        .par_iter()
        .map(|&time| pw_info_at(design, time, ratio, settings))
        .collect::<Result<Vec<Vec<PwInfoRow>>, AhrComputeErr>>()?;
    Ok(per_duration.into_iter().flatten().collect())
}

/// Collapses detail rows for a single duration into its summary row
pub fn summarize_pw_info(time: f64, rows: &[PwInfoRow], n: f64) -> Result<AhrRow, AhrError> {
    let ahr = average_hazard_ratio(rows.iter().map(|row| (row.events, row.hr)))
        .map_err(|_| AhrError::NoExpectedEventsAt(time))?;
    Ok(AhrRow {
        time,
        ahr,
        events: rows.iter().map(|row| row.events).sum(),
        info: rows.iter().map(|row| row.info).sum(),
        info0: rows.iter().map(|row| row.info0).sum(),
        n,
    })
}

/// Average hazard ratio, expected events and information at one duration
pub fn ahr_at(
    design: &TrialDesign,
    time: f64,
    ratio: f64,
    settings: &ComputeSettings,
) -> Result<AhrRow, AhrComputeErr> {
    let rows = pw_info_at(design, time, ratio, settings)?;
    let summary = summarize_pw_info(time, &rows, expected_enrollment_design(time, design))?;
    debug!(
        time,
        ahr = summary.ahr,
        events = summary.events,
        info = summary.info,
        info0 = summary.info0,
        "computed average hazard ratio"
    );
    Ok(summary)
}

/// One [`AhrRow`] per duration. Durations must be positive and strictly
/// increasing; each is computed independently.
pub fn ahr(
    design: &TrialDesign,
    durations: &[f64],
    ratio: f64,
    settings: &ComputeSettings,
) -> Result<Vec<AhrRow>, AhrComputeErr> {
    check_durations(durations)?;
    durations
        .par_iter()
        .map(|&time| ahr_at(design, time, ratio, settings))
        .collect()
}

/// [`ahr`] or [`pw_info`] depending on `options.simple`
pub fn ahr_report(
    design: &TrialDesign,
    durations: &[f64],
    options: &AhrOptions,
    settings: &ComputeSettings,
) -> Result<AhrReport, AhrComputeErr> {
    if options.simple {
        ahr(design, durations, options.ratio, settings).map(AhrReport::Summary)
    } else {
        pw_info(design, durations, options.ratio, settings).map(AhrReport::Detail)
    }
}
