//----------------------------------------
// Analysis cutoff resolution
//----------------------------------------
use tracing::debug;

use crate::ahr::compute_ahr::ahr_at;
use crate::ahr::types::AhrRow;
use crate::cutoff::error::CutoffError;
use crate::cutoff::root_find::root_find_monotonic;
use crate::cutoff::types::CutoffSpec;
use crate::enrollment::error::EnrollmentError;
use crate::error::AhrComputeErr;
use crate::events::error::check_duration;
use crate::schedule::design::TrialDesign;
use crate::settings::ComputeSettings;
use crate::strata::aggregate::{aggregate_strata, asymptotic_events};

/// Total expected events across strata and arms at calendar time `time`;
/// nothing has happened by time zero
pub fn events_at(
    design: &TrialDesign,
    time: f64,
    ratio: f64,
    settings: &ComputeSettings,
) -> Result<f64, AhrComputeErr> {
    if time <= 0. {
        return Ok(0.);
    }
    Ok(aggregate_strata(design, time, ratio, settings)?.total_events())
}

/// Calendar time at which `target_events` are expected. Targets at or above
/// the events expected with unlimited follow-up are rejected up front; the
/// search window then doubles until it brackets the target, at most
/// `settings.max_iterations` times.
pub fn time_to_events(
    design: &TrialDesign,
    target_events: f64,
    ratio: f64,
    settings: &ComputeSettings,
) -> Result<f64, AhrComputeErr> {
    if !(target_events > 0. && target_events.is_finite()) {
        return Err(CutoffError::BadTarget(target_events).into());
    }
    let max_events = asymptotic_events(design, ratio)?;
    if target_events >= max_events {
        return Err(CutoffError::UnreachableTarget {
            target: target_events,
            max_events,
            horizon: f64::INFINITY,
        }
        .into());
    }

    let time = root_find_monotonic(
        |t| events_at(design, t, ratio, settings),
        0.,
        f64::INFINITY,
        target_events,
        settings.root_tol,
        settings.max_iterations,
    )?;
    debug!(target_events, max_events, time, "resolved event-driven cutoff");
    Ok(time)
}

/// Calendar time at which the last enrolled patient has `followup` units of
/// follow-up
pub fn min_followup_time(design: &TrialDesign, followup: f64) -> Result<f64, AhrComputeErr> {
    if !(followup >= 0. && followup.is_finite()) {
        return Err(CutoffError::BadFollowup(followup).into());
    }
    let enrollment_end = design.enrollment_end();
    if !enrollment_end.is_finite() {
        return Err(EnrollmentError::OpenEndedEnrollment.into());
    }
    Ok(enrollment_end + followup)
}

/// Translates a cutoff rule into the total duration the events engine runs to
pub fn resolve_cutoff(
    design: &TrialDesign,
    spec: &CutoffSpec,
    ratio: f64,
    settings: &ComputeSettings,
) -> Result<f64, AhrComputeErr> {
    let time = match *spec {
        CutoffSpec::Duration { duration } => {
            check_duration(duration)?;
            duration
        }
        CutoffSpec::MinFollowup { followup } => min_followup_time(design, followup)?,
        CutoffSpec::Events { events } => time_to_events(design, events, ratio, settings)?,
        CutoffSpec::MaxDurationEvents { duration, events } => {
            check_duration(duration)?;
            duration.max(time_to_events(design, events, ratio, settings)?)
        }
        CutoffSpec::MaxFollowupEvents { followup, events } => min_followup_time(design, followup)?
            .max(time_to_events(design, events, ratio, settings)?),
    };
    // zero follow-up with nothing enrolled yet is still no analysis
    check_duration(time)?;
    debug!(?spec, time, "resolved cutoff");
    Ok(time)
}

/// Time at which `target_events` are expected, with the average hazard ratio
/// and information at that time
pub fn expected_time(
    design: &TrialDesign,
    target_events: f64,
    ratio: f64,
    settings: &ComputeSettings,
) -> Result<AhrRow, AhrComputeErr> {
    let time = time_to_events(design, target_events, ratio, settings)?;
    ahr_at(design, time, ratio, settings)
}

/// Average hazard ratio and information at the time a cutoff rule resolves to
pub fn cutoff_ahr(
    design: &TrialDesign,
    spec: &CutoffSpec,
    ratio: f64,
    settings: &ComputeSettings,
) -> Result<AhrRow, AhrComputeErr> {
    let time = resolve_cutoff(design, spec, ratio, settings)?;
    ahr_at(design, time, ratio, settings)
}
