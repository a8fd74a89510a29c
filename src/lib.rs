//----------------------------------------
// Root lib
//----------------------------------------
//! The purpose of this library is to compute expected event counts for
//! time-to-event clinical trials under piecewise-constant enrollment,
//! failure and dropout rates, and to summarize a time-varying treatment
//! effect as an average hazard ratio (AHR) with its statistical
//! information. The outputs feed fixed and group sequential sample size
//! calculations under non-proportional hazards.
//!
//! Data flow: rate tables are validated into a [`TrialDesign`]; for each
//! stratum and arm the events engine integrates the model exactly over the
//! grid aligning enrollment and hazard breakpoints; strata are summed and
//! the per-segment events weight the hazard ratios into the AHR. Cutoff
//! rules based on event counts invert the monotone events-versus-time curve.

/// Average hazard ratio and information
pub mod ahr;
/// Common refinement of piecewise schedules
pub mod align;
/// Analysis cutoff rules
pub mod cutoff;
/// Expected accrual
pub mod enrollment;
/// This module contains the crate error type
pub mod error;
/// Expected events engine
pub mod events;
/// Rate schedules and trial design
pub mod schedule;
pub mod settings;
/// Aggregation over strata and arms
pub mod strata;

pub use crate::ahr::compute_ahr::{ahr, ahr_at, ahr_report, average_hazard_ratio, pw_info};
pub use crate::ahr::types::{AhrOptions, AhrReport, AhrRow, PwInfoRow};
pub use crate::cutoff::resolve::{expected_time, resolve_cutoff};
pub use crate::cutoff::types::CutoffSpec;
pub use crate::error::AhrComputeErr;
pub use crate::events::expected_events::{expected_event, expected_event_by_segment};
pub use crate::schedule::design::{StratumDesign, TrialDesign};
pub use crate::schedule::piecewise::{HazardSchedule, PiecewiseSchedule};
pub use crate::schedule::types::{Arm, EnrollRate, FailRate, StratumWeight};
pub use crate::settings::ComputeSettings;
pub use crate::strata::aggregate::aggregate_strata;
