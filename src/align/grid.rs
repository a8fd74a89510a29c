//----------------------------------------
// Common refinement of piecewise schedules
//----------------------------------------
use std::iter;

use itertools::Itertools;
use tracing::trace;

use crate::error::AhrComputeErr;
use crate::events::error::{EventsError, check_duration};
use crate::schedule::piecewise::{HazardSchedule, PiecewiseSchedule};
use crate::settings::ComputeSettings;

/// Ordered breakpoints `0 = t_0 < t_1 < ... < t_K = total_duration` on the
/// follow-up axis. Every schedule the grid was built from is constant on
/// each `(t_{k-1}, t_k]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    points: Vec<f64>,
}

impl Grid {
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn total_duration(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    /// Number of intervals
    pub fn len(&self) -> usize {
        self.points.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn intervals(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().copied().tuple_windows()
    }

    /// Index of the interval containing `t`; interval starts belong to
    /// their own interval and `total_duration` to the last one
    pub fn interval_at(&self, t: f64) -> Option<usize> {
        if t < 0. || t > self.total_duration() {
            return None;
        }
        let after = self.points.partition_point(|&p| p <= t);
        Some((after - 1).min(self.len() - 1))
    }
}

/// Collects breakpoints from schedules on either axis and merges them into
/// a [`Grid`] clipped to `[0, total_duration]`.
///
/// Calendar-time breakpoints `c` land at follow-up time `total_duration - c`:
/// a patient enrolled at calendar time `c` has been followed for that long
/// when the analysis happens.
#[derive(Debug, Clone)]
pub struct GridBuilder {
    total_duration: f64,
    points: Vec<f64>,
}

impl GridBuilder {
    pub fn new(total_duration: f64) -> Self {
        GridBuilder {
            total_duration,
            points: vec![],
        }
    }

    pub fn follow_up_breakpoints(mut self, points: impl IntoIterator<Item = f64>) -> Self {
        self.points.extend(points);
        self
    }

    pub fn calendar_breakpoints(mut self, points: impl IntoIterator<Item = f64>) -> Self {
        let total_duration = self.total_duration;
        self.points
            .extend(points.into_iter().map(|c| total_duration - c));
        self
    }

    pub fn build(self, tol: f64) -> Result<Grid, EventsError> {
        let total_duration = self.total_duration;
        check_duration(total_duration)?;
        if let Some(&bad) = self.points.iter().find(|p| !p.is_finite()) {
            return Err(EventsError::NonFiniteBreakpoint(bad));
        }

        let slack = tol * total_duration.max(1.);
        let interior = self
            .points
            .into_iter()
            .filter(|&p| p > slack && p < total_duration - slack)
            .sorted_by(f64::total_cmp)
            .dedup_by(|a, b| (a - b).abs() <= slack);

        let points: Vec<f64> = iter::once(0.)
            .chain(interior)
            .chain(iter::once(total_duration))
            .collect();
        trace!(total_duration, n_intervals = points.len() - 1, "aligned breakpoints");

        Ok(Grid { points })
    }
}

/// Common refinement of an enrollment schedule (calendar axis), a hazard
/// schedule (follow-up axis) and any extra follow-up breakpoints
pub fn align_breakpoints(
    enrollment: &PiecewiseSchedule,
    hazard: &HazardSchedule,
    total_duration: f64,
    extra_breakpoints: &[f64],
    settings: &ComputeSettings,
) -> Result<Grid, AhrComputeErr> {
    let grid = GridBuilder::new(total_duration)
        .calendar_breakpoints(enrollment.breakpoints())
        .follow_up_breakpoints(hazard.breakpoints())
        .follow_up_breakpoints(extra_breakpoints.iter().copied())
        .build(settings.breakpoint_tol)?;
    Ok(grid)
}
