//----------------------------------------
// Piecewise-constant rate schedules
//----------------------------------------
use std::f64;

use crate::schedule::error::SegmentError;
use crate::schedule::types::Arm;

/// Right-open partition of a time axis with one constant rate per segment.
///
/// Segments are `[start, start + duration)`. Only the final segment may be
/// open-ended (`f64::INFINITY`); past the end of a finite schedule the rate
/// is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseSchedule {
    durations: Vec<f64>,
    rates: Vec<f64>,
}

impl PiecewiseSchedule {
    pub fn new(durations: Vec<f64>, rates: Vec<f64>) -> Result<Self, SegmentError> {
        if durations.len() != rates.len() {
            return Err(SegmentError::LengthMismatch {
                duration_length: durations.len(),
                rate_length: rates.len(),
            });
        }
        if durations.is_empty() {
            return Err(SegmentError::Empty);
        }

        let last = durations.len() - 1;
        for (segment, (&duration, &rate)) in durations.iter().zip(rates.iter()).enumerate() {
            check_duration(segment, duration, last)?;
            check_rate(segment, "rate", rate)?;
        }

        Ok(PiecewiseSchedule { durations, rates })
    }

    /// Enrollment schedules must additionally enroll someone at some point
    pub fn enrollment(durations: Vec<f64>, rates: Vec<f64>) -> Result<Self, SegmentError> {
        let schedule = PiecewiseSchedule::new(durations, rates)?;
        if !schedule.rates.iter().any(|&r| r > 0.) {
            return Err(SegmentError::NoPositiveRate);
        }
        Ok(schedule)
    }

    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    pub fn is_open_ended(&self) -> bool {
        self.durations.last().is_some_and(|d| d.is_infinite())
    }

    /// Time at which the last segment ends (infinite when open-ended)
    pub fn end(&self) -> f64 {
        self.durations.iter().sum()
    }

    /// Finite segment end points, in increasing order
    pub fn breakpoints(&self) -> impl Iterator<Item = f64> + '_ {
        self.durations
            .iter()
            .scan(0., |end, d| {
                *end += d;
                Some(*end)
            })
            .filter(|end| end.is_finite())
    }

    /// Index of the segment containing `t`, if any
    pub fn segment_at(&self, t: f64) -> Option<usize> {
        if t < 0. {
            return None;
        }
        let mut start = 0.;
        for (i, d) in self.durations.iter().enumerate() {
            if t < start + d {
                return Some(i);
            }
            start += d;
        }
        None
    }

    pub fn rate_at(&self, t: f64) -> f64 {
        self.segment_at(t).map_or(0., |i| self.rates[i])
    }

    /// Same partition with every rate multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        PiecewiseSchedule {
            durations: self.durations.clone(),
            rates: self.rates.iter().map(|r| r * factor).collect(),
        }
    }
}

/// Failure, hazard ratio and dropout rates on the time-since-enrollment
/// axis. The final segment always extends indefinitely, whatever duration
/// it was given.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardSchedule {
    durations: Vec<f64>,
    fail_rates: Vec<f64>,
    hrs: Vec<f64>,
    dropout_rates: Vec<f64>,
}

impl HazardSchedule {
    pub fn new(
        durations: Vec<f64>,
        fail_rates: Vec<f64>,
        hrs: Vec<f64>,
        dropout_rates: Vec<f64>,
    ) -> Result<Self, SegmentError> {
        for column_length in [fail_rates.len(), hrs.len(), dropout_rates.len()] {
            if column_length != durations.len() {
                return Err(SegmentError::LengthMismatch {
                    duration_length: durations.len(),
                    rate_length: column_length,
                });
            }
        }
        if durations.is_empty() {
            return Err(SegmentError::Empty);
        }

        let last = durations.len() - 1;
        for segment in 0..durations.len() {
            check_duration(segment, durations[segment], last)?;
            check_rate(segment, "failure rate", fail_rates[segment])?;
            check_rate(segment, "dropout rate", dropout_rates[segment])?;
            let hr = hrs[segment];
            if !(hr.is_finite() && hr > 0.) {
                return Err(SegmentError::NonPositiveHazardRatio { segment, hr });
            }
        }

        let mut durations = durations;
        durations[last] = f64::INFINITY;

        Ok(HazardSchedule {
            durations,
            fail_rates,
            hrs,
            dropout_rates,
        })
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn fail_rates(&self) -> &[f64] {
        &self.fail_rates
    }

    pub fn hrs(&self) -> &[f64] {
        &self.hrs
    }

    pub fn dropout_rates(&self) -> &[f64] {
        &self.dropout_rates
    }

    /// Start points of every segment after the first
    pub fn breakpoints(&self) -> impl Iterator<Item = f64> + '_ {
        self.durations[..self.durations.len() - 1]
            .iter()
            .scan(0., |end, d| {
                *end += d;
                Some(*end)
            })
    }

    /// Index of the segment containing follow-up time `t`; the last segment
    /// absorbs everything past the final breakpoint
    pub fn segment_at(&self, t: f64) -> usize {
        let mut start = 0.;
        for (i, d) in self.durations.iter().enumerate() {
            if t < start + d {
                return i;
            }
            start += d;
        }
        self.durations.len() - 1
    }

    pub fn fail_rate(&self, segment: usize, arm: Arm) -> f64 {
        match arm {
            Arm::Control => self.fail_rates[segment],
            Arm::Experimental => self.fail_rates[segment] * self.hrs[segment],
        }
    }

    pub fn hr(&self, segment: usize) -> f64 {
        self.hrs[segment]
    }

    pub fn dropout_rate(&self, segment: usize) -> f64 {
        self.dropout_rates[segment]
    }
}

fn check_duration(segment: usize, duration: f64, last: usize) -> Result<(), SegmentError> {
    if duration.is_nan() || duration <= 0. {
        return Err(SegmentError::NonPositiveDuration { segment, duration });
    }
    if duration.is_infinite() && segment != last {
        return Err(SegmentError::OpenSegmentNotLast { segment });
    }
    Ok(())
}

fn check_rate(segment: usize, kind: &'static str, value: f64) -> Result<(), SegmentError> {
    if !(value.is_finite() && value >= 0.) {
        return Err(SegmentError::InvalidRate {
            segment,
            kind,
            value,
        });
    }
    Ok(())
}
