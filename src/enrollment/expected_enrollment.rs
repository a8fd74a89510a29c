use crate::enrollment::error::EnrollmentError;
use crate::error::AhrComputeErr;
use crate::schedule::design::TrialDesign;
use crate::schedule::piecewise::PiecewiseSchedule;

/// Given calendar time and an enrollment schedule, computes expected
/// number of patients enrolled
pub fn expected_enrollment(time: f64, enrollment: &PiecewiseSchedule) -> f64 {
    let mut cur_time = 0.;
    let mut cur_n = 0.;

    if time <= 0. {
        return 0.;
    }
    for (cur_duration, cur_rate) in enrollment.durations().iter().zip(enrollment.rates()) {
        if cur_time + cur_duration < time {
            cur_n += cur_duration * cur_rate;
            cur_time += cur_duration;
            continue;
        }
        let remaining_time = time - cur_time;
        cur_n += remaining_time * cur_rate;
        break;
    }
    cur_n
}

/// Expected enrollment summed over every stratum of a design
pub fn expected_enrollment_design(time: f64, design: &TrialDesign) -> f64 {
    design
        .strata()
        .iter()
        .map(|s| expected_enrollment(time, &s.enrollment))
        .sum()
}

/// Given a desired sample size and an enrollment schedule, computes the
/// calendar time at which that many patients are expected to be enrolled
pub fn expected_enrollment_duration(
    n: f64,
    enrollment: &PiecewiseSchedule,
) -> Result<f64, AhrComputeErr> {
    if !(n > 0. && n.is_finite()) {
        return Err(EnrollmentError::BadSampleSize(n).into());
    }
    let mut cur_time = 0.;
    let mut cur_n = 0.;

    for (cur_duration, &cur_rate) in enrollment.durations().iter().zip(enrollment.rates()) {
        if cur_rate == 0. {
            cur_time += cur_duration;
            continue;
        }
        if cur_n + cur_duration * cur_rate < n {
            cur_n += cur_duration * cur_rate;
            cur_time += cur_duration;
            continue;
        }

        let n_still_needed = n - cur_n;
        return Ok(cur_time + n_still_needed / cur_rate);
    }

    Err(EnrollmentError::UnreachableSampleSize {
        n,
        max_enrolled: cur_n,
    }
    .into())
}
