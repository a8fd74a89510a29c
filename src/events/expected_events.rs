//----------------------------------------
// Expected events engine
//----------------------------------------
use itertools::Itertools;
use tracing::trace;

use crate::align::grid::align_breakpoints;
use crate::enrollment::expected_enrollment::expected_enrollment;
use crate::error::AhrComputeErr;
use crate::events::types::{IntervalEvents, SegmentEvents};
use crate::schedule::piecewise::{HazardSchedule, PiecewiseSchedule};
use crate::schedule::types::Arm;
use crate::settings::ComputeSettings;

/// Expected events and time at risk for one population (one stratum, one
/// arm) at analysis time `total_duration`, one row per interval of the
/// grid aligning enrollment, hazard and `extra_breakpoints`.
///
/// Within an interval of width `w` on the follow-up axis with failure rate
/// `l`, dropout rate `e` and `r = l + e`:
///
/// - patients enrolled before calendar time `total_duration - end` (`G` of
///   them) cross the whole interval, each contributing `Q * h1` time at risk
///   where `h1 = (1 - exp(-r w)) / r`;
/// - patients enrolled during the matching calendar window (rate `g`) stop
///   part way through, contributing `g * Q * h2` with
///   `h2 = (w - h1) / r`.
///
/// `Q` is the probability of being event- and dropout-free at the start of
/// the interval, and expected events are `l` times time at risk.
pub fn expected_events(
    enrollment: &PiecewiseSchedule,
    hazard: &HazardSchedule,
    arm: Arm,
    total_duration: f64,
    extra_breakpoints: &[f64],
    settings: &ComputeSettings,
) -> Result<Vec<IntervalEvents>, AhrComputeErr> {
    let grid = align_breakpoints(
        enrollment,
        hazard,
        total_duration,
        extra_breakpoints,
        settings,
    )?;

    let mut survival = 1.;
    let rows: Vec<IntervalEvents> = grid
        .intervals()
        .map(|(start, end)| {
            let mid = (start + end) / 2.;
            let segment = hazard.segment_at(mid);
            let fail_rate = hazard.fail_rate(segment, arm);
            let dropout_rate = hazard.dropout_rate(segment);
            let (q, h1, h2) = interval_integrals(
                fail_rate + dropout_rate,
                end - start,
                settings.small_rate_threshold,
            );

            let enrolled_before = expected_enrollment(total_duration - end, enrollment);
            let enrollment_rate = enrollment.rate_at(total_duration - mid);
            let time_at_risk = survival * (enrolled_before * h1 + enrollment_rate * h2);

            let row = IntervalEvents {
                start,
                end,
                segment,
                fail_rate,
                dropout_rate,
                hr: hazard.hr(segment),
                enrollment_rate,
                enrolled_before,
                survival,
                events: fail_rate * time_at_risk,
                time_at_risk,
            };
            survival *= q;
            row
        })
        .collect();

    trace!(
        %arm,
        total_duration,
        n_intervals = rows.len(),
        events = rows.iter().map(|r| r.events).sum::<f64>(),
        "computed expected events"
    );
    Ok(rows)
}

/// Survival across an interval of width `width` at total rate `rate`,
/// together with `h1 = int_0^w exp(-rate u) du` and
/// `h2 = int_0^w int_0^v exp(-rate u) du dv`.
///
/// For `rate * width` under `threshold` the integrals use their series
/// expansion; `h2` loses every significant digit to cancellation otherwise.
pub(crate) fn interval_integrals(rate: f64, width: f64, threshold: f64) -> (f64, f64, f64) {
    if rate == 0. {
        return (1., width, width * width / 2.);
    }
    let x = rate * width;
    let q = (-x).exp();
    if x < threshold {
        let h1 = width * (1. - x / 2. + x * x / 6. - x * x * x / 24.);
        let h2 = width * width * (0.5 - x / 6. + x * x / 24. - x * x * x / 120.);
        return (q, h1, h2);
    }
    let h1 = -(-x).exp_m1() / rate;
    let h2 = (width - h1) / rate;
    (q, h1, h2)
}

/// Probability that a patient on `arm` eventually has an event rather than
/// dropping out, `sum_m Q_{m-1} (1 - q_m) l_m / (l_m + e_m)`. The open
/// final segment has `q = 0` unless its combined rate is zero.
pub fn eventual_event_probability(hazard: &HazardSchedule, arm: Arm) -> f64 {
    let mut survival = 1.;
    let mut probability = 0.;
    for (segment, &width) in hazard.durations().iter().enumerate() {
        let fail_rate = hazard.fail_rate(segment, arm);
        let rate = fail_rate + hazard.dropout_rate(segment);
        if rate == 0. {
            continue;
        }
        let leaving = if width.is_infinite() {
            1.
        } else {
            -(-rate * width).exp_m1()
        };
        probability += survival * leaving * fail_rate / rate;
        survival *= 1. - leaving;
    }
    probability
}

/// Sums grid intervals back up to the hazard segments they came from
pub fn collapse_by_segment(rows: &[IntervalEvents]) -> Vec<SegmentEvents> {
    let chunks = rows.iter().chunk_by(|row| row.segment);
    chunks
        .into_iter()
        .filter_map(|(segment, mut chunk)| {
            let first = chunk.next()?;
            let (end, events, time_at_risk) = chunk.fold(
                (first.end, first.events, first.time_at_risk),
                |(_, events, time_at_risk), row| {
                    (row.end, events + row.events, time_at_risk + row.time_at_risk)
                },
            );
            Some(SegmentEvents {
                t: first.start,
                end,
                segment,
                fail_rate: first.fail_rate,
                hr: first.hr,
                events,
                time_at_risk,
            })
        })
        .collect()
}

/// Total expected events for a single population followed until
/// `total_duration`, using the hazard schedule's failure rates as given
pub fn expected_event(
    enrollment: &PiecewiseSchedule,
    hazard: &HazardSchedule,
    total_duration: f64,
    settings: &ComputeSettings,
) -> Result<f64, AhrComputeErr> {
    let rows = expected_events(
        enrollment,
        hazard,
        Arm::Control,
        total_duration,
        &[],
        settings,
    )?;
    Ok(rows.iter().map(|row| row.events).sum())
}

/// Like [`expected_event`], but one row per failure-rate segment
pub fn expected_event_by_segment(
    enrollment: &PiecewiseSchedule,
    hazard: &HazardSchedule,
    total_duration: f64,
    settings: &ComputeSettings,
) -> Result<Vec<SegmentEvents>, AhrComputeErr> {
    let rows = expected_events(
        enrollment,
        hazard,
        Arm::Control,
        total_duration,
        &[],
        settings,
    )?;
    Ok(collapse_by_segment(&rows))
}

#[cfg(test)]
mod tests {

    use std::f64;

    use rstest::rstest;

    use super::*;
    use crate::events::error::EventsError;

    /// Expected events with uniform accrual at `accrual_rate` over
    /// `[accrual_start_time, accrual_end_time]` and analysis at calendar
    /// time `followup_end_time`
    fn expected_events_uniform(
        lambda_event: f64,
        lambda_dropout: f64,
        accrual_rate: f64,
        accrual_start_time: f64,
        accrual_end_time: f64,
        followup_end_time: f64,
    ) -> f64 {
        let lambda_total = lambda_event + lambda_dropout;

        let num_1 = (-lambda_total * (followup_end_time - accrual_end_time)).exp();
        let num_2 = (-lambda_total * (followup_end_time - accrual_start_time)).exp();
        let part_1 = (accrual_end_time - accrual_start_time) - (num_1 - num_2) / lambda_total;
        let part_2 = accrual_rate * lambda_event / lambda_total;

        part_1 * part_2
    }

    fn single_segment(fail_rate: f64, dropout_rate: f64) -> HazardSchedule {
        HazardSchedule::new(vec![1.], vec![fail_rate], vec![1.], vec![dropout_rate])
            .expect("failed to construct hazard schedule")
    }

    fn worked_example() -> (PiecewiseSchedule, HazardSchedule) {
        let enrollment = PiecewiseSchedule::new(vec![1., 1.], vec![3., 2.])
            .expect("failed to construct enrollment schedule");
        let hazard = HazardSchedule::new(
            vec![4., 3.],
            vec![0.03, 0.06],
            vec![1., 1.],
            vec![0.001, 0.002],
        )
        .expect("failed to construct hazard schedule");
        (enrollment, hazard)
    }

    #[rstest]
    #[case(0.036, 0., 8., 22., 38.296)]
    #[case(0.018, 0.00878, 8., 28.25, 44.369)]
    #[case(0.06, 0.00878, 30., 10., 10.)]
    #[case(0.2, 0.05, 3., 5., 4.)]
    #[case(0.001, 0., 12., 6., 9.)]
    fn matches_uniform_accrual_formula(
        #[case] fail_rate: f64,
        #[case] dropout_rate: f64,
        #[case] accrual_rate: f64,
        #[case] accrual_duration: f64,
        #[case] total_duration: f64,
    ) {
        let enrollment = PiecewiseSchedule::new(vec![accrual_duration], vec![accrual_rate])
            .expect("failed to construct enrollment schedule");
        let computed = expected_event(
            &enrollment,
            &single_segment(fail_rate, dropout_rate),
            total_duration,
            &ComputeSettings::default(),
        )
        .expect("failed to compute expected events");
        let reference = expected_events_uniform(
            fail_rate,
            dropout_rate,
            accrual_rate,
            0.,
            accrual_duration.min(total_duration),
            total_duration,
        );
        assert!(
            ((computed - reference) / reference).abs() < 1e-9,
            "computed {computed}, reference {reference}"
        );
    }

    #[test]
    fn uniform_enrollment_two_arms() {
        // 1:1 randomization, no dropout, 88 events at 38.296
        let enrollment = PiecewiseSchedule::new(vec![22.], vec![4.])
            .expect("failed to construct enrollment schedule");
        let hazard = HazardSchedule::new(vec![1.], vec![0.036], vec![0.5], vec![0.])
            .expect("failed to construct hazard schedule");
        let settings = ComputeSettings::default();
        let total: f64 = Arm::BOTH
            .iter()
            .map(|&arm| {
                expected_events(&enrollment, &hazard, arm, 38.296, &[], &settings)
                    .expect("failed to compute expected events")
                    .iter()
                    .map(|row| row.events)
                    .sum::<f64>()
            })
            .sum();
        assert!((total - 88.).abs() < 0.001);
    }

    #[test]
    fn worked_example_by_segment() {
        let (enrollment, hazard) = worked_example();
        let settings = ComputeSettings::default();
        let rows = expected_event_by_segment(&enrollment, &hazard, 7., &settings)
            .expect("failed to compute expected events");

        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].t, rows[0].end), (0., 4.));
        assert_eq!((rows[1].t, rows[1].end), (4., 7.));
        assert_eq!(rows[1].fail_rate, 0.06);
        assert!((rows[0].events - 0.5642910925028182).abs() < 1e-9);
        assert!((rows[1].events - 0.5194820932042783).abs() < 1e-9);

        let total = expected_event(&enrollment, &hazard, 7., &settings)
            .expect("failed to compute expected events");
        assert!((total - 1.0837731857070965).abs() < 1e-9);
        assert!((total - rows.iter().map(|r| r.events).sum::<f64>()).abs() < 1e-12);
    }

    #[test]
    fn worked_example_intervals() {
        let (enrollment, hazard) = worked_example();
        let rows = expected_events(
            &enrollment,
            &hazard,
            Arm::Control,
            7.,
            &[],
            &ComputeSettings::default(),
        )
        .expect("failed to compute expected events");

        let expected = [
            0.5642910925028182,
            0.2569657059717011,
            0.19371324016994565,
            0.06880314706263155,
        ];
        assert_eq!(rows.len(), expected.len());
        for (row, reference) in rows.iter().zip(expected) {
            assert!((row.events - reference).abs() < 1e-10);
            assert!((row.events - row.fail_rate * row.time_at_risk).abs() < 1e-15);
        }
        // everyone enrolled by calendar time 2 is followed past 4
        assert_eq!(rows[0].enrolled_before, 5.);
        assert_eq!(rows[3].enrollment_rate, 3.);
        assert_eq!(rows[0].survival, 1.);
        assert!((rows[1].survival - (-0.031_f64 * 4.).exp()).abs() < 1e-15);
    }

    #[test]
    fn long_followup_loses_events_to_dropout() {
        let enrollment = PiecewiseSchedule::new(vec![10.], vec![8.])
            .expect("failed to construct enrollment schedule");
        let settings = ComputeSettings::default();
        for (fail_rate, dropout_rate, reference) in [(0.1, 0.1, 40.), (0.75, 0.25, 60.), (0.001, 0., 80.)]
        {
            let hazard = single_segment(fail_rate, dropout_rate);
            let total = expected_event(&enrollment, &hazard, 1e5, &settings)
                .expect("failed to compute expected events");
            assert!((total - reference).abs() < 1e-6, "got {total}");
        }
    }

    #[test]
    fn eventual_probability_matches_long_followup() {
        let half = eventual_event_probability(&single_segment(0.1, 0.1), Arm::Control);
        assert!((half - 0.5).abs() < 1e-15);
        assert_eq!(eventual_event_probability(&single_segment(0., 0.3), Arm::Control), 0.);
        assert_eq!(eventual_event_probability(&single_segment(0., 0.), Arm::Control), 0.);

        let (enrollment, hazard) = worked_example();
        let settings = ComputeSettings::default();
        for arm in Arm::BOTH {
            let late: f64 = expected_events(&enrollment, &hazard, arm, 1e5, &[], &settings)
                .expect("failed to compute expected events")
                .iter()
                .map(|row| row.events)
                .sum();
            // five patients enrolled in total
            let limit = 5. * eventual_event_probability(&hazard, arm);
            assert!(((late - limit) / limit).abs() < 1e-10, "late {late}, limit {limit}");
        }
    }

    #[test]
    fn zero_rates_contribute_no_events() {
        let enrollment = PiecewiseSchedule::new(vec![f64::INFINITY], vec![1e6])
            .expect("failed to construct enrollment schedule");
        let rows = expected_events(
            &enrollment,
            &single_segment(0., 0.),
            Arm::Control,
            50.,
            &[],
            &ComputeSettings::default(),
        )
        .expect("failed to compute expected events");
        assert_eq!(rows[0].events, 0.);
        assert_eq!(rows[0].time_at_risk, 1e6 * 50. * 50. / 2.);

        // zero failure with dropout: still no events
        let total = expected_event(
            &enrollment,
            &single_segment(0., 0.3),
            50.,
            &ComputeSettings::default(),
        )
        .expect("failed to compute expected events");
        assert_eq!(total, 0.);
    }

    #[test]
    fn small_rates_approach_zero_rate_limit() {
        let width = 3.;
        let (_, h1_zero, h2_zero) = interval_integrals(0., width, 1e-4);
        for rate in [1e-16, 1e-12, 1e-8, 1e-6] {
            let (q, h1, h2) = interval_integrals(rate, width, 1e-4);
            assert!(q <= 1. && q > 0.);
            assert!(((h1 - h1_zero) / h1_zero).abs() < 1e-5);
            assert!(((h2 - h2_zero) / h2_zero).abs() < 1e-5);
            assert!(h2 > 0. && h2 <= h2_zero);
        }
        // series and direct evaluation agree at the switch-over
        let rate = 1e-4 / width;
        let (_, h1_series, h2_series) = interval_integrals(rate * 0.999_999, width, 1e-4);
        let (_, h1_direct, h2_direct) = interval_integrals(rate * 1.000_001, width, 1e-4);
        assert!(((h1_series - h1_direct) / h1_direct).abs() < 1e-8);
        assert!(((h2_series - h2_direct) / h2_direct).abs() < 1e-8);
    }

    #[test]
    fn tiny_duration_has_no_events() {
        let (enrollment, hazard) = worked_example();
        let total = expected_event(&enrollment, &hazard, 1e-9, &ComputeSettings::default())
            .expect("failed to compute expected events");
        assert!((0. ..1e-15).contains(&total));
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        let (enrollment, hazard) = worked_example();
        let err = expected_event(&enrollment, &hazard, 0., &ComputeSettings::default())
            .unwrap_err();
        assert_eq!(err, AhrComputeErr::from(EventsError::NonPositiveDuration(0.)));
    }

    #[test]
    fn events_never_decrease_with_duration() {
        let (enrollment, hazard) = worked_example();
        let settings = ComputeSettings::default();
        let totals: Vec<f64> = (1..200)
            .map(|i| {
                expected_event(&enrollment, &hazard, i as f64 * 0.1, &settings)
                    .expect("failed to compute expected events")
            })
            .collect();
        assert!(totals.windows(2).all(|w| w[1] > w[0]));
    }
}
