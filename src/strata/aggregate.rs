//----------------------------------------
// Stratum/arm aggregation
//----------------------------------------
use tracing::debug;

use crate::align::grid::GridBuilder;
use crate::error::AhrComputeErr;
use crate::events::error::{check_duration, check_ratio};
use crate::events::expected_events::{
    collapse_by_segment, eventual_event_probability, expected_events,
};
use crate::events::types::{ExpectedEventRow, IntervalEvents};
use crate::schedule::design::{StratumDesign, TrialDesign};
use crate::schedule::types::Arm;
use crate::settings::ComputeSettings;
use crate::strata::types::{SegmentTotal, StrataEvents, StratumSegmentEvents};

/// Runs the events engine for every stratum and arm at `total_duration` and
/// sums the results. Enrollment is split `ratio : 1` between the
/// experimental and control arms.
///
/// Every engine call shares the grid of all strata's hazard breakpoints, so
/// the per-stratum intervals nest inside the cells of [`SegmentTotal`].
pub fn aggregate_strata(
    design: &TrialDesign,
    total_duration: f64,
    ratio: f64,
    settings: &ComputeSettings,
) -> Result<StrataEvents, AhrComputeErr> {
    check_ratio(ratio)?;
    check_duration(total_duration)?;

    let hazard_grid = GridBuilder::new(total_duration)
        .follow_up_breakpoints(design.hazard_breakpoints())
        .build(settings.breakpoint_tol)?;

    let mut rows = vec![];
    let mut segments = vec![];
    for stratum in design.strata() {
        let [control, experimental] = Arm::BOTH.map(|arm| {
            let enrollment = stratum.enrollment.scaled(arm.share(ratio));
            expected_events(
                &enrollment,
                &stratum.hazard,
                arm,
                total_duration,
                hazard_grid.points(),
                settings,
            )
        });
        let (control, experimental) = (control?, experimental?);

        let stratum_segments: Vec<StratumSegmentEvents> = collapse_by_segment(&control)
            .into_iter()
            .zip(collapse_by_segment(&experimental))
            .map(|(c, e)| StratumSegmentEvents {
                stratum: stratum.name.clone(),
                segment: c.segment,
                t: c.t,
                end: c.end,
                hr: c.hr,
                control_events: c.events,
                experimental_events: e.events,
                time_at_risk: c.time_at_risk + e.time_at_risk,
            })
            .collect();
        debug!(
            stratum = %stratum.name,
            total_duration,
            events = stratum_segments.iter().map(StratumSegmentEvents::events).sum::<f64>(),
            "aggregated stratum"
        );

        segments.extend(stratum_segments);
        rows.extend(event_rows(stratum, Arm::Control, &control));
        rows.extend(event_rows(stratum, Arm::Experimental, &experimental));
    }

    let mut totals: Vec<(SegmentTotal, f64)> = hazard_grid
        .intervals()
        .map(|(start, end)| {
            let cell = SegmentTotal {
                start,
                end,
                events: 0.,
                hr: None,
            };
            (cell, 0.)
        })
        .collect();
    for row in &rows {
        let mid = (row.interval_start + row.interval_end) / 2.;
        if let Some(i) = hazard_grid.interval_at(mid) {
            let (cell, weighted_log_hr) = &mut totals[i];
            cell.events += row.expected_events;
            *weighted_log_hr += row.expected_events * row.hazard_ratio.ln();
        }
    }
    let totals: Vec<SegmentTotal> = totals
        .into_iter()
        .map(|(mut cell, weighted_log_hr)| {
            if cell.events > 0. {
                cell.hr = Some((weighted_log_hr / cell.events).exp());
            }
            cell
        })
        .collect();

    Ok(StrataEvents {
        total_duration,
        ratio,
        rows,
        segments,
        totals,
    })
}

/// Expected events as follow-up grows without bound: every patient ever
/// enrolled, times the probability of an event before dropping out. Infinite
/// when some stratum enrolls indefinitely with a positive chance of an event.
pub fn asymptotic_events(design: &TrialDesign, ratio: f64) -> Result<f64, AhrComputeErr> {
    check_ratio(ratio)?;
    let mut total = 0.;
    for stratum in design.strata() {
        let enrollment = &stratum.enrollment;
        let open_ended = enrollment.is_open_ended()
            && enrollment.rates().last().is_some_and(|&rate| rate > 0.);
        let enrolled: f64 = enrollment
            .durations()
            .iter()
            .zip(enrollment.rates())
            .filter(|(duration, _)| duration.is_finite())
            .map(|(duration, rate)| duration * rate)
            .sum();

        for arm in Arm::BOTH {
            let probability = eventual_event_probability(&stratum.hazard, arm);
            if probability <= 0. {
                continue;
            }
            if open_ended {
                return Ok(f64::INFINITY);
            }
            total += enrolled * arm.share(ratio) * probability;
        }
    }
    Ok(total)
}

fn event_rows<'a>(
    stratum: &'a StratumDesign,
    arm: Arm,
    intervals: &'a [IntervalEvents],
) -> impl Iterator<Item = ExpectedEventRow> + 'a {
    intervals.iter().map(move |interval| ExpectedEventRow {
        stratum: stratum.name.clone(),
        arm,
        interval_start: interval.start,
        interval_end: interval.end,
        failure_rate: interval.fail_rate,
        hazard_ratio: interval.hr,
        expected_events: interval.events,
        expected_time_at_risk: interval.time_at_risk,
    })
}

#[cfg(test)]
mod tests {

    use std::f64::consts::LN_2;

    use super::*;
    use crate::events::error::EventsError;
    use crate::schedule::types::{EnrollRate, FailRate, StratumWeight};

    fn three_strata() -> TrialDesign {
        let enroll: Vec<EnrollRate> = ["Low", "Mid", "High"]
            .iter()
            .map(|s| EnrollRate::new(*s, 12., 30.))
            .collect();
        let fail = vec![
            FailRate::new("Low", 1., LN_2 / 12., 1.2, 0.001),
            FailRate::new("Mid", 3., LN_2 / 10., 1. / 3., 0.001),
            FailRate::new("Mid", 1., LN_2 / 6., 1. / 3., 0.001),
            FailRate::new("High", 1., LN_2 / 20., 1., 0.001),
        ];
        let weights = vec![
            StratumWeight::new("Low", 1. / 3.),
            StratumWeight::new("Mid", 0.5),
            StratumWeight::new("High", 1. / 6.),
        ];
        TrialDesign::new(&enroll, &fail, Some(&weights)).expect("failed to build design")
    }

    #[test]
    fn three_strata_totals() {
        let events = aggregate_strata(&three_strata(), 24., 1., &ComputeSettings::default())
            .expect("failed to aggregate strata");

        assert!((events.total_events() - 225.00337178344543).abs() < 1e-8);
        assert!((events.stratum_events("Low") - 80.03672290368164).abs() < 1e-8);
        assert!(
            (events.stratum_events("Mid") - (22.890943737739015 + 94.68706117874208)).abs() < 1e-8
        );
        assert!((events.stratum_events("High") - 27.388643963282703).abs() < 1e-8);

        // common grid comes from the Mid stratum's breakpoint at 3
        assert_eq!(events.totals.len(), 2);
        assert_eq!((events.totals[0].start, events.totals[0].end), (0., 3.));
        assert_eq!((events.totals[1].start, events.totals[1].end), (3., 24.));
        let segment_sum: f64 = events.segments.iter().map(|s| s.events()).sum();
        assert!((segment_sum - events.total_events()).abs() < 1e-9);
        let row_sum: f64 = events.rows.iter().map(|r| r.expected_events).sum();
        assert!((row_sum - events.total_events()).abs() < 1e-9);
    }

    #[test]
    fn cell_hazard_ratio_is_weighted_between_strata() {
        let events = aggregate_strata(&three_strata(), 24., 1., &ComputeSettings::default())
            .expect("failed to aggregate strata");
        for cell in &events.totals {
            let hr = cell.hr.expect("cell should have events");
            assert!(hr > 1. / 3. && hr < 1.2);
        }
    }

    #[test]
    fn experimental_arm_uses_hazard_ratio() {
        let events = aggregate_strata(&three_strata(), 24., 1., &ComputeSettings::default())
            .expect("failed to aggregate strata");
        let low = events
            .segments
            .iter()
            .find(|s| s.stratum == "Low")
            .expect("missing Low stratum");
        // hazard ratio above 1: more events on the experimental arm
        assert!(low.experimental_events > low.control_events);
        let mid = events
            .segments
            .iter()
            .find(|s| s.stratum == "Mid" && s.segment == 1)
            .expect("missing Mid stratum");
        assert_eq!(mid.t, 3.);
        assert!(mid.experimental_events < mid.control_events);
    }

    #[test]
    fn strata_order_does_not_matter() {
        let design = three_strata();
        let settings = ComputeSettings::default();
        let forward = aggregate_strata(&design, 18., 2., &settings)
            .expect("failed to aggregate strata")
            .total_events();

        let mut strata = design.into_strata();
        strata.reverse();
        let reversed = TrialDesign::from_strata(strata).expect("failed to build design");
        let backward = aggregate_strata(&reversed, 18., 2., &settings)
            .expect("failed to aggregate strata")
            .total_events();

        assert!(((forward - backward) / forward).abs() < 1e-12);
    }

    #[test]
    fn zero_event_cells_have_no_hazard_ratio() {
        let enroll = vec![EnrollRate::new("All", 5., 10.)];
        let fail = vec![
            FailRate::new("All", 2., 0., 0.5, 0.),
            FailRate::new("All", 10., 0.1, 0.5, 0.),
        ];
        let design = TrialDesign::new(&enroll, &fail, None).expect("failed to build design");
        let events = aggregate_strata(&design, 6., 1., &ComputeSettings::default())
            .expect("failed to aggregate strata");
        assert_eq!(events.totals[0].events, 0.);
        assert_eq!(events.totals[0].hr, None);
        let hr = events.totals[1].hr.expect("cell should have events");
        assert!((hr - 0.5).abs() < 1e-12);
    }

    #[test]
    fn unlimited_follow_up_limit() {
        let design = three_strata();
        let settings = ComputeSettings::default();
        for ratio in [1., 2.] {
            let limit = asymptotic_events(&design, ratio).expect("failed to compute limit");
            let late = aggregate_strata(&design, 1e5, ratio, &settings)
                .expect("failed to aggregate strata")
                .total_events();
            assert!(((limit - late) / limit).abs() < 1e-9, "limit {limit}, late {late}");
            assert!(limit < 360.);
        }

        let enroll = vec![EnrollRate::new("All", f64::INFINITY, 2.)];
        let fail = vec![FailRate::new("All", 1., 0.01, 1., 0.)];
        let open = TrialDesign::new(&enroll, &fail, None).expect("failed to build design");
        assert_eq!(asymptotic_events(&open, 1.), Ok(f64::INFINITY));

        let fail = vec![FailRate::new("All", 1., 0., 1., 0.05)];
        let no_events = TrialDesign::new(&enroll, &fail, None).expect("failed to build design");
        assert_eq!(asymptotic_events(&no_events, 1.), Ok(0.));
    }

    #[test]
    fn segment_time_at_risk_covers_both_arms() {
        let events = aggregate_strata(&three_strata(), 24., 1., &ComputeSettings::default())
            .expect("failed to aggregate strata");
        let from_segments: f64 = events.segments.iter().map(|s| s.time_at_risk).sum();
        let from_rows: f64 = events.rows.iter().map(|r| r.expected_time_at_risk).sum();
        assert!(((from_segments - from_rows) / from_rows).abs() < 1e-12);
        assert!(events.segments.iter().all(|s| s.time_at_risk > 0.));
    }

    #[test]
    fn rejects_bad_ratio() {
        let err = aggregate_strata(&three_strata(), 24., 0., &ComputeSettings::default())
            .unwrap_err();
        assert_eq!(err, AhrComputeErr::from(EventsError::BadRatio(0.)));
    }
}
