//! End-to-end resolution scenarios and laws.
//!
//! These tests drive the public entry points (resolver, compressor, point
//! query) together over fixed rule sets and sweep every minute of the day.

use crate::*;
use chrono::{Duration, NaiveDate};

const SETTING: &str = "thermostat";

// ============================================================================
// Test Helpers
// ============================================================================

/// 2024-03-05 is a Tuesday.
fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
}

fn spans(segments: &[Segment]) -> Vec<(u16, u16, String)> {
    segments
        .iter()
        .map(|s| (s.start_minute, s.end_minute, s.value.clone()))
        .collect()
}

fn span(start: u16, end: u16, value: &str) -> (u16, u16, String) {
    (start, end, value.to_string())
}

fn scheduled(value: &str, priority: u32, from: f64, to: f64, days: &[u8]) -> OverrideRule {
    OverrideRule::scheduled(
        SETTING,
        value,
        priority,
        TimeWindow::new(from, to).unwrap(),
        Weekdays::new(days.iter().copied()).unwrap(),
    )
    .unwrap()
}

fn assert_well_formed(segments: &[Segment]) {
    for segment in segments {
        assert!(segment.end_minute > segment.start_minute);
        assert!(usize::from(segment.end_minute) <= MINUTES_PER_DAY);
    }
    for pair in segments.windows(2) {
        assert!(
            pair[0].end_minute <= pair[1].start_minute,
            "segments overlap or are out of order: {:?}",
            pair
        );
    }
}

/// A rule set mixing every variant, wrapping windows and multi-day ranges.
fn busy_rules() -> Vec<OverrideRule> {
    let start = tuesday() - Duration::days(1);
    vec![
        OverrideRule::standard(SETTING, "20", 99).unwrap(),
        scheduled("24", 50, 6.0, 9.0, &[0, 1, 2, 3, 4]),
        scheduled("night", 50, 22.0, 2.0, &[1, 3, 5]),
        scheduled("siesta", 99, 13.0, 15.0, &[0, 1, 2, 3, 4, 5, 6]),
        OverrideRule::conditional(
            SETTING,
            "eco",
            40,
            ConditionalRule {
                source_setting: "presence".to_string(),
                operator: ConditionOperator::Equal,
                comparison_value: "away".to_string(),
                window: Some(TimeWindow::new(10.0, 12.5).unwrap()),
            },
        )
        .unwrap(),
        OverrideRule::conditional(
            SETTING,
            "frost",
            1,
            ConditionalRule {
                source_setting: "outdoor".to_string(),
                operator: ConditionOperator::LessThan,
                comparison_value: "0".to_string(),
                window: None,
            },
        )
        .unwrap(),
        OverrideRule::time_range(
            SETTING,
            "holiday",
            50,
            TimeRangeRule::new(
                start.and_hms_opt(20, 0, 0).unwrap(),
                (start + Duration::days(2)).and_hms_opt(7, 30, 0).unwrap(),
            )
            .unwrap()
            .with_window(TimeWindow::new(19.0, 8.0).unwrap()),
        )
        .unwrap(),
    ]
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_scenario_standard_with_morning_schedule_on_tuesday() {
    let rules = vec![
        OverrideRule::standard(SETTING, "20", 99).unwrap(),
        scheduled("24", 50, 6.0, 9.0, &[0, 1, 2, 3, 4]),
    ];

    let timeline = day_timeline(SETTING, tuesday(), &rules);
    assert_eq!(
        spans(&timeline.segments),
        vec![span(0, 360, "20"), span(360, 540, "24"), span(540, 1440, "20")]
    );
}

#[test]
fn test_scenario_equal_priority_overlap_keeps_first_processed() {
    let rules = vec![
        scheduled("A", 10, 8.0, 12.0, &[0, 1, 2, 3, 4, 5, 6]),
        scheduled("B", 10, 10.0, 14.0, &[0, 1, 2, 3, 4, 5, 6]),
    ];

    let timeline = day_timeline(SETTING, tuesday(), &rules);
    assert_eq!(
        spans(&timeline.segments),
        vec![span(480, 720, "A"), span(720, 840, "B")]
    );
    assert_eq!(timeline.segment_at(600).unwrap().value, "A");
    assert_eq!(timeline.segment_at(660).unwrap().value, "A");
}

#[test]
fn test_scenario_empty_rule_list_has_no_segments() {
    for offset in 0..7 {
        let date = tuesday() + Duration::days(offset);
        assert!(day_timeline(SETTING, date, &[]).segments.is_empty());
    }
}

#[test]
fn test_scenario_three_day_time_range_middle_day_is_full() {
    let monday = tuesday() - Duration::days(1);
    let rules = vec![OverrideRule::time_range(
        SETTING,
        "away",
        10,
        TimeRangeRule::new(
            monday.and_hms_opt(9, 0, 0).unwrap(),
            (monday + Duration::days(2)).and_hms_opt(17, 0, 0).unwrap(),
        )
        .unwrap(),
    )
    .unwrap()];

    let timeline = day_timeline(SETTING, tuesday(), &rules);
    assert_eq!(spans(&timeline.segments), vec![span(0, 1440, "away")]);
}

// ============================================================================
// Laws
// ============================================================================

#[test]
fn test_law_segments_are_disjoint_ordered_and_non_empty() {
    let rules = busy_rules();
    for timeline in forecast(SETTING, &rules, tuesday() - Duration::days(3), 10).unwrap() {
        assert_well_formed(&timeline.segments);
    }
}

#[test]
fn test_law_point_query_agrees_with_segments() {
    let rules = busy_rules();
    let resolver = DayResolver::new(SETTING, &rules);

    for timeline in forecast(SETTING, &rules, tuesday() - Duration::days(2), 5).unwrap() {
        for minute in 0..MINUTES_PER_DAY as u16 {
            let point = resolver.value_at(timeline.date, minute).unwrap();
            let segment = timeline.segment_at(minute);
            assert_eq!(
                point.map(|r| r.value),
                segment.map(|s| s.value.clone()),
                "{} minute {}",
                timeline.date,
                minute
            );
        }
    }
}

#[test]
fn test_law_resolution_is_idempotent() {
    let rules = busy_rules();
    let first = serde_json::to_string(&day_timeline(SETTING, tuesday(), &rules)).unwrap();
    let second = serde_json::to_string(&day_timeline(SETTING, tuesday(), &rules)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_law_priority_one_beats_priority_two_regardless_of_class_or_order() {
    let day = tuesday();
    let range = |value: &str, priority: u32| {
        OverrideRule::time_range(
            SETTING,
            value,
            priority,
            TimeRangeRule::new(
                day.and_hms_opt(0, 0, 0).unwrap(),
                day.and_hms_opt(23, 59, 0).unwrap(),
            )
            .unwrap(),
        )
        .unwrap()
    };
    let all_days = [0, 1, 2, 3, 4, 5, 6];
    let pairs = vec![
        (OverrideRule::standard(SETTING, "R1", 1).unwrap(), range("R2", 2)),
        (scheduled("R1", 1, 0.0, 23.5, &all_days), range("R2", 2)),
        (range("R1", 1), OverrideRule::standard(SETTING, "R2", 2).unwrap()),
        (
            OverrideRule::standard(SETTING, "R1", 1).unwrap(),
            scheduled("R2", 2, 0.0, 23.5, &all_days),
        ),
    ];

    for (r1, r2) in pairs {
        for rules in [vec![r1.clone(), r2.clone()], vec![r2.clone(), r1.clone()]] {
            let winner = value_at(SETTING, day, 600, &rules).unwrap().unwrap();
            assert_eq!(winner.value, "R1", "rules: {:?}", rules);
        }
    }
}

#[test]
fn test_law_scheduled_beats_standard_at_equal_priority() {
    let all_days = [0, 1, 2, 3, 4, 5, 6];
    for rules in [
        vec![
            OverrideRule::standard(SETTING, "base", 99).unwrap(),
            scheduled("sched", 99, 8.0, 9.0, &all_days),
        ],
        vec![
            scheduled("sched", 99, 8.0, 9.0, &all_days),
            OverrideRule::standard(SETTING, "base", 99).unwrap(),
        ],
    ] {
        let winner = value_at(SETTING, tuesday(), 8 * 60 + 30, &rules)
            .unwrap()
            .unwrap();
        assert_eq!(winner.value, "sched");
        assert_eq!(winner.variant, RuleVariant::Scheduled);
    }
}

#[test]
fn test_law_midnight_wrap_window_minutes() {
    // Tuesday is weekday index 1
    let rules = vec![scheduled("night", 10, 22.0, 2.0, &[1])];
    let map = DayResolver::new(SETTING, &rules).resolve(tuesday());

    for minute in 0..MINUTES_PER_DAY as u16 {
        let expected = (1320..1440).contains(&minute) || minute < 120;
        assert_eq!(map.entry(minute).is_some(), expected, "minute {}", minute);
    }

    let wednesday = tuesday() + Duration::days(1);
    let map = DayResolver::new(SETTING, &rules).resolve(wednesday);
    assert_eq!(map.occupied_minutes(), 0);
}

#[test]
fn test_busy_day_timeline() {
    let timeline = day_timeline(SETTING, tuesday(), &busy_rules());

    assert_eq!(
        spans(&timeline.segments),
        vec![
            // Time range wins the equal-priority ties with night and 24
            span(0, 480, "holiday"),
            span(480, 540, "24"),
            span(540, 600, "20"),
            span(600, 750, "eco"),
            span(750, 780, "20"),
            span(780, 900, "siesta"),
            span(900, 1140, "20"),
            span(1140, 1440, "holiday"),
        ]
    );
}
