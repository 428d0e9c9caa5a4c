//! Tests for the override rule model.

use super::*;
use chrono::NaiveDate;

// ============================================================================
// Test Helpers
// ============================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, s).unwrap()
}

/// Collects every minute of `day` a rule may occupy according to its ranges.
fn covered_by_ranges(rule: &OverrideRule, day: NaiveDate) -> Vec<MinuteOfDay> {
    let mut minutes: Vec<MinuteOfDay> = rule
        .minute_ranges_on(day)
        .into_iter()
        .flat_map(|(start, end)| start..end)
        .collect();
    minutes.sort_unstable();
    minutes
}

fn covered_by_predicate(rule: &OverrideRule, day: NaiveDate) -> Vec<MinuteOfDay> {
    (0..MINUTES_PER_DAY as MinuteOfDay)
        .filter(|m| rule.applies_at(day, *m))
        .collect()
}

// ============================================================================
// Priority / Weekdays / Operator
// ============================================================================

#[test]
fn test_priority_rejects_zero() {
    assert!(Priority::new(0).is_err());
    assert_eq!(Priority::new(7).unwrap().value(), 7);
}

#[test]
fn test_priority_default_is_99() {
    assert_eq!(Priority::default().value(), DEFAULT_PRIORITY);
    assert_eq!(DEFAULT_PRIORITY, 99);
}

#[test]
fn test_priority_orders_numerically() {
    assert!(Priority::new(1).unwrap() < Priority::new(2).unwrap());
}

#[test]
fn test_weekdays_rejects_empty_and_out_of_range() {
    assert!(matches!(
        Weekdays::new(Vec::<u8>::new()),
        Err(EngineError::InvalidRule { ref field, .. }) if field == "days_of_week"
    ));
    assert!(Weekdays::new([7]).is_err());
}

#[test]
fn test_weekdays_are_monday_first() {
    let monday_only = Weekdays::new([0]).unwrap();
    assert!(monday_only.contains(Weekday::Mon));
    assert!(!monday_only.contains(Weekday::Sun));

    let sunday_only = Weekdays::new([6]).unwrap();
    assert!(sunday_only.contains(Weekday::Sun));
    // 2024-03-10 is a Sunday
    assert!(sunday_only.contains_date(date(2024, 3, 10)));
    assert!(!sunday_only.contains_date(date(2024, 3, 11)));
}

#[test]
fn test_weekdays_indices_and_display() {
    let days = Weekdays::new([4, 0, 2, 2]).unwrap();
    assert_eq!(days.indices(), vec![0, 2, 4]);
    assert_eq!(days.to_string(), "Mon,Wed,Fri");
    assert_eq!(Weekdays::all().indices(), vec![0, 1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_operator_symbols_round_trip_through_serde() {
    let parsed: ConditionOperator = serde_json::from_str(r#"">=""#).unwrap();
    assert_eq!(parsed, ConditionOperator::GreaterOrEqual);
    assert_eq!(parsed.to_string(), ">=");
    assert!(serde_json::from_str::<ConditionOperator>(r#""=~""#).is_err());
}

#[test]
fn test_class_precedence_ranks_variants() {
    assert_eq!(RuleVariant::TimeRange.class_precedence(), 1);
    assert_eq!(RuleVariant::Scheduled.class_precedence(), 2);
    assert_eq!(RuleVariant::Conditional.class_precedence(), 2);
    assert_eq!(RuleVariant::Standard.class_precedence(), 3);
}

// ============================================================================
// Construction and validation
// ============================================================================

#[test]
fn test_standard_rule_construction() {
    let rule = OverrideRule::standard("thermostat", "20", 99).unwrap();
    assert_eq!(rule.variant(), RuleVariant::Standard);
    assert!(rule.enabled);
    assert_eq!(rule.priority.value(), 99);
}

#[test]
fn test_rule_rejects_empty_setting_name() {
    let result = OverrideRule::standard("  ", "20", 99);
    assert!(matches!(
        result,
        Err(EngineError::InvalidRule { ref field, .. }) if field == "setting_name"
    ));
}

#[test]
fn test_rule_rejects_zero_priority() {
    assert!(OverrideRule::standard("thermostat", "20", 0).is_err());
}

#[test]
fn test_time_range_rejects_reversed_bounds() {
    let result = TimeRangeRule::new(at(2024, 3, 5, 0, 0, 0), at(2024, 3, 4, 0, 0, 0));
    assert!(matches!(
        result,
        Err(EngineError::InvalidRule { ref field, .. }) if field == "to_date_time"
    ));
}

#[test]
fn test_conditional_rejects_empty_source_setting() {
    let result = OverrideRule::conditional(
        "heater",
        "on",
        10,
        ConditionalRule {
            source_setting: String::new(),
            operator: ConditionOperator::LessThan,
            comparison_value: "18".to_string(),
            window: None,
        },
    );
    assert!(result.is_err());
}

#[test]
fn test_with_enabled_toggles_flag() {
    let rule = OverrideRule::standard("thermostat", "20", 99)
        .unwrap()
        .with_enabled(false);
    assert!(!rule.enabled);
}

// ============================================================================
// Applicability
// ============================================================================

#[test]
fn test_scheduled_rule_applies_only_on_listed_days() {
    let rule = OverrideRule::scheduled(
        "thermostat",
        "24",
        50,
        TimeWindow::new(6.0, 9.0).unwrap(),
        Weekdays::new([0, 1, 2, 3, 4]).unwrap(),
    )
    .unwrap();

    // 2024-03-05 is a Tuesday, 2024-03-09 a Saturday
    assert_eq!(rule.minute_ranges_on(date(2024, 3, 5)), vec![(360, 540)]);
    assert!(rule.minute_ranges_on(date(2024, 3, 9)).is_empty());
    assert!(rule.applies_at(date(2024, 3, 5), 400));
    assert!(!rule.applies_at(date(2024, 3, 9), 400));
}

#[test]
fn test_windowless_conditional_occupies_nothing() {
    let rule = OverrideRule::conditional(
        "heater",
        "on",
        10,
        ConditionalRule {
            source_setting: "temperature".to_string(),
            operator: ConditionOperator::LessThan,
            comparison_value: "18".to_string(),
            window: None,
        },
    )
    .unwrap();

    assert!(rule.is_day_long_conditional());
    assert!(rule.minute_ranges_on(date(2024, 3, 5)).is_empty());
    assert!(!rule.applies_at(date(2024, 3, 5), 0));
}

#[test]
fn test_time_range_spanning_days_covers_middle_day_fully() {
    let range = TimeRangeRule::new(at(2024, 3, 4, 12, 0, 0), at(2024, 3, 6, 12, 0, 0)).unwrap();
    let rule = OverrideRule::time_range("thermostat", "16", 10, range).unwrap();

    assert_eq!(rule.minute_ranges_on(date(2024, 3, 5)), vec![(0, 1440)]);
    assert_eq!(rule.minute_ranges_on(date(2024, 3, 4)), vec![(720, 1440)]);
    // The end bound is inclusive
    assert_eq!(rule.minute_ranges_on(date(2024, 3, 6)), vec![(0, 721)]);
    assert!(rule.minute_ranges_on(date(2024, 3, 7)).is_empty());
    assert!(rule.minute_ranges_on(date(2024, 3, 3)).is_empty());
}

#[test]
fn test_time_range_seconds_round_inward() {
    let range = TimeRangeRule::new(at(2024, 3, 5, 10, 0, 30), at(2024, 3, 5, 11, 0, 30)).unwrap();
    assert_eq!(range.clipped_span(date(2024, 3, 5)), Some((601, 660)));
}

#[test]
fn test_time_range_ending_exactly_at_midnight_touches_next_day() {
    let range = TimeRangeRule::new(at(2024, 3, 4, 20, 0, 0), at(2024, 3, 5, 0, 0, 0)).unwrap();
    assert_eq!(range.clipped_span(date(2024, 3, 5)), Some((0, 0)));
}

#[test]
fn test_time_range_with_wrapping_window_splits_into_two_ranges() {
    let range = TimeRangeRule::new(at(2024, 3, 1, 0, 0, 0), at(2024, 3, 31, 23, 59, 0))
        .unwrap()
        .with_window(TimeWindow::new(22.0, 2.0).unwrap());
    let rule = OverrideRule::time_range("thermostat", "16", 10, range).unwrap();

    assert_eq!(
        rule.minute_ranges_on(date(2024, 3, 5)),
        vec![(1320, 1440), (0, 120)]
    );
}

#[test]
fn test_time_range_window_is_clipped_to_span() {
    let range = TimeRangeRule::new(at(2024, 3, 5, 1, 0, 0), at(2024, 3, 5, 23, 0, 0))
        .unwrap()
        .with_window(TimeWindow::new(22.0, 2.0).unwrap());
    let rule = OverrideRule::time_range("thermostat", "16", 10, range).unwrap();

    assert_eq!(
        rule.minute_ranges_on(date(2024, 3, 5)),
        vec![(1320, 1381), (60, 120)]
    );
}

#[test]
fn test_time_range_weekday_filter() {
    let range = TimeRangeRule::new(at(2024, 3, 1, 0, 0, 0), at(2024, 3, 31, 0, 0, 0))
        .unwrap()
        .with_days_of_week(Weekdays::new([5, 6]).unwrap());
    let rule = OverrideRule::time_range("thermostat", "16", 10, range).unwrap();

    // Tuesday vs Saturday
    assert!(rule.minute_ranges_on(date(2024, 3, 5)).is_empty());
    assert_eq!(rule.minute_ranges_on(date(2024, 3, 9)), vec![(0, 1440)]);
}

#[test]
fn test_ranges_and_predicate_agree_for_every_minute() {
    let rules = vec![
        OverrideRule::standard("s", "a", 99).unwrap(),
        OverrideRule::scheduled(
            "s",
            "b",
            5,
            TimeWindow::new(22.0, 2.0).unwrap(),
            Weekdays::new([1]).unwrap(),
        )
        .unwrap(),
        OverrideRule::time_range(
            "s",
            "c",
            5,
            TimeRangeRule::new(at(2024, 3, 5, 7, 15, 20), at(2024, 3, 5, 23, 30, 0))
                .unwrap()
                .with_window(TimeWindow::new(23.0, 8.0).unwrap()),
        )
        .unwrap(),
        OverrideRule::conditional(
            "s",
            "d",
            5,
            ConditionalRule {
                source_setting: "t".to_string(),
                operator: ConditionOperator::Equal,
                comparison_value: "x".to_string(),
                window: Some(TimeWindow::new(12.0, 13.5).unwrap()),
            },
        )
        .unwrap(),
    ];

    for day in [date(2024, 3, 4), date(2024, 3, 5), date(2024, 3, 6)] {
        for rule in &rules {
            assert_eq!(
                covered_by_ranges(rule, day),
                covered_by_predicate(rule, day),
                "mismatch for {:?} on {}",
                rule.variant(),
                day
            );
        }
    }
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_deserialize_rule_applies_defaults() {
    let rule: OverrideRule = serde_json::from_str(
        r#"{
            "type": "scheduled",
            "setting_name": "thermostat",
            "value": 24,
            "window": { "from_hour": 6, "to_hour": 9 }
        }"#,
    )
    .unwrap();

    assert_eq!(rule.value, "24");
    assert_eq!(rule.priority.value(), 99);
    assert!(rule.enabled);
    match rule.kind {
        RuleKind::Scheduled(scheduled) => {
            assert_eq!(scheduled.days_of_week, Weekdays::all());
            assert_eq!(scheduled.window.from_minute(), 360);
        }
        other => panic!("Expected scheduled rule, got {:?}", other),
    }
}

#[test]
fn test_deserialize_rejects_explicitly_empty_days() {
    let result: Result<OverrideRule, _> = serde_json::from_str(
        r#"{
            "type": "scheduled",
            "setting_name": "thermostat",
            "value": "24",
            "window": { "from_hour": 6, "to_hour": 9 },
            "days_of_week": []
        }"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_deserialize_conditional_rule() {
    let rule: OverrideRule = serde_json::from_str(
        r#"{
            "type": "conditional",
            "setting_name": "heater",
            "value": "on",
            "priority": 10,
            "source_setting": "temperature",
            "operator": "<",
            "comparison_value": 18.5
        }"#,
    )
    .unwrap();

    assert_eq!(rule.variant(), RuleVariant::Conditional);
    assert!(rule.is_day_long_conditional());
    match rule.kind {
        RuleKind::Conditional(condition) => {
            assert_eq!(condition.operator, ConditionOperator::LessThan);
            assert_eq!(condition.comparison_value, "18.5");
        }
        other => panic!("Expected conditional rule, got {:?}", other),
    }
}

#[test]
fn test_serialize_rule_is_flat_with_type_tag() {
    let rule = OverrideRule::standard("thermostat", "20", 99).unwrap();
    let json = serde_json::to_value(&rule).unwrap();

    assert_eq!(json["type"], "standard");
    assert_eq!(json["setting_name"], "thermostat");
    assert_eq!(json["priority"], 99);
    assert_eq!(json["enabled"], true);
}

#[test]
fn test_serialized_rule_parses_back() {
    let range = TimeRangeRule::new(at(2024, 3, 4, 12, 0, 0), at(2024, 3, 6, 12, 0, 0))
        .unwrap()
        .with_window(TimeWindow::new(8.0, 17.0).unwrap());
    let rule = OverrideRule::time_range("thermostat", "16", 10, range).unwrap();

    let text = serde_json::to_string(&rule).unwrap();
    let parsed: OverrideRule = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, rule);
}
