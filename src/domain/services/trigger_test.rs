use super::*;
use crate::domain::models::task::LATEST_VERSION;
use chrono::{TimeZone, Timelike};
use std::collections::BTreeMap;

fn task(trigger: TriggerKind, fields: TriggerFields) -> Task {
    Task {
        id: 1,
        name: None,
        trigger,
        create_time: Utc::now(),
        update_time: Utc::now(),
        project: "demo".to_string(),
        version: LATEST_VERSION.to_string(),
        spider: "quotes".to_string(),
        jobid: String::new(),
        settings_arguments: BTreeMap::new(),
        selected_nodes: vec![1],
        fields,
        start_date: None,
        end_date: None,
        timezone: Some("UTC".to_string()),
        jitter: 0,
        misfire_grace_time: None,
        coalesce: true,
        max_instances: 1,
        paused: false,
    }
}

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

fn interval_fields(minutes: &str) -> TriggerFields {
    TriggerFields {
        year: "*".to_string(),
        month: "*".to_string(),
        day: "0".to_string(),
        week: "0".to_string(),
        day_of_week: "*".to_string(),
        hour: "0".to_string(),
        minute: minutes.to_string(),
        second: "0".to_string(),
    }
}

#[test]
fn test_cron_expression_translation() {
    let fields = TriggerFields {
        day_of_week: "0-4".to_string(),
        hour: "3".to_string(),
        minute: "30".to_string(),
        ..TriggerFields::default()
    };
    assert_eq!(cron_expression(&fields).unwrap(), "0 30 3 * * Mon-Fri *");

    let fields = TriggerFields {
        day_of_week: "sat,sun".to_string(),
        ..TriggerFields::default()
    };
    assert_eq!(cron_expression(&fields).unwrap(), "0 0 * * * Sat,Sun *");
}

#[test]
fn test_cron_rejects_week_and_bad_weekday() {
    let fields = TriggerFields {
        week: "12".to_string(),
        ..TriggerFields::default()
    };
    assert_eq!(
        cron_expression(&fields).unwrap_err(),
        TriggerError::UnsupportedWeek("12".to_string())
    );

    let fields = TriggerFields {
        day_of_week: "7".to_string(),
        ..TriggerFields::default()
    };
    assert!(matches!(
        cron_expression(&fields),
        Err(TriggerError::InvalidDayOfWeek(_))
    ));
}

#[test]
fn test_cron_next_fire() {
    let fields = TriggerFields {
        hour: "3".to_string(),
        minute: "30".to_string(),
        ..TriggerFields::default()
    };
    let trigger = Trigger::compile(&task(TriggerKind::Cron, fields), Utc::now()).unwrap();

    let next = trigger.next_fire_after(utc(2025, 3, 1, 1, 0, 0)).unwrap();
    assert_eq!(next, utc(2025, 3, 1, 3, 30, 0));

    // strictly after
    let next = trigger.next_fire_after(utc(2025, 3, 1, 3, 30, 0)).unwrap();
    assert_eq!(next, utc(2025, 3, 2, 3, 30, 0));
}

#[test]
fn test_cron_monday_zero_numbering() {
    let fields = TriggerFields {
        day_of_week: "0".to_string(),
        hour: "9".to_string(),
        ..TriggerFields::default()
    };
    let trigger = Trigger::compile(&task(TriggerKind::Cron, fields), Utc::now()).unwrap();
    // 2025-03-01 is a Saturday
    let next = trigger.next_fire_after(utc(2025, 3, 1, 0, 0, 0)).unwrap();
    assert_eq!(next, utc(2025, 3, 3, 9, 0, 0));
}

#[test]
fn test_cron_respects_start_and_end_dates() {
    let mut task = task(TriggerKind::Cron, TriggerFields::default());
    task.start_date = Some("2025-03-01 12:00:00".to_string());
    task.end_date = Some("2025-03-01 14:30:00".to_string());
    let trigger = Trigger::compile(&task, Utc::now()).unwrap();

    assert_eq!(
        trigger.next_fire_after(utc(2025, 2, 1, 0, 0, 0)),
        Some(utc(2025, 3, 1, 12, 0, 0))
    );
    assert_eq!(
        trigger.next_fire_after(utc(2025, 3, 1, 13, 0, 0)),
        Some(utc(2025, 3, 1, 14, 0, 0))
    );
    assert_eq!(trigger.next_fire_after(utc(2025, 3, 1, 14, 0, 0)), None);
}

#[test]
fn test_cron_fixed_offset_timezone() {
    let fields = TriggerFields {
        hour: "8".to_string(),
        ..TriggerFields::default()
    };
    let mut task = task(TriggerKind::Cron, fields);
    task.timezone = Some("+08:00".to_string());
    let trigger = Trigger::compile(&task, Utc::now()).unwrap();

    let next = trigger.next_fire_after(utc(2025, 3, 1, 12, 0, 0)).unwrap();
    assert_eq!(next, utc(2025, 3, 2, 0, 0, 0));
}

#[test]
fn test_interval_defaults_to_one_period_after_add() {
    let added = utc(2025, 3, 1, 10, 0, 0);
    let trigger = Trigger::compile(&task(TriggerKind::Interval, interval_fields("15")), added).unwrap();

    assert_eq!(trigger.next_fire_after(added), Some(utc(2025, 3, 1, 10, 15, 0)));
    assert_eq!(
        trigger.next_fire_after(utc(2025, 3, 1, 10, 15, 0)),
        Some(utc(2025, 3, 1, 10, 30, 0))
    );
    assert_eq!(
        trigger.next_fire_after(utc(2025, 3, 1, 11, 7, 0)),
        Some(utc(2025, 3, 1, 11, 15, 0))
    );
}

#[test]
fn test_interval_sums_units_and_uses_start_date() {
    let mut fields = interval_fields("30");
    fields.hour = "1".to_string();
    let mut task = task(TriggerKind::Interval, fields);
    task.start_date = Some("2025-03-01 00:00:00".to_string());
    let trigger = Trigger::compile(&task, Utc::now()).unwrap();

    assert_eq!(
        trigger.next_fire_after(utc(2025, 3, 1, 0, 0, 0)),
        Some(utc(2025, 3, 1, 1, 30, 0))
    );
    assert_eq!(trigger.to_string(), "interval[5400s]");
}

#[test]
fn test_interval_rejects_zero_and_garbage() {
    let err = Trigger::compile(&task(TriggerKind::Interval, interval_fields("0")), Utc::now())
        .unwrap_err();
    assert_eq!(err, TriggerError::ZeroInterval);

    let err = Trigger::compile(&task(TriggerKind::Interval, interval_fields("ten")), Utc::now())
        .unwrap_err();
    assert!(matches!(err, TriggerError::InvalidInterval { field: "minute", .. }));
}

#[test]
fn test_interval_out_of_range_is_rejected() {
    let mut fields = interval_fields("0");
    fields.second = i64::MAX.to_string();
    let err = Trigger::compile(&task(TriggerKind::Interval, fields), Utc::now()).unwrap_err();
    assert!(matches!(err, TriggerError::InvalidInterval { .. }));

    let mut fields = interval_fields("0");
    fields.hour = i64::MAX.to_string();
    let err = Trigger::compile(&task(TriggerKind::Interval, fields), Utc::now()).unwrap_err();
    assert!(matches!(err, TriggerError::InvalidInterval { field: "hour", .. }));

    // 周期本身合法，但加到当前时间后超出日期范围
    let mut fields = interval_fields("0");
    fields.second = "100000000000000".to_string();
    let err = Trigger::compile(&task(TriggerKind::Interval, fields), Utc::now()).unwrap_err();
    assert!(matches!(err, TriggerError::InvalidInterval { .. }));
}

#[test]
fn test_interval_next_fire_stops_at_max_date() {
    let mut fields = interval_fields("0");
    fields.week = "100000".to_string();
    let mut task = task(TriggerKind::Interval, fields);
    task.start_date = Some("2025-01-01 00:00:00".to_string());
    let trigger = Trigger::compile(&task, Utc::now()).unwrap();

    assert_eq!(
        trigger.next_fire_after(utc(2024, 1, 1, 0, 0, 0)),
        Some(utc(2025, 1, 1, 0, 0, 0))
    );
    assert!(trigger
        .next_fire_after(DateTime::<Utc>::MAX_UTC - Duration::days(1))
        .is_none());
}

#[test]
fn test_date_fires_once() {
    let mut task = task(TriggerKind::Date, TriggerFields::default());
    task.start_date = Some("2025-03-01 08:00:00".to_string());
    let trigger = Trigger::compile(&task, Utc::now()).unwrap();

    assert_eq!(
        trigger.next_fire_after(utc(2025, 3, 1, 7, 0, 0)),
        Some(utc(2025, 3, 1, 8, 0, 0))
    );
    assert_eq!(trigger.next_fire_after(utc(2025, 3, 1, 8, 0, 0)), None);

    task.start_date = None;
    assert_eq!(
        Trigger::compile(&task, Utc::now()).unwrap_err(),
        TriggerError::MissingRunDate
    );
}

#[test]
fn test_invalid_window_and_timezone() {
    let mut bad = task(TriggerKind::Cron, TriggerFields::default());
    bad.start_date = Some("2025-03-02 00:00:00".to_string());
    bad.end_date = Some("2025-03-01 00:00:00".to_string());
    assert_eq!(
        Trigger::compile(&bad, Utc::now()).unwrap_err(),
        TriggerError::EmptyWindow
    );

    assert!(TriggerTimezone::parse(Some("Mars/Olympus")).is_err());
    assert_eq!(TriggerTimezone::parse(Some("utc")).unwrap(), TriggerTimezone::Utc);
    assert_eq!(TriggerTimezone::parse(None).unwrap(), TriggerTimezone::Local);
    let offset = TriggerTimezone::parse(Some("-05:30")).unwrap();
    let naive = parse_date_string("2025-03-01 00:00:00").unwrap();
    assert_eq!(offset.to_utc(naive).unwrap().hour(), 5);
}
