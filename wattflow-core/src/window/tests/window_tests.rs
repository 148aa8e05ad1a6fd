use super::*;
use crate::types::Watermark;

const MINUTE: EventTime = 60_000;
const HOUR: EventTime = 60 * MINUTE;

fn reading(meter: &str, event_time: EventTime, energy: f64, power: f64) -> MeterReading {
    MeterReading::new(meter, event_time, energy, power).unwrap()
}

fn hourly() -> WindowAggregator {
    WindowAggregator::new(Duration::from_secs(3600)).unwrap()
}

// ── TimeWindow ────────────────────────────────────────────────────────────

#[test]
fn test_time_window_contains() {
    let w = TimeWindow::new(0, 10_000);
    assert!(w.contains(0));
    assert!(w.contains(5_000));
    assert!(!w.contains(10_000)); // end is exclusive
}

#[test]
fn test_time_window_closed_at_end() {
    let w = TimeWindow::new(0, 10_000);
    assert!(!w.is_closed_by(9_999));
    assert!(w.is_closed_by(10_000));
    assert!(w.is_closed_by(20_000));
    assert!(!w.is_closed_by(EVENT_TIME_MIN));
}

// ── Tumbling ──────────────────────────────────────────────────────────────

#[test]
fn test_tumbling_assigns_correct_window() {
    let assigner = TumblingEventTimeWindows::of(Duration::from_secs(10)).unwrap();
    // timestamp 3s falls in [0, 10s)
    assert_eq!(assigner.assign(3_000), TimeWindow::new(0, 10_000));
    // timestamp 10s falls in [10s, 20s)
    assert_eq!(assigner.assign(10_000), TimeWindow::new(10_000, 20_000));
    assert_eq!(assigner.assign(19_999), TimeWindow::new(10_000, 20_000));
}

#[test]
fn test_tumbling_hour_aligned_to_epoch() {
    let assigner = TumblingEventTimeWindows::of(Duration::from_secs(3600)).unwrap();
    let ts = 5 * HOUR + 59 * MINUTE + 50_000;
    assert_eq!(assigner.assign(ts), TimeWindow::new(5 * HOUR, 6 * HOUR));
}

#[test]
fn test_tumbling_before_epoch_floors() {
    let assigner = TumblingEventTimeWindows::of(Duration::from_secs(10)).unwrap();
    assert_eq!(assigner.assign(-1), TimeWindow::new(-10_000, 0));
    assert_eq!(assigner.assign(-10_000), TimeWindow::new(-10_000, 0));
}

#[test]
fn test_tumbling_is_order_independent() {
    let assigner = TumblingEventTimeWindows::of(Duration::from_millis(250)).unwrap();
    let timestamps: Vec<EventTime> = (0..1_000).step_by(37).collect();
    let forward: Vec<_> = timestamps.iter().map(|t| assigner.assign(*t)).collect();
    let mut backward: Vec<_> = timestamps.iter().rev().map(|t| assigner.assign(*t)).collect();
    backward.reverse();
    assert_eq!(forward, backward);
    for (ts, w) in timestamps.iter().zip(&forward) {
        assert!(w.contains(*ts));
        assert_eq!(w.end - w.start, 250);
    }
}

#[test]
fn test_tumbling_rejects_zero_size() {
    assert!(TumblingEventTimeWindows::of(Duration::ZERO).is_err());
    assert!(TumblingEventTimeWindows::of(Duration::from_micros(999)).is_err());
}

// ── WindowAggregator ──────────────────────────────────────────────────────

#[test]
fn test_out_of_order_window_fires_once_watermark_passes_end() {
    let mut op = hourly();

    // Arrival order 2, 1, 3 inside [00:00, 01:00).
    for r in [
        reading("M1", 30 * MINUTE, 12.5, 120.0),
        reading("M1", 0, 10.0, 100.0),
        reading("M1", 59 * MINUTE, 15.0, 110.0),
    ] {
        assert!(op.process(StreamElement::record(r)).is_empty());
    }

    assert!(op.process(StreamElement::watermark(HOUR - 1)).is_empty());

    let out = op.process(StreamElement::watermark(HOUR + 30_000));
    assert_eq!(
        out,
        vec![AggregateResult {
            meter: "M1".to_string(),
            window_start: 0,
            window_end: HOUR,
            energy_consumption: 5.0,
            mean_power: 110.0,
            min_power: 100.0,
            max_power: 120.0,
        }]
    );
    assert_eq!(op.open_window_count(), 0);
}

#[test]
fn test_window_fires_at_most_once() {
    let mut op = hourly();
    op.process(StreamElement::record(reading("M1", 10, 1.0, 1.0)));

    assert_eq!(op.process(StreamElement::watermark(HOUR)).len(), 1);
    assert!(op.process(StreamElement::watermark(2 * HOUR)).is_empty());
    assert!(op.fire().is_empty());
}

#[test]
fn test_late_record_after_flush_is_dropped() {
    let mut op = hourly();
    op.process(StreamElement::record(reading("M1", 10 * MINUTE, 1.0, 50.0)));
    let fired = op.process(StreamElement::watermark(HOUR + 30_000));
    assert_eq!(fired.len(), 1);

    // 00:59:50 arrives after [00:00, 01:00) was flushed.
    let late = reading("M1", 59 * MINUTE + 50_000, 99.0, 999.0);
    assert_eq!(op.process_record(&late), UpdateOutcome::DroppedLate);
    assert_eq!(op.open_window_count(), 0);

    assert!(op.process(StreamElement::watermark(10 * HOUR)).is_empty());
    let report = op.drain(0);
    assert_eq!(report.late_dropped, 1);
    assert_eq!(report.records_accepted, 1);
    assert_eq!(report.windows_emitted, 1);
}

#[test]
fn test_late_record_for_open_window_is_merged() {
    let mut op = hourly();
    op.process(StreamElement::record(reading("M1", HOUR + 10 * MINUTE, 5.0, 10.0)));
    op.process(StreamElement::watermark(HOUR + 9 * MINUTE));

    // Behind the watermark, but its window [01:00, 02:00) is still open.
    let straggler = reading("M1", HOUR + MINUTE, 2.0, 30.0);
    assert_eq!(op.process_record(&straggler), UpdateOutcome::Merged);

    let out = op.process(StreamElement::watermark(2 * HOUR));
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].energy_consumption, 3.0);
    assert_eq!(out[0].max_power, 30.0);
}

#[test]
fn test_stale_watermark_is_ignored() {
    let mut op = hourly();
    op.process(StreamElement::record(reading("M1", 10, 1.0, 1.0)));
    op.process(StreamElement::Watermark(Watermark::new(500)));
    assert!(op.process(StreamElement::Watermark(Watermark::new(100))).is_empty());
    assert_eq!(op.current_watermark(), 500);
}

#[test]
fn test_fire_emits_per_key_in_ascending_window_start() {
    let mut op = hourly();
    for r in [
        reading("M2", 2 * HOUR + 1, 1.0, 1.0),
        reading("M1", HOUR + 1, 1.0, 1.0),
        reading("M2", 1, 1.0, 1.0),
        reading("M1", 1, 1.0, 1.0),
        reading("M2", HOUR + 1, 1.0, 1.0),
    ] {
        op.process(StreamElement::record(r));
    }

    let out = op.process(StreamElement::watermark(3 * HOUR));
    let order: Vec<(&str, EventTime)> = out
        .iter()
        .map(|r| (r.meter.as_str(), r.window_start))
        .collect();
    assert_eq!(
        order,
        vec![
            ("M1", 0),
            ("M2", 0),
            ("M1", HOUR),
            ("M2", HOUR),
            ("M2", 2 * HOUR),
        ]
    );
}

#[test]
fn test_only_windows_with_records_exist() {
    let mut op = hourly();
    op.process(StreamElement::record(reading("M1", 1, 1.0, 1.0)));
    op.process(StreamElement::record(reading("M1", 10 * HOUR, 1.0, 1.0)));
    assert_eq!(op.open_window_count(), 2);

    // The nine empty hours in between produce nothing.
    let out = op.process(StreamElement::watermark(11 * HOUR));
    assert_eq!(out.len(), 2);
}

#[test]
fn test_end_does_not_force_close_open_windows() {
    let mut op = hourly();
    op.process(StreamElement::record(reading("M1", 1, 1.0, 1.0)));
    op.process(StreamElement::record(reading("M1", HOUR + 1, 1.0, 1.0)));
    let fired = op.process(StreamElement::watermark(HOUR + 1));
    assert_eq!(fired.len(), 1);

    assert!(op.process(StreamElement::End).is_empty());
    assert_eq!(
        op.open_windows(),
        vec![WindowKey::new("M1", TimeWindow::new(HOUR, 2 * HOUR))]
    );

    let report = op.drain(3);
    assert_eq!(report.partition, 3);
    assert_eq!(report.windows_emitted, 1);
    assert_eq!(
        report.discarded_open_windows,
        vec![WindowKey::new("M1", TimeWindow::new(HOUR, 2 * HOUR))]
    );
    assert_eq!(report.final_watermark, Some(HOUR + 1));
    assert_eq!(op.open_window_count(), 0);
}

#[test]
fn test_drain_without_watermark_reports_none() {
    let mut op = hourly();
    let report = op.drain(0);
    assert_eq!(report.final_watermark, None);
    assert!(report.discarded_open_windows.is_empty());
}
