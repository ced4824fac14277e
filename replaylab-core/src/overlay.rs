//! Signal overlay — trade markers and indicator signals visible at the cutoff.
//!
//! Markers whose timestamp falls between bars are snapped to the nearest bar
//! timestamp (minimum absolute difference) so every overlay point aligns with
//! a rendered bar.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, IndicatorSignal, TradeMarker};

/// The filtered, snapped overlay handed to the renderer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverlayView {
    pub trade_markers: Vec<TradeMarker>,
    pub indicator_markers: Vec<IndicatorSignal>,
}

/// Snap a timestamp to the nearest bar timestamp in `bars`.
///
/// Ties (exactly equidistant neighbors) resolve to the earlier bar. Returns
/// `None` only for an empty slice.
pub fn snap_to_bar(ts: NaiveDateTime, bars: &[Bar]) -> Option<NaiveDateTime> {
    bars.iter()
        .map(|b| b.timestamp)
        .min_by_key(|bar_ts| (*bar_ts - ts).abs())
}

/// Build the overlay for the given cutoff.
///
/// A `None` cutoff means unbounded (the full series is visible). Records with
/// `timestamp > cutoff` are dropped; survivors are snapped against the visible
/// bars.
pub fn build_overlay(
    markers: &[TradeMarker],
    signals: &[IndicatorSignal],
    cutoff: Option<NaiveDateTime>,
    visible: &[Bar],
) -> OverlayView {
    let within = |ts: NaiveDateTime| cutoff.map_or(true, |c| ts <= c);

    let trade_markers = markers
        .iter()
        .filter(|m| within(m.timestamp))
        .filter_map(|m| {
            snap_to_bar(m.timestamp, visible).map(|ts| TradeMarker {
                timestamp: ts,
                ..m.clone()
            })
        })
        .collect();

    let indicator_markers = signals
        .iter()
        .filter(|s| within(s.timestamp))
        .filter_map(|s| {
            snap_to_bar(s.timestamp, visible).map(|ts| IndicatorSignal {
                timestamp: ts,
                ..s.clone()
            })
        })
        .collect();

    OverlayView {
        trade_markers,
        indicator_markers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SignalKind, TradeSide};
    use chrono::NaiveDate;

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn bars(hours: &[u32]) -> Vec<Bar> {
        hours
            .iter()
            .map(|&h| Bar {
                timestamp: ts(h),
                open: 10.0,
                high: 11.0,
                low: 9.0,
                close: 10.5,
                volume: 100.0,
            })
            .collect()
    }

    fn marker(minute: u32) -> TradeMarker {
        TradeMarker {
            side: TradeSide::Buy,
            timestamp: ts(0) + chrono::Duration::minutes(minute as i64),
            price: 10.0,
        }
    }

    #[test]
    fn snap_picks_nearest_bar() {
        let bars = bars(&[0, 2, 4]);
        // 00:50 is closer to 00:00 than to 02:00.
        let snapped = snap_to_bar(ts(0) + chrono::Duration::minutes(50), &bars).unwrap();
        assert_eq!(snapped, ts(0));
        // 01:20 is closer to 02:00.
        let snapped = snap_to_bar(ts(1) + chrono::Duration::minutes(20), &bars).unwrap();
        assert_eq!(snapped, ts(2));
    }

    #[test]
    fn snap_equidistant_resolves_to_a_neighbor() {
        let bars = bars(&[0, 2, 4]);
        // 01:00 is exactly between 00:00 and 02:00.
        let snapped = snap_to_bar(ts(1), &bars).unwrap();
        assert!(snapped == ts(0) || snapped == ts(2));
    }

    #[test]
    fn snap_empty_slice_is_none() {
        assert!(snap_to_bar(ts(1), &[]).is_none());
    }

    #[test]
    fn overlay_filters_by_cutoff() {
        let visible = bars(&[0, 1, 2, 3, 4, 5]);
        let markers = vec![marker(0), marker(180), marker(320)];
        let signals = vec![
            IndicatorSignal {
                timestamp: ts(2),
                price: 10.0,
                kind: SignalKind::Buy,
                indicator: "supertrend".into(),
            },
            IndicatorSignal {
                timestamp: ts(5),
                price: 10.0,
                kind: SignalKind::Sell,
                indicator: "supertrend".into(),
            },
        ];

        let view = build_overlay(&markers, &signals, Some(ts(3)), &visible);
        assert_eq!(view.trade_markers.len(), 2);
        assert_eq!(view.indicator_markers.len(), 1);
        for m in &view.trade_markers {
            assert!(m.timestamp <= ts(3));
        }
    }

    #[test]
    fn overlay_unbounded_keeps_everything() {
        let visible = bars(&[0, 1, 2, 3, 4, 5]);
        let markers = vec![marker(0), marker(180), marker(320)];
        let view = build_overlay(&markers, &[], None, &visible);
        assert_eq!(view.trade_markers.len(), 3);
    }

    #[test]
    fn overlay_snaps_offgrid_marker() {
        let visible = bars(&[0, 1, 2]);
        // 00:40 snaps to 01:00.
        let view = build_overlay(&[marker(40)], &[], None, &visible);
        assert_eq!(view.trade_markers[0].timestamp, ts(1));
        // Side and price survive snapping.
        assert_eq!(view.trade_markers[0].side, TradeSide::Buy);
        assert_eq!(view.trade_markers[0].price, 10.0);
    }
}
