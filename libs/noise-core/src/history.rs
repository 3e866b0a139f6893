//! Static 24-hour history shown in the historical levels card

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryPoint {
    pub time: &'static str,
    pub db: u8,
}

/// Simulated averages, three hours apart
pub const HISTORICAL_LEVELS: [HistoryPoint; 8] = [
    HistoryPoint { time: "12 AM", db: 45 },
    HistoryPoint { time: "3 AM", db: 42 },
    HistoryPoint { time: "6 AM", db: 55 },
    HistoryPoint { time: "9 AM", db: 68 },
    HistoryPoint { time: "12 PM", db: 72 },
    HistoryPoint { time: "3 PM", db: 70 },
    HistoryPoint { time: "6 PM", db: 65 },
    HistoryPoint { time: "9 PM", db: 58 },
];

/// Card subtitle for the resolved city, or a generic area
pub fn history_caption(city: Option<&str>) -> String {
    format!(
        "Average noise levels for {} over the last 24 hours.",
        city.unwrap_or("your area")
    )
}

pub fn peak() -> HistoryPoint {
    HISTORICAL_LEVELS
        .iter()
        .copied()
        .max_by_key(|p| p.db)
        .unwrap_or(HISTORICAL_LEVELS[0])
}
