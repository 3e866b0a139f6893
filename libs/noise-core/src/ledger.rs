//! Alert Ledger - the newest breaches, most recent first

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Number of alerts retained
pub const LEDGER_CAPACITY: usize = 10;
/// Margin over the threshold above which a breach is destructive
pub const DESTRUCTIVE_MARGIN_DB: u8 = 10;

/// Badge severity of a recorded breach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Destructive,
    Secondary,
}

impl Severity {
    /// Destructive iff `level - threshold > 10`; exactly 10 is still secondary
    pub fn for_excess(level: u8, threshold: u8) -> Self {
        if level.saturating_sub(threshold) > DESTRUCTIVE_MARGIN_DB {
            Severity::Destructive
        } else {
            Severity::Secondary
        }
    }
}

/// One breach as shown in the recent alerts card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRecord {
    pub location: String,
    #[serde(rename = "type")]
    pub noise_type: String,
    pub level: u8,
    pub threshold: u8,
    pub time: DateTime<Local>,
    pub severity: Severity,
}

impl AlertRecord {
    pub fn new(
        location: impl Into<String>,
        noise_type: impl Into<String>,
        level: u8,
        threshold: u8,
        time: DateTime<Local>,
    ) -> Self {
        Self {
            location: location.into(),
            noise_type: noise_type.into(),
            level,
            threshold,
            time,
            severity: Severity::for_excess(level, threshold),
        }
    }
}

/// Bounded, insertion-ordered list of alerts; older entries are silently dropped
#[derive(Debug, Clone)]
pub struct AlertLedger {
    entries: VecDeque<AlertRecord>,
    capacity: usize,
}

impl Default for AlertLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertLedger {
    pub fn new() -> Self {
        Self::with_capacity(LEDGER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, entry: AlertRecord) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &AlertRecord> {
        self.entries.iter()
    }

    pub fn list(&self) -> Vec<AlertRecord> {
        self.entries.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&AlertRecord> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
