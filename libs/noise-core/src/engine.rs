//! Threshold Alert Engine
//!
//! Two states, `Normal` and `Alerting`. [`AlertEngine::evaluate`] is the only place the
//! state changes: decibel ticks, threshold refreshes and environment changes all go through
//! it, so a transition is always decided from one reading/threshold pair.

use chrono::Timelike;
use serde::Serialize;

use crate::threshold::{Environment, ThresholdTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AlertState {
    #[default]
    Normal,
    Alerting,
}

/// Edge produced by an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Normal -> Alerting
    Breach { level: u8, threshold: u8 },
    /// Alerting -> Normal
    Recovery { level: u8, threshold: u8 },
}

/// Result of one comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub level: u8,
    pub threshold: u8,
    pub state: AlertState,
    pub transition: Option<Transition>,
}

impl Evaluation {
    pub fn is_breach(&self) -> bool {
        matches!(self.transition, Some(Transition::Breach { .. }))
    }

    pub fn is_recovery(&self) -> bool {
        matches!(self.transition, Some(Transition::Recovery { .. }))
    }
}

/// Edge-triggered comparator over the threshold table
#[derive(Debug, Clone)]
pub struct AlertEngine {
    table: ThresholdTable,
    state: AlertState,
}

impl AlertEngine {
    pub fn new(table: ThresholdTable) -> Self {
        Self {
            table,
            state: AlertState::Normal,
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn is_alerting(&self) -> bool {
        self.state == AlertState::Alerting
    }

    pub fn table(&self) -> &ThresholdTable {
        &self.table
    }

    /// Active threshold, computed fresh from the table and the given local time
    pub fn threshold(&self, environment: Environment, now: &impl Timelike) -> u8 {
        self.table.active(environment, now)
    }

    /// Compare `level` against the active threshold and move the state machine
    ///
    /// A transition is reported only when the state actually changes.
    pub fn evaluate(&mut self, level: u8, environment: Environment, now: &impl Timelike) -> Evaluation {
        let threshold = self.threshold(environment, now);
        let exceeded = level > threshold;

        let transition = match (self.state, exceeded) {
            (AlertState::Normal, true) => {
                self.state = AlertState::Alerting;
                Some(Transition::Breach { level, threshold })
            },
            (AlertState::Alerting, false) => {
                self.state = AlertState::Normal;
                Some(Transition::Recovery { level, threshold })
            },
            _ => None,
        };

        Evaluation {
            level,
            threshold,
            state: self.state,
            transition,
        }
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new(ThresholdTable::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn test_only_edges_fire() {
        let mut engine = AlertEngine::default();
        let env = Environment::Residential;

        let transitions: Vec<Option<Transition>> = [50, 60, 65, 70, 55, 54, 58]
            .iter()
            .map(|level| engine.evaluate(*level, env, &noon()).transition)
            .collect();

        assert_eq!(
            transitions,
            vec![
                None,
                Some(Transition::Breach {
                    level: 60,
                    threshold: 55
                }),
                None,
                None,
                Some(Transition::Recovery {
                    level: 55,
                    threshold: 55
                }),
                None,
                Some(Transition::Breach {
                    level: 58,
                    threshold: 55
                }),
            ]
        );
    }

    #[test]
    fn test_environment_switch_forces_edges_at_constant_level() {
        let mut engine = AlertEngine::default();

        assert!(engine
            .evaluate(60, Environment::Residential, &noon())
            .is_breach());
        let relaxed = engine.evaluate(60, Environment::Industrial, &noon());
        assert!(relaxed.is_recovery());
        assert_eq!(relaxed.threshold, 75);

        let strict = engine.evaluate(60, Environment::Residential, &noon());
        assert!(strict.is_breach());
        assert_eq!(strict.state, AlertState::Alerting);
    }

    #[test]
    fn test_night_threshold_applies() {
        let mut engine = AlertEngine::default();
        let late = NaiveTime::from_hms_opt(23, 15, 0).unwrap();
        assert!(!engine.evaluate(45, Environment::Residential, &late).is_breach());
        assert!(engine.evaluate(46, Environment::Residential, &late).is_breach());
    }
}
