//! Suggestion board - the general pool, the current list and request tickets
//!
//! Every request takes a ticket from one counter. A response only touches the current list
//! when its ticket is still the latest one, so a slow fetch can never overwrite a newer
//! breach or a recovery.

use serde::{Deserialize, Serialize};

use errors::NoiseError;

/// Shown when the breach-time fetch fails
pub const SERVICE_UNAVAILABLE: &str = "The AI service is currently unavailable.";
/// Shown when the startup fetch of the general pool fails
pub const GENERAL_UNAVAILABLE: &str = "Could not load general health tips.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub description: String,
}

impl Suggestion {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Identifies one in-flight request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Ticket(pub u64);

/// Payload of a breach-time fetch
///
/// `general` is present when the request also had to fill the general pool. It is kept
/// even when the specific call failed.
#[derive(Debug)]
pub struct SpecificSuggestions {
    pub general: Option<Vec<Suggestion>>,
    pub specific: Result<Vec<Suggestion>, NoiseError>,
}

impl SpecificSuggestions {
    pub fn specific(specific: Vec<Suggestion>) -> Self {
        Self {
            general: None,
            specific: Ok(specific),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SuggestionBoard {
    general: Option<Vec<Suggestion>>,
    current: Vec<Suggestion>,
    loading: bool,
    error: Option<String>,
    latest: u64,
    /// Startup fetch of the general pool still outstanding
    general_pending: bool,
    /// The current list belongs to a breach rather than the general pool
    breach_active: bool,
}

impl SuggestionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &[Suggestion] {
        &self.current
    }

    pub fn general(&self) -> Option<&[Suggestion]> {
        self.general.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether a breach-time request must also fetch the general pool
    pub fn needs_general(&self) -> bool {
        self.general.is_none() && !self.general_pending
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }

    fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    /// Start the one-time general fetch; `None` when the pool is cached or the list is
    /// already populated
    pub fn begin_general(&mut self) -> Option<Ticket> {
        if self.general.is_some() || !self.current.is_empty() || self.loading {
            return None;
        }
        self.loading = true;
        self.error = None;
        self.general_pending = true;
        Some(self.issue())
    }

    /// Start a breach-time fetch
    pub fn begin_specific(&mut self) -> Ticket {
        self.breach_active = true;
        self.loading = true;
        self.error = None;
        self.issue()
    }

    /// Apply the general fetch result; returns whether the current list changed
    pub fn complete_general(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Suggestion>, NoiseError>,
    ) -> bool {
        let latest = self.is_latest(ticket);
        self.general_pending = false;
        match result {
            Ok(pool) => {
                if latest {
                    self.current = pool.clone();
                    self.loading = false;
                }
                self.cache_general(pool);
            },
            Err(_) => {
                if latest {
                    self.error = Some(GENERAL_UNAVAILABLE.to_string());
                    self.loading = false;
                }
            },
        }
        latest
    }

    /// Apply a breach-time result; returns whether the current list changed
    pub fn complete_specific(&mut self, ticket: Ticket, result: SpecificSuggestions) -> bool {
        if let Some(pool) = result.general {
            self.cache_general(pool);
        }
        let latest = self.is_latest(ticket);
        if latest {
            match result.specific {
                Ok(specific) => {
                    self.current = specific;
                    self.error = None;
                },
                Err(_) => {
                    self.current.clear();
                    self.error = Some(SERVICE_UNAVAILABLE.to_string());
                },
            }
            self.loading = false;
        }
        latest
    }

    /// First pool wins; it is shown right away when a recovery found the cache empty
    fn cache_general(&mut self, pool: Vec<Suggestion>) {
        if self.general.is_some() {
            return;
        }
        if !self.breach_active && self.current.is_empty() {
            self.current = pool.clone();
        }
        self.general = Some(pool);
    }

    /// Recovery: the general pool comes back verbatim and in-flight tickets go stale
    pub fn restore_general(&mut self) {
        self.issue();
        self.breach_active = false;
        self.current = self.general.clone().unwrap_or_default();
        self.error = None;
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(prefix: &str) -> Vec<Suggestion> {
        (1..=3)
            .map(|i| Suggestion::new(format!("{prefix} {i}"), format!("{prefix} tip {i}")))
            .collect()
    }

    #[test]
    fn test_general_fetched_once() {
        let mut board = SuggestionBoard::new();
        let ticket = board.begin_general().unwrap();
        assert!(board.begin_general().is_none());
        assert!(board.complete_general(ticket, Ok(pool("general"))));
        assert_eq!(board.current(), pool("general").as_slice());
        assert!(board.begin_general().is_none());
    }

    #[test]
    fn test_general_failure_message() {
        let mut board = SuggestionBoard::new();
        let ticket = board.begin_general().unwrap();
        board.complete_general(ticket, Err(NoiseError::Timeout("genai".into())));
        assert_eq!(board.error(), Some(GENERAL_UNAVAILABLE));
        assert!(!board.is_loading());
        assert!(board.current().is_empty());
    }

    #[test]
    fn test_stale_general_only_fills_cache() {
        let mut board = SuggestionBoard::new();
        let general = board.begin_general().unwrap();
        let breach = board.begin_specific();

        assert!(!board.complete_general(general, Ok(pool("general"))));
        assert!(board.current().is_empty());
        assert!(board.is_loading());
        assert_eq!(board.general(), Some(pool("general").as_slice()));

        assert!(board.complete_specific(
            breach,
            SpecificSuggestions::specific(pool("traffic"))
        ));
        assert_eq!(board.current(), pool("traffic").as_slice());
    }

    #[test]
    fn test_specific_failure_clears_list() {
        let mut board = SuggestionBoard::new();
        let ticket = board.begin_general().unwrap();
        board.complete_general(ticket, Ok(pool("general")));

        let breach = board.begin_specific();
        board.complete_specific(
            breach,
            SpecificSuggestions {
                general: None,
                specific: Err(NoiseError::service("genai", "HTTP 500")),
            },
        );
        assert!(board.current().is_empty());
        assert_eq!(board.error(), Some(SERVICE_UNAVAILABLE));
    }

    #[test]
    fn test_recovery_invalidates_in_flight_specific() {
        let mut board = SuggestionBoard::new();
        let ticket = board.begin_general().unwrap();
        board.complete_general(ticket, Ok(pool("general")));

        let breach = board.begin_specific();
        board.restore_general();
        assert!(!board.complete_specific(
            breach,
            SpecificSuggestions::specific(pool("siren"))
        ));
        assert_eq!(board.current(), pool("general").as_slice());
    }

    #[test]
    fn test_startup_fetch_counts_as_pending_general() {
        let mut board = SuggestionBoard::new();
        assert!(board.needs_general());
        let ticket = board.begin_general().unwrap();
        assert!(!board.needs_general());

        board.complete_general(ticket, Err(NoiseError::Timeout("genai".into())));
        assert!(board.needs_general());
    }

    #[test]
    fn test_late_general_shown_after_recovery() {
        let mut board = SuggestionBoard::new();
        let ticket = board.begin_general().unwrap();
        board.begin_specific();
        board.restore_general();
        assert!(board.current().is_empty());

        assert!(!board.complete_general(ticket, Ok(pool("general"))));
        assert_eq!(board.current(), pool("general").as_slice());
    }

    #[test]
    fn test_general_kept_when_specific_fails() {
        let mut board = SuggestionBoard::new();
        let breach = board.begin_specific();
        board.complete_specific(
            breach,
            SpecificSuggestions {
                general: Some(pool("general")),
                specific: Err(NoiseError::service("genai", "HTTP 500")),
            },
        );
        assert!(board.current().is_empty());
        assert_eq!(board.error(), Some(SERVICE_UNAVAILABLE));

        board.restore_general();
        assert_eq!(board.current(), pool("general").as_slice());
    }

    #[test]
    fn test_restore_without_pool_is_empty() {
        let mut board = SuggestionBoard::new();
        let breach = board.begin_specific();
        board.complete_specific(
            breach,
            SpecificSuggestions::specific(pool("music")),
        );
        board.restore_general();
        assert!(board.current().is_empty());
        assert!(board.error().is_none());
    }
}
