use serde::{Deserialize, Serialize};
use crate::status::{MovieStatus, PredbStatus};

/// A library title together with its release-tracking flags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedTitle {
    pub imdb_id: String,
    pub title: String,
    pub year: Option<u32>,
    #[serde(default)]
    pub status: MovieStatus,
    #[serde(default)]
    pub predb: PredbStatus,
    /// Set once a backlog query completed, successful or empty
    #[serde(default)]
    pub predb_backlog: bool,
}

impl TrackedTitle {
    /// Titles that still need their one-off backlog query
    pub fn needs_backlog_check(&self) -> bool {
        !self.predb_backlog && !self.status.is_terminal()
    }

    /// Titles watched through the rolling feed after the backlog query
    pub fn needs_rolling_check(&self) -> bool {
        self.predb_backlog && self.predb != PredbStatus::Found && !self.status.is_terminal()
    }
}

/// Partial update applied to one library movie
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieUpdate {
    pub predb_backlog: Option<bool>,
    pub predb: Option<PredbStatus>,
    pub status: Option<MovieStatus>,
}

impl MovieUpdate {
    pub fn is_empty(&self) -> bool {
        self.predb_backlog.is_none() && self.predb.is_none() && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(status: MovieStatus, predb: PredbStatus, predb_backlog: bool) -> TrackedTitle {
        TrackedTitle {
            imdb_id: "tt0947798".to_string(),
            title: "Black Swan".to_string(),
            year: Some(2010),
            status,
            predb,
            predb_backlog,
        }
    }

    #[test]
    fn test_new_title_goes_to_backlog() {
        let t = title(MovieStatus::Waiting, PredbStatus::Unknown, false);
        assert!(t.needs_backlog_check());
        assert!(!t.needs_rolling_check());
    }

    #[test]
    fn test_checked_title_moves_to_rolling_until_found() {
        let t = title(MovieStatus::Wanted, PredbStatus::Unknown, true);
        assert!(!t.needs_backlog_check());
        assert!(t.needs_rolling_check());

        let found = title(MovieStatus::Wanted, PredbStatus::Found, true);
        assert!(!found.needs_rolling_check());
    }

    #[test]
    fn test_terminal_titles_are_excluded() {
        for status in [MovieStatus::Disabled, MovieStatus::Finished] {
            assert!(!title(status, PredbStatus::Unknown, false).needs_backlog_check());
            assert!(!title(status, PredbStatus::Unknown, true).needs_rolling_check());
        }
    }
}
