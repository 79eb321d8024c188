use serde::{Deserialize, Serialize};

/// Library status of a tracked movie
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum MovieStatus {
    /// Added but not yet released / searched for
    #[default]
    Waiting,
    /// Actively searched for
    Wanted,
    /// A release was found but not grabbed yet
    Found,
    /// A release was sent to the downloader
    Snatched,
    /// Download finished and imported
    Finished,
    /// Excluded from all automatic processing
    Disabled,
}

impl MovieStatus {
    /// Terminal titles are excluded from availability checks
    pub fn is_terminal(&self) -> bool {
        matches!(self, MovieStatus::Finished | MovieStatus::Disabled)
    }
}

/// Whether a release for the title has been seen on predb
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PredbStatus {
    #[default]
    Unknown,
    Found,
}
