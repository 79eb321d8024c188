use serde::{Deserialize, Serialize};

/// Identifiers attached to a remote list entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RemoteIds {
    pub imdb: Option<String>,
    pub tmdb: Option<u64>,
    pub trakt: Option<u64>,
    pub slug: Option<String>,
}

/// One movie from a remote ranked list, only alive for a single sync pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteListEntry {
    pub title: String,
    pub year: Option<u32>,
    pub ids: RemoteIds,
    pub rating: Option<f64>,
}

impl RemoteListEntry {
    /// Entries without a rating never pass a positive score threshold
    pub fn meets_score(&self, min_score: f64) -> bool {
        self.rating.unwrap_or(0.0) >= min_score
    }
}

/// Ranked movie lists offered by the remote watchlist service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RankedList {
    Trending,
    Popular,
    Watched,
    Collected,
    Anticipated,
    Boxoffice,
}

impl RankedList {
    pub const ALL: [RankedList; 6] = [
        RankedList::Trending,
        RankedList::Popular,
        RankedList::Watched,
        RankedList::Collected,
        RankedList::Anticipated,
        RankedList::Boxoffice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RankedList::Trending => "trending",
            RankedList::Popular => "popular",
            RankedList::Watched => "watched",
            RankedList::Collected => "collected",
            RankedList::Anticipated => "anticipated",
            RankedList::Boxoffice => "boxoffice",
        }
    }
}

impl std::fmt::Display for RankedList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RankedList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RankedList::ALL
            .into_iter()
            .find(|list| list.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("Invalid list name: {}", s))
    }
}
