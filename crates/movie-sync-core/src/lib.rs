pub mod feed_matcher;
pub mod fuzzy;
pub mod library;
pub mod storage;
pub mod watchlist;

pub use feed_matcher::{BacklogResult, FeedMatcher, PredbReport};
pub use library::{AddOutcome, CursorStore, LibraryStore, SearchTrigger};
pub use storage::{JsonCursorStore, JsonLibraryStore, LibraryEntry};
pub use watchlist::{SyncReport, WatchlistOptions, WatchlistSync, TRAKT_ORIGIN};
