pub mod api;
pub mod feed;

pub use api::{parse_ranked_list, TraktApi, TraktIds, TRAKT_API_URL};
pub use feed::{parse_atom_timestamp, parse_watchlist_feed, source_id_from_url, split_title_year, FeedEntry, WatchlistFeed};
