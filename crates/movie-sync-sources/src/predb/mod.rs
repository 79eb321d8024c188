pub mod api;
pub mod parser;

pub use api::{PredbApi, PREDB_BASE_URL};
pub use parser::{escape_bare_ampersands, parse_feed_titles};
