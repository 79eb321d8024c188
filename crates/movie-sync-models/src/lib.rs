pub mod cursor;
pub mod movie;
pub mod remote;
pub mod status;
pub mod tracked;

pub use cursor::{default_last_synced, SyncCursor};
pub use movie::{is_usable_imdb_id, MovieRecord};
pub use remote::{RankedList, RemoteIds, RemoteListEntry};
pub use status::{MovieStatus, PredbStatus};
pub use tracked::{MovieUpdate, TrackedTitle};
