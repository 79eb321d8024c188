use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Last synced marker of one incremental source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncCursor {
    pub source_id: String,
    pub last_synced: DateTime<Utc>,
}

/// Cursor value used for a source that has never been synced
pub fn default_last_synced() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
