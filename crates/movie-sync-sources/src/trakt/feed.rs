//! Trakt personal watchlist Atom feeds.

use crate::error::{SourceError, SourceResult};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

const ATOM_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One `<entry>`; fields stay optional so a broken entry only loses itself
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatchlistFeed {
    /// Feed-level `<updated>`
    pub updated: DateTime<Utc>,
    /// Entries in document order (newest first)
    pub entries: Vec<FeedEntry>,
}

/// Source id of a feed url: its path without the leading slash and `.atom`
///
/// `https://trakt.tv/users/me/watchlist.atom?slurm=x` yields `users/me/watchlist`.
pub fn source_id_from_url(url: &str) -> String {
    let path = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };
    let path = path.trim_matches('/');
    path.strip_suffix(".atom").unwrap_or(path).to_string()
}

/// RFC 3339 with its offset applied; offset-less values (`2024-05-01T12:30:00`) read as UTC
pub fn parse_atom_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    let prefix = trimmed.get(..19).unwrap_or(trimmed);
    NaiveDateTime::parse_from_str(prefix, ATOM_DATE_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Split `Title (2010)` into the title and the digits of the last parenthetical
///
/// `None` when there is no parenthetical or it holds no year.
pub fn split_title_year(text: &str) -> Option<(String, u32)> {
    let (title, suffix) = text.rsplit_once(" (")?;
    let digits: String = suffix.chars().filter(|c| c.is_ascii_digit()).collect();
    let year = digits.parse().ok()?;
    let title = title.trim();
    (!title.is_empty()).then(|| (title.to_string(), year))
}

pub fn parse_watchlist_feed(document: &str) -> SourceResult<WatchlistFeed> {
    let mut reader = Reader::from_reader(document.as_bytes());
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut text = String::new();

    let mut updated = None;
    let mut entries = Vec::new();
    let mut current: Option<FeedEntry> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if path.len() == 1 && name == b"entry" {
                    current = Some(FeedEntry::default());
                }
                path.push(name);
                text.clear();
            }
            Ok(Event::Text(e)) => {
                let chunk = e.unescape().map_err(|e| SourceError::Malformed(e.to_string()))?;
                text.push_str(&chunk);
            }
            Ok(Event::CData(e)) => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::End(_)) => {
                let value = std::mem::take(&mut text);
                match path.iter().map(Vec::as_slice).collect::<Vec<_>>().as_slice() {
                    [_, b"updated"] => updated = parse_atom_timestamp(&value),
                    [_, b"entry", b"title"] => {
                        if let Some(entry) = current.as_mut() {
                            entry.title = Some(value).filter(|t| !t.is_empty());
                        }
                    }
                    [_, b"entry", b"published"] => {
                        if let Some(entry) = current.as_mut() {
                            entry.published = parse_atom_timestamp(&value);
                        }
                    }
                    [_, b"entry"] => entries.extend(current.take()),
                    _ => {}
                }
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    let updated = updated.ok_or_else(|| SourceError::Malformed("Feed has no valid <updated> timestamp".to_string()))?;
    Ok(WatchlistFeed { updated, entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:media="http://search.yahoo.com/mrss/">
  <id>tag:trakt.tv,2011:/users/me/watchlist</id>
  <title>me's Watchlist</title>
  <updated>2024-05-02T08:00:00-07:00</updated>
  <entry>
    <id>tag:trakt.tv,2011:Movie/1</id>
    <published>2024-05-01T12:30:00Z</published>
    <updated>2024-05-03T00:00:00Z</updated>
    <title>Black Swan (2010)</title>
    <author><name>me</name></author>
  </entry>
  <entry>
    <published>not a date</published>
    <title>Tom &amp; Jerry (2021)</title>
  </entry>
  <entry>
    <published>2024-04-01T00:00:00Z</published>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed() {
        let feed = parse_watchlist_feed(FEED).unwrap();
        assert_eq!(feed.updated, Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap());
        assert_eq!(feed.entries.len(), 3);

        assert_eq!(feed.entries[0].title.as_deref(), Some("Black Swan (2010)"));
        assert_eq!(feed.entries[0].published, Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()));

        assert_eq!(feed.entries[1].title.as_deref(), Some("Tom & Jerry (2021)"));
        assert_eq!(feed.entries[1].published, None);

        assert_eq!(feed.entries[2].title, None);
    }

    #[test]
    fn test_feed_without_updated_is_malformed() {
        let err = parse_watchlist_feed("<feed><entry><title>A (2000)</title></entry></feed>").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MalformedResponse);
    }

    #[test]
    fn test_offsets_are_applied() {
        assert_eq!(
            parse_atom_timestamp("2024-05-02T10:00:00+02:00"),
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap())
        );
        assert_eq!(
            parse_atom_timestamp("2024-05-02T01:00:00.250-07:00"),
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap() + chrono::Duration::milliseconds(250))
        );
        assert_eq!(
            parse_atom_timestamp(" 2024-05-02T08:00:00 "),
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap())
        );
        assert_eq!(parse_atom_timestamp("yesterday"), None);
    }

    #[test]
    fn test_split_title_year() {
        assert_eq!(split_title_year("Black Swan (2010)"), Some(("Black Swan".to_string(), 2010)));
        assert_eq!(
            split_title_year("Borat (Cultural Learnings) (2006)"),
            Some(("Borat (Cultural Learnings)".to_string(), 2006))
        );
        assert_eq!(split_title_year("Black Swan  (2010)"), Some(("Black Swan".to_string(), 2010)));
        assert_eq!(split_title_year("Untitled"), None);
        assert_eq!(split_title_year("Untitled (Director's Cut)"), None);
        assert_eq!(split_title_year(" (2010)"), None);
    }

    #[test]
    fn test_source_id_from_url() {
        assert_eq!(source_id_from_url("https://trakt.tv/users/me/watchlist.atom?slurm=abc"), "users/me/watchlist");
        assert_eq!(source_id_from_url("https://trakt.tv/users/me/lists/favs.atom"), "users/me/lists/favs");
        assert_ne!(
            source_id_from_url("https://trakt.tv/users/alice/watchlist.atom"),
            source_id_from_url("https://trakt.tv/users/bob/watchlist.atom")
        );
    }
}
