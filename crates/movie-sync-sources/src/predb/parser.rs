use crate::error::{SourceError, SourceResult};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static AMPERSAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(?:amp|lt|gt|quot|apos|#[0-9]+|#x[0-9A-Fa-f]+);|&").expect("valid regex"));

const CDATA_START: &str = "<![CDATA[";
const CDATA_END: &str = "]]>";

fn escape_text(text: &str) -> Cow<'_, str> {
    AMPERSAND.replace_all(text, |caps: &regex::Captures| {
        let matched = &caps[0];
        if matched == "&" {
            "&amp;".to_string()
        } else {
            matched.to_string()
        }
    })
}

/// Escape `&` that does not start an XML entity, leaving CDATA untouched
///
/// Release names regularly contain raw ampersands, which would otherwise
/// abort parsing of the whole feed.
pub fn escape_bare_ampersands(document: &str) -> Cow<'_, str> {
    if !document.contains('&') {
        return Cow::Borrowed(document);
    }

    let mut escaped = String::with_capacity(document.len());
    let mut rest = document;
    while let Some(start) = rest.find(CDATA_START) {
        escaped.push_str(&escape_text(&rest[..start]));
        let section = &rest[start..];
        let end = section.find(CDATA_END).map(|i| i + CDATA_END.len()).unwrap_or(section.len());
        escaped.push_str(&section[..end]);
        rest = &section[end..];
    }
    escaped.push_str(&escape_text(rest));
    Cow::Owned(escaped)
}

/// Titles of all `<item>` elements of an RSS document, in document order
///
/// Only a direct `<title>` child counts; items without one are skipped. A
/// document without an `<rss>` or `<channel>` element is rejected, so an
/// error page is never mistaken for an empty feed.
pub fn parse_feed_titles(document: &str) -> SourceResult<Vec<String>> {
    let escaped = escape_bare_ampersands(document);
    let mut reader = Reader::from_reader(escaped.as_bytes());
    reader.config_mut().trim_text(true);

    let mut titles = Vec::new();
    let mut buf = Vec::new();
    let mut saw_channel = false;

    // Depth relative to the open <item>, and the title collected so far
    let mut item_depth: Option<usize> = None;
    let mut in_title = false;
    let mut title = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                match item_depth {
                    Some(depth) => {
                        if depth == 0 && name.as_ref() == b"title" {
                            in_title = true;
                        }
                        item_depth = Some(depth + 1);
                    }
                    None if name.as_ref() == b"item" => {
                        item_depth = Some(0);
                        title.clear();
                    }
                    None => {
                        if matches!(name.as_ref(), b"rss" | b"channel") {
                            saw_channel = true;
                        }
                    }
                }
            }
            Ok(Event::End(_)) => match item_depth {
                Some(0) => {
                    if !title.is_empty() {
                        titles.push(std::mem::take(&mut title));
                    }
                    item_depth = None;
                }
                Some(depth) => {
                    in_title = false;
                    item_depth = Some(depth - 1);
                }
                None => {}
            },
            Ok(Event::Text(e)) if in_title => {
                let text = e.unescape().map_err(|e| SourceError::Malformed(e.to_string()))?;
                title.push_str(&text);
            }
            Ok(Event::CData(e)) if in_title => {
                title.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    if !saw_channel {
        return Err(SourceError::Malformed("Not an RSS document".to_string()));
    }

    Ok(titles)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>PREDB.ME</title>
    <item>
      <title>Black.Swan.2010.1080p.BluRay.x264-AMIABLE</title>
      <link>https://predb.me/?post=1</link>
    </item>
    <item>
      <link>https://predb.me/?post=2</link>
    </item>
    <item>
      <title><![CDATA[Tom.&.Jerry.2021.720p.WEB]]></title>
    </item>
    <item>
      <title>Fast & Furious 2009 DVDRip</title>
      <description><title>nested</title></description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_titles_skips_items_without_title() {
        let titles = parse_feed_titles(FEED).unwrap();
        assert_eq!(
            titles,
            vec![
                "Black.Swan.2010.1080p.BluRay.x264-AMIABLE".to_string(),
                "Tom.&.Jerry.2021.720p.WEB".to_string(),
                "Fast & Furious 2009 DVDRip".to_string(),
            ]
        );
    }

    #[test]
    fn test_escape_keeps_existing_entities() {
        assert_eq!(escape_bare_ampersands("A & B &amp; C &#38; D"), "A &amp; B &amp; C &#38; D");
        assert_eq!(escape_bare_ampersands("no ampersand"), "no ampersand");
        assert_eq!(
            escape_bare_ampersands("<t><![CDATA[A & B]]></t><t>C & D</t>"),
            "<t><![CDATA[A & B]]></t><t>C &amp; D</t>"
        );
    }

    #[test]
    fn test_empty_channel_is_valid() {
        let titles = parse_feed_titles("<rss><channel><title>x</title></channel></rss>").unwrap();
        assert!(titles.is_empty());
    }

    #[test]
    fn test_non_rss_document_is_malformed() {
        let err = parse_feed_titles("<html><body>Service unavailable</body></html>").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MalformedResponse);
    }
}
