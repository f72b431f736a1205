use chrono::{DateTime, Utc};
use feed_rs::parser;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// A feed entry as found in the document, before normalization.
///
/// Every field is optional: upstream feeds routinely omit dates, summaries
/// and occasionally even titles. `description` carries the body fallback
/// (Atom `content`, RSS `content:encoded`) used when `summary` is absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub description: Option<String>,
}

/// Entries extracted from one feed document.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    pub entries: Vec<RawEntry>,
    /// True when the strict parser rejected the document and the entries
    /// came from the tolerant recovery pass.
    pub recovered: bool,
}

#[derive(Debug, Error)]
pub enum ParseError {
    /// The document could not be parsed and no entry could be salvaged.
    #[error("malformed feed with no usable entries: {0}")]
    Malformed(String),
}

/// Parses an RSS or Atom document into raw entries.
///
/// Well-formed documents go through `feed-rs`. When that fails, a lenient
/// `quick-xml` scan salvages whatever `<item>`/`<entry>` elements precede the
/// first unrecoverable error. A document with zero salvageable entries is an
/// error; a well-formed feed with zero entries is not.
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed, ParseError> {
    match parser::parse(bytes) {
        Ok(feed) => Ok(ParsedFeed {
            entries: feed.entries.into_iter().map(from_feed_rs).collect(),
            recovered: false,
        }),
        Err(strict_err) => {
            let entries = recover_entries(bytes);
            if entries.is_empty() {
                return Err(ParseError::Malformed(strict_err.to_string()));
            }
            tracing::debug!(
                error = %strict_err,
                recovered = entries.len(),
                "Strict feed parse failed, using recovered entries"
            );
            Ok(ParsedFeed {
                entries,
                recovered: true,
            })
        }
    }
}

fn from_feed_rs(entry: feed_rs::model::Entry) -> RawEntry {
    let link = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
        .or_else(|| entry.links.first())
        .map(|l| l.href.clone());

    RawEntry {
        title: entry.title.map(|t| t.content),
        link,
        published: entry.published,
        updated: entry.updated,
        summary: entry.summary.map(|s| s.content),
        description: entry.content.and_then(|c| c.body),
    }
}

/// Child elements of an item/entry that the recovery pass understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Published,
    Updated,
    Summary,
    Description,
}

impl Field {
    /// Maps a local element name (namespace prefix already stripped).
    fn from_tag(local: &[u8]) -> Option<Self> {
        match local {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"pubDate" | b"published" | b"issued" => Some(Field::Published),
            b"updated" | b"modified" | b"date" => Some(Field::Updated),
            b"summary" => Some(Field::Summary),
            b"description" | b"content" | b"encoded" => Some(Field::Description),
            _ => None,
        }
    }
}

fn is_entry_tag(local: &[u8]) -> bool {
    matches!(local, b"item" | b"entry")
}

/// Lenient scan used when the strict parser gives up.
///
/// End-tag mismatches are tolerated. The scan stops at the first hard error
/// and keeps only entries whose closing tag was seen; an entry cut off by
/// the error or by end of input is dropped. Fields are read from direct
/// children of the entry only, so `<source><title>` and similar nested
/// elements never leak into the entry.
fn recover_entries(bytes: &[u8]) -> Vec<RawEntry> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().check_end_names = false;

    let mut buf = Vec::new();
    let mut entries = Vec::new();
    let mut current: Option<RawEntry> = None;
    let mut field: Option<Field> = None;
    // Open non-field elements below the current entry.
    let mut depth = 0usize;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let local = e.local_name();
                if is_entry_tag(local.as_ref()) {
                    current = Some(RawEntry::default());
                    field = None;
                    depth = 0;
                } else if let (Some(entry), None) = (current.as_mut(), field) {
                    match Field::from_tag(local.as_ref()).filter(|_| depth == 0) {
                        Some(f) => {
                            field = Some(f);
                            text.clear();
                            if f == Field::Link {
                                take_href(entry, &e);
                            }
                        }
                        None => depth += 1,
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if let (Some(entry), None, 0) = (current.as_mut(), field, depth) {
                    if e.local_name().as_ref() == b"link" {
                        take_href(entry, &e);
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if field.is_some() {
                    match e.unescape() {
                        Ok(t) => text.push_str(&t),
                        Err(_) => text.push_str(&String::from_utf8_lossy(&e)),
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(e)) => {
                let local = e.local_name();
                if is_entry_tag(local.as_ref()) {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                    field = None;
                    depth = 0;
                } else if let Some(f) = field {
                    if Field::from_tag(local.as_ref()) == Some(f) {
                        if let Some(entry) = current.as_mut() {
                            assign(entry, f, std::mem::take(&mut text));
                        }
                        field = None;
                    }
                } else if current.is_some() {
                    depth = depth.saturating_sub(1);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(
                    position = reader.buffer_position(),
                    error = %e,
                    "Recovery scan stopped at XML error"
                );
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    if current.is_some() {
        tracing::debug!("Dropping unterminated entry at end of recovery scan");
    }

    entries
}

/// Sets the entry's link from an Atom-style `href` attribute.
fn take_href(entry: &mut RawEntry, e: &BytesStart<'_>) {
    if entry.link.is_some() {
        return;
    }
    let rel_ok = match e.try_get_attribute("rel") {
        Ok(Some(rel)) => rel.value.as_ref() == b"alternate",
        _ => true,
    };
    if !rel_ok {
        return;
    }
    if let Ok(Some(href)) = e.try_get_attribute("href") {
        if let Ok(value) = href.unescape_value() {
            entry.link = Some(value.trim().to_string());
        }
    }
}

/// Stores collected text; the first occurrence of a field wins.
fn assign(entry: &mut RawEntry, field: Field, text: String) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return;
    }
    match field {
        Field::Title => {
            entry.title.get_or_insert_with(|| trimmed.to_string());
        }
        Field::Link => {
            entry.link.get_or_insert_with(|| trimmed.to_string());
        }
        Field::Published => {
            if entry.published.is_none() {
                entry.published = parse_date(trimmed);
            }
        }
        Field::Updated => {
            if entry.updated.is_none() {
                entry.updated = parse_date(trimmed);
            }
        }
        Field::Summary => {
            entry.summary.get_or_insert(text);
        }
        Field::Description => {
            entry.description.get_or_insert(text);
        }
    }
}

/// Accepts the two date formats feeds actually use: RFC 2822 (RSS) and
/// RFC 3339 (Atom).
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
