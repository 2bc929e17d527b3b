use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use thiserror::Error;

/// Namespace URI of the iTunes podcast extension (`itunes:` prefix).
pub const ITUNES_NS: &[u8] = b"http://www.itunes.com/dtds/podcast-1.0.dtd";

/// Duration reported for items without an `itunes:duration` element.
pub const DEFAULT_DURATION: &str = "00:00:00";

/// Errors that can occur while parsing feed XML.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not well-formed XML
    #[error("Invalid feed XML: {0}")]
    Xml(String),
    /// The document has no root element
    #[error("Feed document is empty")]
    Empty,
    /// The document ended with elements still open
    #[error("Feed XML ended with {0} unclosed element(s)")]
    Unclosed(usize),
}

impl From<quick_xml::Error> for ParseError {
    fn from(e: quick_xml::Error) -> Self {
        ParseError::Xml(e.to_string())
    }
}

/// One `<item>` extracted from the feed, before sanitizing and tagging.
///
/// Text fields carry whatever the feed provided (XML entities already
/// unescaped, CDATA taken verbatim, surrounding whitespace kept). Markup
/// and padding inside titles and descriptions are left for
/// [`crate::util::clean_html`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub description: Option<String>,
    pub audio_url: String,
    /// `itunes:duration` text, or [`DEFAULT_DURATION`]
    pub duration: String,
    /// `itunes:image` `href`, or empty
    pub image_url: String,
    /// `pubDate` text, or empty
    pub pub_date: String,
}

/// Text-bearing child elements of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Description,
    PubDate,
    Duration,
}

#[derive(Debug, Default)]
struct ItemBuilder {
    title: Option<String>,
    description: Option<String>,
    pub_date: Option<String>,
    duration: Option<String>,
    audio_url: Option<String>,
    image_url: Option<String>,
}

impl ItemBuilder {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Title => &mut self.title,
            Field::Description => &mut self.description,
            Field::PubDate => &mut self.pub_date,
            Field::Duration => &mut self.duration,
        }
    }

    /// Items need both a title element and an enclosure URL to be kept.
    fn build(self) -> Option<FeedItem> {
        let title = self.title?;
        let audio_url = self.audio_url?;

        Some(FeedItem {
            title,
            description: self.description,
            audio_url,
            duration: self
                .duration
                .filter(|d| !d.trim().is_empty())
                .map(|d| d.trim().to_string())
                .unwrap_or_else(|| DEFAULT_DURATION.to_string()),
            image_url: self.image_url.unwrap_or_default(),
            pub_date: self
                .pub_date
                .map(|d| d.trim().to_string())
                .unwrap_or_default(),
        })
    }
}

/// Parses RSS bytes into feed items, in document order.
///
/// `<item>` elements are found at any depth. Within an item, `title`,
/// `description`, `pubDate` and the `enclosure` URL are read from
/// non-namespaced elements; `duration` and `image` are read from the iTunes
/// namespace. The first occurrence of each field wins.
///
/// Items lacking a `<title>` or an enclosure `url` are skipped without
/// error.
///
/// # Errors
///
/// Returns [`ParseError`] when the bytes are not well-formed XML: syntax
/// errors, mismatched end tags, an empty document, or elements left open at
/// end of input.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedItem>, ParseError> {
    // quick-xml (0.37) never expands <!ENTITY> declarations from a DOCTYPE,
    // only the five XML builtins.
    // Text is not trimmed per event: a field split across text and CDATA
    // segments must keep the whitespace between them.
    let mut reader = NsReader::from_reader(bytes);

    let mut items = Vec::new();
    let mut buf = Vec::new();

    let mut depth: usize = 0;
    let mut seen_root = false;
    let mut current: Option<ItemBuilder> = None;
    let mut item_depth: usize = 0;
    // Field being captured and the depth of its element
    let mut capturing: Option<(Field, usize)> = None;

    loop {
        let (resolved, event) = reader.read_resolved_event_into(&mut buf)?;
        let ns = NsKind::of(&resolved);
        match event {
            Event::Start(e) => {
                depth += 1;
                seen_root = true;

                let local = e.local_name();
                if current.is_none() {
                    if ns == NsKind::Plain && local.as_ref() == b"item" {
                        current = Some(ItemBuilder::default());
                        item_depth = depth;
                    }
                } else if let Some(item) = current.as_mut() {
                    capture_attributes(item, ns, &e, &reader)?;
                    if capturing.is_none() {
                        if let Some(field) = field_for(ns, local.as_ref()) {
                            let slot = item.slot(field);
                            if slot.is_none() {
                                *slot = Some(String::new());
                                capturing = Some((field, depth));
                            }
                        }
                    }
                }
            }
            Event::Empty(e) => {
                seen_root = true;

                // An empty <item/> has neither title nor enclosure, so it is never opened
                if let Some(item) = current.as_mut() {
                    capture_attributes(item, ns, &e, &reader)?;
                    // <title/> counts as a present but empty title
                    if capturing.is_none() {
                        if let Some(field) = field_for(ns, e.local_name().as_ref()) {
                            item.slot(field).get_or_insert_with(String::new);
                        }
                    }
                }
            }
            Event::End(_) => {
                if matches!(capturing, Some((_, d)) if d == depth) {
                    capturing = None;
                }
                if current.is_some() && depth == item_depth {
                    if let Some(item) = current.take().and_then(ItemBuilder::build) {
                        items.push(item);
                    } else {
                        tracing::debug!("Skipping feed item without title or enclosure");
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(e) => {
                if let (Some((field, _)), Some(item)) = (capturing, current.as_mut()) {
                    let text = e.unescape()?;
                    append(item.slot(field), &text);
                }
            }
            Event::CData(e) => {
                if let (Some((field, _)), Some(item)) = (capturing, current.as_mut()) {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    append(item.slot(field), &text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(ParseError::Empty);
    }
    if depth > 0 {
        return Err(ParseError::Unclosed(depth));
    }

    Ok(items)
}

/// Namespace of an element, reduced to what the parser cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NsKind {
    /// No namespace (plain RSS elements)
    Plain,
    /// The iTunes podcast extension
    Itunes,
    Other,
}

impl NsKind {
    fn of(resolved: &ResolveResult<'_>) -> Self {
        match resolved {
            ResolveResult::Unbound => NsKind::Plain,
            ResolveResult::Bound(Namespace(uri)) if *uri == ITUNES_NS => NsKind::Itunes,
            _ => NsKind::Other,
        }
    }
}

fn field_for(ns: NsKind, local: &[u8]) -> Option<Field> {
    match (ns, local) {
        (NsKind::Plain, b"title") => Some(Field::Title),
        (NsKind::Plain, b"description") => Some(Field::Description),
        (NsKind::Plain, b"pubDate") => Some(Field::PubDate),
        (NsKind::Itunes, b"duration") => Some(Field::Duration),
        _ => None,
    }
}

/// Reads `enclosure@url` and `itunes:image@href` into the item.
fn capture_attributes(
    item: &mut ItemBuilder,
    ns: NsKind,
    e: &BytesStart<'_>,
    reader: &NsReader<&[u8]>,
) -> Result<(), ParseError> {
    let (slot, key): (&mut Option<String>, &[u8]) = match (ns, e.local_name().as_ref()) {
        (NsKind::Plain, b"enclosure") => (&mut item.audio_url, &b"url"[..]),
        (NsKind::Itunes, b"image") => (&mut item.image_url, &b"href"[..]),
        _ => return Ok(()),
    };

    if slot.is_some() {
        return Ok(());
    }

    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(err) => {
                tracing::warn!(error = %err, "Skipping malformed feed attribute");
                continue;
            }
        };
        if attr.key.as_ref() == key {
            let value = attr.decode_and_unescape_value(reader.decoder())?;
            *slot = Some(value.into_owned());
            break;
        }
    }

    Ok(())
}

fn append(slot: &mut Option<String>, text: &str) {
    match slot {
        Some(existing) => existing.push_str(text),
        None => *slot = Some(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PODCAST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
  <channel>
    <title>Ubuntu Tales</title>
    <itunes:image href="https://example.com/show.jpg"/>
    <item>
      <title><![CDATA[The <b>Lion</b> &amp; the Hare]]></title>
      <description><![CDATA[<p>A clever hare outwits a lion.</p>]]></description>
      <enclosure url="https://cdn.example.com/ep1.mp3?a=1&amp;b=2" length="123" type="audio/mpeg"/>
      <itunes:duration>00:12:34</itunes:duration>
      <itunes:image href="https://example.com/ep1.jpg"/>
      <itunes:title>Should be ignored</itunes:title>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Bedtime &amp; Dreams</title>
      <enclosure url="https://cdn.example.com/ep2.mp3" type="audio/mpeg"/>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_extracts_all_fields() {
        let items = parse_feed(PODCAST.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(
            items[0],
            FeedItem {
                title: "The <b>Lion</b> &amp; the Hare".to_string(),
                description: Some("<p>A clever hare outwits a lion.</p>".to_string()),
                audio_url: "https://cdn.example.com/ep1.mp3?a=1&b=2".to_string(),
                duration: "00:12:34".to_string(),
                image_url: "https://example.com/ep1.jpg".to_string(),
                pub_date: "Mon, 01 Jan 2024 00:00:00 GMT".to_string(),
            }
        );
    }

    #[test]
    fn test_mixed_text_and_cdata_keep_inner_whitespace() {
        let xml = r#"<rss><channel><item>
            <title>Sun <![CDATA[and]]> day</title>
            <description>The big <![CDATA[<b>lion</b>]]> story</description>
            <enclosure url="https://cdn.example.com/a.mp3"/>
        </item></channel></rss>"#;

        let items = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(items[0].title, "Sun and day");
        assert_eq!(
            items[0].description.as_deref(),
            Some("The big <b>lion</b> story")
        );
    }

    #[test]
    fn test_surrounding_whitespace_left_for_sanitizer() {
        let xml = r#"<rss><channel><item>
            <title>
                Padded title
            </title>
            <enclosure url="https://cdn.example.com/a.mp3"/>
            <itunes:duration xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd"> 00:03:00 </itunes:duration>
        </item></channel></rss>"#;

        let items = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(items[0].title.trim(), "Padded title");
        assert!(items[0].title.starts_with('\n'));
        assert_eq!(
            crate::util::clean_html(Some(&items[0].title)),
            "Padded title"
        );
        assert_eq!(items[0].duration, "00:03:00");
    }

    #[test]
    fn test_defaults_for_missing_optional_fields() {
        let items = parse_feed(PODCAST.as_bytes()).unwrap();
        let second = &items[1];

        assert_eq!(second.title, "Bedtime & Dreams");
        assert_eq!(second.description, None);
        assert_eq!(second.duration, DEFAULT_DURATION);
        // Channel-level artwork does not leak into items
        assert_eq!(second.image_url, "");
        assert_eq!(second.pub_date, "");
    }

    #[test]
    fn test_items_without_title_or_enclosure_skipped() {
        let xml = r#"<rss><channel>
            <item><description>Neither title nor enclosure</description></item>
            <item><title>No audio</title></item>
            <item><enclosure url="https://example.com/a.mp3"/></item>
            <item/>
            <item><title>Kept</title><enclosure url="https://example.com/b.mp3"/></item>
        </channel></rss>"#;

        let items = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Kept");
    }

    #[test]
    fn test_empty_title_element_still_counts() {
        let xml = r#"<rss><channel>
            <item><title/><enclosure url="https://example.com/a.mp3"/></item>
        </channel></rss>"#;

        let items = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "");
    }

    #[test]
    fn test_enclosure_without_url_skipped() {
        let xml = r#"<rss><channel>
            <item><title>T</title><enclosure type="audio/mpeg"/></item>
        </channel></rss>"#;

        assert!(parse_feed(xml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_itunes_fields_require_namespace() {
        // Prefix bound to a different URI is not the podcast extension
        let xml = r#"<rss xmlns:itunes="http://example.com/not-itunes"><channel>
            <item>
              <title>T</title>
              <enclosure url="https://example.com/a.mp3"/>
              <itunes:duration>01:00:00</itunes:duration>
            </item>
        </channel></rss>"#;

        let items = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(items[0].duration, DEFAULT_DURATION);
    }

    #[test]
    fn test_preserves_document_order() {
        let xml = r#"<rss><channel>
            <item><title>First</title><enclosure url="u1"/></item>
            <item><title>Second</title><enclosure url="u2"/></item>
            <item><title>Third</title><enclosure url="u3"/></item>
        </channel></rss>"#;

        let titles: Vec<String> = parse_feed(xml.as_bytes())
            .unwrap()
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_empty_channel() {
        let xml = r#"<?xml version="1.0"?><rss version="2.0"><channel></channel></rss>"#;
        assert!(parse_feed(xml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_xml_errors() {
        assert!(parse_feed(b"<not valid xml").is_err());
        assert!(parse_feed(b"<rss><channel></rss>").is_err());
        assert!(matches!(
            parse_feed(b"<rss><channel>"),
            Err(ParseError::Unclosed(_)) | Err(ParseError::Xml(_))
        ));
    }

    #[test]
    fn test_empty_document_errors() {
        assert!(matches!(parse_feed(b""), Err(ParseError::Empty)));
        assert!(matches!(parse_feed(b"just some text"), Err(ParseError::Empty)));
    }
}
