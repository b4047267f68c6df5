use quick_xml::events::Event;
use quick_xml::reader::Reader;

use feedhorn_core::feed::{Feed, FeedEntry};

/// Parse an RSS channel from raw XML bytes.
///
/// Extracts the channel title and each `<item>`'s title and link in
/// document order. Entries are never reordered.
pub fn parse_rss_feed(xml: &[u8]) -> Result<Feed, String> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut channel_title: Option<String> = None;
    let mut items = Vec::new();
    let mut buf = Vec::new();

    let mut current_entry: Option<FeedEntryBuilder> = None;
    let mut current_element = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                current_element = name.clone();

                if name == "item" {
                    current_entry = Some(FeedEntryBuilder::default());
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                if name == "item" {
                    if let Some(builder) = current_entry.take() {
                        if let Some(entry) = builder.build() {
                            items.push(entry);
                        }
                    }
                }
                current_element.clear();
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if text.is_empty() {
                    continue;
                }
                record_text(&mut channel_title, &mut current_entry, &current_element, text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                if text.is_empty() {
                    continue;
                }
                record_text(&mut channel_title, &mut current_entry, &current_element, text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML parse error: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    if channel_title.is_none() && items.is_empty() {
        return Err("document contains no RSS channel".to_string());
    }

    Ok(Feed { title: channel_title.unwrap_or_default(), items })
}

fn record_text(
    channel_title: &mut Option<String>,
    current_entry: &mut Option<FeedEntryBuilder>,
    current_element: &str,
    text: String,
) {
    if let Some(entry) = current_entry {
        match current_element {
            "title" => entry.title = Some(text),
            "link" => entry.link = Some(text),
            _ => {}
        }
    } else if current_element == "title" && channel_title.is_none() {
        *channel_title = Some(text);
    }
}

#[derive(Default)]
struct FeedEntryBuilder {
    title: Option<String>,
    link: Option<String>,
}

impl FeedEntryBuilder {
    fn build(self) -> Option<FeedEntry> {
        // A link is mandatory; a missing title falls back to the link text.
        let link = self.link?;
        let title = self.title.unwrap_or_else(|| link.clone());
        Some(FeedEntry { title, link })
    }
}

#[cfg(test)]
mod tests {
    use super::parse_rss_feed;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example News</title>
    <link>https://example.com</link>
    <item>
      <title>First story</title>
      <link>https://example.com/1</link>
    </item>
    <item>
      <title>Second story</title>
      <link>https://example.com/2</link>
    </item>
    <item>
      <title>Third story</title>
      <link>https://example.com/3</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_channel_title_and_items_in_document_order() {
        let feed = parse_rss_feed(SAMPLE_FEED.as_bytes()).expect("parse");

        assert_eq!(feed.title, "Example News");
        assert_eq!(feed.items.len(), 3);

        let titles: Vec<&str> = feed.items.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, vec!["First story", "Second story", "Third story"]);
        assert_eq!(feed.items[0].link, "https://example.com/1");
    }

    #[test]
    fn channel_title_is_not_overwritten_by_item_titles() {
        let feed = parse_rss_feed(SAMPLE_FEED.as_bytes()).expect("parse");
        assert_eq!(feed.title, "Example News");
    }

    #[test]
    fn cdata_titles_are_extracted() {
        let xml = r#"<rss><channel>
            <title><![CDATA[Wrapped & Escaped]]></title>
            <item><title><![CDATA[A <b>story</b>]]></title><link>https://example.com/x</link></item>
        </channel></rss>"#;

        let feed = parse_rss_feed(xml.as_bytes()).expect("parse");
        assert_eq!(feed.title, "Wrapped & Escaped");
        assert_eq!(feed.items[0].title, "A <b>story</b>");
    }

    #[test]
    fn items_without_links_are_skipped() {
        let xml = r#"<rss><channel>
            <title>Partial</title>
            <item><title>No link here</title></item>
            <item><title>Linked</title><link>https://example.com/ok</link></item>
        </channel></rss>"#;

        let feed = parse_rss_feed(xml.as_bytes()).expect("parse");
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].link, "https://example.com/ok");
    }

    #[test]
    fn missing_item_title_falls_back_to_the_link() {
        let xml = r#"<rss><channel>
            <title>Partial</title>
            <item><link>https://example.com/untitled</link></item>
        </channel></rss>"#;

        let feed = parse_rss_feed(xml.as_bytes()).expect("parse");
        assert_eq!(feed.items[0].title, "https://example.com/untitled");
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let result = parse_rss_feed(b"<rss><channel><title>Broken</unclosed>");
        assert!(result.is_err());
    }

    #[test]
    fn non_feed_document_is_rejected() {
        let result = parse_rss_feed(b"<html><body>not a feed</body></html>");
        assert!(result.is_err());
    }
}
