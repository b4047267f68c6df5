use serde::Serialize;

use feedhorn_core::feed::Feed;
use feedhorn_core::subscription::Subscription;

pub const SUCCESS_TEXT: &str = "Success";
pub const UNEXPECTED_ERROR_TEXT: &str = "Unexpected Error, please try again later.";

pub fn feed_error_text(url: &str) -> String {
    format!("Error getting feed from {url}")
}

/// Fixed usage table; order matches the command enumeration in the help text.
const COMMAND_USAGE: &[(&str, &str)] = &[
    ("subscribe", "Subscribe to a new feed: `/rss subscribe <alias> <url>`"),
    ("fetch", "Fetch news from an existing feed: `/rss fetch <alias> [size]`"),
    ("list", "List existing subscriptions: `/rss list`"),
    ("unsubscribe", "Remove an existing subscription: `/rss unsubscribe <alias>`"),
];

fn usage_for(command: &str) -> Option<&'static str> {
    COMMAND_USAGE
        .iter()
        .find(|(name, _)| *name == command)
        .map(|(_, usage)| *usage)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    PlainText { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::PlainText { text } | Self::Mrkdwn { text } => text,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { block_id: String, text: TextObject },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    #[serde(skip)]
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section(mut self, block_id: impl Into<String>, text: TextObject) -> Self {
        self.blocks.push(Block::Section { block_id: block_id.into(), text });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

/// Render a fetched feed: title block plus at most `feed_size` entries,
/// first-N in the order the fetcher returned them.
pub fn feed_message(feed: &Feed, feed_size: usize) -> MessageTemplate {
    let entries = feed
        .items
        .iter()
        .take(feed_size)
        .map(|entry| format!("- <{}|{}>", entry.link, entry.title))
        .collect::<Vec<_>>()
        .join("\n");

    MessageBuilder::new(feed.title.clone())
        .section("feed.title.v1", TextObject::mrkdwn(feed.title.clone()))
        .section("feed.entries.v1", TextObject::mrkdwn(entries))
        .build()
}

pub fn subscription_list_message(subscriptions: &[Subscription]) -> MessageTemplate {
    if subscriptions.is_empty() {
        return MessageBuilder::new("No available subscriptions.")
            .section("subs.title.v1", TextObject::mrkdwn("No available subscriptions."))
            .build();
    }

    let entries = subscriptions
        .iter()
        .map(|sub| format!("- <{}|{}>", sub.feed_url, sub.alias))
        .collect::<Vec<_>>()
        .join("\n");

    MessageBuilder::new("Available Subscriptions:")
        .section("subs.title.v1", TextObject::mrkdwn("Available Subscriptions:"))
        .section("subs.entries.v1", TextObject::mrkdwn(entries))
        .build()
}

/// Full command enumeration shown for `help` and unrecognized commands.
pub fn commands_usage_message() -> MessageTemplate {
    let usage_lines = COMMAND_USAGE
        .iter()
        .map(|(_, usage)| *usage)
        .collect::<Vec<_>>()
        .join("\n");

    MessageBuilder::new("Feedhorn command help")
        .section(
            "usage.title.v1",
            TextObject::mrkdwn(
                "Valid Commands: `subscribe`, `fetch`, `list`, `unsubscribe`, `help`",
            ),
        )
        .section("usage.commands.v1", TextObject::mrkdwn(usage_lines))
        .build()
}

/// Single-command usage shown when a known command got too few arguments.
pub fn command_usage_message(command: &str) -> MessageTemplate {
    let usage = match usage_for(command) {
        Some(usage) => usage.to_owned(),
        None => {
            return commands_usage_message();
        }
    };

    MessageBuilder::new(format!("Invalid Usage for `{command}`."))
        .section("usage.title.v1", TextObject::mrkdwn(format!("Invalid Usage for `{command}`.")))
        .section("usage.command.v1", TextObject::mrkdwn(usage))
        .build()
}

#[cfg(test)]
mod tests {
    use feedhorn_core::feed::{Feed, FeedEntry};
    use feedhorn_core::subscription::Subscription;

    use super::{
        command_usage_message, commands_usage_message, feed_message, subscription_list_message,
        Block, TextObject,
    };

    fn section_text(block: &Block) -> &str {
        let Block::Section { text, .. } = block;
        text.text()
    }

    fn sample_feed() -> Feed {
        Feed {
            title: "Example News".to_string(),
            items: (1..=4)
                .map(|n| FeedEntry {
                    title: format!("Story {n}"),
                    link: format!("https://example.com/{n}"),
                })
                .collect(),
        }
    }

    #[test]
    fn feed_message_truncates_to_feed_size_in_source_order() {
        let message = feed_message(&sample_feed(), 2);

        assert_eq!(message.blocks.len(), 2);
        assert_eq!(section_text(&message.blocks[0]), "Example News");
        assert_eq!(
            section_text(&message.blocks[1]),
            "- <https://example.com/1|Story 1>\n- <https://example.com/2|Story 2>"
        );
    }

    #[test]
    fn feed_message_renders_all_entries_when_size_exceeds_feed() {
        let message = feed_message(&sample_feed(), 25);
        let entries = section_text(&message.blocks[1]);
        assert_eq!(entries.lines().count(), 4);
    }

    #[test]
    fn empty_subscription_list_renders_single_title_block() {
        let message = subscription_list_message(&[]);

        assert_eq!(message.blocks.len(), 1);
        assert_eq!(section_text(&message.blocks[0]), "No available subscriptions.");
    }

    #[test]
    fn subscription_list_renders_alias_links() {
        let subs = vec![Subscription {
            user_id: "u1".to_string(),
            alias: "news".to_string(),
            feed_url: "http://x".to_string(),
        }];
        let message = subscription_list_message(&subs);

        assert_eq!(message.blocks.len(), 2);
        assert_eq!(section_text(&message.blocks[0]), "Available Subscriptions:");
        assert_eq!(section_text(&message.blocks[1]), "- <http://x|news>");
    }

    #[test]
    fn full_usage_enumerates_every_command() {
        let message = commands_usage_message();
        let enumeration = section_text(&message.blocks[0]);
        let usage = section_text(&message.blocks[1]);

        for command in ["subscribe", "fetch", "list", "unsubscribe", "help"] {
            assert!(enumeration.contains(command), "enumeration should mention {command}");
        }
        assert!(usage.contains("/rss subscribe <alias> <url>"));
    }

    #[test]
    fn single_command_usage_names_the_command() {
        let message = command_usage_message("subscribe");

        assert_eq!(section_text(&message.blocks[0]), "Invalid Usage for `subscribe`.");
        assert!(section_text(&message.blocks[1]).contains("/rss subscribe <alias> <url>"));
    }

    #[test]
    fn unknown_command_usage_falls_back_to_full_enumeration() {
        let message = command_usage_message("bogus");
        assert!(section_text(&message.blocks[0]).starts_with("Valid Commands"));
    }

    #[test]
    fn blocks_serialize_with_slack_type_tags() {
        let message = feed_message(&sample_feed(), 1);
        let json = serde_json::to_value(&message).expect("serialize");

        assert_eq!(json["blocks"][0]["type"], "section");
        assert_eq!(json["blocks"][0]["text"]["type"], "mrkdwn");
    }

    #[test]
    fn plain_text_objects_use_the_slack_type_name() {
        let json = serde_json::to_value(TextObject::plain("hi")).expect("serialize");
        assert_eq!(json["type"], "plain_text");
    }
}
