use std::sync::Arc;

use feedhorn_core::feed::{clamp_feed_size, FeedFetcher};
use feedhorn_core::subscription::{StoreError, SubscriptionStore};

use crate::blocks::{
    self, feed_error_text, MessageTemplate, SUCCESS_TEXT, UNEXPECTED_ERROR_TEXT,
};
use crate::form::SlashPayload;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedCommand {
    Subscribe { alias: String, url: String },
    Unsubscribe { alias: String },
    List,
    Fetch { alias: String, size: Option<String> },
    DefaultFeed { size: Option<String> },
    Help,
    Invalid { command: String },
}

/// Every command outcome renders as one of these; bare acknowledgements and
/// plain-text failures skip the block structure entirely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandReply {
    Text(String),
    Message(MessageTemplate),
}

/// Split the slash-command text into a command and positional arguments.
///
/// The first token, lower-cased, selects the command; a bare leading integer
/// is shorthand for the default feed with that entry count. No quoting, no
/// de-duplication; arguments keep their whitespace-split form verbatim.
pub fn parse_feed_command(text: &str) -> FeedCommand {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return FeedCommand::DefaultFeed { size: None };
    }

    let mut parts = trimmed.split_whitespace();
    let first = parts.next().unwrap_or_default();
    if first.parse::<i64>().is_ok() {
        return FeedCommand::DefaultFeed { size: Some(first.to_owned()) };
    }

    let verb = first.to_ascii_lowercase();
    match verb.as_str() {
        "subscribe" => match (parts.next(), parts.next()) {
            (Some(alias), Some(url)) => {
                FeedCommand::Subscribe { alias: alias.to_owned(), url: url.to_owned() }
            }
            _ => FeedCommand::Invalid { command: verb },
        },
        "unsubscribe" => match parts.next() {
            Some(alias) => FeedCommand::Unsubscribe { alias: alias.to_owned() },
            None => FeedCommand::Invalid { command: verb },
        },
        "list" => FeedCommand::List,
        "fetch" => match parts.next() {
            Some(alias) => FeedCommand::Fetch {
                alias: alias.to_owned(),
                size: parts.next().map(ToOwned::to_owned),
            },
            None => FeedCommand::Invalid { command: verb },
        },
        _ => FeedCommand::Help,
    }
}

/// Stateless per-call dispatcher over the command table.
///
/// Argument validation happens at parse time, before any collaborator call;
/// the router converts every lower-level failure into a reply, so `route`
/// cannot fail outward.
pub struct CommandRouter {
    store: Arc<dyn SubscriptionStore>,
    fetcher: Arc<dyn FeedFetcher>,
    default_feed_url: Option<String>,
}

impl CommandRouter {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        fetcher: Arc<dyn FeedFetcher>,
        default_feed_url: Option<String>,
    ) -> Self {
        Self { store, fetcher, default_feed_url }
    }

    pub async fn route(&self, payload: &SlashPayload) -> CommandReply {
        let command = parse_feed_command(&payload.text);
        match self.dispatch(command, &payload.user_id).await {
            Ok(reply) => reply,
            Err(error) => {
                tracing::error!(
                    error = %error,
                    user_id = %payload.user_id,
                    text = %payload.text,
                    "command handler failed"
                );
                CommandReply::Text(UNEXPECTED_ERROR_TEXT.to_owned())
            }
        }
    }

    async fn dispatch(
        &self,
        command: FeedCommand,
        user_id: &str,
    ) -> Result<CommandReply, StoreError> {
        match command {
            FeedCommand::Subscribe { alias, url } => {
                self.store.upsert(user_id, &alias, &url).await?;
                Ok(CommandReply::Text(SUCCESS_TEXT.to_owned()))
            }
            FeedCommand::Unsubscribe { alias } => {
                // Deleting an absent alias is a successful no-op.
                self.store.delete(user_id, &alias).await?;
                Ok(CommandReply::Text(SUCCESS_TEXT.to_owned()))
            }
            FeedCommand::List => self.list_subscriptions(user_id).await,
            FeedCommand::Fetch { alias, size } => {
                match self.store.get(user_id, &alias).await? {
                    Some(url) => Ok(self.render_feed(&url, size.as_deref()).await),
                    // Unknown alias falls back to the full subscription list.
                    // Documented behavior, flagged for product review.
                    None => self.list_subscriptions(user_id).await,
                }
            }
            FeedCommand::DefaultFeed { size } => match self.default_feed_url.clone() {
                Some(url) => Ok(self.render_feed(&url, size.as_deref()).await),
                None => Ok(CommandReply::Message(blocks::commands_usage_message())),
            },
            FeedCommand::Help => Ok(CommandReply::Message(blocks::commands_usage_message())),
            FeedCommand::Invalid { command } => {
                Ok(CommandReply::Message(blocks::command_usage_message(&command)))
            }
        }
    }

    async fn list_subscriptions(&self, user_id: &str) -> Result<CommandReply, StoreError> {
        let subscriptions = self.store.list_all(user_id).await?;
        Ok(CommandReply::Message(blocks::subscription_list_message(&subscriptions)))
    }

    async fn render_feed(&self, url: &str, size: Option<&str>) -> CommandReply {
        let feed_size = clamp_feed_size(size);
        match self.fetcher.fetch(url).await {
            Ok(feed) => CommandReply::Message(blocks::feed_message(&feed, feed_size)),
            Err(error) => {
                tracing::warn!(error = %error, url = %url, "feed fetch failed");
                CommandReply::Text(feed_error_text(url))
            }
        }
    }
}
