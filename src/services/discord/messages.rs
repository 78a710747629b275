use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serenity::builder::{CreateEmbed, CreateMessage};
use serenity::http::Http;
use serenity::model::channel::{Reaction, ReactionType};
use serenity::model::id::{ChannelId, MessageId};
use serenity::prelude::*;

use crate::services::codeblock::gateway::{ChatGateway, GatewayError, IncomingMessage};

use super::{SharedData, SharedState};

/// Reacting with this on a guidance message deletes it (wastebasket).
pub const DELETION_EMOJI: char = '\u{1F5D1}';

/// Per-channel rate limiter (1 second gap for Discord)
pub async fn rate_limit_wait(state: &SharedData, channel_id: ChannelId) {
    let min_gap = tokio::time::Duration::from_millis(1000);
    let sleep_until = {
        let mut timestamps = state.api_timestamps.lock().await;
        let last = timestamps.entry(channel_id).or_insert_with(||
            tokio::time::Instant::now() - tokio::time::Duration::from_secs(10)
        );
        let earliest_next = *last + min_gap;
        let now = tokio::time::Instant::now();
        let target = if earliest_next > now { earliest_next } else { now };
        *last = target;
        target
    };
    tokio::time::sleep_until(sleep_until).await;
}

/// Missing, or no longer visible to the bot.
pub fn is_gone_status(status: u16) -> bool {
    matches!(status, 403 | 404)
}

/// Map serenity failures onto the watcher's error taxonomy (403/404 → NotFound).
pub fn gateway_error(e: SerenityError) -> GatewayError {
    if let SerenityError::Http(http_error) = &e {
        if http_error.status_code().is_some_and(|s| is_gone_status(s.as_u16())) {
            return GatewayError::NotFound;
        }
    }
    GatewayError::Transport(e.to_string())
}

/// Parent category of a guild channel, if any.
pub async fn channel_category(ctx: &Context, channel_id: ChannelId) -> Option<u64> {
    match channel_id.to_channel(ctx).await {
        Ok(channel) => channel.guild().and_then(|c| c.parent_id).map(|id| id.get()),
        Err(e) => {
            debug!("Could not look up channel {}: {e}", channel_id.get());
            None
        }
    }
}

pub fn is_deletion_emoji(emoji: &ReactionType) -> bool {
    match emoji {
        // Clients may append the emoji presentation selector.
        ReactionType::Unicode(s) => s.trim_end_matches('\u{FE0F}').chars().eq([DELETION_EMOJI]),
        _ => false,
    }
}

/// True if `user_id` may delete the pending guidance `message_id`.
pub fn may_delete(pending: &HashMap<u64, Vec<u64>>, message_id: u64, user_id: u64) -> bool {
    pending
        .get(&message_id)
        .is_some_and(|users| users.contains(&user_id))
}

/// Delete a guidance message when its author's target reacts with the wastebasket.
pub async fn handle_deletion_reaction(http: &Http, state: &SharedData, reaction: &Reaction) {
    if !is_deletion_emoji(&reaction.emoji) {
        return;
    }
    let Some(user_id) = reaction.user_id else {
        return;
    };
    let message_id = reaction.message_id.get();

    {
        let mut pending = state.pending_deletions.lock().await;
        if !may_delete(&pending, message_id, user_id.get()) {
            return;
        }
        pending.remove(&message_id);
    }

    if let Err(e) = reaction.channel_id.delete_message(http, reaction.message_id).await {
        debug!("Guidance {message_id} could not be deleted on reaction: {e}");
    }
}

/// Detached task: offer the wastebasket reaction, then delete after the timeout
/// unless a reaction already did.
pub fn spawn_self_destruct(
    http: Arc<Http>,
    state: SharedState,
    channel_id: ChannelId,
    message_id: MessageId,
    authorized_user_ids: Vec<u64>,
) {
    tokio::spawn(async move {
        state
            .pending_deletions
            .lock()
            .await
            .insert(message_id.get(), authorized_user_ids);

        if let Err(e) = channel_id.create_reaction(&http, message_id, DELETION_EMOJI).await {
            debug!("Could not add deletion reaction to {}: {e}", message_id.get());
        }

        tokio::time::sleep(state.self_destruct_after).await;

        let still_pending = state.pending_deletions.lock().await.remove(&message_id.get()).is_some();
        if still_pending {
            if let Err(e) = channel_id.delete_message(&http, message_id).await {
                debug!("Guidance {} already gone: {e}", message_id.get());
            }
        }
    });
}

/// `ChatGateway` over serenity's HTTP client.
pub struct SerenityGateway {
    http: Arc<Http>,
    state: SharedState,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>, state: SharedState) -> Self {
        Self { http, state }
    }
}

#[async_trait]
impl ChatGateway for SerenityGateway {
    async fn send_message(
        &self,
        channel_id: u64,
        content: Option<&str>,
        embed: Option<&str>,
    ) -> Result<u64, GatewayError> {
        let channel_id = ChannelId::new(channel_id);
        let mut builder = CreateMessage::new();
        if let Some(content) = content {
            builder = builder.content(content);
        }
        if let Some(description) = embed {
            builder = builder.embed(CreateEmbed::new().description(description));
        }

        rate_limit_wait(&self.state, channel_id).await;
        let sent = channel_id
            .send_message(&self.http, builder)
            .await
            .map_err(gateway_error)?;
        Ok(sent.id.get())
    }

    async fn fetch_message(&self, channel_id: u64, message_id: u64) -> Result<IncomingMessage, GatewayError> {
        let msg = ChannelId::new(channel_id)
            .message(&self.http, MessageId::new(message_id))
            .await
            .map_err(gateway_error)?;
        Ok(IncomingMessage {
            id: msg.id.get(),
            channel_id: msg.channel_id.get(),
            category_id: None,
            author_id: msg.author.id.get(),
            author_is_bot: msg.author.bot,
            content: msg.content,
        })
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), GatewayError> {
        ChannelId::new(channel_id)
            .delete_message(&self.http, MessageId::new(message_id))
            .await
            .map_err(gateway_error)
    }

    fn schedule_self_destruct(&self, channel_id: u64, message_id: u64, authorized_user_ids: Vec<u64>) {
        spawn_self_destruct(
            self.http.clone(),
            self.state.clone(),
            ChannelId::new(channel_id),
            MessageId::new(message_id),
            authorized_user_ids,
        );
    }
}
