mod messages;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use serenity::async_trait;
use serenity::model::channel::{Message, Reaction};
use serenity::model::event::MessageUpdateEvent;
use serenity::model::gateway::Ready;
use serenity::model::id::ChannelId;
use serenity::prelude::*;
use tokio::sync::Mutex;

use crate::services::codeblock::gateway::{IncomingMessage, MessageEdit};
use crate::services::codeblock::{CodeBlockWatcher, EditOutcome, MessageOutcome};
use crate::services::config::Config;
use crate::services::utils::truncate_str;

use messages::SerenityGateway;

/// Shared state: the watcher plus the bookkeeping of the Discord adapter
pub(crate) struct SharedData {
    pub watcher: CodeBlockWatcher,
    /// Per-channel timestamp of the last Discord API call (for rate limiting)
    pub api_timestamps: Mutex<HashMap<ChannelId, tokio::time::Instant>>,
    /// Guidance message id → users allowed to delete it by reaction
    pub pending_deletions: Mutex<HashMap<u64, Vec<u64>>>,
    pub self_destruct_after: Duration,
}

impl SharedData {
    pub fn new(config: &Config) -> Self {
        Self {
            watcher: CodeBlockWatcher::new(config),
            api_timestamps: Mutex::new(HashMap::new()),
            pending_deletions: Mutex::new(HashMap::new()),
            self_destruct_after: Duration::from_secs(config.self_destruct_secs),
        }
    }
}

pub(crate) type SharedState = Arc<SharedData>;

/// TypeMapKey for storing shared state in serenity's data map
struct BotState;
impl TypeMapKey for BotState {
    type Value = SharedState;
}

async fn shared_state(ctx: &Context) -> Option<SharedState> {
    let data = ctx.data.read().await;
    data.get::<BotState>().cloned()
}

struct Handler;

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        let Some(state) = shared_state(&ctx).await else {
            return;
        };

        let category_id = messages::channel_category(&ctx, msg.channel_id).await;
        let incoming = IncomingMessage {
            id: msg.id.get(),
            channel_id: msg.channel_id.get(),
            category_id,
            author_id: msg.author.id.get(),
            author_is_bot: msg.author.bot,
            content: msg.content.clone(),
        };

        let gateway = SerenityGateway::new(ctx.http.clone(), state.clone());
        let ts = chrono::Local::now().format("%H:%M:%S");
        match state.watcher.on_message_created(&gateway, &incoming).await {
            Ok(MessageOutcome::GuidanceSent { guidance_id }) => {
                let preview = truncate_str(&msg.content, 60).replace('\n', " ");
                println!(
                    "  [{ts}] ▶ [{}({})] Guidance {guidance_id} sent for: {preview}",
                    msg.author.name,
                    msg.author.id.get()
                );
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Failed to handle message {}: {e}", msg.id.get());
                println!("  [{ts}]   ⚠ Discord error: {e}");
            }
        }
    }

    async fn message_update(
        &self,
        ctx: Context,
        _old_if_available: Option<Message>,
        _new: Option<Message>,
        event: MessageUpdateEvent,
    ) {
        let Some(state) = shared_state(&ctx).await else {
            return;
        };

        let edit = MessageEdit {
            message_id: event.id.get(),
            channel_id: Some(event.channel_id.get()),
            content: event.content.clone(),
        };

        let gateway = SerenityGateway::new(ctx.http.clone(), state.clone());
        let ts = chrono::Local::now().format("%H:%M:%S");
        match state.watcher.on_message_edited(&gateway, &edit).await {
            Ok(EditOutcome::Retracted) => {
                println!("  [{ts}] ✓ Message {} fixed, guidance removed", edit.message_id);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Failed to reconcile edit of message {}: {e}", edit.message_id);
                println!("  [{ts}]   ⚠ Discord error: {e}");
            }
        }
    }

    async fn reaction_add(&self, ctx: Context, reaction: Reaction) {
        let Some(state) = shared_state(&ctx).await else {
            return;
        };
        messages::handle_deletion_reaction(&ctx.http, &state, &reaction).await;
    }

    async fn ready(&self, _: Context, ready: Ready) {
        println!("  ✓ Bot connected as {} — Watching for unformatted code", ready.user.name);
    }
}

/// Entry point: start the Discord bot
pub async fn run_bot(token: &str, config: Config) {
    let shared_state: SharedState = Arc::new(SharedData::new(&config));

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::MESSAGE_CONTENT;

    let client = Client::builder(token, intents)
        .event_handler(Handler)
        .type_map_insert::<BotState>(shared_state)
        .await;

    let mut client = match client {
        Ok(c) => c,
        Err(e) => {
            eprintln!("  ✗ Failed to create Discord client: {e}");
            return;
        }
    };

    if let Err(e) = client.start().await {
        eprintln!("  ✗ Discord client error: {e}");
    }
}

#[cfg(test)]
mod tests;
