use std::collections::{HashMap, HashSet};

use crate::services::config::Config;

use super::gateway::IncomingMessage;

/// Decides whether a message is worth classifying and whether its channel
/// may receive another warning yet.
pub struct CooldownGate {
    /// channel id → epoch seconds of the last warning sent there
    channel_cooldowns: HashMap<u64, f64>,
    /// Channels that are watched but never put on cooldown
    whitelist: HashSet<u64>,
    help_categories: HashSet<u64>,
    cooldown_secs: f64,
    /// Skip cooldown checks entirely (local testing)
    debug: bool,
}

impl CooldownGate {
    pub fn new(config: &Config) -> Self {
        Self {
            channel_cooldowns: config.cooldown_channels.iter().map(|&id| (id, 0.0)).collect(),
            whitelist: config.whitelist_channels.iter().copied().collect(),
            help_categories: config.help_categories.iter().copied().collect(),
            cooldown_secs: config.cooldown_secs as f64,
            debug: config.debug,
        }
    }

    fn is_help_channel(&self, message: &IncomingMessage) -> bool {
        message
            .category_id
            .is_some_and(|category| self.help_categories.contains(&category))
    }

    /// Help channels, cooldown channels and whitelisted channels are watched.
    pub fn is_valid_channel(&self, message: &IncomingMessage) -> bool {
        self.is_help_channel(message)
            || self.channel_cooldowns.contains_key(&message.channel_id)
            || self.whitelist.contains(&message.channel_id)
    }

    /// A qualifying message is not from a bot, sits in a watched channel,
    /// has more than 3 lines and carries no auth token.
    pub fn should_evaluate(&self, message: &IncomingMessage, token_found: bool) -> bool {
        !message.author_is_bot
            && self.is_valid_channel(message)
            && message.content.lines().count() > 3
            && !token_found
    }

    /// True if a warning was sent in `channel_id` less than `cooldown_secs` before `now`.
    pub fn is_on_cooldown(&self, channel_id: u64, now: f64) -> bool {
        if self.debug {
            return false;
        }
        match self.channel_cooldowns.get(&channel_id) {
            Some(last) => now - last < self.cooldown_secs,
            None => false,
        }
    }

    /// Start the cooldown window for `channel_id`. Whitelisted channels are left alone.
    pub fn record_warning(&mut self, channel_id: u64, now: f64) {
        if self.whitelist.contains(&channel_id) {
            return;
        }
        self.channel_cooldowns.insert(channel_id, now);
    }

    /// Undo a `record_warning` whose guidance was never sent.
    pub fn restore_warning(&mut self, channel_id: u64, previous: Option<f64>) {
        if self.whitelist.contains(&channel_id) {
            return;
        }
        match previous {
            Some(at) => self.channel_cooldowns.insert(channel_id, at),
            None => self.channel_cooldowns.remove(&channel_id),
        };
    }

    pub fn last_warning(&self, channel_id: u64) -> Option<f64> {
        self.channel_cooldowns.get(&channel_id).copied()
    }
}

/// Current wall-clock time as fractional epoch seconds.
pub fn epoch_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
