pub mod gate;
pub mod gateway;
pub mod instructions;
pub mod parsing;
pub mod tracker;
pub mod validate;

use log::{debug, info, trace};
use tokio::sync::Mutex;

use crate::services::config::Config;
use crate::services::token_scan;

use gate::{epoch_now, CooldownGate};
use gateway::{ChatGateway, GatewayError, IncomingMessage, MessageEdit};
use tracker::GuidanceTracker;
use validate::Verdict;

/// Why no guidance was produced for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbstainReason {
    /// Already a valid Python block, too short, or nothing usable between the fences.
    NothingRecovered,
    NotCode,
    OnlyExpressions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assessment {
    Guidance(String),
    Abstain(AbstainReason),
}

/// Run the detection pipeline on raw message content.
///
/// Wrong-fence messages take the tick branch, which does not consult the
/// parser: the decoy fence already shows the user meant to post code.
/// Backtick blocks without a language get the syntax-highlighting hint
/// instead of the plain code block instructions.
pub fn assess(content: &str) -> Assessment {
    if parsing::has_wrong_fence(content) {
        return match instructions::wrong_ticks_message(content) {
            Some(message) => Assessment::Guidance(message),
            None => Assessment::Abstain(AbstainReason::NothingRecovered),
        };
    }

    let untagged = parsing::has_untagged_fence(content);
    let Some(candidate) = parsing::strip_fence(content, false) else {
        return Assessment::Abstain(AbstainReason::NothingRecovered);
    };

    match validate::classify(&candidate.normalized, candidate.is_repl_code) {
        Verdict::NotCode => Assessment::Abstain(AbstainReason::NotCode),
        Verdict::AmbiguousAbstain => Assessment::Abstain(AbstainReason::OnlyExpressions),
        Verdict::Code if untagged => Assessment::Guidance(instructions::no_lang_message(&candidate)),
        Verdict::Code => Assessment::Guidance(instructions::no_ticks_message(&candidate)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Failed the eligibility checks (bot author, channel, length, token).
    Skipped,
    OnCooldown,
    Abstained(AbstainReason),
    GuidanceSent { guidance_id: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Not a flagged message, or the payload lacks content/channel.
    Untracked,
    /// The edited message could not be fetched anymore.
    Abandoned,
    StillUnformatted,
    /// Guidance deleted and tracking dropped.
    Retracted,
}

/// Long-lived owner of the cooldown and guidance state.
pub struct CodeBlockWatcher {
    gate: Mutex<CooldownGate>,
    tracker: Mutex<GuidanceTracker>,
}

impl CodeBlockWatcher {
    pub fn new(config: &Config) -> Self {
        Self {
            gate: Mutex::new(CooldownGate::new(config)),
            tracker: Mutex::new(GuidanceTracker::new()),
        }
    }

    /// Detect poorly formatted Python in a new message and send instructions if needed.
    pub async fn on_message_created(
        &self,
        gateway: &dyn ChatGateway,
        message: &IncomingMessage,
    ) -> Result<MessageOutcome, GatewayError> {
        let token_found = token_scan::find_token(&message.content);
        // The window is claimed before the send so concurrent messages see it.
        let previous_warning = {
            let mut gate = self.gate.lock().await;
            if !gate.should_evaluate(message, token_found) {
                return Ok(MessageOutcome::Skipped);
            }
            let now = epoch_now();
            if gate.is_on_cooldown(message.channel_id, now) {
                trace!("Channel {} is on cooldown, ignoring message {}", message.channel_id, message.id);
                return Ok(MessageOutcome::OnCooldown);
            }
            let previous = gate.last_warning(message.channel_id);
            gate.record_warning(message.channel_id, now);
            previous
        };

        let guidance = match assess(&message.content) {
            Assessment::Guidance(text) => text,
            Assessment::Abstain(reason) => {
                trace!("No instructions for message {}: {:?}", message.id, reason);
                self.gate.lock().await.restore_warning(message.channel_id, previous_warning);
                return Ok(MessageOutcome::Abstained(reason));
            }
        };

        info!(
            "User {} posted something that needed to be put inside python code blocks. \
             Sending the user some instructions.",
            message.author_id
        );
        let greeting = format!("Hey <@{}>!", message.author_id);
        let guidance_id = match gateway
            .send_message(message.channel_id, Some(&greeting), Some(&guidance))
            .await
        {
            Ok(id) => id,
            Err(e) => {
                self.gate.lock().await.restore_warning(message.channel_id, previous_warning);
                return Err(e);
            }
        };

        self.tracker.lock().await.insert(message.id, guidance_id);
        gateway.schedule_self_destruct(message.channel_id, guidance_id, vec![message.author_id]);

        Ok(MessageOutcome::GuidanceSent { guidance_id })
    }

    /// Retract the guidance for a flagged message once it has been edited into shape.
    pub async fn on_message_edited(
        &self,
        gateway: &dyn ChatGateway,
        edit: &MessageEdit,
    ) -> Result<EditOutcome, GatewayError> {
        let Some(guidance_id) = self.tracker.lock().await.guidance_for(edit.message_id) else {
            return Ok(EditOutcome::Untracked);
        };
        let (Some(channel_id), Some(content)) = (edit.channel_id, edit.content.as_deref()) else {
            return Ok(EditOutcome::Untracked);
        };

        match gateway.fetch_message(channel_id, edit.message_id).await {
            Ok(_) => {}
            Err(GatewayError::NotFound) => {
                debug!("Edited message {} is gone; abandoning reconciliation", edit.message_id);
                return Ok(EditOutcome::Abandoned);
            }
            Err(e) => return Err(e),
        }

        let bad_fence = parsing::has_wrong_fence(content);
        if parsing::strip_fence(content, bad_fence).is_some() {
            trace!("Message {} still holds an unformatted code block", edit.message_id);
            return Ok(EditOutcome::StillUnformatted);
        }

        match gateway.delete_message(channel_id, guidance_id).await {
            // Already removed by its timer or a reaction.
            Ok(()) | Err(GatewayError::NotFound) => {}
            Err(e) => return Err(e),
        }
        self.tracker.lock().await.remove(edit.message_id);
        info!("User's code block in message {} has been fixed. Removed guidance {}", edit.message_id, guidance_id);

        Ok(EditOutcome::Retracted)
    }

    pub async fn tracked_guidance(&self, flagged_id: u64) -> Option<u64> {
        self.tracker.lock().await.guidance_for(flagged_id)
    }

    pub async fn tracked_count(&self) -> usize {
        self.tracker.lock().await.len()
    }

    pub async fn last_warning(&self, channel_id: u64) -> Option<f64> {
        self.gate.lock().await.last_warning(channel_id)
    }
}
