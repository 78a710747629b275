use std::collections::HashMap;

use serenity::model::channel::ReactionType;
use serenity::Error as SerenityError;

use super::messages::{gateway_error, is_deletion_emoji, is_gone_status, may_delete, DELETION_EMOJI};
use super::SharedData;
use crate::services::codeblock::gateway::GatewayError;
use crate::services::config::Config;

// --- deletion reaction ---

#[test]
fn test_deletion_emoji_plain() {
    assert!(is_deletion_emoji(&ReactionType::Unicode(DELETION_EMOJI.to_string())));
}

#[test]
fn test_deletion_emoji_with_presentation_selector() {
    assert!(is_deletion_emoji(&ReactionType::Unicode("\u{1F5D1}\u{FE0F}".to_string())));
}

#[test]
fn test_other_emoji_ignored() {
    assert!(!is_deletion_emoji(&ReactionType::Unicode("👍".to_string())));
    assert!(!is_deletion_emoji(&ReactionType::Unicode("\u{1F5D1}\u{1F5D1}".to_string())));
}

#[test]
fn test_only_authorized_users_may_delete() {
    let mut pending = HashMap::new();
    pending.insert(9000u64, vec![42u64]);

    assert!(may_delete(&pending, 9000, 42));
    assert!(!may_delete(&pending, 9000, 43));
    assert!(!may_delete(&pending, 9001, 42));
}

// --- error mapping ---

#[test]
fn test_non_http_error_is_transport() {
    let mapped = gateway_error(SerenityError::Other("gateway closed"));
    assert!(matches!(mapped, GatewayError::Transport(ref msg) if msg.contains("gateway closed")));
}

#[test]
fn test_lost_access_counts_as_gone() {
    assert!(is_gone_status(404));
    assert!(is_gone_status(403));
    assert!(!is_gone_status(429));
    assert!(!is_gone_status(500));
}

// --- shared state ---

#[tokio::test]
async fn test_shared_data_from_config() {
    let config = Config {
        cooldown_channels: vec![1],
        self_destruct_secs: 42,
        ..Config::default()
    };
    let state = SharedData::new(&config);

    assert_eq!(state.self_destruct_after.as_secs(), 42);
    assert!(state.pending_deletions.lock().await.is_empty());
    assert!(state.api_timestamps.lock().await.is_empty());
    assert_eq!(state.watcher.tracked_count().await, 0);
}
