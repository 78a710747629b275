/// Detection of Discord bot tokens accidentally pasted into chat.
///
/// A token is three base64url segments joined by dots: the user id, a
/// timestamp and an HMAC. Only the first two are checked.

use std::sync::OnceLock;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use log::trace;
use regex::Regex;

/// Token timestamps count from this epoch (2011-01-01T00:00:00Z)...
const TOKEN_EPOCH: u128 = 1_293_840_000;
/// ...and cannot predate Discord itself (2015-01-01T00:00:00Z).
const DISCORD_EPOCH: u128 = 1_420_070_400;

fn token_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"([^\s.()"']+)\.([^\s.()"']+)\.([^\s.()"']+)"#).expect("Invalid token regex pattern")
    })
}

fn decode_padded(segment: &str) -> Option<Vec<u8>> {
    let padding = (4 - segment.len() % 4) % 4;
    let padded = format!("{}{}", segment, "=".repeat(padding));
    URL_SAFE.decode(padded).ok()
}

/// The first segment must decode to a numeric snowflake.
pub fn is_valid_user_id(segment: &str) -> bool {
    let Some(bytes) = decode_padded(segment) else {
        return false;
    };
    match String::from_utf8(bytes) {
        Ok(text) => !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()),
        Err(_) => false,
    }
}

/// The second segment is a big-endian timestamp relative to `TOKEN_EPOCH`.
pub fn is_valid_timestamp(segment: &str) -> bool {
    let Some(bytes) = decode_padded(segment) else {
        return false;
    };
    if bytes.len() > 16 {
        // Wider than u128: certainly past the Discord epoch.
        return true;
    }
    let timestamp = bytes.iter().fold(0u128, |acc, &b| (acc << 8) | u128::from(b));
    timestamp + TOKEN_EPOCH >= DISCORD_EPOCH
}

/// True if `content` contains something that looks like a live bot token.
pub fn find_token(content: &str) -> bool {
    for caps in token_regex().captures_iter(content) {
        let (Some(user_id), Some(timestamp)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if is_valid_user_id(user_id.as_str()) && is_valid_timestamp(timestamp.as_str()) {
            trace!("Found a token-like string in message content");
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn fake_token(user_id: &str, timestamp: u32) -> String {
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(user_id),
            URL_SAFE_NO_PAD.encode(timestamp.to_be_bytes()),
            "QhXwLk7Yf3bT0aZc9dMnRsUvPq4"
        )
    }

    #[test]
    fn test_find_token_detects_plausible_token() {
        let token = fake_token("123456789012345678", 200_000_000);
        let content = format!("my bot won't start\nTOKEN = {token}\nbot.run(TOKEN)\nplease help");
        assert!(find_token(&content));
    }

    #[test]
    fn test_find_token_ignores_dotted_names() {
        assert!(!find_token("import os.path.join\nos.path.join(a, b)"));
    }

    #[test]
    fn test_user_id_must_be_numeric() {
        assert!(is_valid_user_id(&URL_SAFE_NO_PAD.encode("80351110224678912")));
        assert!(!is_valid_user_id(&URL_SAFE_NO_PAD.encode("not-a-number")));
        assert!(!is_valid_user_id(""));
    }

    #[test]
    fn test_timestamp_before_discord_epoch_rejected() {
        // 1 second after the token epoch is long before Discord existed.
        assert!(!is_valid_timestamp(&URL_SAFE_NO_PAD.encode(1u32.to_be_bytes())));
        assert!(is_valid_timestamp(&URL_SAFE_NO_PAD.encode(200_000_000u32.to_be_bytes())));
    }
}
