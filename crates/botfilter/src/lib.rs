//! Bot/crawler rejection policy.
//!
//! Case-insensitive substring match against a fixed token set. The set is a
//! policy constant, not configurable at runtime — symmetric with the
//! allowlist-style policy structs used elsewhere in the relay.

const BOT_TOKENS: &[&str] = &[
    "bot",
    "crawler",
    "spider",
    "scraper",
    "curl",
    "wget",
    "python-requests",
    "headless",
    "phantom",
    "selenium",
];

/// Stateless bot-filter policy.
pub struct BotFilter;

impl BotFilter {
    /// True iff `user_agent` matches one of the known bot tokens.
    /// An empty user-agent is permitted (returns false).
    pub fn is_bot(user_agent: &str) -> bool {
        is_bot(user_agent)
    }
}

/// Free function form, for call sites that don't want the unit-struct
/// ceremony.
pub fn is_bot(user_agent: &str) -> bool {
    if user_agent.is_empty() {
        return false;
    }
    let lower = user_agent.to_lowercase();
    BOT_TOKENS.iter().any(|token| lower.contains(token))
}
