//! Pure inbound-frame classification, independent of any transport.
//!
//! The peer loop (owned by the HTTP crate, which holds the actual socket)
//! hands every decoded text frame to `decide_inbound` and acts on the
//! result — no JSON parsing or auth comparison happens at the socket layer
//! itself.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundDecision {
    /// `{type:"auth", password}` matched the configured password.
    AuthSuccess,
    /// `{type:"auth", password}` did not match.
    AuthFailed,
    /// Not an auth frame, and the peer isn't authorized yet.
    Rejected,
    /// Forward this frame verbatim to the hub for routing.
    Route(String),
    /// Malformed JSON or missing `type` — log and ignore, connection stays up.
    Drop,
}

/// Classify one inbound text frame.
///
/// `authorized` is the peer's current state; `password` is the relay's
/// configured WS-level secret (empty disables auth, so everyone starts
/// authorized and this function is never reached with `Rejected`).
pub fn decide_inbound(raw: &str, authorized: bool, password: &str) -> InboundDecision {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => return InboundDecision::Drop,
    };
    let Some(frame_type) = value.get("type").and_then(Value::as_str) else {
        return InboundDecision::Drop;
    };

    if frame_type == "auth" {
        let candidate = value.get("password").and_then(Value::as_str).unwrap_or("");
        return if candidate == password {
            InboundDecision::AuthSuccess
        } else {
            InboundDecision::AuthFailed
        };
    }

    if !authorized && !password.is_empty() {
        return InboundDecision::Rejected;
    }

    InboundDecision::Route(raw.to_string())
}

pub const AUTH_SUCCESS_FRAME: &str = r#"{"type":"auth_success","status":"ok"}"#;
pub const AUTH_FAILED_FRAME: &str =
    r#"{"type":"auth_failed","status":"error","message":"Invalid password"}"#;
pub const NOT_AUTHORIZED_FRAME: &str = r#"{"type":"error","message":"Not authorized"}"#;
pub const CONTROLLER_CONNECTED_FRAME: &str = r#"{"type":"controller_connected"}"#;
pub const CONTROLLER_DISCONNECTED_FRAME: &str = r#"{"type":"controller_disconnected"}"#;
