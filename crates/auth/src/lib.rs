//! PIN verification and session admission decisions.
//!
//! Framework-agnostic: this crate knows nothing about HTTP headers, cookies,
//! or status codes. `courtrelay-gateway` extracts the IP/UA/cookie from the
//! request, runs the rate limiter and bot filter, then asks `AuthService`
//! to decide.

use chrono::{DateTime, Utc};
use courtrelay_session::{Session, SessionStore};
use std::sync::Arc;

/// PIN verification + session lifecycle, independent of any transport.
pub struct AuthService {
    pin: String,
    sessions: Arc<SessionStore>,
}

impl AuthService {
    pub fn new(pin: String, sessions: Arc<SessionStore>) -> Self {
        Self { pin, sessions }
    }

    /// Constant-time comparison is not required: the PIN is a low-value,
    /// short, rate-limited secret.
    pub fn verify_pin(&self, candidate: &str) -> bool {
        candidate == self.pin
    }

    /// Attempt login. Returns the new session on a correct PIN, `None`
    /// otherwise. The caller is responsible for rate-limiting attempts
    /// before calling this.
    pub async fn login(&self, pin: &str, user_agent: &str, ip: &str) -> Option<Session> {
        if !self.verify_pin(pin) {
            return None;
        }
        Some(self.sessions.create(user_agent, ip).await)
    }

    /// Delete the session if it exists. Idempotent.
    pub async fn logout(&self, session_id: Option<&str>) {
        if let Some(id) = session_id {
            self.sessions.delete(id).await;
        }
    }

    /// Validate and touch a session, returning it if live.
    pub async fn admit(&self, session_id: Option<&str>) -> Option<Session> {
        let id = session_id?;
        let session = self.sessions.get(id).await?;
        self.sessions.touch(id).await;
        Some(session)
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }
}

/// Session cookie's expiry, surfaced in login/probe JSON bodies.
pub fn expiry_of(session: &Session) -> DateTime<Utc> {
    session.expires_at
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtrelay_core::{FrozenClock, RelayClock};

    fn service() -> (AuthService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let clock: Arc<dyn RelayClock> = Arc::new(FrozenClock::new(Utc::now()));
        let sessions = Arc::new(SessionStore::load(dir.path().join("sessions.json"), clock));
        (AuthService::new("274683".into(), sessions), dir)
    }

    #[tokio::test]
    async fn correct_pin_issues_session() {
        let (auth, ..) = service();
        let session = auth.login("274683", "Mozilla/5.0", "10.0.0.1").await;
        assert!(session.is_some());
    }

    #[tokio::test]
    async fn wrong_pin_is_rejected() {
        let (auth, ..) = service();
        let session = auth.login("000000", "Mozilla/5.0", "10.0.0.1").await;
        assert!(session.is_none());
    }

    #[tokio::test]
    async fn admit_touches_a_live_session() {
        let (auth, ..) = service();
        let session = auth.login("274683", "ua", "1.2.3.4").await.unwrap();
        let admitted = auth.admit(Some(&session.id)).await;
        assert!(admitted.is_some());
    }

    #[tokio::test]
    async fn admit_rejects_unknown_session() {
        let (auth, ..) = service();
        assert!(auth.admit(Some("does-not-exist")).await.is_none());
    }

    #[tokio::test]
    async fn admit_rejects_missing_cookie() {
        let (auth, ..) = service();
        assert!(auth.admit(None).await.is_none());
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let (auth, ..) = service();
        let session = auth.login("274683", "ua", "1.2.3.4").await.unwrap();
        auth.logout(Some(&session.id)).await;
        auth.logout(Some(&session.id)).await; // second call: no-op, no panic
        assert!(auth.admit(Some(&session.id)).await.is_none());
    }

    #[tokio::test]
    async fn logout_with_no_cookie_is_a_no_op() {
        let (auth, ..) = service();
        auth.logout(None).await;
    }
}
