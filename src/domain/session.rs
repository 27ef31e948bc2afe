use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Caller context for one routing request.
///
/// Passed explicitly into every `decide` call instead of being looked up from
/// ambient state. The bearer token is redacted from `Debug` output.
#[derive(Clone)]
pub struct Session {
    pub merchant_id: String,
    pub request_id: Uuid,
    pub opened_at: DateTime<Utc>,
    token: Option<String>,
}

impl Session {
    pub fn new(merchant_id: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            request_id: Uuid::new_v4(),
            opened_at: Utc::now(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Whether the caller presented a bearer token. The token itself never leaves the session.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("merchant_id", &self.merchant_id)
            .field("request_id", &self.request_id)
            .field("opened_at", &self.opened_at)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
