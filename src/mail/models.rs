use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user OAuth state, tagged explicitly rather than inferred from which
/// token fields happen to be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    NoToken,
    PendingAuthorization,
    Authorized,
}

impl TokenState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenState::NoToken => "no_token",
            TokenState::PendingAuthorization => "pending_authorization",
            TokenState::Authorized => "authorized",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "pending_authorization" => TokenState::PendingAuthorization,
            "authorized" => TokenState::Authorized,
            _ => TokenState::NoToken,
        }
    }
}

/// Database model for the gmail_tokens table. One row per user.
/// Never exposed to clients.
#[derive(Debug, Clone)]
pub struct GmailTokenModel {
    pub user_id: String,
    pub state: TokenState,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
}

impl GmailTokenModel {
    /// A row marking that the consent redirect has been issued
    pub fn pending(user_id: String) -> Self {
        Self {
            user_id,
            state: TokenState::PendingAuthorization,
            access_token: None,
            refresh_token: None,
            expiry: None,
        }
    }

    /// A fully authorized row
    pub fn authorized(
        user_id: String,
        access_token: String,
        refresh_token: Option<String>,
        expiry: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            state: TokenState::Authorized,
            access_token: Some(access_token),
            // Google only returns a refresh token on the first consent
            refresh_token: refresh_token.filter(|v| !v.is_empty()),
            expiry: Some(expiry),
        }
    }

    /// Whether the access token needs a refresh before use
    pub fn is_access_token_expired(&self) -> bool {
        match self.expiry {
            Some(expiry) => Utc::now() >= expiry,
            None => true,
        }
    }
}

/// Derived from Gmail API responses; never persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailSummary {
    pub sender_name: String,
    pub sender_email: String,
    pub subject: String,
    pub date: String,
    pub company_id: String,
}
