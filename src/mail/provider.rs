use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

use super::headers::parse_sender;
use super::models::{EmailSummary, GmailTokenModel, TokenState};
use super::token_repository::{GmailTokenRepository, InMemoryGmailTokenRepository};
use crate::company::models::CompanyModel;
use crate::shared::AppError;

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const GMAIL_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

/// How many messages a municipality listing fetches at most
const MAX_MESSAGES: u32 = 25;

/// Trait for the mail provider collaborator
#[async_trait]
pub trait MailProvider {
    /// Current OAuth state for this user
    async fn token_state(&self, user_id: &str) -> Result<TokenState, AppError>;

    /// Issues the consent-screen URL and marks the user pending. The
    /// `return_to` deep link travels in the OAuth `state` parameter so the
    /// callback can send the user back where they started.
    async fn begin_authorization(
        &self,
        user_id: &str,
        return_to: &str,
    ) -> Result<String, AppError>;

    /// Exchanges an authorization code and persists the token against the
    /// user. On failure nothing is persisted and the user returns to the
    /// NoToken state.
    async fn set_token(&self, code: &str, user_id: &str) -> Result<(), AppError>;

    /// Lists email summaries for messages matching the municipality
    async fn emails_per_municipality(
        &self,
        user_id: &str,
        company: &CompanyModel,
    ) -> Result<Vec<EmailSummary>, AppError>;
}

/// OAuth client configuration for the Gmail provider
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl OAuthConfig {
    pub fn from_env() -> Self {
        Self {
            client_id: std::env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            client_secret: std::env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            redirect_uri: std::env::var("GOOGLE_REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:3000/auth/google/callback".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Gmail implementation backed by the stored per-user tokens
pub struct GmailMailProvider {
    http: reqwest::Client,
    tokens: Arc<dyn GmailTokenRepository + Send + Sync>,
    oauth: OAuthConfig,
}

impl GmailMailProvider {
    pub fn new(tokens: Arc<dyn GmailTokenRepository + Send + Sync>, oauth: OAuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            tokens,
            oauth,
        }
    }

    /// Returns a usable access token, refreshing it first when expired
    async fn access_token(&self, user_id: &str) -> Result<String, AppError> {
        let token = self
            .tokens
            .get_token(user_id)
            .await?
            .filter(|t| t.state == TokenState::Authorized)
            .ok_or_else(|| {
                AppError::MailProviderError("No authorized Gmail token for user".to_string())
            })?;

        if !token.is_access_token_expired() {
            return token.access_token.ok_or_else(|| {
                AppError::MailProviderError("Authorized token row has no access token".to_string())
            });
        }

        self.refresh_access_token(token).await
    }

    #[instrument(skip(self, token))]
    async fn refresh_access_token(&self, token: GmailTokenModel) -> Result<String, AppError> {
        let refresh_token = token.refresh_token.clone().ok_or_else(|| {
            AppError::MailProviderError("Access token expired and no refresh token stored".to_string())
        })?;

        debug!(user_id = %token.user_id, "Refreshing Gmail access token");

        let response = self
            .http
            .post(GOOGLE_TOKEN_URI)
            .form(&[
                ("client_id", self.oauth.client_id.as_str()),
                ("client_secret", self.oauth.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::MailProviderError(format!("Token refresh failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::MailProviderError(format!(
                "Token refresh rejected with status {}",
                response.status()
            )));
        }

        let refreshed: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::MailProviderError(format!("Invalid token response: {}", e)))?;

        let expiry = Utc::now() + Duration::seconds(refreshed.expires_in.unwrap_or(3600));
        let updated = GmailTokenModel::authorized(
            token.user_id.clone(),
            refreshed.access_token.clone(),
            // A refresh response usually omits the refresh token; keep the stored one
            refreshed.refresh_token.or(Some(refresh_token)),
            expiry,
        );
        self.tokens.upsert_token(&updated).await?;

        Ok(refreshed.access_token)
    }

    fn gmail_hub(
        &self,
        access_token: String,
    ) -> Result<
        google_gmail1::Gmail<hyper_rustls::HttpsConnector<hyper::client::HttpConnector>>,
        AppError,
    > {
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| AppError::MailProviderError(format!("TLS setup failed: {}", e)))?
            .https_or_http()
            .enable_http1()
            .build();

        Ok(google_gmail1::Gmail::new(
            hyper::Client::builder().build(connector),
            access_token,
        ))
    }
}

#[async_trait]
impl MailProvider for GmailMailProvider {
    #[instrument(skip(self))]
    async fn token_state(&self, user_id: &str) -> Result<TokenState, AppError> {
        Ok(self
            .tokens
            .get_token(user_id)
            .await?
            .map(|t| t.state)
            .unwrap_or(TokenState::NoToken))
    }

    #[instrument(skip(self))]
    async fn begin_authorization(
        &self,
        user_id: &str,
        return_to: &str,
    ) -> Result<String, AppError> {
        let url = reqwest::Url::parse_with_params(
            GOOGLE_AUTH_URI,
            &[
                ("client_id", self.oauth.client_id.as_str()),
                ("redirect_uri", self.oauth.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", GMAIL_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", return_to),
            ],
        )
        .map_err(|e| AppError::MailProviderError(format!("Invalid consent URL: {}", e)))?;

        self.tokens
            .upsert_token(&GmailTokenModel::pending(user_id.to_string()))
            .await?;

        info!(user_id = %user_id, "Issued Gmail consent redirect");
        Ok(url.to_string())
    }

    #[instrument(skip(self, code))]
    async fn set_token(&self, code: &str, user_id: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(GOOGLE_TOKEN_URI)
            .form(&[
                ("code", code),
                ("client_id", self.oauth.client_id.as_str()),
                ("client_secret", self.oauth.client_secret.as_str()),
                ("redirect_uri", self.oauth.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await;

        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(status = %response.status(), "Code exchange rejected");
                self.tokens.clear_token(user_id).await?;
                return Err(AppError::MailProviderError(format!(
                    "Code exchange rejected with status {}",
                    response.status()
                )));
            }
            Err(e) => {
                warn!(error = %e, "Code exchange request failed");
                self.tokens.clear_token(user_id).await?;
                return Err(AppError::MailProviderError(format!(
                    "Code exchange failed: {}",
                    e
                )));
            }
        };

        let exchanged: TokenResponse = match response.json().await {
            Ok(exchanged) => exchanged,
            Err(e) => {
                self.tokens.clear_token(user_id).await?;
                return Err(AppError::MailProviderError(format!(
                    "Invalid token response: {}",
                    e
                )));
            }
        };

        let expiry = Utc::now() + Duration::seconds(exchanged.expires_in.unwrap_or(3600));
        self.tokens
            .upsert_token(&GmailTokenModel::authorized(
                user_id.to_string(),
                exchanged.access_token,
                exchanged.refresh_token,
                expiry,
            ))
            .await?;

        info!(user_id = %user_id, "Gmail token stored");
        Ok(())
    }

    #[instrument(skip(self, company), fields(company_id = %company.id))]
    async fn emails_per_municipality(
        &self,
        user_id: &str,
        company: &CompanyModel,
    ) -> Result<Vec<EmailSummary>, AppError> {
        let access_token = self.access_token(user_id).await?;
        let hub = self.gmail_hub(access_token)?;

        let query = format!("\"{}\"", company.name);
        let (_, message_list) = hub
            .users()
            .messages_list("me")
            .q(&query)
            .max_results(MAX_MESSAGES)
            .doit()
            .await
            .map_err(|e| AppError::MailProviderError(format!("Failed to list messages: {}", e)))?;

        let ids: Vec<String> = message_list
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| m.id)
            .collect();

        let mut summaries = Vec::with_capacity(ids.len());
        for id in ids {
            let (_, msg) = hub
                .users()
                .messages_get("me", &id)
                .format("full")
                .doit()
                .await
                .map_err(|e| {
                    AppError::MailProviderError(format!("Failed to get message {}: {}", id, e))
                })?;

            let mut from = None;
            let mut subject = None;
            let mut date = None;

            if let Some(payload) = &msg.payload {
                if let Some(headers) = &payload.headers {
                    for header in headers {
                        match header.name.as_deref() {
                            Some("From") => from = header.value.clone(),
                            Some("Subject") => subject = header.value.clone(),
                            Some("Date") => date = header.value.clone(),
                            _ => {}
                        }
                    }
                }
            }

            let sender = parse_sender(from.as_deref().unwrap_or(""));
            summaries.push(EmailSummary {
                sender_name: sender.name,
                sender_email: sender.email,
                subject: subject.unwrap_or_default(),
                date: date.unwrap_or_default(),
                company_id: company.id.clone(),
            });
        }

        debug!(
            company_id = %company.id,
            messages = summaries.len(),
            "Municipality emails listed"
        );
        Ok(summaries)
    }
}

/// In-memory implementation of MailProvider for development and testing.
/// Exchanges any non-empty code and serves preloaded summaries.
pub struct InMemoryMailProvider {
    tokens: InMemoryGmailTokenRepository,
    emails: Mutex<HashMap<String, Vec<EmailSummary>>>, // keyed by company id
}

impl Default for InMemoryMailProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMailProvider {
    pub fn new() -> Self {
        Self {
            tokens: InMemoryGmailTokenRepository::new(),
            emails: Mutex::new(HashMap::new()),
        }
    }

    /// Preloads summaries, keyed by their company id
    pub fn with_emails(emails: Vec<EmailSummary>) -> Self {
        let mut map: HashMap<String, Vec<EmailSummary>> = HashMap::new();
        for email in emails {
            map.entry(email.company_id.clone()).or_default().push(email);
        }

        Self {
            tokens: InMemoryGmailTokenRepository::new(),
            emails: Mutex::new(map),
        }
    }

    /// Puts a user straight into the Authorized state
    pub async fn authorize_user(&self, user_id: &str) {
        self.tokens
            .upsert_token(&GmailTokenModel::authorized(
                user_id.to_string(),
                "in-memory-access-token".to_string(),
                Some("in-memory-refresh-token".to_string()),
                Utc::now() + Duration::hours(1),
            ))
            .await
            .expect("in-memory upsert cannot fail");
    }
}

#[async_trait]
impl MailProvider for InMemoryMailProvider {
    async fn token_state(&self, user_id: &str) -> Result<TokenState, AppError> {
        Ok(self
            .tokens
            .get_token(user_id)
            .await?
            .map(|t| t.state)
            .unwrap_or(TokenState::NoToken))
    }

    async fn begin_authorization(
        &self,
        user_id: &str,
        return_to: &str,
    ) -> Result<String, AppError> {
        self.tokens
            .upsert_token(&GmailTokenModel::pending(user_id.to_string()))
            .await?;

        Ok(format!("https://mail.invalid/consent?state={}", return_to))
    }

    async fn set_token(&self, code: &str, user_id: &str) -> Result<(), AppError> {
        if code.is_empty() {
            self.tokens.clear_token(user_id).await?;
            return Err(AppError::MailProviderError(
                "Empty authorization code".to_string(),
            ));
        }

        self.tokens
            .upsert_token(&GmailTokenModel::authorized(
                user_id.to_string(),
                format!("access-for-{}", code),
                Some("refresh".to_string()),
                Utc::now() + Duration::hours(1),
            ))
            .await
    }

    async fn emails_per_municipality(
        &self,
        user_id: &str,
        company: &CompanyModel,
    ) -> Result<Vec<EmailSummary>, AppError> {
        if self.token_state(user_id).await? != TokenState::Authorized {
            return Err(AppError::MailProviderError(
                "No authorized Gmail token for user".to_string(),
            ));
        }

        let emails = self.emails.lock().unwrap();
        Ok(emails.get(&company.id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_company() -> CompanyModel {
        CompanyModel::new("Alpha".to_string(), "001".to_string())
    }

    #[tokio::test]
    async fn test_state_machine_no_token_to_pending_to_authorized() {
        let provider = InMemoryMailProvider::new();

        assert_eq!(
            provider.token_state("user-1").await.unwrap(),
            TokenState::NoToken
        );

        let consent = provider
            .begin_authorization("user-1", "/companies/c1/emails")
            .await
            .unwrap();
        assert!(consent.contains("state=/companies/c1/emails"));
        assert_eq!(
            provider.token_state("user-1").await.unwrap(),
            TokenState::PendingAuthorization
        );

        provider.set_token("auth-code", "user-1").await.unwrap();
        assert_eq!(
            provider.token_state("user-1").await.unwrap(),
            TokenState::Authorized
        );
    }

    #[tokio::test]
    async fn test_failed_exchange_returns_to_no_token() {
        let provider = InMemoryMailProvider::new();

        provider
            .begin_authorization("user-1", "/")
            .await
            .unwrap();

        let result = provider.set_token("", "user-1").await;
        assert!(result.is_err());
        assert_eq!(
            provider.token_state("user-1").await.unwrap(),
            TokenState::NoToken
        );
    }

    #[tokio::test]
    async fn test_emails_require_authorization() {
        let provider = InMemoryMailProvider::new();
        let company = test_company();

        let result = provider.emails_per_municipality("user-1", &company).await;
        assert!(matches!(result, Err(AppError::MailProviderError(_))));
    }

    #[tokio::test]
    async fn test_emails_served_per_company() {
        let company = test_company();
        let other = CompanyModel::new("Beta".to_string(), "002".to_string());

        let provider = InMemoryMailProvider::with_emails(vec![EmailSummary {
            sender_name: "Jane Doe".to_string(),
            sender_email: "jane@x.com".to_string(),
            subject: "Permit".to_string(),
            date: "Mon, 3 Jun 2024 10:00:00 +0000".to_string(),
            company_id: company.id.clone(),
        }]);
        provider.authorize_user("user-1").await;

        let emails = provider
            .emails_per_municipality("user-1", &company)
            .await
            .unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].sender_name, "Jane Doe");

        let none = provider
            .emails_per_municipality("user-1", &other)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_oauth_config_default_redirect() {
        // Only exercise the default; env vars are unset in tests
        let config = OAuthConfig {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://localhost:3000/auth/google/callback".to_string(),
        };
        assert!(config.redirect_uri.ends_with("/auth/google/callback"));
    }
}
