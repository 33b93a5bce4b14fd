use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::SessionModel,
    repository::SessionRepository,
    token::TokenConfig,
    types::{AuthResponse, SessionClaims},
};
use crate::shared::AppError;
use crate::user::{hash_password, verify_password, UserModel};
use crate::user::repository::UserRepository;

/// Service for handling the session/auth gateway business logic
pub struct SessionService {
    token_config: TokenConfig,
    user_repository: Arc<dyn UserRepository + Send + Sync>,
    session_repository: Arc<dyn SessionRepository + Send + Sync>,
}

impl SessionService {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        session_repository: Arc<dyn SessionRepository + Send + Sync>,
    ) -> Self {
        Self {
            token_config: TokenConfig::new(),
            user_repository,
            session_repository,
        }
    }

    /// Creates a new user account and an initial session.
    /// Password/confirm mismatch is validated at the route layer before this runs.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<AuthResponse, AppError> {
        if self
            .user_repository
            .get_user_by_email(email)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest(
                "An account with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(password)?;
        let user = UserModel::new(email.to_string(), name.to_string(), password_hash);
        self.user_repository.create_user(&user).await?;

        info!(user_id = %user.id, "User created, opening initial session");
        self.open_session(&user).await
    }

    /// Verifies credentials and opens a session
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = match self.user_repository.get_user_by_email(email).await? {
            Some(user) => user,
            None => {
                warn!("Login attempt for unknown email");
                return Err(AppError::BadRequest(
                    "Invalid email or password".to_string(),
                ));
            }
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AppError::BadRequest(
                "Invalid email or password".to_string(),
            ));
        }

        self.open_session(&user).await
    }

    /// Creates the session row and a signed token for an authenticated user
    async fn open_session(&self, user: &UserModel) -> Result<AuthResponse, AppError> {
        let session = SessionModel::new(user.id.clone(), self.token_config.expiration_days);
        self.session_repository.create_session(&session).await?;

        let token = self.token_config.create_token(
            session.id.clone(),
            user.id.clone(),
            user.email.clone(),
        )?;

        info!(session_id = %session.id, user_id = %user.id, "Session opened");

        Ok(AuthResponse {
            token,
            user_id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
        })
    }

    /// Validates a session token against both its signature and the session row.
    /// A token whose row is missing or expired is not a valid session.
    #[instrument(skip(self, token))]
    pub async fn validate_session(&self, token: &str) -> Result<SessionClaims, AppError> {
        let claims = self.token_config.validate_token(token)?;

        match self.session_repository.get_session(&claims.session_id).await? {
            Some(session) if !session.is_expired() => Ok(claims),
            Some(_) => {
                warn!(session_id = %claims.session_id, "Session row found but expired");
                Err(AppError::Unauthenticated)
            }
            None => {
                warn!(session_id = %claims.session_id, "Session row missing - logged out or reaped");
                Err(AppError::Unauthenticated)
            }
        }
    }

    /// Deletes the current session row
    #[instrument(skip(self))]
    pub async fn logout(&self, session_id: &str) -> Result<(), AppError> {
        self.session_repository.delete_session(session_id).await?;
        info!(session_id = %session_id, "Session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::repository::InMemorySessionRepository;
    use crate::user::repository::InMemoryUserRepository;

    fn make_service() -> (Arc<InMemoryUserRepository>, Arc<InMemorySessionRepository>, SessionService) {
        let users = Arc::new(InMemoryUserRepository::new());
        let sessions = Arc::new(InMemorySessionRepository::new());
        let service = SessionService::new(users.clone(), sessions.clone());
        (users, sessions, service)
    }

    #[tokio::test]
    async fn test_sign_up_and_validate() {
        let (_, _, service) = make_service();

        let auth = service
            .sign_up("staff@example.com", "Staff", "hunter2")
            .await
            .unwrap();
        assert!(!auth.token.is_empty());

        let claims = service.validate_session(&auth.token).await.unwrap();
        assert_eq!(claims.email, "staff@example.com");
        assert_eq!(claims.user_id, auth.user_id);
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_email() {
        let (_, _, service) = make_service();

        service
            .sign_up("staff@example.com", "Staff", "hunter2")
            .await
            .unwrap();

        let result = service.sign_up("staff@example.com", "Other", "hunter3").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_login_success_and_wrong_password() {
        let (_, _, service) = make_service();

        service
            .sign_up("staff@example.com", "Staff", "hunter2")
            .await
            .unwrap();

        let auth = service.login("staff@example.com", "hunter2").await.unwrap();
        assert!(service.validate_session(&auth.token).await.is_ok());

        let result = service.login("staff@example.com", "wrong").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let (_, _, service) = make_service();

        let result = service.login("nobody@example.com", "hunter2").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let (_, _, service) = make_service();

        let auth = service
            .sign_up("staff@example.com", "Staff", "hunter2")
            .await
            .unwrap();
        let claims = service.validate_session(&auth.token).await.unwrap();

        service.logout(&claims.session_id).await.unwrap();

        let result = service.validate_session(&auth.token).await;
        assert!(matches!(result, Err(AppError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_expired_session_row_rejected() {
        let (users, sessions, service) = make_service();

        let auth = service
            .sign_up("staff@example.com", "Staff", "hunter2")
            .await
            .unwrap();
        let claims = service.validate_session(&auth.token).await.unwrap();

        // Replace the row with an already-expired one under the same id
        sessions.delete_session(&claims.session_id).await.unwrap();
        let mut expired = SessionModel::new(claims.user_id.clone(), 7);
        expired.id = claims.session_id.clone();
        expired.expires_at = chrono::Utc::now() - chrono::Duration::hours(1);
        sessions.create_session(&expired).await.unwrap();

        let result = service.validate_session(&auth.token).await;
        assert!(matches!(result, Err(AppError::Unauthenticated)));
        assert_eq!(users.user_count(), 1);
    }
}
