use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::company::repository::CompanyRepository;
use crate::contact::repository::ContactRepository;
use crate::mail::provider::MailProvider;
use crate::reminder::repository::ReminderRepository;
use crate::session::repository::SessionRepository;
use crate::user::repository::UserRepository;

/// Where unauthenticated requests are redirected to.
pub const SIGN_IN_PATH: &str = "/sign-in";

/// Message returned for any repository/provider failure. Detail stays in the logs.
pub const OPERATION_FAILED_MESSAGE: &str = "Something went wrong. Please try again later.";

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub session_repository: Arc<dyn SessionRepository + Send + Sync>,
    pub company_repository: Arc<dyn CompanyRepository + Send + Sync>,
    pub contact_repository: Arc<dyn ContactRepository + Send + Sync>,
    pub reminder_repository: Arc<dyn ReminderRepository + Send + Sync>,
    pub mail_provider: Arc<dyn MailProvider + Send + Sync>,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        session_repository: Arc<dyn SessionRepository + Send + Sync>,
        company_repository: Arc<dyn CompanyRepository + Send + Sync>,
        contact_repository: Arc<dyn ContactRepository + Send + Sync>,
        reminder_repository: Arc<dyn ReminderRepository + Send + Sync>,
        mail_provider: Arc<dyn MailProvider + Send + Sync>,
    ) -> Self {
        Self {
            user_repository,
            session_repository,
            company_repository,
            contact_repository,
            reminder_repository,
            mail_provider,
        }
    }
}

/// Severity marker in the response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// The uniform response shape: `{message, severity, timeStamp}`
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub message: T,
    pub severity: Severity,
    #[serde(rename = "timeStamp")]
    pub time_stamp: i64,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(message: T) -> Self {
        Self {
            message,
            severity: Severity::Success,
            time_stamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn error(message: T) -> Self {
        Self {
            message,
            severity: Severity::Error,
            time_stamp: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid session. Always answered with a redirect, never a body.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Invalid client input. The message is returned to the caller.
    #[error("{0}")]
    BadRequest(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("mail provider error: {0}")]
    MailProviderError(String),

    #[error("token error: {0}")]
    TokenError(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthenticated => {
                (StatusCode::FOUND, [(header::LOCATION, SIGN_IN_PATH)]).into_response()
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(Envelope::error(msg))).into_response()
            }
            other => {
                // Detail is logged server-side only; clients get the fixed message.
                error!(error = %other, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(Envelope::error(OPERATION_FAILED_MESSAGE.to_string())),
                )
                    .into_response()
            }
        }
    }
}
