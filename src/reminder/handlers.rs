use axum::{extract::State, Json};
use tracing::{info, instrument};

use super::models::{CreateReminderRequest, ReminderModel};
use crate::shared::{AppError, AppState, Envelope};

/// HTTP handler for creating a reminder
///
/// POST /reminders (protected)
/// A due date in the past is accepted as-is.
#[instrument(name = "create_reminder", skip(state, request))]
pub async fn create_reminder(
    State(state): State<AppState>,
    Json(request): Json<CreateReminderRequest>,
) -> Result<Json<Envelope<ReminderModel>>, AppError> {
    if request.company_id.trim().is_empty() {
        return Err(AppError::BadRequest("A company is required".to_string()));
    }
    if request.description.trim().is_empty() {
        return Err(AppError::BadRequest(
            "A description is required".to_string(),
        ));
    }

    let reminder = ReminderModel::new(
        request.company_id.trim().to_string(),
        request.description.trim().to_string(),
        request.due_date,
        request.log_id,
    );
    state.reminder_repository.create_reminder(&reminder).await?;

    info!(
        reminder_id = %reminder.id,
        company_id = %reminder.company_id,
        "Reminder created"
    );

    Ok(Json(Envelope::success(reminder)))
}

/// HTTP handler for listing all reminders
///
/// GET /reminders (protected)
#[instrument(name = "get_all_reminders", skip(state))]
pub async fn get_all_reminders(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<ReminderModel>>>, AppError> {
    let reminders = state.reminder_repository.get_all_reminders().await?;

    info!(reminder_count = reminders.len(), "Reminders listed");

    Ok(Json(Envelope::success(reminders)))
}
