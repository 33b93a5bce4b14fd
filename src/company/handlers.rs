use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::{info, instrument};

use super::{import::parse_company_rows, models::CompanyModel};
use crate::shared::{AppError, AppState, Envelope};

/// HTTP handler for listing all companies
///
/// GET /companies (protected)
#[instrument(name = "get_companies", skip(state))]
pub async fn get_companies(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<CompanyModel>>>, AppError> {
    let companies = state.company_repository.get_companies().await?;

    info!(company_count = companies.len(), "Companies listed");

    Ok(Json(Envelope::success(companies)))
}

/// HTTP handler for the spreadsheet import
///
/// POST /companies/import (protected, multipart)
/// Rows are `{name, code}` with the header row skipped; any row failure
/// aborts the whole import.
#[instrument(name = "import_companies", skip(state, multipart))]
pub async fn import_companies(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Envelope<String>>, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid upload: {}", e)))?
        .ok_or_else(|| AppError::BadRequest("A spreadsheet file is required".to_string()))?;

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

    let companies = parse_company_rows(&data)?;
    if companies.is_empty() {
        return Err(AppError::BadRequest(
            "The uploaded file contains no rows".to_string(),
        ));
    }

    let inserted = state.company_repository.insert_companies(&companies).await?;

    info!(inserted = inserted, "Company import completed");

    Ok(Json(Envelope::success(format!(
        "Imported {} companies",
        inserted
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::repository::{CompanyRepository, InMemoryCompanyRepository};
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    fn company_app(state: AppState) -> Router {
        Router::new()
            .route("/companies", get(get_companies))
            .route("/companies/import", post(import_companies))
            .with_state(state)
    }

    fn multipart_request(uri: &str, csv_body: &str) -> Request<Body> {
        let boundary = "test-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"companies.csv\"\r\nContent-Type: text/csv\r\n\r\n{csv_body}\r\n--{boundary}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_companies_empty() {
        let app = company_app(AppStateBuilder::new().build());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/companies")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["severity"], "success");
        assert!(json["message"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_inserts_rows_without_header() {
        let repo = Arc::new(InMemoryCompanyRepository::new());
        let app = company_app(
            AppStateBuilder::new()
                .with_company_repository(repo.clone())
                .build(),
        );

        let response = app
            .oneshot(multipart_request(
                "/companies/import",
                "Name,Code\nAlpha,001\nBeta,002",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(repo.company_count(), 2);

        let companies = repo.get_companies().await.unwrap();
        let codes: std::collections::HashSet<String> =
            companies.iter().map(|c| c.code.clone()).collect();
        assert!(codes.contains("001"));
        assert!(codes.contains("002"));
    }

    #[tokio::test]
    async fn test_import_empty_file_rejected() {
        let repo = Arc::new(InMemoryCompanyRepository::new());
        let app = company_app(
            AppStateBuilder::new()
                .with_company_repository(repo.clone())
                .build(),
        );

        let response = app
            .oneshot(multipart_request("/companies/import", "Name,Code"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(repo.company_count(), 0);
    }

    #[tokio::test]
    async fn test_import_bad_row_inserts_nothing() {
        let repo = Arc::new(InMemoryCompanyRepository::new());
        let app = company_app(
            AppStateBuilder::new()
                .with_company_repository(repo.clone())
                .build(),
        );

        let response = app
            .oneshot(multipart_request(
                "/companies/import",
                "Name,Code\nAlpha,001\nBroken,",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(repo.company_count(), 0);
    }
}
