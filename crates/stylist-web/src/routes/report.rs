//! Stored report downloads.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Response},
    Extension,
};

use stylist_core::{StoredReport, REPORT_FILE_NAME, REPORT_MIME_TYPE};

use super::load_session;
use crate::session::CurrentSession;
use crate::state::AppState;

fn no_report() -> Response {
    (StatusCode::NOT_FOUND, "No report has been generated yet.").into_response()
}

/// Requests without a session never had a report.
async fn stored_report(
    state: &AppState,
    current: Option<Extension<CurrentSession>>,
) -> Result<Arc<StoredReport>, Response> {
    let Some(Extension(CurrentSession(id))) = current else {
        return Err(no_report());
    };
    load_session(state, id).await?.result().ok_or_else(no_report)
}

/// GET /report/download - The stored markdown report as a file.
pub async fn download(
    State(state): State<AppState>,
    current: Option<Extension<CurrentSession>>,
) -> Response {
    match stored_report(&state, current).await {
        Ok(stored) => (
            [
                (CONTENT_TYPE, format!("{}; charset=utf-8", REPORT_MIME_TYPE)),
                (
                    CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", REPORT_FILE_NAME),
                ),
                (CACHE_CONTROL, "no-store".to_string()),
            ],
            stored.report.clone(),
        )
            .into_response(),
        Err(response) => response,
    }
}

/// GET /report/image - The photo the stored report was generated from.
pub async fn image(
    State(state): State<AppState>,
    current: Option<Extension<CurrentSession>>,
) -> Response {
    match stored_report(&state, current).await {
        Ok(stored) => (
            [
                (CONTENT_TYPE, stored.image.mime_type().to_string()),
                (CACHE_CONTROL, "no-store".to_string()),
            ],
            stored.image.bytes().to_vec(),
        )
            .into_response(),
        Err(response) => response,
    }
}
