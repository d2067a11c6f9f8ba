//! Session lifecycle.

use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use tracing::info;

use crate::session::{expired_session_cookie, CurrentSession};
use crate::state::AppState;

/// POST /session/end - Forget keys, selections and the stored report.
pub async fn end(
    State(state): State<AppState>,
    Extension(CurrentSession(id)): Extension<CurrentSession>,
) -> Response {
    if state.sessions.end(id).await {
        info!(session = %id, "Session ended");
    }
    ([(SET_COOKIE, expired_session_cookie())], Redirect::to("/")).into_response()
}
