//! Sidebar credential form.

use axum::{extract::State, http::StatusCode, response::Response, Extension, Form};
use serde::Deserialize;
use tracing::info;

use super::{load_session, session_gone};
use crate::page::{Flash, PageTemplate};
use crate::session::CurrentSession;
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct CredentialsForm {
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub serp_api_key: String,
}

/// POST /credentials - Store whichever keys were entered.
pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentSession(id)): Extension<CurrentSession>,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let update = match state
        .sessions
        .update(id, |s| s.credentials.apply(&form.openai_api_key, &form.serp_api_key))
        .await
    {
        Ok(update) => update,
        Err(e) => return session_gone(id, &e),
    };
    info!(
        session = %id,
        openai = update.openai_updated,
        serp = update.serp_updated,
        "Credentials updated"
    );

    let session = match load_session(&state, id).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    let mut page = PageTemplate::for_session(&session);
    if update.openai_updated {
        page = page.with_sidebar_message(Flash::success("✅ OpenAI API key updated!"));
    }
    if update.serp_updated {
        page = page.with_sidebar_message(Flash::success("✅ Serp API key updated!"));
    }
    page.respond(StatusCode::OK)
}
