//! Report generation form.

use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    response::Response,
    Extension,
};
use tracing::warn;

use stylist_core::{
    ColorPalette, FashionGoal, FocusArea, GenerateError, StyleTag, StylePreferences, StylistError,
    StylistResult, UploadedImage,
};

use super::load_session;
use crate::page::{Flash, PageTemplate};
use crate::session::CurrentSession;
use crate::state::AppState;

/// POST /generate - Validate the submission and run the report pipeline.
pub async fn generate(
    State(state): State<AppState>,
    Extension(CurrentSession(id)): Extension<CurrentSession>,
    multipart: Multipart,
) -> Response {
    let outcome = match read_preferences(multipart).await {
        Ok(preferences) => state
            .reports
            .generate(&state.sessions, id, preferences)
            .await
            .map(|_| ()),
        Err(e) => {
            // A missing key outranks a bad form.
            let missing_key = state
                .sessions
                .snapshot(id)
                .await
                .ok()
                .and_then(|session| session.credentials.missing_key());
            let e = missing_key.map(StylistError::from).unwrap_or(e);
            warn!(session = %id, error = %e, "Rejected preference form");
            Err(GenerateError::Rejected(e))
        }
    };

    let session = match load_session(&state, id).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    let page = PageTemplate::for_session(&session);

    match outcome {
        Ok(()) => page.respond(StatusCode::OK),
        Err(e) => {
            let status = status_for(&e);
            page.with_message(Flash::error(e.to_string())).respond(status)
        }
    }
}

/// 400 for anything the user can fix, 409 for a concurrent run, 502 when a
/// remote step failed.
pub fn status_for(error: &GenerateError) -> StatusCode {
    match error {
        GenerateError::Rejected(StylistError::RunInProgress) => StatusCode::CONFLICT,
        GenerateError::Rejected(StylistError::SessionNotFound(_)) => StatusCode::GONE,
        GenerateError::Rejected(e) if e.is_user_error() => StatusCode::BAD_REQUEST,
        GenerateError::Rejected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        GenerateError::Failed(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Read the multipart preference form.
///
/// An image part with no content counts as no upload. Unknown fields are
/// ignored; unknown option labels are rejected.
async fn read_preferences(mut multipart: Multipart) -> StylistResult<StylePreferences> {
    let mut preferences = StylePreferences::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "image" => preferences.image = read_image(field).await?,
            "styles" => preferences.add_style(StyleTag::from_label(&read_text(field).await?)?),
            "colors" => preferences.add_color(ColorPalette::from_label(&read_text(field).await?)?),
            "goal" => preferences.goal = Some(FashionGoal::from_label(&read_text(field).await?)?),
            "focus" => preferences.focus = Some(FocusArea::from_label(&read_text(field).await?)?),
            _ => {}
        }
    }

    Ok(preferences)
}

async fn read_image(field: Field<'_>) -> StylistResult<Option<UploadedImage>> {
    let file_name = field.file_name().unwrap_or_default().to_owned();
    let bytes = field.bytes().await.map_err(malformed)?;
    if bytes.is_empty() {
        return Ok(None);
    }
    UploadedImage::new(file_name, bytes.to_vec()).map(Some)
}

async fn read_text(field: Field<'_>) -> StylistResult<String> {
    field.text().await.map_err(malformed)
}

fn malformed(e: axum::extract::multipart::MultipartError) -> StylistError {
    StylistError::validation(format!("Malformed form submission: {}", e.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stylist_core::{MissingInput, PipelineError};

    #[test]
    fn test_status_for_each_failure_kind() {
        assert_eq!(
            status_for(&GenerateError::Rejected(MissingInput::Image.into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&GenerateError::Rejected(StylistError::InvalidImage("x".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&GenerateError::Rejected(StylistError::RunInProgress)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&GenerateError::Failed(PipelineError::Incomplete)),
            StatusCode::BAD_GATEWAY
        );
    }
}
