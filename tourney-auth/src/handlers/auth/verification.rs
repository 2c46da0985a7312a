use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::CookieJar;

use super::cookie::session_cookie;
use crate::AppState;

/// Follow an emailed verification link.
///
/// Always answers with a 303 redirect to the web client: the role's landing
/// page (with a session cookie) on success, `/verification-failed` otherwise.
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
    jar: CookieJar,
) -> impl IntoResponse {
    let frontend = &state.config.urls.frontend_url;
    let failed = || Redirect::to(&format!("{}/verification-failed", frontend));

    match state.auth_service.verify_email(&token).await {
        Ok(Some(session)) => {
            let cookie = session_cookie(
                &state.config.cookie,
                session.token,
                state.tokens.expiry(),
            );
            let target = format!("{}{}", frontend, session.account.role.landing_path());
            (jar.add(cookie), Redirect::to(&target)).into_response()
        }
        Ok(None) => failed().into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Email verification failed");
            failed().into_response()
        }
    }
}
