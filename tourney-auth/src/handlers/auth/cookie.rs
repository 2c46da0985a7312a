use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::config::CookieConfig;
use crate::services::TokenExpiry;

/// Http-only session cookie carrying the token; lifetime mirrors the token's.
pub(crate) fn session_cookie(
    config: &CookieConfig,
    token: String,
    expiry: TokenExpiry,
) -> Cookie<'static> {
    let mut builder = Cookie::build((config.name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax);

    if let TokenExpiry::After(duration) = expiry {
        builder = builder.max_age(time::Duration::seconds(duration.num_seconds()));
    }
    if let Some(domain) = &config.domain {
        builder = builder.domain(domain.clone());
    }

    builder.build()
}

/// Expired, empty cookie with the session cookie's name, path and domain.
pub(crate) fn removal_cookie(config: &CookieConfig) -> Cookie<'static> {
    let mut builder = Cookie::build((config.name.clone(), "")).path("/");
    if let Some(domain) = &config.domain {
        builder = builder.domain(domain.clone());
    }
    let mut cookie = builder.build();
    cookie.make_removal();
    cookie
}
