use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use placehub_common::{AUTH_COOKIE, AuthError};

use crate::error::ApiError;
use crate::state::AppState;

/// Valor do cookie `name`, procurando em todos os headers `Cookie`.
pub(crate) fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}

/// Compara o cookie `auth` com o segredo configurado.
fn authorize(headers: &HeaderMap, expected: &str) -> Result<(), AuthError> {
    match cookie_value(headers, AUTH_COOKIE) {
        None => Err(AuthError::MissingToken),
        Some(token) if token == expected => Ok(()),
        Some(_) => Err(AuthError::TokenMismatch),
    }
}

/// Middleware das rotas protegidas.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(e) = authorize(req.headers(), state.auth_token()) {
        debug!(path = %req.uri().path(), "acesso negado: {e}");
        return Err(e.into());
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(cookies: &[&'static str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for c in cookies {
            map.append(COOKIE, HeaderValue::from_static(*c));
        }
        map
    }

    #[test]
    fn finds_cookie_among_others() {
        let h = headers(&["theme=dark; auth=s3cret; lang=pt"]);
        assert_eq!(cookie_value(&h, "auth"), Some("s3cret"));
        assert_eq!(cookie_value(&h, "missing"), None);
    }

    #[test]
    fn finds_cookie_in_second_header() {
        let h = headers(&["theme=dark", "auth=s3cret"]);
        assert_eq!(cookie_value(&h, "auth"), Some("s3cret"));
    }

    #[test]
    fn authorize_requires_exact_match() {
        assert_eq!(authorize(&headers(&["auth=s3cret"]), "s3cret"), Ok(()));
        assert_eq!(
            authorize(&headers(&["auth=s3cret2"]), "s3cret"),
            Err(AuthError::TokenMismatch)
        );
        assert_eq!(
            authorize(&headers(&["authx=s3cret"]), "s3cret"),
            Err(AuthError::MissingToken)
        );
        assert_eq!(authorize(&HeaderMap::new(), "s3cret"), Err(AuthError::MissingToken));
    }
}
