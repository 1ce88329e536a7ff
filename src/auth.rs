use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::settings::Settings;

/// Admin callers authenticate with the shared token, either as a bearer
/// header or as `?token=` for links such as calendar subscriptions. The
/// header wins when both are sent; blank tokens count as missing.
pub fn verify_token(
    settings: &Settings,
    auth: Option<Authorization<Bearer>>,
    query_token: Option<&str>,
) -> Result<(), ApiError> {
    let header_token = auth
        .as_ref()
        .map(|a| a.token().trim())
        .filter(|t| !t.is_empty());
    let query_token = query_token.map(str::trim).filter(|t| !t.is_empty());

    let (source, token) = match (header_token, query_token) {
        (Some(token), _) => ("header", token),
        (None, Some(token)) => ("query", token),
        (None, None) => {
            debug!("admin request without token");
            return Err(ApiError::Unauthorized("Missing authentication token".into()));
        }
    };
    if token == settings.auth_token {
        return Ok(());
    }
    warn!(source, "admin token rejected");
    Err(ApiError::Unauthorized("Invalid authentication token".into()))
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    fn settings() -> Settings {
        Settings {
            api_base_url: Url::parse("https://example.com").unwrap(),
            api_token: None,
            home_id: None,
            user_id: None,
            debug: false,
            auth_token: "secret".to_string(),
            enable_swagger: true,
            port: 8080,
            timezone: chrono_tz::Tz::UTC,
            request_timeout_secs: 30,
            calendar_name: "Community Events".to_string(),
        }
    }

    #[test]
    fn test_verify_token_header() {
        let auth = Authorization::bearer("secret").unwrap();
        assert!(verify_token(&settings(), Some(auth), None).is_ok());

        let wrong = Authorization::bearer("nope").unwrap();
        assert!(verify_token(&settings(), Some(wrong), Some("secret")).is_err());
    }

    #[test]
    fn test_verify_token_query() {
        assert!(verify_token(&settings(), None, Some("secret")).is_ok());
        assert!(verify_token(&settings(), None, Some(" secret ")).is_ok());
        assert!(verify_token(&settings(), None, Some("bad")).is_err());
    }

    #[test]
    fn test_missing_token_message() {
        for query in [None, Some(""), Some("   ")] {
            let err = verify_token(&settings(), None, query).unwrap_err();
            assert!(matches!(err, ApiError::Unauthorized(msg) if msg == "Missing authentication token"));
        }
        let err = verify_token(&settings(), None, Some("bad")).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(msg) if msg == "Invalid authentication token"));
    }
}
