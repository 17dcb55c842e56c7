use crate::config::SessionConfig;

pub const SESSION_COOKIE: &str = "session_token";

/// Set-Cookie value carrying a freshly signed session token.
pub fn session_cookie(token: &str, config: &SessionConfig) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        config.ttl_seconds
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Set-Cookie value that expires the session cookie immediately.
pub fn clear_session_cookie(config: &SessionConfig) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Pulls the session token out of a raw Cookie request header.
pub(crate) fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    fn config(secure: bool) -> SessionConfig {
        SessionConfig {
            secret: "test".into(),
            ttl_seconds: 3600,
            cookie_secure: secure,
        }
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("abc.def.ghi", &config(false));
        assert!(cookie.starts_with("session_token=abc.def.ghi;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn secure_flag_in_production() {
        let cookie = session_cookie("t", &config(true));
        assert!(cookie.ends_with("; Secure"));
        let cleared = clear_session_cookie(&config(true));
        assert!(cleared.ends_with("; Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie(&config(false));
        assert!(cookie.starts_with("session_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn token_extraction_from_header() {
        assert_eq!(
            token_from_cookie_header("session_token=abc"),
            Some("abc")
        );
        assert_eq!(
            token_from_cookie_header("theme=dark; session_token=abc; lang=en"),
            Some("abc")
        );
        assert_eq!(token_from_cookie_header("session_token="), None);
        assert_eq!(token_from_cookie_header("other=abc"), None);
        // A prefix-named cookie must not match.
        assert_eq!(token_from_cookie_header("session_token_v2=abc"), None);
    }
}
