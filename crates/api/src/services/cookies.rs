//! Session cookie handling.
//!
//! Login sets the session token as an httpOnly cookie; logout clears it.

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};

use crate::config::CookieConfig;

#[derive(Debug, Clone)]
pub struct CookieHelper {
    config: CookieConfig,
    /// Session token expiry in seconds (from JWT config)
    session_expiry_secs: i64,
}

impl CookieHelper {
    pub fn new(config: CookieConfig, session_expiry_secs: i64) -> Self {
        Self {
            config,
            session_expiry_secs,
        }
    }

    /// Set-Cookie value carrying the session token.
    pub fn build_session_cookie(&self, token: &str) -> String {
        let cookie = format!(
            "{}={}; Path={}; Max-Age={}",
            self.config.name, token, self.config.path, self.session_expiry_secs
        );
        self.with_attributes(cookie)
    }

    /// Set-Cookie value that removes the session cookie.
    pub fn build_clear_cookie(&self) -> String {
        let cookie = format!(
            "{}=; Path={}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            self.config.name, self.config.path
        );
        self.with_attributes(cookie)
    }

    pub fn add_session_cookie(&self, headers: &mut HeaderMap, token: &str) {
        if let Ok(value) = HeaderValue::from_str(&self.build_session_cookie(token)) {
            headers.append(SET_COOKIE, value);
        }
    }

    pub fn add_clear_cookie(&self, headers: &mut HeaderMap) {
        if let Ok(value) = HeaderValue::from_str(&self.build_clear_cookie()) {
            headers.append(SET_COOKIE, value);
        }
    }

    /// Reads the session token from the request's Cookie header.
    pub fn extract_session_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(axum::http::header::COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|cookie_header| cookie_header.split(';'))
            .map(|s| s.trim())
            .find_map(|cookie| {
                let (cookie_name, cookie_value) = cookie.split_once('=')?;
                (cookie_name == self.config.name && !cookie_value.is_empty())
                    .then_some(cookie_value)
            })
    }

    fn with_attributes(&self, mut cookie: String) -> String {
        cookie.push_str("; HttpOnly");

        if self.config.secure {
            cookie.push_str("; Secure");
        }

        cookie.push_str(&format!("; SameSite={}", self.config.same_site));

        if !self.config.domain.is_empty() {
            cookie.push_str(&format!("; Domain={}", self.config.domain));
        }

        cookie
    }
}
