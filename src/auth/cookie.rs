// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session store: the single http-only cookie holding the bearer token.
//!
//! This is a pure storage boundary. Nothing here validates the token; the
//! cookie jar is always passed in and handed back explicitly.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::Config;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_token";

/// Fixed session lifetime from issuance.
pub const SESSION_MAX_AGE: time::Duration = time::Duration::days(7);

/// Cookie attributes that depend on the deployment environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    secure: bool,
    domain: Option<String>,
}

impl SessionCookies {
    pub fn new(secure: bool, domain: Option<String>) -> Self {
        Self { secure, domain }
    }

    /// `secure` and `domain` only apply in production.
    pub fn from_config(config: &Config) -> Self {
        if config.is_production() {
            Self::new(true, config.cookie_domain.clone())
        } else {
            Self::new(false, None)
        }
    }

    /// Store `token` with the full session policy.
    pub fn set_token(&self, jar: CookieJar, token: impl Into<String>) -> CookieJar {
        let mut cookie = self.base(token.into());
        cookie.set_max_age(SESSION_MAX_AGE);
        jar.add(cookie)
    }

    /// Delete the session cookie.
    ///
    /// Path and domain must match the stored cookie for the browser to drop it.
    pub fn clear_token(&self, jar: CookieJar) -> CookieJar {
        jar.remove(self.base(String::new()))
    }

    /// Read the stored token. Empty values count as absent.
    pub fn read_token(jar: &CookieJar) -> Option<String> {
        jar.get(SESSION_COOKIE)
            .map(|cookie| cookie.value().trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn base(&self, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(SESSION_COOKIE, value);
        cookie.set_http_only(true);
        cookie.set_path("/");
        cookie.set_same_site(SameSite::Lax);
        cookie.set_secure(self.secure);
        if let Some(domain) = &self.domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use axum::{
        http::{
            header::{COOKIE, SET_COOKIE},
            HeaderMap, HeaderValue,
        },
        response::IntoResponse,
    };

    fn set_cookie_headers(jar: CookieJar) -> Vec<String> {
        let response = jar.into_response();
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn development_cookie_is_http_only_without_secure_or_domain() {
        let config = Config {
            cookie_domain: Some(".tenexis.in".into()),
            ..Config::default()
        };
        let cookies = SessionCookies::from_config(&config);
        let headers = set_cookie_headers(cookies.set_token(CookieJar::new(), "tok"));

        assert_eq!(headers.len(), 1);
        let header = &headers[0];
        assert!(header.starts_with("session_token=tok"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=604800"));
        assert!(!header.contains("Secure"));
        assert!(!header.contains("Domain"));
    }

    #[test]
    fn production_cookie_is_secure_and_domain_scoped() {
        let config = Config {
            environment: Environment::Production,
            cookie_domain: Some("tenexis.in".into()),
            ..Config::default()
        };
        let cookies = SessionCookies::from_config(&config);
        let headers = set_cookie_headers(cookies.set_token(CookieJar::new(), "tok"));

        assert!(headers[0].contains("Secure"));
        assert!(headers[0].contains("Domain=tenexis.in"));
    }

    #[test]
    fn read_token_ignores_empty_value() {
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, ""));
        assert_eq!(SessionCookies::read_token(&jar), None);

        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "abc"));
        assert_eq!(SessionCookies::read_token(&jar).as_deref(), Some("abc"));
    }

    #[test]
    fn clear_token_emits_expired_cookie() {
        let mut request_headers = HeaderMap::new();
        request_headers.insert(COOKIE, HeaderValue::from_static("session_token=tok"));
        let jar = CookieJar::from_headers(&request_headers);

        let cookies = SessionCookies::default();
        let jar = cookies.clear_token(jar);

        assert_eq!(SessionCookies::read_token(&jar), None);
        let headers = set_cookie_headers(jar);
        assert!(headers
            .iter()
            .any(|h| h.starts_with("session_token=;") && h.contains("Max-Age=0")));
    }
}
