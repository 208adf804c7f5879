//! Request and response types

use crate::errors::HttpError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// HTTP methods issued by simulated users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl HttpMethod {
    /// Get the string representation of the HTTP method
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }
}

/// An outgoing request
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Form fields, sent `application/x-www-form-urlencoded`
    pub form: Option<Vec<(String, String)>>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            form: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            ..Self::get(url)
        }
    }

    /// Add an `Authorization: Bearer <token>` header
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.form = Some(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Look up a header value by case-insensitive name
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// Credentials never reach log output
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case("authorization") {
                    (k.as_str(), "<redacted>")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        let form_fields: Option<Vec<&str>> = self
            .form
            .as_ref()
            .map(|fields| fields.iter().map(|(k, _)| k.as_str()).collect());

        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("form_fields", &form_fields)
            .finish()
    }
}

/// A completed response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    /// Time from sending the request to having read the full body
    pub elapsed: Duration,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<JsonValue, HttpError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header() {
        let request = HttpRequest::get("http://localhost/x").bearer("tok-1");
        assert_eq!(request.header_value("authorization"), Some("Bearer tok-1"));
        assert_eq!(request.method, HttpMethod::Get);
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let request = HttpRequest::post("http://localhost/revoke")
            .bearer("tok-secret")
            .form([("token", "tok-secret"), ("client_secret", "shh")]);
        let rendered = format!("{:?}", request);
        assert!(!rendered.contains("tok-secret"));
        assert!(!rendered.contains("shh"));
        assert!(rendered.contains("client_secret"));
    }

    #[test]
    fn test_response_json_and_status() {
        let response = HttpResponse {
            status: 204,
            headers: HashMap::new(),
            body: r#"{"patient": "abc"}"#.to_string(),
            elapsed: Duration::from_millis(3),
        };
        assert!(response.is_success());
        assert_eq!(response.json().unwrap()["patient"], "abc");

        let failed = HttpResponse {
            status: 500,
            body: "oops".to_string(),
            ..response
        };
        assert!(!failed.is_success());
        assert!(failed.json().is_err());
    }

    #[test]
    fn test_method_to_reqwest() {
        assert_eq!(reqwest::Method::from(HttpMethod::Get), reqwest::Method::GET);
        assert_eq!(reqwest::Method::from(HttpMethod::Post), reqwest::Method::POST);
        assert_eq!(HttpMethod::Post.to_string(), "POST");
    }
}
