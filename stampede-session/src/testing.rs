//! Test doubles for the HTTP client seam

use mockall::mock;
use stampede_http::{HttpClient, HttpError, HttpRequest, HttpResponse};
use std::collections::HashMap;
use std::time::Duration;

mock! {
    pub Http {}

    #[async_trait::async_trait]
    impl HttpClient for Http {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
        fn clear_cookies(&mut self) -> Result<(), HttpError>;
    }
}

pub fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: HashMap::new(),
        body: body.to_string(),
        elapsed: Duration::from_millis(5),
    }
}

pub fn ok() -> Result<HttpResponse, HttpError> {
    Ok(response(200, "{}"))
}
