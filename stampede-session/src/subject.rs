//! Subject identifier resolution through the "who am I" endpoint

use crate::credentials::fingerprint;
use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use stampede_config::TargetConfig;
use stampede_http::{HttpClient, HttpRequest};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Process-wide `token -> subject id` map shared by all sessions
///
/// Only successful resolutions are stored.
#[derive(Debug, Default)]
pub struct SubjectCache {
    entries: RwLock<HashMap<String, String>>,
}

impl SubjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, token: &str) -> Option<String> {
        self.entries.read().get(token).cloned()
    }

    pub fn insert(&self, token: &str, subject: String) {
        self.entries.write().insert(token.to_string(), subject);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Ask the target who `token` belongs to
///
/// Returns `None` on transport failure, non-2xx status, a non-JSON body or a
/// body without the subject field; the caller degrades to an empty id.
pub async fn fetch_subject<C>(client: &C, target: &TargetConfig, token: &str) -> Option<String>
where
    C: HttpClient + ?Sized,
{
    let url = target.url_for(&target.whoami_path);
    let response = match client.send(HttpRequest::get(&url).bearer(token)).await {
        Ok(response) => response,
        Err(e) => {
            warn!(token = %fingerprint(token), error = %e, "Subject lookup failed");
            return None;
        }
    };

    if !response.is_success() {
        warn!(
            token = %fingerprint(token),
            status = response.status,
            "Subject lookup returned non-success status"
        );
        return None;
    }

    let subject = response
        .json()
        .ok()
        .and_then(|body| subject_from_body(&body, &target.subject_field));

    match subject {
        Some(ref id) => debug!(token = %fingerprint(token), subject = %id, "Resolved subject"),
        None => warn!(
            token = %fingerprint(token),
            field = %target.subject_field,
            "Subject lookup response has no usable subject field"
        ),
    }
    subject
}

fn subject_from_body(body: &JsonValue, field: &str) -> Option<String> {
    match body.get(field)? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
