//! Target API configuration

use crate::error::ConfigResult;
use crate::validation::{validate_relative_path, validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};

/// The API under test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// "Who am I" endpoint returning the subject identifier for a token
    #[serde(default = "default_whoami_path")]
    pub whoami_path: String,

    /// JSON field of the "who am I" response holding the subject identifier
    #[serde(default = "default_subject_field")]
    pub subject_field: String,

    /// OAuth token revocation endpoint
    #[serde(default = "default_revoke_path")]
    pub revoke_path: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            whoami_path: default_whoami_path(),
            subject_field: default_subject_field(),
            revoke_path: default_revoke_path(),
        }
    }
}

impl TargetConfig {
    /// Join the base URL and a relative path without doubling the slash
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.base_url, "base_url", self.domain_name())?;
        validate_relative_path(&self.whoami_path, "whoami_path", self.domain_name())?;
        validate_relative_path(&self.revoke_path, "revoke_path", self.domain_name())?;
        validate_required_string(&self.subject_field, "subject_field", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_whoami_path() -> String {
    "/v1/connect/userinfo".to_string()
}

fn default_subject_field() -> String {
    "patient".to_string()
}

fn default_revoke_path() -> String {
    "/v1/o/revoke_token/".to_string()
}
