//! Simulated user session policy and endpoint catalog

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_relative_path, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Per-session behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of requests after which the session's cookies are cleared
    #[serde(default = "default_reset_after_requests")]
    pub reset_after_requests: u32,

    /// Endpoints a simulated user picks from, with relative weights
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<EndpointConfig>,
}

/// One schedulable endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Task name used in log events
    pub name: String,

    /// Relative URL; every `%s` is replaced with the subject identifier
    pub path: String,

    /// Relative selection weight
    #[serde(default = "default_weight")]
    pub weight: u32,
}

impl EndpointConfig {
    pub fn new(name: impl Into<String>, path: impl Into<String>, weight: u32) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            weight,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reset_after_requests: default_reset_after_requests(),
            endpoints: default_endpoints(),
        }
    }
}

impl Validatable for SessionConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.reset_after_requests,
            "reset_after_requests",
            self.domain_name(),
        )?;

        if self.endpoints.is_empty() {
            return Err(self.validation_error("At least one endpoint must be configured"));
        }

        let mut seen = HashSet::new();
        for endpoint in &self.endpoints {
            endpoint.validate()?;
            if !seen.insert(endpoint.name.as_str()) {
                return Err(self.validation_error(format!(
                    "Duplicate endpoint name '{}'",
                    endpoint.name
                )));
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "session"
    }
}

impl Validatable for EndpointConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.name, "name", self.domain_name())?;
        validate_relative_path(&self.path, "path", self.domain_name())?;
        validate_positive(self.weight, "weight", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "session.endpoints"
    }
}

fn default_reset_after_requests() -> u32 {
    50
}

fn default_weight() -> u32 {
    1
}

fn default_endpoints() -> Vec<EndpointConfig> {
    vec![
        EndpointConfig::new("patient", "/v1/fhir/Patient/%s?_format=json", 1),
        EndpointConfig::new(
            "explanation_of_benefit",
            "/v1/fhir/ExplanationOfBenefit/?patient=%s&_format=json",
            3,
        ),
        EndpointConfig::new(
            "coverage",
            "/v1/fhir/Coverage/?beneficiary=%s&_format=json",
            1,
        ),
        EndpointConfig::new("userinfo", "/v1/connect/userinfo?format=json", 1),
    ]
}
