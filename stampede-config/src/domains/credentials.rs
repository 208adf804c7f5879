//! Credential source and OAuth client configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Environment variable holding the single token of the fixed-identity variant
pub const DEFAULT_TOKEN_VARIABLE: &str = "STAMPEDE_ACCESS_TOKEN";

/// Where simulated users get their bearer tokens from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Token source
    #[serde(default)]
    pub source: CredentialSourceConfig,

    /// OAuth client used to revoke tokens at teardown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientCredentials>,
}

/// Token source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CredentialSourceConfig {
    /// Line-delimited JSON file, one `{"access_token": ...}` object per line
    File { path: PathBuf },
    /// Single token read from an environment variable
    Env {
        #[serde(default = "default_token_variable")]
        variable: String,
    },
}

/// OAuth client id/secret pair
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Default for CredentialSourceConfig {
    fn default() -> Self {
        CredentialSourceConfig::Env {
            variable: default_token_variable(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Validatable for CredentialsConfig {
    fn validate(&self) -> ConfigResult<()> {
        match &self.source {
            CredentialSourceConfig::File { path } => {
                if path.as_os_str().is_empty() {
                    return Err(self.validation_error("credential file path cannot be empty"));
                }
            }
            CredentialSourceConfig::Env { variable } => {
                validate_required_string(variable, "variable", self.domain_name())?;
            }
        }

        if let Some(ref client) = self.client {
            client.validate()?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "credentials"
    }
}

impl Validatable for ClientCredentials {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.client_id, "client_id", self.domain_name())?;
        validate_required_string(&self.client_secret, "client_secret", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "credentials.client"
    }
}

fn default_token_variable() -> String {
    DEFAULT_TOKEN_VARIABLE.to_string()
}
