//! Credential pool: bearer tokens loaded once and shared by every session

use crate::error::{SessionError, SessionResult};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Deserialize;
use stampede_config::CredentialSourceConfig;
use std::fmt;
use std::path::Path;
use tracing::info;

/// Where the pool's tokens came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialOrigin {
    /// Line-delimited JSON file (multi-identity variant)
    File,
    /// A single token from the environment (fixed-identity variant)
    Environment,
}

/// How a new session picks its token from the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPolicy {
    /// Every session uses the pool's first token
    Fixed,
    /// Every session draws one token uniformly at random
    Random,
}

#[derive(Deserialize)]
struct TokenRecord {
    access_token: String,
}

/// Immutable set of bearer tokens
///
/// Built once at startup and handed to sessions behind an `Arc`; reads need no
/// synchronisation.
#[derive(Clone)]
pub struct CredentialPool {
    tokens: Vec<String>,
    origin: CredentialOrigin,
}

impl CredentialPool {
    /// Load the pool from the configured source
    pub fn load(source: &CredentialSourceConfig) -> SessionResult<Self> {
        match source {
            CredentialSourceConfig::File { path } => Self::from_file(path),
            CredentialSourceConfig::Env { variable } => Self::from_env(variable),
        }
    }

    /// Read one `{"access_token": "..."}` object per line; blank lines are skipped
    pub fn from_file(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SessionError::CredentialRead {
            path: path.to_path_buf(),
            source,
        })?;

        let tokens = parse_token_lines(&content)?;
        if tokens.is_empty() {
            return Err(SessionError::Configuration(format!(
                "credential file {} contains no tokens",
                path.display()
            )));
        }

        info!(tokens = tokens.len(), path = %path.display(), "Loaded credential pool");
        Ok(Self {
            tokens,
            origin: CredentialOrigin::File,
        })
    }

    /// Use the single token held by `variable`
    pub fn from_env(variable: &str) -> SessionResult<Self> {
        let token = std::env::var(variable).map_err(|_| {
            SessionError::Configuration(format!("environment variable {} is not set", variable))
        })?;
        let token = token.trim();
        if token.is_empty() {
            return Err(SessionError::Configuration(format!(
                "environment variable {} is empty",
                variable
            )));
        }

        info!(variable, "Using fixed access token from environment");
        Ok(Self {
            tokens: vec![token.to_string()],
            origin: CredentialOrigin::Environment,
        })
    }

    /// Build a pool from tokens already in memory
    pub fn from_tokens(
        tokens: impl IntoIterator<Item = impl Into<String>>,
        origin: CredentialOrigin,
    ) -> SessionResult<Self> {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if tokens.is_empty() {
            return Err(SessionError::Configuration(
                "credential pool cannot be empty".to_string(),
            ));
        }
        Ok(Self { tokens, origin })
    }

    pub fn origin(&self) -> CredentialOrigin {
        self.origin
    }

    pub fn policy(&self) -> TokenPolicy {
        match self.origin {
            CredentialOrigin::File => TokenPolicy::Random,
            CredentialOrigin::Environment => TokenPolicy::Fixed,
        }
    }

    /// Only file-backed pools are revoked when the run ends
    pub fn is_revocable(&self) -> bool {
        self.origin == CredentialOrigin::File
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Pick a token for a new session according to the pool's policy
    pub fn select(&self) -> Option<&str> {
        self.select_with(&mut rand::rng())
    }

    pub fn select_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        match self.policy() {
            TokenPolicy::Fixed => self.tokens.first(),
            TokenPolicy::Random => self.tokens.choose(rng),
        }
        .map(String::as_str)
    }
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPool")
            .field("origin", &self.origin)
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

fn parse_token_lines(content: &str) -> SessionResult<Vec<String>> {
    let mut tokens = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: TokenRecord =
            serde_json::from_str(line).map_err(|e| SessionError::InvalidCredentialLine {
                line: index + 1,
                reason: e.to_string(),
            })?;

        if record.access_token.trim().is_empty() {
            return Err(SessionError::InvalidCredentialLine {
                line: index + 1,
                reason: "access_token is empty".to_string(),
            });
        }
        tokens.push(record.access_token);
    }
    Ok(tokens)
}

/// Short, non-reversible label for a token, safe to log
pub fn fingerprint(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::io::Write;

    fn token_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_from_file() {
        let file = token_file(
            "{\"access_token\": \"tok-a\", \"refresh_token\": \"r\"}\n\n{\"access_token\": \"tok-b\"}\n",
        );
        let pool = CredentialPool::from_file(file.path()).unwrap();

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.origin(), CredentialOrigin::File);
        assert_eq!(pool.policy(), TokenPolicy::Random);
        assert!(pool.is_revocable());
        assert_eq!(pool.tokens().collect::<Vec<_>>(), vec!["tok-a", "tok-b"]);
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let file = token_file("{\"access_token\": \"tok-a\"}\nnot json\n");
        let err = CredentialPool::from_file(file.path()).unwrap_err();
        assert!(matches!(err, SessionError::InvalidCredentialLine { line: 2, .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_access_token_field() {
        let file = token_file("{\"token\": \"tok-a\"}\n");
        let err = CredentialPool::from_file(file.path()).unwrap_err();
        assert!(matches!(err, SessionError::InvalidCredentialLine { line: 1, .. }));
    }

    #[test]
    fn test_empty_file_is_configuration_error() {
        let file = token_file("\n\n");
        let err = CredentialPool::from_file(file.path()).unwrap_err();
        assert!(matches!(err, SessionError::Configuration(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = CredentialPool::from_file("/no/such/tokens.jsonl").unwrap_err();
        assert!(matches!(err, SessionError::CredentialRead { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_from_env() {
        temp_env::with_var("TEST_STAMPEDE_TOKEN", Some(" tok-env \n"), || {
            let pool = CredentialPool::from_env("TEST_STAMPEDE_TOKEN").unwrap();
            assert_eq!(pool.origin(), CredentialOrigin::Environment);
            assert_eq!(pool.policy(), TokenPolicy::Fixed);
            assert!(!pool.is_revocable());
            assert_eq!(pool.select(), Some("tok-env"));
        });

        temp_env::with_var("TEST_STAMPEDE_TOKEN", None::<&str>, || {
            let err = CredentialPool::from_env("TEST_STAMPEDE_TOKEN").unwrap_err();
            assert!(matches!(err, SessionError::Configuration(_)));
        });

        temp_env::with_var("TEST_STAMPEDE_TOKEN", Some("   "), || {
            assert!(CredentialPool::from_env("TEST_STAMPEDE_TOKEN").is_err());
        });
    }

    #[test]
    fn test_from_tokens_rejects_empty() {
        let empty: Vec<String> = Vec::new();
        assert!(CredentialPool::from_tokens(empty, CredentialOrigin::File).is_err());
    }

    #[test]
    fn test_random_selection_stays_in_pool_and_covers_it() {
        let pool =
            CredentialPool::from_tokens(["t1", "t2", "t3", "t4", "t5"], CredentialOrigin::File)
                .unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let mut seen = HashSet::new();
        for _ in 0..500 {
            let token = pool.select_with(&mut rng).unwrap();
            assert!(pool.contains(token));
            seen.insert(token.to_string());
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn test_fixed_selection_is_stable() {
        let pool = CredentialPool::from_tokens(["only"], CredentialOrigin::Environment).unwrap();
        for _ in 0..10 {
            assert_eq!(pool.select(), Some("only"));
        }
    }

    #[test]
    fn test_debug_and_fingerprint_hide_tokens() {
        let pool = CredentialPool::from_tokens(["secret-token-value"], CredentialOrigin::File)
            .unwrap();
        assert!(!format!("{:?}", pool).contains("secret-token-value"));

        assert_eq!(fingerprint("secret-token-value"), "secr…alue");
        assert_eq!(fingerprint("short"), "****");
    }
}
