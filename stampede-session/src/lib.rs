//! Simulated user sessions for stampede
//!
//! A [`Session`] owns one bearer token drawn from a shared [`CredentialPool`],
//! issues authenticated requests against an [`EndpointCatalog`] and clears its
//! cookies every `reset_after_requests` requests. [`Teardown`] revokes every
//! pooled token when the run ends.

pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod session;
pub mod subject;
pub mod teardown;

#[cfg(test)]
mod testing;

pub use credentials::{fingerprint, CredentialOrigin, CredentialPool, TokenPolicy};
pub use endpoint::{Endpoint, EndpointCatalog, SUBJECT_PLACEHOLDER};
pub use error::{SessionError, SessionResult};
pub use session::{EndpointResponse, Session, SessionSettings};
pub use subject::{fetch_subject, SubjectCache};
pub use teardown::{RevocationOutcome, Teardown, TeardownReport};
