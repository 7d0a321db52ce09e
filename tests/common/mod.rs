//! Common test doubles for credential-report integration tests

#[allow(dead_code)]
pub mod fixtures;

pub use fixtures::*;
