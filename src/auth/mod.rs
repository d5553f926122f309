//! Authenticated principal collaborator
//!
//! Resolves request credentials to a principal and its role.

pub mod principal;

pub use principal::{require_admin, Principal, PrincipalProvider, Role, TokenPrincipalProvider};

#[cfg(test)]
pub use principal::MockPrincipalProvider;
