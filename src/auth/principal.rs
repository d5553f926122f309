//! Authenticated principal resolution
//!
//! Identity is owned by an external service; the ladder only needs to know
//! who is calling and with which role. Resolution yields `None` for an
//! unauthenticated caller.

use crate::config::AuthSettings;
use crate::error::{LadderError, Result};
use crate::rating::ParticipantRepository;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Role carried by an authenticated principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl FromStr for Role {
    type Err = LadderError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "member" | "user" => Ok(Role::Member),
            other => Err(LadderError::ConfigurationError {
                message: format!("unknown role '{}'", other),
            }),
        }
    }
}

/// The caller of a ladder operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Require an admin principal
pub fn require_admin(principal: Option<&Principal>) -> Result<&Principal> {
    match principal {
        None => Err(LadderError::Unauthenticated.into()),
        Some(p) if p.is_admin() => Ok(p),
        Some(p) => Err(LadderError::Forbidden {
            principal_id: p.id.clone(),
        }
        .into()),
    }
}

/// Trait for resolving the caller from request credentials
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrincipalProvider: Send + Sync {
    /// Resolve a bearer token (if any) to a principal
    async fn resolve<'a>(&self, token: Option<&'a str>) -> Result<Option<Principal>>;
}

/// Principal provider backed by a static token table
///
/// When no token is presented and a development principal is configured, that
/// principal is returned and upserted as a participant, so a local setup can
/// record matches without an identity service.
pub struct TokenPrincipalProvider {
    tokens: HashMap<String, Principal>,
    dev_principal: Option<(Principal, String)>,
    repository: Arc<dyn ParticipantRepository>,
}

impl TokenPrincipalProvider {
    /// Create a provider from auth settings
    pub fn new(settings: &AuthSettings, repository: Arc<dyn ParticipantRepository>) -> Self {
        let tokens = settings
            .tokens
            .iter()
            .map(|t| {
                (
                    t.token.clone(),
                    Principal {
                        id: t.principal_id.clone(),
                        role: t.role,
                    },
                )
            })
            .collect();

        let dev_principal = settings.dev_principal_id.as_ref().map(|id| {
            let display_name = settings
                .dev_display_name
                .clone()
                .unwrap_or_else(|| id.clone());
            (
                Principal {
                    id: id.clone(),
                    role: settings.dev_role.unwrap_or(Role::Admin),
                },
                display_name,
            )
        });

        Self {
            tokens,
            dev_principal,
            repository,
        }
    }
}

#[async_trait]
impl PrincipalProvider for TokenPrincipalProvider {
    async fn resolve<'a>(&self, token: Option<&'a str>) -> Result<Option<Principal>> {
        match token {
            Some(token) => {
                let principal = self.tokens.get(token).cloned();
                if principal.is_none() {
                    warn!("Rejected unknown bearer token");
                }
                Ok(principal)
            }
            None => match &self.dev_principal {
                Some((principal, display_name)) => {
                    debug!("Using development principal {}", principal.id);
                    self.repository
                        .upsert_participant(&principal.id, display_name)
                        .await?;
                    Ok(Some(principal.clone()))
                }
                None => Ok(None),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticToken;
    use crate::rating::InMemoryParticipantRepository;

    fn settings() -> AuthSettings {
        AuthSettings {
            tokens: vec![
                StaticToken {
                    token: "referee-token".to_string(),
                    principal_id: "referee".to_string(),
                    role: Role::Admin,
                },
                StaticToken {
                    token: "player-token".to_string(),
                    principal_id: "ann".to_string(),
                    role: Role::Member,
                },
            ],
            ..AuthSettings::default()
        }
    }

    #[tokio::test]
    async fn test_known_and_unknown_tokens() {
        let repo = Arc::new(InMemoryParticipantRepository::default());
        let provider = TokenPrincipalProvider::new(&settings(), repo);

        let admin = provider.resolve(Some("referee-token")).await.unwrap();
        assert_eq!(admin.map(|p| p.role), Some(Role::Admin));

        assert!(provider.resolve(Some("forged")).await.unwrap().is_none());
        assert!(provider.resolve(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dev_principal_is_upserted() {
        let repo = Arc::new(InMemoryParticipantRepository::default());
        let mut auth = settings();
        auth.dev_principal_id = Some("dev-user-123".to_string());
        auth.dev_display_name = Some("Aristote".to_string());
        let provider = TokenPrincipalProvider::new(&auth, repo.clone());

        let principal = provider.resolve(None).await.unwrap().unwrap();
        assert_eq!(principal.id, "dev-user-123");
        assert!(principal.is_admin());

        let participant = repo
            .find_participant("dev-user-123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(participant.display_name, "Aristote");
        assert_eq!(participant.rating, 500);
    }

    #[tokio::test]
    async fn test_mocked_provider_sees_borrowed_token() {
        let mut provider = MockPrincipalProvider::new();
        provider.expect_resolve().times(1).returning(|token| {
            Ok(token.filter(|t| *t == "referee-token").map(|_| Principal {
                id: "referee".to_string(),
                role: Role::Admin,
            }))
        });

        let header = String::from("referee-token");
        let principal = provider.resolve(Some(header.as_str())).await.unwrap();
        assert!(require_admin(principal.as_ref()).is_ok());
    }

    #[test]
    fn test_require_admin() {
        let admin = Principal {
            id: "referee".to_string(),
            role: Role::Admin,
        };
        let member = Principal {
            id: "ann".to_string(),
            role: Role::Member,
        };

        assert!(require_admin(Some(&admin)).is_ok());

        let err = require_admin(Some(&member)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LadderError>(),
            Some(LadderError::Forbidden { .. })
        ));

        let err = require_admin(None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LadderError>(),
            Some(LadderError::Unauthenticated)
        ));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("user".parse::<Role>().unwrap(), Role::Member);
        assert!("root".parse::<Role>().is_err());
    }
}
