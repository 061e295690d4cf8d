//! Identity collaborator: maps bearer credentials to stable user ids.
//!
//! The real deployment delegates this to an external identity provider; the
//! in-memory provider here issues one opaque token per signup.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use uuid::Uuid;

use crate::error::{PortalError, PortalResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Identity {
    pub id: String,
    pub email: String,
}

/// Newly created identity plus the credential the client will present.
#[derive(Debug, Clone)]
pub struct IssuedIdentity {
    pub identity: Identity,
    pub access_token: String,
}

#[rocket::async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> PortalResult<IssuedIdentity>;

    async fn resolve(&self, bearer: &str) -> Option<Identity>;
}

#[derive(Debug, Default)]
pub struct MemoryIdentityProvider {
    tokens: Mutex<HashMap<String, Identity>>,
    emails: Mutex<HashSet<String>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl IdentityResolver for MemoryIdentityProvider {
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> PortalResult<IssuedIdentity> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(PortalError::Validation("A valid email is required".into()));
        }
        if name.trim().is_empty() {
            return Err(PortalError::Validation("Name is required".into()));
        }
        if password.chars().count() < 6 {
            return Err(PortalError::Validation(
                "Password should be at least 6 characters".into(),
            ));
        }
        {
            let mut emails = match self.emails.lock() {
                Ok(g) => g,
                Err(e) => e.into_inner(),
            };
            if !emails.insert(email.clone()) {
                return Err(PortalError::Validation(
                    "A user with this email address has already been registered".into(),
                ));
            }
        }

        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            email,
        };
        let access_token = Uuid::new_v4().simple().to_string();
        match self.tokens.lock() {
            Ok(mut g) => g.insert(access_token.clone(), identity.clone()),
            Err(e) => e.into_inner().insert(access_token.clone(), identity.clone()),
        };
        Ok(IssuedIdentity {
            identity,
            access_token,
        })
    }

    async fn resolve(&self, bearer: &str) -> Option<Identity> {
        match self.tokens.lock() {
            Ok(g) => g.get(bearer).cloned(),
            Err(e) => e.into_inner().get(bearer).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rocket::async_test]
    async fn issued_token_resolves_to_identity() {
        let provider = MemoryIdentityProvider::new();
        let issued = provider
            .create_user("Misty@cerulean.gym", "starmie", "Misty")
            .await
            .expect("signup succeeds");
        assert_eq!(issued.identity.email, "misty@cerulean.gym");
        let resolved = provider.resolve(&issued.access_token).await;
        assert_eq!(resolved, Some(issued.identity));
        assert_eq!(provider.resolve("not-a-token").await, None);
    }

    #[rocket::async_test]
    async fn duplicate_email_and_short_password_rejected() {
        let provider = MemoryIdentityProvider::new();
        provider
            .create_user("brock@pewter.gym", "onix123", "Brock")
            .await
            .expect("first signup succeeds");
        assert!(matches!(
            provider.create_user("BROCK@pewter.gym", "onix123", "Brock").await,
            Err(PortalError::Validation(_))
        ));
        assert!(matches!(
            provider.create_user("gary@pallet.town", "eevee", "Gary").await,
            Err(PortalError::Validation(_))
        ));
    }
}
