//! Caller identity as consumed by the core.
//!
//! Resolving who is calling (credentials, certificates, enrollment) happens
//! outside this crate. The core only ever sees a [`Caller`]: a display name
//! plus the raw role claim attached to it.

use crate::core::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

pub const USER_ENV_VAR: &str = "LIFELEDGER_USER";
pub const ROLE_ENV_VAR: &str = "LIFELEDGER_ROLE";

/// Institutional role claims recognised by the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Affiliation {
    Guardian,
    BirthRegistrar,
    HealthProvider,
    IllnessProvider,
    DeathRegistrar,
}

impl Affiliation {
    pub const ALL: [Affiliation; 5] = [
        Affiliation::Guardian,
        Affiliation::BirthRegistrar,
        Affiliation::HealthProvider,
        Affiliation::IllnessProvider,
        Affiliation::DeathRegistrar,
    ];

    /// Role string as carried on a credential.
    pub fn as_str(&self) -> &'static str {
        match self {
            Affiliation::Guardian => "parents",
            Affiliation::BirthRegistrar => "birthday",
            Affiliation::HealthProvider => "healthy",
            Affiliation::IllnessProvider => "illness",
            Affiliation::DeathRegistrar => "death",
        }
    }

    pub fn from_role_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

impl fmt::Display for Affiliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of whoever is running the current invocation.
///
/// The role is kept verbatim: a role outside the five recognised ones is not an
/// error on its own, it simply never satisfies an equality guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub name: String,
    pub role: String,
}

impl Caller {
    pub fn new(name: &str, role: &str) -> Self {
        Self {
            name: name.to_string(),
            role: role.to_string(),
        }
    }

    pub fn with_affiliation(name: &str, affiliation: Affiliation) -> Self {
        Self::new(name, affiliation.as_str())
    }

    pub fn affiliation(&self) -> Option<Affiliation> {
        Affiliation::from_role_str(&self.role)
    }

    pub fn is(&self, affiliation: Affiliation) -> bool {
        self.affiliation() == Some(affiliation)
    }
}

pub trait IdentityProvider {
    fn caller(&self) -> Result<Caller, LedgerError>;
}

/// Resolves each half of the caller independently: explicit override first,
/// then `LIFELEDGER_USER` / `LIFELEDGER_ROLE`, then configured defaults.
#[derive(Debug, Clone, Default)]
pub struct EnvIdentity {
    pub user_override: Option<String>,
    pub role_override: Option<String>,
    pub default_user: Option<String>,
    pub default_role: Option<String>,
}

impl EnvIdentity {
    fn resolve(
        over: &Option<String>,
        var: &str,
        default: &Option<String>,
        what: &str,
    ) -> Result<String, LedgerError> {
        over.clone()
            .or_else(|| env::var(var).ok())
            .or_else(|| default.clone())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                LedgerError::ConfigError(format!(
                    "caller {} unresolved: set --{}, {} or [identity].{}",
                    what, what, var, what
                ))
            })
    }
}

impl IdentityProvider for EnvIdentity {
    fn caller(&self) -> Result<Caller, LedgerError> {
        let name = Self::resolve(&self.user_override, USER_ENV_VAR, &self.default_user, "user")?;
        let role = Self::resolve(&self.role_override, ROLE_ENV_VAR, &self.default_role, "role")?;
        Ok(Caller { name, role })
    }
}
