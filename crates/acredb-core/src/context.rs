//! Normalization of authenticated-principal records.
//!
//! Upstream authentication hands over principals in more than one shape:
//! the role may be a scalar or a non-empty array, and team/broker ids appear
//! under snake_case or camelCase keys depending on which middleware minted
//! the session. Everything downstream consumes one canonical [`UserContext`]
//! built here, exactly once per request.

use serde::Deserialize;
use std::fmt;
use uuid::Uuid;

///
/// RawPrincipal
///
/// Wire-shaped principal record as produced by the authentication layer.
/// Tolerant by construction; never used past the normalization boundary.
///

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawPrincipal {
    #[serde(default)]
    pub id: Option<Uuid>,

    #[serde(default)]
    pub role: Option<RoleField>,

    #[serde(default, alias = "teamId")]
    pub team_id: Option<Uuid>,

    #[serde(default, alias = "brokerId")]
    pub broker_id: Option<Uuid>,

    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,

    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
}

///
/// RoleField
///
/// Role as found on the wire: a single value or an ordered collection.
/// The first element of a collection is the effective role.
///

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RoleField {
    One(String),
    Many(Vec<String>),
}

impl RoleField {
    fn effective(&self) -> Option<Role> {
        match self {
            Self::One(role) => Some(Role::parse(role)),
            Self::Many(roles) => roles.first().map(|r| Role::parse(r)),
        }
    }
}

///
/// Role
///
/// Canonical single-valued caller role. Unknown role strings normalize to
/// the least-privileged tier.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    SystemAdmin,
    Broker,
    TeamOwner,
    Agent,
}

impl Role {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "system_admin" => Self::SystemAdmin,
            "broker" => Self::Broker,
            "team_owner" => Self::TeamOwner,
            _ => Self::Agent,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SystemAdmin => "system_admin",
            Self::Broker => "broker",
            Self::TeamOwner => "team_owner",
            Self::Agent => "agent",
        };
        write!(f, "{label}")
    }
}

///
/// UserContext
///
/// Canonical, ephemeral per-request caller identity. Never persisted.
/// A missing principal yields an all-`None` context; operations that
/// require identity check for it explicitly.
///

#[derive(Clone, Debug, Default)]
pub struct UserContext {
    pub id: Option<Uuid>,
    pub role: Option<Role>,
    pub team_id: Option<Uuid>,
    pub broker_id: Option<Uuid>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserContext {
    /// Pure transformation from the wire shape. No side effects.
    #[must_use]
    pub fn from_principal(principal: Option<&RawPrincipal>) -> Self {
        let Some(raw) = principal else {
            return Self::default();
        };

        Self {
            id: raw.id,
            role: raw.role.as_ref().and_then(RoleField::effective),
            team_id: raw.team_id,
            broker_id: raw.broker_id,
            first_name: raw.first_name.clone(),
            last_name: raw.last_name.clone(),
        }
    }
}
