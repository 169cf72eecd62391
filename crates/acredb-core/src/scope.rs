//! Ownership scope resolution.
//!
//! Pure function from (caller context, requested scope, descriptor) to a
//! SQL fragment restricting reads to records the caller may see. A caller
//! may always request a narrower scope than their maximum; requesting a
//! wider one silently clamps to the maximum instead of failing.

use crate::{
    context::{Role, UserContext},
    descriptor::EntityDescriptor,
    sql::SqlValue,
};
use std::fmt;

///
/// OwnershipScope
///
/// The three visibility tiers, ordered narrow to wide.
///

#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub enum OwnershipScope {
    #[default]
    Own,
    Team,
    Brokerage,
}

impl OwnershipScope {
    /// Parse a caller-supplied scope token; unknown tokens read as `Own`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "team" => Self::Team,
            "brokerage" => Self::Brokerage,
            _ => Self::Own,
        }
    }

    /// The widest scope the caller's role permits.
    #[must_use]
    pub fn maximum_for(ctx: &UserContext) -> Self {
        match ctx.role {
            Some(Role::SystemAdmin | Role::Broker) => Self::Brokerage,
            Some(Role::TeamOwner) => Self::Team,
            Some(Role::Agent) | None => Self::Own,
        }
    }
}

impl fmt::Display for OwnershipScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Own => "own",
            Self::Team => "team",
            Self::Brokerage => "brokerage",
        };
        f.write_str(label)
    }
}

///
/// ScopeFilter
///
/// The resolved visibility fragment: an optional WHERE clause (already
/// containing `$n` placeholders numbered from the caller-supplied start
/// index) and its bound values in order. `None` means unrestricted.
///

#[derive(Clone, Debug)]
pub struct ScopeFilter {
    pub clause: Option<String>,
    pub params: Vec<SqlValue>,
}

impl ScopeFilter {
    const fn unrestricted() -> Self {
        Self {
            clause: None,
            params: Vec::new(),
        }
    }
}

/// Resolve the effective scope: requested if permitted, otherwise the
/// caller's maximum. Tenant-context gaps degrade further — a team scope
/// without a team id, or a brokerage scope without a broker id, falls back
/// to `Own`.
#[must_use]
pub fn effective_scope(ctx: &UserContext, requested: Option<OwnershipScope>) -> OwnershipScope {
    let max = OwnershipScope::maximum_for(ctx);
    let wanted = requested.unwrap_or(max).min(max);

    match wanted {
        OwnershipScope::Team if ctx.team_id.is_none() => OwnershipScope::Own,
        OwnershipScope::Brokerage if ctx.broker_id.is_none() => OwnershipScope::Own,
        other => other,
    }
}

/// Build the visibility fragment for `scope`, numbering placeholders from
/// `next_index`. The engine absorbs the returned params into its builder.
#[must_use]
pub fn scope_filter(
    desc: &EntityDescriptor,
    ctx: &UserContext,
    scope: OwnershipScope,
    next_index: usize,
) -> ScopeFilter {
    let owner = desc.qualify(&desc.fields.owner);
    let mut index = next_index;
    let mut bind = |params: &mut Vec<SqlValue>, value: SqlValue| {
        params.push(value);
        let ph = format!("${index}");
        index += 1;
        ph
    };

    match scope {
        OwnershipScope::Own => {
            let mut params = Vec::new();
            let ph = bind(
                &mut params,
                ctx.id.map_or(SqlValue::Null, SqlValue::Uuid),
            );
            ScopeFilter {
                clause: Some(format!("{owner} = {ph}")),
                params,
            }
        }
        OwnershipScope::Team => {
            // effective_scope guarantees team_id here; degrade anyway.
            let Some(team_id) = ctx.team_id else {
                return scope_filter(desc, ctx, OwnershipScope::Own, next_index);
            };

            let team = desc.qualify(&desc.fields.team);
            let mut params = Vec::new();
            let team_ph = bind(&mut params, SqlValue::Uuid(team_id));
            let mut clause = format!("{team} = {team_ph}");

            // Private records stay visible to their owner only.
            if let Some(private) = &desc.fields.is_private {
                let private = desc.qualify(private);
                let owner_ph = bind(
                    &mut params,
                    ctx.id.map_or(SqlValue::Null, SqlValue::Uuid),
                );
                clause = format!("{clause} AND ({private} = FALSE OR {owner} = {owner_ph})");
            }

            ScopeFilter {
                clause: Some(clause),
                params,
            }
        }
        OwnershipScope::Brokerage => {
            let Some(broker_id) = ctx.broker_id else {
                return scope_filter(desc, ctx, OwnershipScope::Own, next_index);
            };

            let mut params = Vec::new();
            let mut parts = Vec::new();

            if let Some(broker) = &desc.fields.broker {
                let broker = desc.qualify(broker);
                let ph = bind(&mut params, SqlValue::Uuid(broker_id));
                parts.push(format!("{broker} = {ph}"));
            }

            if let Some(private) = &desc.fields.is_private {
                let private = desc.qualify(private);
                let owner_ph = bind(
                    &mut params,
                    ctx.id.map_or(SqlValue::Null, SqlValue::Uuid),
                );
                parts.push(format!("({private} = FALSE OR {owner} = {owner_ph})"));
            }

            if parts.is_empty() {
                ScopeFilter::unrestricted()
            } else {
                ScopeFilter {
                    clause: Some(parts.join(" AND ")),
                    params,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{OwnershipScope, effective_scope, scope_filter};
    use crate::{
        context::{Role, UserContext},
        descriptor::EntityDescriptor,
        sql::SqlValue,
    };
    use uuid::Uuid;

    fn agent_ctx() -> UserContext {
        UserContext {
            id: Some(Uuid::from_u128(1)),
            role: Some(Role::Agent),
            team_id: Some(Uuid::from_u128(2)),
            broker_id: Some(Uuid::from_u128(3)),
            ..UserContext::default()
        }
    }

    fn lead_descriptor() -> EntityDescriptor {
        EntityDescriptor::builder("lead", "leads", "ld")
            .broker_column("broker_id")
            .privacy_column("is_private")
            .build()
            .expect("descriptor should build")
    }

    #[test]
    fn role_ceilings() {
        let mut ctx = agent_ctx();
        assert_eq!(OwnershipScope::maximum_for(&ctx), OwnershipScope::Own);

        ctx.role = Some(Role::TeamOwner);
        assert_eq!(OwnershipScope::maximum_for(&ctx), OwnershipScope::Team);

        ctx.role = Some(Role::Broker);
        assert_eq!(OwnershipScope::maximum_for(&ctx), OwnershipScope::Brokerage);

        ctx.role = Some(Role::SystemAdmin);
        assert_eq!(OwnershipScope::maximum_for(&ctx), OwnershipScope::Brokerage);

        ctx.role = None;
        assert_eq!(OwnershipScope::maximum_for(&ctx), OwnershipScope::Own);
    }

    #[test]
    fn over_broad_request_clamps_without_error() {
        let ctx = agent_ctx();

        assert_eq!(
            effective_scope(&ctx, Some(OwnershipScope::Brokerage)),
            OwnershipScope::Own
        );
    }

    #[test]
    fn narrower_request_is_honored() {
        let mut ctx = agent_ctx();
        ctx.role = Some(Role::Broker);

        assert_eq!(
            effective_scope(&ctx, Some(OwnershipScope::Own)),
            OwnershipScope::Own
        );
    }

    #[test]
    fn default_is_the_caller_maximum() {
        let mut ctx = agent_ctx();
        ctx.role = Some(Role::TeamOwner);

        assert_eq!(effective_scope(&ctx, None), OwnershipScope::Team);
    }

    #[test]
    fn team_scope_without_team_id_degrades_to_own() {
        let mut ctx = agent_ctx();
        ctx.role = Some(Role::TeamOwner);
        ctx.team_id = None;

        assert_eq!(
            effective_scope(&ctx, Some(OwnershipScope::Team)),
            OwnershipScope::Own
        );
    }

    #[test]
    fn own_scope_binds_the_caller_id() {
        let ctx = agent_ctx();
        let filter = scope_filter(&lead_descriptor(), &ctx, OwnershipScope::Own, 3);

        assert_eq!(filter.clause.as_deref(), Some("ld.owner_id = $3"));
        assert_eq!(filter.params, vec![SqlValue::Uuid(Uuid::from_u128(1))]);
    }

    #[test]
    fn anonymous_own_scope_matches_no_rows() {
        let ctx = UserContext::default();
        let filter = scope_filter(&lead_descriptor(), &ctx, OwnershipScope::Own, 1);

        assert_eq!(filter.clause.as_deref(), Some("ld.owner_id = $1"));
        assert_eq!(filter.params, vec![SqlValue::Null]);
    }

    #[test]
    fn team_scope_carries_the_privacy_carve_out() {
        let ctx = agent_ctx();
        let filter = scope_filter(&lead_descriptor(), &ctx, OwnershipScope::Team, 1);

        assert_eq!(
            filter.clause.as_deref(),
            Some("ld.team_id = $1 AND (ld.is_private = FALSE OR ld.owner_id = $2)")
        );
        assert_eq!(
            filter.params,
            vec![
                SqlValue::Uuid(Uuid::from_u128(2)),
                SqlValue::Uuid(Uuid::from_u128(1)),
            ]
        );
    }

    #[test]
    fn team_scope_without_privacy_column_has_no_carve_out() {
        let desc = EntityDescriptor::builder("listing", "listings", "l")
            .build()
            .expect("descriptor should build");
        let ctx = agent_ctx();
        let filter = scope_filter(&desc, &ctx, OwnershipScope::Team, 1);

        assert_eq!(filter.clause.as_deref(), Some("l.team_id = $1"));
    }

    #[test]
    fn brokerage_scope_binds_broker_and_privacy() {
        let ctx = agent_ctx();
        let filter = scope_filter(&lead_descriptor(), &ctx, OwnershipScope::Brokerage, 1);

        assert_eq!(
            filter.clause.as_deref(),
            Some("ld.broker_id = $1 AND (ld.is_private = FALSE OR ld.owner_id = $2)")
        );
    }

    #[test]
    fn brokerage_scope_without_broker_column_is_unrestricted() {
        let desc = EntityDescriptor::builder("listing", "listings", "l")
            .build()
            .expect("descriptor should build");
        let ctx = agent_ctx();
        let filter = scope_filter(&desc, &ctx, OwnershipScope::Brokerage, 1);

        assert!(filter.clause.is_none());
        assert!(filter.params.is_empty());
    }
}
