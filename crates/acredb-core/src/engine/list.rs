//! Paged list queries.
//!
//! The count query and the data query share one WHERE clause built from
//! the same bound parameters, so the page total always agrees with the
//! rows returned.

use crate::{
    context::UserContext,
    descriptor::{EntityDescriptor, OperationKind, SortDirection},
    engine::AccessEngine,
    error::EngineError,
    row::EntityRow,
    scope::{self, OwnershipScope},
    sql::{FragmentBuilder, SqlValue, Statement},
};
use std::collections::BTreeMap;

///
/// ListParams
///
/// Raw caller inputs for a list call. Everything is optional; unknown sort
/// keys, undeclared statuses, and unparsable filter values degrade to the
/// descriptor defaults instead of failing the request.
///

#[derive(Clone, Debug, Default)]
pub struct ListParams {
    pub page: i64,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub scope: Option<OwnershipScope>,
    pub filters: BTreeMap<String, String>,
}

///
/// Page
///

#[derive(Clone, Debug)]
pub struct Page {
    pub data: Vec<EntityRow>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

pub(super) async fn run(
    engine: &AccessEngine,
    desc: &EntityDescriptor,
    ctx: &UserContext,
    params: &ListParams,
) -> Result<Page, EngineError> {
    desc.ensure_enabled(OperationKind::List)?;

    let limit = params
        .limit
        .unwrap_or(desc.query.default_limit)
        .clamp(1, desc.query.max_limit);
    let page = params.page.max(1);
    let offset = (page - 1) * limit;

    let mut fb = FragmentBuilder::new();
    let mut conditions = vec![format!("{} IS NULL", desc.qualify(&desc.fields.deleted_at))];

    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
        // Undeclared status values are ignored, not errors.
        if desc.query.is_declared_status(status) {
            let ph = fb.bind(SqlValue::Text(status.to_owned()));
            conditions.push(format!("{} = {ph}", desc.qualify(&desc.fields.status)));
        }
    }

    if let Some(search) = params.search.as_deref().filter(|s| !s.is_empty()) {
        if !desc.query.search_columns.is_empty() {
            // One bound pattern shared across every searchable column.
            let ph = fb.bind(SqlValue::Text(format!("%{search}%")));
            let ors = desc
                .query
                .search_columns
                .iter()
                .map(|column| format!("{column} ILIKE {ph}"))
                .collect::<Vec<_>>()
                .join(" OR ");
            conditions.push(format!("({ors})"));
        }
    }

    for spec in &desc.filters {
        if let Some(raw) = params.filters.get(&spec.name) {
            if let Some(value) = spec.coerce(raw) {
                let ph = fb.bind(value);
                conditions.push(format!("{} {} {ph}", spec.column, spec.op.as_sql()));
            } else {
                tracing::debug!(
                    entity = %desc.identity.name,
                    filter = %spec.name,
                    "filter value did not coerce; skipping"
                );
            }
        }
    }

    let effective = scope::effective_scope(ctx, params.scope);
    let filter = scope::scope_filter(desc, ctx, effective, fb.next_index());
    if let Some(clause) = filter.clause {
        conditions.push(clause);
        fb.absorb(filter.params);
    }

    let where_clause = conditions.join(" AND ");
    let mut from = format!("{} {}", desc.identity.table, desc.identity.alias);
    let joins = desc.query.join_clause();
    if !joins.is_empty() {
        from.push(' ');
        from.push_str(&joins);
    }

    let count_stmt = Statement::new(
        format!("SELECT COUNT(*) AS total FROM {from} WHERE {where_clause}"),
        fb.snapshot(),
    );

    let sort_expr = desc.query.sort_expression(params.sort.as_deref());
    let direction = params
        .direction
        .as_deref()
        .map_or(desc.query.default_direction, SortDirection::parse);
    let projection = desc.query.list_columns.join(", ");
    let limit_ph = fb.bind(SqlValue::Int(limit));
    let offset_ph = fb.bind(SqlValue::Int(offset));
    let data_stmt = Statement::new(
        format!(
            "SELECT {projection} FROM {from} WHERE {where_clause} \
             ORDER BY {sort_expr} {direction} LIMIT {limit_ph} OFFSET {offset_ph}"
        ),
        fb.into_params(),
    );

    tracing::debug!(
        entity = %desc.identity.name,
        scope = %effective,
        page,
        limit,
        "list"
    );

    let mut conn = engine.connection().await?;
    let total = conn
        .query(&count_stmt)
        .await?
        .first()
        .and_then(|row| row.get_i64("total"))
        .unwrap_or(0);
    let data = conn.query(&data_stmt).await?;

    let total_pages = if total == 0 {
        0
    } else {
        (total + limit - 1) / limit
    };

    Ok(Page {
        data,
        total,
        page,
        limit,
        total_pages,
    })
}
