//! Declarative per-entity configuration.
//!
//! One [`EntityDescriptor`] per entity type, built once at process start by
//! layering entity overrides on shared defaults, immutable thereafter. The
//! access engine is parameterized by descriptor value — there is no
//! per-entity code path.

pub mod events;
pub mod fields;
pub mod filters;
pub mod hooks;
pub mod query;

pub use events::{Audience, EventPolicy};
pub use fields::FieldMap;
pub use filters::{FilterOp, FilterSpec, FilterValueType};
pub use hooks::{HookError, LifecycleHooks, Payload};
pub use query::{JoinKind, JoinSpec, QueryConfig, SortDirection};

use crate::{
    error::EngineError,
    sql::ident::{is_safe_ident, is_safe_qualified},
};
use convert_case::{Case, Casing};
use std::{collections::BTreeMap, fmt};
use thiserror::Error as ThisError;

///
/// DescriptorError
///
/// Construction-time configuration failure. Descriptor authors are trusted
/// but checked; a descriptor that fails to build is a programming error
/// caught at process start.
///

#[derive(Debug, ThisError)]
pub enum DescriptorError {
    #[error("descriptor `{entity}` contains an invalid identifier: `{ident}`")]
    InvalidIdentifier { entity: String, ident: String },

    #[error("descriptor `{entity}` declares default sort `{key}` outside its sortable allow-list")]
    UnknownDefaultSort { entity: String, key: String },

    #[error("descriptor `{entity}` declares a join condition with disallowed characters: `{on}`")]
    InvalidJoinCondition { entity: String, on: String },

    #[error("descriptor `{entity}` declares a non-positive page size")]
    InvalidPageSize { entity: String },
}

///
/// Identity
///
/// Table identity plus display names used in caller-facing messages.
///

#[derive(Clone, Debug)]
pub struct Identity {
    pub name: String,
    pub name_plural: String,
    pub label: String,
    pub table: String,
    pub alias: String,
}

///
/// OperationKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperationKind {
    List,
    Get,
    Create,
    Update,
    Archive,
    Restore,
    HardDelete,
    BatchDelete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Archive => "archive",
            Self::Restore => "restore",
            Self::HardDelete => "hard-delete",
            Self::BatchDelete => "batch-delete",
        };
        write!(f, "{label}")
    }
}

///
/// OperationFlags
///
/// Which operations are enabled for the entity. Everything defaults on.
///

#[derive(Clone, Copy, Debug)]
pub struct OperationFlags {
    pub list: bool,
    pub get: bool,
    pub create: bool,
    pub update: bool,
    pub archive: bool,
    pub restore: bool,
    pub hard_delete: bool,
    pub batch_delete: bool,
}

impl Default for OperationFlags {
    fn default() -> Self {
        Self {
            list: true,
            get: true,
            create: true,
            update: true,
            archive: true,
            restore: true,
            hard_delete: true,
            batch_delete: true,
        }
    }
}

impl OperationFlags {
    #[must_use]
    pub const fn allows(&self, op: OperationKind) -> bool {
        match op {
            OperationKind::List => self.list,
            OperationKind::Get => self.get,
            OperationKind::Create => self.create,
            OperationKind::Update => self.update,
            OperationKind::Archive => self.archive,
            OperationKind::Restore => self.restore,
            OperationKind::HardDelete => self.hard_delete,
            OperationKind::BatchDelete => self.batch_delete,
        }
    }
}

///
/// EntityDescriptor
///
/// Immutable declarative definition of one business entity: identity,
/// field-role map, operation flags, external-name aliases, required and
/// immutable column sets, query surface, named filters, event policy, and
/// lifecycle hooks.
///

#[derive(Clone, Debug)]
pub struct EntityDescriptor {
    pub identity: Identity,
    pub fields: FieldMap,
    pub operations: OperationFlags,
    pub aliases: BTreeMap<String, String>,
    pub required: Vec<String>,
    pub immutable: Vec<String>,
    pub query: QueryConfig,
    pub filters: Vec<FilterSpec>,
    pub events: EventPolicy,
    pub hooks: LifecycleHooks,
}

impl EntityDescriptor {
    #[must_use]
    pub fn builder(name: impl Into<String>, table: impl Into<String>, alias: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(name, table, alias)
    }

    /// Qualify a storage column with the entity's table alias.
    #[must_use]
    pub fn qualify(&self, column: &str) -> String {
        format!("{}.{column}", self.identity.alias)
    }

    /// Translate an external field name to its storage column.
    ///
    /// Alias-mapped names win; anything else is converted camelCase to
    /// snake_case and must pass the identifier grammar. Unmappable names
    /// are a validation error — external names never reach query text raw.
    pub fn storage_column(&self, external: &str) -> Result<String, EngineError> {
        if let Some(column) = self.aliases.get(external) {
            return Ok(column.clone());
        }

        // Reject malformed names before case conversion; the converter
        // strips punctuation, which would quietly launder hostile input.
        let well_formed = !external.is_empty()
            && external
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if well_formed {
            let snake = external.to_case(Case::Snake);
            if is_safe_ident(&snake) {
                return Ok(snake);
            }
        }

        Err(EngineError::validation(format!(
            "`{external}` is not a valid {} field",
            self.identity.name
        )))
    }

    pub fn ensure_enabled(&self, op: OperationKind) -> Result<(), EngineError> {
        if self.operations.allows(op) {
            Ok(())
        } else {
            Err(EngineError::validation(format!(
                "the {op} operation is not enabled for {}",
                self.identity.name_plural
            )))
        }
    }

    #[must_use]
    pub fn is_immutable(&self, column: &str) -> bool {
        self.immutable.iter().any(|c| c == column)
    }
}

///
/// DescriptorBuilder
///
/// Layered construction: shared defaults first, entity overrides on top,
/// identifier validation at `build`.
///

#[derive(Debug)]
pub struct DescriptorBuilder {
    name: String,
    name_plural: Option<String>,
    label: Option<String>,
    table: String,
    alias: String,
    fields: FieldMap,
    operations: OperationFlags,
    aliases: BTreeMap<String, String>,
    required: Vec<String>,
    immutable: Vec<String>,
    default_sort: Option<String>,
    default_direction: SortDirection,
    default_limit: i64,
    max_limit: i64,
    sortable: Vec<(String, String)>,
    search_columns: Vec<String>,
    statuses: Vec<String>,
    joins: Vec<JoinSpec>,
    list_columns: Vec<String>,
    detail_columns: Vec<String>,
    filters: Vec<FilterSpec>,
    events: EventPolicy,
    hooks: LifecycleHooks,
}

impl DescriptorBuilder {
    const DEFAULT_LIMIT: i64 = 20;
    const MAX_LIMIT: i64 = 100;

    #[must_use]
    pub fn new(name: impl Into<String>, table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_plural: None,
            label: None,
            table: table.into(),
            alias: alias.into(),
            fields: FieldMap::default(),
            operations: OperationFlags::default(),
            aliases: BTreeMap::new(),
            required: Vec::new(),
            immutable: vec!["id".to_owned(), "created_at".to_owned()],
            default_sort: None,
            default_direction: SortDirection::Desc,
            default_limit: Self::DEFAULT_LIMIT,
            max_limit: Self::MAX_LIMIT,
            sortable: Vec::new(),
            search_columns: Vec::new(),
            statuses: Vec::new(),
            joins: Vec::new(),
            list_columns: Vec::new(),
            detail_columns: Vec::new(),
            filters: Vec::new(),
            events: EventPolicy::disabled(),
            hooks: LifecycleHooks::default(),
        }
    }

    #[must_use]
    pub fn plural(mut self, plural: impl Into<String>) -> Self {
        self.name_plural = Some(plural.into());
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn owner_column(mut self, column: impl Into<String>) -> Self {
        self.fields.owner = column.into();
        self
    }

    #[must_use]
    pub fn team_column(mut self, column: impl Into<String>) -> Self {
        self.fields.team = column.into();
        self
    }

    #[must_use]
    pub fn broker_column(mut self, column: impl Into<String>) -> Self {
        self.fields.broker = Some(column.into());
        self
    }

    #[must_use]
    pub fn status_column(mut self, column: impl Into<String>) -> Self {
        self.fields.status = column.into();
        self
    }

    /// Declare the optimistic-lock version column. The column is also
    /// immutable from the caller's side; the engine owns it.
    #[must_use]
    pub fn version_column(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        self.immutable.push(column.clone());
        self.fields.version = Some(column);
        self
    }

    #[must_use]
    pub fn privacy_column(mut self, column: impl Into<String>) -> Self {
        self.fields.is_private = Some(column.into());
        self
    }

    #[must_use]
    pub fn operations(mut self, flags: OperationFlags) -> Self {
        self.operations = flags;
        self
    }

    /// Map an external (client-facing) field name to a storage column.
    #[must_use]
    pub fn field_alias(mut self, external: impl Into<String>, column: impl Into<String>) -> Self {
        self.aliases.insert(external.into(), column.into());
        self
    }

    #[must_use]
    pub fn required(mut self, columns: &[&str]) -> Self {
        self.required = columns.iter().map(|c| (*c).to_owned()).collect();
        self
    }

    #[must_use]
    pub fn immutable(mut self, columns: &[&str]) -> Self {
        self.immutable
            .extend(columns.iter().map(|c| (*c).to_owned()));
        self
    }

    #[must_use]
    pub fn default_sort(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.default_sort = Some(key.into());
        self.default_direction = direction;
        self
    }

    #[must_use]
    pub const fn page_sizes(mut self, default_limit: i64, max_limit: i64) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    /// Allow-list a sortable column: external key → qualified expression.
    #[must_use]
    pub fn sortable(mut self, key: impl Into<String>, expression: impl Into<String>) -> Self {
        self.sortable.push((key.into(), expression.into()));
        self
    }

    #[must_use]
    pub fn search_columns(mut self, columns: &[&str]) -> Self {
        self.search_columns = columns.iter().map(|c| (*c).to_owned()).collect();
        self
    }

    #[must_use]
    pub fn statuses(mut self, statuses: &[&str]) -> Self {
        self.statuses = statuses.iter().map(|s| (*s).to_owned()).collect();
        self
    }

    #[must_use]
    pub fn join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }

    #[must_use]
    pub fn list_columns(mut self, columns: &[&str]) -> Self {
        self.list_columns = columns.iter().map(|c| (*c).to_owned()).collect();
        self
    }

    #[must_use]
    pub fn detail_columns(mut self, columns: &[&str]) -> Self {
        self.detail_columns = columns.iter().map(|c| (*c).to_owned()).collect();
        self
    }

    #[must_use]
    pub fn filter(mut self, spec: FilterSpec) -> Self {
        self.filters.push(spec);
        self
    }

    #[must_use]
    pub fn events(mut self, policy: EventPolicy) -> Self {
        self.events = policy;
        self
    }

    #[must_use]
    pub fn hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> Result<EntityDescriptor, DescriptorError> {
        let name_plural = self
            .name_plural
            .unwrap_or_else(|| format!("{}s", self.name));
        let label = self
            .label
            .unwrap_or_else(|| self.name.to_case(Case::Title));

        let default_star = format!("{}.*", self.alias);
        let list_columns = if self.list_columns.is_empty() {
            vec![default_star.clone()]
        } else {
            self.list_columns
        };
        let detail_columns = if self.detail_columns.is_empty() {
            vec![default_star]
        } else {
            self.detail_columns
        };

        let qualified_created = format!("{}.{}", self.alias, self.fields.created_at);
        let qualified_updated = format!("{}.{}", self.alias, self.fields.updated_at);
        let mut sortable = self.sortable;
        if sortable.is_empty() {
            sortable.push(("createdAt".to_owned(), qualified_created));
            sortable.push(("updatedAt".to_owned(), qualified_updated));
        }
        let default_sort = self.default_sort.unwrap_or_else(|| "createdAt".to_owned());

        let descriptor = EntityDescriptor {
            identity: Identity {
                name: self.name,
                name_plural,
                label,
                table: self.table,
                alias: self.alias,
            },
            fields: self.fields,
            operations: self.operations,
            aliases: self.aliases,
            required: self.required,
            immutable: self.immutable,
            query: QueryConfig {
                default_sort,
                default_direction: self.default_direction,
                default_limit: self.default_limit,
                max_limit: self.max_limit,
                sortable,
                search_columns: self.search_columns,
                statuses: self.statuses,
                joins: self.joins,
                list_columns,
                detail_columns,
            },
            filters: self.filters,
            events: self.events,
            hooks: self.hooks,
        };

        validate(&descriptor)?;

        Ok(descriptor)
    }
}

// Join conditions are static author text; anything outside this set is a
// configuration error, not something to escape.
fn is_safe_join_condition(on: &str) -> bool {
    !on.is_empty()
        && on.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | ' ' | '=')
        })
}

fn validate(desc: &EntityDescriptor) -> Result<(), DescriptorError> {
    let entity = &desc.identity.name;

    let invalid = |ident: &str| DescriptorError::InvalidIdentifier {
        entity: entity.clone(),
        ident: ident.to_owned(),
    };

    for ident in [desc.identity.table.as_str(), desc.identity.alias.as_str()] {
        if !is_safe_ident(ident) {
            return Err(invalid(ident));
        }
    }

    for column in desc.fields.columns() {
        if !is_safe_ident(column) {
            return Err(invalid(column));
        }
    }

    for column in desc
        .aliases
        .values()
        .chain(desc.required.iter())
        .chain(desc.immutable.iter())
    {
        if !is_safe_ident(column) {
            return Err(invalid(column));
        }
    }

    for expr in desc
        .query
        .search_columns
        .iter()
        .chain(desc.query.sortable.iter().map(|(_, e)| e))
        .chain(desc.query.list_columns.iter())
        .chain(desc.query.detail_columns.iter())
        .chain(desc.filters.iter().map(|f| &f.column))
    {
        // Projections allow `alias.*`; everything else is a qualified column.
        let bare = expr.strip_suffix(".*").unwrap_or(expr);
        if !is_safe_qualified(bare) {
            return Err(invalid(expr));
        }
    }

    for join in &desc.query.joins {
        if !is_safe_ident(&join.table) || !is_safe_ident(&join.alias) {
            return Err(invalid(&join.table));
        }
        if !is_safe_join_condition(&join.on) {
            return Err(DescriptorError::InvalidJoinCondition {
                entity: entity.clone(),
                on: join.on.clone(),
            });
        }
    }

    if desc.query.lookup_is_missing() {
        return Err(DescriptorError::UnknownDefaultSort {
            entity: entity.clone(),
            key: desc.query.default_sort.clone(),
        });
    }

    if desc.query.default_limit < 1 || desc.query.max_limit < desc.query.default_limit {
        return Err(DescriptorError::InvalidPageSize {
            entity: entity.clone(),
        });
    }

    Ok(())
}

impl QueryConfig {
    fn lookup_is_missing(&self) -> bool {
        !self
            .sortable
            .iter()
            .any(|(external, _)| *external == self.default_sort)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DescriptorError, EntityDescriptor, EventPolicy, FilterOp, FilterSpec, FilterValueType,
        JoinKind, JoinSpec, OperationKind, SortDirection,
    };

    fn lead_descriptor() -> EntityDescriptor {
        EntityDescriptor::builder("lead", "leads", "ld")
            .status_column("lead_status")
            .version_column("version")
            .privacy_column("is_private")
            .field_alias("firstName", "first_name")
            .field_alias("leadStatus", "lead_status")
            .required(&["first_name", "lead_status"])
            .sortable("createdAt", "ld.created_at")
            .sortable("firstName", "ld.first_name")
            .default_sort("createdAt", SortDirection::Desc)
            .statuses(&["new", "contacted", "qualified"])
            .build()
            .expect("fixture descriptor should build")
    }

    #[test]
    fn defaults_are_layered() {
        let desc = lead_descriptor();

        assert_eq!(desc.identity.name_plural, "leads");
        assert_eq!(desc.identity.label, "Lead");
        assert_eq!(desc.fields.id, "id");
        assert_eq!(desc.fields.status, "lead_status");
        assert_eq!(desc.query.list_columns, vec!["ld.*".to_owned()]);
        assert!(desc.is_immutable("id"));
        assert!(desc.is_immutable("created_at"));
        assert!(desc.is_immutable("version"));
    }

    #[test]
    fn alias_mapping_wins_over_case_conversion() {
        let desc = lead_descriptor();

        assert_eq!(desc.storage_column("leadStatus").unwrap(), "lead_status");
        // Unmapped names fall back to snake_case.
        assert_eq!(desc.storage_column("leadSource").unwrap(), "lead_source");
    }

    #[test]
    fn unmappable_external_name_is_rejected() {
        let desc = lead_descriptor();

        let err = desc
            .storage_column("lead_status; DROP TABLE leads")
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn invalid_identifier_fails_build() {
        let result = EntityDescriptor::builder("lead", "leads; --", "ld")
            .sortable("createdAt", "ld.created_at")
            .build();

        assert!(matches!(
            result,
            Err(DescriptorError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn default_sort_must_be_allow_listed() {
        let result = EntityDescriptor::builder("lead", "leads", "ld")
            .sortable("createdAt", "ld.created_at")
            .default_sort("pricePerSqft", SortDirection::Asc)
            .build();

        assert!(matches!(
            result,
            Err(DescriptorError::UnknownDefaultSort { .. })
        ));
    }

    #[test]
    fn join_condition_grammar_is_enforced() {
        let result = EntityDescriptor::builder("appointment", "appointments", "a")
            .join(JoinSpec::new(
                JoinKind::Left,
                "clients",
                "c",
                "c.id = a.client_id; DROP TABLE clients",
            ))
            .build();

        assert!(matches!(
            result,
            Err(DescriptorError::InvalidJoinCondition { .. })
        ));
    }

    #[test]
    fn disabled_operations_are_refused() {
        let mut flags = super::OperationFlags::default();
        flags.batch_delete = false;

        let desc = EntityDescriptor::builder("document", "documents", "d")
            .operations(flags)
            .build()
            .expect("descriptor should build");

        assert!(desc.ensure_enabled(OperationKind::List).is_ok());
        assert!(desc.ensure_enabled(OperationKind::BatchDelete).is_err());
    }

    #[test]
    fn filter_and_event_config_round_trip() {
        let desc = EntityDescriptor::builder("listing", "listings", "l")
            .filter(FilterSpec::new(
                "minPrice",
                "l.list_price",
                FilterOp::Gte,
                FilterValueType::Number,
            ))
            .events(EventPolicy::rooms(vec![super::Audience::User]))
            .build()
            .expect("descriptor should build");

        assert_eq!(desc.filters.len(), 1);
        assert!(desc.events.emit);
    }
}
