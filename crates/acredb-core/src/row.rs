//! Row representation handed back by every engine operation.
//!
//! Rows are descriptor-driven, not statically typed: the projection is
//! declared per entity, so the natural shape is an ordered JSON map keyed
//! by the storage column (or join-projected) names.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use derive_more::{Deref, DerefMut};
use serde_json::{Map as JsonMap, Number, Value as JsonValue};
use tokio_postgres::types::Type;
use uuid::Uuid;

///
/// EntityRow
///
/// One result row as an ordered column-name → JSON value map.
///

#[derive(Clone, Debug, Default, Deref, DerefMut, PartialEq)]
pub struct EntityRow(JsonMap<String, JsonValue>);

impl EntityRow {
    #[must_use]
    pub const fn new(map: JsonMap<String, JsonValue>) -> Self {
        Self(map)
    }

    /// Decode a Postgres wire row into the JSON map shape.
    ///
    /// Uuids and timestamps become strings (uuid text form, RFC 3339);
    /// column types outside the supported set decode as null.
    #[must_use]
    pub fn from_pg(row: &tokio_postgres::Row) -> Self {
        let mut map = JsonMap::with_capacity(row.columns().len());

        for (idx, column) in row.columns().iter().enumerate() {
            let value = decode_column(row, idx, column.type_());
            map.insert(column.name().to_owned(), value);
        }

        Self(map)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(JsonValue::as_str)
    }

    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(JsonValue::as_i64)
    }

    #[must_use]
    pub fn get_uuid(&self, key: &str) -> Option<Uuid> {
        self.get_str(key).and_then(|s| Uuid::parse_str(s).ok())
    }

    /// True when the column is absent or JSON null.
    #[must_use]
    pub fn is_null(&self, key: &str) -> bool {
        self.0.get(key).is_none_or(JsonValue::is_null)
    }

    #[must_use]
    pub fn into_json(self) -> JsonValue {
        JsonValue::Object(self.0)
    }
}

impl From<JsonMap<String, JsonValue>> for EntityRow {
    fn from(map: JsonMap<String, JsonValue>) -> Self {
        Self(map)
    }
}

fn decode_column(row: &tokio_postgres::Row, idx: usize, ty: &Type) -> JsonValue {
    let decoded: Result<JsonValue, tokio_postgres::Error> = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx).map(json_from)
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)
            .map(|v| json_from(v.map(i64::from)))
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)
            .map(|v| json_from(v.map(i64::from)))
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx).map(json_from)
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)
            .map(|v| json_from(v.map(f64::from)))
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx).map(json_from)
    } else if *ty == Type::UUID {
        row.try_get::<_, Option<Uuid>>(idx)
            .map(|v| json_from(v.map(|u| u.to_string())))
    } else if *ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<DateTime<Utc>>>(idx)
            .map(|v| json_from(v.map(|t| t.to_rfc3339())))
    } else if *ty == Type::TIMESTAMP {
        row.try_get::<_, Option<NaiveDateTime>>(idx)
            .map(|v| json_from(v.map(|t| t.and_utc().to_rfc3339())))
    } else if *ty == Type::DATE {
        row.try_get::<_, Option<NaiveDate>>(idx)
            .map(|v| json_from(v.map(|d| d.format("%Y-%m-%d").to_string())))
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        row.try_get::<_, Option<JsonValue>>(idx)
            .map(|v| v.unwrap_or(JsonValue::Null))
    } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR || *ty == Type::NAME
    {
        row.try_get::<_, Option<String>>(idx).map(json_from)
    } else {
        tracing::debug!(column_type = %ty, "unsupported column type decoded as null");
        Ok(JsonValue::Null)
    };

    decoded.unwrap_or_else(|err| {
        tracing::debug!(error = %err, "column decode failed; substituting null");
        JsonValue::Null
    })
}

fn json_from<T: Into<JsonScalar>>(value: Option<T>) -> JsonValue {
    value.map_or(JsonValue::Null, |v| v.into().0)
}

/// Internal adapter so `json_from` covers every scalar we decode.
struct JsonScalar(JsonValue);

impl From<bool> for JsonScalar {
    fn from(v: bool) -> Self {
        Self(JsonValue::Bool(v))
    }
}

impl From<i64> for JsonScalar {
    fn from(v: i64) -> Self {
        Self(JsonValue::Number(v.into()))
    }
}

impl From<f64> for JsonScalar {
    fn from(v: f64) -> Self {
        Self(Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number))
    }
}

impl From<String> for JsonScalar {
    fn from(v: String) -> Self {
        Self(JsonValue::String(v))
    }
}
