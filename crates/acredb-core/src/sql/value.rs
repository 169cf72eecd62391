use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use std::error::Error as StdError;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use uuid::Uuid;

type BoxError = Box<dyn StdError + Sync + Send>;

///
/// SqlValue
///
/// A bound query parameter. Every caller-supplied value becomes one of
/// these; none of them ever appears in query text.
///
/// Text values are coerced to the column's wire type at encode time
/// (uuid, timestamptz, date, integers, booleans), because payloads arrive
/// as JSON where ids and timestamps are strings.
///

#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Json(JsonValue),
    UuidArray(Vec<Uuid>),
}

impl SqlValue {
    /// Map a JSON payload value to a bound parameter.
    ///
    /// Arrays and objects bind as jsonb; numbers prefer the integer
    /// representation when exact.
    #[must_use]
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => n
                .as_i64()
                .map_or_else(|| n.as_f64().map_or(Self::Null, Self::Float), Self::Int),
            JsonValue::String(s) => Self::Text(s.clone()),
            other => Self::Json(other.clone()),
        }
    }
}

fn invalid(kind: &str, err: impl std::fmt::Display) -> BoxError {
    format!("invalid {kind} parameter: {err}").into()
}

fn encode_text(raw: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::UUID {
        Uuid::parse_str(raw)
            .map_err(|err| invalid("uuid", err))?
            .to_sql(ty, out)
    } else if *ty == Type::TIMESTAMPTZ {
        DateTime::parse_from_rfc3339(raw)
            .map_err(|err| invalid("timestamp", err))?
            .with_timezone(&Utc)
            .to_sql(ty, out)
    } else if *ty == Type::TIMESTAMP {
        DateTime::parse_from_rfc3339(raw)
            .map_err(|err| invalid("timestamp", err))?
            .naive_utc()
            .to_sql(ty, out)
    } else if *ty == Type::DATE {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|err| invalid("date", err))?
            .to_sql(ty, out)
    } else if *ty == Type::INT2 {
        raw.parse::<i16>()
            .map_err(|err| invalid("int", err))?
            .to_sql(ty, out)
    } else if *ty == Type::INT4 {
        raw.parse::<i32>()
            .map_err(|err| invalid("int", err))?
            .to_sql(ty, out)
    } else if *ty == Type::INT8 {
        raw.parse::<i64>()
            .map_err(|err| invalid("int", err))?
            .to_sql(ty, out)
    } else if *ty == Type::FLOAT4 {
        raw.parse::<f32>()
            .map_err(|err| invalid("float", err))?
            .to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        raw.parse::<f64>()
            .map_err(|err| invalid("float", err))?
            .to_sql(ty, out)
    } else if *ty == Type::BOOL {
        match raw {
            "true" | "t" | "1" => true.to_sql(ty, out),
            "false" | "f" | "0" => false.to_sql(ty, out),
            other => Err(invalid("bool", other)),
        }
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        JsonValue::String(raw.to_owned()).to_sql(ty, out)
    } else {
        raw.to_sql(ty, out)
    }
}

fn encode_int(value: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::INT2 {
        i16::try_from(value)
            .map_err(|err| invalid("int", err))?
            .to_sql(ty, out)
    } else if *ty == Type::INT4 {
        i32::try_from(value)
            .map_err(|err| invalid("int", err))?
            .to_sql(ty, out)
    } else if *ty == Type::FLOAT4 || *ty == Type::FLOAT8 {
        #[allow(clippy::cast_precision_loss)]
        (value as f64).to_sql(ty, out)
    } else {
        value.to_sql(ty, out)
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Self::Null => Ok(IsNull::Yes),
            Self::Bool(v) => v.to_sql(ty, out),
            Self::Int(v) => encode_int(*v, ty, out),
            Self::Float(v) => {
                if *ty == Type::FLOAT4 {
                    #[allow(clippy::cast_possible_truncation)]
                    (*v as f32).to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Self::Text(v) => encode_text(v, ty, out),
            Self::Uuid(v) => v.to_sql(ty, out),
            Self::Timestamp(v) => {
                if *ty == Type::TIMESTAMP {
                    v.naive_utc().to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Self::Json(v) => v.to_sql(ty, out),
            Self::UuidArray(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Acceptance is decided per-variant inside to_sql; the statement's
        // inferred parameter types drive the encoding.
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::SqlValue;
    use serde_json::json;

    #[test]
    fn json_scalars_map_to_bound_variants() {
        assert_eq!(SqlValue::from_json(&json!(null)), SqlValue::Null);
        assert_eq!(SqlValue::from_json(&json!(true)), SqlValue::Bool(true));
        assert_eq!(SqlValue::from_json(&json!(7)), SqlValue::Int(7));
        assert_eq!(SqlValue::from_json(&json!(1.5)), SqlValue::Float(1.5));
        assert_eq!(
            SqlValue::from_json(&json!("qualified")),
            SqlValue::Text("qualified".to_owned())
        );
    }

    #[test]
    fn json_composites_bind_as_json() {
        let value = SqlValue::from_json(&json!({ "source": "referral" }));
        assert!(matches!(value, SqlValue::Json(_)));

        let value = SqlValue::from_json(&json!(["a", "b"]));
        assert!(matches!(value, SqlValue::Json(_)));
    }
}
