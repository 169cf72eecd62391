use crate::sql::SqlValue;
use chrono::{DateTime, NaiveDate, Utc};

///
/// FilterOp
///
/// Comparison operators available to named filters. The operator is part
/// of the descriptor, never caller input.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

///
/// FilterValueType
///
/// Declared coercion type for a named filter's raw string value.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterValueType {
    Text,
    Number,
    Date,
}

///
/// FilterSpec
///
/// One named custom filter: a target column, a comparison operator, and
/// the value type used for safe coercion of the raw query-string value.
///

#[derive(Clone, Debug)]
pub struct FilterSpec {
    pub name: String,
    pub column: String,
    pub op: FilterOp,
    pub value_type: FilterValueType,
}

impl FilterSpec {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        column: impl Into<String>,
        op: FilterOp,
        value_type: FilterValueType,
    ) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            op,
            value_type,
        }
    }

    /// Coerce the raw value per the declared type. `None` means the value
    /// does not parse; the list operation skips the filter silently.
    #[must_use]
    pub fn coerce(&self, raw: &str) -> Option<SqlValue> {
        if raw.is_empty() {
            return None;
        }

        match self.value_type {
            FilterValueType::Text => Some(SqlValue::Text(raw.to_owned())),
            FilterValueType::Number => {
                if let Ok(int) = raw.parse::<i64>() {
                    Some(SqlValue::Int(int))
                } else {
                    raw.parse::<f64>().ok().map(SqlValue::Float)
                }
            }
            FilterValueType::Date => {
                if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
                    Some(SqlValue::Timestamp(ts.with_timezone(&Utc)))
                } else {
                    // A plain date widens to midnight UTC so the bound value
                    // encodes against timestamp columns too.
                    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                        .ok()
                        .and_then(|date| date.and_hms_opt(0, 0, 0))
                        .map(|dt| SqlValue::Timestamp(dt.and_utc()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterOp, FilterSpec, FilterValueType};
    use crate::sql::SqlValue;

    #[test]
    fn number_coercion_prefers_integers() {
        let spec = FilterSpec::new("minPrice", "l.list_price", FilterOp::Gte, FilterValueType::Number);

        assert_eq!(spec.coerce("250000"), Some(SqlValue::Int(250_000)));
        assert_eq!(spec.coerce("2.5"), Some(SqlValue::Float(2.5)));
        assert_eq!(spec.coerce("not-a-number"), None);
        assert_eq!(spec.coerce(""), None);
    }

    #[test]
    fn date_coercion_accepts_both_forms() {
        let spec = FilterSpec::new("startDate", "a.scheduled_at", FilterOp::Gte, FilterValueType::Date);

        assert!(matches!(
            spec.coerce("2026-08-01T00:00:00Z"),
            Some(SqlValue::Timestamp(_))
        ));
        match spec.coerce("2026-08-01") {
            Some(SqlValue::Timestamp(ts)) => {
                assert_eq!(ts.to_rfc3339(), "2026-08-01T00:00:00+00:00");
            }
            other => panic!("expected a timestamp, got {other:?}"),
        }
        assert_eq!(spec.coerce("yesterday"), None);
    }

    #[test]
    fn plain_date_values_encode_against_timestamp_columns() {
        use bytes::BytesMut;
        use tokio_postgres::types::{ToSql, Type};

        let spec = FilterSpec::new("endDate", "a.scheduled_at", FilterOp::Lte, FilterValueType::Date);
        let value = spec.coerce("2026-08-01").expect("date should coerce");

        let mut out = BytesMut::new();
        value
            .to_sql(&Type::TIMESTAMPTZ, &mut out)
            .expect("value should encode for a timestamptz column");
    }
}
