//! Rows and schema validation.
//!
//! A row is a JSON object mapping column names to scalar values. The store
//! itself enforces no schema; [`Schema`] is the explicit, optional contract
//! a caller can validate rows against before handing them to a table.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A row: column name → scalar JSON value.
pub type Row = serde_json::Map<String, Value>;

/// The scalar type a column accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// UTF-8 string.
    Text,
    /// Signed integer.
    Integer,
    /// Floating-point number.
    Float,
    /// Boolean.
    Bool,
}

impl ColumnKind {
    /// Returns the kind name used in diagnostics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Text => "text",
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Bool => "bool",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            ColumnKind::Text => value.is_string(),
            ColumnKind::Integer => value.is_i64() || value.is_u64(),
            ColumnKind::Float => value.is_f64(),
            ColumnKind::Bool => value.is_boolean(),
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Accepted scalar type.
    pub kind: ColumnKind,
}

/// An ordered list of typed columns.
///
/// Validation is a pure function over a candidate row; nothing is enforced
/// at storage time.
///
/// # Example
///
/// ```rust,ignore
/// let schema = Schema::new([("id", ColumnKind::Integer), ("name", ColumnKind::Text)]);
/// schema.validate(&row)?;
/// table.insert(&row)?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Builds a schema from `(name, kind)` pairs in declaration order.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = (S, ColumnKind)>) -> Self {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, kind)| Column {
                    name: name.into(),
                    kind,
                })
                .collect(),
        }
    }

    /// Returns the declared columns.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Checks that `row` carries exactly the declared columns with matching
    /// scalar types.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SchemaViolation`] for a missing column, a type
    /// mismatch, or an undeclared column.
    pub fn validate(&self, row: &Row) -> StoreResult<()> {
        for column in &self.columns {
            let value = row.get(&column.name).ok_or_else(|| {
                StoreError::schema_violation(format!("missing column '{}'", column.name))
            })?;
            if !column.kind.matches(value) {
                return Err(StoreError::schema_violation(format!(
                    "column '{}' expects {}, got {}",
                    column.name,
                    column.kind.as_str(),
                    json_type_name(value)
                )));
            }
        }
        for name in row.keys() {
            if !self.columns.iter().any(|c| &c.name == name) {
                return Err(StoreError::schema_violation(format!(
                    "undeclared column '{name}'"
                )));
            }
        }
        Ok(())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person_schema() -> Schema {
        Schema::new([
            ("name", ColumnKind::Text),
            ("age", ColumnKind::Integer),
            ("active", ColumnKind::Bool),
        ])
    }

    fn row(value: serde_json::Value) -> Row {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn accepts_conforming_row() {
        let schema = person_schema();
        let candidate = row(json!({"name": "Ada", "age": 36, "active": true}));
        assert!(schema.validate(&candidate).is_ok());
    }

    #[test]
    fn rejects_wrong_type() {
        let schema = person_schema();
        let candidate = row(json!({"name": "Ada", "age": "36", "active": true}));
        let err = schema.validate(&candidate).unwrap_err();
        assert!(matches!(err, StoreError::SchemaViolation { .. }));
        assert!(err.to_string().contains("age"));
    }

    #[test]
    fn rejects_missing_column() {
        let schema = person_schema();
        let candidate = row(json!({"name": "Ada", "age": 36}));
        assert!(schema.validate(&candidate).is_err());
    }

    #[test]
    fn rejects_undeclared_column() {
        let schema = person_schema();
        let candidate = row(json!({
            "name": "Ada", "age": 36, "active": true, "extra": 1
        }));
        let err = schema.validate(&candidate).unwrap_err();
        assert!(err.to_string().contains("extra"));
    }

    #[test]
    fn float_and_integer_are_distinct() {
        let schema = Schema::new([("score", ColumnKind::Float)]);
        assert!(schema.validate(&row(json!({"score": 1.5}))).is_ok());
        assert!(schema.validate(&row(json!({"score": 1}))).is_err());
    }
}
