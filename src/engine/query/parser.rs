//! Structured query document parser
//!
//! Turns a JSON document such as
//!
//! ```json
//! {
//!     "Select": "a,b",
//!     "From": "t",
//!     "Join": {"TableName": "u", "Conditions": "u.id = t.uid"},
//!     "Limit": 5
//! }
//! ```
//!
//! into a [`QuerySpec`]. Each clause is validated on its own; the first
//! failing clause rejects the whole document.

use serde_json::{Map, Value};

use super::error::{Result, ValidationError};
use super::spec::{Bound, JoinClause, JoinKind, QuerySpec, SELECT_ALL};

const CONDITIONED_JOINS: [(&str, JoinKind); 3] = [
    ("Join", JoinKind::Inner),
    ("LeftJoin", JoinKind::Left),
    ("RightJoin", JoinKind::Right),
];

const PLAIN_JOINS: [(&str, JoinKind); 2] = [
    ("NaturalJoin", JoinKind::Natural),
    ("CrossJoin", JoinKind::Cross),
];

/// Translate a structured query document
pub fn translate_structured_query(document: &Value) -> Result<QuerySpec> {
    let doc = document.as_object().ok_or(ValidationError::NotAnObject)?;

    let from = optional_string(doc, "From")?.ok_or(ValidationError::MissingFrom)?;

    let distinct_expr = optional_string(doc, "Distinct")?;
    let select_expr = match distinct_expr {
        Some(_) => SELECT_ALL.to_string(),
        None => optional_string(doc, "Select")?.unwrap_or_else(|| SELECT_ALL.to_string()),
    };

    let mut joins = Vec::new();
    for (clause, kind) in CONDITIONED_JOINS {
        if let Some(value) = doc.get(clause) {
            joins.extend(conditioned_joins(clause, kind, value)?);
        }
    }
    for (clause, kind) in PLAIN_JOINS {
        if let Some(value) = doc.get(clause) {
            joins.extend(plain_joins(clause, kind, value)?);
        }
    }

    let where_clause = optional_string(doc, "Where")?;
    let and_where = string_or_list(doc, "AndWhere")?;
    let or_where = string_or_list(doc, "OrWhere")?;

    let group = optional_string(doc, "Group")?;
    let having = optional_string(doc, "Having")?;
    let union = optional_string(doc, "Union")?;
    let order_by = optional_string(doc, "Order")?;

    let (limit, offset) = paging(doc)?;

    Ok(QuerySpec {
        distinct_expr,
        select_expr,
        from,
        joins,
        where_clause,
        and_where,
        or_where,
        group,
        having,
        union,
        order_by,
        limit,
        offset,
    })
}

fn optional_string(doc: &Map<String, Value>, clause: &'static str) -> Result<Option<String>> {
    match doc.get(clause) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::InvalidClause {
            clause,
            expected: "a string",
        }),
    }
}

fn string_or_list(doc: &Map<String, Value>, clause: &'static str) -> Result<Vec<String>> {
    let invalid = ValidationError::InvalidClause {
        clause,
        expected: "a string or an array of strings",
    };

    match doc.get(clause) {
        None => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or(invalid.clone()))
            .collect(),
        Some(_) => Err(invalid),
    }
}

fn conditioned_joins(
    clause: &'static str,
    kind: JoinKind,
    value: &Value,
) -> Result<Vec<JoinClause>> {
    match value {
        Value::Object(_) => Ok(vec![conditioned_join(clause, kind, value)?]),
        Value::Array(entries) => entries
            .iter()
            .map(|entry| conditioned_join(clause, kind, entry))
            .collect(),
        _ => Err(ValidationError::InvalidClause {
            clause,
            expected: "a join object or an array of join objects",
        }),
    }
}

fn conditioned_join(
    clause: &'static str,
    kind: JoinKind,
    entry: &Value,
) -> Result<JoinClause> {
    let field = |name: &'static str| -> Result<String> {
        match entry.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(ValidationError::InvalidClause {
                clause,
                expected: "an object with string TableName and Conditions",
            }),
            None => Err(ValidationError::MissingJoinField { clause, field: name }),
        }
    };

    if !entry.is_object() {
        return Err(ValidationError::InvalidClause {
            clause,
            expected: "a join object or an array of join objects",
        });
    }

    Ok(JoinClause {
        kind,
        table: field("TableName")?,
        condition: Some(field("Conditions")?),
    })
}

fn plain_joins(
    clause: &'static str,
    kind: JoinKind,
    value: &Value,
) -> Result<Vec<JoinClause>> {
    let invalid = ValidationError::InvalidClause {
        clause,
        expected: "an array of table names",
    };

    let tables = value.as_array().ok_or(invalid.clone())?;
    tables
        .iter()
        .map(|table| {
            let table = table.as_str().ok_or(invalid.clone())?;
            Ok(JoinClause {
                kind,
                table: table.to_string(),
                condition: None,
            })
        })
        .collect()
}

fn bound(doc: &Map<String, Value>, clause: &'static str) -> Result<Option<Bound>> {
    match doc.get(clause) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(Bound::Text(s.clone()))),
        Some(Value::Number(n)) if n.is_i64() => Ok(n.as_i64().map(Bound::Integer)),
        Some(Value::Number(n)) if n.is_u64() => Ok(n.as_u64().map(Bound::Unsigned)),
        Some(_) => Err(ValidationError::InvalidClause {
            clause,
            expected: "a string or an integer",
        }),
    }
}

/// Both operands validate before either applies; an offset alone is dropped.
fn paging(doc: &Map<String, Value>) -> Result<(Option<Bound>, Option<Bound>)> {
    let limit = bound(doc, "Limit")?;
    let offset = bound(doc, "Offset")?;

    match limit {
        Some(limit) => Ok((Some(limit), offset)),
        None => Ok((None, None)),
    }
}
