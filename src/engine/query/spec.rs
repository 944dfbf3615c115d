//! Query specification handed to the relational backend

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Natural,
    Cross,
}

impl JoinKind {
    pub fn to_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Natural => "NATURAL JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    /// Always `None` for natural and cross joins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// A LIMIT/OFFSET operand as given in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bound {
    Integer(i64),
    /// Integers above `i64::MAX`
    Unsigned(u64),
    Text(String),
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Integer(n) => write!(f, "{}", n),
            Bound::Unsigned(n) => write!(f, "{}", n),
            Bound::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinct_expr: Option<String>,
    pub select_expr: String,
    pub from: String,
    #[serde(default)]
    pub joins: Vec<JoinClause>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
    #[serde(default)]
    pub and_where: Vec<String>,
    #[serde(default)]
    pub or_where: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub having: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub union: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Bound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<Bound>,
}

pub const SELECT_ALL: &str = "*";

impl QuerySpec {
    /// `SELECT * FROM <from>` with nothing else set
    pub fn from_table(table: &str) -> Self {
        Self {
            distinct_expr: None,
            select_expr: SELECT_ALL.to_string(),
            from: table.to_string(),
            joins: Vec::new(),
            where_clause: None,
            and_where: Vec::new(),
            or_where: Vec::new(),
            group: None,
            having: None,
            union: None,
            order_by: None,
            limit: None,
            offset: None,
        }
    }

    /// Fold `where`, `and_where` and `or_where` into one predicate
    pub fn predicate(&self) -> Option<String> {
        let mut acc = self.where_clause.clone();

        let appended = self
            .and_where
            .iter()
            .map(|c| ("AND", c))
            .chain(self.or_where.iter().map(|c| ("OR", c)));

        for (op, clause) in appended {
            acc = Some(match acc {
                Some(prev) => format!("({}) {} ({})", prev, op, clause),
                None => clause.clone(),
            });
        }

        acc
    }

    /// Render SQLite-compatible SQL
    pub fn to_sql(&self) -> String {
        let mut sql = match self.distinct_expr {
            Some(ref distinct) => format!("SELECT DISTINCT {}", distinct),
            None => format!("SELECT {}", self.select_expr),
        };
        sql.push_str(&format!(" FROM {}", self.from));

        for join in &self.joins {
            sql.push_str(&format!(" {} {}", join.kind.to_sql(), join.table));
            if let Some(ref condition) = join.condition {
                sql.push_str(&format!(" ON {}", condition));
            }
        }

        if let Some(predicate) = self.predicate() {
            sql.push_str(&format!(" WHERE {}", predicate));
        }
        if let Some(ref group) = self.group {
            sql.push_str(&format!(" GROUP BY {}", group));
        }
        if let Some(ref having) = self.having {
            sql.push_str(&format!(" HAVING {}", having));
        }
        if let Some(ref union) = self.union {
            sql.push_str(&format!(" UNION {}", union));
        }
        if let Some(ref order) = self.order_by {
            sql.push_str(&format!(" ORDER BY {}", order));
        }
        if let Some(ref limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
            if let Some(ref offset) = self.offset {
                sql.push_str(&format!(" OFFSET {}", offset));
            }
        }

        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_sql() {
        assert_eq!(QuerySpec::from_table("users").to_sql(), "SELECT * FROM users");
    }

    #[test]
    fn test_full_clause_order() {
        let mut spec = QuerySpec::from_table("users u");
        spec.select_expr = "u.id, count(o.id)".to_string();
        spec.joins.push(JoinClause {
            kind: JoinKind::Left,
            table: "orders o".to_string(),
            condition: Some("o.user_id = u.id".to_string()),
        });
        spec.joins.push(JoinClause {
            kind: JoinKind::Natural,
            table: "profiles".to_string(),
            condition: None,
        });
        spec.where_clause = Some("u.active = 1".to_string());
        spec.group = Some("u.id".to_string());
        spec.having = Some("count(o.id) > 2".to_string());
        spec.order_by = Some("u.id DESC".to_string());
        spec.limit = Some(Bound::Integer(10));
        spec.offset = Some(Bound::Text("20".to_string()));

        assert_eq!(
            spec.to_sql(),
            "SELECT u.id, count(o.id) FROM users u LEFT JOIN orders o ON o.user_id = u.id \
             NATURAL JOIN profiles WHERE u.active = 1 GROUP BY u.id HAVING count(o.id) > 2 \
             ORDER BY u.id DESC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_distinct_wins_over_select() {
        let mut spec = QuerySpec::from_table("t");
        spec.distinct_expr = Some("a".to_string());
        assert_eq!(spec.to_sql(), "SELECT DISTINCT a FROM t");
    }

    #[test]
    fn test_predicate_folding() {
        let mut spec = QuerySpec::from_table("t");
        assert_eq!(spec.predicate(), None);

        spec.and_where.push("b = 2".to_string());
        assert_eq!(spec.predicate().as_deref(), Some("b = 2"));

        spec.where_clause = Some("a = 1".to_string());
        spec.or_where.push("c = 3".to_string());
        assert_eq!(
            spec.predicate().as_deref(),
            Some("((a = 1) AND (b = 2)) OR (c = 3)")
        );
    }

    #[test]
    fn test_offset_ignored_without_limit() {
        let mut spec = QuerySpec::from_table("t");
        spec.offset = Some(Bound::Integer(5));
        assert_eq!(spec.to_sql(), "SELECT * FROM t");
    }
}
