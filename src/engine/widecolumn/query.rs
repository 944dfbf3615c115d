//! Filter evaluation for wide-column entities
//!
//! Literals arrive as strings and are coerced to the stored property's EDM
//! type before comparing. A missing property or a literal that does not
//! coerce never matches.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

use super::entity::{EdmValue, Entity};
use crate::engine::filter::{Combinator, Condition, FilterExpression};

/// Filter plus projection applied to a table scan
#[derive(Debug, Clone, Default)]
pub struct EntityQuery {
    pub select: Vec<String>,
    pub filter: FilterExpression,
}

impl EntityQuery {
    pub fn new(select: Vec<String>, filter: FilterExpression) -> Self {
        Self { select, filter }
    }

    /// Execute over a list of entities, keeping their order
    pub fn execute(&self, entities: Vec<Entity>) -> Vec<Entity> {
        entities
            .into_iter()
            .filter(|e| matches(&self.filter, e))
            .map(|e| e.project(&self.select))
            .collect()
    }
}

/// Check an entity against a filter expression
pub fn matches(filter: &FilterExpression, entity: &Entity) -> bool {
    let Some(ref primary) = filter.primary else {
        return true;
    };

    let first = condition_holds(primary, entity);
    match filter.attached_secondary() {
        Some((Combinator::And, second)) => first && condition_holds(second, entity),
        Some((Combinator::Or, second)) => first || condition_holds(second, entity),
        None => first,
    }
}

fn condition_holds(condition: &Condition, entity: &Entity) -> bool {
    entity
        .field(&condition.attribute)
        .and_then(|stored| compare(&stored, &condition.value))
        .map(|ordering| condition.operator.holds(ordering))
        .unwrap_or(false)
}

/// Order a stored value against a literal coerced to the same type
fn compare(stored: &EdmValue, literal: &str) -> Option<Ordering> {
    let trimmed = literal.trim();
    match stored {
        EdmValue::String(s) => Some(s.as_str().cmp(literal)),
        EdmValue::Int32(n) => {
            let l: i64 = trimmed.parse().ok()?;
            Some(i64::from(*n).cmp(&l))
        }
        EdmValue::Int64(n) => {
            let l: i64 = trimmed.parse().ok()?;
            Some(n.cmp(&l))
        }
        EdmValue::Double(d) => {
            let l: f64 = trimmed.parse().ok()?;
            d.partial_cmp(&l)
        }
        EdmValue::Boolean(b) => {
            let l: bool = trimmed.parse().ok()?;
            Some(b.cmp(&l))
        }
        EdmValue::DateTime(dt) => {
            let l = DateTime::parse_from_rfc3339(trimmed).ok()?;
            Some(dt.cmp(&l.with_timezone(&Utc)))
        }
        EdmValue::Binary(bytes) => Some(bytes.as_slice().cmp(literal.as_bytes())),
        EdmValue::Guid(g) => {
            let l = Uuid::parse_str(trimmed).ok()?;
            Some(g.cmp(&l))
        }
    }
}
