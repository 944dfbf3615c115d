//! Ad-hoc filter DSL
//!
//! List endpoints accept up to two conditions in flat query parameters:
//!
//! ```text
//! ?first_attr=Age&first_con=gt&first_val=30&second_attr=Name&second_con=eq&second_val=Bob&join=or
//! ```
//!
//! Partial input degrades silently: an incomplete triple is dropped and an
//! unrecognised `join` leaves the second condition unattached.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::condition::{operator_for, ComparisonOp};

pub const SELECT_PARAM: &str = "$select";

/// A single resolved `(attribute, operator, value)` triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub attribute: String,
    pub operator: ComparisonOp,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn to_sql(&self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterExpression {
    pub primary: Option<Condition>,
    pub secondary: Option<Condition>,
    pub combinator: Option<Combinator>,
}

impl FilterExpression {
    /// No condition resolved: every row matches
    pub fn is_empty(&self) -> bool {
        self.primary.is_none()
    }

    /// The second condition as backends apply it.
    ///
    /// Only attached when the primary resolved and `join` was `and`/`or`;
    /// anything else is a no-op on the secondary side.
    pub fn attached_secondary(&self) -> Option<(Combinator, &Condition)> {
        self.primary.as_ref()?;
        match (self.combinator, self.secondary.as_ref()) {
            (Some(combinator), Some(condition)) => Some((combinator, condition)),
            _ => None,
        }
    }
}

/// Build a filter expression from URL query parameters. Never fails.
pub fn translate_ad_hoc_filter(params: &HashMap<String, String>) -> FilterExpression {
    let combinator = match params.get("join").map(String::as_str) {
        Some("and") => Some(Combinator::And),
        Some("or") => Some(Combinator::Or),
        _ => None,
    };

    FilterExpression {
        primary: condition_slot(params, "first"),
        secondary: condition_slot(params, "second"),
        combinator,
    }
}

fn condition_slot(params: &HashMap<String, String>, slot: &str) -> Option<Condition> {
    let attribute = params.get(&format!("{}_attr", slot))?;
    let code = params.get(&format!("{}_con", slot))?;
    let value = params.get(&format!("{}_val", slot))?;

    Some(Condition {
        attribute: attribute.clone(),
        operator: operator_for(code),
        value: value.clone(),
    })
}

/// Comma separated `$select` projection; empty when absent
pub fn parse_select(params: &HashMap<String, String>) -> Vec<String> {
    params
        .get(SELECT_PARAM)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
