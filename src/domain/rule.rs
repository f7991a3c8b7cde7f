// ==========================================
// Academic Records Platform - promotion rules
// ==========================================
// Declarative condition trees evaluated generically against the
// facts snapshot. The JSON shape is a contract: {all:[...]},
// {any:[...]} and leaves {fact, operator, value}.
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Condition operators
// ==========================================

/// Comparison operator of a leaf condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanInclusive,
    GreaterThan,
    GreaterThanInclusive,
    In,
    NotIn,
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConditionOperator::Equal => "equal",
            ConditionOperator::NotEqual => "notEqual",
            ConditionOperator::LessThan => "lessThan",
            ConditionOperator::LessThanInclusive => "lessThanInclusive",
            ConditionOperator::GreaterThan => "greaterThan",
            ConditionOperator::GreaterThanInclusive => "greaterThanInclusive",
            ConditionOperator::In => "in",
            ConditionOperator::NotIn => "notIn",
        };
        write!(f, "{}", s)
    }
}

// ==========================================
// Condition tree
// ==========================================

/// Node of the boolean condition tree
///
/// Untagged on purpose so the persisted JSON matches the contract
/// shape exactly: `{"all": [...]}`, `{"any": [...]}` or
/// `{"fact": ..., "operator": ..., "value": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    All {
        all: Vec<ConditionNode>,
    },
    Any {
        any: Vec<ConditionNode>,
    },
    Leaf {
        fact: String,
        operator: ConditionOperator,
        value: serde_json::Value,
    },
}

impl ConditionNode {
    /// Number of leaf conditions in the tree
    pub fn leaf_count(&self) -> usize {
        match self {
            ConditionNode::All { all } => all.iter().map(|c| c.leaf_count()).sum(),
            ConditionNode::Any { any } => any.iter().map(|c| c.leaf_count()).sum(),
            ConditionNode::Leaf { .. } => 1,
        }
    }
}

/// Event payload attached to a ruleset; carried through to callers
/// so the platform can route notifications/side effects
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// Condition tree plus event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    pub conditions: ConditionNode,
    pub event: RuleEvent,
}

// ==========================================
// Promotion rule entity
// ==========================================

/// Stored promotion rule with optional scoping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRule {
    pub rule_id: String,
    pub name: String,
    pub description: Option<String>,
    pub source_class_id: Option<String>,
    pub program_id: Option<String>,
    pub cycle_level_id: Option<String>,
    pub ruleset: RuleSet,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for rule creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPromotionRule {
    pub name: String,
    pub description: Option<String>,
    pub source_class_id: Option<String>,
    pub program_id: Option<String>,
    pub cycle_level_id: Option<String>,
    pub ruleset: RuleSet,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Partial update for an existing rule (None = leave unchanged)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRuleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub source_class_id: Option<String>,
    pub program_id: Option<String>,
    pub cycle_level_id: Option<String>,
    pub ruleset: Option<RuleSet>,
    pub is_active: Option<bool>,
}

/// Validate a ruleset at create/update time
///
/// An empty condition list anywhere in the tree makes the rule
/// unsatisfiable or vacuous, so it is rejected here rather than at
/// evaluation time.
pub fn validate_ruleset(ruleset: &RuleSet) -> Result<(), String> {
    validate_node(&ruleset.conditions)?;
    if ruleset.event.event_type.trim().is_empty() {
        return Err("ruleset event type must not be empty".to_string());
    }
    Ok(())
}

fn validate_node(node: &ConditionNode) -> Result<(), String> {
    match node {
        ConditionNode::All { all } => {
            if all.is_empty() {
                return Err("'all' condition group must not be empty".to_string());
            }
            for child in all {
                validate_node(child)?;
            }
            Ok(())
        }
        ConditionNode::Any { any } => {
            if any.is_empty() {
                return Err("'any' condition group must not be empty".to_string());
            }
            for child in any {
                validate_node(child)?;
            }
            Ok(())
        }
        ConditionNode::Leaf { fact, .. } => {
            if fact.trim().is_empty() {
                return Err("leaf condition fact name must not be empty".to_string());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_tree_json_shape_round_trips() {
        let raw = json!({
            "all": [
                {"fact": "overallAverage", "operator": "greaterThanInclusive", "value": 10},
                {"any": [
                    {"fact": "creditsEarned", "operator": "greaterThanInclusive", "value": 45},
                    {"fact": "canReachRequiredCredits", "operator": "equal", "value": true}
                ]}
            ]
        });

        let node: ConditionNode = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(node.leaf_count(), 3);

        let back = serde_json::to_value(&node).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_empty_condition_group_rejected() {
        let ruleset = RuleSet {
            conditions: ConditionNode::All { all: vec![] },
            event: RuleEvent {
                event_type: "promote".to_string(),
                params: None,
            },
        };
        assert!(validate_ruleset(&ruleset).is_err());
    }

    #[test]
    fn test_nested_empty_group_rejected() {
        let ruleset = RuleSet {
            conditions: ConditionNode::All {
                all: vec![ConditionNode::Any { any: vec![] }],
            },
            event: RuleEvent {
                event_type: "promote".to_string(),
                params: None,
            },
        };
        assert!(validate_ruleset(&ruleset).is_err());
    }
}
