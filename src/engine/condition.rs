// ==========================================
// Condition interpreter - boolean/threshold trees over facts
// ==========================================
// Short-circuit semantics: `all` stops at the first false child,
// `any` stops at the first true child. Unknown fact names and
// type-mismatched comparisons evaluate to false (with an explanation)
// instead of aborting: one malformed condition must never take down
// the evaluation of a whole class.
// ==========================================

use crate::domain::facts::{FactValue, StudentPromotionFacts};
use crate::domain::rule::{ConditionNode, ConditionOperator};

/// Outcome of evaluating a condition tree for one student
#[derive(Debug, Clone)]
pub struct ConditionOutcome {
    pub matched: bool,
    /// Human-readable explanations of the failing conditions; empty
    /// when matched
    pub failed_conditions: Vec<String>,
}

impl ConditionOutcome {
    fn matched() -> Self {
        Self {
            matched: true,
            failed_conditions: Vec::new(),
        }
    }

    fn failed(reasons: Vec<String>) -> Self {
        Self {
            matched: false,
            failed_conditions: reasons,
        }
    }
}

/// Evaluate a condition tree against one facts snapshot
pub fn evaluate(node: &ConditionNode, facts: &StudentPromotionFacts) -> ConditionOutcome {
    match node {
        ConditionNode::All { all } => {
            for child in all {
                let outcome = evaluate(child, facts);
                if !outcome.matched {
                    // short-circuit at the first failing conjunct
                    return outcome;
                }
            }
            ConditionOutcome::matched()
        }
        ConditionNode::Any { any } => {
            let mut reasons = Vec::new();
            for child in any {
                let outcome = evaluate(child, facts);
                if outcome.matched {
                    return ConditionOutcome::matched();
                }
                reasons.extend(outcome.failed_conditions);
            }
            ConditionOutcome::failed(vec![format!(
                "no alternative matched: [{}]",
                reasons.join("; ")
            )])
        }
        ConditionNode::Leaf {
            fact,
            operator,
            value,
        } => evaluate_leaf(fact, *operator, value, facts),
    }
}

fn evaluate_leaf(
    fact_name: &str,
    operator: ConditionOperator,
    expected: &serde_json::Value,
    facts: &StudentPromotionFacts,
) -> ConditionOutcome {
    let Some(actual) = facts.fact(fact_name) else {
        return ConditionOutcome::failed(vec![format!("unknown fact '{}'", fact_name)]);
    };

    match compare(&actual, operator, expected) {
        Some(true) => ConditionOutcome::matched(),
        Some(false) => ConditionOutcome::failed(vec![format!(
            "{} {} {} (actual: {})",
            fact_name,
            operator,
            expected,
            describe(&actual)
        )]),
        None => ConditionOutcome::failed(vec![format!(
            "{} {} {}: type mismatch (actual: {})",
            fact_name,
            operator,
            expected,
            describe(&actual)
        )]),
    }
}

/// Compare a fact value to the expected JSON value
///
/// None means the comparison is not defined for these types; the
/// caller reports it as a failed condition.
fn compare(
    actual: &FactValue,
    operator: ConditionOperator,
    expected: &serde_json::Value,
) -> Option<bool> {
    use ConditionOperator::*;

    match operator {
        In | NotIn => {
            let candidates = expected.as_array()?;
            let contained = candidates.iter().any(|c| loose_eq(actual, c));
            Some(if operator == In { contained } else { !contained })
        }
        Equal | NotEqual => {
            // equality is defined whenever both sides have the same shape
            let eq = match (actual, expected) {
                (FactValue::Number(a), v) if v.is_number() => Some(*a == v.as_f64()?),
                (FactValue::Bool(a), serde_json::Value::Bool(b)) => Some(a == b),
                (FactValue::Text(a), serde_json::Value::String(b)) => Some(a == b),
                _ => None,
            }?;
            Some(if operator == Equal { eq } else { !eq })
        }
        LessThan | LessThanInclusive | GreaterThan | GreaterThanInclusive => {
            // ordering only applies to numbers
            let FactValue::Number(a) = actual else {
                return None;
            };
            let b = expected.as_f64()?;
            Some(match operator {
                LessThan => *a < b,
                LessThanInclusive => *a <= b,
                GreaterThan => *a > b,
                GreaterThanInclusive => *a >= b,
                _ => unreachable!(),
            })
        }
    }
}

fn loose_eq(actual: &FactValue, candidate: &serde_json::Value) -> bool {
    match (actual, candidate) {
        (FactValue::Number(a), v) if v.is_number() => v.as_f64().map(|b| *a == b).unwrap_or(false),
        (FactValue::Bool(a), serde_json::Value::Bool(b)) => a == b,
        (FactValue::Text(a), serde_json::Value::String(b)) => a == b,
        _ => false,
    }
}

fn describe(value: &FactValue) -> String {
    match value {
        FactValue::Number(n) => format!("{}", n),
        FactValue::Bool(b) => format!("{}", b),
        FactValue::Text(s) => format!("\"{}\"", s),
    }
}
