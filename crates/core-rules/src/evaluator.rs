//! Single-rule evaluation
//!
//! The comparison set is closed, so evaluation is total: every operator has a
//! defined result for every finite pair of values.

use cadence_core_model::{TriggerOperator, TriggerRule};

/// Whether `current_value <operator> threshold` holds
pub fn is_triggered(current_value: f64, operator: TriggerOperator, threshold: f64) -> bool {
    match operator {
        TriggerOperator::Lt => current_value < threshold,
        TriggerOperator::Le => current_value <= threshold,
        TriggerOperator::Eq => current_value == threshold,
        TriggerOperator::Ge => current_value >= threshold,
        TriggerOperator::Gt => current_value > threshold,
    }
}

/// Evaluate a rule against a metric value
pub fn rule_fires(rule: &TriggerRule, current_value: f64) -> bool {
    is_triggered(current_value, rule.operator, rule.threshold)
}
