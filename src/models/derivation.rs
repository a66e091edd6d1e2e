//! Derivation trace models.
//!
//! Every decision the matcher and the metrics calculator make is recorded
//! as a [`DerivationStep`], so a daily record can always be explained.

use serde::{Deserialize, Serialize};

/// A single step in the derivation trace recording one decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
///
/// # Example
///
/// ```
/// use attendance_engine::models::DerivationStep;
///
/// let step = DerivationStep {
///     step_number: 1,
///     rule_id: "shift_window_match".to_string(),
///     rule_name: "Shift Window Match".to_string(),
///     input: serde_json::json!({"in_time": "09:05"}),
///     output: serde_json::json!({"shift_id": "GEN"}),
///     reasoning: "In-time 09:05 falls inside GEN window 09:00-09:15".to_string(),
/// };
/// assert_eq!(step.rule_id, "shift_window_match");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// The derivation trace of one employee-day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationTrace {
    /// The sequence of derivation steps.
    pub steps: Vec<DerivationStep>,
}

impl DerivationTrace {
    /// The step number the next pushed step should carry.
    pub fn next_step_number(&self) -> u32 {
        self.steps.len() as u32 + 1
    }

    /// Appends a step.
    pub fn push(&mut self, step: DerivationStep) {
        self.steps.push(step);
    }
}
