//! Progress inference configuration and reported progress data.
//!
//! External reconstruction tools emit unstructured text. A [`ProgressSpec`]
//! declares how to map output lines to a fractional completion estimate so
//! the panel can render a meaningful bar without understanding the tool.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One recognizable phase of a multi-phase tool's output.
///
/// The pattern is matched case-insensitively against each output line; the
/// label is what the panel shows once the phase has been entered.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct StepPattern {
    /// Regex (or plain substring) matched against each output line.
    pub pattern: String,

    /// Human-readable name of the phase, e.g. "Feature matching".
    pub label: String,
}

/// Declarative rule set mapping output lines to a completion fraction.
///
/// Three shapes cover the tools this engine drives:
/// - `steps`: tools that announce named phases (COLMAP, GLOMAP). The step
///   counter only moves forward; a phase announcing itself twice never
///   rewinds the bar.
/// - `iteration`: trainers that print the current iteration out of a total
///   known in advance (ns-train with a fixed max-iterations).
/// - `ratio`: tools that print `current/total` pairs on one line.
///
/// Matching is case-insensitive, first-match-wins per line. Malformed
/// captures never fail a run; the previous fraction simply stands.
///
/// # Example
///
/// ```yaml
/// progress:
///   type: steps
///   steps:
///     - pattern: "feature extraction"
///       label: "Extracting features"
///     - pattern: "feature matching"
///       label: "Matching features"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressSpec {
    /// Ordered list of phase patterns; fraction = reached phase / total.
    Steps { steps: Vec<StepPattern> },

    /// Single pattern whose one capture group is the current iteration.
    Iteration { pattern: String, total: u64 },

    /// Single pattern capturing numerator and denominator.
    Ratio { pattern: String },
}

/// A point-in-time progress estimate inferred from one output line.
///
/// `fraction` is always within [0, 1]. The raw step index or iteration
/// count is carried alongside so consumers (and tests) can inspect the
/// data the fraction was derived from, not just the rounded display value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct Progress {
    /// Completion estimate, clamped to [0, 1].
    pub fraction: f64,

    /// Short display label for the current phase or iteration.
    pub label: String,

    /// 1-based index of the reached step (steps variant only).
    pub step: Option<usize>,

    /// Current iteration (iteration and ratio variants).
    pub iteration: Option<u64>,
}
