//! Progress inference from unstructured tool output.
//!
//! A [`ProgressTracker`] compiles a declarative [`ProgressSpec`] into
//! case-insensitive regexes once per stage and then interprets output
//! lines one at a time. Inference is cosmetic by design: a line that
//! fails to parse never fails a stage, it just leaves the previous
//! estimate standing.

use regex::{Regex, RegexBuilder};
use rk_protocol::{Progress, ProgressSpec};
use thiserror::Error;

/// Errors surfaced when compiling a progress spec.
///
/// These are caught at catalog validation time; a spec that compiled
/// once never errors during a run.
#[derive(Debug, Error)]
pub enum ProgressSpecError {
    /// A pattern was not a valid regex.
    #[error("Invalid progress pattern '{pattern}': {source}")]
    BadPattern {
        pattern: String,
        source: regex::Error,
    },

    /// A steps spec declared no steps.
    #[error("Step-list progress spec has no steps")]
    NoSteps,

    /// An iteration spec declared a zero total.
    #[error("Iteration progress spec must declare a positive total")]
    ZeroTotal,
}

enum Compiled {
    Steps { steps: Vec<(Regex, String)> },
    Iteration { pattern: Regex, total: u64 },
    Ratio { pattern: Regex },
}

/// Interprets output lines against one compiled progress spec.
///
/// The step-list variant carries state: the reached step index is a
/// monotonic ratchet, so a phase pattern matching again later never moves
/// the bar backwards. The iteration and ratio variants are pure per call.
pub struct ProgressTracker {
    compiled: Compiled,
    reached_step: usize,
    fraction: f64,
}

impl ProgressTracker {
    /// Compile a spec into a tracker.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressSpecError`] for invalid regexes, an empty step
    /// list, or a zero iteration total.
    pub fn compile(spec: &ProgressSpec) -> Result<Self, ProgressSpecError> {
        let compiled = match spec {
            ProgressSpec::Steps { steps } => {
                if steps.is_empty() {
                    return Err(ProgressSpecError::NoSteps);
                }
                let steps = steps
                    .iter()
                    .map(|step| Ok((compile_pattern(&step.pattern)?, step.label.clone())))
                    .collect::<Result<Vec<_>, ProgressSpecError>>()?;
                Compiled::Steps { steps }
            }
            ProgressSpec::Iteration { pattern, total } => {
                if *total == 0 {
                    return Err(ProgressSpecError::ZeroTotal);
                }
                Compiled::Iteration {
                    pattern: compile_pattern(pattern)?,
                    total: *total,
                }
            }
            ProgressSpec::Ratio { pattern } => Compiled::Ratio {
                pattern: compile_pattern(pattern)?,
            },
        };

        Ok(Self {
            compiled,
            reached_step: 0,
            fraction: 0.0,
        })
    }

    /// The most recently reported fraction, 0.0 before any match.
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// The 1-based step index reached so far (steps variant only).
    pub fn reached_step(&self) -> usize {
        self.reached_step
    }

    /// Interpret one output line.
    ///
    /// Returns a new [`Progress`] when the line matched and produced a
    /// usable estimate, `None` otherwise. Malformed captures (non-numeric
    /// text, zero or negative denominators) return `None` and leave the
    /// prior fraction unchanged. First match wins per call.
    pub fn observe(&mut self, line: &str) -> Option<Progress> {
        match &self.compiled {
            Compiled::Steps { steps } => {
                let total = steps.len();
                let matched = steps.iter().position(|(regex, _)| regex.is_match(line))?;

                // Ratchet: a step index never regresses, even when an
                // earlier phase pattern matches again.
                let step = (matched + 1).max(self.reached_step);
                self.reached_step = step;
                self.fraction = (step as f64 / total as f64).clamp(0.0, 1.0);

                Some(Progress {
                    fraction: self.fraction,
                    label: steps[step - 1].1.clone(),
                    step: Some(step),
                    iteration: None,
                })
            }
            Compiled::Iteration { pattern, total } => {
                let captures = pattern.captures(line)?;
                let iteration: u64 = captures.get(1)?.as_str().parse().ok()?;
                self.fraction = (iteration as f64 / *total as f64).clamp(0.0, 1.0);

                Some(Progress {
                    fraction: self.fraction,
                    label: format!("iteration {} of {}", iteration, total),
                    step: None,
                    iteration: Some(iteration),
                })
            }
            Compiled::Ratio { pattern } => {
                let captures = pattern.captures(line)?;
                let numerator: i64 = captures.get(1)?.as_str().parse().ok()?;
                let denominator: i64 = captures.get(2)?.as_str().parse().ok()?;
                if denominator <= 0 {
                    return None;
                }

                let numerator = numerator.max(0);
                self.fraction = (numerator as f64 / denominator as f64).clamp(0.0, 1.0);

                Some(Progress {
                    fraction: self.fraction,
                    label: format!("{} of {}", numerator, denominator),
                    step: None,
                    iteration: Some(numerator as u64),
                })
            }
        }
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, ProgressSpecError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ProgressSpecError::BadPattern {
            pattern: pattern.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_protocol::StepPattern;

    fn steps_spec() -> ProgressSpec {
        ProgressSpec::Steps {
            steps: vec![
                StepPattern {
                    pattern: "feature extraction".to_string(),
                    label: "Extracting features".to_string(),
                },
                StepPattern {
                    pattern: "feature matching".to_string(),
                    label: "Matching features".to_string(),
                },
                StepPattern {
                    pattern: "sparse reconstruction".to_string(),
                    label: "Solving camera poses".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_steps_advance_in_order() {
        let mut tracker = ProgressTracker::compile(&steps_spec()).unwrap();

        let progress = tracker.observe("Starting Feature Extraction now").unwrap();
        assert_eq!(progress.step, Some(1));
        assert!((progress.fraction - 1.0 / 3.0).abs() < 1e-9);

        let progress = tracker.observe("feature matching block 1").unwrap();
        assert_eq!(progress.step, Some(2));
        assert_eq!(progress.label, "Matching features");
    }

    #[test]
    fn test_steps_never_regress() {
        let mut tracker = ProgressTracker::compile(&steps_spec()).unwrap();

        tracker.observe("sparse reconstruction running").unwrap();
        assert_eq!(tracker.reached_step(), 3);

        // An earlier phase announcing itself again must not rewind
        let progress = tracker.observe("feature extraction pass 2").unwrap();
        assert_eq!(progress.step, Some(3));
        assert_eq!(tracker.reached_step(), 3);
        assert!((tracker.fraction() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_steps_unmatched_line_is_ignored() {
        let mut tracker = ProgressTracker::compile(&steps_spec()).unwrap();
        tracker.observe("feature extraction").unwrap();

        assert!(tracker.observe("loading images from disk").is_none());
        assert_eq!(tracker.reached_step(), 1);
    }

    #[test]
    fn test_empty_step_list_is_rejected() {
        let spec = ProgressSpec::Steps { steps: vec![] };
        assert!(matches!(
            ProgressTracker::compile(&spec),
            Err(ProgressSpecError::NoSteps)
        ));
    }

    #[test]
    fn test_iteration_fraction_and_clamping() {
        let spec = ProgressSpec::Iteration {
            pattern: r"iteration (\d+)".to_string(),
            total: 100,
        };
        let mut tracker = ProgressTracker::compile(&spec).unwrap();

        let progress = tracker.observe("iteration 25 complete").unwrap();
        assert!((progress.fraction - 0.25).abs() < 1e-9);
        assert_eq!(progress.iteration, Some(25));

        // Overshoot clamps to 1.0 rather than exceeding it
        let progress = tracker.observe("iteration 250 complete").unwrap();
        assert!((progress.fraction - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_iteration_zero_total_is_rejected() {
        let spec = ProgressSpec::Iteration {
            pattern: r"iteration (\d+)".to_string(),
            total: 0,
        };
        assert!(matches!(
            ProgressTracker::compile(&spec),
            Err(ProgressSpecError::ZeroTotal)
        ));
    }

    #[test]
    fn test_iteration_non_numeric_capture_is_ignored() {
        let spec = ProgressSpec::Iteration {
            pattern: r"iteration (\w+)".to_string(),
            total: 100,
        };
        let mut tracker = ProgressTracker::compile(&spec).unwrap();
        tracker.observe("iteration 10").unwrap();

        assert!(tracker.observe("iteration ten").is_none());
        // Prior fraction stands
        assert!((tracker.fraction() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_fraction() {
        let spec = ProgressSpec::Ratio {
            pattern: r"\[(\d+)/(\d+)\]".to_string(),
        };
        let mut tracker = ProgressTracker::compile(&spec).unwrap();

        let progress = tracker.observe("Processed file [150/300]").unwrap();
        assert!((progress.fraction - 0.5).abs() < 1e-9);
        assert_eq!(progress.label, "150 of 300");
    }

    #[test]
    fn test_ratio_zero_denominator_is_ignored() {
        let spec = ProgressSpec::Ratio {
            pattern: r"(\d+)/(\d+)".to_string(),
        };
        let mut tracker = ProgressTracker::compile(&spec).unwrap();
        tracker.observe("3/10").unwrap();

        assert!(tracker.observe("5/0").is_none());
        assert!((tracker.fraction() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_negative_denominator_is_ignored() {
        let spec = ProgressSpec::Ratio {
            pattern: r"(-?\d+)/(-?\d+)".to_string(),
        };
        let mut tracker = ProgressTracker::compile(&spec).unwrap();

        assert!(tracker.observe("5/-10").is_none());
        assert!((tracker.fraction()).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_negative_numerator_clamps_to_zero() {
        let spec = ProgressSpec::Ratio {
            pattern: r"(-?\d+)/(-?\d+)".to_string(),
        };
        let mut tracker = ProgressTracker::compile(&spec).unwrap();

        let progress = tracker.observe("-5/10").unwrap();
        assert!((progress.fraction).abs() < 1e-9);
    }

    #[test]
    fn test_bad_pattern_is_a_compile_error() {
        let spec = ProgressSpec::Ratio {
            pattern: "(unclosed".to_string(),
        };
        assert!(matches!(
            ProgressTracker::compile(&spec),
            Err(ProgressSpecError::BadPattern { .. })
        ));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let spec = ProgressSpec::Iteration {
            pattern: r"Step (\d+)".to_string(),
            total: 10,
        };
        let mut tracker = ProgressTracker::compile(&spec).unwrap();

        assert!(tracker.observe("STEP 5 done").is_some());
    }
}
