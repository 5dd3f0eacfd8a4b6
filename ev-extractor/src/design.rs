//! Design output accumulator
//!
//! The `DesignOutput` is the boundary contract with the downstream GLM
//! design-matrix builder: four parallel sequences of equal length, where
//! entry `i` describes one named condition by its onsets, durations and
//! amplitudes. The accumulator is append-only; each append is validated
//! immediately so a malformed condition fails fast instead of surfacing as
//! a bad design matrix later.

use crate::types::{ExtractError, Result};
use serde::Serialize;

/// Accumulated explanatory variables for one (subject, task) unit
///
/// Invariants (checked on every append and again by [`DesignOutput::validate`]):
/// - the four top-level vectors share one length
/// - for every condition `i`, `onsets[i]`, `durations[i]` and
///   `amplitudes[i]` have the same length
/// - every stored value is finite
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DesignOutput {
    /// Condition names, in rule-declaration order
    pub conditions: Vec<String>,
    /// Onset times (seconds) per condition
    pub onsets: Vec<Vec<f64>>,
    /// Durations (seconds) per condition
    pub durations: Vec<Vec<f64>>,
    /// Regressor amplitudes per condition
    pub amplitudes: Vec<Vec<f64>>,
}

impl DesignOutput {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accumulated conditions
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// True if no conditions have been appended yet
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Append one named condition, validating it first
    ///
    /// Fails fast with a data-integrity error if the three sequences do not
    /// share one length or any value is non-finite; the accumulator is left
    /// unchanged in that case.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        onsets: Vec<f64>,
        durations: Vec<f64>,
        amplitudes: Vec<f64>,
    ) -> Result<()> {
        let name = name.into();
        check_condition(self.len(), &name, &onsets, &durations, &amplitudes)?;

        log::debug!("Appending condition '{}' with {} onsets", name, onsets.len());
        self.conditions.push(name);
        self.onsets.push(onsets);
        self.durations.push(durations);
        self.amplitudes.push(amplitudes);
        Ok(())
    }

    /// Validate the completed accumulator against the full invariant
    ///
    /// Run once before the output is handed to the modeling consumer. On
    /// violation the error names the offending condition index and which of
    /// the parallel arrays failed.
    pub fn validate(&self) -> Result<()> {
        let c = self.conditions.len();
        for (array, len) in [
            ("onsets", self.onsets.len()),
            ("durations", self.durations.len()),
            ("amplitudes", self.amplitudes.len()),
        ] {
            if len != c {
                return Err(ExtractError::DataIntegrityError(format!(
                    "design has {} conditions but {} {} entries",
                    c, len, array
                )));
            }
        }
        for i in 0..c {
            check_condition(
                i,
                &self.conditions[i],
                &self.onsets[i],
                &self.durations[i],
                &self.amplitudes[i],
            )?;
        }
        Ok(())
    }
}

/// Check one condition's parallel sequences for length and numeric validity
fn check_condition(
    index: usize,
    name: &str,
    onsets: &[f64],
    durations: &[f64],
    amplitudes: &[f64],
) -> Result<()> {
    let n = onsets.len();
    for (array, values) in [("durations", durations), ("amplitudes", amplitudes)] {
        if values.len() != n {
            return Err(ExtractError::DataIntegrityError(format!(
                "condition {} ('{}'): {} has {} values but onsets has {}",
                index,
                name,
                array,
                values.len(),
                n
            )));
        }
    }
    for (array, values) in [
        ("onsets", onsets),
        ("durations", durations),
        ("amplitudes", amplitudes),
    ] {
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(ExtractError::DataIntegrityError(format!(
                "condition {} ('{}'): non-finite value in {} at position {}",
                index, name, array, pos
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_lengths() {
        let mut design = DesignOutput::new();
        design
            .push("go", vec![1.0, 5.0], vec![2.0, 2.0], vec![1.0, 1.0])
            .unwrap();
        design.push("junk", vec![9.0], vec![1.0], vec![1.0]).unwrap();

        assert_eq!(design.len(), 2);
        assert_eq!(design.conditions, vec!["go", "junk"]);
        assert_eq!(design.onsets[0], vec![1.0, 5.0]);
        design.validate().unwrap();
    }

    #[test]
    fn test_push_rejects_ragged_condition() {
        let mut design = DesignOutput::new();
        let err = design
            .push("go", vec![1.0, 5.0], vec![2.0], vec![1.0, 1.0])
            .unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("'go'"));
        assert!(msg.contains("durations"));
        // failed append leaves the accumulator unchanged
        assert!(design.is_empty());
    }

    #[test]
    fn test_push_rejects_non_finite() {
        let mut design = DesignOutput::new();
        let err = design
            .push("rt", vec![1.0], vec![2.0], vec![f64::NAN])
            .unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("amplitudes"));
        assert!(msg.contains("non-finite"));
    }

    #[test]
    fn test_validate_names_offending_index() {
        let mut design = DesignOutput::new();
        design.push("a", vec![1.0], vec![0.0], vec![1.0]).unwrap();
        design.push("b", vec![2.0], vec![0.0], vec![1.0]).unwrap();
        // corrupt the second condition behind the accumulator's back
        design.durations[1].push(3.0);

        let err = design.validate().unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("condition 1"));
        assert!(msg.contains("durations"));
    }

    #[test]
    fn test_validate_top_level_mismatch() {
        let mut design = DesignOutput::new();
        design.push("a", vec![1.0], vec![0.0], vec![1.0]).unwrap();
        design.amplitudes.pop();

        let err = design.validate().unwrap_err();
        assert!(format!("{}", err).contains("amplitudes"));
    }
}
