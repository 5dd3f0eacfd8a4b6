//! Condition extraction primitive
//!
//! Applies one `ConditionSpec` against an event table and appends the
//! resulting condition(s) to a shared `DesignOutput`. This is the one
//! rule-evaluation engine reused by every task variant: subset filtering,
//! grouped key-set unions, and the constant/column/explicit resolution of
//! amplitudes and durations all live here.

use crate::design::DesignOutput;
use crate::events::{EventRow, EventTable};
use crate::spec::{ConditionNames, ConditionSpec, ValueSource};
use crate::types::{ExtractError, Result};

/// Stateless evaluator for condition specs
pub struct ConditionExtractor;

impl ConditionExtractor {
    /// Apply one spec, appending zero or more conditions to `design`
    ///
    /// Purely additive: call order determines condition order in the final
    /// design. A grouped key-set matching zero rows is skipped silently;
    /// subjects legitimately lack some trial types.
    pub fn append(
        design: &mut DesignOutput,
        table: &EventTable,
        spec: &ConditionSpec,
    ) -> Result<()> {
        // subset first, then group / resolve against the filtered rows
        let rows: Vec<&EventRow> = match &spec.subset {
            Some(filter) => table.iter().filter(|row| filter.matches(row)).collect(),
            None => table.iter().collect(),
        };

        match &spec.condition {
            ConditionNames::Single(name) => {
                let members: Vec<usize> = (0..rows.len()).collect();
                if members.is_empty() {
                    log::debug!("condition '{}': no rows after subset, skipping", name);
                    return Ok(());
                }
                Self::append_members(design, &rows, &members, name, spec)
            }
            ConditionNames::Grouped(groups) => {
                let column = spec.group_column.as_deref().ok_or_else(|| {
                    ExtractError::ConfigError(
                        "grouped condition spec requires a grouping column".to_string(),
                    )
                })?;

                for group in groups {
                    // order-preserved union over the key-set, no duplicates
                    let members: Vec<usize> = rows
                        .iter()
                        .enumerate()
                        .filter(|(_, row)| {
                            row.value(column)
                                .map(|cell| group.keys.iter().any(|key| key.matches(cell)))
                                .unwrap_or(false)
                        })
                        .map(|(i, _)| i)
                        .collect();

                    if members.is_empty() {
                        log::debug!(
                            "condition '{}': no rows match in column '{}', skipping",
                            group.name,
                            column
                        );
                        continue;
                    }
                    Self::append_members(design, &rows, &members, &group.name, spec)?;
                }
                Ok(())
            }
        }
    }

    /// Resolve onsets, durations and amplitudes for one condition's member
    /// rows and push the result
    fn append_members(
        design: &mut DesignOutput,
        rows: &[&EventRow],
        members: &[usize],
        name: &str,
        spec: &ConditionSpec,
    ) -> Result<()> {
        let onsets = resolve_column(rows, members, &spec.onset_column, name)?;
        let durations = resolve_source(&spec.duration, rows, members, name, "duration")?;
        let amplitudes = resolve_source(&spec.amplitude, rows, members, name, "amplitude")?;
        design.push(name, onsets, durations, amplitudes)
    }
}

/// Resolve a value source to one value per member row
fn resolve_source(
    source: &ValueSource,
    rows: &[&EventRow],
    members: &[usize],
    condition: &str,
    what: &str,
) -> Result<Vec<f64>> {
    match source {
        ValueSource::Constant(value) => Ok(vec![*value; members.len()]),
        ValueSource::Column(column) => resolve_column(rows, members, column, condition),
        ValueSource::Explicit(values) => {
            if values.len() != rows.len() {
                return Err(ExtractError::ConfigError(format!(
                    "condition '{}': explicit {} sequence has {} values for {} filtered rows",
                    condition,
                    what,
                    values.len(),
                    rows.len()
                )));
            }
            Ok(members.iter().map(|&i| values[i]).collect())
        }
    }
}

/// Read a numeric column for the given member rows
fn resolve_column(
    rows: &[&EventRow],
    members: &[usize],
    column: &str,
    condition: &str,
) -> Result<Vec<f64>> {
    members
        .iter()
        .map(|&i| {
            let cell = rows[i].value(column).ok_or_else(|| {
                ExtractError::DataIntegrityError(format!(
                    "condition '{}': column '{}' not found",
                    condition, column
                ))
            })?;
            cell.as_f64().ok_or_else(|| {
                ExtractError::DataIntegrityError(format!(
                    "condition '{}': column '{}' has a {} value where a number is required",
                    condition,
                    column,
                    if cell.is_missing() { "missing" } else { "non-numeric" }
                ))
            })
        })
        .collect()
}
