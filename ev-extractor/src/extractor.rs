//! Main extraction API
//!
//! The `Extractor` owns the static task rule registry and drives the
//! condition-extraction primitive through one task's rules. `build` is a
//! pure function of its inputs: no state survives an invocation, so one
//! `Extractor` can serve any number of (subject, task) units, concurrently
//! if the caller wishes.

use crate::design::DesignOutput;
use crate::events::EventTable;
use crate::extract::ConditionExtractor;
use crate::spec::{ConditionSpec, ValueSource};
use crate::tasks::{RegistryStats, Rule, TaskId, TaskRegistry};
use crate::types::{ExtractError, Result};

/// The main extraction struct - entry point for building design outputs
pub struct Extractor {
    registry: TaskRegistry,
}

impl Extractor {
    /// Create an extractor with the built-in task registry
    pub fn new() -> Self {
        Self {
            registry: TaskRegistry::new(),
        }
    }

    /// Build the design output for one (events table, task) unit
    ///
    /// Rules run in declaration order; the completed accumulator is
    /// validated before it is returned.
    ///
    /// # Arguments
    /// * `table` - the loaded event table
    /// * `task` - which task's regressor model to apply
    /// * `regress_rt` - whether to emit the response-time regressor
    ///
    /// # Example
    /// ```no_run
    /// use ev_extractor::{EventTable, Extractor, TaskId};
    /// use std::path::Path;
    ///
    /// let table = EventTable::from_path(Path::new("sub-01_task-stroop_events.tsv")).unwrap();
    /// let extractor = Extractor::new();
    /// let design = extractor.build(&table, TaskId::Stroop, true).unwrap();
    /// println!("{} conditions", design.len());
    /// ```
    pub fn build(
        &self,
        table: &EventTable,
        task: TaskId,
        regress_rt: bool,
    ) -> Result<DesignOutput> {
        log::info!(
            "Building design for task {} ({} trials, regress_rt={})",
            task,
            table.len(),
            regress_rt
        );

        let mut design = DesignOutput::new();
        for rule in self.registry.rules(task) {
            self.apply_rule(&mut design, table, rule, regress_rt)?;
        }

        design.validate()?;
        log::debug!("Task {} produced {} conditions", task, design.len());
        Ok(design)
    }

    /// Parse a task identifier and build its design output
    ///
    /// Fails with an unknown-task error for an unrecognized identifier.
    pub fn build_named(
        &self,
        table: &EventTable,
        task: &str,
        regress_rt: bool,
    ) -> Result<DesignOutput> {
        self.build(table, task.parse()?, regress_rt)
    }

    /// Statistics about the task rule registry
    pub fn registry_stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// Evaluate one rule against the table
    fn apply_rule(
        &self,
        design: &mut DesignOutput,
        table: &EventTable,
        rule: &Rule,
        regress_rt: bool,
    ) -> Result<()> {
        match rule {
            Rule::Condition(spec) => ConditionExtractor::append(design, table, spec),

            Rule::SignedContrast {
                name,
                column,
                positive,
                negative,
                duration,
                subset,
            } => {
                // recode the label column into an explicit ± amplitude
                // sequence aligned with the filtered rows
                let rows: Vec<_> = match subset {
                    Some(filter) => table.iter().filter(|r| filter.matches(r)).collect(),
                    None => table.iter().collect(),
                };
                let amplitudes = rows
                    .iter()
                    .map(|row| {
                        let cell = row.value(column).ok_or_else(|| {
                            ExtractError::DataIntegrityError(format!(
                                "condition '{}': column '{}' not found",
                                name, column
                            ))
                        })?;
                        if positive.matches(cell) {
                            Ok(1.0)
                        } else if negative.matches(cell) {
                            Ok(-1.0)
                        } else {
                            Err(ExtractError::DataIntegrityError(format!(
                                "condition '{}': column '{}' value '{}' is neither contrast label",
                                name, column, cell
                            )))
                        }
                    })
                    .collect::<Result<Vec<f64>>>()?;

                let mut spec = ConditionSpec::single(name)
                    .with_amplitude(ValueSource::Explicit(amplitudes))
                    .with_duration(duration.clone());
                spec.subset = subset.clone();
                ConditionExtractor::append(design, table, &spec)
            }

            Rule::RtRegressor { subset } => {
                if !regress_rt {
                    log::debug!("regress_rt off; skipping response-time regressor");
                    return Ok(());
                }
                let mut spec = ConditionSpec::single("response_time")
                    .with_duration(ValueSource::column("duration"))
                    .with_amplitude(ValueSource::column("response_time"));
                spec.subset = subset.clone();
                ConditionExtractor::append(design, table, &spec)
            }

            Rule::BetaSeries => {
                // one condition per non-junk trial, numbered over the full
                // table so trial indices stay stable across junk exclusions
                for (i, row) in table.iter().enumerate() {
                    if row.junk {
                        continue;
                    }
                    design.push(
                        format!("trial_{:03}", i + 1),
                        vec![row.onset],
                        vec![row.duration],
                        vec![1.0],
                    )?;
                }
                Ok(())
            }
        }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventRow;

    fn stop_signal_table() -> EventTable {
        EventTable::from_rows(vec![
            EventRow::new(1.0, 2.0, false)
                .with("trial_type", "go")
                .with("response_time", 0.41),
            EventRow::new(5.0, 1.0, false)
                .with("trial_type", "stop_success")
                .with("response_time", f64::NAN),
            EventRow::new(9.0, 1.0, false)
                .with("trial_type", "stop_failure")
                .with("response_time", 0.38),
            EventRow::new(13.0, 1.0, true)
                .with("trial_type", "go")
                .with("response_time", 0.55),
        ])
    }

    #[test]
    fn test_stop_signal_build() {
        let extractor = Extractor::new();
        let design = extractor
            .build(&stop_signal_table(), TaskId::StopSignal, true)
            .unwrap();

        assert_eq!(
            design.conditions,
            vec!["go", "stop_success", "stop_failure", "junk", "response_time"]
        );
        assert_eq!(design.onsets[0], vec![1.0]);
        assert_eq!(design.onsets[3], vec![13.0]);
        // stop_success rows are excluded from the RT regressor
        assert_eq!(design.onsets[4], vec![1.0, 9.0]);
        assert_eq!(design.amplitudes[4], vec![0.41, 0.38]);
    }

    #[test]
    fn test_rt_gating_changes_nothing_else() {
        let extractor = Extractor::new();
        let with_rt = extractor
            .build(&stop_signal_table(), TaskId::StopSignal, true)
            .unwrap();
        let without_rt = extractor
            .build(&stop_signal_table(), TaskId::StopSignal, false)
            .unwrap();

        assert_eq!(without_rt.len(), with_rt.len() - 1);
        assert_eq!(
            &with_rt.conditions[..without_rt.len()],
            &without_rt.conditions[..]
        );
        assert_eq!(&with_rt.onsets[..without_rt.len()], &without_rt.onsets[..]);
    }

    #[test]
    fn test_build_is_pure() {
        let extractor = Extractor::new();
        let table = stop_signal_table();
        let first = extractor.build(&table, TaskId::StopSignal, true).unwrap();
        let second = extractor.build(&table, TaskId::StopSignal, true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_rt_is_data_integrity_error() {
        // a non-junk go trial with no response time poisons the RT regressor
        let table = EventTable::from_rows(vec![
            EventRow::new(1.0, 2.0, false)
                .with("trial_type", "go")
                .with("response_time", 0.41),
            EventRow::new(5.0, 1.0, false).with("trial_type", "go"),
        ]);
        let extractor = Extractor::new();
        let err = extractor.build(&table, TaskId::StopSignal, true).unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("response_time"));
    }

    #[test]
    fn test_unknown_task_name() {
        let extractor = Extractor::new();
        let err = extractor
            .build_named(&stop_signal_table(), "Foo", true)
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnknownTask(_)));
    }

    #[test]
    fn test_signed_contrast_amplitudes() {
        let table = EventTable::from_rows(vec![
            EventRow::new(1.0, 1.5, false)
                .with("trial_type", "larger_later")
                .with("subjective_value", 0.7)
                .with("response_time", 0.9),
            EventRow::new(4.0, 1.5, false)
                .with("trial_type", "smaller_sooner")
                .with("subjective_value", 0.2)
                .with("response_time", 1.1),
            EventRow::new(8.0, 1.5, true)
                .with("trial_type", "larger_later")
                .with("subjective_value", 0.5)
                .with("response_time", 1.0),
        ]);
        let extractor = Extractor::new();
        let design = extractor.build(&table, TaskId::DiscountFix, true).unwrap();

        assert_eq!(design.conditions[0], "LL_vs_SS");
        // junk row is filtered before recoding, so only two amplitudes remain
        assert_eq!(design.amplitudes[0], vec![1.0, -1.0]);
        assert_eq!(design.conditions[1], "subjective_value");
        assert_eq!(design.amplitudes[1], vec![0.7, 0.2]);
    }

    #[test]
    fn test_beta_series_numbering_skips_junk() {
        let table = EventTable::from_rows(vec![
            EventRow::new(1.0, 2.0, false).with("response_time", 0.4),
            EventRow::new(5.0, 2.0, true).with("response_time", 0.5),
            EventRow::new(9.0, 2.0, false).with("response_time", 0.6),
        ]);
        let extractor = Extractor::new();
        let design = extractor.build(&table, TaskId::Beta, false).unwrap();

        // trial numbering follows table position, junk trials keep their slot
        assert_eq!(design.conditions, vec!["trial_001", "trial_003", "junk"]);
        assert_eq!(design.onsets[0], vec![1.0]);
        assert_eq!(design.onsets[1], vec![9.0]);
        assert_eq!(design.amplitudes[0], vec![1.0]);
    }

    #[test]
    fn test_registry_stats_exposed() {
        let extractor = Extractor::new();
        let stats = extractor.registry_stats();
        assert_eq!(stats.num_tasks, TaskId::ALL.len());
        assert!(stats.num_rules > stats.num_tasks);
    }
}
