//! Per-task rule tables
//!
//! Each task variant is a fixed, ordered list of rules: data, not code.
//! Adding a task means adding a `TaskId` arm and its table here; the generic
//! evaluator in `extractor` does the rest. Condition names, orderings and
//! subset predicates follow each paradigm's established regressor model
//! exactly, including the per-variant response-time exclusions (stop-signal
//! designs must keep successful-stop trials out of the RT regressor to avoid
//! collinearity with the already-modeled success condition).

use crate::spec::{ConditionSpec, Filter, Group, Key, ValueSource};
use crate::types::ExtractError;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Identifier of one task paradigm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskId {
    /// Attention network task
    Ant,
    /// Columbia card task (hot)
    CctHot,
    /// Delay discounting (fixed)
    DiscountFix,
    /// Dot pattern expectancy
    Dpx,
    /// Motor-selective stop signal
    MotorSelectiveStop,
    /// Stop signal
    StopSignal,
    /// Stroop
    Stroop,
    /// Survey medley
    SurveyMedley,
    /// Two-by-two task switching
    TwoByTwo,
    /// Ward and Allport tower task
    Watt3,
    /// Generic single-condition model
    Base,
    /// Trial-by-trial beta series
    Beta,
}

impl TaskId {
    /// All known task identifiers
    pub const ALL: [TaskId; 12] = [
        TaskId::Ant,
        TaskId::CctHot,
        TaskId::DiscountFix,
        TaskId::Dpx,
        TaskId::MotorSelectiveStop,
        TaskId::StopSignal,
        TaskId::Stroop,
        TaskId::SurveyMedley,
        TaskId::TwoByTwo,
        TaskId::Watt3,
        TaskId::Base,
        TaskId::Beta,
    ];

    /// Canonical identifier as used in event file names and CLI arguments
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskId::Ant => "ANT",
            TaskId::CctHot => "CCTHot",
            TaskId::DiscountFix => "discountFix",
            TaskId::Dpx => "DPX",
            TaskId::MotorSelectiveStop => "motorSelectiveStop",
            TaskId::StopSignal => "stopSignal",
            TaskId::Stroop => "stroop",
            TaskId::SurveyMedley => "surveyMedley",
            TaskId::TwoByTwo => "twoByTwo",
            TaskId::Watt3 => "WATT3",
            TaskId::Base => "base",
            TaskId::Beta => "beta",
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskId {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskId::ALL
            .iter()
            .find(|task| task.as_str() == s)
            .copied()
            .ok_or_else(|| ExtractError::UnknownTask(s.to_string()))
    }
}

/// One step of a task's regressor model
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Apply a condition spec as-is (single, grouped, or parametric)
    Condition(ConditionSpec),
    /// Amplitude from a signed recoding of a categorical column:
    /// `positive` label maps to +1, `negative` to -1
    SignedContrast {
        name: String,
        column: String,
        positive: Key,
        negative: Key,
        duration: ValueSource,
        subset: Option<Filter>,
    },
    /// Response-time regressor, emitted only when the caller requests it
    RtRegressor { subset: Option<Filter> },
    /// One unit-amplitude condition per individual non-junk trial
    BetaSeries,
}

/// Mandatory nuisance condition modeling junk trials
fn junk_rule() -> Rule {
    Rule::Condition(
        ConditionSpec::grouped("junk", vec![Group::new(true, "junk")])
            .with_duration(ValueSource::column("duration")),
    )
}

/// Response-time regressor over non-junk trials
fn rt_rule() -> Rule {
    Rule::RtRegressor {
        subset: Some(Filter::new().eq("junk", false)),
    }
}

fn not_junk() -> Filter {
    Filter::new().eq("junk", false)
}

/// Build the ordered rule list for one task
fn rules_for(task: TaskId) -> Vec<Rule> {
    match task {
        TaskId::Ant => vec![
            // cue type
            Rule::Condition(
                ConditionSpec::grouped(
                    "cue",
                    vec![Group::new("spatial", "spatial"), Group::new("double", "double")],
                )
                .with_duration(ValueSource::column("duration"))
                .with_subset(not_junk()),
            ),
            // conflict type
            Rule::Condition(
                ConditionSpec::grouped(
                    "flanker_type",
                    vec![
                        Group::new("congruent", "congruent"),
                        Group::new("incongruent", "incongruent"),
                    ],
                )
                .with_duration(ValueSource::column("duration"))
                .with_subset(not_junk()),
            ),
            junk_rule(),
            rt_rule(),
        ],

        TaskId::CctHot => vec![
            Rule::Condition(
                ConditionSpec::single("task")
                    .with_duration(ValueSource::column("duration"))
                    .with_subset(not_junk()),
            ),
            // main parametric regressors: expected value and risk
            Rule::Condition(
                ConditionSpec::single("EV")
                    .with_duration(ValueSource::column("duration"))
                    .with_amplitude(ValueSource::column("EV"))
                    .with_subset(not_junk()),
            ),
            Rule::Condition(
                ConditionSpec::single("risk")
                    .with_duration(ValueSource::column("duration"))
                    .with_amplitude(ValueSource::column("risk"))
                    .with_subset(not_junk()),
            ),
            Rule::Condition(
                ConditionSpec::single("num_click_in_round")
                    .with_duration(ValueSource::column("duration"))
                    .with_amplitude(ValueSource::column("num_click_in_round"))
                    .with_subset(not_junk()),
            ),
            Rule::Condition(
                ConditionSpec::grouped(
                    "feedback",
                    vec![Group::new(1, "reward"), Group::new(0, "punishment")],
                )
                .with_subset(not_junk()),
            ),
            junk_rule(),
            rt_rule(),
        ],

        TaskId::DiscountFix => vec![
            Rule::SignedContrast {
                name: "LL_vs_SS".to_string(),
                column: "trial_type".to_string(),
                positive: Key::from("larger_later"),
                negative: Key::from("smaller_sooner"),
                duration: ValueSource::column("duration"),
                subset: Some(not_junk()),
            },
            Rule::Condition(
                ConditionSpec::single("subjective_value")
                    .with_duration(ValueSource::column("duration"))
                    .with_amplitude(ValueSource::column("subjective_value"))
                    .with_subset(not_junk()),
            ),
            junk_rule(),
            rt_rule(),
        ],

        TaskId::Dpx => vec![
            Rule::Condition(
                ConditionSpec::grouped(
                    "condition",
                    vec![
                        Group::new("AX", "AX"),
                        Group::new("AY", "AY"),
                        Group::new("BX", "BX"),
                        Group::new("BY", "BY"),
                    ],
                )
                .with_duration(ValueSource::column("duration"))
                .with_subset(not_junk()),
            ),
            junk_rule(),
            rt_rule(),
        ],

        TaskId::MotorSelectiveStop => vec![
            Rule::Condition(
                ConditionSpec::grouped(
                    "trial_type",
                    vec![
                        Group::new("crit_go", "crit_go"),
                        Group::new("crit_stop_success", "crit_stop_success"),
                        Group::new("crit_stop_failure", "crit_stop_failure"),
                        Group::new("noncrit_signal", "noncrit_signal"),
                        Group::new("noncrit_nosignal", "noncrit_nosignal"),
                    ],
                )
                .with_duration(ValueSource::column("duration")),
            ),
            junk_rule(),
            // successful critical stops carry no response; keep them out of
            // the RT regressor
            Rule::RtRegressor {
                subset: Some(not_junk().ne("trial_type", "crit_stop_success")),
            },
        ],

        TaskId::StopSignal => vec![
            Rule::Condition(
                ConditionSpec::grouped(
                    "trial_type",
                    vec![
                        Group::new("go", "go"),
                        Group::new("stop_success", "stop_success"),
                        Group::new("stop_failure", "stop_failure"),
                    ],
                )
                .with_duration(ValueSource::column("duration"))
                .with_subset(not_junk()),
            ),
            junk_rule(),
            Rule::RtRegressor {
                subset: Some(not_junk().ne("trial_type", "stop_success")),
            },
        ],

        TaskId::Stroop => vec![
            // contrast regressor
            Rule::Condition(
                ConditionSpec::grouped(
                    "condition",
                    vec![
                        Group::new("incongruent", "incongruent"),
                        Group::new("congruent", "congruent"),
                    ],
                )
                .with_duration(ValueSource::column("duration")),
            ),
            junk_rule(),
            // this paradigm's RT regressor runs over all trials, junk included
            Rule::RtRegressor { subset: None },
        ],

        TaskId::SurveyMedley => vec![
            Rule::Condition(
                ConditionSpec::single("stim_duration")
                    .with_duration(ValueSource::column("stim_duration")),
            ),
            Rule::Condition(
                ConditionSpec::single("movement").with_onset_column("movement_onset"),
            ),
            junk_rule(),
            rt_rule(),
        ],

        TaskId::TwoByTwo => vec![
            // cue switch contrasts at each cue-target interval
            cue_switch_rule(900.0),
            cue_switch_rule(100.0),
            // task switch contrasts
            task_switch_rule(900.0),
            task_switch_rule(100.0),
            junk_rule(),
            rt_rule(),
        ],

        TaskId::Watt3 => vec![
            // planning phase conditions
            Rule::Condition(
                ConditionSpec::grouped(
                    "condition",
                    vec![
                        Group::new("PA_with_intermediate", "plan_PA_with"),
                        Group::new("PA_without_intermediate", "plan_PA_without"),
                    ],
                )
                .with_duration(ValueSource::column("duration"))
                .with_subset(Filter::new().eq("planning", 1)),
            ),
            Rule::Condition(
                ConditionSpec::single("movement").with_onset_column("movement_onset"),
            ),
            Rule::Condition(
                ConditionSpec::single("feedback")
                    .with_duration(ValueSource::column("duration"))
                    .with_subset(Filter::new().eq("trial_id", "feedback")),
            ),
            Rule::RtRegressor {
                subset: Some(Filter::new().ne("trial_id", "feedback")),
            },
        ],

        TaskId::Base => vec![
            Rule::Condition(
                ConditionSpec::single("trial").with_duration(ValueSource::column("duration")),
            ),
            junk_rule(),
        ],

        TaskId::Beta => vec![Rule::BetaSeries, junk_rule(), rt_rule()],
    }
}

/// Grouped cue-switch contrast restricted to task-stay trials at one CTI
fn cue_switch_rule(cti: f64) -> Rule {
    let suffix = cti as u32;
    Rule::Condition(
        ConditionSpec::grouped(
            "cue_switch",
            vec![
                Group::new("switch", &format!("cue_switch_{}", suffix)),
                Group::new("stay", &format!("cue_stay_{}", suffix)),
            ],
        )
        .with_duration(ValueSource::column("duration"))
        .with_subset(
            Filter::new()
                .eq("CTI", cti)
                .eq("task_switch", "stay")
                .eq("junk", false),
        ),
    )
}

/// Grouped task-switch contrast excluding cue-stay trials at one CTI
fn task_switch_rule(cti: f64) -> Rule {
    let suffix = cti as u32;
    Rule::Condition(
        ConditionSpec::grouped(
            "task_switch",
            vec![
                Group::new("switch", &format!("task_switch_{}", suffix)),
                Group::new("stay", &format!("task_stay_{}", suffix)),
            ],
        )
        .with_duration(ValueSource::column("duration"))
        .with_subset(
            Filter::new()
                .eq("CTI", cti)
                .ne("cue_switch", "stay")
                .eq("junk", false),
        ),
    )
}

/// The static per-task rule registry
///
/// Built once, never mutated; safe to share across concurrent invocations.
pub struct TaskRegistry {
    rules: HashMap<TaskId, Vec<Rule>>,
}

impl TaskRegistry {
    /// Build the registry for all known tasks
    pub fn new() -> Self {
        let rules = TaskId::ALL
            .iter()
            .map(|&task| (task, rules_for(task)))
            .collect();
        Self { rules }
    }

    /// Ordered rule list for a task
    pub fn rules(&self, task: TaskId) -> &[Rule] {
        self.rules.get(&task).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Registry statistics
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            num_tasks: self.rules.len(),
            num_rules: self.rules.values().map(Vec::len).sum(),
        }
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of registered task variants
    pub num_tasks: usize,
    /// Total number of rules across all variants
    pub num_rules: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_round_trip() {
        for task in TaskId::ALL {
            assert_eq!(task.as_str().parse::<TaskId>().unwrap(), task);
        }
    }

    #[test]
    fn test_unknown_task_id() {
        let err = "Foo".parse::<TaskId>().unwrap_err();
        assert!(matches!(err, ExtractError::UnknownTask(name) if name == "Foo"));
    }

    #[test]
    fn test_registry_covers_all_tasks() {
        let registry = TaskRegistry::new();
        for task in TaskId::ALL {
            assert!(!registry.rules(task).is_empty(), "no rules for {}", task);
        }
        assert_eq!(registry.stats().num_tasks, TaskId::ALL.len());
    }

    #[test]
    fn test_every_primary_variant_gates_rt() {
        // each non-base variant ends with a gated RT regressor
        let registry = TaskRegistry::new();
        for task in TaskId::ALL {
            if task == TaskId::Base {
                continue;
            }
            assert!(
                matches!(registry.rules(task).last(), Some(Rule::RtRegressor { .. })),
                "{} should end with an RT regressor",
                task
            );
        }
    }

    #[test]
    fn test_stop_variants_exclude_success_trials_from_rt() {
        let registry = TaskRegistry::new();

        let assert_excludes = |task: TaskId, label: &str| {
            let Some(Rule::RtRegressor { subset: Some(filter) }) = registry.rules(task).last()
            else {
                panic!("{} should end with a filtered RT regressor", task);
            };
            assert!(
                filter.predicates.iter().any(|p| p.value == Key::from(label)),
                "{} RT subset should exclude {}",
                task,
                label
            );
        };

        assert_excludes(TaskId::StopSignal, "stop_success");
        assert_excludes(TaskId::MotorSelectiveStop, "crit_stop_success");
    }

    #[test]
    fn test_two_by_two_condition_names() {
        let registry = TaskRegistry::new();
        let rules = registry.rules(TaskId::TwoByTwo);
        assert_eq!(rules.len(), 6);

        let Rule::Condition(spec) = &rules[0] else {
            panic!("expected a grouped condition");
        };
        let crate::spec::ConditionNames::Grouped(groups) = &spec.condition else {
            panic!("expected grouped form");
        };
        assert_eq!(groups[0].name, "cue_switch_900");
        assert_eq!(groups[1].name, "cue_stay_900");
    }
}
