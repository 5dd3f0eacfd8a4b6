//! Condition specification types
//!
//! A `ConditionSpec` declares how rows of an event table are carved into one
//! or more named conditions: the naming form (single name or grouped
//! key/name pairs), where amplitudes and durations come from, an optional
//! row subset, and which column supplies onsets. Specs are plain data,
//! interpreted by the extraction primitive; the per-task rule tables are
//! built entirely from them.

use crate::events::{CellValue, EventRow};
use serde::{Deserialize, Serialize};

/// A typed key used for grouping and for subset predicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Key {
    /// Categorical label (e.g. `"stop_success"`)
    Text(String),
    /// Numeric key (e.g. feedback `1`/`0`, CTI `900`)
    Number(f64),
    /// Boolean key (e.g. the junk flag)
    Bool(bool),
}

impl Key {
    /// True if the given cell holds this key's value. Missing cells match
    /// nothing; types never cross-match.
    pub fn matches(&self, cell: &CellValue) -> bool {
        match (self, cell) {
            (Key::Text(k), CellValue::Text(v)) => k == v,
            (Key::Number(k), CellValue::Number(v)) => k == v,
            (Key::Bool(k), CellValue::Bool(v)) => k == v,
            _ => false,
        }
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Text(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Text(v)
    }
}

impl From<f64> for Key {
    fn from(v: f64) -> Self {
        Key::Number(v)
    }
}

impl From<i32> for Key {
    fn from(v: i32) -> Self {
        Key::Number(v as f64)
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Number(v as f64)
    }
}

impl From<bool> for Key {
    fn from(v: bool) -> Self {
        Key::Bool(v)
    }
}

/// Where a condition's amplitude or duration values come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueSource {
    /// One value broadcast to every onset in the condition
    Constant(f64),
    /// Per-row values read from the named column
    Column(String),
    /// Precomputed values aligned one-to-one with the filtered rows
    Explicit(Vec<f64>),
}

impl ValueSource {
    /// Shorthand for a column reference
    pub fn column(name: &str) -> Self {
        ValueSource::Column(name.to_string())
    }
}

/// Comparison operator for subset predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Eq,
    Ne,
}

/// One column comparison within a subset filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub column: String,
    pub op: Op,
    pub value: Key,
}

impl Predicate {
    /// Evaluate this predicate against one row.
    ///
    /// A missing cell (or absent column) never equals a key, so `Eq` is
    /// false and `Ne` is true for it, matching the rows a pandas-style
    /// query would keep.
    pub fn matches(&self, row: &EventRow) -> bool {
        let hit = row
            .value(&self.column)
            .map(|cell| self.value.matches(cell))
            .unwrap_or(false);
        match self.op {
            Op::Eq => hit,
            Op::Ne => !hit,
        }
    }
}

/// A conjunction of column predicates used to subset the event table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub predicates: Vec<Predicate>,
}

impl Filter {
    /// Create an empty filter (matches every row)
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: require `column == value`
    pub fn eq(mut self, column: &str, value: impl Into<Key>) -> Self {
        self.predicates.push(Predicate {
            column: column.to_string(),
            op: Op::Eq,
            value: value.into(),
        });
        self
    }

    /// Builder method: require `column != value`
    pub fn ne(mut self, column: &str, value: impl Into<Key>) -> Self {
        self.predicates.push(Predicate {
            column: column.to_string(),
            op: Op::Ne,
            value: value.into(),
        });
        self
    }

    /// True if the row satisfies every predicate
    pub fn matches(&self, row: &EventRow) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }
}

/// One (key-set, name) pair of a grouped condition spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Grouping-column values unioned into this condition
    pub keys: Vec<Key>,
    /// Name of the resulting condition
    pub name: String,
}

impl Group {
    /// Group rows matching a single key
    pub fn new(key: impl Into<Key>, name: &str) -> Self {
        Self {
            keys: vec![key.into()],
            name: name.to_string(),
        }
    }

    /// Group rows matching any of several keys
    pub fn with_keys(keys: Vec<Key>, name: &str) -> Self {
        Self {
            keys,
            name: name.to_string(),
        }
    }
}

/// Naming form of a condition spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConditionNames {
    /// All (filtered) rows form one condition with this name
    Single(String),
    /// Rows are partitioned by the grouping column into these groups
    Grouped(Vec<Group>),
}

/// Declarative rule mapping event-table rows to named conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSpec {
    /// Single-name or grouped form
    pub condition: ConditionNames,
    /// Column whose values the grouped form partitions on; required for
    /// `ConditionNames::Grouped`
    pub group_column: Option<String>,
    /// Amplitude source (default: constant 1)
    pub amplitude: ValueSource,
    /// Duration source (default: constant 0)
    pub duration: ValueSource,
    /// Optional subset applied before grouping and value resolution
    pub subset: Option<Filter>,
    /// Column supplying onsets (default: `onset`)
    pub onset_column: String,
}

impl ConditionSpec {
    /// Spec producing one condition from all (filtered) rows
    pub fn single(name: &str) -> Self {
        Self {
            condition: ConditionNames::Single(name.to_string()),
            group_column: None,
            amplitude: ValueSource::Constant(1.0),
            duration: ValueSource::Constant(0.0),
            subset: None,
            onset_column: "onset".to_string(),
        }
    }

    /// Spec partitioning rows by `column` into the given groups
    pub fn grouped(column: &str, groups: Vec<Group>) -> Self {
        Self {
            condition: ConditionNames::Grouped(groups),
            group_column: Some(column.to_string()),
            amplitude: ValueSource::Constant(1.0),
            duration: ValueSource::Constant(0.0),
            subset: None,
            onset_column: "onset".to_string(),
        }
    }

    /// Builder method: set the amplitude source
    pub fn with_amplitude(mut self, amplitude: ValueSource) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Builder method: set the duration source
    pub fn with_duration(mut self, duration: ValueSource) -> Self {
        self.duration = duration;
        self
    }

    /// Builder method: subset the table before extraction
    pub fn with_subset(mut self, subset: Filter) -> Self {
        self.subset = Some(subset);
        self
    }

    /// Builder method: take onsets from a different column
    pub fn with_onset_column(mut self, column: &str) -> Self {
        self.onset_column = column.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventRow;

    #[test]
    fn test_key_matching() {
        assert!(Key::from("go").matches(&CellValue::Text("go".to_string())));
        assert!(!Key::from("go").matches(&CellValue::Text("stop".to_string())));
        assert!(Key::from(900.0).matches(&CellValue::Number(900.0)));
        assert!(Key::from(true).matches(&CellValue::Bool(true)));
        // no cross-type matches, and nothing matches a missing cell
        assert!(!Key::from(1.0).matches(&CellValue::Bool(true)));
        assert!(!Key::from("go").matches(&CellValue::Missing));
    }

    #[test]
    fn test_filter_conjunction() {
        let row = EventRow::new(1.0, 2.0, false)
            .with("CTI", 900.0)
            .with("task_switch", "stay");

        let filter = Filter::new()
            .eq("CTI", 900.0)
            .eq("task_switch", "stay")
            .eq("junk", false);
        assert!(filter.matches(&row));

        let filter = Filter::new().eq("CTI", 100.0);
        assert!(!filter.matches(&row));
    }

    #[test]
    fn test_filter_ne_on_missing_cell() {
        // a row with no trial_type cell passes `trial_type != "feedback"`,
        // and fails the corresponding Eq
        let row = EventRow::new(1.0, 2.0, false);
        assert!(Filter::new().ne("trial_id", "feedback").matches(&row));
        assert!(!Filter::new().eq("trial_id", "feedback").matches(&row));
    }

    #[test]
    fn test_spec_defaults() {
        let spec = ConditionSpec::single("task");
        assert_eq!(spec.amplitude, ValueSource::Constant(1.0));
        assert_eq!(spec.duration, ValueSource::Constant(0.0));
        assert_eq!(spec.onset_column, "onset");
        assert!(spec.subset.is_none());
        assert!(spec.group_column.is_none());
    }

    #[test]
    fn test_grouped_builder_sets_column() {
        let spec = ConditionSpec::grouped(
            "trial_type",
            vec![Group::new("go", "go"), Group::new("stop_success", "stop_success")],
        );
        assert_eq!(spec.group_column.as_deref(), Some("trial_type"));
        match &spec.condition {
            ConditionNames::Grouped(groups) => assert_eq!(groups.len(), 2),
            _ => panic!("expected grouped form"),
        }
    }
}
