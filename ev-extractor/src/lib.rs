//! EV Extraction Library
//!
//! A stateless, reusable library for converting per-trial behavioral event
//! logs from cognitive-task experiments into the explanatory-variable (EV)
//! structures a GLM design matrix is built from.
//!
//! # Architecture
//!
//! This library is intentionally minimal and focused on extraction:
//! - Loads a tab-delimited events file into a typed event table
//! - Evaluates declarative per-task condition rules against the table
//! - Accumulates named conditions with onsets, durations and amplitudes
//! - Validates the numeric invariants of the completed design output
//!
//! The library does NOT:
//! - Touch imaging data or fit GLMs
//! - Perform statistical estimation or inference
//! - Orchestrate multi-subject or multi-task runs
//!
//! Those concerns belong to the surrounding analysis pipeline, which
//! consumes the [`DesignOutput`] this library produces.
//!
//! # Example Usage
//!
//! ```no_run
//! use ev_extractor::{EventTable, Extractor, TaskId};
//! use std::path::Path;
//!
//! // Load one subject's events for one task
//! let table = EventTable::from_path(Path::new("sub-01_task-stopSignal_events.tsv")).unwrap();
//!
//! // Build the design, including the response-time regressor
//! let extractor = Extractor::new();
//! let design = extractor.build(&table, TaskId::StopSignal, true).unwrap();
//!
//! for (name, onsets) in design.conditions.iter().zip(&design.onsets) {
//!     println!("{}: {} onsets", name, onsets.len());
//! }
//! ```

// Public modules
pub mod design;
pub mod events;
pub mod extract;
pub mod extractor;
pub mod spec;
pub mod tasks;
pub mod types;

// Re-export main types for convenience
pub use design::DesignOutput;
pub use events::{CellValue, EventRow, EventTable};
pub use extract::ConditionExtractor;
pub use extractor::Extractor;
pub use spec::{ConditionNames, ConditionSpec, Filter, Group, Key, ValueSource};
pub use tasks::{RegistryStats, Rule, TaskId, TaskRegistry};
pub use types::{ExtractError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: ensure we can create an extractor with a populated registry
        let extractor = Extractor::new();
        let stats = extractor.registry_stats();
        assert_eq!(stats.num_tasks, TaskId::ALL.len());
    }
}
