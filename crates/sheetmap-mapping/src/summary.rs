//! Human-readable import outcome

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::engine::MappingOutput;

/// Counts of what one mapping run produced.
///
/// Rejections are grouped by reason and, where known, by offending header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub valid: usize,
    pub invalid: usize,
    pub snapshots: usize,
    /// reason -> header -> rows; rows without a header are keyed by ""
    pub rejections: BTreeMap<String, BTreeMap<String, usize>>,
}

impl ImportSummary {
    pub fn from_output(output: &MappingOutput) -> Self {
        let mut rejections: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        for row in &output.invalid_rows {
            *rejections
                .entry(row.reason.clone())
                .or_default()
                .entry(row.field.clone().unwrap_or_default())
                .or_default() += 1;
        }
        Self {
            valid: output.valid_data.len(),
            invalid: output.invalid_rows.len(),
            snapshots: output.secondary_data.len(),
            rejections,
        }
    }

    /// True when every non-blank row was accepted
    pub fn is_clean(&self) -> bool {
        self.invalid == 0
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} valid, {} invalid, {} snapshots",
            self.valid, self.invalid, self.snapshots
        )?;
        for (reason, by_field) in &self.rejections {
            for (field, count) in by_field {
                let rows = if *count == 1 { "row" } else { "rows" };
                if field.is_empty() {
                    write!(f, "\n  {} {}: {}", count, rows, reason)?;
                } else {
                    write!(f, "\n  {} {} {} {}", count, rows, reason, field)?;
                }
            }
        }
        Ok(())
    }
}
