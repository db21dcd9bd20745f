/*!
 * Reporting functionality for treedump
 *
 * Renders duplicate reports as plain text, console tables (via tabled) or
 * JSON.
 */

use std::collections::BTreeMap;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::config::OutputFormat;
use crate::duplicates::{ParentCount, ParentSetCount};
use crate::error::Result;

/// Report generator for analysis results
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render per-parent duplicate counts
    pub fn parent_counts(&self, counts: &[ParentCount]) -> Result<String> {
        match self.format {
            OutputFormat::Plain => Ok(counts
                .iter()
                .map(|c| format!("{}={}", c.parent, c.count))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                #[derive(Tabled)]
                struct ParentRow {
                    #[tabled(rename = "Parent Directory")]
                    parent: String,

                    #[tabled(rename = "Duplicates")]
                    count: u64,
                }

                let rows = counts.iter().map(|c| ParentRow {
                    parent: c.parent.clone(),
                    count: c.count,
                });
                Ok(styled(Table::new(rows)))
            }
            OutputFormat::Json => Ok(serde_json::to_string_pretty(counts)?),
        }
    }

    /// Render duplicate-group counts per parent set
    pub fn parent_sets(&self, sets: &[ParentSetCount]) -> Result<String> {
        match self.format {
            OutputFormat::Plain => Ok(sets
                .iter()
                .map(|s| format!("{}\ncount: {}", s.parents.join("\n"), s.count))
                .collect::<Vec<_>>()
                .join("\n\n")),
            OutputFormat::Table => {
                #[derive(Tabled)]
                struct ParentSetRow {
                    #[tabled(rename = "Parent Directories")]
                    parents: String,

                    #[tabled(rename = "Duplicate Groups")]
                    count: u64,
                }

                let rows = sets.iter().map(|s| ParentSetRow {
                    parents: s.parents.join("\n"),
                    count: s.count,
                });
                Ok(styled(Table::new(rows)))
            }
            OutputFormat::Json => Ok(serde_json::to_string_pretty(sets)?),
        }
    }

    /// Render the traversal failure mapping
    pub fn failures(&self, failures: &BTreeMap<String, String>) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(failures)?),
            _ => Ok(failures
                .iter()
                .map(|(path, message)| format!("{}: {}", path, message))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }
}

// Shared table styling, matching the rest of the console output
fn styled(mut table: Table) -> String {
    table
        .with(Style::rounded())
        .with(Padding::new(1, 1, 0, 0))
        .with(Modify::new(Columns::new(..)).with(Alignment::left()));
    table.to_string()
}
