//! End-of-run reporting: one row per item plus aggregate counts.

use crate::state::{RunState, StatusCounts};

const TITLE_WIDTH: usize = 40;

/// One report row per item.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub key: String,
    pub title: String,
    pub status: String,
    pub artifacts: usize,
    pub selected: String,
    pub sources_tried: usize,
}

/// Tabular summary of a run, derived entirely from the persisted state.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub rows: Vec<ReportRow>,
    pub counts: StatusCounts,
}

impl RunReport {
    /// Build a report; rows follow the original catalog order.
    pub fn from_state(state: &RunState) -> Self {
        let mut items: Vec<_> = state.items.values().collect();
        items.sort_by_key(|item| item.ordinal);

        let rows = items
            .into_iter()
            .map(|item| ReportRow {
                key: item.key.clone(),
                title: truncate(&item.title, TITLE_WIDTH),
                status: item.status.to_string(),
                artifacts: item.found_artifacts.len(),
                selected: item
                    .selected_artifact
                    .clone()
                    .unwrap_or_else(|| "-".to_string()),
                sources_tried: item.sources_tried.len(),
            })
            .collect();

        Self {
            rows,
            counts: state.stats,
        }
    }

    /// Render as an aligned text table with a totals footer.
    pub fn render(&self) -> String {
        let key_width = self
            .rows
            .iter()
            .map(|r| r.key.len())
            .chain(std::iter::once("KEY".len()))
            .max()
            .unwrap_or(3);
        let title_width = self
            .rows
            .iter()
            .map(|r| r.title.len())
            .chain(std::iter::once("TITLE".len()))
            .max()
            .unwrap_or(5);

        let mut out = String::new();
        out.push_str(&format!(
            "{:key_width$}  {:title_width$}  {:9}  {:>9}  {:7}  {}\n",
            "KEY", "TITLE", "STATUS", "ARTIFACTS", "SOURCES", "SELECTED"
        ));
        for row in &self.rows {
            out.push_str(&format!(
                "{:key_width$}  {:title_width$}  {:9}  {:>9}  {:7}  {}\n",
                row.key, row.title, row.status, row.artifacts, row.sources_tried, row.selected
            ));
        }

        let c = &self.counts;
        out.push_str(&format!(
            "\ntotal {}: found {}, failed {}, pending {}, searching {}, skipped {}\n",
            c.total(),
            c.found,
            c.failed,
            c.pending,
            c.searching,
            c.skipped
        ));
        out
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
