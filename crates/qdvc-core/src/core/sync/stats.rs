use std::fmt::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

/// Monotonic counter shared by the file workers of one run.
#[derive(Debug, Default)]
pub(crate) struct Counter(AtomicUsize);

impl Counter {
    pub(crate) fn incr(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

/// Final counts of a command run.
pub trait RunSummary: Serialize {
    /// One-line human summary: `Total files: N` followed by the non-zero categories.
    fn summary_line(&self) -> String;
    /// Whether the run recorded per-file failures.
    fn has_failures(&self) -> bool;
}

pub(crate) struct SummaryLine {
    line: String,
    listed: bool,
}

impl SummaryLine {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            line: format!("Total files: {total}"),
            listed: false,
        }
    }

    /// Appends `, <label>: <count>` unless the count is zero.
    pub(crate) fn field(mut self, label: &str, count: usize) -> Self {
        if count > 0 {
            let _ = write!(self.line, ", {label}: {count}");
            self.listed = true;
        }
        self
    }

    /// `Up to date` is only worth listing next to other categories.
    pub(crate) fn up_to_date(self, count: usize, total: usize) -> Self {
        if count < total {
            self.field("Up to date", count)
        } else {
            self
        }
    }

    /// Appends `, <note>` when no category was listed.
    pub(crate) fn or_note(mut self, note: &str) -> Self {
        if !self.listed {
            self.line.push_str(", ");
            self.line.push_str(note);
        }
        self
    }

    pub(crate) fn finish(self) -> String {
        self.line
    }
}
