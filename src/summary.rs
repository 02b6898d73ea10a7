//! Flat, path-numbered report of the leaf requests in an executed tree.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::collection::Collection;
use crate::message::Message;

/// Captured status of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Code(u16),
    /// The leaf was started but never captured a response.
    NotRun,
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Status::Code(code) => serializer.serialize_u16(*code),
            Status::NotRun => serializer.serialize_none(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Code(code) => write!(f, "{code}"),
            Status::NotRun => write!(f, "None"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    pub path: String,
    pub status: Status,
    pub name: String,
}

impl SummaryEntry {
    pub fn as_tuple(&self) -> (&str, Status, &str) {
        (&self.path, self.status, &self.name)
    }
}

/// Walks the children a collection started during its latest run, depth
/// first. Top level children are numbered "1", "2", ...; a leaf at index `j`
/// inside a nested collection at `P.i` gets `P.i.j`. Collections produce no
/// entry of their own and unstarted siblings are left out.
pub fn execute_summary<C>(collection: &Collection<C>) -> Vec<SummaryEntry> {
    let mut summary = Vec::new();
    collect(collection, "", &mut summary);
    summary
}

fn collect<C>(collection: &Collection<C>, level: &str, summary: &mut Vec<SummaryEntry>) {
    for (i, message) in collection.executed().iter().enumerate() {
        let path = if level.is_empty() {
            format!("{}", i + 1)
        } else {
            format!("{level}.{}", i + 1)
        };

        match message.as_collection() {
            Some(nested) => collect(nested, &path, summary),
            None => {
                let status = message
                    .response()
                    .map(|response| Status::Code(response.status_code()))
                    .unwrap_or(Status::NotRun);

                summary.push(SummaryEntry {
                    path,
                    status,
                    name: message.name().to_string(),
                });
            }
        }
    }
}

/// Renders entries as aligned `path  status  name` rows.
pub fn render_table(summary: &[SummaryEntry]) -> String {
    let path_width = summary.iter().map(|e| e.path.len()).max().unwrap_or(0);
    let status_width = summary
        .iter()
        .map(|e| e.status.to_string().len())
        .max()
        .unwrap_or(0);

    summary
        .iter()
        .map(|e| {
            format!(
                "{:<path_width$}  {:>status_width$}  {}\n",
                e.path,
                e.status.to_string(),
                e.name
            )
        })
        .collect()
}
