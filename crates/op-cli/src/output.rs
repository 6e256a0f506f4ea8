use std::collections::BTreeMap;

use op_panels::{PanelError, PplRequest};
use op_query::ClauseMatch;
use serde::Serialize;
use tabled::{Table, Tabled};

#[derive(Debug, Tabled, Serialize)]
pub struct ClauseRow {
    pub kind: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl From<ClauseMatch> for ClauseRow {
    fn from(m: ClauseMatch) -> Self {
        Self {
            kind: m.kind.to_string(),
            start: m.span.start,
            end: m.span.end,
            text: m.text,
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct RequestRow {
    pub visualization: String,
    pub status: String,
    pub detail: String,
}

pub fn request_rows(requests: &BTreeMap<String, Result<PplRequest, PanelError>>) -> Vec<RequestRow> {
    requests
        .iter()
        .map(|(id, result)| match result {
            Ok(req) => RequestRow {
                visualization: id.clone(),
                status: "ok".to_string(),
                detail: req.query.clone(),
            },
            Err(e) => RequestRow {
                visualization: id.clone(),
                status: "error".to_string(),
                detail: e.to_string(),
            },
        })
        .collect()
}

/// Print `rows` as a table, or as pretty JSON with `json`.
pub fn print_rows<T: Tabled + Serialize>(rows: &[T], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
    } else if rows.is_empty() {
        println!("No items found");
    } else {
        println!("{}", Table::new(rows));
    }
    Ok(())
}
