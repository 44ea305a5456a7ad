pub mod report;

use colored::Colorize;
use log::warn;
use serde::Serialize;

use crate::utils::{self, Cell};
use crate::view::{Frame, Row};

pub const TITLE: &str = "Kickstarter Projects";
pub const LOADING_MESSAGE: &str = "Loading projects...";
pub const EMPTY_MESSAGE: &str = "No projects found. The data source might be empty or inaccessible.";
pub const EMPTY_HINT: &str = "Please check the API endpoint or try again later.";
pub const HEADERS: [&str; 3] = ["S.No.", "Percentage Funded", "Amount Pledged"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// A table row with its cells already formatted.
#[derive(Clone, Debug, Serialize)]
pub struct RenderedRow {
    pub ordinal: usize,
    pub percentage_funded: String,
    pub amount_pledged: String,
    pub degraded: bool,
}

/// Formats one row. A value that cannot be formatted only affects its own
/// row: the cell falls back to the raw JSON text and the row is flagged.
pub fn render_row(row: &Row) -> RenderedRow {
    let percentage = utils::format_percentage(&row.percentage_funded);
    let amount = utils::format_amount(&row.amount_pledged);
    let degraded = percentage.is_invalid() || amount.is_invalid();
    if degraded {
        warn!(
            "row {}: could not format amount_pledged {}",
            row.ordinal,
            amount.text()
        );
    }
    RenderedRow {
        ordinal: row.ordinal,
        percentage_funded: percentage.text().to_string(),
        amount_pledged: match amount {
            Cell::Ok(s) => s,
            Cell::Invalid(raw) => format!("{raw} (!)"),
        },
        degraded,
    }
}

pub fn render(frame: &Frame, format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(frame).into_bytes(),
        OutputFormat::Json => render_json(frame),
        OutputFormat::Html => report::render_html(frame),
    }
}

pub fn render_json(frame: &Frame) -> Vec<u8> {
    let mut out =
        serde_json::to_vec_pretty(frame).unwrap_or_else(|_| b"{\"state\":\"empty\"}".to_vec());
    out.push(b'\n');
    out
}

pub fn render_text(frame: &Frame) -> String {
    match frame {
        Frame::Loading => format!("{}\n", LOADING_MESSAGE.dimmed()),
        Frame::Error { message, reason } => format!(
            "{} {}\n{}\n",
            "Error:".bold().red(),
            reason.red(),
            message
        ),
        Frame::Empty => format!("{}\n{}\n", EMPTY_MESSAGE.yellow(), EMPTY_HINT),
        Frame::Table {
            rows,
            page_numbers,
            current_page,
            ..
        } => {
            let rendered: Vec<RenderedRow> = rows.iter().map(render_row).collect();
            let mut out = String::new();
            out.push_str(&format!("{}\n\n", TITLE.bold()));
            out.push_str(&render_table(&rendered));
            if !page_numbers.is_empty() {
                out.push('\n');
                out.push_str(&render_selector(page_numbers, *current_page));
                out.push('\n');
            }
            out
        }
    }
}

fn render_table(rows: &[RenderedRow]) -> String {
    let mut widths = HEADERS.map(str::len);
    for r in rows {
        widths[0] = widths[0].max(r.ordinal.to_string().len());
        widths[1] = widths[1].max(r.percentage_funded.chars().count());
        widths[2] = widths[2].max(r.amount_pledged.chars().count());
    }

    let mut out = String::new();
    let header = format!(
        "{:>w0$}  {:>w1$}  {:>w2$}",
        HEADERS[0],
        HEADERS[1],
        HEADERS[2],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
    );
    out.push_str(&format!("{}\n", header.bold()));
    out.push_str(&format!(
        "{}\n",
        "-".repeat(widths.iter().sum::<usize>() + 4)
    ));
    for r in rows {
        let line = format!(
            "{:>w0$}  {:>w1$}  {:>w2$}",
            r.ordinal,
            r.percentage_funded,
            r.amount_pledged,
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        );
        if r.degraded {
            out.push_str(&format!("{}\n", line.yellow()));
        } else {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

fn render_selector(page_numbers: &[usize], current_page: usize) -> String {
    let buttons: Vec<String> = page_numbers
        .iter()
        .map(|&n| {
            if n == current_page {
                format!("[{n}]").bold().cyan().to_string()
            } else {
                format!(" {n} ")
            }
        })
        .collect();
    format!("Pages: {}", buttons.join(" "))
}
