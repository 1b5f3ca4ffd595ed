use devdash_core::types::ChatMessage;
use devdash_core::workflow::Severity;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Left-aligned columns separated by two spaces, with a dashed rule under
/// the header.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    for line in format_table(headers, rows) {
        println!("{line}");
    }
}

fn format_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(format_row(headers.iter().copied(), &widths));
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push(rule.join("  "));
    for row in rows {
        out.push(format_row(row.iter().map(String::as_str), &widths));
    }
    out
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(c, &w)| format!("{c:w$}"))
        .collect();
    padded.join("  ").trim_end().to_string()
}

/// One log line with its severity shown as a fixed-width label.
pub fn format_log(line: &str) -> String {
    let label = Severity::of(line).map(Severity::label).unwrap_or_default();
    format!("  log {label:<7} {line}")
}

pub fn format_chat(msg: &ChatMessage) -> String {
    let mut lines = msg.text.lines();
    let first = lines.next().unwrap_or_default();
    let mut out = format!("{:>4}> {first}", msg.sender.to_string());
    for rest in lines {
        out.push_str("\n      ");
        out.push_str(rest);
    }
    out
}
