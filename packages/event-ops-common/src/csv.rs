use crate::types::{Group, WinnerRecord};

/// Byte-order mark prepended to exports so spreadsheets pick UTF-8.
pub const BOM: char = '\u{feff}';

pub const WINNER_HEADER: [&str; 2] = ["name", "prize"];
pub const GROUP_HEADER: [&str; 2] = ["group", "name"];

/// Winner history as CSV, one row per record in the order given.
pub fn export_winners(winners: &[WinnerRecord]) -> String {
    let rows = winners
        .iter()
        .map(|w| [w.participant.name.as_str(), w.prize.as_str()]);
    render(WINNER_HEADER, rows)
}

/// One row per (group, member), groups in partition order.
pub fn export_groups(groups: &[Group]) -> String {
    let rows = groups.iter().flat_map(|g| {
        g.members
            .iter()
            .map(move |m| [g.name.as_str(), m.name.as_str()])
    });
    render(GROUP_HEADER, rows)
}

fn render<'a>(header: [&str; 2], rows: impl Iterator<Item = [&'a str; 2]>) -> String {
    let mut out = String::new();
    out.push(BOM);
    push_row(&mut out, &header);
    for row in rows {
        out.push('\n');
        push_row(&mut out, &row);
    }
    out
}

fn push_row(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    }
}

/// Parse CSV text into rows of fields.
///
/// Handles quoted fields with doubled quotes, `\n`, `\r\n` and bare `\r`
/// row breaks, and a leading BOM. Blank rows are dropped. Fields are not
/// trimmed.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
            }
            ',' => {
                row.push(std::mem::take(&mut field));
                quoted = false;
            }
            '\n' | '\r' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(std::mem::take(&mut field));
                quoted = false;
                finish_row(&mut rows, std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || quoted || !row.is_empty() {
        row.push(field);
        finish_row(&mut rows, row);
    }
    rows
}

fn finish_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    let blank = row.iter().all(|f| f.trim().is_empty());
    if !blank {
        rows.push(row);
    }
}
