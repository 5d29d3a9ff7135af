use thiserror::Error;

use crate::csv::parse_rows;

/// Column headers that show up as the first "name" in exported rosters.
pub const HEADER_TOKENS: [&str; 2] = ["name", "姓名"];

/// Roster files are accepted only with these extensions.
pub const ROSTER_FILE_EXTENSIONS: [&str; 2] = [".txt", ".csv"];

pub const MAX_SAMPLE_PARTICIPANTS: u32 = 500;

const SAMPLE_NAMES: [&str; 20] = [
    "Avery", "Blake", "Casey", "Devon", "Emery", "Finley", "Gray", "Harper", "Indigo", "Jordan",
    "Kai", "Logan", "Morgan", "Noel", "Oakley", "Parker", "Quinn", "Riley", "Sage", "Taylor",
];

const SAMPLE_PRIZES: [(&str, u32); 4] = [
    ("Grand Prize: Laptop", 1),
    ("First Prize: Phone", 2),
    ("Second Prize: Tablet", 5),
    ("Participation Prize: Gift Card", 10),
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IngestError {
    #[error("unsupported file type: {file_name} (expected .txt or .csv)")]
    UnsupportedFileType { file_name: String },
}

/// Trim each name and drop the empty ones.
pub fn normalize_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

/// Names from pasted text, one per line. Blank lines and header tokens are
/// dropped.
pub fn parse_pasted_names(text: &str) -> Vec<String> {
    strip_headers(normalize_names(text.split('\n')))
}

/// Names from an uploaded roster file. Any run of newlines, carriage
/// returns, commas or semicolons separates names.
pub fn parse_roster_file(file_name: &str, content: &str) -> Result<Vec<String>, IngestError> {
    let lower = file_name.to_lowercase();
    if !ROSTER_FILE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return Err(IngestError::UnsupportedFileType {
            file_name: file_name.to_string(),
        });
    }
    let content = content.strip_prefix(crate::csv::BOM).unwrap_or(content);
    let tokens = content.split(|c| matches!(c, '\n' | '\r' | ',' | ';'));
    Ok(strip_headers(normalize_names(tokens)))
}

fn strip_headers(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .filter(|n| !HEADER_TOKENS.contains(&n.as_str()))
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrizeRow {
    pub name: String,
    pub quantity: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrizeImport {
    pub rows: Vec<PrizeRow>,
    /// Non-blank rows rejected for a missing name or a bad quantity
    pub skipped: u32,
}

/// Parse `name,quantity` rows. Rows need a non-blank name and a positive
/// integer quantity; anything else is counted as skipped. A header row such
/// as `name,quantity` is skipped by the same rule.
pub fn parse_prize_rows(text: &str) -> PrizeImport {
    let mut import = PrizeImport::default();
    for row in parse_rows(text) {
        let name = row.first().map(|f| f.trim()).unwrap_or_default();
        let quantity = row
            .get(1)
            .and_then(|f| f.trim().parse::<u32>().ok())
            .filter(|q| *q > 0);
        match quantity {
            Some(quantity) if !name.is_empty() => import.rows.push(PrizeRow {
                name: name.to_string(),
                quantity,
            }),
            _ => import.skipped += 1,
        }
    }
    import
}

/// Demo roster: cycles the sample list, suffixing ` 2`, ` 3`, ... once it
/// wraps. `count` is clamped to `1..=MAX_SAMPLE_PARTICIPANTS`.
pub fn sample_names(count: u32) -> Vec<String> {
    let count = count.clamp(1, MAX_SAMPLE_PARTICIPANTS) as usize;
    (0..count)
        .map(|i| {
            let base = SAMPLE_NAMES[i % SAMPLE_NAMES.len()];
            match i / SAMPLE_NAMES.len() {
                0 => base.to_string(),
                round => format!("{base} {}", round + 1),
            }
        })
        .collect()
}

/// Demo inventory rows.
pub fn sample_prizes() -> Vec<PrizeRow> {
    SAMPLE_PRIZES
        .iter()
        .map(|(name, quantity)| PrizeRow {
            name: name.to_string(),
            quantity: *quantity,
        })
        .collect()
}
