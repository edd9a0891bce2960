// Spreadsheet roster import

use crate::error::AppError;
use crate::roster::{Record, Roster};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, info};

/// Only this many leading rows are searched for the header.
pub const HEADER_SEARCH_ROWS: usize = 20;

const NAME_KEY: &str = "NOME";
const CODE_KEY: &str = "CÓDIGO";
const COMMUNITY_KEYS: [&str; 2] = ["COMUNIDADE", "CAPELA"];

/// Reads the first worksheet of `path` and normalizes it into a roster.
pub fn load_roster(path: &Path) -> Result<Roster, AppError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::SpreadsheetError(format!("{}: {}", path.display(), e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::SpreadsheetError(format!("{}: workbook has no sheets", path.display())))?
        .map_err(|e| AppError::SpreadsheetError(format!("{}: {}", path.display(), e)))?;

    // The range begins at the first used row, not at sheet row 1.
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    info!(path = %path.display(), first_row, rows = rows.len(), "read spreadsheet");
    normalize_rows(&rows, first_row)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

struct Columns {
    name: usize,
    code: usize,
    community: usize,
}

/// `first_row` is the sheet row of `rows[0]`; the window always ends at
/// sheet row `HEADER_SEARCH_ROWS`.
fn find_header_row(rows: &[Vec<String>], first_row: usize) -> Option<usize> {
    rows.iter()
        .take(HEADER_SEARCH_ROWS.saturating_sub(first_row))
        .position(|row| row.iter().any(|cell| cell.to_uppercase().contains(NAME_KEY)))
}

/// The rightmost matching column wins when several headers match a key.
fn locate_columns(header: &[String]) -> Result<Columns, AppError> {
    let mut name = None;
    let mut code = None;
    let mut community = None;

    for (idx, raw) in header.iter().enumerate() {
        let title = raw.trim().to_uppercase();
        if title.contains(NAME_KEY) {
            name = Some(idx);
        }
        if title.contains(CODE_KEY) {
            code = Some(idx);
        }
        if COMMUNITY_KEYS.iter().any(|key| title.contains(key)) {
            community = Some(idx);
        }
    }

    match (name, code, community) {
        (Some(name), Some(code), Some(community)) => Ok(Columns {
            name,
            code,
            community,
        }),
        _ => {
            let mut missing = Vec::new();
            if name.is_none() {
                missing.push(NAME_KEY);
            }
            if code.is_none() {
                missing.push(CODE_KEY);
            }
            if community.is_none() {
                missing.push("COMUNIDADE/CAPELA");
            }
            Err(AppError::MissingColumns(missing.join(", ")))
        }
    }
}

/// Spreadsheets store whole numbers as floats, so codes often come back as "1234.0".
pub fn normalize_code(raw: &str) -> String {
    raw.strip_suffix(".0").unwrap_or(raw).to_string()
}

/// Turns a grid of cell texts into a roster, using the first row that
/// mentions `NOME` as header. `first_row` is the sheet row `rows[0]` came from.
pub fn normalize_rows(rows: &[Vec<String>], first_row: usize) -> Result<Roster, AppError> {
    let header_idx =
        find_header_row(rows, first_row).ok_or(AppError::HeaderNotFound(HEADER_SEARCH_ROWS))?;
    let columns = locate_columns(&rows[header_idx])?;
    debug!(
        header_row = header_idx,
        name = columns.name,
        code = columns.code,
        community = columns.community,
        "located roster columns"
    );

    let field = |row: &Vec<String>, idx: usize| row.get(idx).cloned().unwrap_or_default();

    let mut roster: Roster = rows[header_idx + 1..]
        .iter()
        .map(|row| Record {
            name: field(row, columns.name).to_uppercase(),
            code: normalize_code(&field(row, columns.code)),
            community: field(row, columns.community).to_uppercase(),
        })
        .collect();

    while roster.last().is_some_and(Record::is_blank) {
        roster.pop();
    }

    Ok(roster)
}
