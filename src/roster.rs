// Roster records and manual entry parsing

use crate::error::AppError;
use crate::layout::CELLS_PER_PAGE;
use std::num::{IntErrorKind, ParseIntError};
use tracing::debug;

/// One label on the sheet. All fields empty means the cell is skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub code: String,
    pub community: String,
}

impl Record {
    pub fn new(name: &str, code: &str, community: &str) -> Self {
        Record {
            name: name.to_string(),
            code: code.to_string(),
            community: community.to_string(),
        }
    }

    pub fn blank() -> Self {
        Record::default()
    }

    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.code.is_empty() && self.community.is_empty()
    }
}

/// Records in print order: left to right, top to bottom, page after page.
pub type Roster = Vec<Record>;

/// Highest position accepted in manual entry (one full sheet).
pub const MAX_MANUAL_POSITION: usize = CELLS_PER_PAGE;

struct ManualEntry {
    line: usize,
    position: usize,
    name: String,
    code: String,
}

/// Parses `position;name[;code]` lines into a roster where every entry sits
/// at index `position - 1`, with blank records filling the cells in between.
pub fn parse_manual(text: &str, community: &str) -> Result<Roster, AppError> {
    let mut entries: Vec<ManualEntry> = Vec::new();

    for (idx, line) in text.trim().lines().enumerate() {
        let line_number = idx + 1;
        let parts: Vec<&str> = line.split(';').map(str::trim).collect();

        if parts.len() < 2 {
            debug!(line = line_number, "skipping line without ';' separated fields");
            continue;
        }

        let out_of_range = || AppError::PositionOutOfRange {
            line: line_number,
            value: parts[0].to_string(),
            max: MAX_MANUAL_POSITION,
        };

        // Digits too large for i64 are still numbers, just far out of range.
        let position: i64 = parts[0].parse().map_err(|e: ParseIntError| match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => out_of_range(),
            _ => AppError::InvalidPosition {
                line: line_number,
                value: parts[0].to_string(),
            },
        })?;

        if position < 1 || position > MAX_MANUAL_POSITION as i64 {
            return Err(out_of_range());
        }
        let position = position as usize;

        if let Some(previous) = entries.iter().find(|e| e.position == position) {
            return Err(AppError::DuplicatePosition {
                line: line_number,
                position,
                first_line: previous.line,
            });
        }

        let name = parts[1].to_uppercase();
        if name.is_empty() {
            return Err(AppError::MissingName(line_number));
        }

        let code = parts.get(2).map(|c| c.to_string()).unwrap_or_default();

        entries.push(ManualEntry {
            line: line_number,
            position,
            name,
            code,
        });
    }

    if entries.is_empty() {
        return Err(AppError::NoValidEntries);
    }

    entries.sort_by_key(|e| e.position);

    let mut roster = Roster::with_capacity(entries[entries.len() - 1].position);
    for entry in entries {
        while roster.len() < entry.position - 1 {
            roster.push(Record::blank());
        }
        roster.push(Record::new(&entry.name, &entry.code, community));
    }

    Ok(roster)
}
