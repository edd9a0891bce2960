use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to read spreadsheet: {0}")]
    SpreadsheetError(String),
    #[error("Header row containing 'NOME' not found in the first {0} rows")]
    HeaderNotFound(usize),
    #[error("Required columns not found: {0}")]
    MissingColumns(String),
    #[error("Line {line}: position must be a number (got '{value}')")]
    InvalidPosition { line: usize, value: String },
    #[error("Line {line}: position must be between 1 and {max} (got {value})")]
    PositionOutOfRange { line: usize, value: String, max: usize },
    #[error("Line {line}: position {position} already used on line {first_line}")]
    DuplicatePosition {
        line: usize,
        position: usize,
        first_line: usize,
    },
    #[error("Line {0}: name is required")]
    MissingName(usize),
    #[error("No valid lines found")]
    NoValidEntries,
    #[error("Nothing to print: the roster is empty")]
    EmptyRoster,
    #[error("Permission denied saving the PDF to {0}. Close any open PDF viewer using the file or choose another folder.")]
    PermissionDenied(String),
    #[error("Error generating PDF: {0}")]
    PdfError(String),
    #[error("Community name must not be empty")]
    EmptyCommunityName,
    #[error("Community already exists: {0}")]
    CommunityExists(String),
    #[error("Community not found: {0}")]
    CommunityNotFound(String),
    #[error("Failed to read community list: {0}")]
    RegistryError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
