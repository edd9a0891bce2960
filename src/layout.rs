// Pimaco 3x11 sheet geometry

/// A4 dimensions in mm
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

/// Label size
pub const LABEL_WIDTH_MM: f32 = 63.5;
pub const LABEL_HEIGHT_MM: f32 = 25.4;

pub const COLUMNS: usize = 3;
pub const ROWS: usize = 11;
pub const CELLS_PER_PAGE: usize = COLUMNS * ROWS;

/// Margins and gutter. Rows touch each other, so there is no vertical gap.
pub const MARGIN_LEFT_MM: f32 = 8.0;
pub const MARGIN_TOP_MM: f32 = 9.0;
pub const SPACING_H_MM: f32 = 3.0;

/// Where a roster index lands on the printed sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPosition {
    pub page: usize,
    pub row: usize,
    pub column: usize,
}

impl CellPosition {
    pub fn of_index(index: usize) -> Self {
        CellPosition {
            page: index / CELLS_PER_PAGE,
            row: (index % CELLS_PER_PAGE) / COLUMNS,
            column: index % COLUMNS,
        }
    }

    /// Lower-left corner of the cell in mm, PDF coordinates (origin bottom-left).
    pub fn origin_mm(&self) -> (f32, f32) {
        let x = MARGIN_LEFT_MM + self.column as f32 * (LABEL_WIDTH_MM + SPACING_H_MM);
        let y = PAGE_HEIGHT_MM - MARGIN_TOP_MM - LABEL_HEIGHT_MM - self.row as f32 * LABEL_HEIGHT_MM;
        (x, y)
    }
}

pub fn page_count(cells: usize) -> usize {
    cells.div_ceil(CELLS_PER_PAGE)
}
