// Label sheet PDF generation

use crate::error::AppError;
use crate::layout::{CellPosition, LABEL_HEIGHT_MM, LABEL_WIDTH_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::metrics::{text_width_mm, wrap_text, Face, PT_TO_MM};
use crate::roster::{Record, Roster};
use chrono::{DateTime, Local};
use printpdf::*;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// ============================================================================
// Constants
// ============================================================================

/// Font sizes in points
const CODE_FONT_SIZE: f32 = 14.0;
const COMMUNITY_FONT_SIZE: f32 = 7.5;
const NAME_FONT_SIZE: f32 = 10.5;

/// First baseline sits this far below the top edge of the label
const BASELINE_OFFSET_MM: f32 = 6.0;

/// Offsets below the first baseline, in points
const COMMUNITY_DROP_PT: f32 = 10.0;
const NAME_DROP_PT: f32 = 23.0;
const NAME_LEADING_PT: f32 = 11.0;

/// Horizontal room taken from the name column, in points
const NAME_PADDING_PT: f32 = 15.0;
const MAX_NAME_LINES: usize = 2;

// ============================================================================
// Output Location
// ============================================================================

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub path: PathBuf,
    pub pages: usize,
    pub labels: usize,
    pub cells: usize,
}

pub fn output_file_name(now: &DateTime<Local>) -> String {
    format!("etiquetas_{}.pdf", now.format("%Y%m%d_%H%M%S"))
}

/// Creates and removes a scratch file. Permission bits alone miss ACLs and
/// folders owned by other users.
fn is_writable_dir(dir: &Path) -> bool {
    let scratch = dir.join(format!(".etiquetas_{}.tmp", std::process::id()));
    match OpenOptions::new().write(true).create_new(true).open(&scratch) {
        Ok(_) => {
            if let Err(e) = fs::remove_file(&scratch) {
                warn!(path = %scratch.display(), error = %e, "could not remove scratch file");
            }
            true
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => true,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "output folder not writable");
            false
        }
    }
}

/// First writable directory among the candidates, falling back to the last one.
pub fn pick_output_dir(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|dir| is_writable_dir(dir))
        .or_else(|| candidates.last())
        .cloned()
}

/// Desktop, then documents, then the temp directory.
pub fn default_output_path() -> PathBuf {
    let mut candidates: Vec<PathBuf> = [dirs::desktop_dir(), dirs::document_dir()]
        .into_iter()
        .flatten()
        .collect();
    candidates.push(std::env::temp_dir());

    let dir = pick_output_dir(&candidates).unwrap_or_else(std::env::temp_dir);
    dir.join(output_file_name(&Local::now()))
}

// ============================================================================
// PDF Generation
// ============================================================================

pub fn generate_pdf(roster: &Roster, output_path: &Path) -> Result<RenderSummary, AppError> {
    if roster.is_empty() {
        return Err(AppError::EmptyRoster);
    }

    let (doc, pages) = build_document(roster)?;

    let file = File::create(output_path).map_err(|e| write_error(e, output_path))?;
    let mut writer = BufWriter::new(file);
    doc.save(&mut writer)
        .map_err(|e| AppError::PdfError(e.to_string()))?;

    let summary = RenderSummary {
        path: output_path.to_path_buf(),
        pages,
        labels: roster.iter().filter(|r| !r.is_blank()).count(),
        cells: roster.len(),
    };
    info!(
        path = %output_path.display(),
        pages = summary.pages,
        labels = summary.labels,
        "wrote label sheet"
    );
    Ok(summary)
}

fn write_error(err: std::io::Error, path: &Path) -> AppError {
    match err.kind() {
        ErrorKind::PermissionDenied => AppError::PermissionDenied(path.display().to_string()),
        _ => AppError::PdfError(format!("{}: {}", path.display(), err)),
    }
}

fn build_document(roster: &Roster) -> Result<(PdfDocumentReference, usize), AppError> {
    let (doc, page1, layer1) = PdfDocument::new(
        "Etiquetas",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );

    let font_regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| AppError::PdfError(e.to_string()))?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| AppError::PdfError(e.to_string()))?;

    let mut current_layer = doc.get_page(page1).get_layer(layer1);
    let mut current_page = 0;

    for (index, record) in roster.iter().enumerate() {
        let cell = CellPosition::of_index(index);

        // Pages are only added once a record needs one, so a full last sheet
        // does not leave a trailing empty page.
        if cell.page != current_page {
            let (new_page, new_layer) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            current_layer = doc.get_page(new_page).get_layer(new_layer);
            current_page = cell.page;
            debug!(page = current_page + 1, "started new page");
        }

        if record.is_blank() {
            continue;
        }
        draw_label(&current_layer, &font_regular, &font_bold, record, &cell);
    }

    Ok((doc, current_page + 1))
}

/// One positioned line of label text.
#[derive(Debug, Clone, PartialEq)]
struct TextLine {
    text: String,
    face: Face,
    size: f32,
    x: f32,
    y: f32,
}

fn centered(text: String, face: Face, size: f32, center_x: f32, y: f32) -> TextLine {
    let width = text_width_mm(&text, face, size);
    TextLine {
        text,
        face,
        size,
        x: center_x - width / 2.0,
        y,
    }
}

/// Code, community and up to two lines of name, centered in the cell.
fn label_lines(record: &Record, cell: &CellPosition) -> Vec<TextLine> {
    let (x, y) = cell.origin_mm();
    let center_x = x + LABEL_WIDTH_MM / 2.0;
    let baseline = y + LABEL_HEIGHT_MM - BASELINE_OFFSET_MM;

    let mut lines = vec![
        centered(
            format!("Nº {}", record.code),
            Face::Bold,
            CODE_FONT_SIZE,
            center_x,
            baseline,
        ),
        centered(
            record.community.clone(),
            Face::Regular,
            COMMUNITY_FONT_SIZE,
            center_x,
            baseline - COMMUNITY_DROP_PT * PT_TO_MM,
        ),
    ];

    let max_width = LABEL_WIDTH_MM - NAME_PADDING_PT * PT_TO_MM;
    let name_lines = wrap_text(&record.name, Face::Bold, NAME_FONT_SIZE, max_width);
    if name_lines.len() > MAX_NAME_LINES {
        warn!(name = %record.name, "name does not fit in two lines, truncating");
    }

    for (i, line) in name_lines.into_iter().take(MAX_NAME_LINES).enumerate() {
        let drop_pt = NAME_DROP_PT + i as f32 * NAME_LEADING_PT;
        lines.push(centered(
            line,
            Face::Bold,
            NAME_FONT_SIZE,
            center_x,
            baseline - drop_pt * PT_TO_MM,
        ));
    }

    lines
}

fn draw_label(
    layer: &PdfLayerReference,
    font_regular: &IndirectFontRef,
    font_bold: &IndirectFontRef,
    record: &Record,
    cell: &CellPosition,
) {
    for line in label_lines(record, cell) {
        let font = match line.face {
            Face::Regular => font_regular,
            Face::Bold => font_bold,
        };
        layer.use_text(&line.text, line.size, Mm(line.x), Mm(line.y), font);
    }
}
