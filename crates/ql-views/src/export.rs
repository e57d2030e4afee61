//! Table and chart export
//!
//! [`ExportAdapters`] is the capability interface the views call. The
//! `encode_*` functions produce artifact bytes and never touch the disk;
//! [`FileExporter`] writes them into a directory under fixed names.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::RgbImage;
use once_cell::sync::OnceCell;
use ql_core::events::events::ExportFinished;
use ql_core::{raw_text, EventBus, Record};
use ql_render::{ChartSpec, RasterRenderer, RenderError, ViewBounds};
use serde_json::Value;
use thiserror::Error;

use crate::tables::TableExport;

/// Errors raised by export adapters
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("cannot write {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV encoding failed: {0}")]
    Csv(String),

    #[error("spreadsheet encoding failed: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("PDF encoding failed: {0}")]
    Pdf(String),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("chart rendering failed: {0}")]
    Render(#[from] RenderError),
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Csv(err.to_string())
    }
}

/// Export artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportArtifact {
    TableCsv,
    TableSpreadsheet,
    TablePdf,
    ChartPng,
    ChartPdf,
}

impl ExportArtifact {
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportArtifact::TableCsv => "table.csv",
            ExportArtifact::TableSpreadsheet => "table.xlsx",
            ExportArtifact::TablePdf => "table.pdf",
            ExportArtifact::ChartPng => "chart.png",
            ExportArtifact::ChartPdf => "chart.pdf",
        }
    }
}

/// What an adapter did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written(PathBuf),
    /// Nothing to export; no file was touched
    Skipped,
}

/// A chart as currently displayed: windowed data plus the pan/zoom bounds
#[derive(Debug, Clone, Copy)]
pub struct ChartSnapshot<'a> {
    pub chart: &'a ChartSpec,
    pub bounds: Option<ViewBounds>,
}

/// Export capabilities offered to the views
pub trait ExportAdapters: Send + Sync {
    fn csv(&self, table: &TableExport<'_>) -> Result<ExportOutcome, ExportError>;

    fn spreadsheet(&self, table: &TableExport<'_>) -> Result<ExportOutcome, ExportError>;

    fn pdf_table(&self, table: &TableExport<'_>) -> Result<ExportOutcome, ExportError>;

    fn png_snapshot(&self, chart: &ChartSnapshot<'_>) -> Result<ExportOutcome, ExportError>;

    fn pdf_image(&self, chart: &ChartSnapshot<'_>) -> Result<ExportOutcome, ExportError>;
}

/// Run one adapter, log the result and announce it on the bus
pub fn run_export(
    events: &EventBus,
    artifact: ExportArtifact,
    export: impl FnOnce() -> Result<ExportOutcome, ExportError>,
) -> Result<ExportOutcome, ExportError> {
    let result = export();
    let (path, error) = match &result {
        Ok(ExportOutcome::Written(path)) => {
            tracing::info!("Exported {} to {:?}", artifact.file_name(), path);
            (Some(path.clone()), None)
        }
        Ok(ExportOutcome::Skipped) => {
            tracing::info!("Nothing to export for {}", artifact.file_name());
            (None, None)
        }
        Err(e) => {
            tracing::error!("Export of {} failed: {}", artifact.file_name(), e);
            (None, Some(e.to_string()))
        }
    };
    events.publish(ExportFinished {
        artifact: artifact.file_name().to_string(),
        path,
        error,
    });
    result
}

// A4 landscape, millimetres
const PAGE_WIDTH_MM: f32 = 297.0;
const PAGE_HEIGHT_MM: f32 = 210.0;
const PAGE_MARGIN_MM: f32 = 12.0;
const ROW_HEIGHT_MM: f32 = 6.0;
const TABLE_FONT_SIZE: f32 = 9.0;
/// Rough Helvetica glyph width at the table font size
const CHAR_WIDTH_MM: f32 = 1.7;

/// Body rows that fit on one PDF page below the header row
pub const PDF_ROWS_PER_PAGE: usize =
    ((PAGE_HEIGHT_MM - 2.0 * PAGE_MARGIN_MM) / ROW_HEIGHT_MM) as usize - 1;

/// Pages a table of `row_count` body rows needs
pub fn pdf_table_pages(row_count: usize) -> usize {
    row_count.div_ceil(PDF_ROWS_PER_PAGE).max(1)
}

/// Codec configuration built on first use
struct Codecs {
    csv: csv::WriterBuilder,
    header_format: rust_xlsxwriter::Format,
}

impl Codecs {
    fn new() -> Self {
        tracing::debug!("Initialising export codecs");
        let mut csv = csv::WriterBuilder::new();
        csv.quote_style(csv::QuoteStyle::Always);
        Self {
            csv,
            header_format: rust_xlsxwriter::Format::new().set_bold(),
        }
    }
}

static SHARED_CODECS: OnceCell<Codecs> = OnceCell::new();

fn codecs() -> &'static Codecs {
    SHARED_CODECS.get_or_init(Codecs::new)
}

/// UTF-8 CSV with a header row; every field is quoted
pub fn encode_csv(table: &TableExport<'_>) -> Result<Vec<u8>, ExportError> {
    let mut writer = codecs().csv.from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(table.columns.iter().map(|c| raw_text(row.get(*c))))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.to_string()))
}

fn sheet_index<T: TryFrom<usize>>(index: usize) -> Result<T, ExportError> {
    T::try_from(index).map_err(|_| {
        ExportError::Spreadsheet(rust_xlsxwriter::XlsxError::RowColumnLimitError)
    })
}

/// Workbook with one sheet named `Data`. Native numbers stay numbers, nulls
/// and missing cells stay blank, everything else is text.
pub fn encode_xlsx(table: &TableExport<'_>) -> Result<Vec<u8>, ExportError> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Data")?;

    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_string_with_format(0, sheet_index(col)?, *name, &codecs().header_format)?;
    }
    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num: u32 = sheet_index(row_idx + 1)?;
        for (col, name) in table.columns.iter().enumerate() {
            let col_num: u16 = sheet_index(col)?;
            match row.get(*name) {
                None | Some(Value::Null) => {}
                Some(Value::Number(n)) => match n.as_f64() {
                    Some(value) => {
                        sheet.write_number(row_num, col_num, value)?;
                    }
                    None => {
                        sheet.write_string(row_num, col_num, n.to_string())?;
                    }
                },
                Some(other) => {
                    sheet.write_string(row_num, col_num, raw_text(Some(other)))?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn fit_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    clipped.push('~');
    clipped
}

/// Landscape A4 document: header row plus body rows, as many pages as needed
pub fn encode_pdf_table(table: &TableExport<'_>) -> Result<Vec<u8>, ExportError> {
    use printpdf::{BuiltinFont, Mm, PdfDocument};

    let (doc, first_page, first_layer) =
        PdfDocument::new("table", Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    let column_width = (PAGE_WIDTH_MM - 2.0 * PAGE_MARGIN_MM) / table.columns.len().max(1) as f32;
    let max_chars = ((column_width / CHAR_WIDTH_MM) as usize).max(2);
    let top = PAGE_HEIGHT_MM - PAGE_MARGIN_MM;

    let body: &[&Record] = &table.rows;
    let pages = pdf_table_pages(body.len());
    for page in 0..pages {
        let layer = if page == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), format!("Page {}", page + 1));
            doc.get_page(page_idx).get_layer(layer_idx)
        };

        for (col, name) in table.columns.iter().enumerate() {
            let x = PAGE_MARGIN_MM + column_width * col as f32;
            layer.use_text(fit_text(name, max_chars), TABLE_FONT_SIZE, Mm(x), Mm(top), &bold);
        }

        let start = page * PDF_ROWS_PER_PAGE;
        let end = (start + PDF_ROWS_PER_PAGE).min(body.len());
        for (line, row) in body[start..end].iter().enumerate() {
            let y = top - ROW_HEIGHT_MM * (line + 1) as f32;
            for (col, name) in table.columns.iter().enumerate() {
                let x = PAGE_MARGIN_MM + column_width * col as f32;
                let text = fit_text(&raw_text(row.get(*name)), max_chars);
                layer.use_text(text, TABLE_FONT_SIZE, Mm(x), Mm(y), &regular);
            }
        }
    }

    doc.save_to_bytes().map_err(|e| ExportError::Pdf(e.to_string()))
}

/// PNG bytes of a raster snapshot
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}

/// Single-page document with the snapshot scaled to the page width
pub fn encode_pdf_image(image: &RgbImage) -> Result<Vec<u8>, ExportError> {
    use printpdf::image_crate::{DynamicImage, RgbImage as PdfRgbImage};
    use printpdf::{Image, ImageTransform, Mm, PdfDocument};

    const DPI: f32 = 300.0;
    let (width, height) = image.dimensions();
    let raw = PdfRgbImage::from_raw(width, height, image.as_raw().clone())
        .ok_or_else(|| ExportError::Pdf("snapshot buffer has the wrong size".to_string()))?;

    let (doc, page, layer) = PdfDocument::new("chart", Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let layer = doc.get_page(page).get_layer(layer);

    // Natural size at DPI, then fit inside the margins
    let natural_width_mm = width as f32 / DPI * 25.4;
    let natural_height_mm = height as f32 / DPI * 25.4;
    let scale = ((PAGE_WIDTH_MM - 2.0 * PAGE_MARGIN_MM) / natural_width_mm)
        .min((PAGE_HEIGHT_MM - 2.0 * PAGE_MARGIN_MM) / natural_height_mm);
    let translate_y = PAGE_HEIGHT_MM - PAGE_MARGIN_MM - natural_height_mm * scale;

    Image::from_dynamic_image(&DynamicImage::ImageRgb8(raw)).add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(PAGE_MARGIN_MM)),
            translate_y: Some(Mm(translate_y)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(DPI),
            ..Default::default()
        },
    );

    doc.save_to_bytes().map_err(|e| ExportError::Pdf(e.to_string()))
}

/// Writes export artifacts into one directory
#[derive(Debug, Clone)]
pub struct FileExporter {
    dir: PathBuf,
    snapshot_width: u32,
    snapshot_height: u32,
}

impl FileExporter {
    pub fn new(dir: impl Into<PathBuf>, snapshot_width: u32, snapshot_height: u32) -> Self {
        Self {
            dir: dir.into(),
            snapshot_width,
            snapshot_height,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, artifact: ExportArtifact, bytes: &[u8]) -> Result<ExportOutcome, ExportError> {
        let path = self.dir.join(artifact.file_name());
        std::fs::create_dir_all(&self.dir).map_err(|source| ExportError::Io {
            path: self.dir.clone(),
            source,
        })?;
        std::fs::write(&path, bytes).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(ExportOutcome::Written(path))
    }

    fn snapshot(&self, chart: &ChartSnapshot<'_>) -> Result<RgbImage, ExportError> {
        let mut renderer = RasterRenderer::with_bounds(chart.bounds);
        Ok(renderer.snapshot(chart.chart, self.snapshot_width, self.snapshot_height)?)
    }
}

impl ExportAdapters for FileExporter {
    fn csv(&self, table: &TableExport<'_>) -> Result<ExportOutcome, ExportError> {
        if table.is_empty() {
            return Ok(ExportOutcome::Skipped);
        }
        self.write(ExportArtifact::TableCsv, &encode_csv(table)?)
    }

    fn spreadsheet(&self, table: &TableExport<'_>) -> Result<ExportOutcome, ExportError> {
        if table.is_empty() {
            return Ok(ExportOutcome::Skipped);
        }
        self.write(ExportArtifact::TableSpreadsheet, &encode_xlsx(table)?)
    }

    fn pdf_table(&self, table: &TableExport<'_>) -> Result<ExportOutcome, ExportError> {
        if table.is_empty() {
            return Ok(ExportOutcome::Skipped);
        }
        self.write(ExportArtifact::TablePdf, &encode_pdf_table(table)?)
    }

    fn png_snapshot(&self, chart: &ChartSnapshot<'_>) -> Result<ExportOutcome, ExportError> {
        if !chart.chart.has_data() {
            return Ok(ExportOutcome::Skipped);
        }
        let image = self.snapshot(chart)?;
        self.write(ExportArtifact::ChartPng, &encode_png(&image)?)
    }

    fn pdf_image(&self, chart: &ChartSnapshot<'_>) -> Result<ExportOutcome, ExportError> {
        if !chart.chart.has_data() {
            return Ok(ExportOutcome::Skipped);
        }
        let image = self.snapshot(chart)?;
        self.write(ExportArtifact::ChartPdf, &encode_pdf_image(&image)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_core::{infer_columns, RenderContext, ValueFormatter};
    use ql_render::ChartKind;
    use serde_json::json;

    use crate::plots::{build_chart, derive_series, XAxis};
    use crate::tables::export_projection;

    fn rows() -> Vec<Record> {
        serde_json::from_value(json!([
            {"isim": "Ali, Veli", "tutar": 1234.5, "not": null},
            {"isim": "say \"hi\"\nnow", "tutar": -2, "not": true}
        ]))
        .unwrap()
    }

    #[test]
    fn test_csv_quotes_every_field() {
        let rows = rows();
        let columns = infer_columns(&rows);
        let table = export_projection(&rows, &columns, None, "");
        let text = String::from_utf8(encode_csv(&table).unwrap()).unwrap();

        let expected = "\"isim\",\"tutar\",\"not\"\n\
                        \"Ali, Veli\",\"1234.5\",\"null\"\n\
                        \"say \"\"hi\"\"\nnow\",\"-2\",\"true\"\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_binary_formats_have_signatures() {
        let rows = rows();
        let columns = infer_columns(&rows);
        let table = export_projection(&rows, &columns, None, "");

        assert!(encode_xlsx(&table).unwrap().starts_with(b"PK"));
        assert!(encode_pdf_table(&table).unwrap().starts_with(b"%PDF"));

        let image = RgbImage::from_pixel(4, 3, image::Rgb([10, 20, 30]));
        assert!(encode_png(&image).unwrap().starts_with(b"\x89PNG"));
        assert!(encode_pdf_image(&image).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_pdf_pagination() {
        assert_eq!(pdf_table_pages(0), 1);
        assert_eq!(pdf_table_pages(PDF_ROWS_PER_PAGE), 1);
        assert_eq!(pdf_table_pages(PDF_ROWS_PER_PAGE + 1), 2);
    }

    #[test]
    fn test_file_exporter_writes_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FileExporter::new(dir.path().join("out"), 120, 80);
        let rows = rows();
        let columns = infer_columns(&rows);

        let table = export_projection(&rows, &columns, None, "");
        let outcome = exporter.csv(&table).unwrap();
        assert_eq!(outcome, ExportOutcome::Written(dir.path().join("out").join("table.csv")));

        let nothing = export_projection(&rows, &columns, None, "no such text");
        assert_eq!(exporter.spreadsheet(&nothing).unwrap(), ExportOutcome::Skipped);
        assert!(!dir.path().join("out").join("table.xlsx").exists());
    }

    #[test]
    fn test_chart_exports() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FileExporter::new(dir.path(), 120, 80);
        let rows = rows();
        let ctx = RenderContext::default();
        let series = derive_series(&rows, Some("isim"), None);
        let axis = XAxis::from_batch(&rows, Some("isim"));
        let chart = build_chart(&series, ChartKind::Bar, 0..2, &axis, &ctx, &ValueFormatter::default()).unwrap();

        let snapshot = ChartSnapshot { chart: &chart, bounds: None };
        assert!(matches!(exporter.png_snapshot(&snapshot).unwrap(), ExportOutcome::Written(_)));
        assert!(matches!(exporter.pdf_image(&snapshot).unwrap(), ExportOutcome::Written(_)));

        let empty = build_chart(&series, ChartKind::Bar, 0..0, &axis, &ctx, &ValueFormatter::default()).unwrap();
        let empty_snapshot = ChartSnapshot { chart: &empty, bounds: None };
        assert_eq!(exporter.png_snapshot(&empty_snapshot).unwrap(), ExportOutcome::Skipped);
    }

    #[test]
    fn test_run_export_publishes_event() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let bus = EventBus::new();
        let skipped_csv = Arc::new(AtomicBool::new(false));
        let flag = skipped_csv.clone();
        bus.subscribe::<ExportFinished>(ql_core::handler_from_fn(move |event| {
            if let Some(done) = event.as_any().downcast_ref::<ExportFinished>() {
                flag.store(done.artifact == "table.csv" && done.path.is_none(), Ordering::SeqCst);
            }
        }));

        let outcome = run_export(&bus, ExportArtifact::TableCsv, || Ok(ExportOutcome::Skipped)).unwrap();
        assert_eq!(outcome, ExportOutcome::Skipped);
        assert!(skipped_csv.load(Ordering::SeqCst));
    }
}
