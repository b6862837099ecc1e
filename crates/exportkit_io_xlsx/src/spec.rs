//! Shared XLSX specification models.

use rust_xlsxwriter::XlsxError;
use thiserror::Error;

use crate::conf::{EnumFmtKey, derive_default_xlsx_formats};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

/// Horizontal alignment declared for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumHorizontalAlign {
    /// No explicit alignment; the format preset decides.
    #[default]
    General,
    /// Left aligned.
    Left,
    /// Centered.
    Center,
    /// Right aligned.
    Right,
}

impl EnumHorizontalAlign {
    /// Format-preset keyword, `None` for [`EnumHorizontalAlign::General`].
    pub fn as_format_str(&self) -> Option<&'static str> {
        match self {
            Self::General => None,
            Self::Left => Some("left"),
            Self::Center => Some("center"),
            Self::Right => Some("right"),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValues

/// Normalized cell value handed to the writer.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
}

/// Replacement text for non-finite numbers, which Excel cannot store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxValuePolicy {
    /// Replacement text for NaN.
    pub nan_str: String,
    /// Replacement text for positive infinity.
    pub posinf_str: String,
    /// Replacement text for negative infinity.
    pub neginf_str: String,
}

impl Default for SpecXlsxValuePolicy {
    fn default() -> Self {
        Self {
            nan_str: "NaN".to_string(),
            posinf_str: "Inf".to_string(),
            neginf_str: "-Inf".to_string(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetLayout

/// One output column: header text plus width/alignment policy.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheetColumn {
    /// Header cell text.
    pub header: String,
    /// Column width in character units; writer default when `None`.
    pub width: Option<f64>,
    /// Horizontal alignment of body cells.
    pub align: EnumHorizontalAlign,
}

/// Everything the writer needs to open a sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetLayout {
    /// Columns in output order.
    pub columns: Vec<SpecSheetColumn>,
    /// Header row height in points.
    pub title_row_height: Option<f64>,
    /// Body row height in points.
    pub content_row_height: Option<f64>,
    /// Optional instructions row written above the header (merged across columns).
    pub remark: Option<String>,
    /// Remark row height in points.
    pub remark_row_height: Option<f64>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Writer-wide options controlling formats and encoder mode.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecXlsxWriteOptions {
    /// Base body cell format; per-column alignment is merged on top.
    pub fmt_text: SpecCellFormat,
    /// Header cell format.
    pub fmt_header: SpecCellFormat,
    /// Remark cell format.
    pub fmt_remark: SpecCellFormat,
    /// Non-finite number replacement policy.
    pub value_policy: SpecXlsxValuePolicy,
    /// Stream rows to disk instead of buffering whole sheets in memory.
    pub if_constant_memory: bool,
    /// Freeze panes below the header rows.
    pub if_freeze_header: bool,
}

impl Default for SpecXlsxWriteOptions {
    fn default() -> Self {
        let mut dict_fmt = derive_default_xlsx_formats();
        Self {
            fmt_text: dict_fmt.remove(&EnumFmtKey::Text).unwrap_or_default(),
            fmt_header: dict_fmt.remove(&EnumFmtKey::Header).unwrap_or_default(),
            fmt_remark: dict_fmt.remove(&EnumFmtKey::Remark).unwrap_or_default(),
            value_policy: SpecXlsxValuePolicy::default(),
            if_constant_memory: true,
            if_freeze_header: true,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RowPlanning

/// Contiguous run of incoming rows that lands on one sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRowRun {
    /// Open a fresh rollover sheet before writing this run.
    pub if_new_sheet: bool,
    /// Inclusive start index into the incoming rows.
    pub row_start_inclusive: usize,
    /// Exclusive end index into the incoming rows.
    pub row_end_exclusive: usize,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Final shape of one written sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetSummary {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Rows occupied by remark + header.
    pub n_rows_header: usize,
    /// Body rows written.
    pub n_rows_data: usize,
}

/// Whole-workbook report returned by `finish`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheets in workbook order.
    pub sheets: Vec<SpecSheetSummary>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Total body rows across sheets.
    pub fn n_rows_data(&self) -> usize {
        self.sheets.iter().map(|sheet| sheet.n_rows_data).sum()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Writer failures.
#[derive(Debug, Error)]
pub enum XlsxSheetError {
    /// Encoder rejected an operation.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),
    /// Write attempted after `finish()`.
    #[error("Cannot write after finish().")]
    Closed,
    /// Handle does not belong to this writer.
    #[error("Unknown sheet handle: {0}")]
    UnknownSheet(usize),
    /// Row/column index does not fit the encoder's index types.
    #[error("{0}")]
    IndexOverflow(String),
    /// Layout cannot be represented in a worksheet.
    #[error("Invalid sheet layout: {0}")]
    InvalidLayout(String),
    /// Row wider than the sheet's declared columns.
    #[error("Row has {n_cells} cells but sheet {sheet_name:?} declares {n_cols} columns.")]
    RowWidthMismatch {
        /// Target sheet.
        sheet_name: String,
        /// Cells in the offending row.
        n_cells: usize,
        /// Declared columns.
        n_cols: usize,
    },
    /// Write would exceed the Excel row limit.
    #[error("Sheet {sheet_name:?} would grow to {n_rows} rows; Excel allows at most {n_rows_max}.")]
    RowLimitExceeded {
        /// Target sheet.
        sheet_name: String,
        /// Row count after the rejected write.
        n_rows: usize,
        /// Hard limit.
        n_rows_max: usize,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
