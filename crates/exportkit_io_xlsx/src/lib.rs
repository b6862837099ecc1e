//! `exportkit_io_xlsx` v1:
//! Rust-side XLSX sheet writer kernel for streamed exports.
//!
//! Architecture:
//! - `conf`   : constants and default presets
//! - `spec`   : specs/models/options/errors
//! - `util`   : pure helper functions
//! - `writer` : append-only multi-sheet writer
pub mod conf;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
pub use spec::{
    EnumCellValue, EnumHorizontalAlign, SpecCellFormat, SpecRowRun, SpecSheetColumn,
    SpecSheetLayout, SpecSheetSummary, SpecXlsxReport, SpecXlsxValuePolicy, SpecXlsxWriteOptions,
    XlsxSheetError,
};
pub use util::{
    convert_nan_inf_to_str, create_sheet_identifier, plan_row_runs, sanitize_sheet_name,
};
pub use writer::{SpecSheetHandle, XlsxSheetWriter};
