//! Append-only multi-sheet XLSX writer used by streamed exports.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::debug;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, N_WIDTH_COLUMN_DEFAULT,
};
use crate::spec::{
    EnumCellValue, SpecCellFormat, SpecSheetLayout, SpecSheetSummary, SpecXlsxReport,
    SpecXlsxValuePolicy, SpecXlsxWriteOptions, XlsxSheetError,
};
use crate::util::{convert_nan_inf_to_str, sanitize_sheet_name};

/// Opaque reference to a sheet opened by [`XlsxSheetWriter::new_sheet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecSheetHandle(usize);

struct SpecSheetState {
    sheet_name: String,
    idx_worksheet: usize,
    n_cols: usize,
    n_rows_header: usize,
    n_rows_next: usize,
    content_row_height: Option<f64>,
    l_fmt_data_by_col: Vec<Format>,
}

/// Stateful workbook writer.
///
/// Sheets are opened on demand and rows are appended strictly in order, which
/// keeps constant-memory worksheets valid. The workbook is saved by
/// [`Self::finish`].
pub struct XlsxSheetWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    write_options: SpecXlsxWriteOptions,
    set_sheet_names_existing: BTreeSet<String>,
    l_sheets: Vec<SpecSheetState>,
    if_closed: bool,
}

impl XlsxSheetWriter {
    /// Create writer bound to output path and write options.
    pub fn open(path_file_out: impl AsRef<Path>, write_options: SpecXlsxWriteOptions) -> Self {
        Self {
            path_file_out: path_file_out.as_ref().to_path_buf(),
            workbook: Workbook::new(),
            write_options,
            set_sheet_names_existing: BTreeSet::new(),
            l_sheets: Vec::new(),
            if_closed: false,
        }
    }

    /// Return output file path.
    pub fn file_out(&self) -> &Path {
        &self.path_file_out
    }

    /// Open a new sheet: widths, remark row, header row and frozen panes.
    ///
    /// The requested name is sanitized and deduplicated, so the returned
    /// handle may refer to a sheet with a different name (see [`Self::sheet_name`]).
    pub fn new_sheet(
        &mut self,
        sheet_name: &str,
        layout: &SpecSheetLayout,
    ) -> Result<SpecSheetHandle, XlsxSheetError> {
        if self.if_closed {
            return Err(XlsxSheetError::Closed);
        }
        let n_cols = layout.columns.len();
        if n_cols > N_NCOLS_EXCEL_MAX {
            return Err(XlsxSheetError::InvalidLayout(format!(
                "{n_cols} columns exceed the Excel limit of {N_NCOLS_EXCEL_MAX}."
            )));
        }

        let sheet_name_unique =
            self.derive_unique_sheet_name(&sanitize_sheet_name(sheet_name, "_"));
        let idx_worksheet = self.l_sheets.len();

        let fmt_header = derive_rust_xlsx_format(&self.write_options.fmt_header);
        let fmt_remark = derive_rust_xlsx_format(&self.write_options.fmt_remark);
        let l_fmt_data_by_col: Vec<Format> = layout
            .columns
            .iter()
            .map(|col| {
                let fmt_align_patch = SpecCellFormat {
                    align: col.align.as_format_str().map(ToString::to_string),
                    ..Default::default()
                };
                derive_rust_xlsx_format(&self.write_options.fmt_text.merge(&fmt_align_patch))
            })
            .collect();

        let worksheet = if self.write_options.if_constant_memory {
            self.workbook.add_worksheet_with_constant_memory()
        } else {
            self.workbook.add_worksheet()
        };
        worksheet.set_name(&sheet_name_unique)?;

        for (n_idx_col, col) in layout.columns.iter().enumerate() {
            worksheet.set_column_width(
                cast_col_num(n_idx_col)?,
                col.width.unwrap_or(N_WIDTH_COLUMN_DEFAULT),
            )?;
        }

        let mut n_row_cursor = 0usize;
        if let Some(c_remark) = layout.remark.as_deref().filter(|val| !val.trim().is_empty()) {
            if let Some(n_height) = layout.remark_row_height {
                worksheet.set_row_height(cast_row_num(n_row_cursor)?, n_height)?;
            }
            write_remark(worksheet, n_row_cursor, n_cols, c_remark, &fmt_remark)?;
            n_row_cursor += 1;
        }

        if n_cols > 0 {
            if let Some(n_height) = layout.title_row_height {
                worksheet.set_row_height(cast_row_num(n_row_cursor)?, n_height)?;
            }
            for (n_idx_col, col) in layout.columns.iter().enumerate() {
                worksheet.write_string_with_format(
                    cast_row_num(n_row_cursor)?,
                    cast_col_num(n_idx_col)?,
                    &col.header,
                    &fmt_header,
                )?;
            }
            n_row_cursor += 1;
        }

        if self.write_options.if_freeze_header && n_row_cursor > 0 {
            worksheet.set_freeze_panes(cast_row_num(n_row_cursor)?, 0)?;
        }

        debug!(
            "opened sheet {sheet_name_unique:?} with {n_cols} columns, {n_row_cursor} header rows"
        );

        self.l_sheets.push(SpecSheetState {
            sheet_name: sheet_name_unique,
            idx_worksheet,
            n_cols,
            n_rows_header: n_row_cursor,
            n_rows_next: n_row_cursor,
            content_row_height: layout.content_row_height,
            l_fmt_data_by_col,
        });
        Ok(SpecSheetHandle(idx_worksheet))
    }

    /// Append rows after the last written row of `handle`.
    ///
    /// An empty slice is a no-op.
    pub fn write_rows(
        &mut self,
        handle: SpecSheetHandle,
        rows: &[Vec<EnumCellValue>],
    ) -> Result<(), XlsxSheetError> {
        if self.if_closed {
            return Err(XlsxSheetError::Closed);
        }
        if rows.is_empty() {
            return Ok(());
        }

        let sheet_state = self
            .l_sheets
            .get_mut(handle.0)
            .ok_or(XlsxSheetError::UnknownSheet(handle.0))?;

        let n_rows_after = sheet_state.n_rows_next + rows.len();
        if n_rows_after > N_NROWS_EXCEL_MAX {
            return Err(XlsxSheetError::RowLimitExceeded {
                sheet_name: sheet_state.sheet_name.clone(),
                n_rows: n_rows_after,
                n_rows_max: N_NROWS_EXCEL_MAX,
            });
        }
        if let Some(row) = rows.iter().find(|row| row.len() > sheet_state.n_cols) {
            return Err(XlsxSheetError::RowWidthMismatch {
                sheet_name: sheet_state.sheet_name.clone(),
                n_cells: row.len(),
                n_cols: sheet_state.n_cols,
            });
        }

        let worksheet = self.workbook.worksheet_from_index(sheet_state.idx_worksheet)?;
        let value_policy = &self.write_options.value_policy;

        for row in rows {
            let n_idx_row = sheet_state.n_rows_next;
            if let Some(n_height) = sheet_state.content_row_height {
                worksheet.set_row_height(cast_row_num(n_idx_row)?, n_height)?;
            }
            for (n_idx_col, value) in row.iter().enumerate() {
                write_cell_with_format(
                    worksheet,
                    n_idx_row,
                    n_idx_col,
                    value,
                    &sheet_state.l_fmt_data_by_col[n_idx_col],
                    value_policy,
                )?;
            }
            sheet_state.n_rows_next += 1;
        }

        Ok(())
    }

    /// Rows occupied on the sheet, header rows included.
    pub fn rows_written(&self, handle: SpecSheetHandle) -> Result<usize, XlsxSheetError> {
        self.sheet_state(handle).map(|state| state.n_rows_next)
    }

    /// Rows occupied by the remark and header of the sheet.
    pub fn rows_header(&self, handle: SpecSheetHandle) -> Result<usize, XlsxSheetError> {
        self.sheet_state(handle).map(|state| state.n_rows_header)
    }

    /// Actual (sanitized, deduplicated) sheet name.
    pub fn sheet_name(&self, handle: SpecSheetHandle) -> Result<&str, XlsxSheetError> {
        self.sheet_state(handle).map(|state| state.sheet_name.as_str())
    }

    /// Number of sheets opened so far.
    pub fn n_sheets(&self) -> usize {
        self.l_sheets.len()
    }

    /// Return a snapshot of the sheets written so far.
    pub fn report(&self) -> SpecXlsxReport {
        SpecXlsxReport {
            sheets: self
                .l_sheets
                .iter()
                .map(|state| SpecSheetSummary {
                    sheet_name: state.sheet_name.clone(),
                    n_rows_header: state.n_rows_header,
                    n_rows_data: state.n_rows_next - state.n_rows_header,
                })
                .collect(),
            warnings: Vec::new(),
        }
    }

    /// Flush workbook to disk. Idempotent.
    pub fn finish(&mut self) -> Result<SpecXlsxReport, XlsxSheetError> {
        let mut report = self.report();
        if self.if_closed {
            return Ok(report);
        }
        if self.l_sheets.is_empty() {
            // A workbook needs at least one worksheet to be valid.
            let c_sheet_name = self.derive_unique_sheet_name(&sanitize_sheet_name("", "_"));
            self.workbook.add_worksheet().set_name(&c_sheet_name)?;
            report.warn("No sheet was opened; wrote an empty placeholder sheet.");
        }
        self.workbook.save(&self.path_file_out)?;
        self.if_closed = true;
        Ok(report)
    }

    fn sheet_state(&self, handle: SpecSheetHandle) -> Result<&SpecSheetState, XlsxSheetError> {
        self.l_sheets
            .get(handle.0)
            .ok_or(XlsxSheetError::UnknownSheet(handle.0))
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        // Excel compares sheet names case-insensitively.
        let c_key = name.to_lowercase();
        if !self.set_sheet_names_existing.contains(&c_key) {
            self.set_sheet_names_existing.insert(c_key);
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            let c_candidate_key = candidate.to_lowercase();
            if !self.set_sheet_names_existing.contains(&c_candidate_key) {
                self.set_sheet_names_existing.insert(c_candidate_key);
                return candidate;
            }
            n_idx += 1;
        }
    }
}

fn write_remark(
    worksheet: &mut Worksheet,
    row_idx: usize,
    n_cols: usize,
    text: &str,
    fmt_remark: &Format,
) -> Result<(), XlsxSheetError> {
    if n_cols > 1 {
        worksheet.merge_range(
            cast_row_num(row_idx)?,
            0,
            cast_row_num(row_idx)?,
            cast_col_num(n_cols - 1)?,
            text,
            fmt_remark,
        )?;
    } else {
        worksheet.write_string_with_format(cast_row_num(row_idx)?, 0, text, fmt_remark)?;
    }
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
    value_policy: &SpecXlsxValuePolicy,
) -> Result<(), XlsxSheetError> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        EnumCellValue::Number(val) => {
            if val.is_finite() {
                worksheet.write_number_with_format(n_row, n_col, *val, format)?;
            } else {
                let c_val = convert_nan_inf_to_str(*val, value_policy)
                    .unwrap_or_else(|_| value_policy.nan_str.clone());
                worksheet.write_string_with_format(n_row, n_col, c_val, format)?;
            }
        }
        EnumCellValue::Boolean(val) => {
            worksheet.write_boolean_with_format(n_row, n_col, *val, format)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, XlsxSheetError> {
    u32::try_from(value)
        .map_err(|_| XlsxSheetError::IndexOverflow(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, XlsxSheetError> {
    u16::try_from(value)
        .map_err(|_| XlsxSheetError::IndexOverflow(format!("column index overflow: {value}")))
}

#[cfg(test)]
mod tests {
    use calamine::{Data, Reader, open_workbook_auto};

    use super::*;
    use crate::spec::{EnumHorizontalAlign, SpecSheetColumn};

    fn derive_layout(l_headers: &[&str]) -> SpecSheetLayout {
        SpecSheetLayout {
            columns: l_headers
                .iter()
                .map(|header| SpecSheetColumn {
                    header: header.to_string(),
                    width: Some(12.0),
                    align: EnumHorizontalAlign::General,
                })
                .collect(),
            title_row_height: Some(24.0),
            content_row_height: Some(18.0),
            remark: None,
            remark_row_height: None,
        }
    }

    #[test]
    fn test_write_rows_round_trips_through_calamine() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("people.xlsx");

        let mut writer = XlsxSheetWriter::open(&path_out, SpecXlsxWriteOptions::default());
        let handle = writer
            .new_sheet("People", &derive_layout(&["Name", "Age", "Active"]))
            .unwrap();
        writer
            .write_rows(
                handle,
                &[
                    vec![
                        EnumCellValue::String("Ada".to_string()),
                        EnumCellValue::Number(36.0),
                        EnumCellValue::Boolean(true),
                    ],
                    vec![
                        EnumCellValue::String("Bob".to_string()),
                        EnumCellValue::None,
                        EnumCellValue::Boolean(false),
                    ],
                ],
            )
            .unwrap();
        assert_eq!(writer.rows_written(handle).unwrap(), 3);

        let report = writer.finish().unwrap();
        assert_eq!(report.sheets.len(), 1);
        assert_eq!(report.n_rows_data(), 2);

        let mut workbook = open_workbook_auto(&path_out).unwrap();
        let range = workbook.worksheet_range("People").unwrap();
        let l_rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();

        assert_eq!(l_rows.len(), 3);
        assert_eq!(l_rows[0][0], Data::String("Name".to_string()));
        assert_eq!(l_rows[1][0], Data::String("Ada".to_string()));
        assert_eq!(l_rows[1][1], Data::Float(36.0));
        assert_eq!(l_rows[1][2], Data::Bool(true));
        assert_eq!(l_rows[2][1], Data::Empty);
        assert_eq!(l_rows[2][2], Data::Bool(false));
    }

    #[test]
    fn test_new_sheet_deduplicates_and_sanitizes_names() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("names.xlsx");

        let mut writer = XlsxSheetWriter::open(&path_out, SpecXlsxWriteOptions::default());
        let layout = derive_layout(&["A"]);
        let handle_1 = writer.new_sheet("Data/2024", &layout).unwrap();
        let handle_2 = writer.new_sheet("data_2024", &layout).unwrap();

        assert_eq!(writer.sheet_name(handle_1).unwrap(), "Data_2024");
        assert_eq!(writer.sheet_name(handle_2).unwrap(), "data_2024__2");
        writer.finish().unwrap();

        let workbook = open_workbook_auto(&path_out).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec!["Data_2024".to_string(), "data_2024__2".to_string()]
        );
    }

    #[test]
    fn test_remark_row_sits_above_header() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("template.xlsx");

        let mut layout = derive_layout(&["Id", "Name"]);
        layout.remark = Some("Fill one employee per row.".to_string());
        layout.remark_row_height = Some(60.0);

        let mut writer = XlsxSheetWriter::open(&path_out, SpecXlsxWriteOptions::default());
        let handle = writer.new_sheet("Template", &layout).unwrap();
        assert_eq!(writer.rows_header(handle).unwrap(), 2);
        writer.finish().unwrap();

        let mut workbook = open_workbook_auto(&path_out).unwrap();
        let range = workbook.worksheet_range("Template").unwrap();
        assert_eq!(
            range.get_value((0, 0)),
            Some(&Data::String("Fill one employee per row.".to_string()))
        );
        assert_eq!(range.get_value((1, 1)), Some(&Data::String("Name".to_string())));
    }

    #[test]
    fn test_non_finite_numbers_are_written_as_policy_text() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("nan.xlsx");

        let mut writer = XlsxSheetWriter::open(&path_out, SpecXlsxWriteOptions::default());
        let handle = writer.new_sheet("S", &derive_layout(&["X", "Y"])).unwrap();
        writer
            .write_rows(
                handle,
                &[vec![
                    EnumCellValue::Number(f64::NAN),
                    EnumCellValue::Number(f64::NEG_INFINITY),
                ]],
            )
            .unwrap();
        writer.finish().unwrap();

        let mut workbook = open_workbook_auto(&path_out).unwrap();
        let range = workbook.worksheet_range("S").unwrap();
        assert_eq!(range.get_value((1, 0)), Some(&Data::String("NaN".to_string())));
        assert_eq!(range.get_value((1, 1)), Some(&Data::String("-Inf".to_string())));
    }

    #[test]
    fn test_write_rows_rejects_wide_rows_unknown_handles_and_closed_writer() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("errors.xlsx");

        let mut writer = XlsxSheetWriter::open(&path_out, SpecXlsxWriteOptions::default());
        let handle = writer.new_sheet("S", &derive_layout(&["X"])).unwrap();

        let err = writer
            .write_rows(
                handle,
                &[vec![EnumCellValue::None, EnumCellValue::None]],
            )
            .unwrap_err();
        assert!(matches!(err, XlsxSheetError::RowWidthMismatch { n_cells: 2, .. }));

        let err = writer
            .write_rows(SpecSheetHandle(7), &[vec![EnumCellValue::None]])
            .unwrap_err();
        assert!(matches!(err, XlsxSheetError::UnknownSheet(7)));

        writer.finish().unwrap();
        writer.finish().unwrap();
        let err = writer
            .write_rows(handle, &[vec![EnumCellValue::None]])
            .unwrap_err();
        assert!(matches!(err, XlsxSheetError::Closed));
    }

    #[test]
    fn test_finish_without_sheets_writes_placeholder() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("empty.xlsx");

        let mut writer = XlsxSheetWriter::open(&path_out, SpecXlsxWriteOptions::default());
        let report = writer.finish().unwrap();
        assert!(report.sheets.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(path_out.exists());
    }
}
