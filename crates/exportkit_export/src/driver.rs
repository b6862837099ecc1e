//! Paged export driver: page source -> normalized rows -> rolling sheets.

use std::path::Path;

use exportkit_io_xlsx::{
    EnumCellValue, SpecSheetHandle, SpecXlsxWriteOptions, XlsxSheetWriter, create_sheet_identifier,
    plan_row_runs,
};
use log::{debug, info};

use crate::conf::N_PAGE_INDEX_FIRST;
use crate::schema::extract_export_model;
use crate::spec::{
    ExportError, ExportRecord, FixedSheet, PageSource, SpecDriverOptions, SpecExportModelDescriptor,
    SpecExportModelSchema, SpecExportReport, SpecExtractOptions, SpecLocaleContext,
    SpecNormalizeOptions, SpecPageRequest,
};
use crate::util::derive_row_cells;

/// Secondary dataset plus its independently extracted schema.
pub struct SpecFixedSheet<'a> {
    pub schema: &'a SpecExportModelSchema,
    pub rows: &'a dyn FixedSheet,
}

/// Sheet currently receiving rows, plus how many rollover parts exist.
struct SpecSheetCursor {
    handle: SpecSheetHandle,
    n_part: usize,
}

/// Open the next sheet of `schema`: the first one under the schema's sheet
/// name, rollovers as `<name>-2`, `<name>-3`, ...
fn open_sheet_part(
    writer: &mut XlsxSheetWriter,
    schema: &SpecExportModelSchema,
    n_part: usize,
) -> Result<SpecSheetHandle, ExportError> {
    let c_sheet_name = if n_part == 1 {
        schema.sheet_name.clone()
    } else {
        create_sheet_identifier(&schema.sheet_name, n_part)
    };
    Ok(writer.new_sheet(&c_sheet_name, &schema.to_sheet_layout())?)
}

/// Write `l_rows` so that no sheet reaches the ceiling, rolling over to a
/// fresh sheet when needed. Returns the rows written.
fn write_rows_with_rollover(
    writer: &mut XlsxSheetWriter,
    schema: &SpecExportModelSchema,
    cursor: &mut SpecSheetCursor,
    l_rows: &[Vec<EnumCellValue>],
    n_rows_sheet_ceiling: usize,
    l_sheet_names: &mut Vec<String>,
) -> Result<usize, ExportError> {
    let l_runs = plan_row_runs(
        writer.rows_written(cursor.handle)?,
        l_rows.len(),
        writer.rows_header(cursor.handle)?,
        n_rows_sheet_ceiling,
    )
    .map_err(ExportError::Configuration)?;

    for run in l_runs {
        if run.if_new_sheet {
            cursor.n_part += 1;
            cursor.handle = open_sheet_part(writer, schema, cursor.n_part)?;
            l_sheet_names.push(writer.sheet_name(cursor.handle)?.to_string());
            info!(
                "task {:?}: ceiling {n_rows_sheet_ceiling} reached, rolled over to sheet {:?}",
                schema.task_type,
                writer.sheet_name(cursor.handle)?
            );
        }
        writer.write_rows(
            cursor.handle,
            &l_rows[run.row_start_inclusive..run.row_end_exclusive],
        )?;
    }
    Ok(l_rows.len())
}

/// Write a secondary fixed dataset as one extra sheet (no paging, no rollover).
pub fn write_fixed_sheet(
    writer: &mut XlsxSheetWriter,
    secondary: SpecFixedSheet<'_>,
    normalize: &SpecNormalizeOptions,
) -> Result<SpecSheetHandle, ExportError> {
    let SpecFixedSheet { schema, rows } = secondary;
    let handle = writer.new_sheet(&schema.sheet_name, &schema.to_sheet_layout())?;
    let l_rows: Vec<Vec<EnumCellValue>> = (0..rows.len())
        .map(|n_idx_row| {
            derive_row_cells(
                schema,
                |field_name| rows.field_value(n_idx_row, field_name),
                normalize,
            )
        })
        .collect();
    writer.write_rows(handle, &l_rows)?;
    Ok(handle)
}

/// Page through `source` and write every row into `writer`.
///
/// Pages are fetched from index 1 with a fixed page size and no count query.
/// Fetching stops at the first empty page or at the first page shorter than
/// the page size. A non-empty `secondary` dataset is written as an extra
/// sheet afterwards. Any error aborts the whole export.
pub fn run_paged_export<T: ExportRecord>(
    schema: &SpecExportModelSchema,
    source: &mut dyn PageSource<T>,
    secondary: Option<SpecFixedSheet<'_>>,
    writer: &mut XlsxSheetWriter,
    options: &SpecDriverOptions,
) -> Result<SpecExportReport, ExportError> {
    if options.page_size == 0 {
        return Err(ExportError::Configuration(
            "page_size must be >= 1.".to_string(),
        ));
    }

    let mut report = SpecExportReport::default();
    let mut cursor = SpecSheetCursor {
        handle: open_sheet_part(writer, schema, 1)?,
        n_part: 1,
    };
    report
        .sheets
        .push(writer.sheet_name(cursor.handle)?.to_string());

    let mut request = SpecPageRequest {
        page_index: N_PAGE_INDEX_FIRST,
        page_size: options.page_size,
        if_search_count: false,
    };

    loop {
        let page = source.page(&request)?;
        report.n_pages_fetched += 1;
        let n_rows_page = page.rows.len();
        debug!(
            "task {:?}: fetched page {} with {n_rows_page} rows",
            schema.task_type, request.page_index
        );

        let l_rows: Vec<Vec<EnumCellValue>> = page
            .rows
            .iter()
            .map(|record| {
                derive_row_cells(
                    schema,
                    |field_name| record.field_value(field_name),
                    &options.normalize,
                )
            })
            .collect();
        report.n_rows_written += write_rows_with_rollover(
            writer,
            schema,
            &mut cursor,
            &l_rows,
            options.n_rows_sheet_ceiling,
            &mut report.sheets,
        )?;

        if n_rows_page == 0 || n_rows_page < request.page_size {
            break;
        }
        request.page_index += 1;
    }

    if let Some(secondary) = secondary.filter(|val| !val.rows.is_empty()) {
        let handle = write_fixed_sheet(writer, secondary, &options.normalize)?;
        report.sheets.push(writer.sheet_name(handle)?.to_string());
    }

    info!(
        "task {:?}: exported {} rows in {} pages across {} sheets",
        schema.task_type,
        report.n_rows_written,
        report.n_pages_fetched,
        report.sheets.len()
    );
    Ok(report)
}

/// Write an import template: remark row, header row and the example row.
pub fn export_template(
    descriptor: &SpecExportModelDescriptor,
    path_file_out: &Path,
    ctx_locale: &SpecLocaleContext,
    extract: &SpecExtractOptions,
    write_options: SpecXlsxWriteOptions,
) -> Result<SpecExportModelSchema, ExportError> {
    let extract = SpecExtractOptions {
        if_include_examples: true,
        ..extract.clone()
    };
    let schema = extract_export_model(descriptor, &extract, ctx_locale)?;

    let mut writer = XlsxSheetWriter::open(path_file_out, write_options);
    let handle = writer.new_sheet(&schema.sheet_name, &schema.to_sheet_layout())?;
    if let Some(l_example) = schema.example_row()
        && l_example.iter().any(|val| !val.is_empty())
    {
        let l_row: Vec<EnumCellValue> = l_example
            .into_iter()
            .map(|val| {
                if val.is_empty() {
                    EnumCellValue::None
                } else {
                    EnumCellValue::String(val)
                }
            })
            .collect();
        writer.write_rows(handle, &[l_row])?;
    }
    writer.finish()?;

    info!(
        "task {:?}: wrote import template {}",
        schema.task_type,
        path_file_out.display()
    );
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use calamine::{Data, Reader, open_workbook_auto};

    use super::*;
    use crate::spec::SpecPageResult;
    use crate::testing::{
        Employee, VecPageSource, derive_departments, derive_employees, init_logger,
    };

    fn derive_schema<T: ExportRecord>() -> SpecExportModelSchema {
        extract_export_model(
            &T::descriptor(),
            &SpecExtractOptions::default(),
            &SpecLocaleContext::new("en-US"),
        )
        .unwrap()
    }

    #[test]
    fn test_short_last_page_stops_after_four_fetches() {
        init_logger();
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("out.xlsx");

        let schema = derive_schema::<Employee>();
        let mut source = VecPageSource::new(derive_employees(1620));
        let mut writer = XlsxSheetWriter::open(&path_out, SpecXlsxWriteOptions::default());

        let report = run_paged_export(
            &schema,
            &mut source,
            None,
            &mut writer,
            &SpecDriverOptions::default(),
        )
        .unwrap();
        writer.finish().unwrap();

        assert_eq!(source.calls().load(Ordering::SeqCst), 4);
        assert_eq!(report.n_pages_fetched, 4);
        assert_eq!(report.n_rows_written, 1620);
        assert_eq!(report.sheets, vec!["Employees".to_string()]);

        let l_page_indices: Vec<usize> =
            source.requests().iter().map(|req| req.page_index).collect();
        assert_eq!(l_page_indices, vec![1, 2, 3, 4]);
        assert!(source.requests().iter().all(|req| req.page_size == 500));
        assert!(source.requests().iter().all(|req| !req.if_search_count));
    }

    #[test]
    fn test_exact_multiple_of_page_size_ends_on_empty_page() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("out.xlsx");

        let schema = derive_schema::<Employee>();
        let mut source = VecPageSource::new(derive_employees(20));
        let mut writer = XlsxSheetWriter::open(&path_out, SpecXlsxWriteOptions::default());
        let options = SpecDriverOptions {
            page_size: 10,
            ..Default::default()
        };

        let report = run_paged_export(&schema, &mut source, None, &mut writer, &options).unwrap();
        assert_eq!(report.n_pages_fetched, 3);
        assert_eq!(report.n_rows_written, 20);
    }

    #[test]
    fn test_ceiling_rolls_over_and_no_sheet_reaches_it() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("out.xlsx");

        let schema = derive_schema::<Employee>();
        let mut source = VecPageSource::new(derive_employees(25));
        let mut writer = XlsxSheetWriter::open(&path_out, SpecXlsxWriteOptions::default());
        let options = SpecDriverOptions {
            page_size: 7,
            n_rows_sheet_ceiling: 10,
            ..Default::default()
        };

        let report = run_paged_export(&schema, &mut source, None, &mut writer, &options).unwrap();
        let report_xlsx = writer.finish().unwrap();

        assert_eq!(
            report.sheets,
            vec![
                "Employees".to_string(),
                "Employees-2".to_string(),
                "Employees-3".to_string(),
                "Employees-4".to_string(),
            ]
        );
        assert_eq!(report_xlsx.n_rows_data(), 25);
        assert!(
            report_xlsx
                .sheets
                .iter()
                .all(|sheet| sheet.n_rows_header + sheet.n_rows_data < 10)
        );

        // Rollover sheets carry the header too.
        let mut workbook = open_workbook_auto(&path_out).unwrap();
        let range = workbook.worksheet_range("Employees-3").unwrap();
        assert_eq!(
            range.get_value((0, 0)),
            Some(&Data::String("Employee No.".to_string()))
        );
        assert_eq!(range.height(), 1 + 8);
    }

    #[test]
    fn test_row_that_would_reach_ceiling_opens_next_sheet() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("out.xlsx");

        let schema = derive_schema::<Employee>();
        let mut source = VecPageSource::new(derive_employees(9));
        let mut writer = XlsxSheetWriter::open(&path_out, SpecXlsxWriteOptions::default());
        let options = SpecDriverOptions {
            page_size: 20,
            n_rows_sheet_ceiling: 10,
            ..Default::default()
        };

        let report = run_paged_export(&schema, &mut source, None, &mut writer, &options).unwrap();
        assert_eq!(
            report.sheets,
            vec!["Employees".to_string(), "Employees-2".to_string()]
        );
        assert_eq!(writer.n_sheets(), 2);

        let report_xlsx = writer.finish().unwrap();
        let l_rows_incl_header: Vec<usize> = report_xlsx
            .sheets
            .iter()
            .map(|sheet| sheet.n_rows_header + sheet.n_rows_data)
            .collect();
        assert_eq!(l_rows_incl_header, vec![9, 2]);
    }

    #[test]
    fn test_blank_sheet_name_rolls_over_to_fallback_name() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("out.xlsx");

        let mut schema = derive_schema::<Employee>();
        schema.sheet_name = String::new();
        let mut source = VecPageSource::new(derive_employees(12));
        let mut writer = XlsxSheetWriter::open(&path_out, SpecXlsxWriteOptions::default());
        let options = SpecDriverOptions {
            page_size: 20,
            n_rows_sheet_ceiling: 10,
            ..Default::default()
        };

        let report = run_paged_export(&schema, &mut source, None, &mut writer, &options).unwrap();
        assert_eq!(
            report.sheets,
            vec!["Sheet".to_string(), "Sheet-2".to_string()]
        );
        assert_eq!(writer.file_out(), path_out.as_path());
        writer.finish().unwrap();
    }

    #[test]
    fn test_rows_round_trip_as_normalized_values() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("out.xlsx");

        let schema = derive_schema::<Employee>();
        let l_employees = derive_employees(3);
        let mut source = VecPageSource::new(l_employees.clone());
        let mut writer = XlsxSheetWriter::open(&path_out, SpecXlsxWriteOptions::default());
        run_paged_export(
            &schema,
            &mut source,
            None,
            &mut writer,
            &SpecDriverOptions::default(),
        )
        .unwrap();
        writer.finish().unwrap();

        let mut workbook = open_workbook_auto(&path_out).unwrap();
        let range = workbook.worksheet_range("Employees").unwrap();
        let l_rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();
        assert_eq!(l_rows.len(), 4);

        assert_eq!(l_rows[1][0], Data::Float(100_000.0));
        assert_eq!(l_rows[1][1], Data::String("Employee 0".to_string()));
        assert_eq!(l_rows[1][2], Data::Empty);
        assert_eq!(l_rows[2][2], Data::String("D1".to_string()));
        assert_eq!(l_rows[3][3], Data::Float(1002.0));
        assert_eq!(l_rows[3][4], Data::String("2020-01-15".to_string()));
    }

    #[test]
    fn test_secondary_sheet_written_after_paged_data() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("out.xlsx");

        let schema = derive_schema::<Employee>();
        let l_departments = derive_departments();
        let schema_secondary = derive_schema::<crate::testing::Department>();
        let mut source = VecPageSource::new(derive_employees(2));
        let mut writer = XlsxSheetWriter::open(&path_out, SpecXlsxWriteOptions::default());

        let report = run_paged_export(
            &schema,
            &mut source,
            Some(SpecFixedSheet {
                schema: &schema_secondary,
                rows: &l_departments,
            }),
            &mut writer,
            &SpecDriverOptions::default(),
        )
        .unwrap();
        writer.finish().unwrap();

        assert_eq!(
            report.sheets,
            vec!["Employees".to_string(), "Departments".to_string()]
        );
        let mut workbook = open_workbook_auto(&path_out).unwrap();
        let range = workbook.worksheet_range("Departments").unwrap();
        assert_eq!(range.get_value((2, 1)), Some(&Data::String("Sales".to_string())));
    }

    #[test]
    fn test_empty_source_writes_header_only() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("out.xlsx");

        let schema = derive_schema::<Employee>();
        let mut source = VecPageSource::<Employee>::new(Vec::new());
        let mut writer = XlsxSheetWriter::open(&path_out, SpecXlsxWriteOptions::default());
        let report = run_paged_export(
            &schema,
            &mut source,
            None,
            &mut writer,
            &SpecDriverOptions::default(),
        )
        .unwrap();

        assert_eq!(report.n_pages_fetched, 1);
        assert_eq!(report.n_rows_written, 0);
        assert_eq!(report.sheets.len(), 1);
    }

    #[test]
    fn test_source_error_and_zero_page_size_abort() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("out.xlsx");
        let schema = derive_schema::<Employee>();

        let mut source = VecPageSource::new(derive_employees(30)).with_failure_on_page(2);
        let mut writer = XlsxSheetWriter::open(&path_out, SpecXlsxWriteOptions::default());
        let options = SpecDriverOptions {
            page_size: 10,
            ..Default::default()
        };
        let err = run_paged_export(&schema, &mut source, None, &mut writer, &options).unwrap_err();
        assert!(matches!(err, ExportError::DataSource(_)));

        let mut source = crate::spec::PageSourceFn(|_: &SpecPageRequest| {
            Ok::<_, ExportError>(SpecPageResult::<Employee>::new(Vec::new()))
        });
        let options = SpecDriverOptions {
            page_size: 0,
            ..Default::default()
        };
        let err = run_paged_export(&schema, &mut source, None, &mut writer, &options).unwrap_err();
        assert!(matches!(err, ExportError::Configuration(_)));
    }

    #[test]
    fn test_export_template_writes_remark_header_and_example() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let path_out = dir_tmp.path().join("template.xlsx");

        let schema = export_template(
            &Employee::descriptor(),
            &path_out,
            &SpecLocaleContext::new("en-US"),
            &SpecExtractOptions::default(),
            SpecXlsxWriteOptions::default(),
        )
        .unwrap();
        assert_eq!(schema.remark.as_deref(), Some("One employee per row."));

        let mut workbook = open_workbook_auto(&path_out).unwrap();
        let range = workbook.worksheet_range("Employees").unwrap();
        assert_eq!(
            range.get_value((0, 0)),
            Some(&Data::String("One employee per row.".to_string()))
        );
        assert_eq!(
            range.get_value((1, 0)),
            Some(&Data::String("Employee No.".to_string()))
        );
        assert_eq!(
            range.get_value((2, 0)),
            Some(&Data::String("100234".to_string()))
        );
    }
}
