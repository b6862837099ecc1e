//! Field model extraction: descriptor + locale -> ordered export schema.

use chrono::Local;
use exportkit_io_xlsx::EnumHorizontalAlign;
use log::warn;

use crate::conf::{
    C_FILE_EXTENSION_XLSX, C_FILE_NAME_TIMESTAMP_FORMAT, C_FILE_NAME_UNNAMED_PREFIX,
    C_FILE_NAME_UNNAMED_PREFIX_ZH,
};
use crate::spec::{
    ExportError, SpecColumnSchema, SpecExportModelDescriptor, SpecExportModelSchema,
    SpecExtractOptions, SpecFieldDescriptor, SpecLocaleContext,
};
use crate::util::{derive_localized_text, is_employee_id_field};

/// Fields that make it into the export, sorted by display index.
///
/// Fields without export metadata are dropped. A non-empty exclude list wins
/// over the include list. The sort is stable, so equal indices keep
/// declaration order.
pub fn select_sorted_fields<'a>(
    descriptor: &'a SpecExportModelDescriptor,
    options: &SpecExtractOptions,
) -> Vec<&'a SpecFieldDescriptor> {
    let if_exclude = !options.fields_exclude.is_empty();
    let if_include = !if_exclude && !options.fields_include.is_empty();
    if if_exclude && !options.fields_include.is_empty() {
        warn!(
            "task {:?}: both exclude and include field lists given; include list ignored",
            descriptor.task_type
        );
    }

    let mut l_fields: Vec<&SpecFieldDescriptor> = descriptor
        .fields
        .iter()
        .filter(|field| field.column.is_some())
        .filter(|field| !(if_exclude && options.fields_exclude.contains(&field.field_name)))
        .filter(|field| !if_include || options.fields_include.contains(&field.field_name))
        .collect();

    l_fields.sort_by_key(|field| field.column.as_ref().map_or(i32::MAX, |col| col.index));
    l_fields
}

/// Workbook file name: localized file name, else sheet name, else a
/// generated `unnamed-<timestamp>` (`未命名-<timestamp>` under a `zh` locale);
/// `.xlsx` appended when there is no extension.
pub fn derive_file_name(c_file_name: &str, c_sheet_name: &str, locale: &str) -> String {
    let mut c_name = if !c_file_name.is_empty() {
        c_file_name.to_string()
    } else if !c_sheet_name.is_empty() {
        c_sheet_name.to_string()
    } else {
        let c_primary = locale.trim().split(['-', '_']).next().unwrap_or_default();
        let c_prefix = if c_primary.eq_ignore_ascii_case("zh") {
            C_FILE_NAME_UNNAMED_PREFIX_ZH
        } else {
            C_FILE_NAME_UNNAMED_PREFIX
        };
        format!(
            "{c_prefix}{}",
            Local::now().format(C_FILE_NAME_TIMESTAMP_FORMAT)
        )
    };
    if !c_name.contains('.') {
        c_name.push_str(C_FILE_EXTENSION_XLSX);
    }
    c_name
}

/// Build the immutable export schema of `descriptor` for one export.
pub fn extract_export_model(
    descriptor: &SpecExportModelDescriptor,
    options: &SpecExtractOptions,
    ctx_locale: &SpecLocaleContext,
) -> Result<SpecExportModelSchema, ExportError> {
    if descriptor.task_type.trim().is_empty() {
        return Err(ExportError::Configuration(
            "The task type cannot be empty.".to_string(),
        ));
    }

    let l_fields = select_sorted_fields(descriptor, options);

    let mut l_columns = Vec::with_capacity(l_fields.len());
    let mut content_row_height = None;
    for (n_idx_field, field) in l_fields.iter().enumerate() {
        let Some(col) = field.column.as_ref() else {
            continue;
        };
        if n_idx_field == 0 {
            content_row_height = col.row_height;
        }

        let mut c_header = derive_localized_text(&col.title, ctx_locale);
        if c_header.is_empty() {
            c_header = field.field_name.clone();
        }

        let align = if col.align == EnumHorizontalAlign::General
            && is_employee_id_field(&field.field_name, &options.fields_employee_id)
        {
            EnumHorizontalAlign::Left
        } else {
            col.align
        };

        l_columns.push(SpecColumnSchema {
            field_name: field.field_name.clone(),
            field_type: field.field_type,
            header: c_header,
            width: col.width.unwrap_or(descriptor.width),
            align,
            date_format: col.date_format.clone().filter(|val| !val.trim().is_empty()),
            index: col.index,
            example: options
                .if_include_examples
                .then(|| derive_localized_text(&col.example, ctx_locale)),
        });
    }

    let c_sheet_name = derive_localized_text(&descriptor.sheet_name, ctx_locale);
    let c_locale_active = if ctx_locale.locale.trim().is_empty() {
        &ctx_locale.base_locale
    } else {
        &ctx_locale.locale
    };
    let c_file_name = derive_file_name(
        &derive_localized_text(&descriptor.file_name, ctx_locale),
        &c_sheet_name,
        c_locale_active,
    );

    let (remark, remark_row_height) = if options.if_include_examples {
        let c_remark = derive_localized_text(&descriptor.remark, ctx_locale);
        (
            (!c_remark.is_empty()).then_some(c_remark),
            descriptor.remark_row_height,
        )
    } else {
        (None, None)
    };

    Ok(SpecExportModelSchema {
        task_type: descriptor.task_type.trim().to_string(),
        file_name: c_file_name,
        sheet_name: c_sheet_name,
        title_row_height: descriptor.title_row_height,
        content_row_height,
        remark,
        remark_row_height,
        columns: l_columns,
    })
}
