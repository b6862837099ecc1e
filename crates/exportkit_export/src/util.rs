//! Stateless helpers: locale resolution, cell normalization, naming.

use std::fmt::Write as _;

use chrono::{NaiveDateTime, NaiveTime};
use exportkit_io_xlsx::EnumCellValue;

use crate::conf::{C_DATE_FORMAT_DEFAULT, N_F64_SAFE_INTEGER_MAX};
use crate::spec::{
    EnumFieldType, EnumFieldValue, SpecExportModelSchema, SpecLocaleContext, SpecLocalizedText,
    SpecNormalizeOptions,
};

////////////////////////////////////////////////////////////////////////////////
// #region LocaleResolution

fn derive_translation<'a>(text: &'a SpecLocalizedText, locale: &str) -> Option<&'a str> {
    let c_locale = locale.trim();
    if c_locale.is_empty() {
        return None;
    }

    let c_primary = c_locale.split(['-', '_']).next().unwrap_or(c_locale);
    let mut c_primary_match = None;
    for (c_tag, c_val) in &text.translations {
        if c_val.trim().is_empty() {
            continue;
        }
        if c_tag.eq_ignore_ascii_case(c_locale) {
            return Some(c_val.as_str());
        }
        if c_primary_match.is_none() {
            let c_tag_primary = c_tag.split(['-', '_']).next().unwrap_or(c_tag);
            if c_tag_primary.eq_ignore_ascii_case(c_primary) {
                c_primary_match = Some(c_val.as_str());
            }
        }
    }
    c_primary_match
}

/// Resolve `text` for the active locale.
///
/// Order: active-locale translation (exact tag, then language subtag), base
/// locale translation, declared text. Blank variants are skipped; the result
/// may still be blank.
pub fn derive_localized_text(text: &SpecLocalizedText, ctx_locale: &SpecLocaleContext) -> String {
    derive_translation(text, &ctx_locale.locale)
        .or_else(|| derive_translation(text, &ctx_locale.base_locale))
        .unwrap_or(text.text.as_str())
        .trim()
        .to_string()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellNormalization

/// Whether `field_name` names an employee-ID field (case-insensitive).
pub fn is_employee_id_field(field_name: &str, fields_employee_id: &[String]) -> bool {
    fields_employee_id
        .iter()
        .any(|c_name| c_name.eq_ignore_ascii_case(field_name))
}

/// Numeric value of an employee ID, when it is safe to store as a number.
///
/// IDs with a leading zero, non-digits, or more magnitude than an `f64` holds
/// exactly stay text.
fn convert_employee_id(value: &str) -> Option<f64> {
    if value.is_empty() || value.starts_with('0') || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n_val = value.parse::<i64>().ok()?;
    if n_val > N_F64_SAFE_INTEGER_MAX {
        return None;
    }
    Some(n_val as f64)
}

/// Format a date/time with a chrono pattern, falling back to the default
/// pattern when `pattern` is not a valid format string.
pub fn format_datetime(value: &NaiveDateTime, pattern: &str) -> String {
    let mut c_out = String::new();
    if write!(c_out, "{}", value.format(pattern)).is_ok() {
        return c_out;
    }
    value.format(C_DATE_FORMAT_DEFAULT).to_string()
}

/// Convert a raw field value into a spreadsheet-safe cell value.
///
/// Never fails: values whose runtime kind disagrees with `field_type` are
/// passed through as their own kind.
pub fn normalize_cell_value(
    value: &EnumFieldValue,
    field_type: EnumFieldType,
    field_name: &str,
    date_format: Option<&str>,
    options: &SpecNormalizeOptions,
) -> EnumCellValue {
    let c_pattern = date_format
        .filter(|val| !val.trim().is_empty())
        .unwrap_or(options.date_format_default.as_str());

    match value {
        EnumFieldValue::Null => EnumCellValue::None,
        EnumFieldValue::String(val) => {
            if field_type == EnumFieldType::String
                && is_employee_id_field(field_name, &options.fields_employee_id)
                && let Some(n_val) = convert_employee_id(val)
            {
                return EnumCellValue::Number(n_val);
            }
            EnumCellValue::String(val.clone())
        }
        EnumFieldValue::Integer(val) => EnumCellValue::Number(*val as f64),
        EnumFieldValue::Float(val) => EnumCellValue::Number(*val),
        EnumFieldValue::Boolean(val) => EnumCellValue::Boolean(*val),
        EnumFieldValue::DateTime(val) => EnumCellValue::String(format_datetime(val, c_pattern)),
        EnumFieldValue::Date(val) => {
            EnumCellValue::String(format_datetime(&val.and_time(NaiveTime::MIN), c_pattern))
        }
    }
}

/// Normalize one record into a row of cells in schema column order.
pub fn derive_row_cells<F>(
    schema: &SpecExportModelSchema,
    field_value: F,
    options: &SpecNormalizeOptions,
) -> Vec<EnumCellValue>
where
    F: Fn(&str) -> EnumFieldValue,
{
    schema
        .columns
        .iter()
        .map(|col| {
            normalize_cell_value(
                &field_value(&col.field_name),
                col.field_type,
                &col.field_name,
                col.date_format.as_deref(),
                options,
            )
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Naming

/// Cut `msg` to at most `n_chars_max` characters.
pub fn truncate_message(msg: &str, n_chars_max: usize) -> String {
    match msg.char_indices().nth(n_chars_max) {
        Some((n_byte_end, _)) => msg[..n_byte_end].to_string(),
        None => msg.to_string(),
    }
}

/// Make `stem` safe as part of a file name.
pub fn sanitize_file_stem(stem: &str) -> String {
    stem.trim()
        .chars()
        .map(|chr| {
            if chr.is_alphanumeric() || matches!(chr, '-' | '_' | '.') {
                chr
            } else {
                '_'
            }
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Workers

/// Resolve worker thread count: the explicit limit (at least 1), else CPU
/// count + 1.
pub fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    match num_workers_max {
        Some(n) => n.max(1),
        None => {
            let n_cpu = std::thread::available_parallelism()
                .map(|v| v.get())
                .unwrap_or(1);
            n_cpu + 1
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
