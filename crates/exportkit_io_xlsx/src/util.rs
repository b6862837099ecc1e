//! Stateless helper utilities used by the XLSX writer kernel.

use crate::conf::{
    C_SHEET_NAME_FALLBACK, C_SHEET_PART_SEPARATOR, N_LEN_EXCEL_SHEET_NAME_MAX, N_NROWS_EXCEL_MAX,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::{SpecRowRun, SpecXlsxValuePolicy};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Convert `NaN`/`Inf` to policy string; return error for finite values.
pub fn convert_nan_inf_to_str(
    x: f64,
    value_policy: &SpecXlsxValuePolicy,
) -> Result<String, String> {
    if x.is_nan() {
        return Ok(value_policy.nan_str.clone());
    }
    if x.is_infinite() {
        return Ok(if x.is_sign_positive() {
            value_policy.posinf_str.clone()
        } else {
            value_policy.neginf_str.clone()
        });
    }
    Err("Input is neither NaN nor Inf.".to_string())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    // Excel refuses names that start or end with an apostrophe.
    c_name = c_name.trim().trim_matches('\'').trim().to_string();
    if c_name.is_empty() {
        c_name = C_SHEET_NAME_FALLBACK.to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Create rollover sheet name (`base-2`, `base-3`, ...), respecting length cap.
///
/// The base is sanitized first, so a blank base yields `Sheet-<n>`.
pub fn create_sheet_identifier(base_name: &str, part_idx_1based: usize) -> String {
    let c_sheet_name_suffix = format!("{C_SHEET_PART_SEPARATOR}{part_idx_1based}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = sanitize_sheet_name(base_name, "_")
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RowPlanning

/// Split `n_rows_incoming` rows into runs so that no sheet reaches
/// `n_rows_ceiling` rows (header rows included).
///
/// A sheet holds at most `n_rows_ceiling - 1` rows: a row that would bring
/// the count to the ceiling goes to a new sheet.
///
/// `n_rows_used` is the current sheet's row count, header included. Every run
/// after the first capacity exhaustion is flagged `if_new_sheet`; a rollover
/// sheet starts at `n_rows_header` used rows. A sheet is never requested
/// without rows to put in it.
pub fn plan_row_runs(
    n_rows_used: usize,
    n_rows_incoming: usize,
    n_rows_header: usize,
    n_rows_ceiling: usize,
) -> Result<Vec<SpecRowRun>, String> {
    if n_rows_ceiling > N_NROWS_EXCEL_MAX {
        return Err(format!(
            "Sheet ceiling {n_rows_ceiling} exceeds the Excel limit of {N_NROWS_EXCEL_MAX} rows."
        ));
    }
    if n_rows_ceiling <= n_rows_header + 1 {
        return Err(format!(
            "Sheet ceiling {n_rows_ceiling} leaves no room below {n_rows_header} header rows."
        ));
    }

    let n_rows_sheet_max = n_rows_ceiling - 1;
    let mut l_runs = Vec::new();
    let mut n_rows_used_current = n_rows_used;
    let mut n_row_cursor = 0usize;
    let mut if_new_sheet = false;

    while n_row_cursor < n_rows_incoming {
        let n_rows_free = n_rows_sheet_max.saturating_sub(n_rows_used_current);
        if n_rows_free == 0 {
            if_new_sheet = true;
            n_rows_used_current = n_rows_header;
            continue;
        }

        let n_rows_take = usize::min(n_rows_free, n_rows_incoming - n_row_cursor);
        l_runs.push(SpecRowRun {
            if_new_sheet,
            row_start_inclusive: n_row_cursor,
            row_end_exclusive: n_row_cursor + n_rows_take,
        });

        n_row_cursor += n_rows_take;
        n_rows_used_current += n_rows_take;
        if_new_sheet = false;
    }

    Ok(l_runs)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
