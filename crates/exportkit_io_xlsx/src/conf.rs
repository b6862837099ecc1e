//! XLSX constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::SpecCellFormat;

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Fallback sheet name when a requested name sanitizes to nothing.
pub const C_SHEET_NAME_FALLBACK: &str = "Sheet";
/// Separator between a sheet base name and its rollover part number.
pub const C_SHEET_PART_SEPARATOR: &str = "-";
/// Column width used when the layout does not declare one.
pub const N_WIDTH_COLUMN_DEFAULT: f64 = 20.0;

/// Canonical format preset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnumFmtKey {
    /// Body cell format.
    Text,
    /// Header cell format.
    Header,
    /// Remark (template instructions) cell format.
    Remark,
}

/// Build default named format presets used by [`crate::writer::XlsxSheetWriter`].
pub fn derive_default_xlsx_formats() -> BTreeMap<EnumFmtKey, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Calibri".to_string()),
        font_size: Some(11),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(EnumFmtKey::Text, cfg_base_fmt_spec.clone());
    dict_fmt.insert(
        EnumFmtKey::Header,
        cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            border: Some(1),
            bg_color: Some("#D9D9D9".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Remark,
        cfg_base_fmt_spec.with_(SpecCellFormat {
            align: Some("left".to_string()),
            valign: Some("top".to_string()),
            text_wrap: Some(true),
            font_color: Some("#C00000".to_string()),
            ..Default::default()
        }),
    );

    dict_fmt
}
