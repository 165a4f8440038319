//! Export constants, the static theme table and default preset factories.

use crate::spec::{
    EnumExportCategory, SpecCellFormat, SpecColor, SpecExportFormats, SpecExportOptions,
    SpecTheme,
};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Excel maximum characters in one cell.
pub const N_LEN_EXCEL_CELL_TEXT_MAX: usize = 32_767;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Sheet name Excel reserves for itself (case-insensitive).
pub const C_SHEET_NAME_RESERVED: &str = "History";
/// Hard cap on a column width in character units.
pub const N_WIDTH_EXCEL_COLUMN_MAX: usize = 255;

/// Pixels per character unit for HTML `<col>` widths.
pub const N_WIDTH_PX_PER_CHAR: usize = 7;
/// Fixed pixel padding for HTML `<col>` widths.
pub const N_WIDTH_PX_PADDING: usize = 5;

/// Max anomaly warnings kept in one report.
pub const N_LEN_REPORT_WARNINGS_MAX: usize = 50;

/// MIME type of [`crate::EnumSpreadsheetFormat::HtmlTable`] artifacts.
pub const C_MIME_HTML_TABLE: &str = "text/html";
/// MIME type of [`crate::EnumSpreadsheetFormat::NativeWorkbook`] artifacts.
pub const C_MIME_NATIVE_WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// `.xls` so spreadsheet apps open the HTML table in import mode.
pub const C_EXT_HTML_TABLE: &str = "xls";
pub const C_EXT_NATIVE_WORKBOOK: &str = "xlsx";
/// Spreadsheet suffixes swapped out when an artifact gets its own extension.
pub const TUP_EXTENSIONS_REPLACEABLE: [&str; 4] = ["xls", "xlsx", "htm", "html"];

/// Theme lookup table, indexed by [`EnumExportCategory::index`].
pub static THEMES: [SpecTheme; 4] = [
    // complaint
    SpecTheme {
        header_background: SpecColor::rgb(0xC0392B),
        header_text_color: SpecColor::rgb(0xFFFFFF),
        alternate_row_background: SpecColor::rgb(0xFDEDEC),
    },
    // training
    SpecTheme {
        header_background: SpecColor::rgb(0x1F4E79),
        header_text_color: SpecColor::rgb(0xFFFFFF),
        alternate_row_background: SpecColor::rgb(0xDDEBF7),
    },
    // pir
    SpecTheme {
        header_background: SpecColor::rgb(0x2E7D32),
        header_text_color: SpecColor::rgb(0xFFFFFF),
        alternate_row_background: SpecColor::rgb(0xE8F5E9),
    },
    // default
    SpecTheme {
        header_background: SpecColor::rgb(0x4A4A4A),
        header_text_color: SpecColor::rgb(0xFFFFFF),
        alternate_row_background: SpecColor::rgb(0xF2F2F2),
    },
];

/// Theme for `category`.
pub fn derive_theme(category: EnumExportCategory) -> SpecTheme {
    THEMES[category.index()]
}

/// Default sheet name for `category`.
pub fn derive_sheet_name(category: EnumExportCategory) -> &'static str {
    match category {
        EnumExportCategory::Complaint => "Complaints",
        EnumExportCategory::Training => "Training",
        EnumExportCategory::Pir => "PIR",
        EnumExportCategory::Default => "Export",
    }
}

/// Build default named format presets used by the workbook serializer.
pub fn derive_default_export_formats() -> SpecExportFormats {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Calibri".to_string()),
        font_size: Some(11),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    SpecExportFormats {
        text: cfg_base_fmt_spec.with_(SpecCellFormat {
            align: Some("left".to_string()),
            num_format: Some("@".to_string()),
            ..Default::default()
        }),
        number: cfg_base_fmt_spec.with_(SpecCellFormat {
            align: Some("right".to_string()),
            num_format: Some("General".to_string()),
            ..Default::default()
        }),
        header: cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            border: Some(1),
            ..Default::default()
        }),
    }
}

/// Build default export options.
pub fn derive_default_export_options() -> SpecExportOptions {
    SpecExportOptions::default()
}
