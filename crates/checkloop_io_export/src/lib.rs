//! `checkloop_io_export` v1:
//! Rust-side tabular export kernel for complaint, training and PIR registers.
//!
//! Module layout:
//! - `conf`     : constants, theme table and default presets
//! - `spec`     : values/records/options/document/artifact models and errors
//! - `report`   : build report and its builder
//! - `util`     : pure helper functions (escaping, widths, names, limits)
//! - `classify` : filename to category classifiers
//! - `document` : record sequence to export document
//! - `html`     : spreadsheet-importable HTML table serializer
//! - `workbook` : native `.xlsx` serializer
//! - `ingest`   : JSON / dataframe / IPC record adapters
//! - `exporter` : `TableExporter` facade and artifact saving
pub mod classify;
pub mod conf;
pub mod document;
pub mod exporter;
pub mod html;
pub mod ingest;
pub mod report;
pub mod spec;
pub mod util;
pub mod workbook;

pub use classify::{CategoryClassifier, ClassifierPatterns, ClassifierSubstring, EnumPatternMode};
pub use conf::{
    C_MIME_HTML_TABLE, C_MIME_NATIVE_WORKBOOK, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, THEMES,
    derive_default_export_formats, derive_default_export_options, derive_sheet_name, derive_theme,
};
pub use document::build_document;
pub use exporter::{TableExporter, serialize, serialize_named};
pub use html::serialize_html_table;
pub use ingest::{
    records_from_dataframe, records_from_ipc_bytes, records_from_json_str, records_from_json_values,
};
pub use report::{ReportExport, ReportExportBuilder};
pub use spec::{
    EnumCellValue, EnumExportCategory, EnumExtraColumnRule, EnumMissingColumnRule,
    EnumSpreadsheetFormat, ExportError, SpecCellFormat, SpecCellStyle, SpecColor,
    SpecDocumentRow, SpecExportArtifact, SpecExportDocument, SpecExportFormats,
    SpecExportOptions, SpecHeaderCell, SpecRecord, SpecRecordShapePolicy, SpecTheme,
    SpecWidthPolicy,
};
pub use workbook::{serialize_native_workbook, serialize_native_workbook_with};
