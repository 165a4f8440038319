//! Shared export models: values, records, options, document, artifact and errors.

use std::fmt;
use std::str::FromStr;

use rust_xlsxwriter::XlsxError;
use thiserror::Error;

use crate::conf::{
    C_EXT_HTML_TABLE, C_EXT_NATIVE_WORKBOOK, C_MIME_HTML_TABLE, C_MIME_NATIVE_WORKBOOK,
};
use crate::report::ReportExport;

////////////////////////////////////////////////////////////////////////////////
// #region CellValues

/// Scalar value carried by one record field / document cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnumCellValue {
    /// Missing/null value.
    #[default]
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
}

impl EnumCellValue {
    /// Plain display text used by width estimation and the HTML serializer.
    ///
    /// Numbers render without quoting, missing and non-finite values render empty.
    pub fn to_display_text(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::String(s) => s.clone(),
            Self::Number(n) if n.is_finite() => n.to_string(),
            Self::Number(_) => String::new(),
            Self::Boolean(true) => "TRUE".to_string(),
            Self::Boolean(false) => "FALSE".to_string(),
        }
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for EnumCellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for EnumCellValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<T: Into<EnumCellValue>> From<Option<T>> for EnumCellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

/// Ordered column-name to value mapping.
///
/// Key insertion order is preserved; inserting an existing key replaces its
/// value in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecRecord {
    l_fields: Vec<(String, EnumCellValue)>,
}

impl SpecRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Self::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<EnumCellValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace one field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<EnumCellValue>) {
        let c_key = key.into();
        let value = value.into();
        if let Some((_, slot)) = self.l_fields.iter_mut().find(|(k, _)| *k == c_key) {
            *slot = value;
            return;
        }
        self.l_fields.push((c_key, value));
    }

    /// Value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&EnumCellValue> {
        self.l_fields
            .iter()
            .find_map(|(k, v)| if k == key { Some(v) } else { None })
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.l_fields.iter().map(|(k, _)| k.as_str())
    }

    /// `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EnumCellValue)> {
        self.l_fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.l_fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.l_fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for SpecRecord
where
    K: Into<String>,
    V: Into<EnumCellValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = SpecRecord::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CategoryAndTheme

/// Export classification driving theme and sheet name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum EnumExportCategory {
    /// Complaint register exports.
    Complaint,
    /// Training record exports.
    Training,
    /// Post-incident review exports.
    Pir,
    /// Anything else.
    #[default]
    Default,
}

impl EnumExportCategory {
    /// All categories, in detection precedence order.
    pub const ALL: [EnumExportCategory; 4] = [
        EnumExportCategory::Complaint,
        EnumExportCategory::Training,
        EnumExportCategory::Pir,
        EnumExportCategory::Default,
    ];

    /// Lowercase tag, also the filename substring used for detection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complaint => "complaint",
            Self::Training => "training",
            Self::Pir => "pir",
            Self::Default => "default",
        }
    }

    /// Position in [`Self::ALL`] and in the theme table.
    pub fn index(&self) -> usize {
        match self {
            Self::Complaint => 0,
            Self::Training => 1,
            Self::Pir => 2,
            Self::Default => 3,
        }
    }
}

impl fmt::Display for EnumExportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnumExportCategory {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let c_value = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == c_value)
            .ok_or_else(|| {
                ExportError::InvalidOption(format!(
                    "Unknown export category {value:?}; expected one of: complaint, training, pir, default."
                ))
            })
    }
}

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecColor(pub u32);

impl SpecColor {
    /// Color from `0xRRGGBB`.
    pub const fn rgb(value: u32) -> Self {
        Self(value & 0x00FF_FFFF)
    }

    /// `#RRGGBB` form.
    pub fn to_hex(&self) -> String {
        format!("#{:06X}", self.0 & 0x00FF_FFFF)
    }
}

impl fmt::Display for SpecColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Color bundle applied to the header row and alternate body rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecTheme {
    /// Header cell fill.
    pub header_background: SpecColor,
    /// Header cell font color.
    pub header_text_color: SpecColor,
    /// Fill for shaded body rows.
    pub alternate_row_background: SpecColor,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SpreadsheetFormat

/// Serialization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumSpreadsheetFormat {
    /// HTML table with Office namespace hints, saved as `.xls`.
    HtmlTable,
    /// Real `.xlsx` workbook.
    #[default]
    NativeWorkbook,
}

impl EnumSpreadsheetFormat {
    /// Parse a format name such as `html`, `xls`, `xlsx` or `workbook`.
    pub fn parse(name: &str) -> Result<Self, ExportError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "html" | "html_table" | "htmltable" | "xls" => Ok(Self::HtmlTable),
            "xlsx" | "workbook" | "native_workbook" | "nativeworkbook" => {
                Ok(Self::NativeWorkbook)
            }
            _ => Err(ExportError::UnsupportedFormat(name.to_string())),
        }
    }

    /// Infer format from the extension of `file_name`.
    pub fn from_file_name(file_name: &str) -> Result<Self, ExportError> {
        let Some((_, c_ext)) = file_name.rsplit_once('.') else {
            return Err(ExportError::UnsupportedFormat(file_name.to_string()));
        };
        match c_ext.to_ascii_lowercase().as_str() {
            "xls" | "html" | "htm" => Ok(Self::HtmlTable),
            "xlsx" => Ok(Self::NativeWorkbook),
            _ => Err(ExportError::UnsupportedFormat(format!(".{c_ext}"))),
        }
    }

    /// File extension (without dot) given to artifacts.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::HtmlTable => C_EXT_HTML_TABLE,
            Self::NativeWorkbook => C_EXT_NATIVE_WORKBOOK,
        }
    }

    /// MIME type handed to the download collaborator.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::HtmlTable => C_MIME_HTML_TABLE,
            Self::NativeWorkbook => C_MIME_NATIVE_WORKBOOK,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HtmlTable => "html_table",
            Self::NativeWorkbook => "native_workbook",
        }
    }
}

impl FromStr for EnumSpreadsheetFormat {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Workbook cell format, merged preset-over-patch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<SpecColor>,
    /// Font color.
    pub font_color: Option<SpecColor>,
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
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.or(self.bg_color),
            font_color: other.font_color.or(self.font_color),
        }
    }
}

/// Named base formats used by the workbook serializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportFormats {
    /// Text body cells.
    pub text: SpecCellFormat,
    /// Numeric body cells.
    pub number: SpecCellFormat,
    /// Header cells, before theme colors are applied.
    pub header: SpecCellFormat,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportOptions

/// What to put in a cell whose column is absent from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumMissingColumnRule {
    /// Empty cell.
    #[default]
    Blank,
    /// [`SpecRecordShapePolicy::missing_value_str`] as text.
    Placeholder,
}

/// What to do with record keys not present in the document columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumExtraColumnRule {
    /// Drop the value and count it.
    #[default]
    Drop,
    /// Abort the build with [`ExportError::MalformedRecord`].
    Reject,
}

/// Handling of records whose keys differ from the first record's keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRecordShapePolicy {
    /// Missing-column handling.
    pub rule_missing: EnumMissingColumnRule,
    /// Extra-column handling.
    pub rule_extra: EnumExtraColumnRule,
    /// Placeholder text for [`EnumMissingColumnRule::Placeholder`].
    pub missing_value_str: String,
}

impl Default for SpecRecordShapePolicy {
    fn default() -> Self {
        Self {
            rule_missing: EnumMissingColumnRule::Blank,
            rule_extra: EnumExtraColumnRule::Drop,
            missing_value_str: String::new(),
        }
    }
}

/// Column-width hint inference policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecWidthPolicy {
    /// Max body rows inspected; `None` inspects all.
    pub height_body_inferred_max: Option<usize>,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecWidthPolicy {
    fn default() -> Self {
        Self {
            height_body_inferred_max: Some(20_000),
            width_cell_min: 8,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

/// Exporter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportOptions {
    /// Serialization format used by [`crate::TableExporter::export`].
    pub format: EnumSpreadsheetFormat,
    /// Explicit category; skips filename classification when set.
    pub category: Option<EnumExportCategory>,
    /// Explicit sheet name; defaults to the category sheet name.
    pub sheet_name: Option<String>,
    /// Shade even-indexed body rows.
    pub if_alternate_rows: bool,
    /// Attach an autofilter over header + body.
    pub if_autofilter: bool,
    /// Compute column-width hints.
    pub if_column_widths: bool,
    /// Freeze the header row.
    pub if_freeze_header: bool,
    /// Columns whose numeric-looking strings are written as numbers.
    pub cols_numeric: Vec<String>,
    /// Width hint policy.
    pub policy_width: SpecWidthPolicy,
    /// Record shape anomaly policy.
    pub policy_shape: SpecRecordShapePolicy,
}

impl Default for SpecExportOptions {
    fn default() -> Self {
        Self {
            format: EnumSpreadsheetFormat::NativeWorkbook,
            category: None,
            sheet_name: None,
            if_alternate_rows: true,
            if_autofilter: true,
            if_column_widths: true,
            if_freeze_header: true,
            cols_numeric: vec![],
            policy_width: SpecWidthPolicy::default(),
            policy_shape: SpecRecordShapePolicy::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportDocument

/// Style annotation attached to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecCellStyle {
    /// Fill color.
    pub background: Option<SpecColor>,
    /// Font color.
    pub text_color: Option<SpecColor>,
    /// Bold font.
    pub bold: bool,
}

/// One header cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecHeaderCell {
    /// Column name.
    pub text: String,
    /// Theme-derived header style.
    pub style: SpecCellStyle,
}

/// One body row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecDocumentRow {
    /// Cells, one per document column.
    pub cells: Vec<EnumCellValue>,
    /// Row fill, set on shaded rows.
    pub background: Option<SpecColor>,
}

/// Built export document: header + body grid with style metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecExportDocument {
    /// Requested file name.
    pub file_name: String,
    /// Resolved category.
    pub category: EnumExportCategory,
    /// Resolved theme.
    pub theme: SpecTheme,
    /// Sheet name before sanitizing.
    pub sheet_name: String,
    /// Column names, first-record order.
    pub columns: Vec<String>,
    /// Header cells, one per column.
    pub header: Vec<SpecHeaderCell>,
    /// Body rows.
    pub rows: Vec<SpecDocumentRow>,
    /// Per-column width hints in character units.
    pub widths: Option<Vec<usize>>,
    /// Zero-based indices of columns flagged numeric.
    pub cols_idx_numeric: Vec<usize>,
    /// Attach an autofilter.
    pub if_autofilter: bool,
    /// Freeze the header row.
    pub if_freeze_header: bool,
    /// Shade even-indexed body rows.
    pub if_alternate_rows: bool,
    /// Width policy, kept to recompute hints after filtering.
    pub policy_width: Option<SpecWidthPolicy>,
    /// Anomalies collected while building.
    pub report: ReportExport,
}

/// Serialized export ready for the download/save collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportArtifact {
    /// Encoded document.
    pub data: Vec<u8>,
    /// Suggested file name, with the format extension.
    pub file_name: String,
    /// MIME type for the download.
    pub mime_type: String,
    /// Format that produced `data`.
    pub format: EnumSpreadsheetFormat,
    /// Build report of the source document.
    pub report: ReportExport,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Export failures surfaced to callers.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Requested format is not implemented.
    #[error("Unsupported spreadsheet format: {0}")]
    UnsupportedFormat(String),
    /// Document has no body rows.
    #[error("Nothing to export: document has zero rows.")]
    EmptyDocument,
    /// Record carries a key outside the document columns under the reject rule.
    #[error("Record {index} has column {column:?} not present in the header.")]
    MalformedRecord {
        /// Zero-based record index.
        index: usize,
        /// First offending key.
        column: String,
    },
    /// Classifier pattern failed to compile.
    #[error("Invalid classifier pattern: {0}")]
    InvalidPattern(String),
    /// Input payload could not be interpreted as records.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Option combination is invalid.
    #[error("Invalid option: {0}")]
    InvalidOption(String),
    /// Document exceeds worksheet limits.
    #[error("Excel limit exceeded: {0}")]
    ExcelLimit(String),
    /// Workbook writer failure.
    #[error("xlsx write error: {0}")]
    Workbook(#[from] XlsxError),
    /// Filesystem failure while saving an artifact.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
