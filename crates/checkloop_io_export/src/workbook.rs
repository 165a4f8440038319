//! Native `.xlsx` workbook serializer built on `rust_xlsxwriter`.

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::conf::{N_LEN_EXCEL_CELL_TEXT_MAX, derive_default_export_formats};
use crate::spec::{
    EnumCellValue, ExportError, SpecCellFormat, SpecColor, SpecExportDocument, SpecExportFormats,
};
use crate::util::{cast_col_num, cast_row_num, sanitize_sheet_name, validate_excel_limits};

/// Resolved `rust_xlsxwriter` formats for one document.
struct SpecWorkbookFormats {
    header: Format,
    text: Format,
    number: Format,
    text_shaded: Format,
    number_shaded: Format,
}

impl SpecWorkbookFormats {
    fn new(doc: &SpecExportDocument, presets: &SpecExportFormats) -> Self {
        let theme = doc.theme;
        let fmt_header = presets.header.with_(SpecCellFormat {
            bg_color: Some(theme.header_background),
            font_color: Some(theme.header_text_color),
            ..Default::default()
        });
        let fmt_shade = SpecCellFormat {
            bg_color: Some(theme.alternate_row_background),
            ..Default::default()
        };

        Self {
            header: derive_rust_xlsx_format(&fmt_header),
            text: derive_rust_xlsx_format(&presets.text),
            number: derive_rust_xlsx_format(&presets.number),
            text_shaded: derive_rust_xlsx_format(&presets.text.merge(&fmt_shade)),
            number_shaded: derive_rust_xlsx_format(&presets.number.merge(&fmt_shade)),
        }
    }

    fn text(&self, if_shaded: bool) -> &Format {
        if if_shaded { &self.text_shaded } else { &self.text }
    }

    fn number(&self, if_shaded: bool) -> &Format {
        if if_shaded {
            &self.number_shaded
        } else {
            &self.number
        }
    }
}

/// Serialize `doc` as an `.xlsx` workbook using the default format presets.
pub fn serialize_native_workbook(doc: &SpecExportDocument) -> Result<Vec<u8>, ExportError> {
    serialize_native_workbook_with(doc, &derive_default_export_formats())
}

/// Serialize `doc` as an `.xlsx` workbook with caller-supplied presets.
///
/// The header row takes the theme colors over `presets.header`; shaded body
/// rows take the theme alternate fill over the text/number presets. Strings are
/// always written as text cells unless their column is flagged numeric and the
/// trimmed value parses to a finite number.
pub fn serialize_native_workbook_with(
    doc: &SpecExportDocument,
    presets: &SpecExportFormats,
) -> Result<Vec<u8>, ExportError> {
    if doc.rows.is_empty() {
        return Err(ExportError::EmptyDocument);
    }
    validate_excel_limits(doc.rows.len(), doc.columns.len())?;

    let formats = SpecWorkbookFormats::new(doc, presets);
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sanitize_sheet_name(&doc.sheet_name, "_"))?;

    for (n_idx_col, cell) in doc.header.iter().enumerate() {
        write_text_cell(worksheet, 0, n_idx_col, &cell.text, &formats.header)?;
    }

    for (n_idx_row, row) in doc.rows.iter().enumerate() {
        let if_shaded = row.background.is_some();
        for (n_idx_col, value) in row.cells.iter().enumerate() {
            let if_numeric_col = doc.cols_idx_numeric.binary_search(&n_idx_col).is_ok();
            write_body_cell(
                worksheet,
                n_idx_row + 1,
                n_idx_col,
                value,
                if_numeric_col,
                if_shaded,
                &formats,
            )?;
        }
    }

    if let Some(l_widths) = &doc.widths {
        for (n_idx_col, n_width) in l_widths.iter().enumerate() {
            worksheet.set_column_width(cast_col_num(n_idx_col)?, *n_width as f64)?;
        }
    }

    if doc.if_autofilter && !doc.columns.is_empty() {
        worksheet.autofilter(
            0,
            0,
            cast_row_num(doc.rows.len())?,
            cast_col_num(doc.columns.len() - 1)?,
        )?;
    }

    if doc.if_freeze_header {
        worksheet.set_freeze_panes(1, 0)?;
    }

    let v_bytes = workbook.save_to_buffer()?;
    tracing::debug!(
        file_name = doc.file_name.as_str(),
        bytes = v_bytes.len(),
        "native workbook serialized"
    );
    Ok(v_bytes)
}

fn write_body_cell(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    if_numeric_col: bool,
    if_shaded: bool,
    formats: &SpecWorkbookFormats,
) -> Result<(), ExportError> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(n_row, n_col, formats.text(if_shaded))?;
        }
        EnumCellValue::Number(val) if val.is_finite() => {
            worksheet.write_number_with_format(n_row, n_col, *val, formats.number(if_shaded))?;
        }
        EnumCellValue::Number(_) => {
            worksheet.write_blank(n_row, n_col, formats.number(if_shaded))?;
        }
        EnumCellValue::Boolean(val) => {
            worksheet.write_boolean_with_format(n_row, n_col, *val, formats.number(if_shaded))?;
        }
        EnumCellValue::String(val) => {
            if if_numeric_col
                && let Ok(n_val) = val.trim().parse::<f64>()
                && n_val.is_finite()
            {
                worksheet.write_number_with_format(
                    n_row,
                    n_col,
                    n_val,
                    formats.number(if_shaded),
                )?;
            } else {
                write_text_cell(worksheet, row_idx, col_idx, val, formats.text(if_shaded))?;
            }
        }
    }
    Ok(())
}

fn write_text_cell(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    text: &str,
    format: &Format,
) -> Result<(), ExportError> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    if text.is_empty() {
        worksheet.write_blank(n_row, n_col, format)?;
        return Ok(());
    }
    if text.chars().count() > N_LEN_EXCEL_CELL_TEXT_MAX {
        tracing::warn!(
            row = row_idx,
            col = col_idx,
            max = N_LEN_EXCEL_CELL_TEXT_MAX,
            "cell text truncated to worksheet limit"
        );
        let c_truncated: String = text.chars().take(N_LEN_EXCEL_CELL_TEXT_MAX).collect();
        worksheet.write_string_with_format(n_row, n_col, c_truncated, format)?;
        return Ok(());
    }
    worksheet.write_string_with_format(n_row, n_col, text, format)?;
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
    if let Some(val) = spec.bg_color {
        format = format.set_background_color(derive_color(val));
    }
    if let Some(val) = spec.font_color {
        format = format.set_font_color(derive_color(val));
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    format
}

fn derive_color(color: SpecColor) -> Color {
    Color::RGB(color.0)
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
    match align.trim().to_ascii_lowercase().as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::io::{Cursor, Read};

    use super::*;
    use crate::classify::ClassifierSubstring;
    use crate::document::build_document;
    use crate::spec::{SpecExportOptions, SpecRecord};

    type TestResult = Result<(), Box<dyn Error>>;

    fn derive_doc(
        records: &[SpecRecord],
        file_name: &str,
        options: &SpecExportOptions,
    ) -> Result<SpecExportDocument, ExportError> {
        build_document(records, file_name, options, &ClassifierSubstring)?
            .ok_or(ExportError::EmptyDocument)
    }

    fn read_part(v_bytes: &[u8], name: &str) -> Result<String, Box<dyn Error>> {
        let mut archive = zip::ZipArchive::new(Cursor::new(v_bytes))?;
        let mut file = archive.by_name(name)?;
        let mut out = String::new();
        file.read_to_string(&mut out)?;
        Ok(out)
    }

    #[test]
    fn test_workbook_keeps_leading_zero_strings_as_text() -> TestResult {
        let records = vec![
            SpecRecord::new().with("postcode", "007700").with("count", 31i64),
            SpecRecord::new().with("postcode", "1200").with("count", 44i64),
        ];
        let doc = derive_doc(&records, "complaint_log.xlsx", &SpecExportOptions::default())?;
        let v_bytes = serialize_native_workbook(&doc)?;

        let c_shared = read_part(&v_bytes, "xl/sharedStrings.xml")?;
        let c_sheet = read_part(&v_bytes, "xl/worksheets/sheet1.xml")?;
        assert!(c_shared.contains("<t>007700</t>"));
        assert!(c_shared.contains("<t>1200</t>"));
        assert!(!c_sheet.contains("<v>7700</v>"));
        assert!(c_sheet.contains("<v>31</v>"));
        Ok(())
    }

    #[test]
    fn test_workbook_numeric_column_writes_numbers() -> TestResult {
        let records = vec![
            SpecRecord::new().with("id", "007").with("score", "42"),
            SpecRecord::new().with("id", "008").with("score", "n/a"),
        ];
        let options = SpecExportOptions {
            cols_numeric: vec!["score".to_string()],
            ..Default::default()
        };
        let doc = derive_doc(&records, "pir_scores.xlsx", &options)?;
        let v_bytes = serialize_native_workbook(&doc)?;

        let c_shared = read_part(&v_bytes, "xl/sharedStrings.xml")?;
        let c_sheet = read_part(&v_bytes, "xl/worksheets/sheet1.xml")?;
        assert!(c_sheet.contains("<v>42</v>"));
        assert!(!c_shared.contains("<t>42</t>"));
        assert!(c_shared.contains("<t>n/a</t>"));
        assert!(c_shared.contains("<t>007</t>"));
        Ok(())
    }

    #[test]
    fn test_workbook_applies_theme_filter_freeze_and_widths() -> TestResult {
        let records = vec![
            SpecRecord::new().with("name", "Alice").with("dept", "A&E"),
            SpecRecord::new().with("name", "Bob").with("dept", "ICU"),
        ];
        let doc = derive_doc(&records, "training_export.xlsx", &SpecExportOptions::default())?;
        let v_bytes = serialize_native_workbook(&doc)?;

        let c_sheet = read_part(&v_bytes, "xl/worksheets/sheet1.xml")?;
        let c_styles = read_part(&v_bytes, "xl/styles.xml")?;
        let c_workbook = read_part(&v_bytes, "xl/workbook.xml")?;
        assert!(c_sheet.contains(r#"<autoFilter ref="A1:B3"/>"#));
        assert!(c_sheet.contains(r#"state="frozen""#));
        assert!(c_sheet.contains("<cols>"));
        assert!(c_styles.contains("FF1F4E79"));
        assert!(c_styles.contains("FFDDEBF7"));
        assert!(c_workbook.contains(r#"name="Training""#));
        Ok(())
    }

    #[test]
    fn test_workbook_without_optional_features() -> TestResult {
        let records = vec![SpecRecord::new().with("a", true).with("b", EnumCellValue::None)];
        let options = SpecExportOptions {
            if_autofilter: false,
            if_freeze_header: false,
            if_column_widths: false,
            ..Default::default()
        };
        let doc = derive_doc(&records, "x.xlsx", &options)?;
        let v_bytes = serialize_native_workbook(&doc)?;

        let c_sheet = read_part(&v_bytes, "xl/worksheets/sheet1.xml")?;
        assert!(!c_sheet.contains("<autoFilter"));
        assert!(!c_sheet.contains("frozen"));
        assert!(!c_sheet.contains("<cols>"));
        assert!(c_sheet.contains(r#"t="b""#));
        Ok(())
    }

    #[test]
    fn test_workbook_sanitizes_long_and_reserved_sheet_names() -> TestResult {
        let records = vec![SpecRecord::new().with("a", 1i64)];
        for (c_sheet_name, c_expected) in [
            (format!("{}'tail", "y".repeat(30)), "y".repeat(30)),
            ("History".to_string(), "History_".to_string()),
        ] {
            let options = SpecExportOptions {
                sheet_name: Some(c_sheet_name),
                ..Default::default()
            };
            let doc = derive_doc(&records, "x.xlsx", &options)?;
            let v_bytes = serialize_native_workbook(&doc)?;

            let c_workbook = read_part(&v_bytes, "xl/workbook.xml")?;
            assert!(c_workbook.contains(&format!(r#"name="{c_expected}""#)));
        }
        Ok(())
    }

    #[test]
    fn test_workbook_rejects_empty_document() -> TestResult {
        let records = vec![SpecRecord::new().with("a", 1i64)];
        let mut doc = derive_doc(&records, "x.xlsx", &SpecExportOptions::default())?;
        doc.retain_rows(|_| false);
        assert!(matches!(
            serialize_native_workbook(&doc),
            Err(ExportError::EmptyDocument)
        ));
        Ok(())
    }

    #[test]
    fn test_derive_format_align_and_border() {
        assert_eq!(derive_format_align("VCenter"), Some(FormatAlign::VerticalCenter));
        assert_eq!(derive_format_align("diagonal"), None);
        assert_eq!(derive_format_border(1), FormatBorder::Thin);
        assert_eq!(derive_format_border(99), FormatBorder::None);
    }
}
