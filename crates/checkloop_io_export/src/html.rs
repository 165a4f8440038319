//! Spreadsheet-importable HTML table serializer.
//!
//! Output is a UTF-8 HTML document carrying the Office/Excel namespaces and a
//! worksheet hint block, so spreadsheet applications open the `.xls`-named file
//! in import mode. Every piece of data text is escaped before it is embedded.

use std::fmt::Write as _;

use crate::conf::{N_WIDTH_PX_PADDING, N_WIDTH_PX_PER_CHAR};
use crate::spec::{EnumCellValue, ExportError, SpecCellStyle, SpecExportDocument};
use crate::util::{escape_html, sanitize_sheet_name};

const C_HTML_OPEN: &str = concat!(
    r#"<html xmlns:o="urn:schemas-microsoft-com:office:office" "#,
    r#"xmlns:x="urn:schemas-microsoft-com:office:excel" "#,
    r#"xmlns="http://www.w3.org/TR/REC-html40">"#
);

/// Serialize `doc` as an HTML table document.
pub fn serialize_html_table(doc: &SpecExportDocument) -> Result<Vec<u8>, ExportError> {
    if doc.rows.is_empty() {
        return Err(ExportError::EmptyDocument);
    }

    let mut out = String::with_capacity(1024 + doc.rows.len() * doc.columns.len() * 32);
    out.push_str(C_HTML_OPEN);
    out.push('\n');
    write_head(&mut out, doc);
    out.push_str("<body>\n<table>\n");

    if let Some(l_widths) = &doc.widths {
        out.push_str("<colgroup>");
        for n_width in l_widths {
            let n_px = n_width * N_WIDTH_PX_PER_CHAR + N_WIDTH_PX_PADDING;
            let _ = write!(out, r#"<col width="{n_px}" style="width:{n_px}px">"#);
        }
        out.push_str("</colgroup>\n");
    }

    out.push_str("<thead>\n<tr>");
    for cell in &doc.header {
        let _ = write!(
            out,
            r#"<th style="{}">{}</th>"#,
            derive_inline_style(&cell.style),
            escape_html(&cell.text)
        );
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in &doc.rows {
        out.push_str("<tr>");
        let c_row_style = row
            .background
            .map(|color| format!("background-color:{}", color.to_hex()));
        for (n_idx_col, value) in row.cells.iter().enumerate() {
            let if_numeric_col = doc.cols_idx_numeric.binary_search(&n_idx_col).is_ok();
            write_body_cell(&mut out, value, if_numeric_col, c_row_style.as_deref());
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    Ok(out.into_bytes())
}

fn write_head(out: &mut String, doc: &SpecExportDocument) {
    out.push_str("<head>\n");
    out.push_str(r#"<meta http-equiv="Content-Type" content="text/html; charset=UTF-8">"#);
    out.push('\n');
    let _ = writeln!(out, "<title>{}</title>", escape_html(&doc.file_name));

    out.push_str("<!--[if gte mso 9]><xml><x:ExcelWorkbook><x:ExcelWorksheets><x:ExcelWorksheet>");
    let _ = write!(
        out,
        "<x:Name>{}</x:Name>",
        escape_html(&sanitize_sheet_name(&doc.sheet_name, "_"))
    );
    out.push_str("<x:WorksheetOptions><x:DisplayGridlines/>");
    if doc.if_freeze_header {
        out.push_str(concat!(
            "<x:FreezePanes/><x:FrozenNoSplit/>",
            "<x:SplitHorizontal>1</x:SplitHorizontal>",
            "<x:TopRowBottomPane>1</x:TopRowBottomPane>",
            "<x:ActivePane>2</x:ActivePane>"
        ));
    }
    out.push_str("</x:WorksheetOptions></x:ExcelWorksheet></x:ExcelWorksheets>");
    out.push_str("</x:ExcelWorkbook></xml><![endif]-->\n");

    out.push_str("<style>\n");
    out.push_str("table { border-collapse: collapse; font-family: Calibri, sans-serif; font-size: 11pt; }\n");
    out.push_str("th, td { border: 1px solid #BFBFBF; padding: 2px 6px; vertical-align: middle; }\n");
    out.push_str("th { text-align: center; }\n");
    out.push_str("td.txt { mso-number-format:\"\\@\"; text-align: left; }\n");
    out.push_str("td.num { text-align: right; }\n");
    out.push_str("</style>\n</head>\n");
}

fn write_body_cell(
    out: &mut String,
    value: &EnumCellValue,
    if_numeric_col: bool,
    row_style: Option<&str>,
) {
    let c_class = match value {
        EnumCellValue::Number(_) => "num",
        EnumCellValue::String(s) if if_numeric_col && is_finite_number_text(s) => "num",
        EnumCellValue::Boolean(_) => "bool",
        _ => "txt",
    };
    out.push_str(r#"<td class=""#);
    out.push_str(c_class);
    out.push('"');
    if let Some(c_style) = row_style {
        out.push_str(r#" style=""#);
        out.push_str(c_style);
        out.push('"');
    }
    out.push('>');
    out.push_str(&escape_html(&value.to_display_text()));
    out.push_str("</td>");
}

fn derive_inline_style(style: &SpecCellStyle) -> String {
    let mut l_parts = Vec::with_capacity(3);
    if let Some(color) = style.background {
        l_parts.push(format!("background-color:{}", color.to_hex()));
    }
    if let Some(color) = style.text_color {
        l_parts.push(format!("color:{}", color.to_hex()));
    }
    if style.bold {
        l_parts.push("font-weight:bold".to_string());
    }
    l_parts.join(";")
}

fn is_finite_number_text(s: &str) -> bool {
    s.trim().parse::<f64>().is_ok_and(f64::is_finite)
}
