//! `TableExporter` facade: build, serialize and package export artifacts.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::classify::{CategoryClassifier, ClassifierSubstring};
use crate::html::serialize_html_table;
use crate::spec::{
    EnumSpreadsheetFormat, ExportError, SpecExportArtifact, SpecExportDocument, SpecExportOptions,
    SpecRecord,
};
use crate::util::derive_file_name_with_extension;
use crate::workbook::serialize_native_workbook;

/// Serialize `doc` with `format`.
pub fn serialize(
    doc: &SpecExportDocument,
    format: EnumSpreadsheetFormat,
) -> Result<Vec<u8>, ExportError> {
    match format {
        EnumSpreadsheetFormat::HtmlTable => serialize_html_table(doc),
        EnumSpreadsheetFormat::NativeWorkbook => serialize_native_workbook(doc),
    }
}

/// Serialize `doc` with a format given by name (`html`, `xls`, `xlsx`, ...).
pub fn serialize_named(doc: &SpecExportDocument, format_name: &str) -> Result<Vec<u8>, ExportError> {
    serialize(doc, EnumSpreadsheetFormat::parse(format_name)?)
}

/// Record-to-spreadsheet exporter.
///
/// Holds the export options and the category classifier; stateless across
/// calls and safe to share between threads.
pub struct TableExporter {
    options: SpecExportOptions,
    classifier: Box<dyn CategoryClassifier>,
}

impl TableExporter {
    /// Exporter using `options` and the substring classifier.
    pub fn new(options: SpecExportOptions) -> Self {
        Self {
            options,
            classifier: Box::new(ClassifierSubstring),
        }
    }

    /// Replace the category classifier.
    pub fn with_classifier<C>(mut self, classifier: C) -> Self
    where
        C: CategoryClassifier + 'static,
    {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn options(&self) -> &SpecExportOptions {
        &self.options
    }

    /// See [`crate::build_document`]; `Ok(None)` for empty input.
    pub fn build_document(
        &self,
        records: &[SpecRecord],
        file_name: &str,
    ) -> Result<Option<SpecExportDocument>, ExportError> {
        crate::document::build_document(records, file_name, &self.options, self.classifier.as_ref())
    }

    /// Serialize `doc` with `format`.
    pub fn serialize(
        &self,
        doc: &SpecExportDocument,
        format: EnumSpreadsheetFormat,
    ) -> Result<Vec<u8>, ExportError> {
        serialize(doc, format)
    }

    /// Serialize `doc` with the configured format and wrap it as an artifact.
    pub fn package(&self, doc: &SpecExportDocument) -> Result<SpecExportArtifact, ExportError> {
        let format = self.options.format;
        let v_bytes = serialize(doc, format)?;
        let c_file_name = derive_file_name_with_extension(&doc.file_name, format.extension());
        tracing::info!(
            file_name = c_file_name.as_str(),
            format = format.as_str(),
            rows = doc.rows.len(),
            bytes = v_bytes.len(),
            "export artifact ready"
        );
        Ok(SpecExportArtifact {
            data: v_bytes,
            file_name: c_file_name,
            mime_type: format.mime_type().to_string(),
            format,
            report: doc.report.clone(),
        })
    }

    /// Build and serialize in one step.
    ///
    /// Empty `records` surface as [`ExportError::EmptyDocument`].
    pub fn export(
        &self,
        records: &[SpecRecord],
        file_name: &str,
    ) -> Result<SpecExportArtifact, ExportError> {
        let doc = self
            .build_document(records, file_name)?
            .ok_or(ExportError::EmptyDocument)?;
        self.package(&doc)
    }
}

impl Default for TableExporter {
    fn default() -> Self {
        Self::new(SpecExportOptions::default())
    }
}

impl fmt::Debug for TableExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableExporter")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SpecExportArtifact {
    /// Write the artifact to `<dir>/<file_name>` and return the written path.
    ///
    /// `file_name` must be a single plain path component.
    pub fn save_into(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
        let path_name = Path::new(&self.file_name);
        let mut components = path_name.components();
        let if_plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !if_plain {
            return Err(ExportError::InvalidInput(format!(
                "Artifact file name {:?} must not contain path components.",
                self.file_name
            )));
        }

        let path_out = dir.as_ref().join(path_name);
        std::fs::write(&path_out, &self.data)?;
        tracing::debug!(path = %path_out.display(), "export artifact saved");
        Ok(path_out)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;
    use crate::conf::{C_MIME_HTML_TABLE, C_MIME_NATIVE_WORKBOOK};
    use crate::spec::EnumExportCategory;

    struct TestDir {
        path: PathBuf,
    }

    impl TestDir {
        fn new() -> Self {
            let n = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos();
            let path = std::env::temp_dir().join(format!("checkloop_export_test_{n}"));
            std::fs::create_dir_all(&path).expect("create test dir");
            Self { path }
        }
    }

    impl Drop for TestDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    fn derive_staff_records() -> Vec<SpecRecord> {
        vec![
            SpecRecord::new().with("name", "Alice").with("dept", "A&E"),
            SpecRecord::new().with("name", "Bob").with("dept", "ICU"),
        ]
    }

    #[test]
    fn test_export_html_table_artifact() -> Result<(), ExportError> {
        let exporter = TableExporter::new(SpecExportOptions {
            format: EnumSpreadsheetFormat::HtmlTable,
            ..Default::default()
        });
        let artifact = exporter.export(&derive_staff_records(), "training_export")?;

        assert_eq!(artifact.file_name, "training_export.xls");
        assert_eq!(artifact.mime_type, C_MIME_HTML_TABLE);
        assert_eq!(artifact.format, EnumSpreadsheetFormat::HtmlTable);
        assert_eq!(artifact.report.cnt_rows, 2);
        let html = String::from_utf8_lossy(&artifact.data);
        assert!(html.contains("A&amp;E"));
        Ok(())
    }

    #[test]
    fn test_export_replaces_other_spreadsheet_suffix() -> Result<(), ExportError> {
        let exporter = TableExporter::new(SpecExportOptions {
            format: EnumSpreadsheetFormat::HtmlTable,
            ..Default::default()
        });
        let artifact = exporter.export(&derive_staff_records(), "training_export.xlsx")?;
        assert_eq!(artifact.file_name, "training_export.xls");
        Ok(())
    }

    #[test]
    fn test_export_native_workbook_artifact() -> Result<(), ExportError> {
        let artifact = TableExporter::default().export(&derive_staff_records(), "pir_q3.xlsx")?;

        assert_eq!(artifact.file_name, "pir_q3.xlsx");
        assert_eq!(artifact.mime_type, C_MIME_NATIVE_WORKBOOK);
        assert!(artifact.data.starts_with(b"PK"));
        Ok(())
    }

    #[test]
    fn test_export_empty_records_is_empty_document() {
        let exporter = TableExporter::default();
        assert!(matches!(exporter.build_document(&[], "complaints.xlsx"), Ok(None)));
        assert!(matches!(
            exporter.export(&[], "complaints.xlsx"),
            Err(ExportError::EmptyDocument)
        ));
    }

    #[test]
    fn test_custom_classifier_drives_category() -> Result<(), ExportError> {
        let exporter = TableExporter::default().with_classifier(|file_name: &str| {
            if file_name.starts_with("cqc") {
                EnumExportCategory::Pir
            } else {
                EnumExportCategory::Default
            }
        });
        let doc = exporter
            .build_document(&derive_staff_records(), "cqc_complaints.xlsx")?
            .ok_or(ExportError::EmptyDocument)?;
        assert_eq!(doc.category, EnumExportCategory::Pir);
        assert_eq!(doc.sheet_name, "PIR");
        Ok(())
    }

    #[test]
    fn test_serialize_named_rejects_unknown_format() -> Result<(), ExportError> {
        let exporter = TableExporter::default();
        let doc = exporter
            .build_document(&derive_staff_records(), "x.xls")?
            .ok_or(ExportError::EmptyDocument)?;
        assert!(matches!(
            serialize_named(&doc, "ods"),
            Err(ExportError::UnsupportedFormat(_))
        ));
        assert!(serialize_named(&doc, "html")?.starts_with(b"<html"));
        Ok(())
    }

    #[test]
    fn test_artifact_save_into_dir() -> Result<(), ExportError> {
        let dir = TestDir::new();
        let artifact = TableExporter::default().export(&derive_staff_records(), "training")?;
        let path_out = artifact.save_into(&dir.path)?;

        assert_eq!(path_out, dir.path.join("training.xlsx"));
        assert_eq!(std::fs::read(&path_out)?, artifact.data);
        Ok(())
    }

    #[test]
    fn test_artifact_save_into_refuses_escaping_names() {
        let dir = TestDir::new();
        for c_name in ["../evil.xls", "sub/dir.xls", "/abs.xls", ".."] {
            let artifact = SpecExportArtifact {
                data: b"x".to_vec(),
                file_name: c_name.to_string(),
                mime_type: C_MIME_HTML_TABLE.to_string(),
                format: EnumSpreadsheetFormat::HtmlTable,
                report: Default::default(),
            };
            assert!(
                matches!(artifact.save_into(&dir.path), Err(ExportError::InvalidInput(_))),
                "{c_name} should be refused"
            );
        }
    }

    #[test]
    fn test_exporter_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TableExporter>();
    }
}
