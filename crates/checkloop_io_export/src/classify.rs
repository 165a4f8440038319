//! Filename to export-category classifiers.

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{EnumExportCategory, ExportError};

/// Resolves an [`EnumExportCategory`] from a destination file name.
pub trait CategoryClassifier: Send + Sync {
    fn classify(&self, file_name: &str) -> EnumExportCategory;
}

impl<F> CategoryClassifier for F
where
    F: Fn(&str) -> EnumExportCategory + Send + Sync,
{
    fn classify(&self, file_name: &str) -> EnumExportCategory {
        self(file_name)
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region SubstringClassifier

/// Case-sensitive substring match; first match wins in the order
/// `complaint -> training -> pir`, otherwise `default`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierSubstring;

impl CategoryClassifier for ClassifierSubstring {
    fn classify(&self, file_name: &str) -> EnumExportCategory {
        EnumExportCategory::ALL
            .into_iter()
            .filter(|category| *category != EnumExportCategory::Default)
            .find(|category| file_name.contains(category.as_str()))
            .unwrap_or(EnumExportCategory::Default)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PatternClassifier

/// Pattern interpretation mode for [`ClassifierPatterns`] rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumPatternMode {
    /// Plain substring, case-sensitive.
    #[default]
    Literal,
    /// Shell-like wildcards matched against the whole file name.
    Glob,
    /// Regular expression searched anywhere in the file name.
    Regex,
}

#[derive(Debug, Clone)]
enum TypeCompiledPattern {
    Literal(String),
    Glob(GlobMatcher),
    Regex(Regex),
}

impl TypeCompiledPattern {
    fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Literal(p) => value.contains(p.as_str()),
            Self::Glob(p) => p.is_match(value),
            Self::Regex(p) => p.is_match(value),
        }
    }
}

/// Ordered `(pattern, category)` rules; the first matching rule wins.
#[derive(Debug, Clone)]
pub struct ClassifierPatterns {
    l_rules: Vec<(TypeCompiledPattern, EnumExportCategory)>,
    category_fallback: EnumExportCategory,
}

impl ClassifierPatterns {
    /// Compile `rules` under `rule_pattern`.
    pub fn new<S: AsRef<str>>(
        rules: &[(S, EnumExportCategory)],
        rule_pattern: EnumPatternMode,
        category_fallback: EnumExportCategory,
    ) -> Result<Self, ExportError> {
        let mut l_rules = Vec::with_capacity(rules.len());
        for (pattern, category) in rules {
            l_rules.push((_compile(pattern.as_ref(), rule_pattern)?, *category));
        }
        Ok(Self {
            l_rules,
            category_fallback,
        })
    }

    /// Number of compiled rules.
    pub fn len(&self) -> usize {
        self.l_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.l_rules.is_empty()
    }
}

impl CategoryClassifier for ClassifierPatterns {
    fn classify(&self, file_name: &str) -> EnumExportCategory {
        self.l_rules
            .iter()
            .find(|(pattern, _)| pattern.is_match(file_name))
            .map_or(self.category_fallback, |(_, category)| *category)
    }
}

fn _compile(pattern: &str, rule_pattern: EnumPatternMode) -> Result<TypeCompiledPattern, ExportError> {
    match rule_pattern {
        EnumPatternMode::Literal => Ok(TypeCompiledPattern::Literal(pattern.to_string())),
        EnumPatternMode::Glob => {
            let matcher = Glob::new(pattern)
                .map_err(|e| ExportError::InvalidPattern(format!("{pattern:?}: {e}")))?
                .compile_matcher();
            Ok(TypeCompiledPattern::Glob(matcher))
        }
        EnumPatternMode::Regex => {
            let regex = Regex::new(pattern)
                .map_err(|e| ExportError::InvalidPattern(format!("{pattern:?}: {e}")))?;
            Ok(TypeCompiledPattern::Regex(regex))
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("complaints_2024.xls", EnumExportCategory::Complaint)]
    #[test_case("training_complaint_log.xls", EnumExportCategory::Complaint ; "complaint wins over earlier training")]
    #[test_case("training_export.xls", EnumExportCategory::Training)]
    #[test_case("pir_training.xlsx", EnumExportCategory::Training ; "training wins over pir")]
    #[test_case("pir_q3.xlsx", EnumExportCategory::Pir)]
    #[test_case("Complaints.xlsx", EnumExportCategory::Default ; "matching is case sensitive")]
    #[test_case("staff.xlsx", EnumExportCategory::Default)]
    fn test_substring_classifier(file_name: &str, expected: EnumExportCategory) {
        assert_eq!(ClassifierSubstring.classify(file_name), expected);
    }

    #[test]
    fn test_pattern_classifier_glob_first_match_wins() -> Result<(), ExportError> {
        let classifier = ClassifierPatterns::new(
            &[
                ("*incident*", EnumExportCategory::Pir),
                ("*.xls", EnumExportCategory::Complaint),
            ],
            EnumPatternMode::Glob,
            EnumExportCategory::Default,
        )?;
        assert_eq!(classifier.len(), 2);
        assert_eq!(
            classifier.classify("incident_review.xls"),
            EnumExportCategory::Pir
        );
        assert_eq!(classifier.classify("log.xls"), EnumExportCategory::Complaint);
        assert_eq!(classifier.classify("log.xlsx"), EnumExportCategory::Default);
        Ok(())
    }

    #[test]
    fn test_pattern_classifier_regex_and_literal() -> Result<(), ExportError> {
        let classifier = ClassifierPatterns::new(
            &[("(?i)^complaint", EnumExportCategory::Complaint)],
            EnumPatternMode::Regex,
            EnumExportCategory::Training,
        )?;
        assert_eq!(
            classifier.classify("COMPLAINTS.xlsx"),
            EnumExportCategory::Complaint
        );
        assert_eq!(classifier.classify("x.xlsx"), EnumExportCategory::Training);

        let classifier = ClassifierPatterns::new(
            &[("cqc", EnumExportCategory::Pir)],
            EnumPatternMode::Literal,
            EnumExportCategory::Default,
        )?;
        assert_eq!(classifier.classify("site_cqc.xls"), EnumExportCategory::Pir);
        Ok(())
    }

    #[test]
    fn test_pattern_classifier_rejects_invalid_pattern() {
        let res = ClassifierPatterns::new(
            &[("([unclosed", EnumExportCategory::Pir)],
            EnumPatternMode::Regex,
            EnumExportCategory::Default,
        );
        assert!(matches!(res, Err(ExportError::InvalidPattern(_))));
    }

    #[test]
    fn test_closure_is_a_classifier() {
        let classifier = |_: &str| EnumExportCategory::Pir;
        assert_eq!(classifier.classify("anything"), EnumExportCategory::Pir);
    }
}
