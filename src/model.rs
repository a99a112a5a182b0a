//! Data contracts shared by the submission controller and the result viewer.
//!
//! Wire types mirror the translation service's JSON bodies field for field.

use serde::{Deserialize, Serialize};

/// Minimum number of characters (after trimming) a requirement needs before it can be submitted.
pub const MIN_REQUIREMENT_CHARS: usize = 10;

/// The free-text business requirement being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementInput {
    pub text: String,
}

impl RequirementInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Number of characters once surrounding whitespace is removed.
    pub fn trimmed_len(&self) -> usize {
        self.text.trim().chars().count()
    }

    /// Sole admission criterion for submission.
    pub fn is_valid(&self) -> bool {
        self.trimmed_len() >= MIN_REQUIREMENT_CHARS
    }

    /// Validation feedback shown under the input on every keystroke.
    pub fn validation(&self) -> ValidationStatus {
        if self.text.is_empty() {
            return ValidationStatus::Empty;
        }
        let chars = self.trimmed_len();
        if chars >= MIN_REQUIREMENT_CHARS {
            ValidationStatus::Valid { chars }
        } else {
            ValidationStatus::TooShort { chars }
        }
    }
}

/// Validation feedback for the requirement input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Nothing typed yet.
    Empty,
    /// Something typed, but below the minimum length.
    TooShort { chars: usize },
    /// Ready to submit.
    Valid { chars: usize },
}

impl ValidationStatus {
    pub fn message(&self) -> String {
        match self {
            Self::Empty => format!("Enter at least {} characters", MIN_REQUIREMENT_CHARS),
            Self::TooShort { chars } => format!(
                "Enter at least {} characters (currently {})",
                MIN_REQUIREMENT_CHARS, chars
            ),
            Self::Valid { chars } => format!("Ready to translate ({} characters)", chars),
        }
    }
}

/// The four artifacts produced by one successful translation.
///
/// All fields are required: the service returns all four or fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub technical_spec: String,
    pub feasibility: String,
    pub estimation: String,
    pub prototype_code: String,
}

/// Body of `POST /api/translate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslateRequest {
    pub business_requirement: String,
}

/// Body of a non-success response.
///
/// `detail` is kept as a raw value because the service may send validation
/// errors as a list of objects rather than a string.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// The server-supplied message, when it is a non-empty string.
    pub fn message(self) -> Option<String> {
        match self.detail {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// One of the four named parts of a translation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Section {
    #[default]
    TechnicalSpec,
    Feasibility,
    Estimation,
    PrototypeCode,
}

impl Section {
    /// Fixed display and export order.
    pub const ALL: [Section; 4] = [
        Section::TechnicalSpec,
        Section::Feasibility,
        Section::Estimation,
        Section::PrototypeCode,
    ];

    /// Identifier matching the wire field name.
    pub fn id(self) -> &'static str {
        match self {
            Self::TechnicalSpec => "technical_spec",
            Self::Feasibility => "feasibility",
            Self::Estimation => "estimation",
            Self::PrototypeCode => "prototype_code",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Heading used in the exported document.
    pub fn title(self) -> &'static str {
        match self {
            Self::TechnicalSpec => "Technical Specification",
            Self::Feasibility => "Feasibility Assessment",
            Self::Estimation => "Effort Estimate",
            Self::PrototypeCode => "Prototype Code",
        }
    }

    /// Short tab label.
    pub fn label(self) -> &'static str {
        match self {
            Self::TechnicalSpec => "Tech Spec",
            Self::Feasibility => "Feasibility",
            Self::Estimation => "Estimate",
            Self::PrototypeCode => "Prototype",
        }
    }

    /// Zero-based position in [`Section::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::TechnicalSpec => 0,
            Self::Feasibility => 1,
            Self::Estimation => 2,
            Self::PrototypeCode => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Self {
        match self {
            Self::TechnicalSpec => Self::Feasibility,
            Self::Feasibility => Self::Estimation,
            Self::Estimation => Self::PrototypeCode,
            Self::PrototypeCode => Self::TechnicalSpec,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::TechnicalSpec => Self::PrototypeCode,
            Self::Feasibility => Self::TechnicalSpec,
            Self::Estimation => Self::Feasibility,
            Self::PrototypeCode => Self::Estimation,
        }
    }

    /// The text of this section within a result.
    pub fn content(self, result: &TranslationResult) -> &str {
        match self {
            Self::TechnicalSpec => &result.technical_spec,
            Self::Feasibility => &result.feasibility,
            Self::Estimation => &result.estimation,
            Self::PrototypeCode => &result.prototype_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_boundary() {
        assert!(!RequirementInput::new("123456789").is_valid());
        assert!(RequirementInput::new("1234567890").is_valid());
    }

    #[test]
    fn test_validity_ignores_surrounding_whitespace() {
        assert!(!RequirementInput::new("   123456789   ").is_valid());
        assert!(RequirementInput::new("\n 1234567890 \t").is_valid());
    }

    #[test]
    fn test_whitespace_only_never_valid() {
        let input = RequirementInput::new(" ".repeat(50));
        assert!(!input.is_valid());
        assert_eq!(input.validation(), ValidationStatus::TooShort { chars: 0 });
    }

    #[test]
    fn test_validity_counts_characters_not_bytes() {
        // 10 multi-byte characters
        let input = RequirementInput::new("送料無料にしたい商品");
        assert_eq!(input.trimmed_len(), 10);
        assert!(input.is_valid());
    }

    #[test]
    fn test_validation_status() {
        assert_eq!(RequirementInput::default().validation(), ValidationStatus::Empty);
        assert_eq!(
            RequirementInput::new("short").validation(),
            ValidationStatus::TooShort { chars: 5 }
        );
        assert_eq!(
            RequirementInput::new("free shipping over 10k").validation(),
            ValidationStatus::Valid { chars: 22 }
        );
    }

    #[test]
    fn test_validation_message_includes_count() {
        let msg = ValidationStatus::TooShort { chars: 4 }.message();
        assert!(msg.contains("currently 4"));
        assert!(ValidationStatus::Valid { chars: 12 }.message().contains("12"));
    }

    #[test]
    fn test_translate_request_serialization() {
        let req = TranslateRequest {
            business_requirement: "show order history".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "business_requirement": "show order history" })
        );
    }

    #[test]
    fn test_translation_result_requires_all_fields() {
        let partial = r#"{"technical_spec":"a","feasibility":"b","estimation":"c"}"#;
        assert!(serde_json::from_str::<TranslationResult>(partial).is_err());

        let full = r#"{"technical_spec":"a","feasibility":"b","estimation":"c","prototype_code":"d"}"#;
        let result: TranslationResult = serde_json::from_str(full).unwrap();
        assert_eq!(result.prototype_code, "d");
    }

    #[test]
    fn test_error_body_message() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail":"quota exceeded"}"#).unwrap();
        assert_eq!(body.message(), Some("quota exceeded".to_string()));

        let body: ErrorBody = serde_json::from_str(r#"{"detail":""}"#).unwrap();
        assert_eq!(body.message(), None);

        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":[{"loc":["body"],"msg":"too short"}]}"#).unwrap();
        assert_eq!(body.message(), None);

        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.message(), None);
    }

    #[test]
    fn test_section_order_and_ids() {
        let ids: Vec<&str> = Section::ALL.iter().map(|s| s.id()).collect();
        assert_eq!(
            ids,
            ["technical_spec", "feasibility", "estimation", "prototype_code"]
        );
        assert_eq!(Section::default(), Section::TechnicalSpec);
    }

    #[test]
    fn test_section_from_id() {
        assert_eq!(Section::from_id("estimation"), Some(Section::Estimation));
        assert_eq!(Section::from_id("summary"), None);
    }

    #[test]
    fn test_section_index_roundtrip() {
        for section in Section::ALL {
            assert_eq!(Section::from_index(section.index()), Some(section));
        }
        assert_eq!(Section::from_index(4), None);
    }

    #[test]
    fn test_section_next_prev_inverse() {
        for section in Section::ALL {
            assert_eq!(section.next().prev(), section);
            assert_eq!(section.prev().next(), section);
        }
        assert_eq!(Section::PrototypeCode.next(), Section::TechnicalSpec);
        assert_eq!(Section::TechnicalSpec.prev(), Section::PrototypeCode);
    }

    #[test]
    fn test_section_content() {
        let result = TranslationResult {
            technical_spec: "a".to_string(),
            feasibility: "b".to_string(),
            estimation: "c".to_string(),
            prototype_code: "d".to_string(),
        };
        let contents: Vec<&str> = Section::ALL.iter().map(|s| s.content(&result)).collect();
        assert_eq!(contents, ["a", "b", "c", "d"]);
    }
}
