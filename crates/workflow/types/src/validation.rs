//! Validation verdicts
//!
//! A [`ValidationResult`] starts valid and turns invalid on the first
//! error-severity message. It never turns valid again, so verdicts from
//! sub-objects can be merged in any order and the combined validity is the
//! logical AND of all of them.

use crate::Severity;
use serde::{Deserialize, Serialize};

/// Delimiter used by [`ValidationResult::render`]
pub const VALIDATION_MESSAGE_DELIMITER: &str = " | ";

/// One message recorded during validation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    pub text: String,
    pub severity: Severity,
}

impl ValidationMessage {
    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }
}

impl std::fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Composable validation verdict
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    is_valid: bool,
    messages: Vec<ValidationMessage>,
}

impl ValidationResult {
    /// Create an empty, valid verdict
    pub fn new() -> Self {
        Self {
            is_valid: true,
            messages: Vec::new(),
        }
    }

    /// Record an informational note. Validity is unaffected.
    pub fn add_message(&mut self, text: impl Into<String>) -> &mut Self {
        self.messages.push(ValidationMessage {
            text: text.into(),
            severity: Severity::Info,
        });
        self
    }

    /// Record an error. The verdict becomes invalid permanently.
    pub fn add_error_message(&mut self, text: impl Into<String>) -> &mut Self {
        self.messages.push(ValidationMessage {
            text: text.into(),
            severity: Severity::Error,
        });
        self.is_valid = false;
        self
    }

    /// Record an error unless `present` holds.
    ///
    /// Required-field checks use this; the optional sub-object itself is
    /// validated separately through [`merge`](Self::merge).
    pub fn require(&mut self, present: bool, text: impl Into<String>) -> &mut Self {
        if !present {
            self.add_error_message(text);
        }
        self
    }

    /// Fold a child verdict in, prefixing each of its messages with `label`.
    ///
    /// An absent child is a no-op.
    pub fn merge(&mut self, other: Option<&ValidationResult>, label: &str) -> &mut Self {
        let Some(other) = other else {
            return self;
        };

        self.messages
            .extend(other.messages.iter().map(|message| ValidationMessage {
                text: format!("{}: {}", label, message.text),
                severity: message.severity,
            }));
        self.is_valid = self.is_valid && other.is_valid;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    /// Error-severity messages only, in recording order
    pub fn errors(&self) -> impl Iterator<Item = &ValidationMessage> {
        self.messages.iter().filter(|m| m.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Join all messages for a single log line
    pub fn render(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join(VALIDATION_MESSAGE_DELIMITER)
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_is_valid_and_empty() {
        let result = ValidationResult::new();
        assert!(result.is_valid());
        assert!(result.is_empty());
        assert_eq!(result.render(), "");
    }

    #[test]
    fn test_note_keeps_validity() {
        let mut result = ValidationResult::new();
        result.add_message("storage account not set, using default.");
        assert!(result.is_valid());
        assert_eq!(result.messages().len(), 1);
        assert_eq!(result.messages()[0].severity, Severity::Info);
    }

    #[test]
    fn test_error_is_permanent() {
        let mut result = ValidationResult::new();
        result.add_error_message("name is missing.");
        result.add_message("later note");
        assert!(!result.is_valid());
        assert_eq!(result.error_count(), 1);
    }

    #[test]
    fn test_require() {
        let mut result = ValidationResult::new();
        result.require(true, "never recorded");
        assert!(result.is_empty());
        result.require(false, "target is missing.");
        assert!(!result.is_valid());
        assert_eq!(result.messages()[0].text, "target is missing.");
    }

    #[test]
    fn test_merge_prefixes_labels_and_ands_validity() {
        let mut child = ValidationResult::new();
        child.add_error_message("container name is missing.");
        child.add_message("storage account defaulted.");

        let mut parent = ValidationResult::new();
        parent.add_message("checked");
        parent.merge(Some(&child), "TargetBlobStorageInfo");

        assert!(!parent.is_valid());
        assert_eq!(parent.messages().len(), 3);
        assert_eq!(
            parent.messages()[1].text,
            "TargetBlobStorageInfo: container name is missing."
        );
        assert_eq!(parent.messages()[2].severity, Severity::Info);
    }

    #[test]
    fn test_merge_absent_is_noop() {
        let mut result = ValidationResult::new();
        result.add_message("note");
        let before = result.clone();
        result.merge(None, "Source");
        assert_eq!(result, before);
    }

    #[test]
    fn test_render_uses_delimiter() {
        let mut result = ValidationResult::new();
        result.add_error_message("a");
        result.add_error_message("b");
        assert_eq!(result.render(), "a | b");
        assert_eq!(result.to_string(), "a | b");
    }

    fn arb_message() -> impl Strategy<Value = (String, bool)> {
        ("[a-z ]{1,12}", any::<bool>())
    }

    fn build(messages: &[(String, bool)]) -> ValidationResult {
        let mut result = ValidationResult::new();
        for (text, is_error) in messages {
            if *is_error {
                result.add_error_message(text.clone());
            } else {
                result.add_message(text.clone());
            }
        }
        result
    }

    proptest! {
        #[test]
        fn prop_validity_matches_error_presence(
            messages in prop::collection::vec(arb_message(), 0..12),
            children in prop::collection::vec(prop::collection::vec(arb_message(), 0..5), 0..4),
        ) {
            let mut result = build(&messages);
            for (i, child) in children.iter().enumerate() {
                result.merge(Some(&build(child)), &format!("child{}", i));
            }
            let has_error = result.messages().iter().any(|m| m.severity == Severity::Error);
            prop_assert_eq!(result.is_valid(), !has_error);
        }

        #[test]
        fn prop_merge_order_does_not_change_validity(
            base in prop::collection::vec(arb_message(), 0..5),
            a in prop::collection::vec(arb_message(), 0..5),
            b in prop::collection::vec(arb_message(), 0..5),
        ) {
            let (child_a, child_b) = (build(&a), build(&b));

            let mut ab = build(&base);
            ab.merge(Some(&child_a), "A").merge(Some(&child_b), "B");

            let mut ba = build(&base);
            ba.merge(Some(&child_b), "B").merge(Some(&child_a), "A");

            prop_assert_eq!(ab.is_valid(), ba.is_valid());
        }

        #[test]
        fn prop_merge_absent_changes_nothing(base in prop::collection::vec(arb_message(), 0..8)) {
            let mut merged = build(&base);
            merged.merge(None, "Absent");
            prop_assert_eq!(merged, build(&base));
        }
    }
}
