//! Logging configuration for Blobfs
//!
//! Events are emitted through `tracing`:
//!
//! - **DEBUG**: composite mutations (markers created, objects copied/deleted)
//! - **TRACE**: enumeration details (raw listing sizes, classification)
//!
//! Object metadata often carries credentials or tokens supplied by callers,
//! so it is redacted by default. Tenant identifiers are never logged; events
//! carry external URIs or counts instead.

use std::borrow::Cow;
use std::collections::HashSet;

use crate::store::ObjectMetadata;

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to redact sensitive metadata values (default: true)
    pub redact_sensitive: bool,

    /// Metadata key patterns whose values are redacted (case-insensitive,
    /// substring match).
    pub redact_metadata_keys: HashSet<String>,

    /// Whether to include metadata values in logs at all (default: false)
    pub log_metadata_values: bool,

    /// Maximum length of logged values before truncation (default: 200)
    pub max_value_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        let redact_metadata_keys = [
            "PASSWORD",
            "PASSWD",
            "SECRET",
            "TOKEN",
            "KEY",
            "CREDENTIAL",
            "AUTH",
            "SIGNATURE",
            "SAS",
            "SESSION",
            "COOKIE",
            "CONNECTION_STRING",
        ]
        .iter()
        .map(|p| p.to_string())
        .collect();

        Self {
            redact_sensitive: true,
            redact_metadata_keys,
            log_metadata_values: false,
            max_value_length: 200,
        }
    }
}

impl LogConfig {
    /// Create a new log configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable sensitive data redaction (UNSAFE - use only for debugging)
    pub fn unsafe_disable_redaction(mut self) -> Self {
        self.redact_sensitive = false;
        self
    }

    /// Add a metadata key pattern to redact
    pub fn redact_metadata_key(mut self, pattern: &str) -> Self {
        self.redact_metadata_keys.insert(pattern.to_uppercase());
        self
    }

    /// Include metadata values in logs (redaction still applies)
    pub fn log_metadata_values(mut self) -> Self {
        self.log_metadata_values = true;
        self
    }

    /// Set maximum length for logged values
    pub fn max_value_length(mut self, len: usize) -> Self {
        self.max_value_length = len;
        self
    }

    /// Check if a metadata key's value should be redacted
    pub fn should_redact_key(&self, key: &str) -> bool {
        if !self.redact_sensitive {
            return false;
        }
        let upper = key.to_uppercase();
        self.redact_metadata_keys
            .iter()
            .any(|pattern| upper.contains(pattern))
    }

    /// Render a metadata map for a log line.
    ///
    /// Without `log_metadata_values` only the keys are shown. Keys are
    /// sorted so log lines are stable.
    pub fn format_metadata(&self, metadata: &ObjectMetadata) -> String {
        if metadata.is_empty() {
            return "{}".to_string();
        }

        let mut keys: Vec<&String> = metadata.keys().collect();
        keys.sort();

        let rendered: Vec<String> = keys
            .into_iter()
            .map(|key| {
                let key_out = sanitize_for_log(key);
                if !self.log_metadata_values {
                    return key_out;
                }
                let value = if self.should_redact_key(key) {
                    Cow::Borrowed("[REDACTED]")
                } else {
                    self.truncate(&metadata[key])
                };
                format!("{key_out}={}", sanitize_for_log(&value))
            })
            .collect();

        format!("{{{}}}", rendered.join(", "))
    }

    /// Truncate value if it exceeds max length
    ///
    /// Handles UTF-8 char boundaries properly to avoid panics on multi-byte chars.
    fn truncate<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if value.len() <= self.max_value_length {
            Cow::Borrowed(value)
        } else {
            let mut end = self.max_value_length;
            while end > 0 && !value.is_char_boundary(end) {
                end -= 1;
            }
            Cow::Owned(format!(
                "{}...[truncated {} bytes]",
                &value[..end],
                value.len() - end
            ))
        }
    }
}

/// Escape characters that could forge extra log lines.
pub fn sanitize_for_log(input: &str) -> String {
    input
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
        .chars()
        .filter(|c| !c.is_control() || *c == ' ')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(pairs: &[(&str, &str)]) -> ObjectMetadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_redaction() {
        let config = LogConfig::new();
        assert!(config.should_redact_key("api_key"));
        assert!(config.should_redact_key("x-amz-security-token"));
        assert!(config.should_redact_key("sas"));
        assert!(!config.should_redact_key("content-type"));
        assert!(!config.should_redact_key("owner"));
    }

    #[test]
    fn test_values_hidden_by_default() {
        let config = LogConfig::new();
        let formatted = config.format_metadata(&metadata(&[("owner", "ops"), ("token", "abc")]));
        assert_eq!(formatted, "{owner, token}");
    }

    #[test]
    fn test_values_redacted_when_logged() {
        let config = LogConfig::new().log_metadata_values();
        let formatted = config.format_metadata(&metadata(&[("owner", "ops"), ("token", "abc")]));
        assert_eq!(formatted, "{owner=ops, token=[REDACTED]}");
    }

    #[test]
    fn test_disabled_redaction() {
        let config = LogConfig::new()
            .log_metadata_values()
            .unsafe_disable_redaction();
        let formatted = config.format_metadata(&metadata(&[("token", "abc")]));
        assert_eq!(formatted, "{token=abc}");
    }

    #[test]
    fn test_custom_pattern() {
        let config = LogConfig::new().redact_metadata_key("internal");
        assert!(config.should_redact_key("x-internal-id"));
    }

    #[test]
    fn test_truncation() {
        let config = LogConfig::new().max_value_length(20).log_metadata_values();
        let long_value = "a".repeat(50);
        let formatted = config.format_metadata(&metadata(&[("note", long_value.as_str())]));
        assert!(formatted.starts_with("{note=aaaaaaaaaaaaaaaaaaaa..."));
        assert!(formatted.contains("[truncated 30 bytes]"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let config = LogConfig::new().max_value_length(3);
        let truncated = config.truncate("ééé");
        assert!(truncated.starts_with("é..."));
    }

    #[test]
    fn test_log_injection_prevention() {
        let config = LogConfig::new().log_metadata_values();
        let formatted = config.format_metadata(&metadata(&[("note", "ok\n[ERROR] forged")]));
        assert!(!formatted.contains('\n'));
        assert!(formatted.contains("\\n"));
    }
}
