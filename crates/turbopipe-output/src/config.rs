//! Output configuration
//!
//! Configuration follows a tagged layout: `type` names the output and the
//! section of the same name carries its settings. Sections for other types
//! may be present and are ignored.
//!
//! ```yaml
//! type: retry
//! retry:
//!   output:
//!     type: stdout
//!   max_retries: 3
//!   backoff:
//!     initial_interval: 100ms
//!     max_interval: 1s
//!     max_elapsed_time: 0s
//! ```

use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};
use std::path::Path;
use turbopipe_core::retry::RetriesConfig;

/// Configuration for any output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output type name, resolved through the [`Registry`](crate::Registry)
    #[serde(rename = "type")]
    pub kind: String,
    /// Settings for `type: retry`
    pub retry: RetryConfig,
    /// Settings for `type: stdout`
    pub stdout: StdoutConfig,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            kind: "stdout".to_string(),
            retry: RetryConfig::default(),
            stdout: StdoutConfig::default(),
        }
    }
}

impl OutputConfig {
    /// A default config of the given type.
    pub fn of_type(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// A `retry` config wrapping `child`.
    pub fn retry(child: OutputConfig, retries: RetriesConfig) -> Self {
        Self {
            kind: "retry".to_string(),
            retry: RetryConfig {
                output: Some(Box::new(child)),
                retries,
            },
            ..Self::default()
        }
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Render only the settings relevant to this output's type.
    ///
    /// Child outputs are sanitised recursively; a missing child renders as
    /// an empty object.
    pub fn sanitised(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(self.kind.clone()));
        match self.kind.as_str() {
            "retry" => {
                let child = self
                    .retry
                    .output
                    .as_ref()
                    .map(|child| child.sanitised())
                    .unwrap_or_else(|| json!({}));
                let mut section = match serde_json::to_value(&self.retry.retries) {
                    Ok(Value::Object(section)) => section,
                    _ => Map::new(),
                };
                section.insert("output".to_string(), child);
                map.insert("retry".to_string(), Value::Object(section));
            }
            "stdout" => {
                map.insert(
                    "stdout".to_string(),
                    json!({ "delimiter": self.stdout.delimiter }),
                );
            }
            _ => {}
        }
        Value::Object(map)
    }
}

/// Settings for the `retry` output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// The output to deliver through
    #[serde(
        serialize_with = "serialize_child",
        deserialize_with = "deserialize_child"
    )]
    pub output: Option<Box<OutputConfig>>,
    /// Retry budget and backoff timing
    #[serde(flatten)]
    pub retries: RetriesConfig,
}

/// Settings for the `stdout` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StdoutConfig {
    /// Written after every message part
    pub delimiter: String,
}

impl Default for StdoutConfig {
    fn default() -> Self {
        Self {
            delimiter: "\n".to_string(),
        }
    }
}

fn serialize_child<S>(
    child: &Option<Box<OutputConfig>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match child {
        Some(child) => child.serialize(serializer),
        None => Map::new().serialize(serializer),
    }
}

fn deserialize_child<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Box<OutputConfig>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(|child: OutputConfig| Some(Box::new(child)))
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_stdout() {
        let config = OutputConfig::default();
        assert_eq!(config.kind, "stdout");
        assert!(config.retry.output.is_none());
        assert_eq!(config.stdout.delimiter, "\n");
    }

    #[test]
    fn test_missing_child_serializes_as_empty_object() {
        let config = OutputConfig::of_type("retry");
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["retry"]["output"], json!({}));
        assert_eq!(json["retry"]["max_retries"], 0);
        assert_eq!(json["retry"]["backoff"]["initial_interval"], "100ms");
    }

    #[test]
    fn test_empty_child_deserializes_as_none() {
        let config =
            OutputConfig::from_json_str(r#"{"type": "retry", "retry": {"output": {}}}"#).unwrap();
        assert!(config.retry.output.is_none());

        let config =
            OutputConfig::from_json_str(r#"{"type": "retry", "retry": {"output": null}}"#)
                .unwrap();
        assert!(config.retry.output.is_none());
    }

    #[test]
    fn test_sanitised_keeps_relevant_sections() {
        let config = OutputConfig::retry(OutputConfig::of_type("drop"), RetriesConfig::default());
        let sanitised = config.sanitised();

        assert_eq!(sanitised["type"], "retry");
        assert!(sanitised.get("stdout").is_none());
        assert_eq!(sanitised["retry"]["output"], json!({"type": "drop"}));
        assert_eq!(sanitised["retry"]["backoff"]["max_interval"], "1s");
    }

    #[test]
    fn test_sanitised_without_child() {
        let sanitised = OutputConfig::of_type("retry").sanitised();
        assert_eq!(sanitised["retry"]["output"], json!({}));
    }

    #[test]
    fn test_sanitised_stdout() {
        let sanitised = OutputConfig::default().sanitised();
        assert_eq!(sanitised, json!({"type": "stdout", "stdout": {"delimiter": "\n"}}));
    }
}
