//! Typed BigQuery load options built from a string [`JobConfig`].

use hourload_core::JobConfig;
use serde::Serialize;

use crate::error::BigQueryError;

/// The `configuration.load` fields this service sets, besides source URIs and
/// destination. Serializes to the REST field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_disposition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_disposition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_delimiter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_leading_rows: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_marker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bad_records: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_jagged_rows: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_quoted_newlines: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_unknown_values: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autodetect: Option<bool>,
}

fn parse_int(key: &str, value: &str) -> Result<i64, BigQueryError> {
    value.trim().parse().map_err(|_| {
        BigQueryError::InvalidJobConfig(format!("'{}' must be an integer, got '{}'", key, value))
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, BigQueryError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(BigQueryError::InvalidJobConfig(format!(
            "'{}' must be a boolean, got '{}'",
            key, value
        ))),
    }
}

impl TryFrom<&JobConfig> for LoadOptions {
    type Error = BigQueryError;

    fn try_from(config: &JobConfig) -> Result<Self, Self::Error> {
        let mut opts = LoadOptions::default();
        for (key, value) in config.iter() {
            let text = || Some(value.to_string());
            match key {
                "create_disposition" => opts.create_disposition = text(),
                "write_disposition" => opts.write_disposition = text(),
                "source_format" => opts.source_format = text(),
                "field_delimiter" => opts.field_delimiter = text(),
                "skip_leading_rows" => opts.skip_leading_rows = Some(parse_int(key, value)?),
                "quote_character" => opts.quote = text(),
                "encoding" => opts.encoding = text(),
                "null_marker" => opts.null_marker = text(),
                "max_bad_records" => opts.max_bad_records = Some(parse_int(key, value)?),
                "allow_jagged_rows" => opts.allow_jagged_rows = Some(parse_bool(key, value)?),
                "allow_quoted_newlines" => {
                    opts.allow_quoted_newlines = Some(parse_bool(key, value)?)
                }
                "ignore_unknown_values" => {
                    opts.ignore_unknown_values = Some(parse_bool(key, value)?)
                }
                "autodetect" => opts.autodetect = Some(parse_bool(key, value)?),
                unknown => {
                    return Err(BigQueryError::InvalidJobConfig(format!(
                        "unknown option '{}'",
                        unknown
                    )))
                }
            }
        }
        Ok(opts)
    }
}
