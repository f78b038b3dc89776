//! Hourly partition addressing.
//!
//! One hour of data has two names: the warehouse partition id (`2023010203`,
//! used as the `$` table suffix) and the hive-style storage prefix
//! (`year=2023/month=01/day=02/hour=03`) under which the source files live.
//! Both are derived from the same hour-aligned timestamp here and nowhere else.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{HourloadError, Result};

/// `strftime` layout of the warehouse partition id.
const PARTITION_ID_FORMAT: &str = "%Y%m%d%H";

/// `strftime` layout of the hive storage prefix.
const STORAGE_PREFIX_FORMAT: &str = "year=%Y/month=%m/day=%d/hour=%H";

const PARTITION_ID_LEN: usize = 10;

// ── Free functions ────────────────────────────────────────────

/// Format a timestamp as a partition id (`YYYYMMDDHH`). Anything finer than
/// the hour is dropped.
pub fn encode_partition_id(timestamp: NaiveDateTime) -> String {
    timestamp.format(PARTITION_ID_FORMAT).to_string()
}

/// Parse a partition id back into its hour-aligned timestamp.
pub fn decode_partition_id(partition_id: &str) -> Result<NaiveDateTime> {
    let malformed = |reason: &str| HourloadError::MalformedPartition {
        input: partition_id.to_string(),
        reason: reason.to_string(),
    };

    if partition_id.len() != PARTITION_ID_LEN || !partition_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("expected exactly 10 digits (YYYYMMDDHH)"));
    }

    // All ASCII digits, so slicing on byte offsets is safe and parsing can't fail.
    let field = |range: std::ops::Range<usize>| -> u32 {
        partition_id[range].parse().unwrap_or_default()
    };
    let year = field(0..4) as i32;
    let month = field(4..6);
    let day = field(6..8);
    let hour = field(8..10);

    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| malformed("not a valid calendar date"))?;
    date.and_hms_opt(hour, 0, 0)
        .ok_or_else(|| malformed("hour must be between 00 and 23"))
}

/// Format a timestamp as a hive-style storage prefix
/// (`year=YYYY/month=MM/day=DD/hour=HH`).
pub fn encode_storage_prefix(timestamp: NaiveDateTime) -> String {
    timestamp.format(STORAGE_PREFIX_FORMAT).to_string()
}

/// Storage prefix for a partition id.
pub fn storage_prefix_from_partition_id(partition_id: &str) -> Result<String> {
    decode_partition_id(partition_id).map(encode_storage_prefix)
}

/// `gs://` locator matching every object below `storage_prefix` in `bucket`.
pub fn glob_path(bucket: &str, storage_prefix: &str) -> String {
    let prefix = storage_prefix.trim_end_matches('/');
    format!("gs://{}/{}/*", bucket, prefix)
}

// ── PartitionKey ──────────────────────────────────────────────

/// An hour-aligned, timezone-naive point in time identifying one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey(NaiveDateTime);

impl PartitionKey {
    /// Build a key from any timestamp, truncating it to the hour.
    pub fn from_datetime(timestamp: NaiveDateTime) -> Self {
        let hour = timestamp.date().and_hms_opt(timestamp.hour(), 0, 0);
        // and_hms_opt only fails for out-of-range components; hour() is always valid.
        Self(hour.unwrap_or(timestamp))
    }

    /// The partition one hour before `now`.
    pub fn last_hour(now: DateTime<Utc>) -> Self {
        Self::from_datetime((now - Duration::hours(1)).naive_utc())
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.0
    }

    pub fn partition_id(&self) -> String {
        encode_partition_id(self.0)
    }

    pub fn storage_prefix(&self) -> String {
        encode_storage_prefix(self.0)
    }

    /// Table id addressing just this partition, e.g. `events$2023010203`.
    pub fn table_with_partition(&self, table_id: &str) -> String {
        format!("{}${}", table_id, self.partition_id())
    }

    /// Source glob for this partition within `bucket`.
    pub fn glob_in_bucket(&self, bucket: &str) -> String {
        glob_path(bucket, &self.storage_prefix())
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.partition_id())
    }
}

impl FromStr for PartitionKey {
    type Err = HourloadError;

    fn from_str(s: &str) -> Result<Self> {
        decode_partition_id(s).map(Self)
    }
}

impl Serialize for PartitionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.partition_id())
    }
}

impl<'de> Deserialize<'de> for PartitionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
