use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Label -> count, iterated in the order the keys appeared in the payload.
pub type FrequencyMap = IndexMap<String, u64>;

/// Payload of `GET /api/static`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticInfo {
    pub version: String,
    pub cache_size: u64,
    pub name_servers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineBucket {
    pub start: DateTime<FixedOffset>,
    pub requests: u64,
}

impl TimelineBucket {
    pub fn empty(start: DateTime<FixedOffset>) -> Self {
        TimelineBucket { start, requests: 0 }
    }
}

/// Payload of `GET /api/dynamic`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicSnapshot {
    pub num_hits: u64,
    pub num_total: u64,
    /// Fraction in [0, 1]
    pub percent_from_cache: Option<f64>,
    pub top_query_domains: FrequencyMap,
    pub top_query_types: FrequencyMap,
    pub top_query_sources: FrequencyMap,
    pub unknown_domains: FrequencyMap,
    pub lookup_timeline: Vec<TimelineBucket>,
}

impl DynamicSnapshot {
    /// Cache-hit bar width in percent; a missing fraction counts as 0.
    pub fn cache_percent(&self) -> f64 {
        self.percent_from_cache.unwrap_or(0.0) * 100.0
    }
}
