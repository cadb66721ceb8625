use crate::model::FrequencyMap;

/// Number of entries shown for the domain and client rankings.
pub const DEFAULT_TOP_N: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub label: String,
    pub count: u64,
}

/// Every entry of `map`, highest count first. Equal counts keep map order.
pub fn rank(map: &FrequencyMap) -> Vec<RankedEntry> {
    let mut out: Vec<RankedEntry> = map
        .iter()
        .map(|(label, count)| RankedEntry {
            label: label.clone(),
            count: *count,
        })
        .collect();
    // sort_by is stable
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

/// `rank` cut down to the first `n` entries.
pub fn top_n(map: &FrequencyMap, n: usize) -> Vec<RankedEntry> {
    let mut out = rank(map);
    out.truncate(n);
    out
}
