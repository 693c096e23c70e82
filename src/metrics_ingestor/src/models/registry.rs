use serde::{Deserialize, Serialize};

/// ASNs registered to one country at one point in time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryAsns {
    /// ASNs seen in the global routing table.
    pub routed: Vec<i64>,
    /// Registered ASNs that are not currently announced.
    pub non_routed: Vec<i64>,
}

impl CountryAsns {
    /// All ASNs, routed first, in the order reported.
    pub fn all(&self) -> impl Iterator<Item = i64> + '_ {
        self.routed.iter().chain(self.non_routed.iter()).copied()
    }

    /// Routed plus non-routed count.
    pub fn len(&self) -> usize {
        self.routed.len() + self.non_routed.len()
    }

    /// True when the country has no registered ASNs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One `[starttime, endtime)` slot of a routing-statistics entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSlot {
    /// Slot start as sent by the registry, usually without a zone.
    pub starttime: String,
    /// Slot end; absent for the open last slot.
    pub endtime: Option<String>,
}

/// Routing statistics for one country and one sampling slot.
///
/// Every measure is optional; the registry omits or nulls a measure when it
/// has no observation for the slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStat {
    /// Sampling slots; the first start is the entry's timestamp.
    #[serde(default)]
    pub timeline: Vec<TimelineSlot>,
    /// IPv4 prefixes seen by RIS collectors.
    #[serde(default)]
    pub v4_prefixes_ris: Option<i64>,
    /// IPv6 prefixes seen by RIS collectors.
    #[serde(default)]
    pub v6_prefixes_ris: Option<i64>,
    /// ASNs seen by RIS collectors.
    #[serde(default)]
    pub asns_ris: Option<i64>,
    /// IPv4 prefixes in the delegation stats.
    #[serde(default)]
    pub v4_prefixes_stats: Option<i64>,
    /// IPv6 prefixes in the delegation stats.
    #[serde(default)]
    pub v6_prefixes_stats: Option<i64>,
    /// ASNs in the delegation stats.
    #[serde(default)]
    pub asns_stats: Option<i64>,
}

impl ResourceStat {
    /// Start of the first timeline slot, the natural timestamp of the entry.
    pub fn first_start(&self) -> Option<&str> {
        self.timeline.first().map(|slot| slot.starttime.as_str())
    }
}

/// Routing-statistics granularity offered by the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatsResolution {
    /// One sample per day.
    #[serde(rename = "1d")]
    Daily,
    /// One sample every five minutes.
    #[serde(rename = "5m")]
    FiveMinute,
}

impl StatsResolution {
    /// Wire and storage tag, `1d` or `5m`.
    pub const fn as_str(self) -> &'static str {
        match self {
            StatsResolution::Daily => "1d",
            StatsResolution::FiveMinute => "5m",
        }
    }
}

impl std::fmt::Display for StatsResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One adjacency reported for a queried ASN.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbour {
    /// The neighbouring ASN.
    pub asn: i64,
    /// Relationship as seen from the queried ASN ("left", "right", "uncertain").
    #[serde(rename = "type")]
    pub kind: String,
    /// Number of RIS peers that observed the adjacency.
    #[serde(default)]
    pub power: Option<i64>,
    /// IPv4 peers that observed it.
    #[serde(default)]
    pub v4_peers: Option<i64>,
    /// IPv6 peers that observed it.
    #[serde(default)]
    pub v6_peers: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_tag_matches_the_wire_name() {
        for resolution in [StatsResolution::Daily, StatsResolution::FiveMinute] {
            let wire = serde_json::to_string(&resolution).unwrap();
            assert_eq!(wire, format!("\"{}\"", resolution.as_str()));
        }
    }
}
