// ── Changeset ──
//
// All staged records, keyed by configuration file. Replaced wholesale on
// every load; never mutated in place.

use indexmap::IndexMap;
use serde::Serialize;

use super::change::{ChangeRecord, ResolvedChange, resolve_sections};

/// Configuration file holding interface definitions.
pub const NETWORK_CONFIG: &str = "network";

/// Interface options whose modification can cut the operator off.
pub const CONNECTIVITY_OPTIONS: [&str; 4] = ["disabled", "proto", "ipaddr", "netmask"];

/// Staged-but-not-yet-applied configuration edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Changeset {
    configs: IndexMap<String, Vec<ChangeRecord>>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append records for a configuration file, keeping their order.
    pub fn extend(&mut self, config: impl Into<String>, records: impl IntoIterator<Item = ChangeRecord>) {
        self.configs.entry(config.into()).or_default().extend(records);
    }

    /// Total number of records across all files.
    pub fn count(&self) -> usize {
        self.configs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Configuration files with at least one record.
    pub fn configs(&self) -> impl Iterator<Item = (&str, &[ChangeRecord])> {
        self.configs
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    pub fn records(&self, config: &str) -> &[ChangeRecord] {
        self.configs.get(config).map_or(&[], Vec::as_slice)
    }

    /// Records of one file with pending-section references resolved.
    pub fn resolve(&self, config: &str) -> Vec<ResolvedChange> {
        resolve_sections(self.records(config))
    }

    /// Which of `interfaces` have a staged edit to a connectivity option.
    ///
    /// Order follows `interfaces`; each interface appears at most once.
    pub fn interfaces_at_risk(&self, interfaces: &[String]) -> Vec<String> {
        let network = self.records(NETWORK_CONFIG);
        interfaces
            .iter()
            .filter(|iface| {
                network
                    .iter()
                    .any(|r| r.edits_option(iface, &CONNECTIVITY_OPTIONS))
            })
            .fold(Vec::new(), |mut acc, iface| {
                if !acc.contains(iface) {
                    acc.push(iface.clone());
                }
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn set(section: &str, option: &str, value: &str) -> ChangeRecord {
        ChangeRecord::Set {
            section: section.into(),
            option: Some(option.into()),
            value: value.into(),
        }
    }

    #[test]
    fn count_sums_every_file() {
        let mut cs = Changeset::new();
        cs.extend("network", [set("lan", "proto", "dhcp"), set("wan", "mtu", "1400")]);
        cs.extend("system", [set("@system[0]", "hostname", "gw")]);
        cs.extend("firewall", []);

        assert_eq!(cs.count(), 3);
        assert_eq!(cs.configs().count(), 2);
        assert!(!cs.is_empty());
    }

    #[test]
    fn empty_changeset_counts_zero() {
        let cs = Changeset::new();
        assert_eq!(cs.count(), 0);
        assert!(cs.is_empty());
        assert!(cs.records("network").is_empty());
    }

    #[test]
    fn risk_only_considers_network_config() {
        let mut cs = Changeset::new();
        cs.extend("firewall", [set("lan", "proto", "x")]);
        cs.extend("network", [set("wan", "proto", "pppoe"), set("lan", "mtu", "1400")]);

        let ifaces = vec!["lan".to_owned(), "wan".to_owned()];
        assert_eq!(cs.interfaces_at_risk(&ifaces), vec!["wan".to_owned()]);
    }

    #[test]
    fn risk_deduplicates_interfaces() {
        let mut cs = Changeset::new();
        cs.extend("network", [set("lan", "ipaddr", "10.0.0.1"), set("lan", "netmask", "255.0.0.0")]);

        let ifaces = vec!["lan".to_owned(), "lan".to_owned()];
        assert_eq!(cs.interfaces_at_risk(&ifaces), vec!["lan".to_owned()]);
    }
}
