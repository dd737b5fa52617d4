//! Persisted allocation state.

use std::collections::BTreeMap;
use std::fmt;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

/// The three sections of the persisted state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateSection {
    Loopbacks,
    Transit,
    InterLeaf,
}

impl fmt::Display for StateSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateSection::Loopbacks => "loopbacks",
            StateSection::Transit => "transit",
            StateSection::InterLeaf => "inter_leaf",
        };
        f.write_str(name)
    }
}

/// A link subnet as stored in the `transit` and `inter_leaf` sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetRecord {
    pub subnet: Ipv4Net,
}

/// Durable record of every assignment ever made
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationState {
    #[serde(default)]
    pub loopbacks: BTreeMap<String, Ipv4Net>,
    #[serde(default)]
    pub transit: BTreeMap<String, SubnetRecord>,
    #[serde(default)]
    pub inter_leaf: BTreeMap<String, SubnetRecord>,
}

impl AllocationState {
    pub fn get(&self, section: StateSection, key: &str) -> Option<Ipv4Net> {
        match section {
            StateSection::Loopbacks => self.loopbacks.get(key).copied(),
            StateSection::Transit => self.transit.get(key).map(|record| record.subnet),
            StateSection::InterLeaf => self.inter_leaf.get(key).map(|record| record.subnet),
        }
    }

    /// Insert a key unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, section: StateSection, key: &str, value: Ipv4Net) -> bool {
        if self.get(section, key).is_some() {
            log::debug!("State key {}/{} already recorded, keeping first value", section, key);
            return false;
        }
        match section {
            StateSection::Loopbacks => {
                self.loopbacks.insert(key.to_string(), value);
            }
            StateSection::Transit => {
                self.transit.insert(key.to_string(), SubnetRecord { subnet: value });
            }
            StateSection::InterLeaf => {
                self.inter_leaf.insert(key.to_string(), SubnetRecord { subnet: value });
            }
        }
        true
    }

    pub fn entries(&self) -> Vec<(StateSection, String, Ipv4Net)> {
        let loopbacks = self
            .loopbacks
            .iter()
            .map(|(k, v)| (StateSection::Loopbacks, k.clone(), *v));
        let transit = self
            .transit
            .iter()
            .map(|(k, r)| (StateSection::Transit, k.clone(), r.subnet));
        let inter_leaf = self
            .inter_leaf
            .iter()
            .map(|(k, r)| (StateSection::InterLeaf, k.clone(), r.subnet));
        loopbacks.chain(transit).chain(inter_leaf).collect()
    }

    pub fn len(&self) -> usize {
        self.loopbacks.len() + self.transit.len() + self.inter_leaf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
