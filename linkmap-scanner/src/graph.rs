use crate::location::Location;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// What to record for a location whose fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailedFetchPolicy {
    /// Leave it out of the key set; it only shows up as an edge target.
    #[default]
    Omit,
    /// Record it as a key with no outbound edges.
    KeepEmpty,
}

/// Directed adjacency from each fetched location to the set of locations it
/// references. Grows monotonically: nothing is ever removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkGraph {
    edges: HashMap<Location, HashSet<Location>>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` as a key. Returns true if it was not one already.
    pub fn add_node(&mut self, source: Location) -> bool {
        if self.edges.contains_key(&source) {
            return false;
        }
        self.edges.insert(source, HashSet::new());
        true
    }

    /// Add `source -> target`. Returns true if the edge is new.
    pub fn add_edge(&mut self, source: Location, target: Location) -> bool {
        self.edges.entry(source).or_default().insert(target)
    }

    pub fn contains(&self, source: &Location) -> bool {
        self.edges.contains_key(source)
    }

    pub fn targets(&self, source: &Location) -> Option<&HashSet<Location>> {
        self.edges.get(source)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(HashSet::len).sum()
    }

    /// Every location in the graph, keys and targets alike, sorted.
    pub fn locations(&self) -> BTreeSet<&Location> {
        self.edges
            .iter()
            .flat_map(|(source, targets)| std::iter::once(source).chain(targets.iter()))
            .collect()
    }

    /// Union `other` into this graph.
    pub fn merge(&mut self, other: LinkGraph) {
        for (source, targets) in other.edges {
            self.edges.entry(source).or_default().extend(targets);
        }
    }

    /// Deterministic form: keys and edge lists sorted lexicographically.
    pub fn to_sorted_map(&self) -> BTreeMap<String, Vec<String>> {
        self.edges
            .iter()
            .map(|(source, targets)| {
                let mut list: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
                list.sort();
                (source.to_string(), list)
            })
            .collect()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for LinkGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_sorted_map().serialize(serializer)
    }
}
