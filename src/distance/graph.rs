use std::borrow::Borrow;
use std::hash::{Hash, Hasher};

use crate::error::DistanceError;
use crate::store::AssocTable;
use crate::utils::clean_address;

/// A named delivery location. Identity is the cleaned address, so a `Hub`
/// and its address string are interchangeable as graph keys.
#[derive(Debug, Clone)]
pub struct Hub {
    pub name: String,
    pub address: String,
}

impl Hub {
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            address: clean_address(address),
        }
    }
}

impl PartialEq for Hub {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Hub {}

impl Hash for Hub {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl Borrow<str> for Hub {
    fn borrow(&self) -> &str {
        &self.address
    }
}

impl std::fmt::Display for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// Symmetric weighted complete graph over hubs, queried by unordered pair.
/// Immutable once construction finishes.
#[derive(Debug, Default)]
pub struct HubGraph {
    edges: AssocTable<Hub, AssocTable<Hub, f64>>,
}

impl HubGraph {
    pub fn new() -> Self {
        Self {
            edges: AssocTable::new(),
        }
    }

    pub fn register_hub(&mut self, hub: Hub) {
        self.edges.insert(hub, AssocTable::new());
    }

    pub fn hub_count(&self) -> usize {
        self.edges.len()
    }

    /// Record `distance` in both directions. Both hubs must already be
    /// registered.
    pub fn set_distance(&mut self, a: &Hub, b: &Hub, distance: f64) -> Result<(), DistanceError> {
        self.insert_edge(a, b.clone(), distance)?;
        self.insert_edge(b, a.clone(), distance)
    }

    fn insert_edge(&mut self, from: &Hub, to: Hub, distance: f64) -> Result<(), DistanceError> {
        let adjacency = self
            .edges
            .lookup_mut(from.address.as_str())
            .ok_or_else(|| DistanceError::UnknownHub(from.address.clone()))?;
        adjacency.insert(to, distance);
        Ok(())
    }

    pub fn distance(&self, from: &str, to: &str) -> Result<f64, DistanceError> {
        let adjacency = self
            .edges
            .lookup(from)
            .ok_or_else(|| DistanceError::UnknownHub(from.to_string()))?;
        adjacency
            .lookup(to)
            .copied()
            .ok_or_else(|| DistanceError::MissingEdge {
                from: from.to_string(),
                to: to.to_string(),
            })
    }
}
