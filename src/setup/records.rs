use serde::Deserialize;

use crate::domain::PkgId;

/// Raw package row as produced by the external data source.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageRecord {
    pub id: PkgId,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    /// "HH:MM AM/PM" or "EOD".
    pub deadline: String,
    pub weight: u32,
    #[serde(default)]
    pub note: String,
}

/// One row of the hub distance table: a hub plus its distances to every
/// previously listed hub. Lower-triangular and full-matrix inputs both
/// work; symmetric fill happens at graph construction.
#[derive(Debug, Clone)]
pub struct DistanceRecord {
    pub name: String,
    pub address: String,
    pub distances: Vec<f64>,
}
