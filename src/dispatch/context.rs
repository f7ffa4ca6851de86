use itertools::Itertools;
use serde::Serialize;

use crate::config::constant::FLEET_SIZE;
use crate::distance::graph::HubGraph;
use crate::domain::vehicle::Vehicle;
use crate::domain::PkgId;
use crate::error::IngestError;
use crate::setup::init::{build_graph, build_packages, DestTable, PkgTable};
use crate::setup::records::{DistanceRecord, PackageRecord};
use crate::utils::minutes_to_clock;

/// All shared scheduling state, owned by the caller and passed explicitly
/// into every scheduling operation.
pub struct SchedulerContext {
    pub packages: PkgTable,
    pub by_destination: DestTable,
    pub graph: HubGraph,
    pub vehicles: Vec<Vehicle>,
}

impl SchedulerContext {
    pub fn build(
        package_records: &[PackageRecord],
        distance_records: &[DistanceRecord],
    ) -> Result<Self, IngestError> {
        let (packages, by_destination) = build_packages(package_records)?;
        let graph = build_graph(distance_records)?;
        Ok(Self::from_parts(packages, by_destination, graph, FLEET_SIZE))
    }

    pub fn from_parts(
        packages: PkgTable,
        by_destination: DestTable,
        graph: HubGraph,
        fleet_size: usize,
    ) -> Self {
        let vehicles = (1..=fleet_size).map(Vehicle::new).collect();
        Self {
            packages,
            by_destination,
            graph,
            vehicles,
        }
    }

    pub fn undelivered(&self) -> usize {
        self.packages
            .iter()
            .filter(|(_, pkg)| !pkg.is_delivered())
            .count()
    }

    pub fn total_mileage(&self) -> f64 {
        self.vehicles.iter().map(|v| v.odometer_miles).sum()
    }

    /// Read-only final state for external consumers.
    pub fn package_snapshots(&self) -> Vec<PackageSnapshot> {
        self.packages
            .iter()
            .map(|(id, pkg)| PackageSnapshot {
                id: *id,
                destination: pkg.destination.clone(),
                status: pkg.status().label().to_string(),
                deadline: pkg.promise_label(),
                assigned_vehicle: pkg.assigned_vehicle,
                delivered_at: pkg.delivered_at.map(minutes_to_clock),
                on_time: pkg.on_time(),
            })
            .sorted_by_key(|snapshot| snapshot.id)
            .collect()
    }

    pub fn vehicle_snapshots(&self) -> Vec<VehicleSnapshot> {
        self.vehicles
            .iter()
            .map(|vehicle| VehicleSnapshot {
                number: vehicle.number,
                total_miles: vehicle.odometer_miles,
                runs_completed: vehicle.runs_completed,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageSnapshot {
    pub id: PkgId,
    pub destination: String,
    pub status: String,
    pub deadline: String,
    pub assigned_vehicle: Option<usize>,
    pub delivered_at: Option<String>,
    pub on_time: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleSnapshot {
    pub number: usize,
    pub total_miles: f64,
    pub runs_completed: u32,
}
