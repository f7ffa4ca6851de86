use tracing::debug;

use crate::config::constant::{
    AVERAGE_SPEED_MPH, DAY_START_MINUTES, HUB_ADDRESS, VEHICLE_CAPACITY,
};
use crate::distance::graph::HubGraph;
use crate::domain::{Deliverable, PkgId};
use crate::error::DispatchError;
use crate::store::AssocTable;

#[derive(Debug, Clone)]
struct ManifestEntry {
    id: PkgId,
    destination: String,
}

/// A capacity-bound carrier. Simulated time is a pure function of the
/// odometer, so mileage and the clock advance together.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub number: usize,
    pub odometer_miles: f64,
    pub runs_completed: u32,
    manifest: Vec<ManifestEntry>,
}

impl Vehicle {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            odometer_miles: 0.0,
            runs_completed: 0,
            manifest: Vec::with_capacity(VEHICLE_CAPACITY),
        }
    }

    fn elapsed_time_at(miles: f64) -> f64 {
        DAY_START_MINUTES + miles / AVERAGE_SPEED_MPH * 60.0
    }

    /// Simulated minutes since midnight, derived from accumulated mileage.
    pub fn elapsed_time(&self) -> f64 {
        Self::elapsed_time_at(self.odometer_miles)
    }

    pub fn is_full(&self) -> bool {
        self.manifest.len() == VEHICLE_CAPACITY
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.is_empty()
    }

    pub fn remaining_capacity(&self) -> usize {
        VEHICLE_CAPACITY - self.manifest.len()
    }

    pub fn manifest_len(&self) -> usize {
        self.manifest.len()
    }

    pub fn manifest_ids(&self) -> impl Iterator<Item = PkgId> + '_ {
        self.manifest.iter().map(|entry| entry.id)
    }

    /// Destination of the last-loaded package, or the hub while empty.
    pub fn current_location(&self) -> &str {
        self.manifest
            .last()
            .map(|entry| entry.destination.as_str())
            .unwrap_or(HUB_ADDRESS)
    }

    /// Append to the manifest and move the package to en-route. Loading a
    /// full vehicle is a fatal invariant violation.
    pub fn load<D: Deliverable>(&mut self, pkg: &mut D) -> Result<(), DispatchError> {
        if self.is_full() {
            return Err(DispatchError::VehicleFull {
                vehicle: self.number,
                capacity: VEHICLE_CAPACITY,
            });
        }
        pkg.mark_en_route(self.number, self.elapsed_time())?;
        self.manifest.push(ManifestEntry {
            id: pkg.id(),
            destination: pkg.destination().to_string(),
        });
        Ok(())
    }

    /// Drive the manifest in load order, then return to the hub. Delivery
    /// order was fixed at load time; this never reorders.
    pub fn execute_deliveries<D: Deliverable>(
        &mut self,
        graph: &HubGraph,
        packages: &mut AssocTable<PkgId, D>,
    ) -> Result<(), DispatchError> {
        if self.manifest.is_empty() {
            return Ok(());
        }
        self.runs_completed += 1;

        let mut previous = HUB_ADDRESS;
        for entry in &self.manifest {
            self.odometer_miles += graph.distance(previous, &entry.destination)?;
            let pkg = packages
                .lookup_mut(&entry.id)
                .ok_or(DispatchError::UnknownPackage(entry.id))?;
            pkg.mark_delivered(Self::elapsed_time_at(self.odometer_miles), self.runs_completed)?;
            debug!(
                "vehicle {} delivered package {} at {:.1} miles",
                self.number, entry.id, self.odometer_miles
            );
            previous = &entry.destination;
        }
        self.odometer_miles += graph.distance(previous, HUB_ADDRESS)?;
        self.manifest.clear();
        debug!(
            "vehicle {} returned to hub after run {} with {:.1} total miles",
            self.number, self.runs_completed, self.odometer_miles
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::graph::Hub;
    use crate::domain::package::Package;

    fn two_hub_graph() -> HubGraph {
        let mut graph = HubGraph::new();
        let hub = Hub::new("HUB", HUB_ADDRESS);
        let stop = Hub::new("Stop", "1 Main St (84101)");
        graph.register_hub(hub.clone());
        graph.register_hub(stop.clone());
        graph.set_distance(&hub, &hub, 0.0).unwrap();
        graph.set_distance(&hub, &stop, 9.0).unwrap();
        graph.set_distance(&stop, &stop, 0.0).unwrap();
        graph
    }

    fn package_at(id: PkgId) -> Package {
        Package::new(id, "1 Main St", "SLC", "UT", "84101", 1440, 1, "")
    }

    #[test]
    fn elapsed_time_is_a_function_of_mileage() {
        let mut vehicle = Vehicle::new(1);
        assert_eq!(vehicle.elapsed_time(), 480.0);
        vehicle.odometer_miles = 18.0;
        assert_eq!(vehicle.elapsed_time(), 540.0);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut vehicle = Vehicle::new(1);
        for id in 1..=16 {
            let mut pkg = package_at(id);
            vehicle.load(&mut pkg).unwrap();
        }
        assert!(vehicle.is_full());
        assert_eq!(vehicle.remaining_capacity(), 0);

        let mut overflow = package_at(17);
        assert!(matches!(
            vehicle.load(&mut overflow),
            Err(DispatchError::VehicleFull { vehicle: 1, capacity: 16 })
        ));
        assert!(overflow.is_at_hub());
    }

    #[test]
    fn current_location_follows_the_manifest() {
        let mut vehicle = Vehicle::new(1);
        assert_eq!(vehicle.current_location(), HUB_ADDRESS);
        let mut pkg = package_at(1);
        vehicle.load(&mut pkg).unwrap();
        assert_eq!(vehicle.current_location(), "1 Main St (84101)");
    }

    #[test]
    fn execute_charges_legs_then_the_return_trip() {
        let graph = two_hub_graph();
        let mut packages: AssocTable<PkgId, Package> = AssocTable::new();
        packages.insert(1, package_at(1));
        packages.insert(2, package_at(2));

        let mut vehicle = Vehicle::new(1);
        vehicle.load(packages.lookup_mut(&1).unwrap()).unwrap();
        vehicle.load(packages.lookup_mut(&2).unwrap()).unwrap();
        vehicle.execute_deliveries(&graph, &mut packages).unwrap();

        // 9.0 out, 0.0 between the co-located stops, 9.0 back.
        assert_eq!(vehicle.odometer_miles, 18.0);
        assert_eq!(vehicle.runs_completed, 1);
        assert!(vehicle.is_empty());

        let first = packages.lookup(&1).unwrap();
        let second = packages.lookup(&2).unwrap();
        assert!(first.is_delivered());
        assert!(second.is_delivered());
        // Delivery time includes the leg that reached the package.
        assert_eq!(first.delivered_at, Some(510.0));
        assert_eq!(first.delivered_on_run, Some(1));
    }

    #[test]
    fn empty_runs_are_a_no_op() {
        let graph = two_hub_graph();
        let mut packages: AssocTable<PkgId, Package> = AssocTable::new();
        let mut vehicle = Vehicle::new(1);
        vehicle.execute_deliveries(&graph, &mut packages).unwrap();
        assert_eq!(vehicle.odometer_miles, 0.0);
        assert_eq!(vehicle.runs_completed, 0);
    }
}
