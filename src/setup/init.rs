use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::distance::graph::{Hub, HubGraph};
use crate::domain::package::Package;
use crate::domain::PkgId;
use crate::error::{DistanceError, IngestError};
use crate::setup::records::{DistanceRecord, PackageRecord};
use crate::store::AssocTable;
use crate::utils::parse_deadline;

pub type PkgTable = AssocTable<PkgId, Package>;
pub type DestTable = AssocTable<String, Vec<PkgId>>;

/// Build the package table and the destination grouping from raw records.
///
/// Dependency references resolve in two passes: the first pass constructs
/// every package and records which ids each note references, the second
/// back-fills bidirectional links and widens each linked group to its full
/// connected component, so every member's dependency set names the whole
/// co-delivery cluster.
pub fn build_packages(records: &[PackageRecord]) -> Result<(PkgTable, DestTable), IngestError> {
    let mut packages = PkgTable::new();
    let mut by_destination = DestTable::new();
    let mut referenced_by: AssocTable<PkgId, Vec<PkgId>> = AssocTable::new();

    for record in records {
        let deadline = parse_deadline(&record.deadline)?;
        let pkg = Package::new(
            record.id,
            &record.address,
            &record.city,
            &record.state,
            &record.postal_code,
            deadline,
            record.weight,
            &record.note,
        );
        if !by_destination.contains(pkg.destination.as_str()) {
            by_destination.insert(pkg.destination.clone(), Vec::new());
        }
        if let Some(ids) = by_destination.lookup_mut(pkg.destination.as_str()) {
            ids.push(pkg.id);
        }
        for dep in pkg.referenced_ids() {
            if !referenced_by.contains(&dep) {
                referenced_by.insert(dep, Vec::new());
            }
            if let Some(referrers) = referenced_by.lookup_mut(&dep) {
                referrers.push(pkg.id);
            }
        }
        packages.insert(pkg.id, pkg);
    }

    for (dep_id, referrers) in referenced_by.iter() {
        if !packages.contains(dep_id) {
            // A note naming an id outside the instance is a recoverable
            // miss, not an error.
            warn!(
                "packages {:?} reference unknown package {}, skipping",
                referrers, dep_id
            );
            continue;
        }
        for referrer in referrers {
            link(&mut packages, *dep_id, *referrer);
        }
    }

    widen_components(&mut packages);

    info!(
        "ingested {} packages across {} destinations",
        packages.len(),
        by_destination.len()
    );
    Ok((packages, by_destination))
}

fn link(packages: &mut PkgTable, a: PkgId, b: PkgId) {
    if a == b {
        return;
    }
    if let Some(pkg) = packages.lookup_mut(&a) {
        pkg.dependencies.insert(b);
    }
    if let Some(pkg) = packages.lookup_mut(&b) {
        pkg.dependencies.insert(a);
    }
}

/// Expand every mutually linked group so each member's dependency set is
/// the component minus itself.
fn widen_components(packages: &mut PkgTable) {
    let ids: Vec<PkgId> = packages.iter().map(|(id, _)| *id).collect();
    let mut seen: BTreeSet<PkgId> = BTreeSet::new();

    for id in ids {
        if seen.contains(&id) {
            continue;
        }
        let mut component: BTreeSet<PkgId> = BTreeSet::new();
        let mut queue = vec![id];
        while let Some(next) = queue.pop() {
            if !component.insert(next) {
                continue;
            }
            if let Some(pkg) = packages.lookup(&next) {
                queue.extend(pkg.dependencies.iter().copied());
            }
        }
        seen.extend(component.iter().copied());

        if component.len() > 1 {
            debug!("co-delivery cluster: {:?}", component);
            for member in &component {
                if let Some(pkg) = packages.lookup_mut(member) {
                    pkg.dependencies = component
                        .iter()
                        .copied()
                        .filter(|other| other != member)
                        .collect();
                }
            }
        }
    }
}

/// Build the hub graph from distance rows, mirroring each edge so the
/// relation comes out symmetric regardless of the input shape.
pub fn build_graph(records: &[DistanceRecord]) -> Result<HubGraph, DistanceError> {
    let mut graph = HubGraph::new();
    let mut hubs: Vec<Hub> = Vec::with_capacity(records.len());

    for record in records {
        let hub = Hub::new(&record.name, &record.address);
        graph.register_hub(hub.clone());
        hubs.push(hub);
        let current = hubs.len() - 1;
        for (index, distance) in record.distances.iter().enumerate().take(hubs.len()) {
            graph.set_distance(&hubs[current], &hubs[index], *distance)?;
        }
    }

    debug!("distance index covers {} hubs", graph.hub_count());
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: PkgId, address: &str, note: &str) -> PackageRecord {
        PackageRecord {
            id,
            address: address.to_string(),
            city: "Salt Lake City".to_string(),
            state: "UT".to_string(),
            postal_code: "84101".to_string(),
            deadline: "EOD".to_string(),
            weight: 5,
            note: note.to_string(),
        }
    }

    #[test]
    fn dependency_sets_are_symmetric_and_cluster_wide() {
        let records = vec![
            record(1, "1 First St", "Must be delivered with 2, 3"),
            record(2, "2 Second St", ""),
            record(3, "3 Third St", ""),
            record(4, "4 Fourth St", ""),
        ];
        let (packages, _) = build_packages(&records).unwrap();

        let expected = |me: PkgId| -> BTreeSet<PkgId> {
            [1, 2, 3].iter().copied().filter(|id| *id != me).collect()
        };
        assert_eq!(packages.lookup(&1).unwrap().dependencies, expected(1));
        assert_eq!(packages.lookup(&2).unwrap().dependencies, expected(2));
        assert_eq!(packages.lookup(&3).unwrap().dependencies, expected(3));
        assert!(packages.lookup(&4).unwrap().dependencies.is_empty());
    }

    #[test]
    fn overlapping_notes_merge_into_one_component() {
        let records = vec![
            record(1, "1 First St", "Must be delivered with 2"),
            record(2, "2 Second St", ""),
            record(3, "3 Third St", "Must be delivered with 2, 4"),
            record(4, "4 Fourth St", ""),
        ];
        let (packages, _) = build_packages(&records).unwrap();

        for id in 1..=4 {
            let deps = &packages.lookup(&id).unwrap().dependencies;
            let expected: BTreeSet<PkgId> =
                (1..=4).filter(|other| *other != id).collect();
            assert_eq!(deps, &expected, "package {}", id);
        }
    }

    #[test]
    fn unknown_references_are_skipped() {
        let records = vec![record(1, "1 First St", "Must be delivered with 99")];
        let (packages, _) = build_packages(&records).unwrap();
        assert!(packages.lookup(&1).unwrap().dependencies.is_empty());
    }

    #[test]
    fn destinations_group_package_ids() {
        let records = vec![
            record(1, "1 First St", ""),
            record(2, "1 First St", ""),
            record(3, "3 Third St", ""),
        ];
        let (_, by_destination) = build_packages(&records).unwrap();
        assert_eq!(
            by_destination.lookup("1 First St (84101)"),
            Some(&vec![1, 2])
        );
        assert_eq!(by_destination.lookup("3 Third St (84101)"), Some(&vec![3]));
    }

    #[test]
    fn triangular_rows_fill_both_directions() {
        let records = vec![
            DistanceRecord {
                name: "HUB".to_string(),
                address: "HUB".to_string(),
                distances: vec![0.0],
            },
            DistanceRecord {
                name: "Stop".to_string(),
                address: "1 Main St (84101)".to_string(),
                distances: vec![7.2, 0.0],
            },
        ];
        let graph = build_graph(&records).unwrap();
        assert_eq!(graph.distance("HUB", "1 Main St (84101)").unwrap(), 7.2);
        assert_eq!(graph.distance("1 Main St (84101)", "HUB").unwrap(), 7.2);
        assert_eq!(graph.distance("HUB", "HUB").unwrap(), 0.0);
    }
}
