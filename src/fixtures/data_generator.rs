use csv::ReaderBuilder;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::config::constant::HUB_ADDRESS;
use crate::error::IngestError;
use crate::setup::records::{DistanceRecord, PackageRecord};
use crate::utils::destination_key;

/// Read package rows from a semicolon-delimited CSV with a header row.
pub fn load_package_records(path: &str) -> Result<Vec<PackageRecord>, IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .delimiter(b';')
        .from_path(path)?;

    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Read the distance table. Rows are `name;address;d0;d1;...` with one
/// distance per previously listed hub, so row lengths vary.
pub fn load_distance_records(path: &str) -> Result<Vec<DistanceRecord>, IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(b';')
        .from_path(path)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let record = row?;
        let mut fields = record.iter();
        let name = fields.next().unwrap_or_default().to_string();
        let address = fields.next().unwrap_or_default().to_string();
        if name.is_empty() && address.is_empty() {
            continue;
        }
        let mut distances = Vec::new();
        for field in fields {
            if field.is_empty() {
                continue;
            }
            distances.push(
                field
                    .parse()
                    .map_err(|_| IngestError::DistanceValue(field.to_string()))?,
            );
        }
        records.push(DistanceRecord {
            name,
            address,
            distances,
        });
    }
    Ok(records)
}

fn depot_street(index: usize) -> String {
    format!("{} Industrial Ave", 100 + index * 10)
}

fn depot_postal(index: usize) -> String {
    format!("{}", 84000 + index)
}

/// Generate a coherent random instance from a fixed seed: a hub, a depot
/// grid with symmetric distances, and packages with a spread of deadlines
/// and notes. Every run with the same seed produces the same instance.
pub fn generate_random_instance(
    package_count: usize,
    seed: u64,
) -> (Vec<PackageRecord>, Vec<DistanceRecord>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let depot_count = (package_count / 2).max(3);

    let mut distance_records = vec![DistanceRecord {
        name: "Dispatch Hub".to_string(),
        address: HUB_ADDRESS.to_string(),
        distances: vec![0.0],
    }];
    for index in 1..=depot_count {
        let address = destination_key(&depot_street(index), &depot_postal(index));
        // Legs of at least 7 miles keep every completed run long enough to
        // push the clock past any generated availability time.
        let mut distances: Vec<f64> = (0..index)
            .map(|_| (rng.gen_range(7.0..25.0_f64) * 10.0).round() / 10.0)
            .collect();
        distances.push(0.0);
        distance_records.push(DistanceRecord {
            name: format!("Depot {}", index),
            address,
            distances,
        });
    }

    let mut package_records = Vec::with_capacity(package_count);
    for id in 1..=package_count {
        let depot = rng.gen_range(1..=depot_count);
        let (street, postal) = (depot_street(depot), depot_postal(depot));
        let deadline = match rng.gen_range(0..5_u32) {
            0 => "10:30 AM".to_string(),
            1 => "12:00 PM".to_string(),
            _ => "EOD".to_string(),
        };
        let note = match (id, rng.gen_range(0..10_u32)) {
            // One deterministic co-delivery cluster per instance.
            (2, _) => "Must be delivered with 3, 4".to_string(),
            (3, _) | (4, _) => String::new(),
            (_, 0) => "Can only be on truck 2".to_string(),
            (_, 1) => "Delayed on flight---will not arrive until 8:45 am".to_string(),
            _ => String::new(),
        };
        package_records.push(PackageRecord {
            id: id as u32,
            address: street,
            city: "Salt Lake City".to_string(),
            state: "UT".to_string(),
            postal_code: postal,
            deadline,
            weight: rng.gen_range(1..=40),
            note,
        });
    }

    info!(
        "generated instance: {} packages, {} hubs (seed {})",
        package_records.len(),
        distance_records.len(),
        seed
    );
    (package_records, distance_records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_instances_are_deterministic() {
        let (packages_a, distances_a) = generate_random_instance(24, 64);
        let (packages_b, distances_b) = generate_random_instance(24, 64);
        assert_eq!(packages_a.len(), packages_b.len());
        for (a, b) in packages_a.iter().zip(&packages_b) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.address, b.address);
            assert_eq!(a.deadline, b.deadline);
            assert_eq!(a.note, b.note);
        }
        for (a, b) in distances_a.iter().zip(&distances_b) {
            assert_eq!(a.address, b.address);
            assert_eq!(a.distances, b.distances);
        }
    }

    #[test]
    fn generated_rows_are_triangular_with_zero_diagonal() {
        let (_, distances) = generate_random_instance(12, 7);
        for (index, record) in distances.iter().enumerate() {
            assert_eq!(record.distances.len(), index + 1);
            assert_eq!(record.distances[index], 0.0);
        }
    }

    #[test]
    fn cluster_notes_reference_generated_packages() {
        let (packages, _) = generate_random_instance(24, 64);
        let cluster = packages.iter().find(|p| p.id == 2).unwrap();
        assert!(cluster.note.contains("delivered with"));
        assert!(packages.iter().any(|p| p.id == 3));
        assert!(packages.iter().any(|p| p.id == 4));
    }
}
