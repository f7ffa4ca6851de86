use std::collections::HashSet;

use crate::domain::vehicle::Vehicle;
use crate::domain::PkgId;
use crate::setup::init::PkgTable;

/// Whether a package may be loaded onto `vehicle` right now. Allocates a
/// fresh visited set, so unrelated checks never share accumulator state.
pub fn eligible(packages: &PkgTable, id: PkgId, vehicle: &Vehicle) -> bool {
    let mut visited = HashSet::new();
    eligible_with_visited(packages, id, vehicle, &mut visited)
}

/// Recursive form: a package is eligible only if every not-yet-visited
/// co-delivery dependency is eligible too. The visited set breaks the
/// cycles a symmetric dependency relation always contains.
pub fn eligible_with_visited(
    packages: &PkgTable,
    id: PkgId,
    vehicle: &Vehicle,
    visited: &mut HashSet<PkgId>,
) -> bool {
    let pkg = match packages.lookup(&id) {
        Some(pkg) => pkg,
        None => return false,
    };

    if pkg.wrong_address {
        return false;
    }
    if pkg.available_at > vehicle.elapsed_time() {
        return false;
    }
    if !pkg.is_at_hub() {
        return false;
    }
    if let Some(required) = pkg.required_vehicle {
        if required != vehicle.number {
            return false;
        }
    }

    visited.insert(id);
    for dep in &pkg.dependencies {
        if visited.contains(dep) {
            continue;
        }
        if !eligible_with_visited(packages, *dep, vehicle, visited) {
            return false;
        }
    }
    true
}
