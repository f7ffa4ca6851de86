use std::collections::BTreeSet;

use tracing::{debug, info, trace};

use crate::dispatch::context::SchedulerContext;
use crate::dispatch::eligibility::eligible;
use crate::distance::graph::HubGraph;
use crate::domain::PkgId;
use crate::error::DispatchError;
use crate::setup::init::{DestTable, PkgTable};

/// Nearest candidate to `location` by graph distance. Strict `<`, so the
/// first candidate found at the minimum wins ties.
fn find_nearest(
    packages: &PkgTable,
    graph: &HubGraph,
    candidates: &BTreeSet<PkgId>,
    location: &str,
) -> Result<Option<PkgId>, DispatchError> {
    let mut nearest = None;
    let mut nearest_distance = f64::INFINITY;
    for id in candidates {
        let pkg = match packages.lookup(id) {
            Some(pkg) => pkg,
            None => continue,
        };
        let distance = graph.distance(&pkg.destination, location)?;
        if distance < nearest_distance {
            nearest_distance = distance;
            nearest = Some(*id);
        }
    }
    Ok(nearest)
}

/// Take the nearest pool package this vehicle can legally carry, expand it
/// to its co-delivery closure, and load the whole closure nearest-neighbor
/// first, topping up with same-destination companions. Returns false when
/// nothing was loaded, either because no candidate is eligible for this
/// vehicle or because the closure cannot fit in the remaining capacity.
fn load_nearest_closure(
    ctx: &mut SchedulerContext,
    vehicle_index: usize,
    pool: &mut BTreeSet<PkgId>,
) -> Result<bool, DispatchError> {
    let SchedulerContext {
        packages,
        by_destination,
        graph,
        vehicles,
    } = ctx;
    let vehicle = &mut vehicles[vehicle_index];

    let candidates: BTreeSet<PkgId> = pool
        .iter()
        .copied()
        .filter(|id| eligible(packages, *id, vehicle))
        .collect();
    let anchor = match find_nearest(packages, graph, &candidates, vehicle.current_location())? {
        Some(id) => id,
        None => return Ok(false),
    };

    let mut closure: BTreeSet<PkgId> = BTreeSet::new();
    closure.insert(anchor);
    if let Some(pkg) = packages.lookup(&anchor) {
        closure.extend(pkg.dependencies.iter().copied());
    }

    if closure.len() > vehicle.remaining_capacity() {
        trace!(
            "closure of package {} needs {} slots, vehicle {} has {}",
            anchor,
            closure.len(),
            vehicle.number,
            vehicle.remaining_capacity()
        );
        return Ok(false);
    }

    let mut loaded_any = false;
    while !closure.is_empty() {
        let next = match find_nearest(packages, graph, &closure, vehicle.current_location())? {
            Some(id) => id,
            None => break,
        };
        closure.remove(&next);
        let pkg = match packages.lookup_mut(&next) {
            Some(pkg) => pkg,
            None => continue,
        };
        if !pkg.is_at_hub() {
            continue;
        }
        let destination = pkg.destination.clone();
        pool.remove(&next);
        vehicle.load(pkg)?;
        loaded_any = true;
        debug!("vehicle {} took package {}", vehicle.number, next);

        // Same destination, independently eligible: ride along while
        // capacity remains.
        let companions: Vec<PkgId> = by_destination
            .lookup(destination.as_str())
            .cloned()
            .unwrap_or_default();
        for companion in companions {
            if vehicle.is_full() {
                break;
            }
            if closure.contains(&companion) {
                continue;
            }
            if !eligible(packages, companion, vehicle) {
                continue;
            }
            if let Some(pkg) = packages.lookup_mut(&companion) {
                pool.remove(&companion);
                vehicle.load(pkg)?;
                debug!(
                    "vehicle {} took companion package {} for {}",
                    vehicle.number, companion, destination
                );
            }
        }
    }
    Ok(loaded_any)
}

fn vehicles_by_mileage(ctx: &SchedulerContext) -> Vec<usize> {
    let mut order: Vec<usize> = (0..ctx.vehicles.len()).collect();
    order.sort_by(|a, b| {
        ctx.vehicles[*a]
            .odometer_miles
            .total_cmp(&ctx.vehicles[*b].odometer_miles)
    });
    order
}

/// Urgent packages: promise earlier than end of day and eligible for at
/// least one vehicle at that vehicle's current clock.
fn collect_priority(ctx: &SchedulerContext) -> BTreeSet<PkgId> {
    let mut pool = BTreeSet::new();
    for (id, pkg) in ctx.packages.iter() {
        let urgent = ctx.vehicles.iter().any(|vehicle| {
            pkg.is_priority(vehicle.elapsed_time()) && eligible(&ctx.packages, *id, vehicle)
        });
        if urgent {
            pool.insert(*id);
        }
    }
    pool
}

/// Phase A: serve deadline packages first, least-driven vehicle first.
pub fn priority_first(ctx: &mut SchedulerContext) -> Result<(), DispatchError> {
    let mut pool = collect_priority(ctx);
    if pool.is_empty() {
        return Ok(());
    }
    debug!("priority pool: {:?}", pool);

    for vehicle_index in vehicles_by_mileage(ctx) {
        while !ctx.vehicles[vehicle_index].is_full() && !pool.is_empty() {
            if !load_nearest_closure(ctx, vehicle_index, &mut pool)? {
                break;
            }
        }
    }
    Ok(())
}

/// Phase B: nearest-neighbor assignment over everything still at the hub,
/// no deadline filter.
pub fn assign_remainder(ctx: &mut SchedulerContext) -> Result<(), DispatchError> {
    let mut pool: BTreeSet<PkgId> = ctx
        .packages
        .iter()
        .filter(|(_, pkg)| pkg.is_at_hub())
        .map(|(id, _)| *id)
        .collect();
    if pool.is_empty() {
        return Ok(());
    }

    for vehicle_index in vehicles_by_mileage(ctx) {
        while !ctx.vehicles[vehicle_index].is_full() && !pool.is_empty() {
            if !load_nearest_closure(ctx, vehicle_index, &mut pool)? {
                break;
            }
        }
    }
    Ok(())
}

/// Execute every loaded manifest, polling the wrong-address packages for
/// their correction after each vehicle's run. Returns how many packages
/// were delivered.
pub fn route_vehicles(ctx: &mut SchedulerContext) -> Result<usize, DispatchError> {
    let SchedulerContext {
        packages,
        by_destination,
        graph,
        vehicles,
    } = ctx;

    let mut delivered = 0;
    for vehicle in vehicles.iter_mut() {
        delivered += vehicle.manifest_len();
        vehicle.execute_deliveries(graph, packages)?;
        correct_addresses(packages, by_destination, vehicle.elapsed_time());
    }
    Ok(delivered)
}

fn correct_addresses(packages: &mut PkgTable, by_destination: &mut DestTable, now: f64) {
    let due: Vec<PkgId> = packages
        .iter()
        .filter(|(_, pkg)| pkg.address_correction_due(now))
        .map(|(id, _)| *id)
        .collect();

    for id in due {
        let (old_key, new_key) = {
            let pkg = match packages.lookup_mut(&id) {
                Some(pkg) => pkg,
                None => continue,
            };
            let old_key = pkg.destination.clone();
            pkg.apply_corrected_address();
            info!(
                "package {} address corrected to {:?}",
                id, pkg.destination
            );
            (old_key, pkg.destination.clone())
        };
        // Keep the destination grouping in step with the new address.
        if let Some(ids) = by_destination.lookup_mut(old_key.as_str()) {
            ids.retain(|other| *other != id);
        }
        if !by_destination.contains(new_key.as_str()) {
            by_destination.insert(new_key.clone(), Vec::new());
        }
        if let Some(ids) = by_destination.lookup_mut(new_key.as_str()) {
            ids.push(id);
        }
    }
}
