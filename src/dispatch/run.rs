use std::error::Error;
use std::fs::File;

use colored::Colorize;
use csv::Writer;
use dotenv::dotenv;
use serde::Serialize;
use tracing::{info, span, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::constant::{
    DISTANCE_CSV_PATH, GENERATED_PACKAGE_COUNT, PACKAGE_CSV_PATH, SEED,
};
use crate::dispatch::assign::{assign_remainder, priority_first, route_vehicles};
use crate::dispatch::context::{PackageSnapshot, SchedulerContext, VehicleSnapshot};
use crate::error::DispatchError;
use crate::fixtures::data_generator::{
    generate_random_instance, load_distance_records, load_package_records,
};
use crate::setup::records::{DistanceRecord, PackageRecord};

/// Initialize tracing and environment
fn init_tracing_and_env() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            fmt::layer()
                .with_span_events(fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE)
                .pretty(),
        )
        .init();

    dotenv().ok();
    Ok(())
}

/// Drive every package to delivered. Alternates priority loading with
/// delivery execution, then sweeps the remainder. A full remainder pass
/// that delivers nothing aborts with a stall error instead of spinning.
pub fn auto_route(ctx: &mut SchedulerContext) -> Result<(), DispatchError> {
    loop {
        priority_first(ctx)?;
        if ctx.vehicles.iter().all(|vehicle| vehicle.is_empty()) {
            break;
        }
        assign_remainder(ctx)?;
        route_vehicles(ctx)?;
    }

    while ctx.undelivered() > 0 {
        assign_remainder(ctx)?;
        let delivered = route_vehicles(ctx)?;
        if delivered == 0 {
            return Err(DispatchError::Stalled {
                remaining: ctx.undelivered(),
            });
        }
    }
    Ok(())
}

fn load_instance() -> (Vec<PackageRecord>, Vec<DistanceRecord>) {
    let package_path =
        std::env::var("PACKAGE_CSV").unwrap_or_else(|_| PACKAGE_CSV_PATH.to_string());
    let distance_path =
        std::env::var("DISTANCE_CSV").unwrap_or_else(|_| DISTANCE_CSV_PATH.to_string());

    match (
        load_package_records(&package_path),
        load_distance_records(&distance_path),
    ) {
        (Ok(packages), Ok(distances)) if !packages.is_empty() && !distances.is_empty() => {
            info!(
                "loaded {} packages and {} hubs from {} / {}",
                packages.len(),
                distances.len(),
                package_path,
                distance_path
            );
            (packages, distances)
        }
        (packages, distances) => {
            if let Err(err) = packages {
                warn!("could not read {}: {}", package_path, err);
            }
            if let Err(err) = distances {
                warn!("could not read {}: {}", distance_path, err);
            }
            warn!("falling back to a generated instance");
            generate_random_instance(GENERATED_PACKAGE_COUNT, SEED)
        }
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    init_tracing_and_env()?;

    let (package_records, distance_records) = load_instance();
    let mut ctx = SchedulerContext::build(&package_records, &distance_records)?;

    {
        let route_span = span!(Level::INFO, "auto_route", packages = package_records.len());
        let _guard = route_span.enter();
        auto_route(&mut ctx)?;
    }

    report_results(&ctx);
    save_summary_json(&ctx, "dispatch_summary.json")?;
    save_delivery_log(&ctx, "deliveries.csv")?;
    Ok(())
}

fn report_results(ctx: &SchedulerContext) {
    for vehicle in ctx.vehicle_snapshots() {
        println!(
            "vehicle {} drove {:.1} miles over {} runs",
            vehicle.number, vehicle.total_miles, vehicle.runs_completed
        );
    }
    println!("fleet total: {:.1} miles", ctx.total_mileage());

    for pkg in ctx.package_snapshots() {
        let delivered_at = pkg.delivered_at.as_deref().unwrap_or("-");
        let on_time = match pkg.on_time {
            Some(true) => "on time".green(),
            Some(false) => "late".red(),
            None => "undelivered".red(),
        };
        println!(
            "package {:>3}  {:30}  promise {:8}  delivered {:8}  {}",
            pkg.id, pkg.destination, pkg.deadline, delivered_at, on_time
        );
    }
}

#[derive(Serialize)]
struct DispatchSummary {
    total_miles: f64,
    vehicles: Vec<VehicleSnapshot>,
    packages: Vec<PackageSnapshot>,
}

fn save_summary_json(ctx: &SchedulerContext, path: &str) -> Result<(), Box<dyn Error>> {
    let summary = DispatchSummary {
        total_miles: ctx.total_mileage(),
        vehicles: ctx.vehicle_snapshots(),
        packages: ctx.package_snapshots(),
    };
    serde_json::to_writer_pretty(File::create(path)?, &summary)?;
    info!("wrote {}", path);
    Ok(())
}

fn save_delivery_log(ctx: &SchedulerContext, path: &str) -> Result<(), Box<dyn Error>> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(["package", "destination", "vehicle", "delivered_at", "on_time"])?;

    for pkg in ctx.package_snapshots() {
        writer.write_record([
            pkg.id.to_string(),
            pkg.destination.clone(),
            pkg.assigned_vehicle
                .map(|v| v.to_string())
                .unwrap_or_default(),
            pkg.delivered_at.clone().unwrap_or_default(),
            pkg.on_time.map(|b| b.to_string()).unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    info!("wrote {}", path);
    Ok(())
}
