use thiserror::Error;

use crate::domain::PkgId;

/// Lookup failures against the hub distance index.
#[derive(Debug, Error)]
pub enum DistanceError {
    #[error("hub {0:?} is not registered in the distance index")]
    UnknownHub(String),
    #[error("no recorded distance between {from:?} and {to:?}")]
    MissingEdge { from: String, to: String },
}

/// Invariant violations that must abort the simulation run. Continuing past
/// any of these would produce an invalid delivery schedule.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("package {0} is already en route and cannot be loaded again")]
    AlreadyEnRoute(PkgId),
    #[error("package {0} was already delivered")]
    AlreadyDelivered(PkgId),
    #[error("vehicle {vehicle} is at capacity ({capacity})")]
    VehicleFull { vehicle: usize, capacity: usize },
    #[error("package {package} must ride on vehicle {required}, not vehicle {actual}")]
    WrongVehicle {
        package: PkgId,
        required: usize,
        actual: usize,
    },
    #[error("package {0} is missing from the package table")]
    UnknownPackage(PkgId),
    #[error("dispatch stalled: a full pass assigned nothing with {remaining} packages undelivered")]
    Stalled { remaining: usize },
    #[error(transparent)]
    Distance(#[from] DistanceError),
}

/// Failures while turning raw records into a scheduling instance.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unparseable deadline {0:?}")]
    Deadline(String),
    #[error("unparseable distance value {0:?}")]
    DistanceValue(String),
    #[error(transparent)]
    Graph(#[from] DistanceError),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
