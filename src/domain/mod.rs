pub mod package;
pub mod vehicle;

use crate::error::DispatchError;

pub type PkgId = u32;

/// The minimal capability a vehicle needs from its cargo. Keeping the
/// vehicle against this trait rather than the concrete package type breaks
/// the package/vehicle type cycle.
pub trait Deliverable {
    fn id(&self) -> PkgId;
    fn destination(&self) -> &str;
    fn mark_en_route(&mut self, vehicle: usize, now: f64) -> Result<(), DispatchError>;
    fn mark_delivered(&mut self, now: f64, run: u32) -> Result<(), DispatchError>;
}
