use std::collections::BTreeSet;

use regex::Regex;

use crate::config::constant::{
    ADDRESS_CORRECTION_MINUTES, CORRECTED_POSTAL, CORRECTED_STREET, END_OF_DAY_MINUTES,
};
use crate::domain::{Deliverable, PkgId};
use crate::error::DispatchError;
use crate::utils::{destination_key, minutes_to_clock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    AtHub,
    EnRoute,
    Delivered,
}

impl DeliveryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryStatus::AtHub => "at hub",
            DeliveryStatus::EnRoute => "en route",
            DeliveryStatus::Delivered => "delivered",
        }
    }
}

/// The four mutually exclusive constraint kinds a package note can carry.
/// First matching pattern wins; an unrecognized non-empty note is the
/// bad-address case, by design rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteDirective {
    Unconstrained,
    AvailableAt(u32),
    RequiredVehicle(usize),
    DeliverWith(Vec<PkgId>),
    WrongAddress,
}

impl NoteDirective {
    pub fn parse(note: &str) -> Self {
        let trimmed = note.trim();
        if trimmed.is_empty() {
            return NoteDirective::Unconstrained;
        }

        let time_pattern = Regex::new(r"(?i)(\d?\d):(\d\d) ([ap])m").expect("time pattern");
        if let Some(caps) = time_pattern.captures(trimmed) {
            return NoteDirective::AvailableAt(capture_minutes(&caps));
        }

        let vehicle_pattern = Regex::new(r"(?i)truck (\d+)").expect("vehicle pattern");
        if let Some(caps) = vehicle_pattern.captures(trimmed) {
            let number = caps[1].parse().expect("matched digits");
            return NoteDirective::RequiredVehicle(number);
        }

        if trimmed.to_ascii_lowercase().contains("delivered with") {
            let id_pattern = Regex::new(r"\d+").expect("id pattern");
            let ids = id_pattern
                .find_iter(trimmed)
                .filter_map(|m| m.as_str().parse().ok())
                .collect();
            return NoteDirective::DeliverWith(ids);
        }

        NoteDirective::WrongAddress
    }
}

fn capture_minutes(caps: &regex::Captures<'_>) -> u32 {
    let hours: u32 = caps[1].parse().expect("matched digits");
    let minutes: u32 = caps[2].parse().expect("matched digits");
    let mut hour24 = hours % 12;
    if caps[3].eq_ignore_ascii_case("p") {
        hour24 += 12;
    }
    hour24 * 60 + minutes
}

/// A package and its delivery audit trail. Status only moves forward:
/// `AtHub -> EnRoute -> Delivered`.
#[derive(Debug, Clone)]
pub struct Package {
    pub id: PkgId,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    /// Graph key for the delivery destination; empty while the address is
    /// known to be wrong.
    pub destination: String,
    /// Delivery promise in minutes since midnight; `END_OF_DAY_MINUTES`
    /// means no promise.
    pub deadline: u32,
    pub weight: u32,
    pub directive: NoteDirective,
    status: DeliveryStatus,
    pub wrong_address: bool,
    pub available_at: f64,
    pub required_vehicle: Option<usize>,
    /// Symmetric co-delivery cluster, fully resolved at ingestion.
    pub dependencies: BTreeSet<PkgId>,
    pub assigned_vehicle: Option<usize>,
    pub loaded_at: Option<f64>,
    pub delivered_at: Option<f64>,
    pub delivered_on_run: Option<u32>,
}

impl Package {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: PkgId,
        street: &str,
        city: &str,
        state: &str,
        postal_code: &str,
        deadline: u32,
        weight: u32,
        note: &str,
    ) -> Self {
        let directive = NoteDirective::parse(note);
        let mut pkg = Self {
            id,
            street: street.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            postal_code: postal_code.to_string(),
            destination: destination_key(street, postal_code),
            deadline,
            weight,
            directive,
            status: DeliveryStatus::AtHub,
            wrong_address: false,
            available_at: 0.0,
            required_vehicle: None,
            dependencies: BTreeSet::new(),
            assigned_vehicle: None,
            loaded_at: None,
            delivered_at: None,
            delivered_on_run: None,
        };
        match &pkg.directive {
            NoteDirective::Unconstrained | NoteDirective::DeliverWith(_) => {}
            NoteDirective::AvailableAt(minutes) => pkg.available_at = f64::from(*minutes),
            NoteDirective::RequiredVehicle(number) => pkg.required_vehicle = Some(*number),
            NoteDirective::WrongAddress => {
                pkg.destination.clear();
                pkg.wrong_address = true;
                pkg.available_at = ADDRESS_CORRECTION_MINUTES;
            }
        }
        pkg
    }

    /// Raw co-delivery ids named in the note, before resolution.
    pub fn referenced_ids(&self) -> Vec<PkgId> {
        match &self.directive {
            NoteDirective::DeliverWith(ids) => ids.clone(),
            _ => Vec::new(),
        }
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn is_at_hub(&self) -> bool {
        self.status == DeliveryStatus::AtHub
    }

    pub fn is_delivered(&self) -> bool {
        self.status == DeliveryStatus::Delivered
    }

    /// Urgent packages carry a promise earlier than end of day.
    pub fn is_priority(&self, now: f64) -> bool {
        self.is_at_hub() && self.deadline < END_OF_DAY_MINUTES && self.available_at <= now
    }

    pub fn address_correction_due(&self, now: f64) -> bool {
        self.wrong_address && self.available_at <= now
    }

    pub fn apply_corrected_address(&mut self) {
        self.wrong_address = false;
        self.street = CORRECTED_STREET.to_string();
        self.postal_code = CORRECTED_POSTAL.to_string();
        self.destination = destination_key(CORRECTED_STREET, CORRECTED_POSTAL);
    }

    pub fn promise_label(&self) -> String {
        if self.deadline == END_OF_DAY_MINUTES {
            "EOD".to_string()
        } else {
            minutes_to_clock(f64::from(self.deadline))
        }
    }

    pub fn on_time(&self) -> Option<bool> {
        self.delivered_at.map(|at| at < f64::from(self.deadline))
    }
}

impl Deliverable for Package {
    fn id(&self) -> PkgId {
        self.id
    }

    fn destination(&self) -> &str {
        &self.destination
    }

    fn mark_en_route(&mut self, vehicle: usize, now: f64) -> Result<(), DispatchError> {
        match self.status {
            DeliveryStatus::EnRoute => return Err(DispatchError::AlreadyEnRoute(self.id)),
            DeliveryStatus::Delivered => return Err(DispatchError::AlreadyDelivered(self.id)),
            DeliveryStatus::AtHub => {}
        }
        if let Some(required) = self.required_vehicle {
            if required != vehicle {
                return Err(DispatchError::WrongVehicle {
                    package: self.id,
                    required,
                    actual: vehicle,
                });
            }
        }
        self.assigned_vehicle = Some(vehicle);
        self.loaded_at = Some(now);
        self.status = DeliveryStatus::EnRoute;
        Ok(())
    }

    fn mark_delivered(&mut self, now: f64, run: u32) -> Result<(), DispatchError> {
        if self.status == DeliveryStatus::Delivered {
            return Err(DispatchError::AlreadyDelivered(self.id));
        }
        self.status = DeliveryStatus::Delivered;
        self.delivered_at = Some(now);
        self.delivered_on_run = Some(run);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_package(note: &str) -> Package {
        Package::new(1, "195 W Oakland Ave", "Salt Lake City", "UT", "84115", 1440, 21, note)
    }

    #[test]
    fn empty_note_is_unconstrained() {
        let pkg = plain_package("");
        assert_eq!(pkg.directive, NoteDirective::Unconstrained);
        assert!(!pkg.wrong_address);
        assert_eq!(pkg.available_at, 0.0);
        assert_eq!(pkg.destination, "195 W Oakland Ave (84115)");
    }

    #[test]
    fn time_note_sets_availability() {
        let pkg = plain_package("Delayed on flight---will not arrive to depot until 9:05 am");
        assert_eq!(pkg.directive, NoteDirective::AvailableAt(545));
        assert_eq!(pkg.available_at, 545.0);
    }

    #[test]
    fn truck_note_sets_affinity() {
        let pkg = plain_package("Can only be on truck 2");
        assert_eq!(pkg.required_vehicle, Some(2));
    }

    #[test]
    fn delivered_with_note_collects_ids() {
        let pkg = plain_package("Must be delivered with 13, 15");
        assert_eq!(pkg.directive, NoteDirective::DeliverWith(vec![13, 15]));
        assert_eq!(pkg.referenced_ids(), vec![13, 15]);
    }

    #[test]
    fn unrecognized_note_is_the_bad_address_case() {
        let pkg = plain_package("Wrong address listed");
        assert!(pkg.wrong_address);
        assert!(pkg.destination.is_empty());
        assert_eq!(pkg.available_at, 620.0);
    }

    #[test]
    fn time_pattern_wins_over_truck_pattern() {
        // First match wins; a note naming both a time and a truck is an
        // availability note.
        let pkg = plain_package("On truck 2 until 10:00 am");
        assert_eq!(pkg.directive, NoteDirective::AvailableAt(600));
    }

    #[test]
    fn status_only_moves_forward() {
        let mut pkg = plain_package("");
        assert!(pkg.is_at_hub());
        pkg.mark_en_route(1, 480.0).unwrap();
        assert_eq!(pkg.status(), DeliveryStatus::EnRoute);
        assert_eq!(pkg.assigned_vehicle, Some(1));
        assert_eq!(pkg.loaded_at, Some(480.0));

        // Reload is a fatal invariant violation.
        assert!(matches!(
            pkg.mark_en_route(1, 500.0),
            Err(DispatchError::AlreadyEnRoute(1))
        ));

        pkg.mark_delivered(510.0, 1).unwrap();
        assert!(pkg.is_delivered());
        assert_eq!(pkg.delivered_at, Some(510.0));
        assert_eq!(pkg.delivered_on_run, Some(1));

        assert!(matches!(
            pkg.mark_delivered(520.0, 1),
            Err(DispatchError::AlreadyDelivered(1))
        ));
        assert!(matches!(
            pkg.mark_en_route(1, 520.0),
            Err(DispatchError::AlreadyDelivered(1))
        ));
    }

    #[test]
    fn affinity_mismatch_is_fatal_at_load() {
        let mut pkg = plain_package("Can only be on truck 2");
        let result = pkg.mark_en_route(1, 480.0);
        assert!(matches!(
            result,
            Err(DispatchError::WrongVehicle { package: 1, required: 2, actual: 1 })
        ));
        // The failed load must not have moved the package.
        assert!(pkg.is_at_hub());
        pkg.mark_en_route(2, 480.0).unwrap();
    }

    #[test]
    fn address_correction_substitutes_the_fixed_address() {
        let mut pkg = plain_package("Wrong address listed");
        assert!(!pkg.address_correction_due(600.0));
        assert!(pkg.address_correction_due(620.0));
        pkg.apply_corrected_address();
        assert!(!pkg.wrong_address);
        assert_eq!(pkg.destination, "410 S State St (84111)");
    }

    #[test]
    fn priority_tracks_deadline_and_availability() {
        let mut pkg = Package::new(5, "1 Main St", "SLC", "UT", "84101", 630, 2, "");
        assert!(pkg.is_priority(480.0));

        let delayed = Package::new(6, "1 Main St", "SLC", "UT", "84101", 630, 2, "arrives 9:05 am");
        assert!(!delayed.is_priority(480.0));
        assert!(delayed.is_priority(545.0));

        let eod = plain_package("");
        assert!(!eod.is_priority(480.0));

        pkg.mark_en_route(1, 480.0).unwrap();
        assert!(!pkg.is_priority(480.0));
    }
}
