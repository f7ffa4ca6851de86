pub mod constant {
    pub(crate) const FLEET_SIZE: usize = 2;
    pub(crate) const VEHICLE_CAPACITY: usize = 16;
    pub(crate) const AVERAGE_SPEED_MPH: f64 = 18.0;
    pub(crate) const DAY_START_MINUTES: f64 = 8.0 * 60.0;
    pub(crate) const END_OF_DAY_MINUTES: u32 = 24 * 60;
    pub(crate) const HUB_ADDRESS: &str = "HUB";
    // Packages flagged with a bad address become deliverable once the
    // corrected address arrives at 10:20.
    pub(crate) const ADDRESS_CORRECTION_MINUTES: f64 = 10.0 * 60.0 + 20.0;
    pub(crate) const CORRECTED_STREET: &str = "410 S State St";
    pub(crate) const CORRECTED_POSTAL: &str = "84111";
    pub(crate) const PACKAGE_CSV_PATH: &str = "input_files/packages.csv";
    pub(crate) const DISTANCE_CSV_PATH: &str = "input_files/distances.csv";
    pub(crate) const GENERATED_PACKAGE_COUNT: usize = 24;
    pub(crate) const SEED: u64 = 64;
}
