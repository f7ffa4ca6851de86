pub mod primes;
pub mod table;

pub use primes::PrimeSequence;
pub use table::AssocTable;
