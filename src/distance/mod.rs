pub mod graph;

pub use graph::{Hub, HubGraph};
