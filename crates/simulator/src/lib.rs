//! Forked-state EVM call simulator with snapshot and rollback.

pub mod inspector;
pub mod simulator;

pub use inspector::StaticCallInspector;
pub use simulator::Simulator;
