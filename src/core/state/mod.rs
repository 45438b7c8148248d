//! Export state bookkeeping

pub mod manager;

pub use manager::StateManager;
