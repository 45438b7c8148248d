//! State store abstraction
//!
//! [`StateStore`] is implemented by PostgreSQL for production and by an
//! in-memory store for tests and throwaway deployments.

pub mod factory;
pub mod memory;
pub mod traits;

pub use factory::create_state_store;
pub use memory::MemoryStateStore;
pub use traits::StateStore;
