//! Asynchronous insert tasks: state, the in-memory store, the push hub and
//! the driver that runs them.

pub mod driver;
pub mod hub;
pub mod state;
pub mod store;
