//! Adapters for the ports declared in [`crate::domain::ports`].

pub mod in_memory;
