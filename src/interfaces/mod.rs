//! Edges of the crate: CSV scripts in, outcome reports out.

pub mod csv;
pub mod script;
