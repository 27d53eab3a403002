pub mod account;
pub mod cancellation;
pub mod operation;
pub mod ports;
