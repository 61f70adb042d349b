pub mod chain;
pub mod constants;
pub mod error;
pub mod status;
pub mod transaction;
pub mod transport;
