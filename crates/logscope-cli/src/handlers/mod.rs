pub mod analyze;
pub mod fingerprint;
pub mod frames;
pub mod recurring;
pub mod tags;
