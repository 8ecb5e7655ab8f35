pub mod scheduled;
pub mod sweep;
