//! Network reachability for channel sessions.

pub mod monitor;

pub use monitor::{MonitorHandle, Reachability};
