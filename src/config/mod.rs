mod rtu;
mod types;

pub use rtu::Config as SerialConfig;
pub use types::{DataBits, Parity, StopBits};
