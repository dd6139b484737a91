// Domain services
pub mod classification;
pub mod reward;
pub mod serial_protocol;

pub use classification::*;
pub use reward::*;
pub use serial_protocol::*;
