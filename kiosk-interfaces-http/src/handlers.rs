pub mod kiosk_handlers;
pub mod ops_handlers;

pub use kiosk_handlers::*;
pub use ops_handlers::*;
