pub mod kiosk;

pub use kiosk::*;
