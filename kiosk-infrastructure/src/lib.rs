// Kiosk Infrastructure Layer

pub mod config;
pub mod devices;
pub mod repositories;
pub mod services;

pub use config::*;
pub use devices::*;
pub use repositories::*;
pub use services::*;
