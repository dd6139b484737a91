// Device, Repository and Service Port Traits (Interfaces)
// Define what the domain needs from infrastructure

pub mod devices;
pub mod repositories;
pub mod services;

pub use devices::*;
pub use repositories::*;
pub use services::*;
