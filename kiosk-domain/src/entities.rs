// Domain entities

pub mod capture;
pub mod classification;
pub mod model;
pub mod record;

pub use capture::*;
pub use classification::*;
pub use model::*;
pub use record::*;
