// Domain value objects
pub mod rate_table;
pub mod record_id;
pub mod waste_category;

pub use rate_table::*;
pub use record_id::*;
pub use waste_category::*;
