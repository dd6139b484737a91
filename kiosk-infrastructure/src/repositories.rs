pub mod file_records;
pub mod firestore_records;

pub use file_records::*;
pub use firestore_records::*;
