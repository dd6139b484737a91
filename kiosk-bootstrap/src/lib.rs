pub mod cli;
pub mod context;
pub mod lifecycle;
pub mod logging;

pub use cli::{run_interactive, run_manual, run_sort};
pub use context::{AppContext, ScaleMode};
pub use lifecycle::run_standalone;
pub use logging::init_tracing;
