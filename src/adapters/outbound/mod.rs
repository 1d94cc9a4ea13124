pub mod console_logger;
pub mod file_logger;
pub mod http_solver;
pub mod in_memory_scene;
pub mod location_data;
pub mod multi_logger;
pub mod noop_logger;
pub mod notifier;

pub use console_logger::*;
pub use file_logger::*;
pub use http_solver::*;
pub use in_memory_scene::*;
pub use location_data::*;
pub use multi_logger::*;
pub use noop_logger::*;
pub use notifier::*;
