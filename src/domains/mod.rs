pub mod logger;
pub mod turn_path;

pub use logger::*;
pub use turn_path::*;
