pub mod turn_path_service;

pub use turn_path_service::*;
