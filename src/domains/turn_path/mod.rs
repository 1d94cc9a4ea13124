pub mod centerline;
pub mod envelope;
pub mod events;
pub mod intersection;
pub mod lifecycle;
pub mod ports;
pub mod protocol;
pub mod scene;
pub mod types;
pub mod workflow;

pub use events::*;
pub use intersection::*;
pub use lifecycle::*;
pub use ports::*;
pub use protocol::*;
pub use scene::*;
pub use types::*;
pub use workflow::*;
