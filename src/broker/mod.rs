pub mod engine;
pub mod lifecycle;
pub mod message;
pub mod registry;
pub mod topic;

pub use engine::{Broker, DeliveryReport};
pub use lifecycle::ConnectOutcome;
pub use message::{CanonicalMessage, ContentType};
pub use registry::Registry;
