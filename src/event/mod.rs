pub mod events;
pub mod router;

pub use events::{InboundEvent, OutboundDelivery, OutboundEvent};
pub use router::EventRouter;
