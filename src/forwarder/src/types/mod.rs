mod event;
mod identity;

pub use event::{epoch_millis, Event, Watermark};
pub use identity::StreamIdentity;
