//! Per-stream watermark forwarding.
//!
//! A [`StreamForwarder`] owns one `(cluster, service)` stream: it remembers the
//! id of the newest event it has forwarded, and on every poll forwards only
//! the part of the event window that is newer than that id.
//!
//! # Example
//!
//! ```rust,no_run
//! # use ecs_event_forwarder::forwarder::{Adapters, ForwarderSettings, StreamForwarder};
//! # use ecs_event_forwarder::types::StreamIdentity;
//! # use tokio_util::sync::CancellationToken;
//! # async fn example(
//! #     adapters: Adapters,
//! #     settings: ForwarderSettings,
//! # ) -> anyhow::Result<()> {
//! let identity = StreamIdentity::new("prod", "checkout");
//! let mut forwarder = StreamForwarder::open(identity, adapters, settings).await?;
//! let outcome = forwarder.process(&CancellationToken::new()).await?;
//! println!("forwarded {} events", outcome.forwarded());
//! # Ok(())
//! # }
//! ```

mod error;
mod outcome;
mod stream_forwarder;

pub use error::{ForwardError, Stage};
pub use outcome::{ForwarderState, ProcessOutcome};
pub use stream_forwarder::{Adapters, ForwarderSettings, StreamForwarder};
