//! Anonymous usage tracking.
//!
//! Events are recorded without blocking the caller and sent in the
//! background; [`TrackingQueue::drain_all`] waits for whatever is still in
//! flight before the process exits. Delivery is best effort: unreachable
//! networks and sink failures drop the event.

mod error;
pub mod event;
mod queue;
pub mod reachability;
pub mod sink;
mod user;

pub use error::AnalyticsError;
pub use event::{CommonProperties, SCHEMA_VERSION, TrackPayload, TrackingEvent};
pub use queue::TrackingQueue;
pub use reachability::{DnsReachability, Reachability};
pub use sink::{EventSink, NoopSink, SegmentSink};
pub use user::{UserConfig, user_config_path};
