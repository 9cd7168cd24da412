//! Webhook notification infrastructure.
//!
//! Outbound side of the import pipeline: when a job finishes (or an operator
//! fires a test), a queued task lands here and fans the event out to the
//! subscribed webhook endpoints.
//!
//! - [`WebhookClient`] — single-attempt HTTP delivery with a bounded timeout.
//! - [`WebhookDispatcher`] — looks up subscribers, delivers, and records the
//!   outcome of every attempt on the webhook row.

pub mod delivery;
pub mod dispatcher;

pub use delivery::{DeliveryOutcome, WebhookClient};
pub use dispatcher::{DispatchError, DispatchSummary, WebhookDispatcher};
