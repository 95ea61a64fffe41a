//! The moderation desk: wires operator actions to the remote client, the
//! card state machine, and the stats reconcilers.
//!
//! - [`action`]: typed (comment id, action kind) dispatch.
//! - [`desk`]: single-item flows with UI recovery and the bulk operations.
//! - [`queue`]: the single-worker serial processor behind bulk runs.
//! - [`notify`]: operator-facing notification and progress capabilities.

pub mod action;
pub mod desk;
pub mod error;
pub mod notify;
pub mod queue;
