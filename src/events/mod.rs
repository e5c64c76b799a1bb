//! Events and the background schedulers that produce them.
//!
//! Submodules:
//! - [`audio`] – commands and messages for the mixer worker
//! - [`collision`] – contact and trigger-overlap notifications
//! - [`missions`] – kill-count objectives and the win latch
//! - [`scheduler`] – timed spawn events, worker thread, persistence

pub mod audio;
pub mod collision;
pub mod missions;
pub mod scheduler;
