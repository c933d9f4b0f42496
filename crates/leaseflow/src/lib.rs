//! Rental application and contract signature workflows for the LeaseFlow
//! marketplace.
//!
//! The library is split along the two stateful journeys the marketplace runs
//! client-side: the application wizard (draft store, step sequencer,
//! occupation sub-flows, identity verification, document upload, submission)
//! and contract signing (per-party signature tracking and sequential
//! signature submission). Everything that talks to the outside world sits
//! behind gateway traits so the workflows can be exercised without the
//! platform backend.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
