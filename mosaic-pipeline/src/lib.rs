//! # mosaic-pipeline
//!
//! Wires the engine together: the producer feeds image batches to the
//! inference worker, the coordinator owns the store and freeze state,
//! and a clustering worker runs passes off the orchestrating context.
//! `MosaicSession` is the public entry point.

pub mod session;
pub mod telemetry;

mod coordinator;
mod messages;
mod producer;
mod stats;
mod workers;

pub use producer::ProducerControl;
pub use session::MosaicSession;
