//! Telemetry for gate decisions and chat completions.
//!
//! The chat orchestrator emits a [`GateEvent`] for every decision it makes and for
//! every completion it dispatches. Events flow through [`TelemetrySink`]
//! implementations, which are `tower::Service<GateEvent>`s, so sinks compose with
//! standard tower combinators.
//!
//! ```rust
//! use tutorgate::telemetry::{GateEvent, MemorySink};
//! use tutorgate::rate_limit::Remaining;
//!
//! let sink = MemorySink::with_capacity(100);
//! let allowed = GateEvent::Allowed { subject: "u1".into(), remaining: Remaining::Limited(4) };
//! assert!(allowed.to_string().contains("u1"));
//! assert!(sink.is_empty());
//! ```

pub mod events;
pub mod sinks;

pub use events::GateEvent;
pub use sinks::{emit_best_effort, LogSink, MemorySink, NullSink, TelemetrySink};
