use super::events::GateEvent;
use crate::rate_limit::Remaining;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::future::{ready, Ready};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

/// Destination for gate events.
///
/// Any `tower::Service<GateEvent>` that is cheap to clone qualifies, so sinks can be
/// wrapped in tower middleware (buffering, timeouts) before they reach the orchestrator.
pub trait TelemetrySink:
    tower::Service<GateEvent, Response = (), Error = Self::SinkError> + Clone + Send + 'static
{
    type SinkError: std::error::Error + Send + 'static;
}

/// Deliver `event` if the sink becomes ready. Readiness and call failures are dropped,
/// so a broken sink can never fail a chat message.
pub async fn emit_best_effort<S>(sink: S, event: GateEvent)
where
    S: tower::Service<GateEvent, Response = ()> + Send + Clone + 'static,
    S::Error: std::error::Error + Send + 'static,
    S::Future: Send + 'static,
{
    use tower::ServiceExt;

    match sink.ready_oneshot().await {
        Ok(mut sink) => {
            if let Err(e) = sink.call(event).await {
                tracing::trace!(error = %e, "gate event dropped by sink");
            }
        }
        Err(e) => tracing::trace!(error = %e, "gate sink not ready"),
    }
}

// Sinks that record synchronously are always ready and finish inside `call`; they only
// provide `record`.
macro_rules! sync_sink {
    ($($sink:ty),+ $(,)?) => {$(
        impl tower::Service<GateEvent> for $sink {
            type Response = ();
            type Error = Infallible;
            type Future = Ready<Result<(), Infallible>>;

            fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
                Poll::Ready(Ok(()))
            }

            fn call(&mut self, event: GateEvent) -> Self::Future {
                self.record(event);
                ready(Ok(()))
            }
        }

        impl TelemetrySink for $sink {
            type SinkError = Infallible;
        }
    )+};
}

sync_sink!(NullSink, LogSink, MemorySink);

/// Drops every event. The orchestrator's default.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl NullSink {
    fn record(&self, _event: GateEvent) {}
}

/// Writes events to `tracing`: refusals and failed completions at `warn`, the rest at
/// `info`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl LogSink {
    fn record(&self, event: GateEvent) {
        match &event {
            GateEvent::Denied { subject } => {
                tracing::warn!(subject = %subject, "chat message refused by rate limit")
            }
            GateEvent::CompletionFailed { subject, status, duration } => tracing::warn!(
                subject = %subject,
                status = ?status,
                elapsed_ms = duration.as_millis() as u64,
                "completion failed"
            ),
            other => tracing::info!(subject = %other.subject(), event = %other, "gate event"),
        }
    }
}

/// Keeps the most recent events in memory and answers questions about them.
///
/// Clones share the same buffer. Once `capacity` is reached the oldest event is
/// dropped and counted in [`evicted`](Self::evicted).
#[derive(Clone, Debug)]
pub struct MemorySink {
    events: Arc<Mutex<VecDeque<GateEvent>>>,
    capacity: usize,
    evicted: Arc<AtomicU64>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self::with_capacity(1_024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
            evicted: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Retained events, oldest first.
    pub fn events(&self) -> Vec<GateEvent> {
        self.buffer().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buffer().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer().is_empty()
    }

    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// How many of `subject`'s messages the rate limit refused.
    pub fn denials(&self, subject: &str) -> usize {
        self.buffer()
            .iter()
            .filter(|e| matches!(e, GateEvent::Denied { subject: s } if s == subject))
            .count()
    }

    /// Allowance reported after `subject`'s most recent counted message.
    pub fn last_remaining(&self, subject: &str) -> Option<Remaining> {
        self.buffer().iter().rev().find_map(|e| match e {
            GateEvent::Consumed { subject: s, remaining } if s == subject => Some(*remaining),
            _ => None,
        })
    }

    /// Status codes of failed completions, oldest first. `None` when the endpoint
    /// gave no status (transport errors).
    pub fn failed_statuses(&self) -> Vec<Option<u16>> {
        self.buffer()
            .iter()
            .filter_map(|e| match e {
                GateEvent::CompletionFailed { status, .. } => Some(*status),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: GateEvent) {
        let mut buffer = self.buffer();
        if buffer.len() >= self.capacity {
            buffer.pop_front();
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        buffer.push_back(event);
    }

    fn buffer(&self) -> MutexGuard<'_, VecDeque<GateEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
