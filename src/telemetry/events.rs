use crate::rate_limit::Remaining;
use std::fmt;
use std::time::Duration;

/// Events emitted while gating and sending chat messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    /// The rate limit check passed.
    Allowed {
        subject: String,
        /// Allowance before this message is counted.
        remaining: Remaining,
    },
    /// The rate limit check refused the message.
    Denied { subject: String },
    /// A message was counted against the subject's window.
    Consumed {
        subject: String,
        /// Allowance after counting.
        remaining: Remaining,
    },
    /// The completion endpoint answered.
    CompletionSucceeded { subject: String, duration: Duration },
    /// The completion endpoint failed; nothing was counted.
    CompletionFailed { subject: String, status: Option<u16>, duration: Duration },
}

impl GateEvent {
    pub fn subject(&self) -> &str {
        match self {
            GateEvent::Allowed { subject, .. }
            | GateEvent::Denied { subject }
            | GateEvent::Consumed { subject, .. }
            | GateEvent::CompletionSucceeded { subject, .. }
            | GateEvent::CompletionFailed { subject, .. } => subject,
        }
    }
}

impl fmt::Display for GateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateEvent::Allowed { subject, remaining } => {
                write!(f, "Allowed(subject={}, remaining={})", subject, remaining)
            }
            GateEvent::Denied { subject } => write!(f, "Denied(subject={})", subject),
            GateEvent::Consumed { subject, remaining } => {
                write!(f, "Consumed(subject={}, remaining={})", subject, remaining)
            }
            GateEvent::CompletionSucceeded { subject, duration } => {
                write!(f, "CompletionSucceeded(subject={}, duration={:?})", subject, duration)
            }
            GateEvent::CompletionFailed { subject, status: Some(status), duration } => write!(
                f,
                "CompletionFailed(subject={}, status={}, duration={:?})",
                subject, status, duration
            ),
            GateEvent::CompletionFailed { subject, status: None, duration } => {
                write!(f, "CompletionFailed(subject={}, duration={:?})", subject, duration)
            }
        }
    }
}
