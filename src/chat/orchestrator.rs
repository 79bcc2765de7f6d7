use crate::access::SessionLookup;
use crate::chat::client::CompletionClient;
use crate::chat::message::Message;
use crate::chat::model::{default_models, AiModel, SYSTEM_PROMPT};
use crate::clock::{Clock, SystemClock};
use crate::error::ChatError;
use crate::rate_limit::{MessageLimiter, Remaining};
use crate::telemetry::{emit_best_effort, GateEvent, NullSink, TelemetrySink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Drives one conversation: gate, send, count, record.
///
/// Ordering per message is check-then-send-then-increment: the limit is checked before
/// the request is dispatched, and a message is counted only once the completion
/// endpoint has answered successfully. A failed request costs nothing.
pub struct ChatOrchestrator<L, C, S, T = NullSink> {
    limiter: L,
    client: C,
    session: S,
    sink: T,
    system_prompt: String,
    clock: Arc<dyn Clock>,
    models: Mutex<Vec<AiModel>>,
    history: Mutex<Vec<Message>>,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok()?;
        Some(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<L, C, S> ChatOrchestrator<L, C, S, NullSink>
where
    L: MessageLimiter,
    C: CompletionClient,
    S: SessionLookup,
{
    pub fn new(limiter: L, client: C, session: S) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let greeting = Message::greeting(clock.now_millis());
        Self {
            limiter,
            client,
            session,
            sink: NullSink,
            system_prompt: SYSTEM_PROMPT.to_string(),
            clock,
            models: Mutex::new(default_models()),
            history: Mutex::new(vec![greeting]),
            in_flight: AtomicBool::new(false),
        }
    }
}

impl<L, C, S, T> ChatOrchestrator<L, C, S, T>
where
    L: MessageLimiter,
    C: CompletionClient,
    S: SessionLookup,
    T: TelemetrySink,
    T::Future: Send + 'static,
{
    /// Route gate events to `sink`.
    pub fn with_sink<T2>(self, sink: T2) -> ChatOrchestrator<L, C, S, T2>
    where
        T2: TelemetrySink,
    {
        ChatOrchestrator {
            limiter: self.limiter,
            client: self.client,
            session: self.session,
            sink,
            system_prompt: self.system_prompt,
            clock: self.clock,
            models: self.models,
            history: self.history,
            in_flight: self.in_flight,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Replace the model list. The first active model is used for sending.
    pub fn with_models(self, models: Vec<AiModel>) -> Self {
        *locked(&self.models) = models;
        self
    }

    /// Send `text` as the signed-in user and return the assistant's reply.
    pub async fn send_message(&self, text: &str) -> Result<Message, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let _in_flight = InFlight::acquire(&self.in_flight).ok_or(ChatError::Busy)?;
        let user = self.session.current_user().ok_or(ChatError::NotSignedIn)?;
        let model = self.active_model().ok_or(ChatError::NoModel)?;
        let subject = user.id;

        if !self.limiter.check_limit(&subject) {
            tracing::info!(subject = %subject, "message refused: limit reached");
            self.emit(GateEvent::Denied { subject }).await;
            return Err(ChatError::LimitReached);
        }
        let remaining = self.limiter.remaining_messages(&subject);
        self.emit(GateEvent::Allowed { subject: subject.clone(), remaining }).await;

        let now = self.clock.now_millis();
        locked(&self.history).push(Message::user(text, Some(model.name.clone()), now));

        let started = Instant::now();
        let result = self.client.complete(&model, &self.system_prompt, text).await;
        let duration = started.elapsed();

        match result {
            Ok(reply) => {
                self.limiter.increment_count(&subject);
                let remaining = self.limiter.remaining_messages(&subject);
                self.emit(GateEvent::CompletionSucceeded { subject: subject.clone(), duration })
                    .await;
                self.emit(GateEvent::Consumed { subject, remaining }).await;

                let message = Message::assistant(reply, Some(model.name), self.clock.now_millis());
                locked(&self.history).push(message.clone());
                Ok(message)
            }
            Err(e) => {
                let status = match &e {
                    ChatError::Completion { status, .. } => *status,
                    _ => None,
                };
                tracing::warn!(
                    subject = %subject,
                    model = %model.id,
                    error = %e,
                    "completion failed"
                );
                self.emit(GateEvent::CompletionFailed { subject, status, duration }).await;
                Err(e)
            }
        }
    }

    /// Allowance for the signed-in user. Signed-out sessions have none.
    pub fn remaining_messages(&self) -> Remaining {
        match self.session.current_user() {
            Some(user) => self.limiter.remaining_messages(&user.id),
            None => Remaining::Limited(0),
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.limiter.is_privileged()
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn messages(&self) -> Vec<Message> {
        locked(&self.history).clone()
    }

    pub fn models(&self) -> Vec<AiModel> {
        locked(&self.models).clone()
    }

    pub fn active_model(&self) -> Option<AiModel> {
        locked(&self.models).iter().find(|m| m.active).cloned()
    }

    /// Make `id` the only active model. Returns `false` if no such model exists.
    pub fn set_active_model(&self, id: &str) -> bool {
        let mut models = locked(&self.models);
        if !models.iter().any(|m| m.id == id) {
            return false;
        }
        for m in models.iter_mut() {
            m.active = m.id == id;
        }
        true
    }

    async fn emit(&self, event: GateEvent) {
        emit_best_effort(self.sink.clone(), event).await;
    }
}
