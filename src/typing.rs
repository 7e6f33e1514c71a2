//! Typing signals
//!
//! Keystroke-driven typing state is debounced before it reaches the
//! publish/subscribe channel: however fast the user types, at most one
//! signal per quiet window goes out, and only the most recent state wins.
//! Delivery is fire-and-forget with at-most-once semantics; a lost signal
//! self-corrects on the next keystroke.

use crate::model::TypingSignal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Default quiet window between accepted typing publishes
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(500);

/// Trailing-edge debounce: only the most recent call inside the quiet
/// window fires
///
/// Each `call` cancels the previously scheduled action and schedules the new
/// one to run after the window elapses. Reused wherever keystroke-rate input
/// must be throttled (typing signals, search boxes).
pub struct Debouncer {
    window: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Schedule `action`, replacing any not-yet-fired scheduled action
    pub fn call<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }
        let window = self.window;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            action();
        }));
    }

    /// Drop any scheduled action without firing it
    pub fn cancel(&mut self) {
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Fire-and-forget sink for typing signals
///
/// Implementations publish to the application's shared pub/sub connection
/// (a STOMP destination in production). No acknowledgement, no retry.
pub trait TypingPublisher: Send + Sync {
    /// Publish a typing signal; losses are acceptable
    fn publish(&self, signal: TypingSignal);
}

/// Channel-backed publisher
///
/// Hands signals to an in-process receiver, typically the task that owns the
/// shared transport connection.
pub struct ChannelPublisher {
    sender: mpsc::UnboundedSender<TypingSignal>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiving end of its channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TypingSignal>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl TypingPublisher for ChannelPublisher {
    fn publish(&self, signal: TypingSignal) {
        debug!(
            "Typing signal for {}: {}",
            signal.conversation_id, signal.is_typing
        );
        // Receiver gone means the transport is down; the signal is droppable.
        let _ = self.sender.send(signal);
    }
}

/// Debounced typing-state publisher for one conversation
pub struct TypingSignaler {
    publisher: Arc<dyn TypingPublisher>,
    conversation_id: String,
    user_id: String,
    debouncer: Debouncer,
}

impl TypingSignaler {
    /// Create a signaler with the default 500 ms quiet window
    pub fn new(
        publisher: Arc<dyn TypingPublisher>,
        conversation_id: &str,
        user_id: &str,
    ) -> Self {
        Self::with_window(publisher, conversation_id, user_id, DEFAULT_QUIET_WINDOW)
    }

    /// Create a signaler with a custom quiet window
    pub fn with_window(
        publisher: Arc<dyn TypingPublisher>,
        conversation_id: &str,
        user_id: &str,
        window: Duration,
    ) -> Self {
        Self {
            publisher,
            conversation_id: conversation_id.to_string(),
            user_id: user_id.to_string(),
            debouncer: Debouncer::new(window),
        }
    }

    /// Record the local typing state; call on every input change
    ///
    /// Only the most recent state inside the quiet window is published.
    pub fn notify_typing(&mut self, is_typing: bool) {
        let publisher = self.publisher.clone();
        let signal = TypingSignal {
            conversation_id: self.conversation_id.clone(),
            user_id: self.user_id.clone(),
            is_typing,
        };
        self.debouncer.call(move || publisher.publish(signal));
    }

    /// Drop any signal still waiting on the quiet window
    pub fn cancel_pending(&mut self) {
        self.debouncer.cancel();
    }
}
