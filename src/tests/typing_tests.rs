// TypingSignaler tests: debounce coalescing and at-most-once publishing.

use crate::typing::{ChannelPublisher, TypingSignaler};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use crate::model::TypingSignal;

const WINDOW: Duration = Duration::from_millis(50);

fn drain(receiver: &mut UnboundedReceiver<TypingSignal>) -> Vec<TypingSignal> {
    let mut signals = Vec::new();
    while let Ok(signal) = receiver.try_recv() {
        signals.push(signal);
    }
    signals
}

#[tokio::test]
async fn rapid_keystrokes_publish_at_most_once_per_window() {
    let (publisher, mut receiver) = ChannelPublisher::new();
    let mut signaler = TypingSignaler::with_window(Arc::new(publisher), "chat-1", "me", WINDOW);

    // A burst of keystrokes inside one quiet window.
    for _ in 0..10 {
        signaler.notify_typing(true);
    }
    tokio::time::sleep(WINDOW * 3).await;

    let signals = drain(&mut receiver);
    assert_eq!(signals.len(), 1);
    assert!(signals[0].is_typing);
    assert_eq!(signals[0].conversation_id, "chat-1");

    // A stopped-typing signal after the window publishes exactly one more.
    signaler.notify_typing(false);
    tokio::time::sleep(WINDOW * 3).await;

    let signals = drain(&mut receiver);
    assert_eq!(signals.len(), 1);
    assert!(!signals[0].is_typing);
}

#[tokio::test]
async fn the_most_recent_state_wins_within_a_window() {
    let (publisher, mut receiver) = ChannelPublisher::new();
    let mut signaler = TypingSignaler::with_window(Arc::new(publisher), "chat-1", "me", WINDOW);

    signaler.notify_typing(true);
    signaler.notify_typing(false);
    tokio::time::sleep(WINDOW * 3).await;

    let signals = drain(&mut receiver);
    assert_eq!(signals.len(), 1);
    assert!(!signals[0].is_typing);
}

#[tokio::test]
async fn cancel_pending_suppresses_the_scheduled_publish() {
    let (publisher, mut receiver) = ChannelPublisher::new();
    let mut signaler = TypingSignaler::with_window(Arc::new(publisher), "chat-1", "me", WINDOW);

    signaler.notify_typing(true);
    signaler.cancel_pending();
    tokio::time::sleep(WINDOW * 3).await;

    assert!(drain(&mut receiver).is_empty());
}

#[tokio::test]
async fn separated_keystrokes_each_publish() {
    let (publisher, mut receiver) = ChannelPublisher::new();
    let mut signaler = TypingSignaler::with_window(Arc::new(publisher), "chat-1", "me", WINDOW);

    signaler.notify_typing(true);
    tokio::time::sleep(WINDOW * 3).await;
    signaler.notify_typing(true);
    tokio::time::sleep(WINDOW * 3).await;

    assert_eq!(drain(&mut receiver).len(), 2);
}
