//! # Topic-routed event bus with per-subscriber inboxes.
//!
//! [`Bus`] keeps a registry `Topic → [route]`; each route is the sending half
//! of one subscriber's [`Inbox`] (an unbounded tokio mpsc channel).
//!
//! ## Architecture
//! ```text
//! Publishers:                              Subscribers:
//!   CalendarService ──┐                 ┌──► [inbox A] ──► A.drain()
//!   AlarmController ──┼──► Bus registry ┼──► [inbox B] ──► B.drain()
//!   input source    ──┘   (by Topic)    └──► [inbox C] ──► C.drain()
//! ```
//!
//! ## Rules
//! - **Queue-append only**: `publish()` never runs subscriber code.
//! - **No buffering for nobody**: a topic without subscribers drops the event;
//!   a later subscriber never sees it.
//! - **Per-subscriber FIFO**: one inbox preserves publish order; there is no
//!   ordering across inboxes.
//! - **Idempotent subscribe**: subscribing twice to a topic delivers once.
//! - **Self-pruning**: routes whose inbox was dropped are removed on publish.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use super::event::{Event, Topic};

struct Route {
    inbox_id: u64,
    tx: mpsc::UnboundedSender<Event>,
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    topics: Mutex<HashMap<Topic, Vec<Route>>>,
}

impl Registry {
    fn topics(&self) -> MutexGuard<'_, HashMap<Topic, Vec<Route>>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Event router shared by all services.
///
/// Owned by the process root and handed to each service at construction.
/// Cloning is cheap (one `Arc`).
#[derive(Clone, Default)]
pub struct Bus {
    registry: Arc<Registry>,
}

impl Bus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new subscriber handle.
    ///
    /// The inbox receives nothing until it is subscribed to at least one topic.
    pub fn inbox(&self, name: impl Into<Arc<str>>) -> Inbox {
        let (tx, rx) = mpsc::unbounded_channel();
        Inbox {
            id: self.registry.next_id.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            tx,
            rx,
        }
    }

    /// Registers `inbox` under `topic`. Repeated calls are no-ops.
    pub fn subscribe(&self, inbox: &Inbox, topic: Topic) {
        let mut topics = self.registry.topics();
        let routes = topics.entry(topic).or_default();
        if routes.iter().any(|r| r.inbox_id == inbox.id) {
            return;
        }
        routes.push(Route {
            inbox_id: inbox.id,
            tx: inbox.tx.clone(),
        });
    }

    /// Registers `inbox` under every topic in `topics`.
    pub fn subscribe_all(&self, inbox: &Inbox, topics: &[Topic]) {
        for topic in topics {
            self.subscribe(inbox, *topic);
        }
    }

    /// Appends `event` to the inbox of every subscriber of its topic.
    ///
    /// Returns the number of inboxes the event was delivered to; `0` means it
    /// was dropped.
    pub fn publish(&self, event: Event) -> usize {
        let mut topics = self.registry.topics();
        let Some(routes) = topics.get_mut(&event.topic()) else {
            return 0;
        };
        routes.retain(|route| route.tx.send(event.clone()).is_ok());
        routes.len()
    }

    /// Number of inboxes currently registered under `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.registry.topics().get(&topic).map_or(0, Vec::len)
    }
}

/// One subscriber's ordered, unbounded queue of delivered events.
pub struct Inbox {
    id: u64,
    name: Arc<str>,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl Inbox {
    /// Name given at creation (used in logs).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pops the oldest pending event, or `None` if the inbox is empty.
    pub fn drain(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Pops pending events until the inbox is empty.
    pub fn drain_all(&mut self) -> impl Iterator<Item = Event> + '_ {
        std::iter::from_fn(move || self.drain())
    }

    /// True if the inbox holds no pending events.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ButtonEdge, RadioState};

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let bus = Bus::new();
        assert_eq!(bus.publish(Event::SongName("lost".into())), 0);

        let mut late = bus.inbox("late");
        bus.subscribe(&late, Topic::SongName);
        assert!(late.drain().is_none());

        bus.publish(Event::SongName("seen".into()));
        assert_eq!(late.drain(), Some(Event::SongName("seen".into())));
    }

    #[test]
    fn inbox_preserves_publish_order() {
        let bus = Bus::new();
        let mut inbox = bus.inbox("fifo");
        bus.subscribe_all(&inbox, &[Topic::SongName, Topic::Radio]);

        bus.publish(Event::SongName("one".into()));
        bus.publish(Event::Radio(RadioState::Off));
        bus.publish(Event::SongName("two".into()));

        let got: Vec<Event> = inbox.drain_all().collect();
        assert_eq!(
            got,
            vec![
                Event::SongName("one".into()),
                Event::Radio(RadioState::Off),
                Event::SongName("two".into()),
            ]
        );
        assert!(inbox.is_empty());
    }

    #[test]
    fn subscribe_is_idempotent() {
        let bus = Bus::new();
        let mut inbox = bus.inbox("twice");
        bus.subscribe(&inbox, Topic::SilenceAlarm);
        bus.subscribe(&inbox, Topic::SilenceAlarm);
        assert_eq!(bus.subscriber_count(Topic::SilenceAlarm), 1);

        assert_eq!(bus.publish(Event::SilenceAlarm(ButtonEdge::Pressed)), 1);
        assert!(inbox.drain().is_some());
        assert!(inbox.drain().is_none());
    }

    #[test]
    fn fan_out_reaches_only_subscribers_of_the_topic() {
        let bus = Bus::new();
        let mut a = bus.inbox("a");
        let mut b = bus.inbox("b");
        bus.subscribe(&a, Topic::Radio);
        bus.subscribe(&b, Topic::Radio);
        bus.subscribe(&b, Topic::Alarm);

        assert_eq!(bus.publish(Event::Radio(RadioState::On)), 2);
        assert_eq!(a.drain(), Some(Event::Radio(RadioState::On)));
        assert_eq!(b.drain(), Some(Event::Radio(RadioState::On)));
        assert!(a.drain().is_none());
    }

    #[test]
    fn dropped_inbox_is_pruned() {
        let bus = Bus::new();
        let keep = bus.inbox("keep");
        let gone = bus.inbox("gone");
        bus.subscribe(&keep, Topic::SongName);
        bus.subscribe(&gone, Topic::SongName);
        drop(gone);

        assert_eq!(bus.publish(Event::SongName("x".into())), 1);
        assert_eq!(bus.subscriber_count(Topic::SongName), 1);
    }
}
