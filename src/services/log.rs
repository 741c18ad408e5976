//! # LogTap: passive event logger.
//!
//! A service subscribed to every [`Topic`] that writes each delivered event
//! to the `tracing` log. Use it for demos and bring-up.
//!
//! ## Example output
//! ```text
//! INFO inkclock::services::log: bus event topic="EventNext" event=EventNext: 2024-03-04T07:05:00+00:00
//! INFO inkclock::services::log: bus event topic="Radio" event=Radio: On
//! WARN inkclock::services::log: bus event topic="CalendarError" event=CalendarError: Failed to login
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::events::{Bus, Event, Inbox, Topic};
use crate::tasks::{Continuation, Task};

/// Event logger service.
pub struct LogTap {
    inbox: Inbox,
    seen: u64,
}

impl LogTap {
    /// Construct a new [`LogTap`] listening on every topic of `bus`.
    #[must_use]
    pub fn new(bus: &Bus) -> Self {
        let inbox = bus.inbox("log");
        bus.subscribe_all(&inbox, &Topic::ALL);
        Self { inbox, seen: 0 }
    }

    /// Number of events logged so far.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    fn write(ev: &Event) {
        let topic = ev.topic().as_str();
        match ev {
            Event::CalendarError(Some(_)) | Event::AudioError(_) => {
                tracing::warn!(topic, event = %ev, "bus event");
            }
            Event::SilenceAlarm(_) | Event::RequestCalendarUpdate(_) => {
                tracing::debug!(topic, event = %ev, "bus event");
            }
            _ => tracing::info!(topic, event = %ev, "bus event"),
        }
    }
}

#[async_trait]
impl Task for LogTap {
    fn name(&self) -> &str {
        "log"
    }

    async fn tick(&mut self, _now: DateTime<Utc>) -> Continuation {
        while let Some(ev) = self.inbox.drain() {
            Self::write(&ev);
            self.seen += 1;
        }
        Continuation::KeepRunning
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ButtonEdge, RadioState};

    #[tokio::test]
    async fn logs_every_topic() {
        let bus = Bus::new();
        let mut tap = LogTap::new(&bus);
        for topic in Topic::ALL {
            assert_eq!(bus.subscriber_count(topic), 1);
        }

        bus.publish(Event::Radio(RadioState::On));
        bus.publish(Event::CalendarError(Some("Failed to login".into())));
        bus.publish(Event::SilenceAlarm(ButtonEdge::Pressed));

        assert_eq!(tap.tick(Utc::now()).await, Continuation::KeepRunning);
        assert_eq!(tap.seen(), 3);
    }
}
