//! # Events exchanged between the clock services.
//!
//! Every [`Event`] variant belongs to exactly one [`Topic`], and carries the
//! payload type agreed for that topic. Routing happens on the topic; the
//! payload never needs to be downcast by the receiver.
//!
//! ## Topics
//! ```text
//! CalendarService ──► EventStarted, EventNext, CalendarError
//! AlarmController ──► SongName, Radio, Alarm, AudioError
//! input source    ──► SilenceAlarm, RequestCalendarUpdate
//! ```
//!
//! ## Example
//! ```rust
//! use inkclock::{ButtonEdge, Event, Topic};
//!
//! let ev = Event::SilenceAlarm(ButtonEdge::Pressed);
//! assert_eq!(ev.topic(), Topic::SilenceAlarm);
//! assert_eq!(ev.topic().as_str(), "SilenceAlarm");
//! assert!(ev.is_press());
//! ```

use std::fmt;

use chrono::{DateTime, Utc};

/// Routing key of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    /// A calendar occurrence has reached its start time.
    EventStarted,
    /// The earliest upcoming occurrence changed.
    EventNext,
    /// Calendar failure message, or a clear once polling recovers.
    CalendarError,
    /// Title of the stream that is currently playing.
    SongName,
    /// Playback switched on or off.
    Radio,
    /// Outcome of a ringing alarm.
    Alarm,
    /// Audio backend failure message.
    AudioError,
    /// Silence / manual play button edge.
    SilenceAlarm,
    /// Calendar refresh button edge.
    RequestCalendarUpdate,
}

impl Topic {
    /// Every topic, in declaration order.
    pub const ALL: [Topic; 9] = [
        Topic::EventStarted,
        Topic::EventNext,
        Topic::CalendarError,
        Topic::SongName,
        Topic::Radio,
        Topic::Alarm,
        Topic::AudioError,
        Topic::SilenceAlarm,
        Topic::RequestCalendarUpdate,
    ];

    /// Returns the conventional topic name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::EventStarted => "EventStarted",
            Topic::EventNext => "EventNext",
            Topic::CalendarError => "CalendarError",
            Topic::SongName => "SongName",
            Topic::Radio => "Radio",
            Topic::Alarm => "Alarm",
            Topic::AudioError => "AudioError",
            Topic::SilenceAlarm => "SilenceAlarm",
            Topic::RequestCalendarUpdate => "RequestCalendarUpdate",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Debounced edge reported by the input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEdge {
    Pressed,
    Released,
}

/// Playback state announced on [`Topic::Radio`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioState {
    On,
    Off,
}

/// How a ringing alarm ended, announced on [`Topic::Alarm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmOutcome {
    /// The ringing deadline passed (with or without a late button press).
    Expired,
    /// The button was pressed before the deadline.
    Canceled,
}

/// A message on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Start instant of an occurrence that has just begun.
    EventStarted(DateTime<Utc>),
    /// Start instant of the earliest upcoming occurrence.
    EventNext(DateTime<Utc>),
    /// `Some(message)` on failure, `None` once the calendar recovers.
    CalendarError(Option<String>),
    /// `"{artist} - {title}"` label of the playing stream.
    SongName(String),
    Radio(RadioState),
    Alarm(AlarmOutcome),
    /// Human-readable audio failure.
    AudioError(String),
    SilenceAlarm(ButtonEdge),
    RequestCalendarUpdate(ButtonEdge),
}

impl Event {
    /// Returns the topic this event is routed under.
    pub fn topic(&self) -> Topic {
        match self {
            Event::EventStarted(_) => Topic::EventStarted,
            Event::EventNext(_) => Topic::EventNext,
            Event::CalendarError(_) => Topic::CalendarError,
            Event::SongName(_) => Topic::SongName,
            Event::Radio(_) => Topic::Radio,
            Event::Alarm(_) => Topic::Alarm,
            Event::AudioError(_) => Topic::AudioError,
            Event::SilenceAlarm(_) => Topic::SilenceAlarm,
            Event::RequestCalendarUpdate(_) => Topic::RequestCalendarUpdate,
        }
    }

    /// True for a `Pressed` edge on either button topic.
    #[inline]
    pub fn is_press(&self) -> bool {
        matches!(
            self,
            Event::SilenceAlarm(ButtonEdge::Pressed)
                | Event::RequestCalendarUpdate(ButtonEdge::Pressed)
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::EventStarted(at) | Event::EventNext(at) => {
                write!(f, "{}: {}", self.topic(), at.to_rfc3339())
            }
            Event::CalendarError(Some(msg)) => write!(f, "{}: {msg}", self.topic()),
            Event::CalendarError(None) => write!(f, "{}: cleared", self.topic()),
            Event::SongName(label) | Event::AudioError(label) => {
                write!(f, "{}: {label}", self.topic())
            }
            Event::Radio(state) => write!(f, "{}: {state:?}", self.topic()),
            Event::Alarm(outcome) => write!(f, "{}: {outcome:?}", self.topic()),
            Event::SilenceAlarm(edge) | Event::RequestCalendarUpdate(edge) => {
                write!(f, "{}: {edge:?}", self.topic())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_maps_to_its_own_topic() {
        let now = Utc::now();
        let events = [
            Event::EventStarted(now),
            Event::EventNext(now),
            Event::CalendarError(None),
            Event::SongName("a - b".into()),
            Event::Radio(RadioState::On),
            Event::Alarm(AlarmOutcome::Canceled),
            Event::AudioError("x".into()),
            Event::SilenceAlarm(ButtonEdge::Released),
            Event::RequestCalendarUpdate(ButtonEdge::Pressed),
        ];
        let topics: Vec<Topic> = events.iter().map(Event::topic).collect();
        assert_eq!(topics, Topic::ALL);
    }

    #[test]
    fn display_uses_conventional_names() {
        assert_eq!(Event::Radio(RadioState::Off).to_string(), "Radio: Off");
        assert_eq!(Event::Alarm(AlarmOutcome::Expired).to_string(), "Alarm: Expired");
        assert!(!Event::SilenceAlarm(ButtonEdge::Released).is_press());
    }
}
