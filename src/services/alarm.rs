//! # AlarmController: rings on calendar events, toggles manual playback.
//!
//! ```text
//!          EventStarted                    deadline / SilenceAlarm(Pressed)
//! Idle ────────────────► Ringing{expire_at} ───────────────────────────────► Idle
//!  │  ▲
//!  │  └── SilenceAlarm(Pressed) ── ManuallyPlaying
//!  └───── SilenceAlarm(Pressed) ──►
//! ```
//!
//! Each tick runs: volume ramp (playing only) ─► inbox ─► deadline ─► metadata.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::adapters::AudioBackend;
use crate::config::AlarmConfig;
use crate::error::AudioError;
use crate::events::{AlarmOutcome, Bus, Event, Inbox, RadioState, Topic};
use crate::tasks::{Continuation, Task};

const MAX_VOLUME: u8 = 100;

/// Playback mode of the alarm controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmMode {
    Idle,
    /// An alarm is sounding and expires on its own at `expire_at`.
    Ringing { expire_at: DateTime<Utc> },
    /// Started by the button; runs until the next press.
    ManuallyPlaying,
}

impl AlarmMode {
    pub fn is_playing(&self) -> bool {
        !matches!(self, AlarmMode::Idle)
    }
}

/// Drives the [`AudioBackend`] from `EventStarted` and `SilenceAlarm` events.
pub struct AlarmController {
    audio: Box<dyn AudioBackend>,
    bus: Bus,
    inbox: Inbox,
    stream_url: String,
    ring_duration: TimeDelta,

    mode: AlarmMode,
    volume: u8,
    track: Option<String>,
}

impl AlarmController {
    /// Creates an idle controller subscribed to `EventStarted` and `SilenceAlarm`.
    pub fn new(audio: Box<dyn AudioBackend>, bus: Bus, cfg: &AlarmConfig) -> Self {
        let inbox = bus.inbox("alarm");
        bus.subscribe_all(&inbox, &[Topic::EventStarted, Topic::SilenceAlarm]);

        Self {
            audio,
            bus,
            inbox,
            stream_url: cfg.stream_url.clone(),
            ring_duration: cfg.ring_duration(),
            mode: AlarmMode::Idle,
            volume: 0,
            track: None,
        }
    }

    pub fn mode(&self) -> AlarmMode {
        self.mode
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Last published now-playing label.
    pub fn track(&self) -> Option<&str> {
        self.track.as_deref()
    }

    fn report(&self, err: &AudioError, action: &'static str) {
        tracing::warn!(error = %err, label = err.as_label(), action, "audio backend failed");
        self.bus.publish(Event::AudioError(err.to_string()));
    }

    async fn ramp(&mut self) {
        if !self.mode.is_playing() || self.volume >= MAX_VOLUME {
            return;
        }
        let target = self.volume + 1;
        match self.audio.set_volume(target).await {
            Ok(()) => self.volume = target,
            Err(err) => self.report(&err, "set_volume"),
        }
    }

    /// Starts playback at `volume` and switches to `mode`.
    async fn start(&mut self, mode: AlarmMode, volume: u8) {
        if let Err(err) = self.audio.set_volume(volume).await {
            self.report(&err, "set_volume");
        }
        self.volume = volume;

        if let Err(err) = self.audio.play(&self.stream_url).await {
            self.report(&err, "play");
            return;
        }
        tracing::info!(?mode, volume, "playback started");
        self.mode = mode;
        self.bus.publish(Event::Radio(RadioState::On));
    }

    async fn stop(&mut self) {
        if let Err(err) = self.audio.stop().await {
            self.report(&err, "stop");
        }
        tracing::info!("playback stopped");
        self.mode = AlarmMode::Idle;
        self.track = None;
        self.bus.publish(Event::Radio(RadioState::Off));
    }

    async fn on_event_started(&mut self, now: DateTime<Utc>) {
        let expire_at = now + self.ring_duration;
        tracing::info!(%expire_at, "alarm ringing");
        self.start(AlarmMode::Ringing { expire_at }, 0).await;
    }

    async fn on_button(&mut self, now: DateTime<Utc>) {
        match self.mode {
            AlarmMode::Ringing { expire_at } => {
                let outcome = if now >= expire_at {
                    AlarmOutcome::Expired
                } else {
                    AlarmOutcome::Canceled
                };
                self.stop().await;
                self.bus.publish(Event::Alarm(outcome));
            }
            AlarmMode::ManuallyPlaying => self.stop().await,
            AlarmMode::Idle => self.start(AlarmMode::ManuallyPlaying, MAX_VOLUME).await,
        }
    }

    async fn expire(&mut self, now: DateTime<Utc>) {
        if let AlarmMode::Ringing { expire_at } = self.mode {
            if now >= expire_at {
                tracing::info!("alarm expired unattended");
                self.stop().await;
                self.bus.publish(Event::Alarm(AlarmOutcome::Expired));
            }
        }
    }

    async fn poll_metadata(&mut self) {
        if !self.mode.is_playing() {
            return;
        }
        let label = match self.audio.read_metadata().await {
            Ok(md) => md.label(),
            Err(err) => {
                self.report(&err, "read_metadata");
                return;
            }
        };
        if self.track.as_deref() != Some(label.as_str()) {
            tracing::debug!(%label, "now playing");
            self.track = Some(label.clone());
            self.bus.publish(Event::SongName(label));
        }
    }
}

#[async_trait]
impl Task for AlarmController {
    fn name(&self) -> &str {
        "alarm"
    }

    async fn tick(&mut self, now: DateTime<Utc>) -> Continuation {
        self.ramp().await;

        while let Some(ev) = self.inbox.drain() {
            match ev {
                Event::EventStarted(_) => self.on_event_started(now).await,
                Event::SilenceAlarm(_) if ev.is_press() => self.on_button(now).await,
                _ => {}
            }
        }

        self.expire(now).await;
        self.poll_metadata().await;
        Continuation::KeepRunning
    }
}
