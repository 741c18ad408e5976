//! # In-memory adapters.
//!
//! Scriptable stand-ins for every collaborator, used by the test-suite and
//! the headless demo. Each adapter is `Clone`; clones share state, so a test
//! can keep one handle while the service owns the other.
//!
//! ```rust
//! use inkclock::testing::MemoryAudio;
//! use inkclock::AudioBackend;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let audio = MemoryAudio::default();
//! let mut owned = audio.clone();
//! owned.set_volume(42).await.unwrap();
//! assert_eq!(audio.volume(), 42);
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::adapters::{
    AudioBackend, CalendarBackend, ClockFace, Compositor, Credentials, DisplayDriver, FrameBuffer,
    NetworkPresence, Occurrence, Principal, RemoteCalendar, StreamMetadata,
};
use crate::core::Clock;
use crate::error::{AudioError, CalendarError, DisplayError};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---- clock ----

/// [`Clock`] that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *lock(&self.now) = now;
    }

    /// Moves the clock forward and returns the new time.
    pub fn advance(&self, by: TimeDelta) -> DateTime<Utc> {
        let mut now = lock(&self.now);
        *now += by;
        *now
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

// ---- calendar ----

#[derive(Default)]
struct CalendarScript {
    calendars: Vec<RemoteCalendar>,
    occurrences: Vec<Occurrence>,
    auth_error: Option<CalendarError>,
    search_error: Option<CalendarError>,
    logins: usize,
    searches: Vec<(DateTime<Utc>, DateTime<Utc>)>,
}

/// Calendar server holding a fixed list of occurrences.
///
/// `search_events` returns the occurrences whose start lies in the requested
/// window, duplicates included.
#[derive(Clone, Default)]
pub struct MemoryCalendar {
    script: Arc<Mutex<CalendarScript>>,
}

impl MemoryCalendar {
    /// A server exposing one calendar called `name`.
    pub fn with_calendar(name: &str) -> Self {
        let cal = Self::default();
        lock(&cal.script).calendars.push(RemoteCalendar {
            name: name.to_string(),
            href: format!("/calendars/{name}"),
        });
        cal
    }

    /// Replaces the stored occurrences.
    pub fn set_occurrences(&self, starts: impl IntoIterator<Item = DateTime<Utc>>) {
        lock(&self.script).occurrences = starts
            .into_iter()
            .map(|s| Occurrence {
                start: s.fixed_offset(),
            })
            .collect();
    }

    /// Makes every login fail with `err` (or succeed again with `None`).
    pub fn fail_auth(&self, err: Option<CalendarError>) {
        lock(&self.script).auth_error = err;
    }

    /// Makes every search fail with `err` (or succeed again with `None`).
    pub fn fail_search(&self, err: Option<CalendarError>) {
        lock(&self.script).search_error = err;
    }

    /// Number of `authenticate` calls so far.
    pub fn logins(&self) -> usize {
        lock(&self.script).logins
    }

    /// Windows passed to `search_events`, oldest first.
    pub fn searches(&self) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        lock(&self.script).searches.clone()
    }
}

#[async_trait]
impl CalendarBackend for MemoryCalendar {
    async fn authenticate(
        &mut self,
        credentials: &Credentials,
    ) -> Result<Principal, CalendarError> {
        let mut s = lock(&self.script);
        s.logins += 1;
        if let Some(err) = &s.auth_error {
            return Err(err.clone());
        }
        Ok(Principal {
            href: format!("/principals/{}", credentials.username),
        })
    }

    async fn list_calendars(
        &mut self,
        _principal: &Principal,
    ) -> Result<Vec<RemoteCalendar>, CalendarError> {
        Ok(lock(&self.script).calendars.clone())
    }

    async fn search_events(
        &mut self,
        _calendar: &RemoteCalendar,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Occurrence>, CalendarError> {
        let mut s = lock(&self.script);
        s.searches.push((start, end));
        if let Some(err) = &s.search_error {
            return Err(err.clone());
        }
        Ok(s.occurrences
            .iter()
            .filter(|o| o.start_utc() >= start && o.start_utc() < end)
            .copied()
            .collect())
    }
}

// ---- audio ----

/// One call received by [`MemoryAudio`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCall {
    Play(String),
    Stop,
    SetVolume(u8),
}

#[derive(Default)]
struct AudioState {
    calls: Vec<AudioCall>,
    playing: bool,
    volume: u8,
    metadata: StreamMetadata,
    play_error: Option<AudioError>,
}

/// Audio player that records calls and serves scripted metadata.
#[derive(Clone, Default)]
pub struct MemoryAudio {
    state: Arc<Mutex<AudioState>>,
}

impl MemoryAudio {
    pub fn calls(&self) -> Vec<AudioCall> {
        lock(&self.state).calls.clone()
    }

    pub fn is_playing(&self) -> bool {
        lock(&self.state).playing
    }

    pub fn volume(&self) -> u8 {
        lock(&self.state).volume
    }

    /// Sets the metadata returned by the next `read_metadata` calls.
    pub fn set_metadata(&self, title: Option<&str>, artist: Option<&str>) {
        lock(&self.state).metadata = StreamMetadata {
            title: title.map(str::to_string),
            artist: artist.map(str::to_string),
        };
    }

    /// Makes `play` fail with `err` (or succeed again with `None`).
    pub fn fail_play(&self, err: Option<AudioError>) {
        lock(&self.state).play_error = err;
    }
}

#[async_trait]
impl AudioBackend for MemoryAudio {
    async fn play(&mut self, uri: &str) -> Result<(), AudioError> {
        let mut s = lock(&self.state);
        s.calls.push(AudioCall::Play(uri.to_string()));
        if let Some(err) = &s.play_error {
            return Err(err.clone());
        }
        tracing::debug!(uri, "memory audio: play");
        s.playing = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), AudioError> {
        let mut s = lock(&self.state);
        s.calls.push(AudioCall::Stop);
        tracing::debug!("memory audio: stop");
        s.playing = false;
        Ok(())
    }

    async fn set_volume(&mut self, volume: u8) -> Result<(), AudioError> {
        if volume > 100 {
            return Err(AudioError::Rejected {
                reason: format!("volume {volume} out of range"),
            });
        }
        let mut s = lock(&self.state);
        s.calls.push(AudioCall::SetVolume(volume));
        s.volume = volume;
        Ok(())
    }

    async fn read_metadata(&mut self) -> Result<StreamMetadata, AudioError> {
        Ok(lock(&self.state).metadata.clone())
    }
}

// ---- display ----

/// One primitive received by [`MemoryDisplay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelOp {
    Init,
    Clear,
    Sleep,
    InitPartial,
    Partial,
    InitFast,
    Full,
}

#[derive(Default)]
struct PanelState {
    ops: Vec<PanelOp>,
    fail: Option<DisplayError>,
}

/// Panel that records primitives instead of driving glass.
#[derive(Clone)]
pub struct MemoryDisplay {
    width: u32,
    height: u32,
    state: Arc<Mutex<PanelState>>,
}

impl MemoryDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            state: Arc::new(Mutex::new(PanelState::default())),
        }
    }

    pub fn ops(&self) -> Vec<PanelOp> {
        lock(&self.state).ops.clone()
    }

    /// Number of recorded `op`s.
    pub fn count(&self, op: PanelOp) -> usize {
        lock(&self.state).ops.iter().filter(|o| **o == op).count()
    }

    pub fn clear_ops(&self) {
        lock(&self.state).ops.clear();
    }

    /// Makes every primitive fail with `err` (or succeed again with `None`).
    pub fn fail_with(&self, err: Option<DisplayError>) {
        lock(&self.state).fail = err;
    }

    fn record(&self, op: PanelOp) -> Result<(), DisplayError> {
        let mut s = lock(&self.state);
        if let Some(err) = &s.fail {
            return Err(err.clone());
        }
        tracing::debug!(?op, "memory panel");
        s.ops.push(op);
        Ok(())
    }
}

impl Default for MemoryDisplay {
    /// 800 × 480, the size of a 7.5" panel.
    fn default() -> Self {
        Self::new(800, 480)
    }
}

#[async_trait]
impl DisplayDriver for MemoryDisplay {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    async fn init(&mut self) -> Result<(), DisplayError> {
        self.record(PanelOp::Init)
    }

    async fn clear(&mut self) -> Result<(), DisplayError> {
        self.record(PanelOp::Clear)
    }

    async fn sleep(&mut self) -> Result<(), DisplayError> {
        self.record(PanelOp::Sleep)
    }

    async fn init_partial(&mut self) -> Result<(), DisplayError> {
        self.record(PanelOp::InitPartial)
    }

    async fn display_partial(
        &mut self,
        _frame: &FrameBuffer,
        _x: u32,
        _y: u32,
        _w: u32,
        _h: u32,
    ) -> Result<(), DisplayError> {
        self.record(PanelOp::Partial)
    }

    async fn init_fast(&mut self) -> Result<(), DisplayError> {
        self.record(PanelOp::InitFast)
    }

    async fn display(&mut self, _frame: &FrameBuffer) -> Result<(), DisplayError> {
        self.record(PanelOp::Full)
    }
}

/// Compositor that keeps every face it was asked to draw.
#[derive(Clone, Default)]
pub struct MemoryCompositor {
    faces: Arc<Mutex<Vec<ClockFace>>>,
}

impl MemoryCompositor {
    pub fn faces(&self) -> Vec<ClockFace> {
        lock(&self.faces).clone()
    }

    pub fn last_face(&self) -> Option<ClockFace> {
        lock(&self.faces).last().cloned()
    }
}

impl Compositor for MemoryCompositor {
    fn compose(&self, face: &ClockFace, width: u32, height: u32) -> FrameBuffer {
        lock(&self.faces).push(face.clone());
        FrameBuffer::blank(width, height)
    }
}

// ---- network ----

/// Presence check with a switchable answer.
#[derive(Clone, Default)]
pub struct FixedPresence {
    online: Arc<AtomicBool>,
}

impl FixedPresence {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn set(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }
}

impl NetworkPresence for FixedPresence {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }
}
