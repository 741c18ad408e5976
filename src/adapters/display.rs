//! Display panel and face-composition contracts.
//!
//! The coordinator decides *what* to show ([`ClockFace`]) and *how* to push
//! it (partial vs full refresh). Turning a face into pixels is the
//! [`Compositor`]'s job; moving pixels to the glass is the [`DisplayDriver`]'s.

use async_trait::async_trait;

use crate::error::DisplayError;

/// Status banner drawn along the top edge of the face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    /// Nothing to report.
    None,
    /// Bell icon plus the upcoming event's local `HHMM`.
    Alert { time_label: String },
    /// Warning icon plus the last calendar error.
    Warning { message: String },
}

/// Everything that appears on one rendered face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockFace {
    /// Large local `HHMM` label.
    pub time_label: String,
    /// Now-playing overlay along the bottom edge.
    pub song: Option<String>,
    /// Show the network icon.
    pub online: bool,
    pub banner: Banner,
}

/// Packed 1-bit frame in the driver's native layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameBuffer {
    /// A white frame of `width × height` pixels (rows padded to whole bytes).
    pub fn blank(width: u32, height: u32) -> Self {
        let stride = width.div_ceil(8) as usize;
        Self {
            width,
            height,
            data: vec![0xFF; stride * height as usize],
        }
    }
}

/// Renders a [`ClockFace`] into a frame sized for the panel.
pub trait Compositor: Send {
    fn compose(&self, face: &ClockFace, width: u32, height: u32) -> FrameBuffer;
}

/// E-paper panel primitives.
#[async_trait]
pub trait DisplayDriver: Send {
    /// Panel size in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Full initialisation after power-up or deep sleep.
    async fn init(&mut self) -> Result<(), DisplayError>;

    /// Clears the glass to white.
    async fn clear(&mut self) -> Result<(), DisplayError>;

    /// Enters the low-power state until the next init.
    async fn sleep(&mut self) -> Result<(), DisplayError>;

    /// Prepares the panel for a partial update.
    async fn init_partial(&mut self) -> Result<(), DisplayError>;

    /// Pushes the `(x, y, w, h)` window of `frame` with a partial refresh.
    async fn display_partial(
        &mut self,
        frame: &FrameBuffer,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
    ) -> Result<(), DisplayError>;

    /// Prepares the panel for a fast full refresh.
    async fn init_fast(&mut self) -> Result<(), DisplayError>;

    /// Pushes `frame` with a full refresh.
    async fn display(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError>;
}
