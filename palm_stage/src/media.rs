//! Ready-to-draw media handles carried by queue items and cards.
//!
//! Decoding happens on the compose side; a handle only ever holds pixels
//! that are already in memory.  Frames are packed 0xAARRGGBB, row-major.

use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    /// Looping multi-frame animation (decoded GIF).
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("media has no decoded frames yet")]
    NotReady,
    #[error("frame {frame} holds {got} pixels, expected {expected}")]
    SizeMismatch { frame: usize, expected: usize, got: usize },
}

struct MediaData {
    kind:           MediaKind,
    width:          u32,
    height:         u32,
    frames:         Vec<Vec<u32>>,
    frame_delay_ms: u64,
}

/// Cheaply clonable, shared, immutable media.
#[derive(Clone)]
pub struct MediaHandle {
    inner: Arc<MediaData>,
}

/// One frame borrowed from a [`MediaHandle`].
#[derive(Clone, Copy, Debug)]
pub struct MediaFrame<'a> {
    pub width:  u32,
    pub height: u32,
    pub pixels: &'a [u32],
}

impl MediaHandle {
    pub fn image(width: u32, height: u32, pixels: Vec<u32>) -> Self {
        MediaHandle {
            inner: Arc::new(MediaData {
                kind: MediaKind::Image,
                width,
                height,
                frames: vec![pixels],
                frame_delay_ms: 0,
            }),
        }
    }

    pub fn video(width: u32, height: u32, frames: Vec<Vec<u32>>, frame_delay_ms: u64) -> Self {
        MediaHandle {
            inner: Arc::new(MediaData {
                kind: MediaKind::Video,
                width,
                height,
                frames,
                frame_delay_ms: frame_delay_ms.max(1),
            }),
        }
    }

    pub fn kind(&self)        -> MediaKind { self.inner.kind }
    pub fn is_video(&self)    -> bool      { self.inner.kind == MediaKind::Video }
    pub fn width(&self)       -> u32       { self.inner.width }
    pub fn height(&self)      -> u32       { self.inner.height }
    pub fn frame_count(&self) -> usize     { self.inner.frames.len() }

    /// The frame to show `elapsed_ms` after the owning card appeared.
    /// Videos loop; images always return their single frame.
    pub fn frame_at(&self, elapsed_ms: u64) -> Result<MediaFrame<'_>, MediaError> {
        let d = &self.inner;
        if d.frames.is_empty() {
            return Err(MediaError::NotReady);
        }
        let idx = match d.kind {
            MediaKind::Image => 0,
            MediaKind::Video => ((elapsed_ms / d.frame_delay_ms) as usize) % d.frames.len(),
        };
        let pixels = &d.frames[idx];
        let expected = d.width as usize * d.height as usize;
        if pixels.len() != expected {
            return Err(MediaError::SizeMismatch { frame: idx, expected, got: pixels.len() });
        }
        Ok(MediaFrame { width: d.width, height: d.height, pixels })
    }

    /// Whether two handles point at the same decoded media.
    pub fn same_as(&self, other: &MediaHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaHandle")
            .field("kind", &self.inner.kind)
            .field("size", &(self.inner.width, self.inner.height))
            .field("frames", &self.inner.frames.len())
            .finish()
    }
}

impl PartialEq for MediaHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
