//! Compose side: turn text and an optional media file into a [`QueueItem`].
//!
//! All decoding happens here, off the frame loop.  Only a fully decoded
//! [`MediaHandle`] ever reaches the queue.
//!
//! GIFs are first decoded as an animation on a worker thread.  If that
//! fails, produces fewer than two frames, or overruns the timeout, the
//! file is decoded again as a single still image.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageFormat, RgbaImage};
use tracing::{info, warn};

use crate::color::{Rgb, DEFAULT_COMPOSE_COLOR};
use crate::media::MediaHandle;
use crate::queue::QueueItem;

const GIF_FALLBACK_TIMEOUT: Duration = Duration::from_millis(2000);
/// Frame delay used when a GIF declares none.
const DEFAULT_GIF_DELAY_MS: u64 = 100;
/// Larger GIFs skip the animated decode and go straight to a still.
const MAX_ANIMATED_GIF_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("cannot read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("cannot decode {path}: {source}")]
    Decode { path: PathBuf, source: image::ImageError },
}

/// One compose request, as sent from a UI thread.
#[derive(Clone, Debug)]
pub struct ComposeRequest {
    pub text:  String,
    pub media: Option<PathBuf>,
    pub color: Rgb,
}

#[derive(Clone, Debug)]
pub struct Composer {
    pub default_color:      Rgb,
    pub gif_timeout:        Duration,
    pub max_animated_bytes: usize,
}

impl Default for Composer {
    fn default() -> Self {
        Composer {
            default_color:      DEFAULT_COMPOSE_COLOR,
            gif_timeout:        GIF_FALLBACK_TIMEOUT,
            max_animated_bytes: MAX_ANIMATED_GIF_BYTES,
        }
    }
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue item.  `Ok(None)` when there is neither text nor media.
    pub fn compose(&self, text: &str, media: Option<&Path>, color: Rgb) -> Result<Option<QueueItem>, ComposeError> {
        let text = text.trim();
        let Some(path) = media else {
            if text.is_empty() {
                return Ok(None);
            }
            info!(%text, "text message composed");
            return Ok(Some(QueueItem::text(text, color)));
        };

        let bytes = std::fs::read(path).map_err(|source| ComposeError::Io { path: path.to_path_buf(), source })?;
        if is_gif(path, &bytes) {
            let label = if text.is_empty() { "GIF" } else { text };
            match self.decode_gif_animation(bytes.clone()) {
                Some(media) => {
                    info!(frames = media.frame_count(), "GIF composed as animation");
                    return Ok(Some(QueueItem::with_media(label, color, media)));
                }
                None => {
                    let media = decode_still(path, &bytes)?;
                    info!("GIF composed as still image");
                    return Ok(Some(QueueItem::with_media(label, color, media)));
                }
            }
        }

        let label = if text.is_empty() { "Image" } else { text };
        let media = decode_still(path, &bytes)?;
        info!(width = media.width(), height = media.height(), "image composed");
        Ok(Some(QueueItem::with_media(label, color, media)))
    }

    /// Compose using [`Composer::default_color`].
    pub fn compose_default(&self, text: &str, media: Option<&Path>) -> Result<Option<QueueItem>, ComposeError> {
        self.compose(text, media, self.default_color)
    }

    fn decode_gif_animation(&self, bytes: Vec<u8>) -> Option<MediaHandle> {
        if bytes.len() > self.max_animated_bytes {
            warn!(bytes = bytes.len(), limit = self.max_animated_bytes, "GIF too large to animate, using still image");
            return None;
        }
        // A timed-out worker is detached, not cancelled; it runs to the end
        // of its decode and its result is dropped.  The size limit above
        // bounds how long that can take.
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(decode_gif_frames(bytes));
        });
        match rx.recv_timeout(self.gif_timeout) {
            Ok(Ok(media)) if media.frame_count() >= 2 => Some(media),
            Ok(Ok(media)) => {
                warn!(frames = media.frame_count(), "GIF has fewer than two frames, using still image");
                None
            }
            Ok(Err(err)) => {
                warn!(%err, "GIF animation decode failed, using still image");
                None
            }
            Err(_) => {
                warn!(timeout_ms = self.gif_timeout.as_millis() as u64, "GIF animation decode timed out, using still image");
                None
            }
        }
    }
}

/// Run a composer on its own thread: requests in, ready items out.
/// Failed requests are logged and dropped.
pub fn spawn_composer(composer: Composer) -> (Sender<ComposeRequest>, Receiver<QueueItem>) {
    let (req_tx, req_rx) = mpsc::channel::<ComposeRequest>();
    let (item_tx, item_rx) = mpsc::channel();
    thread::spawn(move || {
        for req in req_rx {
            match composer.compose(&req.text, req.media.as_deref(), req.color) {
                Ok(Some(item)) => {
                    if item_tx.send(item).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(err) => warn!(%err, "compose request dropped"),
            }
        }
    });
    (req_tx, item_rx)
}

// ════════════════════════════════════════════════════════════════════════════
// Decoding
// ════════════════════════════════════════════════════════════════════════════

fn is_gif(path: &Path, bytes: &[u8]) -> bool {
    let by_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("gif"));
    by_ext || matches!(image::guess_format(bytes), Ok(ImageFormat::Gif))
}

fn rgba_to_argb(img: &RgbaImage) -> Vec<u32> {
    img.pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
        })
        .collect()
}

fn decode_still(path: &Path, bytes: &[u8]) -> Result<MediaHandle, ComposeError> {
    let img = image::load_from_memory(bytes)
        .map_err(|source| ComposeError::Decode { path: path.to_path_buf(), source })?
        .to_rgba8();
    Ok(MediaHandle::image(img.width(), img.height(), rgba_to_argb(&img)))
}

fn decode_gif_frames(bytes: Vec<u8>) -> Result<MediaHandle, image::ImageError> {
    let decoder = GifDecoder::new(std::io::Cursor::new(bytes))?;
    let frames = decoder.into_frames().collect_frames()?;
    let Some(first) = frames.first() else {
        return Ok(MediaHandle::video(0, 0, Vec::new(), DEFAULT_GIF_DELAY_MS));
    };
    let (numer, denom) = first.delay().numer_denom_ms();
    let delay = if numer == 0 { DEFAULT_GIF_DELAY_MS } else { (numer / denom.max(1)) as u64 };
    let (w, h) = first.buffer().dimensions();
    let pixels = frames.iter().map(|f| rgba_to_argb(f.buffer())).collect();
    Ok(MediaHandle::video(w, h, pixels, delay))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, Rgba};

    fn write_gif(path: &Path, colors: &[[u8; 4]]) {
        let file = std::fs::File::create(path).unwrap();
        let mut enc = GifEncoder::new(file);
        let frames = colors.iter().map(|c| {
            let buf = RgbaImage::from_pixel(4, 3, Rgba(*c));
            Frame::from_parts(buf, 0, 0, Delay::from_numer_denom_ms(50, 1))
        });
        enc.encode_frames(frames).unwrap();
    }

    #[test]
    fn text_only() {
        let item = Composer::new().compose("  hello ", None, Rgb(0x123456)).unwrap().unwrap();
        assert_eq!(item.text, "hello");
        assert_eq!(item.color, Some(Rgb(0x123456)));
        assert!(item.media.is_none());
        assert!(!item.is_video);
    }

    #[test]
    fn nothing_to_compose() {
        assert!(Composer::new().compose("   ", None, Rgb::WHITE).unwrap().is_none());
    }

    #[test]
    fn png_defaults_label_to_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255])).save(&path).unwrap();
        let item = Composer::new().compose_default("", Some(&path)).unwrap().unwrap();
        assert_eq!(item.text, "Image");
        assert_eq!(item.color, Some(DEFAULT_COMPOSE_COLOR));
        assert!(!item.is_video);
        let media = item.media.unwrap();
        assert_eq!(media.frame_at(0).unwrap().pixels, &[0xFFFF0000; 4]);
    }

    #[test]
    fn animated_gif_becomes_video() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blink.gif");
        write_gif(&path, &[[255, 0, 0, 255], [0, 0, 255, 255]]);
        let item = Composer::new().compose("", Some(&path), Rgb::WHITE).unwrap().unwrap();
        assert_eq!(item.text, "GIF");
        assert!(item.is_video);
        assert_eq!(item.media.unwrap().frame_count(), 2);
    }

    #[test]
    fn oversized_gif_is_not_animated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.gif");
        write_gif(&path, &[[255, 0, 0, 255], [0, 0, 255, 255]]);
        let composer = Composer { max_animated_bytes: 8, ..Composer::default() };
        let item = composer.compose("", Some(&path), Rgb::WHITE).unwrap().unwrap();
        assert_eq!(item.text, "GIF");
        assert!(!item.is_video);
        assert_eq!(item.media.unwrap().frame_count(), 1);
    }

    #[test]
    fn single_frame_gif_falls_back_to_still() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.gif");
        write_gif(&path, &[[0, 255, 0, 255]]);
        let item = Composer::new().compose("caption", Some(&path), Rgb::WHITE).unwrap().unwrap();
        assert_eq!(item.text, "caption");
        assert!(!item.is_video);
        assert_eq!(item.media.unwrap().frame_count(), 1);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = Composer::new().compose("x", Some(&path), Rgb::WHITE).unwrap_err();
        assert!(matches!(err, ComposeError::Decode { .. }));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Composer::new()
            .compose("x", Some(Path::new("/no/such/file.png")), Rgb::WHITE)
            .unwrap_err();
        assert!(matches!(err, ComposeError::Io { .. }));
    }

    #[test]
    fn composer_thread_delivers_items() {
        let (tx, rx) = spawn_composer(Composer::new());
        tx.send(ComposeRequest { text: "".into(), media: None, color: Rgb::WHITE }).unwrap();
        tx.send(ComposeRequest { text: "queued".into(), media: None, color: Rgb::WHITE }).unwrap();
        drop(tx);
        let items: Vec<_> = rx.iter().collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "queued");
    }
}
