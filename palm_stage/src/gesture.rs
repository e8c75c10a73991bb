//! Frame sources: where hand-landmark frames come from.
//!
//! The public interface is [`Frame`] delivered over a `mpsc` channel.
//! Consumers don't need to know whether frames came from a recording or the
//! keyboard/mouse simulator.  A source signals the end of input by
//! dropping its sender.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use hand_landmarks::poses::{build_hand, HandPose};
use hand_landmarks::{Frame, LandmarkError, Timestamp, MAX_HANDS};
use tracing::{debug, info};

// ════════════════════════════════════════════════════════════════════════════
// FrameSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`Frame`]s over a channel.
pub trait FrameSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<Frame>);
}

/// Spawn a frame source on its own thread and return the receiving end.
pub fn spawn_frame_source<S: FrameSource>(source: S) -> Receiver<Frame> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimFrameSource — keyboard/mouse simulation
// ════════════════════════════════════════════════════════════════════════════

/// One sample of the simulator's virtual hands.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimSample {
    /// Normalized index-tip position of the primary hand; `None` when the
    /// pointer is outside the window (no hands tracked).
    pub pointer:        Option<(f32, f32)>,
    pub pinch:          bool,
    pub open_palm:      bool,
    pub second_hand:    bool,
    pub two_hand_pinch: bool,
    pub timestamp_ms:   Timestamp,
}

/// Raw input from the simulation window.
#[derive(Clone, Copy, Debug)]
pub enum SimInput {
    Sample(SimSample),
    Quit,
}

/// Frame source driven by [`SimInput`] events from the visualizer's window.
///
/// The visualizer samples mouse and keys each tick; this translator turns
/// the samples into synthetic 21-landmark hands.
pub struct SimFrameSource {
    pub rx: Receiver<SimInput>,
}

impl FrameSource for SimFrameSource {
    fn run(self: Box<Self>, tx: Sender<Frame>) {
        for input in self.rx {
            match input {
                SimInput::Sample(sample) => {
                    if tx.send(frame_for(&sample)).is_err() {
                        return;
                    }
                }
                SimInput::Quit => {
                    debug!("simulator quit");
                    return;
                }
            }
        }
    }
}

/// Depth of the simulated second hand; behind the primary one.
const SECOND_HAND_Z: f32 = 0.05;

/// Synthetic frame for one simulator sample.
///
/// The primary hand's index tip sits at the pointer.  The second hand, when
/// present, mirrors it horizontally and sits slightly farther away so the
/// primary hand stays the palm-hold candidate.
pub fn frame_for(sample: &SimSample) -> Frame {
    let Some((x, y)) = sample.pointer else {
        return Frame::empty(sample.timestamp_ms);
    };
    let primary = if sample.two_hand_pinch || sample.pinch {
        HandPose::Pinch
    } else if sample.open_palm {
        HandPose::OpenPalm
    } else {
        HandPose::Relaxed
    };
    let mut hands = vec![build_hand(primary, x, y, 0.0)];
    if sample.two_hand_pinch || sample.second_hand {
        let pose = if sample.two_hand_pinch { HandPose::Pinch } else { HandPose::Relaxed };
        hands.push(build_hand(pose, 1.0 - x, y, SECOND_HAND_Z));
    }
    Frame { timestamp_ms: sample.timestamp_ms, hands }
}

// ════════════════════════════════════════════════════════════════════════════
// ReplayFrameSource — recorded frames from a RON file
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("cannot read recording: {0}")]
    Io(#[from] std::io::Error),
    #[error("recording parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("recording frame {index}: {source}")]
    Frame { index: usize, source: LandmarkError },
    #[error("recording frame {index} goes back in time ({ts} < {prev})")]
    OutOfOrder { index: usize, ts: Timestamp, prev: Timestamp },
}

/// Replays a recorded `[Frame]` list, optionally paced by its timestamps.
pub struct ReplayFrameSource {
    frames: Vec<Frame>,
    paced:  bool,
}

impl ReplayFrameSource {
    pub fn load<P: AsRef<Path>>(path: P, paced: bool) -> Result<Self, ReplayError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text, paced)
    }

    pub fn from_ron_str(text: &str, paced: bool) -> Result<Self, ReplayError> {
        let frames: Vec<Frame> = ron::from_str(text)?;
        let mut prev = 0;
        for (index, f) in frames.iter().enumerate() {
            if f.hands.len() > MAX_HANDS {
                let source = LandmarkError::TooManyHands(f.hands.len());
                return Err(ReplayError::Frame { index, source });
            }
            if f.timestamp_ms < prev {
                return Err(ReplayError::OutOfOrder { index, ts: f.timestamp_ms, prev });
            }
            prev = f.timestamp_ms;
        }
        Ok(ReplayFrameSource { frames, paced })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl FrameSource for ReplayFrameSource {
    fn run(self: Box<Self>, tx: Sender<Frame>) {
        let ReplayFrameSource { frames, paced } = *self;
        info!(frames = frames.len(), "replaying recording");
        let mut prev: Option<Timestamp> = None;
        for frame in frames {
            if paced {
                if let Some(p) = prev {
                    thread::sleep(Duration::from_millis(frame.timestamp_ms - p));
                }
                prev = Some(frame.timestamp_ms);
            }
            if tx.send(frame).is_err() {
                return;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_landmarks::{is_open_palm_facing_camera, is_pinch};

    fn sample(pointer: Option<(f32, f32)>) -> SimSample {
        SimSample { pointer, timestamp_ms: 42, ..SimSample::default() }
    }

    #[test]
    fn no_pointer_no_hands() {
        let f = frame_for(&sample(None));
        assert!(f.is_empty());
        assert_eq!(f.timestamp_ms, 42);
    }

    #[test]
    fn pointer_is_index_tip() {
        let f = frame_for(&sample(Some((0.3, 0.6))));
        assert_eq!(f.hands.len(), 1);
        let tip = f.hands[0].index_tip();
        assert!((tip.x - 0.3).abs() < 1e-6 && (tip.y - 0.6).abs() < 1e-6);
        assert!(!is_pinch(&f.hands[0]));
        assert!(!is_open_palm_facing_camera(&f.hands[0]));
    }

    #[test]
    fn keys_select_pose() {
        let mut s = sample(Some((0.5, 0.5)));
        s.pinch = true;
        assert!(is_pinch(&frame_for(&s).hands[0]));
        s.pinch = false;
        s.open_palm = true;
        assert!(is_open_palm_facing_camera(&frame_for(&s).hands[0]));
    }

    #[test]
    fn second_hand_is_mirrored_and_behind() {
        let mut s = sample(Some((0.2, 0.5)));
        s.second_hand = true;
        s.open_palm = true;
        let f = frame_for(&s);
        assert_eq!(f.hands.len(), 2);
        assert!((f.hands[1].index_tip().x - 0.8).abs() < 1e-6);
        assert!(std::ptr::eq(f.primary_hand().unwrap(), &f.hands[0]));
    }

    #[test]
    fn two_hand_pinch_pinches_both() {
        let mut s = sample(Some((0.4, 0.5)));
        s.two_hand_pinch = true;
        let f = frame_for(&s);
        assert_eq!(f.hands.len(), 2);
        assert!(f.hands.iter().all(is_pinch));
    }

    #[test]
    fn sim_source_forwards_until_quit() {
        let (sim_tx, sim_rx) = mpsc::channel();
        let frames = spawn_frame_source(SimFrameSource { rx: sim_rx });
        sim_tx.send(SimInput::Sample(sample(None))).unwrap();
        sim_tx.send(SimInput::Sample(sample(Some((0.5, 0.5))))).unwrap();
        sim_tx.send(SimInput::Quit).unwrap();
        let got: Vec<Frame> = frames.iter().collect();
        assert_eq!(got.len(), 2);
        assert_eq!(got[1].hands.len(), 1);
    }

    #[test]
    fn replay_round_trips_recorded_frames() {
        let recorded = vec![
            frame_for(&SimSample { pointer: Some((0.5, 0.5)), timestamp_ms: 0, ..SimSample::default() }),
            Frame::empty(16),
        ];
        let text = ron::to_string(&recorded).unwrap();
        let replay = ReplayFrameSource::from_ron_str(&text, false).unwrap();
        let rx = spawn_frame_source(replay);
        let got: Vec<Frame> = rx.iter().collect();
        assert_eq!(got, recorded);
    }

    #[test]
    fn replay_rejects_time_travel() {
        let text = ron::to_string(&vec![Frame::empty(20), Frame::empty(10)]).unwrap();
        assert!(matches!(
            ReplayFrameSource::from_ron_str(&text, false),
            Err(ReplayError::OutOfOrder { index: 1, .. })
        ));
    }

    #[test]
    fn replay_rejects_three_hands() {
        let hand = build_hand(HandPose::Relaxed, 0.5, 0.5, 0.0);
        let bad = Frame { timestamp_ms: 0, hands: vec![hand.clone(), hand.clone(), hand] };
        let text = ron::to_string(&vec![bad]).unwrap();
        assert!(matches!(
            ReplayFrameSource::from_ron_str(&text, false),
            Err(ReplayError::Frame { index: 0, source: LandmarkError::TooManyHands(3) })
        ));
    }
}
