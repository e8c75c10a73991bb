//! Top-level application loop.
//!
//! `AppState` owns the interaction controller, the in-memory scene, and the
//! zone lamp.  It feeds frames to the controller, replays the resulting
//! commands onto the scene, and drives the visualizer each tick.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Instant;

use hand_landmarks::{map_normalized_to_world, Frame, Timestamp, Vec3};
use tracing::{debug, info, warn};

use crate::color::Rgb;
use crate::command::Command;
use crate::compose::{spawn_composer, ComposeRequest, Composer};
use crate::config::{ConfigError, StageConfig};
use crate::controller::InteractionController;
use crate::debounce::HoldOutcome;
use crate::gesture::{spawn_frame_source, ReplayError, ReplayFrameSource, SimFrameSource, SimInput};
use crate::queue::QueueItem;
use crate::registry::EntityKind;
use crate::scene::{NodeHandle, Scene, SceneBridge, ZoneLamp};
use crate::visualizer::{HostAction, StatusLine, Visualizer};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error("cannot open window: {0}")]
    Window(String),
}

/// Messages cycled through by the "enqueue demo message" key.
pub const DEMO_MESSAGES: [&str; 4] = [
    "Hi ! (^-^)/",
    "Pinch to grab",
    "Drop me in the corner",
    "Open palm to read",
];

// ════════════════════════════════════════════════════════════════════════════
// RunOptions
// ════════════════════════════════════════════════════════════════════════════

/// Everything `run` needs besides the stage config.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    pub config:   StageConfig,
    /// Text messages queued before the first frame.
    pub messages: Vec<String>,
    /// Image/GIF files queued before the first frame.
    pub media:    Vec<PathBuf>,
    /// Color for messages queued from the command line.
    pub color:    Option<Rgb>,
    /// Spawn a ring of shapes and queue the demo messages.
    pub quick:    bool,
    /// Recorded frames to play instead of the simulator.
    pub replay:   Option<PathBuf>,
    /// With `replay`: run without a window and log a summary.
    pub headless: bool,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

/// Counters reported at the end of a headless run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub frames:          usize,
    pub cards_spawned:   usize,
    pub shapes_spawned:  usize,
    pub deleted:         usize,
    pub render_failures: usize,
    pub entities_left:   usize,
    pub queue_left:      usize,
}

/// Maps the host clock onto the timeline of the frames being handled.
///
/// Animations are stamped with frame timestamps, which need not share an
/// origin with the host clock (recordings can start at any offset).  The
/// first frame seen anchors the two timelines together.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameClock {
    /// (frame timestamp, host time) of the first frame.
    anchor: Option<(Timestamp, Timestamp)>,
}

impl FrameClock {
    pub fn observe(&mut self, frame_ts: Timestamp, host_now: Timestamp) {
        if self.anchor.is_none() {
            self.anchor = Some((frame_ts, host_now));
        }
    }

    /// Host time expressed on the frame timeline.
    pub fn now(&self, host_now: Timestamp) -> Timestamp {
        match self.anchor {
            Some((frame_ts, host)) => frame_ts + host_now.saturating_sub(host),
            None => host_now,
        }
    }
}

pub struct AppState {
    controller: InteractionController,
    scene:      Scene,
    lamp:       ZoneLamp,
    bridge:     SceneBridge<NodeHandle>,
    last_frame: Option<Frame>,
    clock:      FrameClock,
    demo_index: usize,
    summary:    Summary,
    pub status: String,
}

impl AppState {
    pub fn new(config: StageConfig) -> Self {
        let scene = Scene::new(config.shapes.rotation_step);
        AppState {
            controller: InteractionController::new(config),
            scene,
            lamp:       ZoneLamp::default(),
            bridge:     SceneBridge::new(),
            last_frame: None,
            clock:      FrameClock::default(),
            demo_index: 0,
            summary:    Summary::default(),
            status:     "Ready - press M to queue a message, N to spawn a shape".to_string(),
        }
    }

    // ── input ────────────────────────────────────────────────────────────

    pub fn handle_frame(&mut self, frame: Frame) {
        let cmds = self.controller.process_frame(&frame);
        self.apply(cmds);
        self.summary.frames += 1;
        self.status = self.describe();
        self.last_frame = Some(frame);
    }

    /// Handle a frame that arrived at `host_now` on the host clock.
    pub fn receive_frame(&mut self, frame: Frame, host_now: Timestamp) {
        self.clock.observe(frame.timestamp_ms, host_now);
        self.handle_frame(frame);
    }

    pub fn enqueue(&mut self, item: QueueItem) {
        self.controller.enqueue(item);
    }

    pub fn spawn_shape_at(&mut self, position: Vec3) {
        let (_, cmds) = self.controller.spawn_shape(position);
        self.apply(cmds);
    }

    /// Next demo message, cycling.
    pub fn next_demo_message(&mut self) -> &'static str {
        let text = DEMO_MESSAGES[self.demo_index % DEMO_MESSAGES.len()];
        self.demo_index += 1;
        text
    }

    /// Handle a window action; returns `false` to stop the loop.
    pub fn handle_action(&mut self, action: HostAction, compose_tx: &Sender<ComposeRequest>, color: Rgb) -> bool {
        match action {
            HostAction::Quit => return false,
            HostAction::SpawnShape(x, y) => self.spawn_shape_at(map_normalized_to_world(x, y)),
            HostAction::EnqueueDemo => {
                let text = self.next_demo_message().to_string();
                if compose_tx.send(ComposeRequest { text, media: None, color }).is_err() {
                    warn!("composer thread is gone");
                }
            }
        }
        true
    }

    fn apply(&mut self, cmds: Vec<Command>) {
        for cmd in &cmds {
            match cmd {
                Command::Spawn { kind: EntityKind::MessageCard(_), .. } => self.summary.cards_spawned += 1,
                Command::Spawn { kind: EntityKind::Shape(_), .. } => self.summary.shapes_spawned += 1,
                Command::Remove { .. } => self.summary.deleted += 1,
                _ => {}
            }
        }
        self.summary.render_failures += self.bridge.apply(&mut self.scene, &mut self.lamp, cmds);
    }

    fn describe(&self) -> String {
        let state = self.controller.state();
        if let Some(p) = state.two_hand_pinch {
            let close = if p.indexes_close { "  tips close" } else { "" };
            return format!("two-hand pinch  span {:.2}{}", p.span, close);
        }
        if let Some(id) = self.controller.registry().selected() {
            let zone = if state.zone_active { "  release to delete" } else { "" };
            return format!("dragging {}{}", id, zone);
        }
        match state.last_hold {
            HoldOutcome::Holding { elapsed } => format!("open palm held {} ms", elapsed),
            HoldOutcome::CoolingDown => "open palm  cooling down".to_string(),
            HoldOutcome::Armed => "open palm  queue empty".to_string(),
            HoldOutcome::Fire => "card spawned".to_string(),
            HoldOutcome::Idle => format!("{} entities", self.controller.registry().len()),
        }
    }

    // ── per-frame tick ───────────────────────────────────────────────────

    pub fn tick(&mut self, now: Timestamp) {
        self.scene.tick(now);
    }

    /// Tick on the host clock, translated onto the frame timeline and never
    /// behind the last frame handled.
    pub fn tick_host(&mut self, host_now: Timestamp) {
        let last = self.last_frame.as_ref().map_or(0, |f| f.timestamp_ms);
        self.tick(self.clock.now(host_now).max(last));
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn controller(&self) -> &InteractionController { &self.controller }
    pub fn scene(&self)      -> &Scene                 { &self.scene }
    pub fn lamp(&self)       -> &ZoneLamp              { &self.lamp }
    pub fn last_frame(&self) -> Option<&Frame>         { self.last_frame.as_ref() }

    pub fn summary(&self) -> Summary {
        Summary {
            entities_left: self.controller.registry().len(),
            queue_left:    self.controller.queue().len(),
            ..self.summary
        }
    }
}

/// Ring of shapes around the origin for `--quick`.
fn seed_shapes(app: &mut AppState) {
    for i in 0..5 {
        let a = i as f32 / 5.0 * std::f32::consts::TAU;
        app.spawn_shape_at(Vec3::new(3.0 * a.cos(), 2.0 * a.sin(), 0.0));
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Headless replay
// ════════════════════════════════════════════════════════════════════════════

/// Feed recorded frames straight through the controller, no window.
pub fn run_headless(opts: &RunOptions, frames: Vec<Frame>) -> Summary {
    let mut app = AppState::new(opts.config.clone());
    let composer = Composer::default();
    let color = opts.color.unwrap_or(composer.default_color);
    if opts.quick {
        seed_shapes(&mut app);
    }
    for text in startup_messages(opts) {
        match composer.compose(&text, None, color) {
            Ok(Some(item)) => app.enqueue(item),
            Ok(None) => {}
            Err(err) => warn!(%err, "startup message dropped"),
        }
    }
    for path in &opts.media {
        match composer.compose("", Some(path), color) {
            Ok(Some(item)) => app.enqueue(item),
            Ok(None) => {}
            Err(err) => warn!(%err, "startup media dropped"),
        }
    }
    for frame in frames {
        let ts = frame.timestamp_ms;
        app.handle_frame(frame);
        app.tick(ts);
    }
    app.summary()
}

fn startup_messages(opts: &RunOptions) -> Vec<String> {
    let mut out = opts.messages.clone();
    if opts.quick {
        out.extend(DEMO_MESSAGES.iter().map(|s| s.to_string()));
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// This is the entry point called from `main.rs`.  It creates the composer
/// thread, the frame source (simulation by default, a recording with
/// `--replay`), the visualizer, and drives the frame/render loop at ~60 fps.
pub fn run(opts: RunOptions) -> Result<(), AppError> {
    opts.config.validate()?;

    if let (Some(path), true) = (&opts.replay, opts.headless) {
        let frames = ReplayFrameSource::load(path, false)?.into_frames();
        let s = run_headless(&opts, frames);
        info!(
            frames = s.frames,
            cards = s.cards_spawned,
            deleted = s.deleted,
            entities = s.entities_left,
            queued = s.queue_left,
            render_failures = s.render_failures,
            "replay finished"
        );
        return Ok(());
    }

    // ── Composer thread ───────────────────────────────────────────────────
    let composer = Composer::default();
    let color = opts.color.unwrap_or(composer.default_color);
    let (compose_tx, composed_rx) = spawn_composer(composer);
    for text in startup_messages(&opts) {
        let _ = compose_tx.send(ComposeRequest { text, media: None, color });
    }
    for path in &opts.media {
        let _ = compose_tx.send(ComposeRequest { text: String::new(), media: Some(path.clone()), color });
    }

    // ── Frame source ──────────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    let frame_rx = match &opts.replay {
        Some(path) => spawn_frame_source(ReplayFrameSource::load(path, true)?),
        None => spawn_frame_source(SimFrameSource { rx: sim_rx }),
    };

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(&opts.config, sim_tx).map_err(|e| AppError::Window(e.to_string()))?;

    // ── App state ─────────────────────────────────────────────────────────
    let mut app = AppState::new(opts.config.clone());
    if opts.quick {
        seed_shapes(&mut app);
    }
    let clock = Instant::now();

    // ── Main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        let now = clock.elapsed().as_millis() as Timestamp;

        // 1. Poll window input → sim samples + one-shot actions
        for action in vis.poll_input(now) {
            if !app.handle_action(action, &compose_tx, color) {
                return Ok(());
            }
        }

        // 2. Drain composed items
        drain_composed(&composed_rx, &mut app);

        // 3. Drain frames
        loop {
            match frame_rx.try_recv() {
                Ok(frame) => app.receive_frame(frame, now),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if opts.replay.is_none() {
                        return Ok(());
                    }
                    break;
                }
            }
        }

        // 4. Per-frame animation
        app.tick_host(now);

        // 5. Render
        let queued = app.controller().queue().len();
        vis.render(app.scene(), app.lamp(), app.last_frame(), &StatusLine { text: &app.status, queued });
    }

    Ok(())
}

fn drain_composed(rx: &Receiver<QueueItem>, app: &mut AppState) {
    while let Ok(item) = rx.try_recv() {
        debug!(text = %item.text, video = item.is_video, "composed item arrived");
        app.enqueue(item);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_landmarks::poses::{build_hand, HandPose};

    fn make_app() -> AppState {
        let mut cfg = StageConfig::default();
        cfg.shapes.seed = Some(3);
        AppState::new(cfg)
    }

    fn open(ts: Timestamp) -> Frame {
        Frame::new(ts, vec![build_hand(HandPose::OpenPalm, 0.5, 0.5, 0.0)]).unwrap()
    }

    #[test]
    fn spawned_card_reaches_scene() {
        let mut app = make_app();
        app.enqueue(QueueItem::text("hello", Rgb::WHITE));
        app.handle_frame(open(0));
        app.handle_frame(open(1000));
        assert_eq!(app.scene().len(), 1);
        let node = app.scene().nodes().next().unwrap();
        assert_eq!(node.animations.len(), 3);
        assert!(node.palm_open);
        assert_eq!(app.summary().cards_spawned, 1);
    }

    #[test]
    fn scale_in_completes_after_tick() {
        let mut app = make_app();
        app.enqueue(QueueItem::text("hello", Rgb::WHITE));
        app.handle_frame(open(0));
        app.handle_frame(open(1000));
        app.tick(1000);
        assert!((app.scene().nodes().next().unwrap().animated.scale - 0.01).abs() < 1e-6);
        app.tick(1180);
        assert_eq!(app.scene().nodes().next().unwrap().animated.scale, 1.0);
    }

    #[test]
    fn frame_clock_anchors_on_first_frame() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.now(700), 700);
        clock.observe(120_000, 5_000);
        clock.observe(121_000, 6_000);
        assert_eq!(clock.now(5_000), 120_000);
        assert_eq!(clock.now(6_250), 121_250);
        assert_eq!(clock.now(4_000), 120_000);
    }

    #[test]
    fn recording_offset_animates_on_host_ticks() {
        // Recording starts two minutes in; the host clock starts near zero.
        let mut app = make_app();
        app.enqueue(QueueItem::text("hello", Rgb::WHITE));
        app.receive_frame(open(120_000), 5_000);
        app.receive_frame(open(121_000), 6_000);
        assert_eq!(app.scene().len(), 1);

        app.tick_host(6_090);
        let mid = app.scene().nodes().next().unwrap().animated;
        assert!((mid.scale - 0.505).abs() < 1e-3, "scale {}", mid.scale);
        assert!((mid.text_alpha - 0.3).abs() < 1e-3, "alpha {}", mid.text_alpha);

        app.tick_host(6_300);
        let done = app.scene().nodes().next().unwrap().animated;
        assert!((done.scale - 1.0).abs() < 1e-6);
        assert!((done.text_alpha - 1.0).abs() < 1e-6);
    }

    #[test]
    fn host_tick_never_runs_behind_last_frame() {
        let mut app = make_app();
        app.enqueue(QueueItem::text("hello", Rgb::WHITE));
        app.receive_frame(open(50_000), 1_000);
        // Paced replay delivered this frame late on the host clock.
        app.receive_frame(open(51_180), 1_100);
        app.tick_host(1_100);
        let node = app.scene().nodes().next().unwrap();
        assert!((node.animated.scale - 0.01).abs() < 1e-6);
    }

    #[test]
    fn status_shows_two_hand_pinch() {
        let mut app = make_app();
        let hands = vec![
            build_hand(HandPose::Pinch, 0.45, 0.5, 0.0),
            build_hand(HandPose::Pinch, 0.55, 0.5, 0.05),
        ];
        app.handle_frame(Frame::new(0, hands).unwrap());
        assert_eq!(app.status, "two-hand pinch  span 0.10  tips close");
    }

    #[test]
    fn status_reports_hold_progress() {
        let mut app = make_app();
        app.handle_frame(open(0));
        app.handle_frame(open(400));
        assert_eq!(app.status, "open palm held 400 ms");
        app.handle_frame(open(1200));
        assert_eq!(app.status, "open palm  queue empty");
    }

    #[test]
    fn demo_messages_cycle() {
        let mut app = make_app();
        let first: Vec<_> = (0..DEMO_MESSAGES.len()).map(|_| app.next_demo_message()).collect();
        assert_eq!(first, DEMO_MESSAGES);
        assert_eq!(app.next_demo_message(), DEMO_MESSAGES[0]);
    }

    #[test]
    fn quit_action_stops_loop() {
        let mut app = make_app();
        let (tx, _rx) = mpsc::channel();
        assert!(!app.handle_action(HostAction::Quit, &tx, Rgb::WHITE));
        assert!(app.handle_action(HostAction::SpawnShape(0.5, 0.5), &tx, Rgb::WHITE));
        assert_eq!(app.scene().len(), 1);
    }

    #[test]
    fn headless_quick_run_counts() {
        let opts = RunOptions { quick: true, ..RunOptions::default() };
        let frames: Vec<Frame> = (0..=10).map(|i| open(i * 100)).collect();
        let s = run_headless(&opts, frames);
        assert_eq!(s.frames, 11);
        assert_eq!(s.shapes_spawned, 5);
        assert_eq!(s.cards_spawned, 1);
        assert_eq!(s.queue_left, DEMO_MESSAGES.len() - 1);
        assert_eq!(s.entities_left, 6);
        assert_eq!(s.render_failures, 0);
    }
}
