//! # palm_stage
//!
//! Hand-gesture interaction engine: turns per-frame hand landmarks into
//! debounced scene actions, plus a keyboard/mouse simulator and a software
//! visualizer to drive it without a camera.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Hands | Action |
//! |---|---|---|
//! | Open palm held 1 s | Closest hand | Spawn the next queued message as a card at the palm |
//! | Open palm | Any | Reveal every card's content while held |
//! | Pinch near an entity | Each hand | Grab it; it follows the index fingertip |
//! | Release over the corner zone | Each hand | Delete the grabbed entity |
//! | Release elsewhere / hand lost | Each hand | Drop it in place |
//! | Both hands pinching | Exactly two | Reserved; nothing moves |
//!
//! ## Pipeline
//!
//! ```text
//! FrameSource ──Frame──▶ InteractionController ──Vec<Command>──▶ SceneBridge ──▶ RenderEngine
//!                            │      ▲                                          └─▶ ZoneIndicator
//!                            ▼      │
//!                        Registry  MessageQueue ◀── Composer (own thread)
//! ```
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Gesture |
//! |---|---|
//! | mouse | index fingertip of the primary hand |
//! | `P` / hold | Pinch |
//! | `O` / hold | Open palm |
//! | `H` | Toggle a second (mirrored) hand |
//! | `2` / hold | Two-hand pinch |
//! | `N` | Spawn a shape under the pointer |
//! | `M` | Queue a demo message |
//! | `Q` | Quit |

pub mod animation;
pub mod app;
pub mod color;
pub mod command;
pub mod compose;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod gesture;
pub mod media;
pub mod queue;
pub mod registry;
pub mod scene;
pub mod visualizer;

pub use command::Command;
pub use config::StageConfig;
pub use controller::InteractionController;
