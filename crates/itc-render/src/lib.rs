//! Terminal playback for image-to-console.
//!
//! [`playback`] holds the cursor/loop state machine and the timer-driven
//! controller; [`terminal`] redraws frames in place with crossterm.

pub mod playback;
pub mod terminal;

pub use playback::{AnimationController, Playback, PlaybackReport, Step, StopReason};
pub use terminal::TerminalSink;
