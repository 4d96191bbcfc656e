//! Configuration, types, and shared structures for image-to-console.
//!
//! This crate contains the data model flowing through the pipeline, the
//! error taxonomy, the run-scoped logger and the indexed fan-in barrier
//! shared by every stage.

pub mod barrier;
pub mod charset;
pub mod config;
pub mod error;
pub mod frame;
pub mod input;
pub mod logger;
pub mod traits;

pub use charset::LuminanceLut;
pub use config::{LoopCount, RunConfig};
pub use error::{PipelineError, Stage};
pub use frame::{FrameBuffer, NormalizedFrame, RawFrame, TextFrame};
pub use input::{InputKind, InputSpec, StagedAsset};
pub use logger::RunLogger;
pub use traits::{OutputSink, StopMode, TextArt};
