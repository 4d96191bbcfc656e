//! Text-art stage for image-to-console.
//!
//! Converts normalized frames to character grids.
pub mod convert;
pub mod luminance;

pub use convert::TextArtConverter;
pub use luminance::LuminanceArt;
