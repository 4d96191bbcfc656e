//! Input stages for image-to-console: resolve, acquire, decode, normalize.

pub mod acquire;
pub mod decode;
pub mod normalize;
pub mod resize;
pub mod resolve;

pub use acquire::Acquirer;
pub use decode::{Decoded, decode_all};
pub use normalize::Normalizer;
pub use resolve::resolve_inputs;
