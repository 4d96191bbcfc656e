use std::path::PathBuf;

use thiserror::Error;

/// Boxed source error carried by stage failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the pipeline stages.
///
/// Every stage is fail-fast: the first error aborts its barrier and is
/// returned as-is to the caller. Nothing is retried.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input list empty, or every glob matched nothing.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Why the inputs were rejected.
        reason: String,
    },

    /// Fetching a remote input or reading a local/staged file failed.
    #[error("Cannot read {origin}: {source}")]
    Read {
        /// Token or path that could not be read.
        origin: String,
        /// Underlying I/O or HTTP error.
        #[source]
        source: BoxError,
    },

    /// Writing to the staging area or to the output sink failed.
    #[error("Cannot write {}: {source}", path.display())]
    Write {
        /// Stage that was writing.
        stage: Stage,
        /// Destination path (empty for the terminal sink).
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Staged bytes are not a supported image container.
    #[error("Cannot decode {origin}: {source}")]
    Decode {
        /// Token of the asset that failed to decode.
        origin: String,
        /// Underlying decoder error.
        #[source]
        source: BoxError,
    },

    /// Persisting a frame as an encoded artifact failed.
    #[error("Cannot encode frame {asset_index}:{frame_index}: {source}")]
    Encode {
        /// Asset index of the frame.
        asset_index: usize,
        /// Embedded frame index within the asset.
        frame_index: usize,
        /// Underlying encoder error.
        #[source]
        source: BoxError,
    },

    /// Resizing an encoded artifact failed.
    #[error("Cannot resize frame {asset_index}:{frame_index}: {source}")]
    Resize {
        /// Asset index of the frame.
        asset_index: usize,
        /// Embedded frame index within the asset.
        frame_index: usize,
        /// Underlying resize error.
        #[source]
        source: BoxError,
    },

    /// The text-art transform rejected a frame.
    #[error("Text-art conversion failed for frame {position}: {reason}")]
    TextArt {
        /// Position in the flattened frame sequence.
        position: usize,
        /// Failure description.
        reason: String,
    },

    /// Purging the staging area failed. Reported, never fatal.
    #[error("Cleanup of {} failed: {source}", path.display())]
    Cleanup {
        /// Staging path that could not be removed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration value or unreadable configuration file.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A per-item task of a fan-out stage panicked or was cancelled.
    #[error("{stage} task aborted: {reason}")]
    Aborted {
        /// Stage whose task died.
        stage: Stage,
        /// Join failure description.
        reason: String,
    },
}

/// Pipeline stage, used to tag errors and log lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Glob expansion and ordering.
    Resolve,
    /// Fetch/copy into staging.
    Acquire,
    /// Container decoding.
    Decode,
    /// Rescale to output dimensions.
    Normalize,
    /// Character-grid conversion.
    Convert,
    /// Timed playback.
    Playback,
    /// Staging creation and purge.
    Lifecycle,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Resolve => "resolve",
            Self::Acquire => "acquire",
            Self::Decode => "decode",
            Self::Normalize => "normalize",
            Self::Convert => "convert",
            Self::Playback => "playback",
            Self::Lifecycle => "lifecycle",
        };
        f.write_str(name)
    }
}

impl PipelineError {
    /// Stage the error originates from.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::InvalidInput { .. } | Self::Config(_) => Stage::Resolve,
            Self::Read { .. } => Stage::Acquire,
            Self::Decode { .. } => Stage::Decode,
            Self::Encode { .. } | Self::Resize { .. } => Stage::Normalize,
            Self::TextArt { .. } => Stage::Convert,
            Self::Cleanup { .. } => Stage::Lifecycle,
            Self::Write { stage, .. } | Self::Aborted { stage, .. } => *stage,
        }
    }

    /// Shorthand for an [`PipelineError::InvalidInput`].
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_tags_follow_variant() {
        let err = PipelineError::invalid_input("no inputs");
        assert_eq!(err.stage(), Stage::Resolve);
        assert_eq!(err.to_string(), "Invalid input: no inputs");

        let err = PipelineError::Resize {
            asset_index: 1,
            frame_index: 2,
            source: "boom".into(),
        };
        assert_eq!(err.stage(), Stage::Normalize);
        assert_eq!(err.to_string(), "Cannot resize frame 1:2: boom");
    }

    #[test]
    fn aborted_keeps_its_stage() {
        let err = PipelineError::Aborted {
            stage: Stage::Decode,
            reason: "panic".into(),
        };
        assert_eq!(err.stage(), Stage::Decode);
        assert_eq!(err.to_string(), "decode task aborted: panic");
    }
}
