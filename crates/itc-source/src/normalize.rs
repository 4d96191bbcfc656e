use std::path::{Path, PathBuf};

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use itc_core::barrier::fan_out;
use itc_core::config::RunConfig;
use itc_core::error::{BoxError, PipelineError, Stage};
use itc_core::frame::{FrameBuffer, NormalizedFrame, RawFrame};
use itc_core::logger::RunLogger;

use crate::resize::{TargetSize, resize_frame};

/// Redimensionne chaque frame brute aux dimensions de sortie.
///
/// Each frame is first persisted as a PNG artifact in `frames_dir`, then
/// that artifact is read back, resized and re-persisted in `normalized_dir`.
#[derive(Debug, Clone)]
pub struct Normalizer {
    frames_dir: PathBuf,
    normalized_dir: PathBuf,
    width: u32,
    height: Option<u32>,
    cell_aspect: f32,
    log: RunLogger,
}

impl Normalizer {
    /// Build a normalizer for the configured output size.
    #[must_use]
    pub fn new(
        frames_dir: impl Into<PathBuf>,
        normalized_dir: impl Into<PathBuf>,
        config: &RunConfig,
        log: RunLogger,
    ) -> Self {
        Self {
            frames_dir: frames_dir.into(),
            normalized_dir: normalized_dir.into(),
            width: config.width,
            height: config.height,
            cell_aspect: config.cell_aspect,
            log,
        }
    }

    /// Output size for a `src_w`×`src_h` frame.
    #[must_use]
    pub fn target_for(&self, src_w: u32, src_h: u32) -> TargetSize {
        TargetSize::resolve(self.width, self.height, src_w, src_h, self.cell_aspect)
    }

    /// Normalize every frame concurrently; output order equals input order.
    ///
    /// # Errors
    /// The first [`PipelineError::Encode`] or [`PipelineError::Resize`].
    pub async fn normalize_all(
        &self,
        frames: Vec<RawFrame>,
    ) -> Result<Vec<NormalizedFrame>, PipelineError> {
        for dir in [&self.frames_dir, &self.normalized_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| PipelineError::Write {
                    stage: Stage::Normalize,
                    path: dir.clone(),
                    source,
                })?;
        }

        if self.height.is_none() {
            self.log.info(format!(
                "height unset, keeping aspect ratio at width {}",
                self.width
            ));
        }

        let normalized = fan_out(Stage::Normalize, frames, |_, frame| {
            let target = self.target_for(frame.buffer.width, frame.buffer.height);
            let name = format!("{:04}-{:04}.png", frame.asset_index, frame.frame_index);
            let encoded_path = self.frames_dir.join(&name);
            let resized_path = self.normalized_dir.join(&name);
            async move {
                encode_artifact(&frame, &encoded_path).await?;
                resize_artifact(&frame, &encoded_path, &resized_path, target).await
            }
        })
        .await?;

        self.log
            .success(format!("normalized {} frame(s)", normalized.len()));
        Ok(normalized)
    }
}

/// Persist the raw pixels as a PNG artifact.
async fn encode_artifact(frame: &RawFrame, path: &Path) -> Result<(), PipelineError> {
    let err = |source: BoxError| PipelineError::Encode {
        asset_index: frame.asset_index,
        frame_index: frame.frame_index,
        source,
    };
    let bytes = encode_png(&frame.buffer).map_err(|e| err(Box::new(e)))?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| err(Box::new(e)))
}

/// Read the artifact back, resize it and persist the result.
async fn resize_artifact(
    frame: &RawFrame,
    encoded_path: &Path,
    resized_path: &Path,
    target: TargetSize,
) -> Result<NormalizedFrame, PipelineError> {
    let err = |source: BoxError| PipelineError::Resize {
        asset_index: frame.asset_index,
        frame_index: frame.frame_index,
        source,
    };

    let bytes = tokio::fs::read(encoded_path)
        .await
        .map_err(|e| err(Box::new(e)))?;
    let source = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .map_err(|e| err(Box::new(e)))?
        .to_rgba8();
    let (w, h) = source.dimensions();
    let source = FrameBuffer {
        data: source.into_raw(),
        width: w,
        height: h,
    };

    let resized = resize_frame(&source, target.width, target.height).map_err(|e| err(e.into()))?;
    let png = encode_png(&resized).map_err(|e| err(Box::new(e)))?;
    tokio::fs::write(resized_path, png)
        .await
        .map_err(|e| err(Box::new(e)))?;

    Ok(NormalizedFrame {
        buffer: resized,
        asset_index: frame.asset_index,
        frame_index: frame.frame_index,
        artifact: resized_path.to_path_buf(),
    })
}

fn encode_png(buffer: &FrameBuffer) -> image::ImageResult<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(
        &buffer.data,
        buffer.width,
        buffer.height,
        ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}
