use std::sync::Arc;

use image::ImageFormat;
use itc_core::barrier::fan_out;
use itc_core::error::{PipelineError, Stage};
use itc_core::frame::{FrameBuffer, NormalizedFrame, TextFrame};
use itc_core::logger::RunLogger;
use itc_core::traits::TextArt;

/// Fan-out du transform texte sur chaque frame normalisée.
///
/// Owns no algorithm: it reads each frame's encoded artifact, hands the
/// pixels to the [`TextArt`] implementation and puts every result back in
/// its slot, so the output mirrors the input order exactly.
#[derive(Clone)]
pub struct TextArtConverter {
    art: Arc<dyn TextArt>,
    log: RunLogger,
}

impl std::fmt::Debug for TextArtConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextArtConverter")
            .field("art", &self.art.name())
            .finish_non_exhaustive()
    }
}

impl TextArtConverter {
    /// Wrap a text-art transform.
    #[must_use]
    pub fn new(art: Arc<dyn TextArt>, log: RunLogger) -> Self {
        Self { art, log }
    }

    /// Convert every frame concurrently.
    ///
    /// # Errors
    /// The first [`PipelineError::TextArt`] raised for any frame.
    pub async fn convert_all(
        &self,
        frames: Vec<NormalizedFrame>,
    ) -> Result<Vec<TextFrame>, PipelineError> {
        let text = fan_out(Stage::Convert, frames, |position, frame| {
            let art = Arc::clone(&self.art);
            async move {
                let fail = |reason: String| PipelineError::TextArt { position, reason };
                let bytes = tokio::fs::read(&frame.artifact)
                    .await
                    .map_err(|e| fail(format!("{}: {e}", frame.artifact.display())))?;
                let pixels = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
                    .map_err(|e| fail(e.to_string()))?
                    .to_rgba8();
                let (width, height) = pixels.dimensions();
                let buffer = FrameBuffer {
                    data: pixels.into_raw(),
                    width,
                    height,
                };
                let text = art.convert(&buffer).map_err(fail)?;
                Ok(TextFrame {
                    text,
                    asset_index: frame.asset_index,
                    frame_index: frame.frame_index,
                })
            }
        })
        .await?;

        self.log.success(format!(
            "converted {} frame(s) with {}",
            text.len(),
            self.art.name()
        ));
        Ok(text)
    }
}
