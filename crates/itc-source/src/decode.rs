use std::io::Cursor;
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::{AnimationDecoder, Frames, ImageFormat, RgbaImage};
use itc_core::barrier::fan_out;
use itc_core::config::RunConfig;
use itc_core::error::{PipelineError, Stage};
use itc_core::frame::{FrameBuffer, RawFrame};
use itc_core::input::StagedAsset;
use itc_core::logger::RunLogger;

/// Résultat du décodage de tous les assets.
#[derive(Debug)]
pub struct Decoded {
    /// Frames flattened by (asset index, embedded frame index).
    pub frames: Vec<RawFrame>,
    /// Tick interval to use for playback.
    pub interval: Duration,
    /// Asset whose native delay set `interval`, if any.
    pub delay_source: Option<usize>,
}

/// Decode every staged asset concurrently and flatten the frames.
///
/// # Errors
/// The first [`PipelineError::Read`] or [`PipelineError::Decode`].
pub async fn decode_all(
    assets: Vec<StagedAsset>,
    config: &RunConfig,
    log: RunLogger,
) -> Result<Decoded, PipelineError> {
    let per_asset = fan_out(Stage::Decode, assets, |_, asset| async move {
        let bytes = tokio::fs::read(&asset.path)
            .await
            .map_err(|e| PipelineError::Read {
                origin: asset.path.display().to_string(),
                source: Box::new(e),
            })?;
        let frames = decode_bytes(&bytes, asset.index(), &asset.origin.token)?;
        log.info(format!(
            "decoded {} into {} frame(s)",
            asset.origin.token,
            frames.len()
        ));
        Ok(frames)
    })
    .await?;

    let (interval, delay_source) = playback_interval(config, &per_asset, log);
    let frames: Vec<RawFrame> = per_asset.into_iter().flatten().collect();
    log.success(format!("decoded {} frame(s)", frames.len()));
    Ok(Decoded {
        frames,
        interval,
        delay_source,
    })
}

/// Pick the tick interval.
///
/// Without an explicit speed, the first asset (in asset order) exposing a
/// native delay wins; every later delay is only logged.
#[must_use]
pub fn playback_interval(
    config: &RunConfig,
    per_asset: &[Vec<RawFrame>],
    log: RunLogger,
) -> (Duration, Option<usize>) {
    let mut chosen: Option<(Duration, usize)> = None;
    for frame in per_asset.iter().filter_map(|frames| frames.first()) {
        let Some(delay) = frame.delay else {
            continue;
        };
        let ms = delay.as_millis();
        if config.speed_explicit {
            log.info(format!(
                "asset {} native delay {ms} ms ignored, speed set to {} ms",
                frame.asset_index, config.speed_ms
            ));
        } else if chosen.is_none() {
            log.info(format!("using native delay {ms} ms from asset {}", frame.asset_index));
            chosen = Some((delay, frame.asset_index));
        } else {
            log.info(format!("asset {} native delay {ms} ms not applied", frame.asset_index));
        }
    }
    match chosen {
        Some((delay, source)) => (delay, Some(source)),
        None => (config.interval(), None),
    }
}

/// Decode one container into its frames.
///
/// GIF and animated PNG yield one frame per embedded frame; everything else
/// yields a single frame. Only embedded frame 0 carries a delay.
///
/// # Errors
/// [`PipelineError::Decode`] on malformed or unsupported bytes.
pub fn decode_bytes(
    bytes: &[u8],
    asset_index: usize,
    origin: &str,
) -> Result<Vec<RawFrame>, PipelineError> {
    let err = |e: image::ImageError| PipelineError::Decode {
        origin: origin.to_string(),
        source: Box::new(e),
    };

    let format = image::guess_format(bytes).map_err(err)?;
    let frames = match format {
        ImageFormat::Gif => {
            let decoder = GifDecoder::new(Cursor::new(bytes)).map_err(err)?;
            collect_frames(decoder.into_frames(), asset_index).map_err(err)?
        }
        ImageFormat::Png => {
            let decoder = PngDecoder::new(Cursor::new(bytes)).map_err(err)?;
            if decoder.is_apng().map_err(err)? {
                let apng = decoder.apng().map_err(err)?;
                collect_frames(apng.into_frames(), asset_index).map_err(err)?
            } else {
                let img = image::load_from_memory_with_format(bytes, format).map_err(err)?;
                vec![single(img.to_rgba8(), asset_index)]
            }
        }
        _ => {
            let img = image::load_from_memory_with_format(bytes, format).map_err(err)?;
            vec![single(img.to_rgba8(), asset_index)]
        }
    };

    if frames.is_empty() {
        return Err(PipelineError::Decode {
            origin: origin.to_string(),
            source: "container holds no frame".into(),
        });
    }
    Ok(frames)
}

fn single(rgba: RgbaImage, asset_index: usize) -> RawFrame {
    RawFrame {
        buffer: to_buffer(rgba),
        asset_index,
        frame_index: 0,
        delay: None,
    }
}

fn collect_frames(frames: Frames<'_>, asset_index: usize) -> image::ImageResult<Vec<RawFrame>> {
    let mut out = Vec::new();
    for (frame_index, frame) in frames.enumerate() {
        let frame = frame?;
        let delay = if frame_index == 0 {
            let (numer, denom) = frame.delay().numer_denom_ms();
            let micros = u64::from(numer) * 1000 / u64::from(denom.max(1));
            // 0 ms means "unspecified" in most encoders.
            (micros > 0).then(|| Duration::from_micros(micros))
        } else {
            None
        };
        out.push(RawFrame {
            buffer: to_buffer(frame.into_buffer()),
            asset_index,
            frame_index,
            delay,
        });
    }
    Ok(out)
}

fn to_buffer(rgba: RgbaImage) -> FrameBuffer {
    let (width, height) = rgba.dimensions();
    FrameBuffer {
        data: rgba.into_raw(),
        width,
        height,
    }
}
