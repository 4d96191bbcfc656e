use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use itc_ascii::{LuminanceArt, TextArtConverter};
use itc_core::config::RunConfig;
use itc_core::error::PipelineError;
use itc_core::frame::TextFrame;
use itc_core::logger::RunLogger;
use itc_core::traits::{OutputSink, StopMode};
use itc_render::{AnimationController, PlaybackReport};
use itc_source::{Acquirer, Normalizer, decode_all, resolve_inputs};

use crate::lifecycle::{CleanupOutcome, RunArea, Staging};

/// Bilan d'un run complet.
#[derive(Debug)]
pub struct RunReport {
    /// Text frames produced.
    pub frames: usize,
    /// Effective tick interval.
    pub interval: Duration,
    /// Asset whose native delay set the interval, if any.
    pub delay_source: Option<usize>,
    /// What playback did.
    pub playback: PlaybackReport,
    /// Post-run purge.
    pub cleanup: CleanupOutcome,
}

/// Frames ready for playback plus their timing.
struct Produced {
    frames: Vec<TextFrame>,
    interval: Duration,
    delay_source: Option<usize>,
}

/// Pipeline construit, pas encore exécuté.
///
/// Building validates the inputs and freezes the configuration; nothing
/// touches the disk or the network until [`Pipeline::run`] or
/// [`Pipeline::frames`] is awaited.
#[derive(Debug)]
pub struct Pipeline {
    inputs: Vec<String>,
    config: RunConfig,
    staging: Staging,
    log: RunLogger,
}

impl Pipeline {
    /// Validate `inputs` and capture the run configuration.
    ///
    /// # Errors
    /// [`PipelineError::InvalidInput`] when `inputs` is empty.
    pub fn build(
        inputs: Vec<String>,
        config: RunConfig,
        log: RunLogger,
    ) -> Result<Self, PipelineError> {
        if inputs.is_empty() {
            return Err(PipelineError::invalid_input("no image path or URL given"));
        }
        Ok(Self {
            inputs,
            staging: Staging::new(&config.staging_root),
            config,
            log,
        })
    }

    /// Run every stage up to conversion, skip playback.
    ///
    /// # Errors
    /// The first stage failure.
    pub async fn frames(self) -> Result<Vec<TextFrame>, PipelineError> {
        let area = self.staging.prepare().await?;
        let produced = self.produce(&area).await;
        self.purge(&area, produced.is_ok()).await;
        Ok(produced?.frames)
    }

    /// Run the whole pipeline and play the result on `sink`.
    ///
    /// `stop` ends an animation early (Ctrl-C in the binary).
    ///
    /// # Errors
    /// The first stage failure, or a sink write failure during playback.
    pub async fn run<S, F>(self, sink: &mut S, stop: F) -> Result<RunReport, PipelineError>
    where
        S: OutputSink + ?Sized,
        F: Future<Output = ()>,
    {
        let area = self.staging.prepare().await?;
        let played = match self.produce(&area).await {
            Ok(produced) => self.play(produced, sink, stop).await,
            Err(e) => Err(e),
        };
        let cleanup = self.purge(&area, played.is_ok()).await;
        let (produced, playback) = played?;
        Ok(RunReport {
            frames: produced.frames.len(),
            interval: produced.interval,
            delay_source: produced.delay_source,
            playback,
            cleanup,
        })
    }

    async fn produce(&self, area: &RunArea) -> Result<Produced, PipelineError> {
        let log = self.log;
        let specs = resolve_inputs(&self.inputs, log)?;
        log.success(format!("resolved {} input(s)", specs.len()));

        let acquirer = Acquirer::new(
            &area.staged,
            Duration::from_secs(self.config.fetch_timeout_secs),
            log,
        )?;
        let staged = acquirer.acquire_all(specs).await?;

        let decoded = decode_all(staged, &self.config, log).await?;

        let normalizer = Normalizer::new(
            &area.frames,
            &area.normalized,
            &self.config,
            log,
        );
        let normalized = normalizer.normalize_all(decoded.frames).await?;

        let art = Arc::new(LuminanceArt::new(&self.config.charset));
        let frames = TextArtConverter::new(art, log)
            .convert_all(normalized)
            .await?;

        Ok(Produced {
            frames,
            interval: decoded.interval,
            delay_source: decoded.delay_source,
        })
    }

    async fn play<S, F>(
        &self,
        produced: Produced,
        sink: &mut S,
        stop: F,
    ) -> Result<(Produced, PlaybackReport), PipelineError>
    where
        S: OutputSink + ?Sized,
        F: Future<Output = ()>,
    {
        let stop_mode = if self.config.clear_on_stop {
            StopMode::Clear
        } else {
            StopMode::Finalize
        };
        let report = AnimationController::new(produced.interval, stop_mode, self.log)
            .play(&produced.frames, &self.config, sink, stop)
            .await?;
        Ok((produced, report))
    }

    /// Purge the run directory when enabled. Failures are logged, never returned.
    async fn purge(&self, area: &RunArea, succeeded: bool) -> CleanupOutcome {
        match area.purge(self.config.cleanup).await {
            Ok(CleanupOutcome::NotPerformed) => {
                if succeeded {
                    self.log
                        .info(format!("staging kept at {}", area.dir.display()));
                }
                CleanupOutcome::NotPerformed
            }
            Ok(outcome) => {
                self.log.info(format!("removed {}", area.dir.display()));
                outcome
            }
            Err(e) => {
                self.log.error(format!("{} failed: {e}", e.stage()));
                CleanupOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use image::codecs::gif::{GifEncoder, Repeat};
    use image::{Delay, Frame, ImageFormat, Rgba, RgbaImage};
    use itc_core::config::LoopCount;
    use itc_core::error::Stage;
    use itc_render::StopReason;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        drawn: Vec<String>,
    }

    impl OutputSink for Recorder {
        fn draw(&mut self, frame: &str) -> std::io::Result<()> {
            self.drawn.push(frame.to_string());
            Ok(())
        }

        fn finish(&mut self, _: StopMode) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn write_png(path: &Path, w: u32, h: u32, shade: u8) {
        RgbaImage::from_pixel(w, h, Rgba([shade, shade, shade, 255]))
            .save_with_format(path, ImageFormat::Png)
            .unwrap();
    }

    fn write_gif(path: &Path, w: u32, h: u32, shades: &[u8], delay_ms: u32) {
        let mut out = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut out);
            encoder.set_repeat(Repeat::Infinite).unwrap();
            for &shade in shades {
                let img = RgbaImage::from_pixel(w, h, Rgba([shade, shade, shade, 255]));
                let frame = Frame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1));
                encoder.encode_frame(frame).unwrap();
            }
        }
        std::fs::write(path, out).unwrap();
    }

    fn config(staging: &Path) -> RunConfig {
        RunConfig {
            width: 4,
            height: Some(1),
            // Anything from 170 up renders dense.
            charset: "  @@".to_string(),
            staging_root: staging.to_path_buf(),
            ..RunConfig::default()
        }
    }

    fn arg(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn empty_input_is_rejected_at_build() {
        let err = Pipeline::build(Vec::new(), RunConfig::default(), RunLogger::default()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput { .. }));
    }

    #[test]
    fn build_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("never");
        let pipeline =
            Pipeline::build(vec!["x.png".into()], config(&root), RunLogger::default()).unwrap();
        assert!(format!("{pipeline:#?}").contains("x.png"));
        assert!(!root.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn four_frames_two_loops_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = dir.path().join("in");
        std::fs::create_dir_all(&inputs).unwrap();
        // 0 and 1 are stills, 2 is a two-frame GIF: dark, light.
        write_png(&inputs.join("a.png"), 8, 2, 0);
        write_png(&inputs.join("b.png"), 8, 2, 255);
        write_gif(&inputs.join("c.gif"), 8, 2, &[0, 255], 0);

        let mut config = config(&dir.path().join("staging"));
        config.cycle = true;
        config.loop_count = Some(LoopCount::Times(2));
        config.set_speed(100);

        let tokens = vec![
            arg(&inputs.join("a.png")),
            arg(&inputs.join("b.png")),
            arg(&inputs.join("c.gif")),
        ];
        let mut sink = Recorder::default();
        let report = Pipeline::build(tokens, config, RunLogger::default())
            .unwrap()
            .run(&mut sink, std::future::pending())
            .await
            .unwrap();

        assert_eq!(report.frames, 4);
        assert_eq!(report.interval, Duration::from_millis(100));
        assert_eq!(report.playback.ticks, 8);
        assert_eq!(report.playback.stopped_by, StopReason::LoopsDone);
        assert_eq!(report.cleanup, CleanupOutcome::NotPerformed);
        let cycle = ["    ", "@@@@", "    ", "@@@@"];
        let expected: Vec<_> = cycle.iter().chain(cycle.iter()).copied().collect();
        assert_eq!(sink.drawn, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn native_gif_delay_sets_interval_and_cleanup_purges() {
        let dir = tempfile::tempdir().unwrap();
        let gif = dir.path().join("anim.gif");
        write_gif(&gif, 4, 4, &[0, 128, 255], 60);
        let staging = dir.path().join("staging");

        let mut config = config(&staging);
        config.loop_count = Some(LoopCount::Times(1));
        config.cycle = true;
        config.cleanup = true;

        let mut sink = Recorder::default();
        let report = Pipeline::build(vec![arg(&gif)], config, RunLogger::default())
            .unwrap()
            .run(&mut sink, std::future::pending())
            .await
            .unwrap();
        assert_eq!(report.interval, Duration::from_millis(60));
        assert_eq!(report.delay_source, Some(0));
        assert_eq!(report.cleanup, CleanupOutcome::Purged);
        assert_eq!(sink.drawn.len(), 3);
        // Only the run directory goes; the root stays.
        assert!(staging.is_dir());
        assert_eq!(std::fs::read_dir(&staging).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn explicit_size_applies_to_every_text_frame() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("wide.png");
        let b = dir.path().join("tall.png");
        write_png(&a, 300, 10, 255);
        write_png(&b, 5, 200, 255);
        let config = RunConfig {
            width: 40,
            height: Some(20),
            staging_root: dir.path().join("staging"),
            ..RunConfig::default()
        };
        let frames = Pipeline::build(vec![arg(&a), arg(&b)], config, RunLogger::default())
            .unwrap()
            .frames()
            .await
            .unwrap();
        for f in &frames {
            let rows: Vec<_> = f.text.split('\n').collect();
            assert_eq!(rows.len(), 20);
            assert!(rows.iter().all(|r| r.chars().count() == 40));
        }
    }

    #[tokio::test]
    async fn failed_acquisition_stops_before_decode() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        write_png(&good, 2, 2, 255);
        let staging = dir.path().join("staging");
        let tokens = vec![arg(&good), arg(&dir.path().join("missing.png"))];

        let err = Pipeline::build(tokens, config(&staging), RunLogger::default())
            .unwrap()
            .frames()
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Read { .. }));
        assert_eq!(err.stage(), Stage::Acquire);
        // Nothing reached the decoder.
        let runs: Vec<_> = std::fs::read_dir(&staging).unwrap().map(|e| e.unwrap().path()).collect();
        assert_eq!(runs.len(), 1);
        assert_eq!(std::fs::read_dir(runs[0].join("frames")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn unmatched_glob_only_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = arg(&dir.path().join("*.nothing"));
        let err = Pipeline::build(vec![pattern], config(&dir.path().join("s")), RunLogger::default())
            .unwrap()
            .frames()
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn glob_expands_in_natural_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, shade) in [("f10.png", 255), ("f2.png", 0), ("f1.png", 0)] {
            write_png(&dir.path().join(name), 4, 1, shade);
        }
        let pattern = arg(&dir.path().join("f*.png"));
        let frames = Pipeline::build(vec![pattern], config(&dir.path().join("s")), RunLogger::default())
            .unwrap()
            .frames()
            .await
            .unwrap();
        let texts: Vec<_> = frames.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, ["    ", "    ", "@@@@"]);
    }

    #[tokio::test]
    async fn foreign_files_in_staging_root_survive_a_run() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("one.png");
        write_png(&img, 4, 1, 255);
        let staging = dir.path().join("shared");
        std::fs::create_dir_all(&staging).unwrap();
        std::fs::write(staging.join("notes.txt"), b"user data").unwrap();

        let frames = Pipeline::build(vec![arg(&img)], config(&staging), RunLogger::default())
            .unwrap()
            .frames()
            .await
            .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(std::fs::read(staging.join("notes.txt")).unwrap(), b"user data");
    }

    #[tokio::test]
    async fn concurrent_runs_share_a_root_without_clobbering() {
        let dir = tempfile::tempdir().unwrap();
        let dark = dir.path().join("dark.png");
        let light = dir.path().join("light.png");
        write_png(&dark, 4, 1, 0);
        write_png(&light, 4, 1, 255);
        let staging = dir.path().join("shared");

        let a = Pipeline::build(vec![arg(&dark)], config(&staging), RunLogger::default()).unwrap();
        let b = Pipeline::build(vec![arg(&light)], config(&staging), RunLogger::default()).unwrap();
        let (a, b) = tokio::join!(a.frames(), b.frames());
        assert_eq!(a.unwrap()[0].text, "    ");
        assert_eq!(b.unwrap()[0].text, "@@@@");

        // Both runs kept their own staged input.
        let mut staged = 0;
        for run in std::fs::read_dir(&staging).unwrap() {
            staged += std::fs::read_dir(run.unwrap().path().join("staged")).unwrap().count();
        }
        assert_eq!(staged, 2);
    }

    #[tokio::test]
    async fn failed_purge_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir.path().join("s"));
        config.cleanup = true;
        let pipeline = Pipeline::build(vec!["x.png".into()], config, RunLogger::default()).unwrap();
        // A regular file where the run directory should be cannot be removed as a tree.
        let bogus = dir.path().join("run-file");
        std::fs::write(&bogus, b"x").unwrap();

        let outcome = pipeline.purge(&RunArea::new(&bogus), true).await;
        assert_eq!(outcome, CleanupOutcome::Failed);
    }
}
