use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use itc_core::config::{LoopCount, RunConfig};
use itc_core::error::{PipelineError, Stage};
use itc_core::frame::TextFrame;
use itc_core::logger::RunLogger;
use itc_core::traits::{OutputSink, StopMode};

/// Décision prise à chaque entrée ou tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Draw the frame at this index of the unshuffled frame list.
    Render(usize),
    /// Playback is over.
    Stop,
}

/// Machine à états de lecture : curseur, boucles, ordre de lecture.
///
/// The play order is fixed at construction (identity, or one shuffle).
/// The start index points into that order, not into the unshuffled list.
///
/// # Example
/// ```
/// use itc_core::config::{LoopCount, RunConfig};
/// use itc_render::playback::{Playback, Step};
///
/// let config = RunConfig { loop_count: Some(LoopCount::Times(1)), cycle: true, ..RunConfig::default() };
/// let mut p = Playback::new(2, &config, &mut fastrand::Rng::with_seed(0));
/// assert_eq!(p.enter(), Step::Render(0));
/// assert_eq!(p.tick(), Step::Render(1));
/// assert_eq!(p.tick(), Step::Stop);
/// ```
#[derive(Clone, Debug)]
pub struct Playback {
    order: Vec<usize>,
    start: usize,
    cursor: usize,
    loop_limit: Option<u32>,
    completed: u32,
    animating: bool,
}

impl Playback {
    /// Build the state for `frame_count` frames.
    ///
    /// `start_index` is clamped into `[0, frame_count)`. Shuffling, when
    /// enabled, draws one permutation from `rng`.
    #[must_use]
    pub fn new(frame_count: usize, config: &RunConfig, rng: &mut fastrand::Rng) -> Self {
        let mut order: Vec<usize> = (0..frame_count).collect();
        if config.shuffle {
            rng.shuffle(&mut order);
        }
        let start = config.start_index.min(frame_count.saturating_sub(1));
        let loop_limit = match config.loop_count {
            Some(LoopCount::Times(n)) => Some(n.max(1)),
            Some(LoopCount::Infinite) | None => None,
        };
        Self {
            order,
            start,
            cursor: start,
            loop_limit,
            completed: 0,
            animating: config.is_cycling() && frame_count > 1,
        }
    }

    /// First render, before any tick.
    pub fn enter(&mut self) -> Step {
        match self.order.get(self.cursor) {
            Some(&frame) => Step::Render(frame),
            None => {
                self.animating = false;
                Step::Stop
            }
        }
    }

    /// Advance the cursor by one and decide what to draw.
    ///
    /// Coming back to the start position completes one cycle; the cycle
    /// that reaches the loop limit stops without drawing.
    pub fn tick(&mut self) -> Step {
        if !self.animating {
            return Step::Stop;
        }
        self.cursor = (self.cursor + 1) % self.order.len();
        if self.cursor == self.start {
            self.completed += 1;
            if self.loop_limit.is_some_and(|limit| self.completed >= limit) {
                self.animating = false;
                return Step::Stop;
            }
        }
        Step::Render(self.order[self.cursor])
    }

    /// `true` while a timer is needed.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// Position in the play order.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Play order: `order()[i]` is the frame shown at position `i`.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Full cycles completed so far.
    #[must_use]
    pub fn completed_loops(&self) -> u32 {
        self.completed
    }
}

/// Why playback ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Single frame or cycling disabled: drawn once, no timer.
    Static,
    /// The loop limit was reached.
    LoopsDone,
    /// The stop signal fired.
    External,
}

/// Bilan d'une lecture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Frames drawn, entry render included.
    pub rendered: usize,
    /// Timer ticks consumed.
    pub ticks: u64,
    /// What ended playback.
    pub stopped_by: StopReason,
    /// Play order that was used.
    pub order: Vec<usize>,
}

/// Drives a [`Playback`] with a periodic timer and an external stop signal.
#[derive(Debug, Clone)]
pub struct AnimationController {
    interval: Duration,
    stop_mode: StopMode,
    seed: Option<u64>,
    log: RunLogger,
}

impl AnimationController {
    /// Controller ticking every `interval`.
    #[must_use]
    pub fn new(interval: Duration, stop_mode: StopMode, log: RunLogger) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            stop_mode,
            seed: None,
            log,
        }
    }

    /// Fix the shuffle seed (reproducible order).
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Tick interval in use.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Play `frames` on `sink` until the loops run out or `stop` resolves.
    ///
    /// A static run draws once and returns without creating a timer. The
    /// timer lives in this future, so it is gone on every return path.
    ///
    /// # Errors
    /// [`PipelineError::Write`] when the sink fails.
    pub async fn play<S, F>(
        &self,
        frames: &[TextFrame],
        config: &RunConfig,
        sink: &mut S,
        stop: F,
    ) -> Result<PlaybackReport, PipelineError>
    where
        S: OutputSink + ?Sized,
        F: Future<Output = ()>,
    {
        let mut rng = match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let mut state = Playback::new(frames.len(), config, &mut rng);
        if config.shuffle {
            self.log.info(format!("play order {:?}", state.order()));
        }

        let mut rendered = 0usize;
        if let Step::Render(i) = state.enter() {
            sink.draw(&frames[i].text).map_err(sink_error)?;
            rendered += 1;
        }

        if !state.is_animating() {
            sink.finish(StopMode::Finalize).map_err(sink_error)?;
            return Ok(PlaybackReport {
                rendered,
                ticks: 0,
                stopped_by: StopReason::Static,
                order: state.order().to_vec(),
            });
        }

        self.log.info(format!(
            "animating {} frame(s) every {} ms",
            frames.len(),
            self.interval.as_millis()
        ));

        let start = tokio::time::Instant::now() + self.interval;
        let mut timer = tokio::time::interval_at(start, self.interval);
        tokio::pin!(stop);
        let mut ticks = 0u64;

        let stopped_by = loop {
            tokio::select! {
                () = &mut stop => break StopReason::External,
                _ = timer.tick() => {
                    ticks += 1;
                    match state.tick() {
                        Step::Render(i) => {
                            sink.draw(&frames[i].text).map_err(sink_error)?;
                            rendered += 1;
                        }
                        Step::Stop => break StopReason::LoopsDone,
                    }
                }
            }
        };

        let mode = match stopped_by {
            StopReason::External => self.stop_mode,
            StopReason::Static | StopReason::LoopsDone => StopMode::Finalize,
        };
        sink.finish(mode).map_err(sink_error)?;
        self.log.success(format!(
            "playback stopped after {ticks} tick(s), {} loop(s)",
            state.completed_loops()
        ));

        Ok(PlaybackReport {
            rendered,
            ticks,
            stopped_by,
            order: state.order().to_vec(),
        })
    }
}

fn sink_error(source: std::io::Error) -> PipelineError {
    PipelineError::Write {
        stage: Stage::Playback,
        path: PathBuf::new(),
        source,
    }
}
