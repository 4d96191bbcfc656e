use crate::frame::FrameBuffer;

/// Convertit une frame pixel en grille de caractères.
///
/// Implémenté par : `LuminanceArt`. The pipeline only coordinates calls;
/// the algorithm lives behind this trait.
///
/// # Example
/// ```
/// use itc_core::traits::TextArt;
/// use itc_core::frame::FrameBuffer;
///
/// struct Dots;
/// impl TextArt for Dots {
///     fn convert(&self, frame: &FrameBuffer) -> Result<String, String> {
///         Ok(".".repeat(frame.width as usize))
///     }
///     fn name(&self) -> &'static str { "dots" }
/// }
/// assert_eq!(Dots.convert(&FrameBuffer::new(3, 1)).unwrap(), "...");
/// ```
pub trait TextArt: Send + Sync + 'static {
    /// Render `frame` as rows of characters joined by `\n`.
    ///
    /// # Errors
    /// Returns a description when the frame cannot be rendered.
    fn convert(&self, frame: &FrameBuffer) -> Result<String, String>;

    /// Nom lisible pour le debug.
    fn name(&self) -> &'static str;
}

/// What to do with the rendered output when playback stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StopMode {
    /// Leave the last frame on screen.
    #[default]
    Finalize,
    /// Erase the rendered output.
    Clear,
}

/// Destination for rendered frames (in-place redraw).
pub trait OutputSink {
    /// Replace the previously drawn frame with `frame`.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    fn draw(&mut self, frame: &str) -> std::io::Result<()>;

    /// Stop redrawing: keep the last frame or clear it.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    fn finish(&mut self, mode: StopMode) -> std::io::Result<()>;
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn draw(&mut self, frame: &str) -> std::io::Result<()> {
        (**self).draw(frame)
    }

    fn finish(&mut self, mode: StopMode) -> std::io::Result<()> {
        (**self).finish(mode)
    }
}
