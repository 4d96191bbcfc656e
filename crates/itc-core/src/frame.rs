use std::path::PathBuf;
use std::time::Duration;

/// Buffer de pixels RGBA, row-major, 4 bytes par pixel.
///
/// Invariant: `data.len() == width * height * 4`.
///
/// # Example
/// ```
/// use itc_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer transparent aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Wrap raw RGBA bytes, checking the length invariant.
    ///
    /// # Example
    /// ```
    /// use itc_core::frame::FrameBuffer;
    /// assert!(FrameBuffer::from_rgba(2, 1, vec![0; 8]).is_some());
    /// assert!(FrameBuffer::from_rgba(2, 1, vec![0; 7]).is_none());
    /// ```
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize * 4).then_some(Self {
            data,
            width,
            height,
        })
    }

    /// Accès au pixel (x, y) → (r, g, b, a). Out-of-range reads are transparent.
    #[inline]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        match self.data.get(idx..idx + 4) {
            Some(p) => (p[0], p[1], p[2], p[3]),
            None => (0, 0, 0, 0),
        }
    }

    /// Luminance perceptuelle BT.709.
    ///
    /// # Example
    /// ```
    /// use itc_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::from_rgba(1, 1, vec![255, 255, 255, 255]).unwrap();
    /// assert_eq!(fb.luminance(0, 0), 255);
    /// ```
    #[inline]
    #[must_use]
    pub fn luminance(&self, x: u32, y: u32) -> u8 {
        let (r, g, b, _) = self.pixel(x, y);
        ((u32::from(r) * 2126 + u32::from(g) * 7152 + u32::from(b) * 722) / 10000) as u8
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Frame décodée, avant redimensionnement.
#[derive(Clone, Debug)]
pub struct RawFrame {
    /// Decoded pixels at the asset's native size.
    pub buffer: FrameBuffer,
    /// Index of the asset this frame comes from.
    pub asset_index: usize,
    /// Index of the frame inside its container.
    pub frame_index: usize,
    /// Native inter-frame delay. Only ever set on embedded frame 0.
    pub delay: Option<Duration>,
}

/// Frame rescaled to the output dimensions and persisted as an artifact.
#[derive(Clone, Debug)]
pub struct NormalizedFrame {
    /// Resized pixels.
    pub buffer: FrameBuffer,
    /// Index of the asset this frame comes from.
    pub asset_index: usize,
    /// Index of the frame inside its container.
    pub frame_index: usize,
    /// Encoded (PNG) artifact holding `buffer`.
    pub artifact: PathBuf,
}

/// Grille de caractères prête à afficher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextFrame {
    /// Rows joined with `\n`, no trailing newline.
    pub text: String,
    /// Index of the asset this frame comes from.
    pub asset_index: usize,
    /// Index of the frame inside its container.
    pub frame_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_out_of_bounds_is_transparent() {
        let fb = FrameBuffer::from_rgba(1, 1, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(fb.pixel(0, 0), (1, 2, 3, 4));
        assert_eq!(fb.pixel(1, 0), (0, 0, 0, 0));
        assert_eq!(fb.pixel(0, 5), (0, 0, 0, 0));
    }

    #[test]
    fn luminance_weights_green_highest() {
        let fb = FrameBuffer::from_rgba(
            3,
            1,
            vec![255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255],
        )
        .unwrap();
        let (r, g, b) = (fb.luminance(0, 0), fb.luminance(1, 0), fb.luminance(2, 0));
        assert!(g > r && r > b);
    }

    #[test]
    fn debug_does_not_dump_pixels() {
        let fb = FrameBuffer::new(4, 2);
        assert_eq!(
            format!("{fb:?}"),
            "FrameBuffer { width: 4, height: 2, bytes: 32 }"
        );
    }
}
