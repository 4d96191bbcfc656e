use itc_core::charset::LuminanceLut;
use itc_core::frame::FrameBuffer;
use itc_core::traits::TextArt;

/// Mapping luminance → caractère, un caractère par pixel normalisé.
///
/// Pixels are composited over black first, so fully transparent pixels
/// render as the lightest character of the ramp.
///
/// # Example
/// ```
/// use itc_core::frame::FrameBuffer;
/// use itc_core::traits::TextArt;
/// use itc_ascii::luminance::LuminanceArt;
///
/// let art = LuminanceArt::new(" .:#@");
/// let frame = FrameBuffer::from_rgba(2, 1, vec![0, 0, 0, 255, 255, 255, 255, 255]).unwrap();
/// assert_eq!(art.convert(&frame).unwrap(), " @");
/// ```
#[derive(Clone, Debug)]
pub struct LuminanceArt {
    lut: LuminanceLut,
}

impl LuminanceArt {
    /// Build the transform for a ramp ordered lightest → densest.
    #[must_use]
    pub fn new(charset: &str) -> Self {
        Self {
            lut: LuminanceLut::new(charset),
        }
    }
}

impl TextArt for LuminanceArt {
    fn convert(&self, frame: &FrameBuffer) -> Result<String, String> {
        let expected = frame.width as usize * frame.height as usize * 4;
        if frame.data.len() != expected {
            return Err(format!(
                "buffer holds {} bytes, {}x{} needs {expected}",
                frame.data.len(),
                frame.width,
                frame.height
            ));
        }

        let mut out = String::with_capacity((frame.width as usize + 1) * frame.height as usize);
        for y in 0..frame.height {
            if y > 0 {
                out.push('\n');
            }
            for x in 0..frame.width {
                let (_, _, _, a) = frame.pixel(x, y);
                let lum = u32::from(frame.luminance(x, y)) * u32::from(a) / 255;
                out.push(self.lut.map(lum as u8));
            }
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "luminance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_newline_separated_without_trailing_newline() {
        let art = LuminanceArt::new(" @");
        let frame = FrameBuffer::from_rgba(3, 2, [255, 255, 255, 255].repeat(6)).unwrap();
        assert_eq!(art.convert(&frame).unwrap(), "@@@\n@@@");
    }

    #[test]
    fn transparent_pixels_are_blank() {
        let art = LuminanceArt::new(" .:#@");
        let frame = FrameBuffer::from_rgba(1, 1, vec![255, 255, 255, 0]).unwrap();
        assert_eq!(art.convert(&frame).unwrap(), " ");
    }

    #[test]
    fn broken_buffer_is_rejected() {
        let art = LuminanceArt::new(" @");
        let frame = FrameBuffer {
            data: vec![0; 3],
            width: 1,
            height: 1,
        };
        assert!(art.convert(&frame).is_err());
    }
}
