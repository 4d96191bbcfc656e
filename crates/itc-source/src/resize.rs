use anyhow::{Context, Result};
use fast_image_resize::images::Image;
use fast_image_resize::{PixelType, ResizeOptions, Resizer};
use itc_core::frame::FrameBuffer;

/// Dimensions de sortie d'une frame normalisée.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetSize {
    /// Output width in pixels (= characters).
    pub width: u32,
    /// Output height in pixels (= text rows).
    pub height: u32,
    /// `true` when `height` was derived from the source aspect ratio.
    pub auto_height: bool,
}

impl TargetSize {
    /// Resolve the output size for a `src_w`×`src_h` frame.
    ///
    /// An explicit height is used as-is. Otherwise the height follows the
    /// source aspect ratio, divided by `cell_aspect` since terminal cells
    /// are taller than wide.
    ///
    /// # Example
    /// ```
    /// use itc_source::resize::TargetSize;
    /// let t = TargetSize::resolve(40, None, 200, 100, 2.0);
    /// assert_eq!((t.width, t.height, t.auto_height), (40, 10, true));
    /// let t = TargetSize::resolve(40, Some(20), 200, 100, 2.0);
    /// assert_eq!((t.width, t.height, t.auto_height), (40, 20, false));
    /// ```
    #[must_use]
    pub fn resolve(width: u32, height: Option<u32>, src_w: u32, src_h: u32, cell_aspect: f32) -> Self {
        let width = width.max(1);
        match height {
            Some(h) => Self {
                width,
                height: h.max(1),
                auto_height: false,
            },
            None => Self {
                width,
                height: auto_height(width, src_w, src_h, cell_aspect),
                auto_height: true,
            },
        }
    }
}

fn auto_height(width: u32, src_w: u32, src_h: u32, cell_aspect: f32) -> u32 {
    if src_w == 0 || src_h == 0 {
        return 1;
    }
    let h = f64::from(width) * f64::from(src_h) / f64::from(src_w) / f64::from(cell_aspect.max(0.1));
    (h.round() as u32).max(1)
}

/// Resize `src` into a freshly allocated `width`×`height` buffer.
///
/// # Errors
/// Returns an error if either size breaks the RGBA length invariant or the
/// resize itself fails.
///
/// # Example
/// ```
/// use itc_source::resize::resize_frame;
/// use itc_core::frame::FrameBuffer;
/// let dst = resize_frame(&FrameBuffer::new(100, 100), 50, 25).unwrap();
/// assert_eq!((dst.width, dst.height), (50, 25));
/// ```
pub fn resize_frame(src: &FrameBuffer, width: u32, height: u32) -> Result<FrameBuffer> {
    if src.width == width && src.height == height {
        return Ok(src.clone());
    }

    // fast_image_resize wants `&mut` on the source too.
    let mut src_buf = src.data.clone();
    let src_image = Image::from_slice_u8(src.width, src.height, &mut src_buf, PixelType::U8x4)
        .context("Invalid source dimensions")?;
    let mut dst = FrameBuffer::new(width, height);
    let mut dst_image = Image::from_slice_u8(width, height, &mut dst.data, PixelType::U8x4)
        .context("Invalid destination dimensions")?;

    Resizer::new()
        .resize(&src_image, &mut dst_image, Some(&ResizeOptions::new()))
        .context("Resize failed")?;
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_height_skips_aspect_computation() {
        // A very tall source would give a large auto height.
        let t = TargetSize::resolve(40, Some(20), 10, 1000, 2.0);
        assert_eq!(t, TargetSize { width: 40, height: 20, auto_height: false });
    }

    #[test]
    fn auto_height_never_drops_to_zero() {
        let t = TargetSize::resolve(4, None, 1000, 1, 2.0);
        assert_eq!(t.height, 1);
        assert!(t.auto_height);
        assert_eq!(TargetSize::resolve(4, None, 0, 0, 2.0).height, 1);
    }

    #[test]
    fn resize_keeps_the_rgba_invariant() {
        let src = FrameBuffer::from_rgba(2, 2, [200, 200, 200, 255].repeat(4)).unwrap();
        let dst = resize_frame(&src, 7, 3).unwrap();
        assert_eq!(dst.data.len(), 7 * 3 * 4);
        for px in dst.data.chunks_exact(4) {
            assert!(px[..3].iter().all(|&v| v.abs_diff(200) <= 1), "{px:?}");
            assert!(px[3] >= 254);
        }
    }

    #[test]
    fn same_size_is_a_copy() {
        let src = FrameBuffer::from_rgba(1, 1, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(resize_frame(&src, 1, 1).unwrap(), src);
    }
}
