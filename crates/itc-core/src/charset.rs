/// 10 caractères, compact, bon contraste. Default ramp.
pub const CHARSET_COMPACT: &str = " .:-=+*#%@";

/// 70 caractères : rampe étendue de Paul Bourke.
pub const CHARSET_STANDARD: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// Blocs Unicode : pseudo-pixels.
pub const CHARSET_BLOCKS: &str = " ░▒▓█";

/// Resolve a charset argument: a preset name, or the literal ramp itself.
///
/// # Example
/// ```
/// use itc_core::charset::{resolve, CHARSET_BLOCKS};
/// assert_eq!(resolve("blocks"), CHARSET_BLOCKS);
/// assert_eq!(resolve(" .oO"), " .oO");
/// ```
#[must_use]
pub fn resolve(name_or_ramp: &str) -> &str {
    match name_or_ramp {
        "compact" => CHARSET_COMPACT,
        "standard" => CHARSET_STANDARD,
        "blocks" => CHARSET_BLOCKS,
        other => other,
    }
}

/// Lookup table mapping luminance [0..255] → character.
///
/// # Example
/// ```
/// use itc_core::charset::LuminanceLut;
/// let lut = LuminanceLut::new(" .:#@");
/// assert_eq!(lut.map(0), ' ');
/// assert_eq!(lut.map(255), '@');
/// ```
#[derive(Clone, Debug)]
pub struct LuminanceLut {
    lut: [char; 256],
}

impl LuminanceLut {
    /// Build a LUT from a charset ordered lightest→densest.
    /// Falls back to `" @"` when fewer than 2 characters are given.
    #[must_use]
    pub fn new(charset: &str) -> Self {
        let chars: Vec<char> = charset.chars().collect();
        if chars.len() < 2 {
            return Self::new(" @");
        }
        let last = chars.len() - 1;
        let mut lut = [' '; 256];
        for (i, slot) in lut.iter_mut().enumerate() {
            *slot = chars[i * last / 255];
        }
        Self { lut }
    }

    /// Map a luminance value [0..255] to a character.
    #[inline]
    #[must_use]
    pub fn map(&self, luminance: u8) -> char {
        self.lut[luminance as usize]
    }
}
