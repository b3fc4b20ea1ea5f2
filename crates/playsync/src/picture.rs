use std::sync::Arc;
use std::time::Duration;

/// Pixel layout of a decoded picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
    Nv12,
}

/// Decoded picture exposed by the presentation widget.
///
/// The payload is shared, so handing the same picture to the surface again
/// does not copy pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub bytes: Arc<[u8]>,
    /// Position in the source stream the picture was decoded at.
    pub source_time: Duration,
}

impl Picture {
    /// Expected payload length for the declared size and format.
    pub fn expected_len(&self) -> Option<usize> {
        let pixels = usize::try_from(self.width)
            .ok()?
            .checked_mul(usize::try_from(self.height).ok()?)?;
        match self.format {
            PixelFormat::Rgba8 => pixels.checked_mul(4),
            PixelFormat::Nv12 => pixels.checked_mul(3).map(|len| len / 2),
        }
    }

    /// Returns true when the payload matches the declared geometry.
    pub fn is_well_formed(&self) -> bool {
        self.expected_len() == Some(self.bytes.len())
    }
}
