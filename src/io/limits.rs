use crate::error::{HdrResult, LimitErrorKind};
use crate::hdr::BYTES_PER_PIXEL;

/// Resource limits for decoding.
///
/// The format itself bounds width and height to `1..=16384`. These limits can only tighten that
/// bound, never widen it. They are checked after the resolution line has been parsed and before
/// the buffer provider is asked for a destination buffer, so a rejected image never causes an
/// allocation.
///
/// All limits default to `None`, which means only the format bounds apply.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[allow(missing_copy_implementations)]
#[non_exhaustive]
pub struct Limits {
    /// The maximum allowed image width.
    pub max_image_width: Option<u32>,
    /// The maximum allowed image height.
    pub max_image_height: Option<u32>,
    /// The maximum allowed size in bytes of the destination buffer, `width * height * 4`.
    pub max_alloc: Option<u64>,
}

impl Limits {
    /// Disable all limits except the bounds of the format.
    #[must_use]
    pub fn no_limits() -> Limits {
        Limits::default()
    }

    /// This function checks the `max_image_width` and `max_image_height` limits given
    /// the image width and height.
    pub fn check_dimensions(&self, width: u32, height: u32) -> HdrResult<()> {
        if let Some(max_width) = self.max_image_width {
            if width > max_width {
                return Err(LimitErrorKind::DimensionError.into());
            }
        }

        if let Some(max_height) = self.max_image_height {
            if height > max_height {
                return Err(LimitErrorKind::DimensionError.into());
            }
        }

        Ok(())
    }

    /// Checks both dimension limits and that a RGBE buffer of the given size fits
    /// into `max_alloc`.
    pub fn check_buffer(&self, width: u32, height: u32) -> HdrResult<()> {
        self.check_dimensions(width, height)?;
        let in_memory_size = u64::from(width)
            .saturating_mul(u64::from(height))
            .saturating_mul(BYTES_PER_PIXEL as u64);
        if let Some(max_alloc) = self.max_alloc {
            if in_memory_size > max_alloc {
                return Err(LimitErrorKind::InsufficientMemory.into());
            }
        }
        Ok(())
    }
}
