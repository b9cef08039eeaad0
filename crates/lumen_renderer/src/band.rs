//! Row-band partitioning for parallel rendering.
//!
//! The image is split into horizontal bands of whole rows. Each band maps to
//! a disjoint slice of the output buffer, so workers never share pixels.

/// A contiguous range of image rows, `min_row..max_row`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBand {
    pub min_row: u32,
    pub max_row: u32,
}

impl RowBand {
    pub fn new(min_row: u32, max_row: u32) -> Self {
        Self { min_row, max_row }
    }

    pub fn row_count(&self) -> u32 {
        self.max_row - self.min_row
    }

    /// Number of pixels in this band for an image `width` pixels wide.
    pub fn pixel_count(&self, width: u32) -> usize {
        self.row_count() as usize * width as usize
    }
}

/// Split `height` rows into `count` bands of equal height; the last band
/// takes the remainder.
///
/// `count` is clamped to `[1, height]`. A zero-height image gives no bands.
pub fn generate_bands(height: u32, count: usize) -> Vec<RowBand> {
    if height == 0 {
        return Vec::new();
    }

    let count = count.clamp(1, height as usize) as u32;
    let rows_per_band = height / count;

    (0..count)
        .map(|i| {
            let min_row = i * rows_per_band;
            let max_row = if i + 1 == count {
                height
            } else {
                min_row + rows_per_band
            };
            RowBand::new(min_row, max_row)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_bands_exact_fit() {
        let bands = generate_bands(12, 4);
        assert_eq!(bands.len(), 4);
        assert!(bands.iter().all(|b| b.row_count() == 3));

        let total_pixels: usize = bands.iter().map(|b| b.pixel_count(10)).sum();
        assert_eq!(total_pixels, 12 * 10);
    }

    #[test]
    fn test_last_band_takes_remainder() {
        let bands = generate_bands(10, 3);
        assert_eq!(bands, vec![RowBand::new(0, 3), RowBand::new(3, 6), RowBand::new(6, 10)]);
    }

    #[test]
    fn test_bands_are_contiguous() {
        for height in 1..40 {
            for count in 1..12 {
                let bands = generate_bands(height, count);
                assert_eq!(bands[0].min_row, 0);
                assert_eq!(bands.last().map(|b| b.max_row), Some(height));
                for pair in bands.windows(2) {
                    assert_eq!(pair[0].max_row, pair[1].min_row);
                }
                assert!(bands.iter().all(|b| b.row_count() > 0));
            }
        }
    }

    #[test]
    fn test_count_clamped() {
        assert_eq!(generate_bands(5, 0), vec![RowBand::new(0, 5)]);
        assert_eq!(generate_bands(3, 10).len(), 3);
        assert!(generate_bands(0, 4).is_empty());
    }
}
