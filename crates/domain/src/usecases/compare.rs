//! Bit-exact image equality

use crate::model::DecodedImage;

/// Number of channel values that differ between two same-sized images
pub fn differing_channels(a: &DecodedImage, b: &DecodedImage) -> usize {
    let differing = a
        .pixels
        .iter()
        .zip(&b.pixels)
        .filter(|(x, y)| x.abs_diff(**y) != 0)
        .count();
    differing + a.pixels.len().abs_diff(b.pixels.len())
}

/// True iff both images have the same dimensions and identical pixels
pub fn images_equal(a: &DecodedImage, b: &DecodedImage) -> bool {
    if a.dimensions() != b.dimensions() {
        return false;
    }
    differing_channels(a, b) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_images_are_equal() {
        let a = DecodedImage::solid(8, 4, [10, 20, 30]);
        assert!(images_equal(&a, &a.clone()));
    }

    #[test]
    fn test_dimension_mismatch_is_not_equal() {
        let a = DecodedImage::solid(8, 4, [10, 20, 30]);
        let b = DecodedImage::solid(4, 8, [10, 20, 30]);
        assert!(!images_equal(&a, &b));
    }

    #[test]
    fn test_single_channel_difference_is_not_equal() {
        let a = DecodedImage::solid(3, 3, [10, 20, 30]);
        let mut b = a.clone();
        b.pixels[13] = 21;
        assert_eq!(differing_channels(&a, &b), 1);
        assert!(!images_equal(&a, &b));
    }

    #[test]
    fn test_difference_is_absolute() {
        // A darker second image still differs
        let a = DecodedImage::solid(2, 2, [10, 10, 10]);
        let b = DecodedImage::solid(2, 2, [200, 200, 200]);
        assert_eq!(differing_channels(&a, &b), 12);
        assert_eq!(differing_channels(&b, &a), 12);
    }
}
