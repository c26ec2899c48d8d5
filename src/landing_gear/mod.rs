use uom::si::{f64::*, ratio::ratio};

/// Converts a main gear animation position into normalised strut compression.
/// The lower half of the animation travel covers oleo extension, so
/// compression only starts at mid travel and ramps linearly to full.
pub fn strut_compression_from_animation(position: Ratio) -> Ratio {
    Ratio::new::<ratio>((2. * (position.get::<ratio>() - 0.5)).max(0.).min(1.))
}

/// The number of main landing gear legs carrying weight.
pub fn struts_on_ground(compression: [Ratio; 2]) -> usize {
    compression
        .iter()
        .filter(|compression| compression.get::<ratio>() > 0.)
        .count()
}

#[cfg(test)]
mod strut_compression_tests {
    use super::*;
    use ntest::assert_about_eq;

    fn animation_position(value: f64) -> Ratio {
        Ratio::new::<ratio>(value)
    }

    #[test]
    fn no_compression_in_the_lower_half_of_animation_travel() {
        assert_about_eq!(
            strut_compression_from_animation(animation_position(0.25)).get::<ratio>(),
            0.
        );
        assert_about_eq!(
            strut_compression_from_animation(animation_position(0.5)).get::<ratio>(),
            0.
        );
    }

    #[test]
    fn compression_ramps_linearly_over_the_upper_half_of_animation_travel() {
        assert_about_eq!(
            strut_compression_from_animation(animation_position(0.75)).get::<ratio>(),
            0.5
        );
    }

    #[test]
    fn full_animation_travel_gives_full_compression() {
        assert_about_eq!(
            strut_compression_from_animation(animation_position(1.)).get::<ratio>(),
            1.
        );
    }

    #[test]
    fn compression_is_clamped_to_the_valid_range() {
        assert_about_eq!(
            strut_compression_from_animation(animation_position(1.3)).get::<ratio>(),
            1.
        );
        assert_about_eq!(
            strut_compression_from_animation(animation_position(-0.3)).get::<ratio>(),
            0.
        );
    }
}

#[cfg(test)]
mod struts_on_ground_tests {
    use super::*;

    fn compression(value: f64) -> Ratio {
        Ratio::new::<ratio>(value)
    }

    #[test]
    fn counts_no_struts_when_fully_extended() {
        assert_eq!(struts_on_ground([compression(0.), compression(0.)]), 0);
    }

    #[test]
    fn counts_a_single_compressed_strut() {
        assert_eq!(struts_on_ground([compression(0.1), compression(0.)]), 1);
    }

    #[test]
    fn counts_both_compressed_struts() {
        assert_eq!(struts_on_ground([compression(1.), compression(0.6)]), 2);
    }
}
