//! Numeric helpers shared by the forecasting formulas.

/// Round `value` to `decimals` places (half away from zero).
///
/// Non-finite inputs are returned unchanged.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10_f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    // Avoid surfacing `-0.0` in serialized output.
    if rounded == 0.0 { 0.0 } else { rounded }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round_to(12.345_6, 2), 12.35);
        assert_eq!(round_to(62.5, 2), 62.5);
        assert_eq!(round_to(-0.001, 2), 0.0);
    }

    #[test]
    fn zero_decimals_rounds_to_integer() {
        assert_eq!(round_to(54.5, 0), 55.0);
        assert_eq!(round_to(54.49, 0), 54.0);
    }

    proptest::proptest! {
        #[test]
        fn rounding_moves_less_than_half_a_unit(v in -1.0e6f64..1.0e6) {
            let r = round_to(v, 2);
            proptest::prop_assert!((r - v).abs() <= 0.005 + 1e-9);
            proptest::prop_assert_eq!(round_to(r, 2), r);
        }
    }
}
