//! Conversions from provider-native units to the canonical ones.
//!
//! Temperatures are always requested in Celsius (`units=metric`), so there is
//! no temperature path here. Rounding happens only when a value is exposed.

const MPH_PER_MPS: f64 = 2.237;

/// Round half away from zero to a whole number.
pub fn round_whole(value: f64) -> i32 {
    value.round() as i32
}

/// Round to two decimal places, used for precipitation totals.
pub fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn mps_to_mph(speed_mps: f64) -> u32 {
    (speed_mps * MPH_PER_MPS).round().max(0.0) as u32
}

pub fn meters_to_km(distance_m: f64) -> i32 {
    round_whole(distance_m / 1000.0)
}

/// Relative humidity clamped into `0..=100` and rounded.
pub fn humidity_pct(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_meters_per_second_is_twenty_two_mph() {
        assert_eq!(mps_to_mph(10.0), 22);
    }

    #[test]
    fn wind_rounds_half_away_from_zero() {
        // 1.565 * 2.237 = 3.5009...
        assert_eq!(mps_to_mph(1.565), 4);
        assert_eq!(mps_to_mph(0.0), 0);
    }

    #[test]
    fn visibility_meters_to_km() {
        assert_eq!(meters_to_km(10_000.0), 10);
        assert_eq!(meters_to_km(2_500.0), 3);
        assert_eq!(meters_to_km(499.0), 0);
    }

    #[test]
    fn whole_rounding_is_symmetric() {
        assert_eq!(round_whole(2.5), 3);
        assert_eq!(round_whole(-2.5), -3);
        assert_eq!(round_whole(-0.4), 0);
    }

    #[test]
    fn humidity_is_clamped() {
        assert_eq!(humidity_pct(101.2), 100);
        assert_eq!(humidity_pct(-3.0), 0);
        assert_eq!(humidity_pct(54.5), 55);
    }

    #[test]
    fn precipitation_keeps_two_decimals() {
        assert_eq!(round_hundredths(1.23456), 1.23);
        assert_eq!(round_hundredths(0.005), 0.01);
    }
}
