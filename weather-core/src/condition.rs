//! Canonical weather conditions and display glyphs.
//!
//! Providers describe the sky either with a numeric code (Tomorrow.io) or a
//! free-text label (OpenWeather). Both resolve into the closed [`Condition`]
//! vocabulary; anything unrecognised becomes [`Condition::Unknown`].

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Clear,
    Cloudy,
    Rain,
    Drizzle,
    Snow,
    Thunderstorm,
    Fog,
    Windy,
    Unknown,
}

impl Condition {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Condition::Clear => "Clear",
            Condition::Cloudy => "Cloudy",
            Condition::Rain => "Rain",
            Condition::Drizzle => "Drizzle",
            Condition::Snow => "Snow",
            Condition::Thunderstorm => "Thunderstorm",
            Condition::Fog => "Fog",
            Condition::Windy => "Windy",
            Condition::Unknown => "Unknown",
        }
    }

    pub const fn all() -> &'static [Condition] {
        &[
            Condition::Clear,
            Condition::Cloudy,
            Condition::Rain,
            Condition::Drizzle,
            Condition::Snow,
            Condition::Thunderstorm,
            Condition::Fog,
            Condition::Windy,
            Condition::Unknown,
        ]
    }

    /// Tomorrow.io `weatherCode` table.
    pub fn from_code(code: u32) -> Self {
        match code {
            1000 | 1100 => Condition::Clear,
            1001 | 1101 | 1102 => Condition::Cloudy,
            2000 | 2100 => Condition::Fog,
            4000 | 6000 => Condition::Drizzle,
            4001 | 4200 | 4201 | 6001 | 6200 | 6201 => Condition::Rain,
            5000 | 5001 | 5100 | 5101 | 7000 | 7101 | 7102 => Condition::Snow,
            8000 => Condition::Thunderstorm,
            _ => Condition::Unknown,
        }
    }

    /// Case-insensitive substring match with a fixed precedence:
    /// rain/drizzle, snow, storm/thunder, cloud, clear/sunny, fog/mist, wind.
    ///
    /// "Light rain and thunder" is therefore `Rain`, not `Thunderstorm`.
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        let has = |needle: &str| lower.contains(needle);

        if has("rain") {
            Condition::Rain
        } else if has("drizzle") {
            Condition::Drizzle
        } else if has("snow") {
            Condition::Snow
        } else if has("storm") || has("thunder") {
            Condition::Thunderstorm
        } else if has("cloud") {
            Condition::Cloudy
        } else if has("clear") || has("sunny") {
            Condition::Clear
        } else if has("fog") || has("mist") {
            Condition::Fog
        } else if has("wind") {
            Condition::Windy
        } else {
            Condition::Unknown
        }
    }

    /// Display glyph. `Clear` and `Unknown` switch to the moon at night;
    /// `Cloudy` keeps the same cloud for both, everything else is fixed.
    pub const fn glyph(&self, is_daytime: bool) -> &'static str {
        match self {
            Condition::Rain | Condition::Drizzle => "🌧️",
            Condition::Snow => "❄️",
            Condition::Thunderstorm => "⛈️",
            Condition::Cloudy => "☁️",
            Condition::Fog => "🌫️",
            Condition::Windy => "💨",
            Condition::Clear | Condition::Unknown => {
                if is_daytime {
                    "☀️"
                } else {
                    "🌙"
                }
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN_CODES: &[u32] = &[
        1000, 1100, 1101, 1102, 1001, 2000, 2100, 4000, 4001, 4200, 4201, 5000, 5001, 5100, 5101,
        6000, 6001, 6200, 6201, 7000, 7101, 7102, 8000,
    ];

    #[test]
    fn every_known_code_maps_into_vocabulary() {
        for code in KNOWN_CODES {
            let condition = Condition::from_code(*code);
            assert!(Condition::all().contains(&condition));
            assert_ne!(condition, Condition::Unknown, "code {code} should be mapped");
        }
    }

    #[test]
    fn unmapped_codes_are_unknown() {
        assert_eq!(Condition::from_code(0), Condition::Unknown);
        assert_eq!(Condition::from_code(9999), Condition::Unknown);
        assert_eq!(Condition::from_code(3000), Condition::Unknown);
    }

    #[test]
    fn code_samples() {
        assert_eq!(Condition::from_code(1101), Condition::Cloudy);
        assert_eq!(Condition::from_code(6000), Condition::Drizzle);
        assert_eq!(Condition::from_code(4201), Condition::Rain);
        assert_eq!(Condition::from_code(8000), Condition::Thunderstorm);
    }

    #[test]
    fn any_label_with_rain_gets_rain_glyph() {
        let labels = [
            "Rain",
            "light RAIN",
            "Thunderstorm with rain",
            "rain and snow",
            "cloudy, rainy and windy",
            "Freezing Rain",
        ];
        for label in labels {
            let condition = Condition::from_label(label);
            assert_eq!(condition.glyph(true), "🌧️", "{label}");
            assert_eq!(condition.glyph(false), "🌧️", "{label}");
        }
    }

    #[test]
    fn label_precedence_follows_fixed_order() {
        assert_eq!(Condition::from_label("Drizzle"), Condition::Drizzle);
        assert_eq!(Condition::from_label("snow storm"), Condition::Snow);
        assert_eq!(Condition::from_label("Thunderstorm"), Condition::Thunderstorm);
        assert_eq!(Condition::from_label("Clouds"), Condition::Cloudy);
        assert_eq!(Condition::from_label("clear sky"), Condition::Clear);
        assert_eq!(Condition::from_label("Sunny"), Condition::Clear);
        assert_eq!(Condition::from_label("Mist"), Condition::Fog);
        assert_eq!(Condition::from_label("windy"), Condition::Windy);
        assert_eq!(Condition::from_label("Haze"), Condition::Unknown);
        assert_eq!(Condition::from_label(""), Condition::Unknown);
    }

    #[test]
    fn night_variants_only_for_open_sky() {
        assert_eq!(Condition::Clear.glyph(true), "☀️");
        assert_eq!(Condition::Clear.glyph(false), "🌙");
        assert_eq!(Condition::Cloudy.glyph(false), Condition::Cloudy.glyph(true));
        assert_eq!(Condition::Snow.glyph(false), Condition::Snow.glyph(true));
        assert_eq!(Condition::Fog.glyph(false), Condition::Fog.glyph(true));
        assert_eq!(Condition::from_label("Haze").glyph(false), "🌙");
    }

    #[test]
    fn display_matches_label() {
        for condition in Condition::all() {
            assert_eq!(condition.to_string(), condition.as_str());
        }
    }
}
