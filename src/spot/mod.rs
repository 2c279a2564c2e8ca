//! Reference data for points of interest.
//!
//! Spots are loaded once from the catalog file and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod catalog;

pub type SpotId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Monument,
    Museum,
    Park,
    Restaurant,
    Shopping,
    Entertainment,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monument => "monument",
            Self::Museum => "museum",
            Self::Park => "park",
            Self::Restaurant => "restaurant",
            Self::Shopping => "shopping",
            Self::Entertainment => "entertainment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crowdedness on a strict total order: `Low < Medium < High < VeryHigh`.
///
/// The derived `Ord` follows declaration order, so comparisons between levels
/// are plain `<=`/`>` checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DensityLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl DensityLevel {
    pub const ALL: [DensityLevel; 4] = [Self::Low, Self::Medium, Self::High, Self::VeryHigh];

    /// One level up, saturating at `VeryHigh`.
    pub fn increase(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High | Self::VeryHigh => Self::VeryHigh,
        }
    }

    /// One level down, saturating at `Low`.
    pub fn decrease(self) -> Self {
        match self {
            Self::Low | Self::Medium => Self::Low,
            Self::High => Self::Medium,
            Self::VeryHigh => Self::High,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very-high",
        }
    }
}

impl fmt::Display for DensityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Daily opening window as `HH:MM` strings, e.g. `"06:00"`-`"23:00"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub open: String,
    pub close: String,
}

impl OpeningHours {
    /// Whether the given minute of the day falls inside the window.
    ///
    /// Returns `None` when either bound is not a valid `HH:MM` value.
    /// Windows whose close is earlier than open wrap past midnight.
    pub fn is_open_at(&self, hour: u8, minute: u8) -> Option<bool> {
        let open = parse_minute_of_day(&self.open)?;
        let close = parse_minute_of_day(&self.close)?;
        let now = u16::from(hour) * 60 + u16::from(minute);
        if open <= close {
            Some(now >= open && now <= close)
        } else {
            Some(now >= open || now <= close)
        }
    }
}

fn parse_minute_of_day(value: &str) -> Option<u16> {
    let (hour, minute) = value.split_once(':')?;
    let hour: u16 = hour.trim().parse().ok()?;
    let minute: u16 = minute.trim().parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(hour * 60 + minute)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    pub id: SpotId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub location: Coordinate,
    /// Baseline crowd level used when no live estimate is available.
    pub crowd_density: DensityLevel,
    pub rating: f64,
    /// Minutes.
    pub estimated_visit_time: u32,
    pub opening_hours: OpeningHours,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increase_saturates_at_very_high() {
        for level in DensityLevel::ALL {
            assert!(level.increase() >= level);
            assert!(level.increase() <= DensityLevel::VeryHigh);
        }
        assert_eq!(DensityLevel::VeryHigh.increase(), DensityLevel::VeryHigh);
        assert_eq!(DensityLevel::Low.increase(), DensityLevel::Medium);
    }

    #[test]
    fn decrease_saturates_at_low() {
        for level in DensityLevel::ALL {
            assert!(level.decrease() <= level);
            assert!(level.decrease() >= DensityLevel::Low);
        }
        assert_eq!(DensityLevel::Low.decrease(), DensityLevel::Low);
        assert_eq!(DensityLevel::VeryHigh.decrease(), DensityLevel::High);
    }

    #[test]
    fn levels_are_strictly_ordered() {
        assert!(DensityLevel::Low < DensityLevel::Medium);
        assert!(DensityLevel::Medium < DensityLevel::High);
        assert!(DensityLevel::High < DensityLevel::VeryHigh);
    }

    #[test]
    fn density_uses_kebab_case_on_the_wire() {
        let value = serde_json::to_value(DensityLevel::VeryHigh).expect("serialize density");
        assert_eq!(value, serde_json::json!("very-high"));

        let parsed: DensityLevel = serde_json::from_str("\"medium\"").expect("parse density");
        assert_eq!(parsed, DensityLevel::Medium);
    }

    #[test]
    fn opening_hours_handle_plain_and_overnight_windows() {
        let day = OpeningHours {
            open: "10:00".to_string(),
            close: "18:00".to_string(),
        };
        assert_eq!(day.is_open_at(9, 59), Some(false));
        assert_eq!(day.is_open_at(10, 0), Some(true));
        assert_eq!(day.is_open_at(18, 0), Some(true));
        assert_eq!(day.is_open_at(18, 1), Some(false));

        let night = OpeningHours {
            open: "20:00".to_string(),
            close: "02:00".to_string(),
        };
        assert_eq!(night.is_open_at(23, 30), Some(true));
        assert_eq!(night.is_open_at(1, 0), Some(true));
        assert_eq!(night.is_open_at(12, 0), Some(false));
    }

    #[test]
    fn malformed_opening_hours_are_unknown() {
        let hours = OpeningHours {
            open: "sunrise".to_string(),
            close: "18:00".to_string(),
        };
        assert_eq!(hours.is_open_at(12, 0), None);
    }
}
