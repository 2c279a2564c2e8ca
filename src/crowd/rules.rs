//! Pure density adjustment rules.
//!
//! `adjust_density` is deterministic: all randomness is resolved by the caller
//! into an optional [`Jitter`] before the rules run.

use crate::spot::DensityLevel;
use rand::Rng;
use time::Weekday;

/// Inclusive hour-of-day range treated as peak time.
pub const PEAK_HOURS: std::ops::RangeInclusive<u8> = 10..=16;
pub const DEFAULT_ADJUSTMENT_PROBABILITY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    Up,
    Down,
}

pub fn is_peak_hour(hour: u8) -> bool {
    PEAK_HOURS.contains(&hour)
}

pub fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Saturday | Weekday::Sunday)
}

pub fn adjust_density(
    baseline: DensityLevel,
    hour: u8,
    weekday: Weekday,
    jitter: Option<Jitter>,
) -> DensityLevel {
    let mut density = baseline;
    if is_peak_hour(hour) {
        density = density.increase();
    }
    if is_weekend(weekday) {
        density = density.increase();
    }
    match jitter {
        Some(Jitter::Up) => density.increase(),
        Some(Jitter::Down) => density.decrease(),
        None => density,
    }
}

/// With `probability`, pick a random direction with even odds.
pub fn roll_jitter<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> Option<Jitter> {
    if !rng.random_bool(probability.clamp(0.0, 1.0)) {
        return None;
    }
    if rng.random_bool(0.5) {
        Some(Jitter::Up)
    } else {
        Some(Jitter::Down)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn off_peak_weekday_keeps_baseline() {
        for level in DensityLevel::ALL {
            assert_eq!(adjust_density(level, 9, Weekday::Wednesday, None), level);
        }
    }

    #[test]
    fn peak_hours_are_inclusive() {
        let low = DensityLevel::Low;
        assert_eq!(adjust_density(low, 9, Weekday::Monday, None), low);
        assert_eq!(adjust_density(low, 10, Weekday::Monday, None), DensityLevel::Medium);
        assert_eq!(adjust_density(low, 16, Weekday::Monday, None), DensityLevel::Medium);
        assert_eq!(adjust_density(low, 17, Weekday::Monday, None), low);
    }

    #[test]
    fn weekend_peak_bumps_twice_and_clamps() {
        assert_eq!(
            adjust_density(DensityLevel::Low, 12, Weekday::Saturday, None),
            DensityLevel::High
        );
        assert_eq!(
            adjust_density(DensityLevel::High, 12, Weekday::Sunday, None),
            DensityLevel::VeryHigh
        );
        assert_eq!(
            adjust_density(DensityLevel::VeryHigh, 12, Weekday::Sunday, Some(Jitter::Up)),
            DensityLevel::VeryHigh
        );
    }

    #[test]
    fn jitter_down_clamps_at_low() {
        assert_eq!(
            adjust_density(DensityLevel::Low, 3, Weekday::Tuesday, Some(Jitter::Down)),
            DensityLevel::Low
        );
        assert_eq!(
            adjust_density(DensityLevel::High, 3, Weekday::Tuesday, Some(Jitter::Down)),
            DensityLevel::Medium
        );
    }

    #[test]
    fn zero_probability_never_jitters() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            assert_eq!(roll_jitter(&mut rng, 0.0), None);
        }
    }

    #[test]
    fn certain_probability_always_jitters_both_ways() {
        let mut rng = StdRng::seed_from_u64(11);
        let rolls: Vec<_> = (0..200).map(|_| roll_jitter(&mut rng, 1.0)).collect();

        assert!(rolls.iter().all(Option::is_some));
        assert!(rolls.contains(&Some(Jitter::Up)));
        assert!(rolls.contains(&Some(Jitter::Down)));
    }
}
