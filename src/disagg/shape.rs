//! Shape extraction: distributing an event's matched energy over its window.

use std::fmt;

use super::types::Direction;

/// Allocates a target energy onto a per-slot residual profile.
///
/// Implementations must return one value per profile entry with
/// `0 <= allocation[i] <= profile[i]` and `Σ allocation ≈ target`. When the
/// profile holds less than `target` the allocation is capped at the profile.
pub trait ShapeExtractor {
    /// Returns the per-slot allocation for one event and direction.
    ///
    /// # Arguments
    ///
    /// * `profile` - Non-negative residual activity over the event window
    /// * `target` - Matched energy to allocate
    /// * `kind` - Label of the run, for shapers that vary by scenario
    /// * `direction` - Flow direction being allocated
    fn allocate(&self, profile: &[f64], target: f64, kind: &str, direction: Direction) -> Vec<f64>;
}

impl<F> ShapeExtractor for F
where
    F: Fn(&[f64], f64, &str, Direction) -> Vec<f64>,
{
    fn allocate(&self, profile: &[f64], target: f64, kind: &str, direction: Direction) -> Vec<f64> {
        self(profile, target, kind, direction)
    }
}

/// Peak-first allocation: removes everything above a constant level.
///
/// The level is chosen so that the volume above it equals the target, which
/// attributes the event to the most intense slots of the window.
#[derive(Debug, Default, Clone, Copy)]
pub struct LevelCut;

impl LevelCut {
    /// Level `L` with `Σ max(p − L, 0) = target`, for `0 < target < Σp`.
    fn level(profile: &[f64], target: f64) -> f64 {
        let mut sorted = profile.to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));

        let mut above = 0.0;
        for (k, &value) in sorted.iter().enumerate() {
            above += value;
            let next = sorted.get(k + 1).copied().unwrap_or(0.0);
            let candidate = (above - target) / (k + 1) as f64;
            if candidate >= next {
                return candidate;
            }
        }
        0.0
    }
}

impl ShapeExtractor for LevelCut {
    fn allocate(&self, profile: &[f64], target: f64, _kind: &str, _direction: Direction) -> Vec<f64> {
        let total: f64 = profile.iter().sum();
        if target <= 0.0 || total <= 0.0 {
            return vec![0.0; profile.len()];
        }
        if target >= total {
            return profile.to_vec();
        }
        let level = Self::level(profile, target);
        profile.iter().map(|&p| (p - level).max(0.0)).collect()
    }
}

/// Uniform scaling of the whole window profile.
#[derive(Debug, Default, Clone, Copy)]
pub struct Proportional;

impl ShapeExtractor for Proportional {
    fn allocate(&self, profile: &[f64], target: f64, _kind: &str, _direction: Direction) -> Vec<f64> {
        let total: f64 = profile.iter().sum();
        if target <= 0.0 || total <= 0.0 {
            return vec![0.0; profile.len()];
        }
        let scale = (target / total).min(1.0);
        profile.iter().map(|&p| p * scale).collect()
    }
}

/// Shape extractor selected by configuration.
#[derive(Debug, Clone, Copy)]
pub enum Shape {
    LevelCut(LevelCut),
    Proportional(Proportional),
}

impl Shape {
    /// Available model names.
    pub const MODELS: &[&str] = &["level_cut", "proportional"];

    /// Builds a shape from its configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "level_cut" => Some(Shape::LevelCut(LevelCut)),
            "proportional" => Some(Shape::Proportional(Proportional)),
            _ => None,
        }
    }
}

impl ShapeExtractor for Shape {
    fn allocate(&self, profile: &[f64], target: f64, kind: &str, direction: Direction) -> Vec<f64> {
        match self {
            Shape::LevelCut(s) => s.allocate(profile, target, kind, direction),
            Shape::Proportional(s) => s.allocate(profile, target, kind, direction),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::LevelCut(_) => f.write_str("level_cut"),
            Shape::Proportional(_) => f.write_str("proportional"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(v: &[f64]) -> f64 {
        v.iter().sum()
    }

    #[test]
    fn level_cut_takes_peaks_first() {
        let a = LevelCut.allocate(&[1.0, 4.0, 2.0], 3.0, "k", Direction::Charge);
        // level 1.5: [0, 2.5, 0.5]
        assert!((a[0] - 0.0).abs() < 1e-12);
        assert!((a[1] - 2.5).abs() < 1e-12);
        assert!((a[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn level_cut_hits_target_within_profile() {
        let profile = [0.3, 0.0, 1.7, 0.9, 0.9, 2.2];
        for target in [0.01, 0.5, 2.0, 4.0, 5.9] {
            let a = LevelCut.allocate(&profile, target, "k", Direction::Discharge);
            assert!((sum(&a) - target).abs() < 1e-9, "target {target}: {a:?}");
            assert!(a.iter().zip(&profile).all(|(x, p)| *x >= 0.0 && *x <= *p));
        }
    }

    #[test]
    fn level_cut_with_equal_values_spreads_evenly() {
        let a = LevelCut.allocate(&[1.0, 1.0, 1.0, 1.0], 2.0, "k", Direction::Charge);
        assert!(a.iter().all(|x| (x - 0.5).abs() < 1e-12));
    }

    #[test]
    fn oversized_target_is_capped() {
        let profile = [1.0, 2.0];
        assert_eq!(LevelCut.allocate(&profile, 5.0, "k", Direction::Charge), profile.to_vec());
        assert_eq!(Proportional.allocate(&profile, 5.0, "k", Direction::Charge), profile.to_vec());
    }

    #[test]
    fn zero_target_or_profile_allocates_nothing() {
        assert_eq!(LevelCut.allocate(&[1.0, 2.0], 0.0, "k", Direction::Charge), vec![0.0, 0.0]);
        assert_eq!(Proportional.allocate(&[0.0, 0.0], 1.0, "k", Direction::Charge), vec![0.0, 0.0]);
    }

    #[test]
    fn proportional_scales_uniformly() {
        let a = Proportional.allocate(&[1.0, 3.0], 2.0, "k", Direction::Discharge);
        assert_eq!(a, vec![0.5, 1.5]);
    }

    #[test]
    fn closures_are_shape_extractors() {
        let first_slot = |profile: &[f64], target: f64, _: &str, _: Direction| {
            let mut a = vec![0.0; profile.len()];
            a[0] = target.min(profile[0]);
            a
        };
        assert_eq!(first_slot.allocate(&[2.0, 1.0], 1.5, "k", Direction::Charge), vec![1.5, 0.0]);
    }

    #[test]
    fn shape_from_name() {
        for name in Shape::MODELS {
            let shape = Shape::from_name(name).expect("known model");
            assert_eq!(shape.to_string(), *name);
        }
        assert!(Shape::from_name("spline").is_none());
    }
}
