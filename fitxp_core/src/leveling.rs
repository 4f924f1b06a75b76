//! XP and level curve.
//!
//! One geometric curve is used: reaching level `L >= 2` requires
//! `round(base * scaling^(L-1))` cumulative XP, and level 1 starts at 0.
//! Profiles record [`LEVEL_CURVE_VERSION`] so a later curve change can be
//! detected and migrated.

use crate::config::LevelingConfig;
use serde::Serialize;

/// Version tag of the curve implemented here
pub const LEVEL_CURVE_VERSION: u32 = 1;

/// Highest reachable level
pub const MAX_LEVEL: u32 = 1000;

pub(crate) fn default_curve_version() -> u32 {
    LEVEL_CURVE_VERSION
}

/// Milestone titles, sorted by level
const TITLES: &[(u32, &str)] = &[
    (1, "Couch Starter"),
    (5, "Warm-Up Rookie"),
    (10, "Gym Regular"),
    (15, "Iron Apprentice"),
    (20, "Rep Machine"),
    (25, "Steady Lifter"),
    (30, "Endurance Seeker"),
    (35, "Power Builder"),
    (40, "Strength Adept"),
    (45, "Conditioning Pro"),
    (50, "Iron Veteran"),
    (55, "Peak Performer"),
    (60, "Elite Athlete"),
    (65, "Titan in Training"),
    (70, "Iron Master"),
    (75, "Champion"),
    (80, "Grand Champion"),
    (85, "Legend in Motion"),
    (90, "Mythic Athlete"),
    (95, "Olympian"),
    (100, "Immortal"),
];

/// Where a total XP value sits on the curve
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LevelProgress {
    pub level: u32,
    /// XP still needed for the next level (0 at [`MAX_LEVEL`])
    pub xp_to_next: f64,
    /// Progress through the current level, 0-100, two decimals
    pub progress_percent: f64,
}

/// Geometric level curve
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelCurve {
    base: f64,
    scaling: f64,
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self {
            base: 1000.0,
            scaling: 1.2,
        }
    }
}

impl From<&LevelingConfig> for LevelCurve {
    fn from(config: &LevelingConfig) -> Self {
        Self::new(config.base, config.scaling)
    }
}

impl LevelCurve {
    /// Build a curve; unusable parameters fall back to the default curve
    pub fn new(base: f64, scaling: f64) -> Self {
        match Self::check(base, scaling) {
            Ok(curve) => curve,
            Err(reason) => {
                tracing::warn!("Invalid level curve: {}, using default", reason);
                Self::default()
            }
        }
    }

    /// Accept a curve only if every threshold up to [`MAX_LEVEL`] is finite
    /// and strictly above the previous one after rounding.
    pub fn check(base: f64, scaling: f64) -> std::result::Result<Self, String> {
        if !(base.is_finite() && base > 0.0) {
            return Err(format!("base must be positive, got {}", base));
        }
        if !(scaling.is_finite() && scaling > 1.0) {
            return Err(format!("scaling must be greater than 1, got {}", scaling));
        }

        let curve = Self { base, scaling };
        let mut previous = curve.xp_required_for_level(1);
        for level in 2..=MAX_LEVEL {
            let threshold = curve.xp_required_for_level(level);
            if !threshold.is_finite() {
                return Err(format!(
                    "scaling {} with base {} overflows before level {}",
                    scaling, base, MAX_LEVEL
                ));
            }
            if threshold <= previous {
                return Err(format!(
                    "scaling {} with base {} gives levels {} and {} the same threshold",
                    scaling,
                    base,
                    level - 1,
                    level
                ));
            }
            previous = threshold;
        }
        Ok(curve)
    }

    /// Cumulative XP needed to reach `level`
    pub fn xp_required_for_level(&self, level: u32) -> f64 {
        if level <= 1 {
            return 0.0;
        }
        (self.base * self.scaling.powf(f64::from(level - 1))).round()
    }

    /// Largest level whose threshold does not exceed `total_xp`
    pub fn level_from_xp(&self, total_xp: f64) -> LevelProgress {
        let level = self.level_for(total_xp);

        if level >= MAX_LEVEL {
            return LevelProgress {
                level: MAX_LEVEL,
                xp_to_next: 0.0,
                progress_percent: 100.0,
            };
        }

        let xp = if total_xp.is_finite() && total_xp > 0.0 {
            total_xp
        } else {
            0.0
        };
        let current = self.xp_required_for_level(level);
        let next = self.xp_required_for_level(level + 1);
        let progress = (xp - current) / (next - current) * 100.0;

        LevelProgress {
            level,
            xp_to_next: next - xp,
            progress_percent: (progress * 100.0).round() / 100.0,
        }
    }

    fn level_for(&self, total_xp: f64) -> u32 {
        if total_xp.is_nan() || total_xp < self.xp_required_for_level(2) {
            return 1;
        }
        if total_xp.is_infinite() {
            return MAX_LEVEL;
        }

        // Solve base * scaling^(L-1) = xp, then correct for rounding
        let estimate = ((total_xp / self.base).ln() / self.scaling.ln()).floor() + 1.0;
        let mut level = estimate.clamp(1.0, f64::from(MAX_LEVEL)) as u32;

        while level < MAX_LEVEL && self.xp_required_for_level(level + 1) <= total_xp {
            level += 1;
        }
        while level > 1 && self.xp_required_for_level(level) > total_xp {
            level -= 1;
        }
        level
    }
}

/// Cumulative XP needed to reach `level` on the default curve
pub fn xp_required_for_level(level: u32) -> f64 {
    LevelCurve::default().xp_required_for_level(level)
}

/// Level, XP to next level and progress on the default curve
pub fn level_from_xp(total_xp: f64) -> LevelProgress {
    LevelCurve::default().level_from_xp(total_xp)
}

/// Title for a level: the nearest milestone at or below it
pub fn title_for_level(level: u32) -> String {
    TITLES
        .iter()
        .rev()
        .find(|(milestone, _)| *milestone <= level)
        .map(|(_, title)| (*title).to_string())
        .unwrap_or_else(|| format!("Level {}", level))
}
