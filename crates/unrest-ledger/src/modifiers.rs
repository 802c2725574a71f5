//! Morale to production and recruitment multipliers.
//!
//! Both are linear maps over the clamped morale range.

use unrest_types::{MORALE_MAX, clamp_morale};

/// Production multiplier at morale 0.
pub const PRODUCTION_MODIFIER_MIN: f64 = 0.70;
/// Production multiplier at morale 100.
pub const PRODUCTION_MODIFIER_MAX: f64 = 1.25;
/// Recruitment multiplier at morale 0.
pub const RECRUITMENT_MODIFIER_MIN: f64 = 0.75;
/// Recruitment multiplier at morale 100.
pub const RECRUITMENT_MODIFIER_MAX: f64 = 1.20;

fn lerp(min: f64, max: f64, morale: f64) -> f64 {
    let t = clamp_morale(morale) / MORALE_MAX;
    (max - min).mul_add(t, min)
}

/// Map morale in `[0, 100]` to a production multiplier in `[0.70, 1.25]`.
pub fn calculate_morale_production_modifier(morale: f64) -> f64 {
    lerp(PRODUCTION_MODIFIER_MIN, PRODUCTION_MODIFIER_MAX, morale)
}

/// Map morale in `[0, 100]` to a recruitment multiplier in `[0.75, 1.20]`.
pub fn calculate_morale_recruitment_modifier(morale: f64) -> f64 {
    lerp(RECRUITMENT_MODIFIER_MIN, RECRUITMENT_MODIFIER_MAX, morale)
}
