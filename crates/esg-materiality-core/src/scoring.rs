use serde::{Deserialize, Serialize};

pub const STAKEHOLDER_IMPORTANCE_MIN: f64 = 1.0;
pub const STAKEHOLDER_IMPORTANCE_MAX: f64 = 5.0;
pub const BUSINESS_IMPACT_MIN: f64 = 0.0;
pub const BUSINESS_IMPACT_MAX: f64 = 10.0;

/// Center line of the normalized [0, 100] plane on both axes.
pub const QUADRANT_MIDPOINT: f64 = 50.0;

pub const HIGH_IMPORTANCE_THRESHOLD: f64 = 4.0;
pub const HIGH_IMPACT_THRESHOLD: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    HighPriority,
    Monitor,
    Consider,
    LowPriority,
}

impl Quadrant {
    pub const ALL: [Self; 4] = [
        Self::HighPriority,
        Self::Monitor,
        Self::Consider,
        Self::LowPriority,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HighPriority => "high_priority",
            Self::Monitor => "monitor",
            Self::Consider => "consider",
            Self::LowPriority => "low_priority",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::HighPriority => "High Priority",
            Self::Monitor => "Monitor",
            Self::Consider => "Consider",
            Self::LowPriority => "Low Priority",
        }
    }
}

/// Priority tag produced by thresholding raw scores. Wire form is the
/// lowercase tag expected by strategy seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawPriority {
    High,
    Monitor,
    Consider,
}

impl RawPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Monitor => "monitor",
            Self::Consider => "consider",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High Priority",
            Self::Monitor => "Monitor",
            Self::Consider => "Consider",
        }
    }
}

/// Maps raw scores onto the [0, 100] plane. The y axis is inverted so that
/// higher stakeholder importance plots toward the top. Inputs are not clamped.
pub fn normalize(business_impact: f64, stakeholder_importance: f64) -> NormalizedPosition {
    let x = (business_impact / BUSINESS_IMPACT_MAX) * 100.0;
    let y = 100.0 - (stakeholder_importance / STAKEHOLDER_IMPORTANCE_MAX) * 100.0;
    NormalizedPosition { x, y }
}

/// Strict comparisons against the midpoint; any coordinate sitting exactly
/// on 50 falls through to `LowPriority`.
pub fn classify_normalized_quadrant(x: f64, y: f64) -> Quadrant {
    if x > QUADRANT_MIDPOINT && y < QUADRANT_MIDPOINT {
        Quadrant::HighPriority
    } else if x < QUADRANT_MIDPOINT && y < QUADRANT_MIDPOINT {
        Quadrant::Monitor
    } else if x > QUADRANT_MIDPOINT && y > QUADRANT_MIDPOINT {
        Quadrant::Consider
    } else {
        Quadrant::LowPriority
    }
}

/// Thresholds raw scores directly. Not interchangeable with
/// [`classify_normalized_quadrant`]: the two use different scales and
/// different boundary rules.
pub fn classify_raw_priority(
    stakeholder_importance: f64,
    business_impact: f64,
) -> Option<RawPriority> {
    let important = stakeholder_importance >= HIGH_IMPORTANCE_THRESHOLD;
    let impactful = business_impact >= HIGH_IMPACT_THRESHOLD;
    match (important, impactful) {
        (true, true) => Some(RawPriority::High),
        (true, false) => Some(RawPriority::Monitor),
        (false, true) => Some(RawPriority::Consider),
        (false, false) => None,
    }
}

/// Material-topic filter. Either axis alone qualifies.
pub fn is_material(stakeholder_importance: f64, business_impact: f64) -> bool {
    stakeholder_importance >= HIGH_IMPORTANCE_THRESHOLD || business_impact >= HIGH_IMPACT_THRESHOLD
}
