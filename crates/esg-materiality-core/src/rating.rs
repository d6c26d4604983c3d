use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::{
    classify_normalized_quadrant, classify_raw_priority, is_material, normalize,
    NormalizedPosition, Quadrant, RawPriority, BUSINESS_IMPACT_MAX, BUSINESS_IMPACT_MIN,
    STAKEHOLDER_IMPORTANCE_MAX, STAKEHOLDER_IMPORTANCE_MIN,
};
use crate::topic::Topic;

/// Business impact used when an assessment carries no usable sub-score.
pub const DEFAULT_BUSINESS_IMPACT: f64 = 5.0;

/// Admitted ratings keyed by topic id.
pub type RatingMap = BTreeMap<String, Rating>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingField {
    StakeholderImportance,
    BusinessImpact,
    FinancialImpact,
    OperationalImpact,
    ReputationImpact,
    StrategicImpact,
}

impl RatingField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StakeholderImportance => "stakeholder_importance",
            Self::BusinessImpact => "business_impact",
            Self::FinancialImpact => "financial_impact",
            Self::OperationalImpact => "operational_impact",
            Self::ReputationImpact => "reputation_impact",
            Self::StrategicImpact => "strategic_impact",
        }
    }

    pub fn domain(self) -> (f64, f64) {
        match self {
            Self::StakeholderImportance => (STAKEHOLDER_IMPORTANCE_MIN, STAKEHOLDER_IMPORTANCE_MAX),
            _ => (BUSINESS_IMPACT_MIN, BUSINESS_IMPACT_MAX),
        }
    }
}

impl fmt::Display for RatingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RatingError {
    #[error("topic {topic_id}: {field} must be within [{min}, {max}], got {value}")]
    OutOfDomain {
        topic_id: String,
        field: RatingField,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("topic {topic_id}: {field} must be a finite number")]
    NonFinite { topic_id: String, field: RatingField },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown input policy: {0} (expected reject, clamp or permissive)")]
pub struct ParsePolicyError(pub String);

/// How out-of-domain scores are admitted. Non-finite values are refused
/// under every policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputPolicy {
    #[default]
    Reject,
    Clamp,
    Permissive,
}

impl InputPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Clamp => "clamp",
            Self::Permissive => "permissive",
        }
    }

    pub fn admit(self, topic_id: &str, field: RatingField, value: f64) -> Result<f64, RatingError> {
        if !value.is_finite() {
            return Err(RatingError::NonFinite {
                topic_id: topic_id.to_string(),
                field,
            });
        }
        let (min, max) = field.domain();
        if (min..=max).contains(&value) {
            return Ok(value);
        }
        match self {
            Self::Reject => Err(RatingError::OutOfDomain {
                topic_id: topic_id.to_string(),
                field,
                value,
                min,
                max,
            }),
            Self::Clamp => Ok(value.clamp(min, max)),
            Self::Permissive => Ok(value),
        }
    }
}

impl FromStr for InputPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" | "strict" => Ok(Self::Reject),
            "clamp" => Ok(Self::Clamp),
            "permissive" | "passthrough" => Ok(Self::Permissive),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}

/// One scored data point for a topic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    #[serde(alias = "stakeholder_importance")]
    pub stakeholder_importance: f64,
    #[serde(alias = "business_impact")]
    pub business_impact: f64,
}

impl Rating {
    pub fn new(stakeholder_importance: f64, business_impact: f64) -> Self {
        Self {
            stakeholder_importance,
            business_impact,
        }
    }

    pub fn checked(
        topic_id: &str,
        stakeholder_importance: f64,
        business_impact: f64,
        policy: InputPolicy,
    ) -> Result<Self, RatingError> {
        Ok(Self {
            stakeholder_importance: policy.admit(
                topic_id,
                RatingField::StakeholderImportance,
                stakeholder_importance,
            )?,
            business_impact: policy.admit(topic_id, RatingField::BusinessImpact, business_impact)?,
        })
    }

    pub fn position(&self) -> NormalizedPosition {
        normalize(self.business_impact, self.stakeholder_importance)
    }

    pub fn quadrant(&self) -> Quadrant {
        let pos = self.position();
        classify_normalized_quadrant(pos.x, pos.y)
    }

    pub fn raw_priority(&self) -> Option<RawPriority> {
        classify_raw_priority(self.stakeholder_importance, self.business_impact)
    }

    pub fn is_material(&self) -> bool {
        is_material(self.stakeholder_importance, self.business_impact)
    }
}

/// Four optional sub-scores, each on the 0-10 business impact scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessImpactAssessment {
    #[serde(default, alias = "financialImpact")]
    pub financial: Option<f64>,
    #[serde(default, alias = "operationalImpact")]
    pub operational: Option<f64>,
    #[serde(default, alias = "reputationImpact")]
    pub reputation: Option<f64>,
    #[serde(default, alias = "strategicImpact")]
    pub strategic: Option<f64>,
}

impl BusinessImpactAssessment {
    fn fields(&self) -> [(RatingField, Option<f64>); 4] {
        [
            (RatingField::FinancialImpact, self.financial),
            (RatingField::OperationalImpact, self.operational),
            (RatingField::ReputationImpact, self.reputation),
            (RatingField::StrategicImpact, self.strategic),
        ]
    }

    /// Mean of the sub-scores that are present and finite, or
    /// [`DEFAULT_BUSINESS_IMPACT`] when there are none.
    pub fn derive_business_impact(&self) -> f64 {
        mean_or_default(self.fields().into_iter().filter_map(|(_, v)| v))
    }

    /// Same derivation with every usable sub-score passed through `policy`
    /// first. NaN and infinite sub-scores count as absent.
    pub fn resolve(&self, topic_id: &str, policy: InputPolicy) -> Result<f64, RatingError> {
        let mut admitted = Vec::with_capacity(4);
        for (field, value) in self.fields() {
            let Some(value) = value.filter(|v| v.is_finite()) else {
                continue;
            };
            admitted.push(policy.admit(topic_id, field, value)?);
        }
        Ok(mean_or_default(admitted.into_iter()))
    }
}

fn mean_or_default(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 0_u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        DEFAULT_BUSINESS_IMPACT
    } else {
        sum / f64::from(count)
    }
}

/// A rating as collected from an input process. Either axis may still be
/// missing; business impact may arrive as sub-scores instead of a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingDraft {
    #[serde(default, alias = "stakeholder_importance")]
    pub stakeholder_importance: Option<f64>,
    #[serde(default, alias = "business_impact")]
    pub business_impact: Option<f64>,
    #[serde(default, alias = "impact_assessment")]
    pub impact_assessment: Option<BusinessImpactAssessment>,
}

impl RatingDraft {
    pub fn from_rating(rating: Rating) -> Self {
        Self {
            stakeholder_importance: Some(rating.stakeholder_importance),
            business_impact: Some(rating.business_impact),
            impact_assessment: None,
        }
    }

    /// `Ok(None)` means the topic stays unrated. Completeness is decided
    /// before any value goes through `policy`.
    pub fn resolve(&self, topic_id: &str, policy: InputPolicy) -> Result<Option<Rating>, RatingError> {
        let Some(importance) = self.stakeholder_importance else {
            return Ok(None);
        };
        if self.business_impact.is_none() && self.impact_assessment.is_none() {
            return Ok(None);
        }

        let stakeholder_importance =
            policy.admit(topic_id, RatingField::StakeholderImportance, importance)?;
        let business_impact = match (self.business_impact, &self.impact_assessment) {
            (Some(value), _) => policy.admit(topic_id, RatingField::BusinessImpact, value)?,
            (None, Some(assessment)) => assessment.resolve(topic_id, policy)?,
            (None, None) => return Ok(None),
        };

        Ok(Some(Rating {
            stakeholder_importance,
            business_impact,
        }))
    }
}

/// Admits the drafts that belong to a catalog topic, dropping the ones that
/// stay unrated. Drafts for ids outside `catalog` are never admitted.
pub fn resolve_ratings(
    catalog: &[Topic],
    drafts: &BTreeMap<String, RatingDraft>,
    policy: InputPolicy,
) -> Result<RatingMap, RatingError> {
    let mut out = RatingMap::new();
    for topic in catalog {
        let Some(draft) = drafts.get(&topic.id) else {
            continue;
        };
        if let Some(rating) = draft.resolve(&topic.id, policy)? {
            out.insert(topic.id.clone(), rating);
        }
    }
    Ok(out)
}
