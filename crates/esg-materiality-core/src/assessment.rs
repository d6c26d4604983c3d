use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{material_topics, MaterialTopic};
use crate::rating::{resolve_ratings, InputPolicy, RatingDraft, RatingError, RatingMap};
use crate::topic::Topic;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryContext {
    #[serde(default)]
    pub industry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_industry: Option<String>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
}

/// Everything an assessment run needs, as one serializable value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentState {
    #[serde(default)]
    pub industry_context: IndustryContext,
    #[serde(default)]
    pub ratings: BTreeMap<String, RatingDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentMetadata {
    pub assessed_at_ms: u64,
    pub catalog_size: usize,
    pub rated_topics: usize,
    pub material_topic_count: usize,
    pub input_policy: InputPolicy,
    pub engine_version: String,
}

/// The blob stored under the assessment storage key and read by strategy
/// seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedAssessment {
    pub industry_context: IndustryContext,
    pub material_topics: Vec<MaterialTopic>,
    pub assessment_metadata: AssessmentMetadata,
}

impl AssessmentState {
    pub fn resolve_ratings(
        &self,
        catalog: &[Topic],
        policy: InputPolicy,
    ) -> Result<RatingMap, RatingError> {
        resolve_ratings(catalog, &self.ratings, policy)
    }

    pub fn material_topics(
        &self,
        catalog: &[Topic],
        policy: InputPolicy,
    ) -> Result<Vec<MaterialTopic>, RatingError> {
        let ratings = self.resolve_ratings(catalog, policy)?;
        Ok(material_topics(catalog, &ratings))
    }

    pub fn to_persisted(
        &self,
        catalog: &[Topic],
        policy: InputPolicy,
        now_ms: u64,
    ) -> Result<PersistedAssessment, RatingError> {
        let ratings = self.resolve_ratings(catalog, policy)?;
        let rated_topics = catalog
            .iter()
            .filter(|topic| ratings.contains_key(&topic.id))
            .count();
        let material = material_topics(catalog, &ratings);
        Ok(PersistedAssessment {
            industry_context: self.industry_context.clone(),
            assessment_metadata: AssessmentMetadata {
                assessed_at_ms: now_ms,
                catalog_size: catalog.len(),
                rated_topics,
                material_topic_count: material.len(),
                input_policy: policy,
                engine_version: ENGINE_VERSION.to_string(),
            },
            material_topics: material,
        })
    }
}
