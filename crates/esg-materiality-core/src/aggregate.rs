use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::rating::{Rating, RatingMap};
use crate::scoring::{Quadrant, RawPriority};
use crate::topic::{Category, Topic};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassifiedTopic<'a> {
    pub topic_id: &'a str,
    pub normalized_x: f64,
    pub normalized_y: f64,
    pub quadrant: Quadrant,
}

/// A rated catalog topic with its metadata attached.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedTopic<'a> {
    pub topic: &'a Topic,
    pub rating: Rating,
}

// Flat snake_case record, matching the classified-topic output.
impl Serialize for GroupedTopic<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_struct("GroupedTopic", 6)?;
        out.serialize_field("id", &self.topic.id)?;
        out.serialize_field("name", &self.topic.name)?;
        out.serialize_field("category", &self.topic.category)?;
        out.serialize_field("framework", &self.topic.framework)?;
        out.serialize_field("stakeholder_importance", &self.rating.stakeholder_importance)?;
        out.serialize_field("business_impact", &self.rating.business_impact)?;
        out.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuadrantBuckets<'a> {
    pub high_priority: Vec<GroupedTopic<'a>>,
    pub monitor: Vec<GroupedTopic<'a>>,
    pub consider: Vec<GroupedTopic<'a>>,
    pub low_priority: Vec<GroupedTopic<'a>>,
}

impl<'a> QuadrantBuckets<'a> {
    pub fn bucket(&self, quadrant: Quadrant) -> &[GroupedTopic<'a>] {
        match quadrant {
            Quadrant::HighPriority => &self.high_priority,
            Quadrant::Monitor => &self.monitor,
            Quadrant::Consider => &self.consider,
            Quadrant::LowPriority => &self.low_priority,
        }
    }

    fn bucket_mut(&mut self, quadrant: Quadrant) -> &mut Vec<GroupedTopic<'a>> {
        match quadrant {
            Quadrant::HighPriority => &mut self.high_priority,
            Quadrant::Monitor => &mut self.monitor,
            Quadrant::Consider => &mut self.consider,
            Quadrant::LowPriority => &mut self.low_priority,
        }
    }
}

/// Final-matrix grouping. Topics outside the three raw buckets are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriorityGroups<'a> {
    pub high_priority: Vec<GroupedTopic<'a>>,
    pub monitor: Vec<GroupedTopic<'a>>,
    pub consider: Vec<GroupedTopic<'a>>,
}

impl<'a> PriorityGroups<'a> {
    pub fn group(&self, priority: RawPriority) -> &[GroupedTopic<'a>] {
        match priority {
            RawPriority::High => &self.high_priority,
            RawPriority::Monitor => &self.monitor,
            RawPriority::Consider => &self.consider,
        }
    }

    fn group_mut(&mut self, priority: RawPriority) -> &mut Vec<GroupedTopic<'a>> {
        match priority {
            RawPriority::High => &mut self.high_priority,
            RawPriority::Monitor => &mut self.monitor,
            RawPriority::Consider => &mut self.consider,
        }
    }
}

/// Record handed to strategy seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialTopic {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub stakeholder_importance: f64,
    pub business_impact: f64,
    pub priority: RawPriority,
}

/// Catalog topics that carry a rating, in catalog order.
pub fn rated_topics<'a>(
    catalog: &'a [Topic],
    ratings: &'a RatingMap,
) -> impl Iterator<Item = (&'a Topic, Rating)> + 'a {
    catalog
        .iter()
        .filter_map(move |topic| ratings.get(&topic.id).map(|rating| (topic, *rating)))
}

pub fn unrated_topic_ids<'a>(catalog: &'a [Topic], ratings: &RatingMap) -> Vec<&'a str> {
    catalog
        .iter()
        .filter(|topic| !ratings.contains_key(&topic.id))
        .map(|topic| topic.id.as_str())
        .collect()
}

/// Rating keys with no matching catalog topic. They never reach any output.
pub fn unknown_rating_ids<'a, V>(
    catalog: &[Topic],
    ratings: &'a BTreeMap<String, V>,
) -> Vec<&'a str> {
    ratings
        .keys()
        .filter(|id| !catalog.iter().any(|topic| &topic.id == *id))
        .map(String::as_str)
        .collect()
}

pub fn classify_topic<'a>(topic_id: &'a str, rating: &Rating) -> ClassifiedTopic<'a> {
    let pos = rating.position();
    ClassifiedTopic {
        topic_id,
        normalized_x: pos.x,
        normalized_y: pos.y,
        quadrant: rating.quadrant(),
    }
}

pub fn classify_topics<'a>(catalog: &'a [Topic], ratings: &'a RatingMap) -> Vec<ClassifiedTopic<'a>> {
    rated_topics(catalog, ratings)
        .map(|(topic, rating)| classify_topic(&topic.id, &rating))
        .collect()
}

pub fn quadrant_buckets<'a>(catalog: &'a [Topic], ratings: &'a RatingMap) -> QuadrantBuckets<'a> {
    let mut buckets = QuadrantBuckets::default();
    for (topic, rating) in rated_topics(catalog, ratings) {
        buckets
            .bucket_mut(rating.quadrant())
            .push(GroupedTopic { topic, rating });
    }
    buckets
}

pub fn priority_groups<'a>(catalog: &'a [Topic], ratings: &'a RatingMap) -> PriorityGroups<'a> {
    let mut groups = PriorityGroups::default();
    for (topic, rating) in rated_topics(catalog, ratings) {
        if let Some(priority) = rating.raw_priority() {
            groups.group_mut(priority).push(GroupedTopic { topic, rating });
        }
    }
    groups
}

pub fn material_topics(catalog: &[Topic], ratings: &RatingMap) -> Vec<MaterialTopic> {
    rated_topics(catalog, ratings)
        .filter(|(_, rating)| rating.is_material())
        .filter_map(|(topic, rating)| {
            let priority = rating.raw_priority()?;
            Some(MaterialTopic {
                id: topic.id.clone(),
                name: topic.name.clone(),
                category: topic.category,
                stakeholder_importance: rating.stakeholder_importance,
                business_impact: rating.business_impact,
                priority,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::Framework;

    fn catalog() -> Vec<Topic> {
        vec![
            Topic::new("a", "Alpha", Category::Environmental, Framework::Sasb),
            Topic::new("b", "Beta", Category::Social, Framework::Gri),
            Topic::new("c", "Gamma", Category::Governance, Framework::Tcfd),
        ]
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn end_to_end_scenario() {
        let catalog = catalog();
        let mut ratings = RatingMap::new();
        ratings.insert("a".to_string(), Rating::new(5.0, 9.0));
        ratings.insert("b".to_string(), Rating::new(2.0, 3.0));

        let classified = classify_topics(&catalog, &ratings);
        assert_eq!(classified.len(), 2);

        let a = &classified[0];
        assert_eq!(a.topic_id, "a");
        assert!(approx(a.normalized_x, 90.0));
        assert!(approx(a.normalized_y, 0.0));
        assert_eq!(a.quadrant, Quadrant::HighPriority);

        let b = &classified[1];
        assert_eq!(b.topic_id, "b");
        assert!(approx(b.normalized_x, 30.0));
        assert!(approx(b.normalized_y, 60.0));
        assert_eq!(b.quadrant, Quadrant::LowPriority);

        let groups = priority_groups(&catalog, &ratings);
        assert_eq!(groups.high_priority.len(), 1);
        assert_eq!(groups.high_priority[0].topic.id, "a");
        assert!(groups.monitor.is_empty());
        assert!(groups.consider.is_empty());

        let exported = material_topics(&catalog, &ratings);
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].id, "a");
        assert_eq!(exported[0].priority, RawPriority::High);

        assert_eq!(unrated_topic_ids(&catalog, &ratings), vec!["c"]);
    }

    #[test]
    fn export_uses_or_semantics_and_raw_priority() {
        let catalog = catalog();
        let mut ratings = RatingMap::new();
        ratings.insert("a".to_string(), Rating::new(5.0, 2.0));
        ratings.insert("b".to_string(), Rating::new(1.0, 8.0));
        ratings.insert("c".to_string(), Rating::new(2.0, 3.0));

        let exported = material_topics(&catalog, &ratings);
        let tags = exported
            .iter()
            .map(|t| (t.id.as_str(), t.priority))
            .collect::<Vec<_>>();
        assert_eq!(
            tags,
            vec![("a", RawPriority::Monitor), ("b", RawPriority::Consider)]
        );
    }

    #[test]
    fn quadrant_buckets_cover_every_rated_topic() {
        let catalog = catalog();
        let mut ratings = RatingMap::new();
        ratings.insert("a".to_string(), Rating::new(5.0, 9.0));
        ratings.insert("b".to_string(), Rating::new(2.0, 3.0));
        ratings.insert("c".to_string(), Rating::new(4.0, 2.0));

        let buckets = quadrant_buckets(&catalog, &ratings);
        let total: usize = Quadrant::ALL.iter().map(|q| buckets.bucket(*q).len()).sum();
        assert_eq!(total, 3);
        assert_eq!(buckets.bucket(Quadrant::Monitor)[0].topic.id, "c");
        assert_eq!(buckets.bucket(Quadrant::LowPriority)[0].topic.id, "b");
    }

    #[test]
    fn grouped_topics_serialize_flat_snake_case() {
        let catalog = catalog();
        let mut ratings = RatingMap::new();
        ratings.insert("a".to_string(), Rating::new(5.0, 9.0));
        let groups = priority_groups(&catalog, &ratings);
        let json = serde_json::to_value(&groups).expect("serialize");
        let entry = &json["high_priority"][0];
        assert_eq!(entry["id"], "a");
        assert_eq!(entry["name"], "Alpha");
        assert_eq!(entry["business_impact"], 9.0);
        assert_eq!(entry["stakeholder_importance"], 5.0);
        assert!(entry.get("businessImpact").is_none());
    }

    #[test]
    fn ratings_for_unknown_topics_are_ignored() {
        let catalog = catalog();
        let mut ratings = RatingMap::new();
        ratings.insert("zzz".to_string(), Rating::new(5.0, 10.0));

        assert!(classify_topics(&catalog, &ratings).is_empty());
        assert!(material_topics(&catalog, &ratings).is_empty());
        assert_eq!(unknown_rating_ids(&catalog, &ratings), vec!["zzz"]);
    }

    #[test]
    fn aggregation_leaves_ratings_untouched() {
        let catalog = catalog();
        let mut ratings = RatingMap::new();
        ratings.insert("a".to_string(), Rating::new(4.5, 7.5));
        let before = ratings.clone();

        let _ = classify_topics(&catalog, &ratings);
        let _ = priority_groups(&catalog, &ratings);
        let _ = material_topics(&catalog, &ratings);
        assert_eq!(ratings, before);
    }

    #[test]
    fn material_topic_record_has_strategy_contract_shape() {
        let catalog = catalog();
        let mut ratings = RatingMap::new();
        ratings.insert("a".to_string(), Rating::new(4.0, 7.0));
        let exported = material_topics(&catalog, &ratings);
        let json = serde_json::to_value(&exported[0]).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "id": "a",
                "name": "Alpha",
                "category": "Environmental",
                "stakeholderImportance": 4.0,
                "businessImpact": 7.0,
                "priority": "high"
            })
        );
    }

    #[test]
    fn grouped_topic_flattens_metadata_and_scores() {
        let catalog = catalog();
        let mut ratings = RatingMap::new();
        ratings.insert("b".to_string(), Rating::new(4.0, 9.0));
        let groups = priority_groups(&catalog, &ratings);
        let json = serde_json::to_value(&groups).expect("serialize");
        assert_eq!(json["high_priority"][0]["id"], "b");
        assert_eq!(json["high_priority"][0]["framework"], "GRI");
        assert_eq!(json["high_priority"][0]["businessImpact"], 9.0);
    }
}
