use esg_materiality_core::{catalog_colors, Category, Framework, Topic};
use serde_json::{json, Value};

pub const CATALOG_ID: &str = "esg-materiality-topics";
pub const CATALOG_URI: &str = "esg://catalog/topics.json";
pub const CATALOG_MIME_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy)]
pub struct TopicDef {
    pub id: &'static str,
    pub name: &'static str,
    pub category: Category,
    pub framework: Framework,
}

impl TopicDef {
    pub fn to_topic(&self) -> Topic {
        Topic::new(self.id, self.name, self.category, self.framework)
    }
}

const fn def(
    id: &'static str,
    name: &'static str,
    category: Category,
    framework: Framework,
) -> TopicDef {
    TopicDef {
        id,
        name,
        category,
        framework,
    }
}

// Order is part of the contract: matrix colors are derived from position.
static TOPICS: [TopicDef; 24] = [
    def("ghg-emissions", "GHG Emissions", Category::Environmental, Framework::Sasb),
    def("energy-management", "Energy Management", Category::Environmental, Framework::Sasb),
    def("water-management", "Water & Wastewater Management", Category::Environmental, Framework::Sasb),
    def("waste-management", "Waste & Hazardous Materials", Category::Environmental, Framework::Sasb),
    def("biodiversity", "Biodiversity & Ecological Impacts", Category::Environmental, Framework::Gri),
    def("air-quality", "Air Quality", Category::Environmental, Framework::Sasb),
    def("climate-risk", "Physical & Transition Climate Risk", Category::Environmental, Framework::Tcfd),
    def("circular-economy", "Circular Economy & Product Lifecycle", Category::Environmental, Framework::Custom),
    def("labor-practices", "Labor Practices", Category::Social, Framework::Sasb),
    def("health-safety", "Employee Health & Safety", Category::Social, Framework::Sasb),
    def("diversity-inclusion", "Diversity, Equity & Inclusion", Category::Social, Framework::Gri),
    def("human-rights", "Human Rights & Community Relations", Category::Social, Framework::Sasb),
    def("data-privacy", "Customer Privacy & Data Security", Category::Social, Framework::Sasb),
    def("product-safety", "Product Quality & Safety", Category::Social, Framework::Sasb),
    def("talent-development", "Training & Talent Development", Category::Social, Framework::Gri),
    def("access-affordability", "Access & Affordability", Category::Social, Framework::Sasb),
    def("business-ethics", "Business Ethics", Category::Governance, Framework::Sasb),
    def("board-composition", "Board Composition & Independence", Category::Governance, Framework::Gri),
    def("executive-compensation", "Executive Compensation", Category::Governance, Framework::Gri),
    def("risk-management", "Systemic Risk Management", Category::Governance, Framework::Sasb),
    def("supply-chain", "Supply Chain Management", Category::Governance, Framework::Sasb),
    def("regulatory-compliance", "Management of the Legal & Regulatory Environment", Category::Governance, Framework::Sasb),
    def("anti-corruption", "Anti-Corruption", Category::Governance, Framework::Gri),
    def("climate-governance", "Climate Governance & Oversight", Category::Governance, Framework::Tcfd),
];

pub fn topics() -> &'static [TopicDef] {
    &TOPICS
}

pub fn to_topics() -> Vec<Topic> {
    topics().iter().map(TopicDef::to_topic).collect()
}

/// Catalog entries with their matrix colors, as served under [`CATALOG_URI`].
pub fn catalog_json(catalog: &[Topic]) -> Value {
    let colors = catalog_colors(catalog.len());
    let entries = catalog
        .iter()
        .zip(colors)
        .enumerate()
        .map(|(index, (topic, color))| {
            json!({
                "index": index,
                "id": topic.id,
                "name": topic.name,
                "category": topic.category,
                "framework": topic.framework,
                "color": color
            })
        })
        .collect::<Vec<_>>();
    json!({
        "catalog_id": CATALOG_ID,
        "count": entries.len(),
        "topics": entries
    })
}

pub fn resource_text(uri: &str) -> Option<String> {
    if uri != CATALOG_URI {
        return None;
    }
    serde_json::to_string_pretty(&catalog_json(&to_topics())).ok()
}
