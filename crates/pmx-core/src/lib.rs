use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub mod checklist;

/// One row of the priority matrix: a single recommendation and its completion flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub id: i64,
    pub item_number: i64,
    pub recommendation: String,
    pub pillar: String,
    pub effort: String,
    pub cost_impact: String,
    pub business_value: String,
    pub priority_level: String,
    pub category: String,
    pub technical_category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub implementation_steps: Option<String>,
    #[serde(default)]
    pub dependencies: Option<String>,
    #[serde(default)]
    pub technical_notes: Option<String>,
    #[serde(default)]
    pub related_services: Option<String>,
    #[serde(default)]
    pub compliance_notes: Option<String>,
    #[serde(
        default,
        serialize_with = "serialize_flag",
        deserialize_with = "deserialize_flag"
    )]
    pub is_checked: bool,
}

impl RecommendationItem {
    pub fn priority(&self) -> PriorityLevel {
        self.priority_level.parse().unwrap_or_default()
    }

    pub fn technical(&self) -> TechnicalCategory {
        self.technical_category.parse().unwrap_or_default()
    }

    pub fn pillar_kind(&self) -> Option<Pillar> {
        self.pillar.parse().ok()
    }

    /// Long-form detail sections that are present, in display order.
    pub fn detail_sections(&self) -> Vec<(&'static str, &str)> {
        [
            ("Description", &self.description),
            ("Implementation Steps", &self.implementation_steps),
            ("Dependencies", &self.dependencies),
            ("Technical Notes", &self.technical_notes),
            ("Related Services", &self.related_services),
            ("Compliance Notes", &self.compliance_notes),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_deref().map(|text| (label, text)))
        .filter(|(_, text)| !text.trim().is_empty())
        .collect()
    }
}

/// Catalog entry as shipped in the seed file; ids are assigned when seeding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub item_number: i64,
    pub recommendation: String,
    pub pillar: String,
    pub effort: String,
    pub cost_impact: String,
    pub business_value: String,
    pub priority_level: String,
    pub category: String,
    pub technical_category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub implementation_steps: Option<String>,
    #[serde(default)]
    pub dependencies: Option<String>,
    #[serde(default)]
    pub technical_notes: Option<String>,
    #[serde(default)]
    pub related_services: Option<String>,
    #[serde(default)]
    pub compliance_notes: Option<String>,
}

impl CatalogEntry {
    pub fn into_item(self, id: i64) -> RecommendationItem {
        RecommendationItem {
            id,
            item_number: self.item_number,
            recommendation: self.recommendation,
            pillar: self.pillar,
            effort: self.effort,
            cost_impact: self.cost_impact,
            business_value: self.business_value,
            priority_level: self.priority_level,
            category: self.category,
            technical_category: self.technical_category,
            description: self.description,
            implementation_steps: self.implementation_steps,
            dependencies: self.dependencies,
            technical_notes: self.technical_notes,
            related_services: self.related_services,
            compliance_notes: self.compliance_notes,
            is_checked: false,
        }
    }
}

/// Fields accepted when creating an item through the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub item_text: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriorityLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl Default for PriorityLevel {
    fn default() -> Self {
        Self::Medium
    }
}

impl PriorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::Critical => "Critical",
            PriorityLevel::High => "High",
            PriorityLevel::Medium => "Medium",
            PriorityLevel::Low => "Low",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            PriorityLevel::Critical => "🔴",
            PriorityLevel::High => "🟠",
            PriorityLevel::Medium => "🟡",
            PriorityLevel::Low => "🟢",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriorityLevel {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "critical" => Ok(PriorityLevel::Critical),
            "high" => Ok(PriorityLevel::High),
            "medium" => Ok(PriorityLevel::Medium),
            "low" => Ok(PriorityLevel::Low),
            other => Err(format!("Unknown priority level: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pillar {
    Security,
    Reliability,
    Performance,
    Operations,
    Cost,
    Innovation,
}

impl Pillar {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pillar::Security => "Security",
            Pillar::Reliability => "Reliability",
            Pillar::Performance => "Performance",
            Pillar::Operations => "Operations",
            Pillar::Cost => "Cost",
            Pillar::Innovation => "Innovation",
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pillar {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "security" => Ok(Pillar::Security),
            "reliability" => Ok(Pillar::Reliability),
            "performance" => Ok(Pillar::Performance),
            "operations" => Ok(Pillar::Operations),
            "cost" => Ok(Pillar::Cost),
            "innovation" => Ok(Pillar::Innovation),
            other => Err(format!("Unknown pillar: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TechnicalCategory {
    Infrastructure,
    Data,
    AppsAndAi,
    Security,
}

impl Default for TechnicalCategory {
    fn default() -> Self {
        Self::Infrastructure
    }
}

impl TechnicalCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TechnicalCategory::Infrastructure => "Infrastructure",
            TechnicalCategory::Data => "Data",
            TechnicalCategory::AppsAndAi => "Apps & AI",
            TechnicalCategory::Security => "Security",
        }
    }
}

impl fmt::Display for TechnicalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TechnicalCategory {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "infrastructure" => Ok(TechnicalCategory::Infrastructure),
            "data" => Ok(TechnicalCategory::Data),
            "apps & ai" | "apps and ai" | "apps-ai" => Ok(TechnicalCategory::AppsAndAi),
            "security" => Ok(TechnicalCategory::Security),
            other => Err(format!("Unknown technical category: {other}")),
        }
    }
}

/// Parse a completion flag from JSON. Only booleans and the integers 0/1 are accepted.
pub fn parse_checked_flag(value: &serde_json::Value) -> Option<bool> {
    match value {
        serde_json::Value::Bool(flag) => Some(*flag),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn serialize_flag<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*value))
}

/// Accepts `0`/`1` as stored by SQLite as well as plain booleans.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let val = serde_json::Value::deserialize(deserializer)?;
    parse_checked_flag(&val)
        .ok_or_else(|| serde::de::Error::custom("expected boolean or 0/1 for is_checked"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> RecommendationItem {
        CatalogEntry {
            item_number: 3,
            recommendation: "Configure Distributed Tracing".to_string(),
            pillar: "Operations".to_string(),
            effort: "1 week".to_string(),
            cost_impact: "$150/mo".to_string(),
            business_value: "⭐⭐⭐⭐⭐ Faster troubleshooting".to_string(),
            priority_level: "Critical".to_string(),
            category: "CRITICAL PRIORITY (0-30 Days)".to_string(),
            technical_category: "Apps & AI".to_string(),
            description: Some("End-to-end tracing".to_string()),
            implementation_steps: None,
            dependencies: Some("   ".to_string()),
            technical_notes: None,
            related_services: Some("Application Insights".to_string()),
            compliance_notes: None,
        }
        .into_item(3)
    }

    #[test]
    fn is_checked_serializes_as_integer() {
        let mut item = sample();
        let value = serde_json::to_value(&item).expect("serialize");
        assert_eq!(value["is_checked"], json!(0));

        item.is_checked = true;
        let value = serde_json::to_value(&item).expect("serialize");
        assert_eq!(value["is_checked"], json!(1));
    }

    #[test]
    fn is_checked_accepts_bool_and_integer_but_not_other_values() {
        let mut value = serde_json::to_value(sample()).expect("serialize");

        value["is_checked"] = json!(true);
        let item: RecommendationItem = serde_json::from_value(value.clone()).expect("bool");
        assert!(item.is_checked);

        value["is_checked"] = json!(0);
        let item: RecommendationItem = serde_json::from_value(value.clone()).expect("int");
        assert!(!item.is_checked);

        value["is_checked"] = json!(2);
        assert!(serde_json::from_value::<RecommendationItem>(value.clone()).is_err());

        value["is_checked"] = json!("yes");
        assert!(serde_json::from_value::<RecommendationItem>(value).is_err());
    }

    #[test]
    fn enum_fields_fall_back_like_the_matrix_view() {
        let mut item = sample();
        assert_eq!(item.priority(), PriorityLevel::Critical);
        assert_eq!(item.technical(), TechnicalCategory::AppsAndAi);
        assert_eq!(item.pillar_kind(), Some(Pillar::Operations));

        item.priority_level = "urgent".to_string();
        item.technical_category = "Networking".to_string();
        item.pillar = "Sustainability".to_string();
        assert_eq!(item.priority(), PriorityLevel::Medium);
        assert_eq!(item.technical(), TechnicalCategory::Infrastructure);
        assert_eq!(item.pillar_kind(), None);
    }

    #[test]
    fn detail_sections_skip_missing_and_blank_fields() {
        let item = sample();
        let sections = item.detail_sections();
        let labels: Vec<&str> = sections.iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, vec!["Description", "Related Services"]);
    }

    #[test]
    fn new_item_defaults_missing_fields() {
        let item: NewItem = serde_json::from_value(json!({"item_text": "Y"})).expect("parse");
        assert_eq!(item.item_text, "Y");
        assert_eq!(item.category, "");
        assert_eq!(item.description, None);
        assert_eq!(item.priority_level, "");
    }
}
