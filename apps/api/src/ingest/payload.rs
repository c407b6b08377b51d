//! Crafted-résumé payload as produced by the crafting service.
//!
//! The service is loosely typed: scalars arrive as strings, numbers or null and lists may
//! be missing or collapsed into a single comma-separated string. Everything is coerced
//! into owned strings here so the pipeline never has to look at `serde_json::Value`.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CraftedResume {
    #[serde(deserialize_with = "loose_string")]
    pub full_name: String,
    #[serde(deserialize_with = "loose_string")]
    pub email_address: String,
    #[serde(deserialize_with = "loose_string")]
    pub phone_number: String,
    #[serde(deserialize_with = "loose_string")]
    pub home_address: String,
    #[serde(deserialize_with = "loose_vec")]
    pub links: Vec<PayloadLink>,
    #[serde(deserialize_with = "loose_vec")]
    pub education_history: Vec<EducationEntry>,
    #[serde(deserialize_with = "loose_vec")]
    pub professional_history: Vec<WorkEntry>,
    #[serde(deserialize_with = "loose_vec")]
    pub professional_projects: Vec<ProfessionalProject>,
    #[serde(deserialize_with = "loose_vec")]
    pub personal_projects: Vec<PersonalProject>,
    #[serde(deserialize_with = "loose_skills")]
    pub technical_skills: BTreeMap<String, Vec<String>>,
    #[serde(deserialize_with = "loose_vec")]
    pub professional_achievement: Vec<AchievementEntry>,
}

/// A link embedded in the payload: either `{name, url}` or a bare URL string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PayloadLink {
    Named {
        #[serde(default, deserialize_with = "loose_string")]
        name: String,
        #[serde(default, deserialize_with = "loose_string")]
        url: String,
    },
    Bare(String),
}

/// A caller-supplied link; takes precedence over links embedded in the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    #[serde(deserialize_with = "loose_string")]
    pub college_name: String,
    #[serde(deserialize_with = "loose_string")]
    pub degree: String,
    #[serde(deserialize_with = "loose_string")]
    pub major: String,
    #[serde(deserialize_with = "loose_opt_string")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "loose_opt_string")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub location: String,
    #[serde(deserialize_with = "loose_list")]
    pub coursework: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkEntry {
    #[serde(deserialize_with = "loose_string")]
    pub company_name: String,
    #[serde(deserialize_with = "loose_string")]
    pub job_title: String,
    #[serde(deserialize_with = "loose_opt_string")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "loose_opt_string")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub location: String,
}

impl WorkEntry {
    /// The key professional projects use to name the job they belong to.
    pub fn experience_key(&self) -> String {
        format!("{} - {}", self.company_name.trim(), self.job_title.trim())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfessionalProject {
    #[serde(deserialize_with = "loose_string")]
    pub work_experience: String,
    #[serde(deserialize_with = "loose_string")]
    pub project_name: String,
    #[serde(deserialize_with = "loose_string")]
    pub overview_content: String,
    #[serde(deserialize_with = "loose_list")]
    pub tech_content: Vec<String>,
    #[serde(deserialize_with = "loose_string")]
    pub achievement_content: String,
    #[serde(deserialize_with = "loose_list")]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PersonalProject {
    #[serde(deserialize_with = "loose_string")]
    pub project_name: String,
    #[serde(deserialize_with = "loose_string")]
    pub overview_content: String,
    #[serde(deserialize_with = "loose_list")]
    pub tech_content: Vec<String>,
    #[serde(deserialize_with = "loose_string")]
    pub achievement_content: String,
    #[serde(deserialize_with = "loose_opt_string")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "loose_opt_string")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub location: String,
    #[serde(deserialize_with = "loose_list")]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AchievementEntry {
    #[serde(rename = "type", deserialize_with = "loose_string")]
    pub kind: String,
    #[serde(deserialize_with = "loose_string")]
    pub value: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Coercions
// ────────────────────────────────────────────────────────────────────────────

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn loose_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(scalar_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn loose_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(scalar_to_string(Value::deserialize(deserializer)?).filter(|s| !s.trim().is_empty()))
}

fn to_list(value: Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(scalar_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

/// A list of strings, a single comma-separated string, or null.
fn loose_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(to_list(Value::deserialize(deserializer)?))
}

/// A list of records; null or a non-array counts as empty, unreadable elements are skipped.
fn loose_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

fn loose_skills<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, Vec<String>>, D::Error> {
    let Value::Object(map) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .into_iter()
        .map(|(topic, keywords)| (topic, to_list(keywords)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars_are_coerced() {
        let payload: CraftedResume = serde_json::from_value(json!({
            "full_name": "Ada Lovelace",
            "phone_number": 5550100,
            "home_address": null
        }))
        .unwrap();
        assert_eq!(payload.phone_number, "5550100");
        assert_eq!(payload.home_address, "");
        assert!(payload.professional_history.is_empty());
    }

    #[test]
    fn test_links_accept_both_shapes() {
        let payload: CraftedResume = serde_json::from_value(json!({
            "links": [
                {"name": "GitHub", "url": "https://github.com/ada"},
                "https://www.linkedin.com/in/ada"
            ]
        }))
        .unwrap();
        assert_eq!(payload.links.len(), 2);
        assert!(matches!(&payload.links[1], PayloadLink::Bare(url) if url.contains("linkedin")));
    }

    #[test]
    fn test_lists_accept_comma_strings_and_null() {
        let payload: CraftedResume = serde_json::from_value(json!({
            "technical_skills": {"Languages": "Rust, Go", "Tools": ["Git", null, " "]},
            "education_history": null,
            "personal_projects": [{"project_name": "p", "technologies": null, "end_date": ""}]
        }))
        .unwrap();
        assert_eq!(payload.technical_skills["Languages"], vec!["Rust", "Go"]);
        assert_eq!(payload.technical_skills["Tools"], vec!["Git"]);
        assert!(payload.education_history.is_empty());
        assert!(payload.personal_projects[0].technologies.is_empty());
        assert_eq!(payload.personal_projects[0].end_date, None);
    }

    #[test]
    fn test_experience_key() {
        let entry = WorkEntry {
            company_name: "Acme ".to_string(),
            job_title: "Engineer".to_string(),
            ..WorkEntry::default()
        };
        assert_eq!(entry.experience_key(), "Acme - Engineer");
    }
}
