use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::resume::grouping::{self, Entry, ProjectGroup};

pub fn new_id() -> Uuid {
    Uuid::new_v4()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    Email,
    Phone,
    Location,
    Link,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactField {
    #[serde(default = "new_id")]
    pub id: Uuid,
    pub label: String,
    #[serde(default)]
    pub value: String,
    #[serde(default = "default_contact_kind")]
    pub kind: ContactKind,
    #[serde(default)]
    pub is_default: bool,
}

fn default_contact_kind() -> ContactKind {
    ContactKind::Custom
}

impl ContactField {
    pub fn new(label: impl Into<String>, value: impl Into<String>, kind: ContactKind) -> Self {
        Self {
            id: new_id(),
            label: label.into(),
            value: value.into(),
            kind,
            is_default: false,
        }
    }

    pub fn default_field(label: &str, kind: ContactKind) -> Self {
        Self {
            is_default: true,
            ..Self::new(label, "", kind)
        }
    }

    /// Default fields stay put, except link-type ones.
    pub fn is_removable(&self) -> bool {
        !self.is_default || self.kind == ContactKind::Link
    }
}

/// The contact block every new résumé starts with.
pub fn default_contact_fields() -> Vec<ContactField> {
    vec![
        ContactField::default_field("Email", ContactKind::Email),
        ContactField::default_field("Phone", ContactKind::Phone),
        ContactField::default_field("Location", ContactKind::Location),
        ContactField::default_field("LinkedIn", ContactKind::Link),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalExperience {
    #[serde(default = "new_id")]
    pub id: Uuid,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub job_titles: Vec<JobTitle>,
}

impl ProfessionalExperience {
    /// A blank company holding one blank job title.
    pub fn blank() -> Self {
        Self {
            id: new_id(),
            company: String::new(),
            job_titles: vec![JobTitle::blank()],
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobTitle {
    pub id: Uuid,
    pub title: String,
    pub date: String,
    pub content: Vec<Entry>,
    pub project_technologies: BTreeMap<String, Vec<String>>,
}

/// Accepts both the typed `content` shape and the legacy sentinel `bullets` shape.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobTitleRecord {
    #[serde(default = "new_id")]
    id: Uuid,
    #[serde(default)]
    title: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    content: Option<Vec<Entry>>,
    #[serde(default)]
    bullets: Option<Vec<String>>,
    #[serde(default)]
    project_technologies: Option<BTreeMap<String, Vec<String>>>,
}

impl<'de> Deserialize<'de> for JobTitle {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = JobTitleRecord::deserialize(deserializer)?;
        let content = match (record.content, record.bullets) {
            (Some(content), _) => content,
            (None, Some(bullets)) => grouping::entries_from_legacy(&bullets),
            (None, None) => Vec::new(),
        };
        let mut project_technologies = record.project_technologies.unwrap_or_default();
        grouping::prune_technologies(&content, &mut project_technologies);
        Ok(JobTitle {
            id: record.id,
            title: record.title,
            date: record.date,
            content,
            project_technologies,
        })
    }
}

impl JobTitle {
    pub fn blank() -> Self {
        Self {
            id: new_id(),
            title: String::new(),
            date: String::new(),
            content: vec![Entry::bullet("")],
            project_technologies: BTreeMap::new(),
        }
    }

    pub fn groups(&self) -> Vec<ProjectGroup> {
        grouping::decode(&self.content)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Degree {
    #[serde(default = "new_id")]
    pub id: Uuid,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub description: String,
}

impl Degree {
    pub fn new(degree: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            degree: degree.into(),
            description: description.into(),
        }
    }
}

/// Education as it may appear on the wire: current records carry `degrees`, legacy
/// records carry flat `degree` / `description` instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EducationRecord {
    #[serde(default = "new_id")]
    pub id: Uuid,
    #[serde(default)]
    pub university: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degrees: Option<Vec<Degree>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Folds legacy flat degree fields into a single synthesized `Degree`.
///
/// Records that already carry `degrees` only lose their stray legacy fields, so applying
/// this twice yields the same record.
pub fn normalize_education(record: &EducationRecord) -> EducationRecord {
    let degrees = match &record.degrees {
        Some(degrees) => degrees.clone(),
        None => {
            let degree = record.degree.clone().unwrap_or_default();
            let description = record.description.clone().unwrap_or_default();
            // Derived from the record id so re-normalizing a legacy record is stable.
            let id = Uuid::new_v5(&record.id, b"degree");
            vec![Degree {
                id,
                degree,
                description,
            }]
        }
    };
    EducationRecord {
        id: record.id,
        university: record.university.clone(),
        date: record.date.clone(),
        degrees: Some(degrees),
        degree: None,
        description: None,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: Uuid,
    pub university: String,
    pub date: String,
    pub degrees: Vec<Degree>,
}

impl From<EducationRecord> for Education {
    fn from(record: EducationRecord) -> Self {
        let normalized = normalize_education(&record);
        Education {
            id: normalized.id,
            university: normalized.university,
            date: normalized.date,
            degrees: normalized.degrees.unwrap_or_default(),
        }
    }
}

impl<'de> Deserialize<'de> for Education {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        EducationRecord::deserialize(deserializer).map(Education::from)
    }
}

impl Education {
    pub fn blank() -> Self {
        Self {
            id: new_id(),
            university: String::new(),
            date: String::new(),
            degrees: vec![Degree::new("", "")],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default = "new_id")]
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub bullets: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
}

impl Project {
    pub fn blank() -> Self {
        Self {
            id: new_id(),
            name: String::new(),
            date: String::new(),
            description: String::new(),
            bullets: vec![String::new()],
            technologies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    #[serde(default = "new_id")]
    pub id: Uuid,
    #[serde(default)]
    pub topic: String,
    /// Comma-joined keyword list.
    #[serde(default)]
    pub keywords: String,
}

impl Skill {
    pub fn new(topic: impl Into<String>, keywords: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            topic: topic.into(),
            keywords: keywords.into(),
        }
    }

    pub fn keyword_list(&self) -> Vec<&str> {
        self.keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    #[serde(default = "new_id")]
    pub id: Uuid,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub value: String,
}

impl Achievement {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            kind: kind.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_education_gets_one_degree() {
        let edu: Education = serde_json::from_value(json!({
            "university": "MIT",
            "date": "2019 - 2023",
            "degree": "BSc Computer Science",
            "description": "Dean's list"
        }))
        .unwrap();
        assert_eq!(edu.degrees.len(), 1);
        assert_eq!(edu.degrees[0].degree, "BSc Computer Science");
        assert_eq!(edu.degrees[0].description, "Dean's list");
    }

    #[test]
    fn test_normalize_education_is_idempotent() {
        let legacy: EducationRecord = serde_json::from_value(json!({
            "university": "MIT",
            "degree": "BSc",
        }))
        .unwrap();
        let once = normalize_education(&legacy);
        assert_eq!(normalize_education(&once), once);
        assert_eq!(normalize_education(&legacy), once);

        let current: EducationRecord = serde_json::from_value(json!({
            "university": "MIT",
            "degrees": [{"degree": "MSc", "description": ""}],
            "degree": "stray"
        }))
        .unwrap();
        let once = normalize_education(&current);
        assert_eq!(once.degree, None);
        assert_eq!(normalize_education(&once), once);
    }

    #[test]
    fn test_job_title_reads_legacy_bullets() {
        let jt: JobTitle = serde_json::from_value(json!({
            "title": "Engineer",
            "bullets": ["__PROJECT_NAME__:Alpha", "did X"],
            "projectTechnologies": {"Alpha": ["Rust"], "Stale": ["Perl"]}
        }))
        .unwrap();
        assert_eq!(jt.content, vec![Entry::header("Alpha"), Entry::bullet("did X")]);
        assert!(jt.project_technologies.contains_key("Alpha"));
        assert!(!jt.project_technologies.contains_key("Stale"));
    }

    #[test]
    fn test_job_title_typed_round_trip() {
        let mut jt = JobTitle::blank();
        jt.content.push(Entry::header("P"));
        let value = serde_json::to_value(&jt).unwrap();
        let back: JobTitle = serde_json::from_value(value).unwrap();
        assert_eq!(back, jt);
    }

    #[test]
    fn test_only_link_defaults_are_removable() {
        let fields = default_contact_fields();
        let removable: Vec<_> = fields
            .iter()
            .filter(|f| f.is_removable())
            .map(|f| f.label.as_str())
            .collect();
        assert_eq!(removable, vec!["LinkedIn"]);
        assert!(ContactField::new("GitHub", "", ContactKind::Link).is_removable());
    }

    #[test]
    fn test_skill_keyword_list() {
        let skill = Skill::new("Languages", "Rust, Go,, Python ");
        assert_eq!(skill.keyword_list(), vec!["Rust", "Go", "Python"]);
    }
}
