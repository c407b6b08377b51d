//! Persisted session snapshot and migration of older shapes.
//!
//! A snapshot is one JSON object holding the editing and saved copy of every section,
//! the knowledge scope, open sections, collapsed companies and page navigation.
//! Older shapes are accepted on read:
//! - flat `projects` / `savedProjects` (before the Established/Expanding split)
//! - two-array `establishedProjects` / `expandingProjects` (+ `saved*` variants)
//! - sentinel-string `bullets` on job titles and flat-degree education (see `model`)

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::resume::model::{
    Achievement, ContactField, Education, ProfessionalExperience, Project, Skill,
};
use crate::resume::scope::{KnowledgeScope, ProjectStore};

pub const SNAPSHOT_VERSION: u32 = 2;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Contact,
    Experience,
    Education,
    Projects,
    Skills,
    Achievements,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    Builder,
    Craft,
    Preview,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageNavigation {
    #[serde(default)]
    pub active_page: Page,
    #[serde(default)]
    pub has_crafted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub version: u32,
    pub name: String,
    pub contact_fields: Vec<ContactField>,
    pub saved_contact_fields: Vec<ContactField>,
    pub professional_experiences: Vec<ProfessionalExperience>,
    pub saved_professional_experiences: Vec<ProfessionalExperience>,
    pub education: Vec<Education>,
    pub saved_education: Vec<Education>,
    pub skills: Vec<Skill>,
    pub saved_skills: Vec<Skill>,
    pub achievements: Vec<Achievement>,
    pub saved_achievements: Vec<Achievement>,
    pub editing_projects: Vec<Project>,
    pub project_store: ProjectStore,
    pub knowledge_scope: KnowledgeScope,
    pub open_sections: Vec<Section>,
    pub collapsed_experiences: Vec<Uuid>,
    pub navigation: PageNavigation,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacyProjectFields {
    projects: Option<Vec<Project>>,
    saved_projects: Option<Vec<Project>>,
    established_projects: Option<Vec<Project>>,
    saved_established_projects: Option<Vec<Project>>,
    expanding_projects: Option<Vec<Project>>,
    saved_expanding_projects: Option<Vec<Project>>,
}

impl LegacyProjectFields {
    fn is_empty(&self) -> bool {
        self.projects.is_none()
            && self.saved_projects.is_none()
            && self.established_projects.is_none()
            && self.saved_established_projects.is_none()
            && self.expanding_projects.is_none()
            && self.saved_expanding_projects.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(flatten)]
    current: Snapshot,
    #[serde(flatten)]
    legacy: LegacyProjectFields,
}

impl Snapshot {
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let raw: RawSnapshot = serde_json::from_str(raw)?;
        Ok(raw.migrate())
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl RawSnapshot {
    fn migrate(self) -> Snapshot {
        let RawSnapshot {
            mut current,
            legacy,
        } = self;

        if !legacy.is_empty() && current.project_store.entries().is_empty() {
            let LegacyProjectFields {
                projects,
                saved_projects,
                established_projects,
                saved_established_projects,
                expanding_projects,
                saved_expanding_projects,
            } = legacy;

            let saved_established = saved_established_projects
                .or(saved_projects)
                .unwrap_or_default();
            let saved_expanding = saved_expanding_projects.unwrap_or_default();
            info!(
                "Migrating legacy project lists ({} established, {} expanding)",
                saved_established.len(),
                saved_expanding.len()
            );
            current.project_store = ProjectStore::from_lists(saved_established, saved_expanding);

            if current.editing_projects.is_empty() {
                let mut editing = established_projects.or(projects).unwrap_or_default();
                editing.extend(expanding_projects.unwrap_or_default());
                current.editing_projects = editing;
            }
        }

        current.version = SNAPSHOT_VERSION;
        current
    }
}
