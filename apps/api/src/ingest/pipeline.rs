//! Ingestion Pipeline: crafted-résumé payload to the saved half of the document model.
//!
//! The pipeline builds a complete [`SavedSections`] value before anything touches the
//! session, so a failure leaves the previous saved model exactly as it was.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::ingest::dates::format_date_range;
use crate::ingest::payload::{
    CraftedResume, EducationEntry, NamedLink, PayloadLink, PersonalProject, ProfessionalProject,
    WorkEntry,
};
use crate::resume::grouping::Entry;
use crate::resume::model::{
    default_contact_fields, new_id, Achievement, ContactField, ContactKind, Degree, Education,
    JobTitle, ProfessionalExperience, Project, Skill,
};
use crate::resume::scope::{KnowledgeScope, ProjectStore, Route};
use crate::resume::session::SavedSections;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Crafted résumé payload is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Crafted résumé payload contains no résumé data")]
    Empty,
}

/// Where new projects go when both knowledge scopes are selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BothScopesPlacement {
    /// Everything goes to Established, so a combined read never shows a project twice.
    #[default]
    Merge,
    /// First ceil(n/2) to Established, the rest to Expanding.
    Split,
}

impl FromStr for BothScopesPlacement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "split" => Ok(Self::Split),
            other => Err(format!("unknown both-scopes placement '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    pub placement: BothScopesPlacement,
}

/// Parses a raw payload and builds the saved sections from it.
pub fn ingest_value(
    raw: serde_json::Value,
    links: &[NamedLink],
    scope: KnowledgeScope,
    options: IngestOptions,
) -> Result<SavedSections, IngestError> {
    let payload: CraftedResume = serde_json::from_value(raw).map_err(|e| {
        error!("Failed to decode crafted résumé payload: {e}");
        IngestError::Malformed(e)
    })?;
    ingest(&payload, links, scope, options)
}

pub fn ingest(
    payload: &CraftedResume,
    links: &[NamedLink],
    scope: KnowledgeScope,
    options: IngestOptions,
) -> Result<SavedSections, IngestError> {
    if is_empty(payload) {
        error!("Crafted résumé payload carried no usable sections");
        return Err(IngestError::Empty);
    }

    let projects = payload
        .personal_projects
        .iter()
        .map(personal_project)
        .collect::<Vec<_>>();

    let sections = SavedSections {
        name: payload.full_name.trim().to_string(),
        contacts: contact_fields(payload, links),
        experiences: experiences(&payload.professional_history, &payload.professional_projects),
        education: payload.education_history.iter().map(education).collect(),
        projects: route_projects(projects, scope, options.placement),
        skills: skills(&payload.technical_skills),
        achievements: payload
            .professional_achievement
            .iter()
            .filter(|a| !a.kind.trim().is_empty() || !a.value.trim().is_empty())
            .map(|a| Achievement::new(a.kind.trim(), a.value.trim()))
            .collect(),
    };

    info!(
        "Ingested crafted résumé: {} experiences, {} education, {} projects, {} skill topics",
        sections.experiences.len(),
        sections.education.len(),
        sections.projects.entries().len(),
        sections.skills.len()
    );
    Ok(sections)
}

fn is_empty(payload: &CraftedResume) -> bool {
    payload.full_name.trim().is_empty()
        && payload.email_address.trim().is_empty()
        && payload.professional_history.is_empty()
        && payload.education_history.is_empty()
        && payload.personal_projects.is_empty()
        && payload.technical_skills.is_empty()
}

// ────────────────────────────────────────────────────────────────────────────
// Contacts
// ────────────────────────────────────────────────────────────────────────────

fn contact_fields(payload: &CraftedResume, links: &[NamedLink]) -> Vec<ContactField> {
    let mut fields = default_contact_fields();
    for field in fields.iter_mut() {
        match field.kind {
            ContactKind::Email => field.value = payload.email_address.trim().to_string(),
            ContactKind::Phone => field.value = payload.phone_number.trim().to_string(),
            ContactKind::Location => field.value = payload.home_address.trim().to_string(),
            ContactKind::Link | ContactKind::Custom => {}
        }
    }

    let resolved: Vec<NamedLink> = if links.is_empty() {
        payload.links.iter().filter_map(resolve_payload_link).collect()
    } else {
        links.to_vec()
    };

    for link in resolved {
        if link.url.trim().is_empty() {
            continue;
        }
        let default_slot = fields.iter_mut().find(|f| {
            f.is_default
                && f.kind == ContactKind::Link
                && f.value.is_empty()
                && f.label.eq_ignore_ascii_case(&link.name)
        });
        match default_slot {
            Some(slot) => slot.value = link.url,
            None => fields.push(ContactField::new(link.name, link.url, ContactKind::Link)),
        }
    }
    fields
}

fn resolve_payload_link(link: &PayloadLink) -> Option<NamedLink> {
    let (name, url) = match link {
        PayloadLink::Named { name, url } => (name.trim(), url.trim()),
        PayloadLink::Bare(url) => ("", url.trim()),
    };
    if url.is_empty() {
        return None;
    }
    let name = if name.is_empty() {
        infer_link_name(url)
    } else {
        name.to_string()
    };
    Some(NamedLink {
        name,
        url: url.to_string(),
    })
}

/// Best-effort display name for a bare URL, taken from its host.
pub fn infer_link_name(raw: &str) -> String {
    let parsed = Url::parse(raw).or_else(|_| Url::parse(&format!("https://{raw}")));
    let Some(host) = parsed.ok().and_then(|u| u.host_str().map(str::to_ascii_lowercase)) else {
        return "Link".to_string();
    };
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let label = host.split('.').next().unwrap_or(host);
    match label {
        "linkedin" => "LinkedIn".to_string(),
        "github" => "GitHub".to_string(),
        "gitlab" => "GitLab".to_string(),
        "" => "Link".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => "Link".to_string(),
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Education
// ────────────────────────────────────────────────────────────────────────────

fn education(entry: &EducationEntry) -> Education {
    let degree = match (entry.degree.trim(), entry.major.trim()) {
        ("", major) => major.to_string(),
        (degree, "") => degree.to_string(),
        (degree, major) => format!("{degree} in {major}"),
    };
    let description = if entry.coursework.is_empty() {
        String::new()
    } else {
        format!("Relevant coursework: {}", entry.coursework.join(", "))
    };
    Education {
        id: new_id(),
        university: entry.college_name.trim().to_string(),
        date: format_date_range(entry.start_date.as_deref(), entry.end_date.as_deref()),
        degrees: vec![Degree::new(degree, description)],
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Work history and professional projects
// ────────────────────────────────────────────────────────────────────────────

/// Project indices attached to each job. A job takes the projects whose key is exactly
/// `"{company} - {title}"`; a job with no exact match takes every project whose key
/// contains its company name. A project can therefore land under several jobs.
fn match_projects(jobs: &[WorkEntry], projects: &[ProfessionalProject]) -> Vec<Vec<usize>> {
    jobs.iter()
        .map(|job| {
            let key = job.experience_key();
            let exact: Vec<usize> = projects
                .iter()
                .enumerate()
                .filter(|(_, project)| project.work_experience.trim() == key)
                .map(|(index, _)| index)
                .collect();
            if !exact.is_empty() {
                return exact;
            }
            let company = job.company_name.trim().to_lowercase();
            if company.is_empty() {
                return Vec::new();
            }
            projects
                .iter()
                .enumerate()
                .filter(|(_, project)| project.work_experience.to_lowercase().contains(&company))
                .map(|(index, _)| index)
                .collect()
        })
        .collect()
}

fn experiences(
    jobs: &[WorkEntry],
    projects: &[ProfessionalProject],
) -> Vec<ProfessionalExperience> {
    let matches = match_projects(jobs, projects);
    for (index, project) in projects.iter().enumerate() {
        if !matches.iter().any(|attached| attached.contains(&index)) {
            debug!(
                "Dropping professional project '{}': no job matches '{}'",
                project.project_name, project.work_experience
            );
        }
    }

    jobs.iter()
        .zip(&matches)
        .map(|(job, attached)| {
            let attached = attached.iter().map(|&index| &projects[index]);
            ProfessionalExperience {
                id: new_id(),
                company: job.company_name.trim().to_string(),
                job_titles: vec![job_title(job, attached)],
            }
        })
        .collect()
}

fn job_title<'a>(
    job: &WorkEntry,
    projects: impl Iterator<Item = &'a ProfessionalProject>,
) -> JobTitle {
    let mut content = Vec::new();
    let mut project_technologies = BTreeMap::new();

    for project in projects {
        let name = match project.project_name.trim() {
            "" => "Project".to_string(),
            name => name.to_string(),
        };
        content.push(Entry::header(name.clone()));
        let bullets = project_bullets(
            &project.overview_content,
            &project.tech_content,
            &project.achievement_content,
        );
        if bullets.is_empty() {
            content.push(Entry::bullet(""));
        }
        content.extend(bullets.into_iter().map(Entry::bullet));
        if !project.technologies.is_empty() {
            project_technologies.insert(name, project.technologies.clone());
        }
    }
    if content.is_empty() {
        content.push(Entry::bullet(""));
    }

    JobTitle {
        id: new_id(),
        title: job.job_title.trim().to_string(),
        date: format_date_range(job.start_date.as_deref(), job.end_date.as_deref()),
        content,
        project_technologies,
    }
}

fn project_bullets(overview: &str, tech: &[String], achievement: &str) -> Vec<String> {
    std::iter::once(overview)
        .chain(tech.iter().map(String::as_str))
        .chain(std::iter::once(achievement))
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Personal projects and scope routing
// ────────────────────────────────────────────────────────────────────────────

fn personal_project(project: &PersonalProject) -> Project {
    let date = if project.start_date.is_none() && project.end_date.is_none() {
        String::new()
    } else {
        format_date_range(project.start_date.as_deref(), project.end_date.as_deref())
    };
    let mut bullets = project_bullets("", &project.tech_content, &project.achievement_content);
    if bullets.is_empty() {
        bullets.push(String::new());
    }
    Project {
        id: new_id(),
        name: project.project_name.trim().to_string(),
        date,
        description: project.overview_content.trim().to_string(),
        bullets,
        technologies: project.technologies.clone(),
    }
}

/// Builds the project store for the current scope. The list not targeted is left empty.
fn route_projects(
    projects: Vec<Project>,
    scope: KnowledgeScope,
    placement: BothScopesPlacement,
) -> ProjectStore {
    match (scope.route(), placement) {
        (Route::Established, _) | (Route::Merged, BothScopesPlacement::Merge) => {
            ProjectStore::from_lists(projects, Vec::new())
        }
        (Route::Expanding, _) => ProjectStore::from_lists(Vec::new(), projects),
        (Route::Merged, BothScopesPlacement::Split) => {
            let mut established = projects;
            let expanding = established.split_off(established.len().div_ceil(2));
            ProjectStore::from_lists(established, expanding)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Skills
// ────────────────────────────────────────────────────────────────────────────

const KNOWN_TOPICS: [&str; 3] = ["Languages", "Frameworks", "Tools"];

fn canonical_topic(topic: &str) -> Option<&'static str> {
    let folded: String = topic
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    match folded.as_str() {
        "languages" | "language" | "programminglanguages" => Some("Languages"),
        "frameworks" | "framework" | "frameworkslibraries" | "librariesframeworks" => {
            Some("Frameworks")
        }
        "tools" | "tool" | "developertools" => Some("Tools"),
        _ => None,
    }
}

fn skills(technical: &BTreeMap<String, Vec<String>>) -> Vec<Skill> {
    let mut known: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
    let mut other: Vec<(&str, &[String])> = Vec::new();
    for (topic, keywords) in technical {
        if keywords.is_empty() {
            continue;
        }
        match canonical_topic(topic) {
            Some(canonical) => known
                .entry(canonical)
                .or_default()
                .extend(keywords.iter().cloned()),
            None => other.push((topic.as_str(), keywords.as_slice())),
        }
    }

    let mut skills: Vec<Skill> = KNOWN_TOPICS
        .iter()
        .filter_map(|topic| known.get(topic).map(|kw| Skill::new(*topic, kw.join(", "))))
        .collect();
    skills.extend(
        other
            .into_iter()
            .map(|(topic, keywords)| Skill::new(topic, keywords.join(", "))),
    );
    skills
}
