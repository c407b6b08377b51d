//! Document Model: create / update / delete operations for every résumé entity.
//!
//! Each operation targets exactly one entity by id (and parent id when nested) and
//! leaves its siblings untouched. New experiences, job titles, education entries and
//! projects go to the front of their list; everything else is appended.

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::resume::grouping::{self, Entry};
use crate::resume::model::{
    Achievement, ContactField, ContactKind, Degree, Education, JobTitle, ProfessionalExperience,
    Project, Skill,
};

#[derive(Debug, Error, PartialEq)]
pub enum DocumentError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("Contact field '{0}' cannot be removed")]
    ProtectedContactField(String),

    #[error("Entry {index} is not a bullet")]
    NotABullet { index: usize },

    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Project group '{0}' not found")]
    GroupNotFound(String),

    #[error("Drag key does not address an element of {0}")]
    InvalidDragKey(&'static str),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Entities addressable by id.
pub trait Identified {
    const KIND: &'static str;
    fn id(&self) -> Uuid;
}

macro_rules! identified {
    ($ty:ty, $kind:literal) => {
        impl Identified for $ty {
            const KIND: &'static str = $kind;
            fn id(&self) -> Uuid {
                self.id
            }
        }
    };
}

identified!(ContactField, "Contact field");
identified!(ProfessionalExperience, "Experience");
identified!(JobTitle, "Job title");
identified!(Education, "Education");
identified!(Degree, "Degree");
identified!(Project, "Project");
identified!(Skill, "Skill");
identified!(Achievement, "Achievement");

pub fn find_mut<T: Identified>(items: &mut [T], id: Uuid) -> DocumentResult<&mut T> {
    items
        .iter_mut()
        .find(|item| item.id() == id)
        .ok_or(DocumentError::NotFound { kind: T::KIND, id })
}

pub fn remove<T: Identified>(items: &mut Vec<T>, id: Uuid) -> DocumentResult<T> {
    let index = items
        .iter()
        .position(|item| item.id() == id)
        .ok_or(DocumentError::NotFound { kind: T::KIND, id })?;
    Ok(items.remove(index))
}

fn check_index(len: usize, index: usize) -> DocumentResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(DocumentError::IndexOutOfRange { index, len })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Patches
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactPatch {
    pub label: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobTitlePatch {
    pub title: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EducationPatch {
    pub university: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DegreePatch {
    pub degree: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub technologies: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillPatch {
    pub topic: Option<String>,
    pub keywords: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AchievementPatch {
    pub kind: Option<String>,
    pub value: Option<String>,
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Contact fields
// ────────────────────────────────────────────────────────────────────────────

pub fn add_contact_field(
    fields: &mut Vec<ContactField>,
    label: &str,
    value: &str,
    kind: ContactKind,
) -> Uuid {
    let field = ContactField::new(label, value, kind);
    let id = field.id;
    fields.push(field);
    id
}

pub fn update_contact_field(
    fields: &mut [ContactField],
    id: Uuid,
    patch: ContactPatch,
) -> DocumentResult<()> {
    let field = find_mut(fields, id)?;
    set(&mut field.label, patch.label);
    set(&mut field.value, patch.value);
    Ok(())
}

pub fn delete_contact_field(fields: &mut Vec<ContactField>, id: Uuid) -> DocumentResult<()> {
    let field = find_mut(fields, id)?;
    if !field.is_removable() {
        return Err(DocumentError::ProtectedContactField(field.label.clone()));
    }
    remove(fields, id).map(|_| ())
}

// ────────────────────────────────────────────────────────────────────────────
// Experiences and job titles
// ────────────────────────────────────────────────────────────────────────────

pub fn add_experience(experiences: &mut Vec<ProfessionalExperience>) -> Uuid {
    let experience = ProfessionalExperience::blank();
    let id = experience.id;
    experiences.insert(0, experience);
    id
}

pub fn update_company(
    experiences: &mut [ProfessionalExperience],
    id: Uuid,
    company: String,
) -> DocumentResult<()> {
    find_mut(experiences, id)?.company = company;
    Ok(())
}

/// Removes a company and forgets its collapsed/expanded state.
pub fn delete_experience(
    experiences: &mut Vec<ProfessionalExperience>,
    collapsed: &mut HashSet<Uuid>,
    id: Uuid,
) -> DocumentResult<()> {
    remove(experiences, id)?;
    collapsed.remove(&id);
    Ok(())
}

pub fn job_title_mut(
    experiences: &mut [ProfessionalExperience],
    experience_id: Uuid,
    job_title_id: Uuid,
) -> DocumentResult<&mut JobTitle> {
    let experience = find_mut(experiences, experience_id)?;
    find_mut(&mut experience.job_titles, job_title_id)
}

pub fn add_job_title(
    experiences: &mut [ProfessionalExperience],
    experience_id: Uuid,
) -> DocumentResult<Uuid> {
    let experience = find_mut(experiences, experience_id)?;
    let job_title = JobTitle::blank();
    let id = job_title.id;
    experience.job_titles.insert(0, job_title);
    Ok(id)
}

pub fn update_job_title(
    experiences: &mut [ProfessionalExperience],
    experience_id: Uuid,
    job_title_id: Uuid,
    patch: JobTitlePatch,
) -> DocumentResult<()> {
    let job_title = job_title_mut(experiences, experience_id, job_title_id)?;
    set(&mut job_title.title, patch.title);
    set(&mut job_title.date, patch.date);
    Ok(())
}

pub fn delete_job_title(
    experiences: &mut [ProfessionalExperience],
    experience_id: Uuid,
    job_title_id: Uuid,
) -> DocumentResult<()> {
    let experience = find_mut(experiences, experience_id)?;
    remove(&mut experience.job_titles, job_title_id).map(|_| ())
}

// ────────────────────────────────────────────────────────────────────────────
// Bullets and project groups (content indices are positions in `JobTitle::content`)
// ────────────────────────────────────────────────────────────────────────────

/// Appends an empty bullet to the end of the job title's content.
pub fn add_bullet(job_title: &mut JobTitle) -> usize {
    job_title.content.push(Entry::bullet(""));
    job_title.content.len() - 1
}

pub fn update_bullet(job_title: &mut JobTitle, index: usize, text: String) -> DocumentResult<()> {
    check_index(job_title.content.len(), index)?;
    match &mut job_title.content[index] {
        Entry::Bullet { text: slot } => {
            *slot = text;
            Ok(())
        }
        Entry::ProjectHeader { .. } => Err(DocumentError::NotABullet { index }),
    }
}

pub fn delete_bullet(job_title: &mut JobTitle, index: usize) -> DocumentResult<()> {
    check_index(job_title.content.len(), index)?;
    if job_title.content[index].is_header() {
        return Err(DocumentError::NotABullet { index });
    }
    job_title.content.remove(index);
    Ok(())
}

pub fn add_project_group(job_title: &mut JobTitle, name: &str) {
    grouping::add_project_group(&mut job_title.content, name);
}

pub fn insert_bullet_into_group(job_title: &mut JobTitle, name: &str) -> DocumentResult<usize> {
    grouping::insert_bullet_into_group(&mut job_title.content, name)
        .ok_or_else(|| DocumentError::GroupNotFound(name.to_string()))
}

pub fn delete_project_group(job_title: &mut JobTitle, name: &str) -> DocumentResult<()> {
    let removed = grouping::delete_group(
        &mut job_title.content,
        &mut job_title.project_technologies,
        name,
    );
    if removed == 0 {
        return Err(DocumentError::GroupNotFound(name.to_string()));
    }
    Ok(())
}

pub fn rename_project_group(job_title: &mut JobTitle, old: &str, new: &str) -> DocumentResult<()> {
    if grouping::rename_project_group(
        &mut job_title.content,
        &mut job_title.project_technologies,
        old,
        new,
    ) {
        Ok(())
    } else {
        Err(DocumentError::GroupNotFound(old.to_string()))
    }
}

pub fn reorder_project_groups(
    job_title: &mut JobTitle,
    from: usize,
    to: usize,
) -> DocumentResult<()> {
    let len = grouping::group_names(&job_title.content).len();
    check_index(len, from)?;
    grouping::reorder_groups(&mut job_title.content, from, to);
    Ok(())
}

/// Sets (or clears, with an empty list) the technology list of a group.
pub fn set_project_technologies(
    job_title: &mut JobTitle,
    name: &str,
    technologies: Vec<String>,
) -> DocumentResult<()> {
    if !grouping::group_names(&job_title.content).contains(&name) {
        return Err(DocumentError::GroupNotFound(name.to_string()));
    }
    if technologies.is_empty() {
        job_title.project_technologies.remove(name);
    } else {
        job_title
            .project_technologies
            .insert(name.to_string(), technologies);
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Education and degrees
// ────────────────────────────────────────────────────────────────────────────

pub fn add_education(education: &mut Vec<Education>) -> Uuid {
    let entry = Education::blank();
    let id = entry.id;
    education.insert(0, entry);
    id
}

pub fn update_education(
    education: &mut [Education],
    id: Uuid,
    patch: EducationPatch,
) -> DocumentResult<()> {
    let entry = find_mut(education, id)?;
    set(&mut entry.university, patch.university);
    set(&mut entry.date, patch.date);
    Ok(())
}

pub fn delete_education(education: &mut Vec<Education>, id: Uuid) -> DocumentResult<()> {
    remove(education, id).map(|_| ())
}

pub fn add_degree(education: &mut [Education], education_id: Uuid) -> DocumentResult<Uuid> {
    let entry = find_mut(education, education_id)?;
    let degree = Degree::new("", "");
    let id = degree.id;
    entry.degrees.push(degree);
    Ok(id)
}

pub fn update_degree(
    education: &mut [Education],
    education_id: Uuid,
    degree_id: Uuid,
    patch: DegreePatch,
) -> DocumentResult<()> {
    let entry = find_mut(education, education_id)?;
    let degree = find_mut(&mut entry.degrees, degree_id)?;
    set(&mut degree.degree, patch.degree);
    set(&mut degree.description, patch.description);
    Ok(())
}

pub fn delete_degree(
    education: &mut [Education],
    education_id: Uuid,
    degree_id: Uuid,
) -> DocumentResult<()> {
    let entry = find_mut(education, education_id)?;
    remove(&mut entry.degrees, degree_id).map(|_| ())
}

// ────────────────────────────────────────────────────────────────────────────
// Flat projects
// ────────────────────────────────────────────────────────────────────────────

pub fn add_project(projects: &mut Vec<Project>) -> Uuid {
    let project = Project::blank();
    let id = project.id;
    projects.insert(0, project);
    id
}

pub fn update_project(
    projects: &mut [Project],
    id: Uuid,
    patch: ProjectPatch,
) -> DocumentResult<()> {
    let project = find_mut(projects, id)?;
    set(&mut project.name, patch.name);
    set(&mut project.date, patch.date);
    set(&mut project.description, patch.description);
    set(&mut project.technologies, patch.technologies);
    Ok(())
}

pub fn delete_project(projects: &mut Vec<Project>, id: Uuid) -> DocumentResult<()> {
    remove(projects, id).map(|_| ())
}

pub fn add_project_bullet(projects: &mut [Project], id: Uuid) -> DocumentResult<usize> {
    let project = find_mut(projects, id)?;
    project.bullets.push(String::new());
    Ok(project.bullets.len() - 1)
}

pub fn update_project_bullet(
    projects: &mut [Project],
    id: Uuid,
    index: usize,
    text: String,
) -> DocumentResult<()> {
    let project = find_mut(projects, id)?;
    check_index(project.bullets.len(), index)?;
    project.bullets[index] = text;
    Ok(())
}

pub fn delete_project_bullet(
    projects: &mut [Project],
    id: Uuid,
    index: usize,
) -> DocumentResult<()> {
    let project = find_mut(projects, id)?;
    check_index(project.bullets.len(), index)?;
    project.bullets.remove(index);
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Skills and achievements
// ────────────────────────────────────────────────────────────────────────────

pub fn add_skill(skills: &mut Vec<Skill>) -> Uuid {
    let skill = Skill::new("", "");
    let id = skill.id;
    skills.push(skill);
    id
}

pub fn update_skill(skills: &mut [Skill], id: Uuid, patch: SkillPatch) -> DocumentResult<()> {
    let skill = find_mut(skills, id)?;
    set(&mut skill.topic, patch.topic);
    set(&mut skill.keywords, patch.keywords);
    Ok(())
}

pub fn delete_skill(skills: &mut Vec<Skill>, id: Uuid) -> DocumentResult<()> {
    remove(skills, id).map(|_| ())
}

pub fn add_achievement(achievements: &mut Vec<Achievement>) -> Uuid {
    let achievement = Achievement::new("", "");
    let id = achievement.id;
    achievements.push(achievement);
    id
}

pub fn update_achievement(
    achievements: &mut [Achievement],
    id: Uuid,
    patch: AchievementPatch,
) -> DocumentResult<()> {
    let achievement = find_mut(achievements, id)?;
    set(&mut achievement.kind, patch.kind);
    set(&mut achievement.value, patch.value);
    Ok(())
}

pub fn delete_achievement(achievements: &mut Vec<Achievement>, id: Uuid) -> DocumentResult<()> {
    remove(achievements, id).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::model::default_contact_fields;

    #[test]
    fn test_new_experiences_go_to_front() {
        let mut experiences = Vec::new();
        let first = add_experience(&mut experiences);
        let second = add_experience(&mut experiences);
        assert_eq!(experiences[0].id, second);
        assert_eq!(experiences[1].id, first);
        assert_eq!(experiences[0].job_titles.len(), 1);
    }

    #[test]
    fn test_update_company_leaves_siblings_alone() {
        let mut experiences = Vec::new();
        let a = add_experience(&mut experiences);
        let b = add_experience(&mut experiences);
        let before_a = experiences[1].clone();
        update_company(&mut experiences, b, "Acme".to_string()).unwrap();
        assert_eq!(experiences[0].company, "Acme");
        assert_eq!(experiences[1], before_a);
        assert_eq!(experiences[1].id, a);
    }

    #[test]
    fn test_delete_experience_clears_collapsed_state() {
        let mut experiences = Vec::new();
        let id = add_experience(&mut experiences);
        let mut collapsed = HashSet::from([id]);
        delete_experience(&mut experiences, &mut collapsed, id).unwrap();
        assert!(experiences.is_empty());
        assert!(collapsed.is_empty());
        assert_eq!(
            delete_experience(&mut experiences, &mut collapsed, id),
            Err(DocumentError::NotFound {
                kind: "Experience",
                id
            })
        );
    }

    #[test]
    fn test_job_titles_insert_at_front() {
        let mut experiences = Vec::new();
        let exp = add_experience(&mut experiences);
        let original = experiences[0].job_titles[0].id;
        let added = add_job_title(&mut experiences, exp).unwrap();
        let ids: Vec<_> = experiences[0].job_titles.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![added, original]);
    }

    #[test]
    fn test_bullets_append_and_reject_headers() {
        let mut jt = JobTitle::blank();
        add_project_group(&mut jt, "Alpha");
        let index = add_bullet(&mut jt);
        assert_eq!(index, 3);
        update_bullet(&mut jt, index, "shipped it".to_string()).unwrap();
        assert_eq!(jt.content[3], Entry::bullet("shipped it"));
        assert_eq!(
            update_bullet(&mut jt, 1, "nope".to_string()),
            Err(DocumentError::NotABullet { index: 1 })
        );
        assert_eq!(
            delete_bullet(&mut jt, 9),
            Err(DocumentError::IndexOutOfRange { index: 9, len: 4 })
        );
        delete_bullet(&mut jt, 0).unwrap();
        assert!(jt.content[0].is_header());
    }

    #[test]
    fn test_group_technologies_follow_group_lifecycle() {
        let mut jt = JobTitle::blank();
        add_project_group(&mut jt, "Alpha");
        set_project_technologies(&mut jt, "Alpha", vec!["Rust".to_string()]).unwrap();
        assert_eq!(
            set_project_technologies(&mut jt, "Ghost", vec![]),
            Err(DocumentError::GroupNotFound("Ghost".to_string()))
        );
        delete_project_group(&mut jt, "Alpha").unwrap();
        assert!(jt.project_technologies.is_empty());
        assert!(delete_project_group(&mut jt, "Alpha").is_err());
    }

    #[test]
    fn test_default_contact_fields_are_protected() {
        let mut fields = default_contact_fields();
        let email = fields[0].id;
        let linkedin = fields[3].id;
        assert_eq!(
            delete_contact_field(&mut fields, email),
            Err(DocumentError::ProtectedContactField("Email".to_string()))
        );
        delete_contact_field(&mut fields, linkedin).unwrap();
        let custom = add_contact_field(&mut fields, "Portfolio", "me.dev", ContactKind::Custom);
        assert_eq!(fields.last().map(|f| f.id), Some(custom));
        delete_contact_field(&mut fields, custom).unwrap();
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_degrees_are_scoped_to_their_education() {
        let mut education = Vec::new();
        let mit = add_education(&mut education);
        let other = add_education(&mut education);
        let degree = add_degree(&mut education, mit).unwrap();
        assert!(update_degree(&mut education, other, degree, DegreePatch::default()).is_err());
        update_degree(
            &mut education,
            mit,
            degree,
            DegreePatch {
                degree: Some("PhD".to_string()),
                description: None,
            },
        )
        .unwrap();
        let entry = education.iter().find(|e| e.id == mit).unwrap();
        assert_eq!(entry.degrees.last().map(|d| d.degree.as_str()), Some("PhD"));
        delete_degree(&mut education, mit, degree).unwrap();
        assert_eq!(education.iter().find(|e| e.id == mit).unwrap().degrees.len(), 1);
    }

    #[test]
    fn test_project_bullets() {
        let mut projects = Vec::new();
        let id = add_project(&mut projects);
        let index = add_project_bullet(&mut projects, id).unwrap();
        assert_eq!(index, 1);
        update_project_bullet(&mut projects, id, 1, "built".to_string()).unwrap();
        delete_project_bullet(&mut projects, id, 0).unwrap();
        assert_eq!(projects[0].bullets, vec!["built".to_string()]);
    }

    #[test]
    fn test_skills_append() {
        let mut skills = Vec::new();
        let a = add_skill(&mut skills);
        let b = add_skill(&mut skills);
        assert_eq!(skills.iter().map(|s| s.id).collect::<Vec<_>>(), vec![a, b]);
        update_skill(
            &mut skills,
            b,
            SkillPatch {
                topic: Some("Tools".to_string()),
                keywords: Some("Docker, Git".to_string()),
            },
        )
        .unwrap();
        delete_skill(&mut skills, a).unwrap();
        assert_eq!(skills[0].topic, "Tools");
    }
}
