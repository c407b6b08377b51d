//! Edit commands: the serialized form of every document mutation a client can request.

use serde::Deserialize;
use uuid::Uuid;

use crate::resume::document::{
    AchievementPatch, ContactPatch, DegreePatch, EducationPatch, JobTitlePatch, ProjectPatch,
    SkillPatch,
};
use crate::resume::model::ContactKind;
use crate::resume::snapshot::Section;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditCommand {
    SetName {
        name: String,
    },
    AddContactField {
        label: String,
        #[serde(default)]
        value: String,
        #[serde(default = "custom_kind")]
        kind: ContactKind,
    },
    UpdateContactField {
        id: Uuid,
        #[serde(flatten)]
        patch: ContactPatch,
    },
    DeleteContactField {
        id: Uuid,
    },

    AddExperience,
    UpdateCompany {
        experience_id: Uuid,
        company: String,
    },
    DeleteExperience {
        experience_id: Uuid,
    },
    ToggleCollapsed {
        experience_id: Uuid,
    },
    AddJobTitle {
        experience_id: Uuid,
    },
    UpdateJobTitle {
        experience_id: Uuid,
        job_title_id: Uuid,
        #[serde(flatten)]
        patch: JobTitlePatch,
    },
    DeleteJobTitle {
        experience_id: Uuid,
        job_title_id: Uuid,
    },
    AddBullet {
        experience_id: Uuid,
        job_title_id: Uuid,
    },
    UpdateBullet {
        experience_id: Uuid,
        job_title_id: Uuid,
        index: usize,
        text: String,
    },
    DeleteBullet {
        experience_id: Uuid,
        job_title_id: Uuid,
        index: usize,
    },
    AddProjectGroup {
        experience_id: Uuid,
        job_title_id: Uuid,
        name: String,
    },
    InsertBulletIntoGroup {
        experience_id: Uuid,
        job_title_id: Uuid,
        name: String,
    },
    RenameProjectGroup {
        experience_id: Uuid,
        job_title_id: Uuid,
        name: String,
        new_name: String,
    },
    DeleteProjectGroup {
        experience_id: Uuid,
        job_title_id: Uuid,
        name: String,
    },
    ReorderProjectGroups {
        experience_id: Uuid,
        job_title_id: Uuid,
        from: usize,
        to: usize,
    },
    SetProjectTechnologies {
        experience_id: Uuid,
        job_title_id: Uuid,
        name: String,
        technologies: Vec<String>,
    },

    AddEducation,
    UpdateEducation {
        education_id: Uuid,
        #[serde(flatten)]
        patch: EducationPatch,
    },
    DeleteEducation {
        education_id: Uuid,
    },
    AddDegree {
        education_id: Uuid,
    },
    UpdateDegree {
        education_id: Uuid,
        degree_id: Uuid,
        #[serde(flatten)]
        patch: DegreePatch,
    },
    DeleteDegree {
        education_id: Uuid,
        degree_id: Uuid,
    },

    AddProject,
    UpdateProject {
        project_id: Uuid,
        #[serde(flatten)]
        patch: ProjectPatch,
    },
    DeleteProject {
        project_id: Uuid,
    },
    AddProjectBullet {
        project_id: Uuid,
    },
    UpdateProjectBullet {
        project_id: Uuid,
        index: usize,
        text: String,
    },
    DeleteProjectBullet {
        project_id: Uuid,
        index: usize,
    },

    AddSkill,
    UpdateSkill {
        skill_id: Uuid,
        #[serde(flatten)]
        patch: SkillPatch,
    },
    DeleteSkill {
        skill_id: Uuid,
    },

    AddAchievement,
    UpdateAchievement {
        achievement_id: Uuid,
        #[serde(flatten)]
        patch: AchievementPatch,
    },
    DeleteAchievement {
        achievement_id: Uuid,
    },
}

fn custom_kind() -> ContactKind {
    ContactKind::Custom
}

impl EditCommand {
    /// The section whose copies this command mutates.
    pub fn section(&self) -> Section {
        use EditCommand::*;
        match self {
            SetName { .. }
            | AddContactField { .. }
            | UpdateContactField { .. }
            | DeleteContactField { .. } => Section::Contact,

            AddExperience
            | UpdateCompany { .. }
            | DeleteExperience { .. }
            | ToggleCollapsed { .. }
            | AddJobTitle { .. }
            | UpdateJobTitle { .. }
            | DeleteJobTitle { .. }
            | AddBullet { .. }
            | UpdateBullet { .. }
            | DeleteBullet { .. }
            | AddProjectGroup { .. }
            | InsertBulletIntoGroup { .. }
            | RenameProjectGroup { .. }
            | DeleteProjectGroup { .. }
            | ReorderProjectGroups { .. }
            | SetProjectTechnologies { .. } => Section::Experience,

            AddEducation
            | UpdateEducation { .. }
            | DeleteEducation { .. }
            | AddDegree { .. }
            | UpdateDegree { .. }
            | DeleteDegree { .. } => Section::Education,

            AddProject
            | UpdateProject { .. }
            | DeleteProject { .. }
            | AddProjectBullet { .. }
            | UpdateProjectBullet { .. }
            | DeleteProjectBullet { .. } => Section::Projects,

            AddSkill | UpdateSkill { .. } | DeleteSkill { .. } => Section::Skills,

            AddAchievement | UpdateAchievement { .. } | DeleteAchievement { .. } => {
                Section::Achievements
            }
        }
    }
}
