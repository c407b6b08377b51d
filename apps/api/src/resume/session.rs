//! Editor Session: saved and editing copies of every section plus the routing of edits,
//! drags and scope changes onto them.
//!
//! Opening a section clones its saved copy into the editing copy and records that clone
//! as the change-detection baseline. Every successful edit is applied to the editing copy
//! and then written through to the saved copy. Closing with `Discard` reverts the editing
//! copy from the saved copy.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::resume::commands::EditCommand;
use crate::resume::document::{self as doc, DocumentError, DocumentResult};
use crate::resume::grouping::{self, Entry};
use crate::resume::model::{
    default_contact_fields, Achievement, ContactField, Education, ProfessionalExperience, Project,
    Skill,
};
use crate::resume::reorder::{
    apply_drop, drop_index, reorder_by_drop, DropOutcome, DropPosition, ReorderController,
    DEFAULT_HOVER_THROTTLE,
};
use crate::resume::scope::{KnowledgeScope, ProjectStore};
use crate::resume::snapshot::{Page, PageNavigation, Section, Snapshot, SNAPSHOT_VERSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseMode {
    Keep,
    Discard,
}

/// Saved copy, editing copy and (while open) the baseline taken at open time.
#[derive(Debug, Clone)]
pub struct SectionBuffer<T> {
    saved: T,
    editing: T,
    baseline: Option<T>,
}

impl<T: Clone + PartialEq> SectionBuffer<T> {
    pub fn new(saved: T) -> Self {
        Self {
            editing: saved.clone(),
            saved,
            baseline: None,
        }
    }

    fn restore(saved: T, editing: T, open: bool) -> Self {
        Self {
            baseline: open.then(|| editing.clone()),
            saved,
            editing,
        }
    }

    pub fn saved(&self) -> &T {
        &self.saved
    }

    pub fn editing(&self) -> &T {
        &self.editing
    }

    pub fn is_open(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.baseline
            .as_ref()
            .is_some_and(|baseline| *baseline != self.editing)
    }

    pub fn open(&mut self) {
        self.editing = self.saved.clone();
        self.baseline = Some(self.editing.clone());
    }

    /// Applies `f` to the editing copy and writes the result through to the saved copy.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut T) -> DocumentResult<R>) -> DocumentResult<R> {
        if !self.is_open() {
            self.open();
        }
        let result = f(&mut self.editing)?;
        self.saved = self.editing.clone();
        Ok(result)
    }

    pub fn close(&mut self, mode: CloseMode) {
        match mode {
            CloseMode::Keep => self.saved = self.editing.clone(),
            CloseMode::Discard => self.editing = self.saved.clone(),
        }
        self.baseline = None;
    }

    /// Replaces the saved copy wholesale; an open section is re-seeded from it.
    pub fn overwrite_saved(&mut self, saved: T) {
        self.saved = saved;
        if self.is_open() {
            self.open();
        }
    }
}

/// The project section: editing buffer over the active list, saved copy in the tagged store.
#[derive(Debug, Clone)]
pub struct ProjectSection {
    saved: ProjectStore,
    editing: Vec<Project>,
    baseline: Option<Vec<Project>>,
}

impl ProjectSection {
    fn new(saved: ProjectStore, editing: Vec<Project>, open: bool) -> Self {
        Self {
            baseline: open.then(|| editing.clone()),
            saved,
            editing,
        }
    }

    pub fn saved(&self) -> &ProjectStore {
        &self.saved
    }

    pub fn editing(&self) -> &[Project] {
        &self.editing
    }

    pub fn is_open(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.baseline
            .as_ref()
            .is_some_and(|baseline| *baseline != self.editing)
    }

    fn open(&mut self, scope: KnowledgeScope) {
        self.editing = self.saved.read_active(scope);
        self.baseline = Some(self.editing.clone());
    }

    fn edit<R>(
        &mut self,
        scope: KnowledgeScope,
        f: impl FnOnce(&mut Vec<Project>) -> DocumentResult<R>,
    ) -> DocumentResult<R> {
        if !self.is_open() {
            self.open(scope);
        }
        let result = f(&mut self.editing)?;
        self.saved.write_active(scope, self.editing.clone());
        Ok(result)
    }

    fn close(&mut self, scope: KnowledgeScope, mode: CloseMode) {
        match mode {
            CloseMode::Keep => self.saved.write_active(scope, self.editing.clone()),
            CloseMode::Discard => self.editing = self.saved.read_active(scope),
        }
        self.baseline = None;
    }

    fn overwrite_saved(&mut self, scope: KnowledgeScope, saved: ProjectStore) {
        self.saved = saved;
        if self.is_open() {
            self.open(scope);
        }
    }
}

/// A collection that can be reordered by dragging, with its parent ids when nested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "list", rename_all = "snake_case")]
pub enum ReorderList {
    ContactFields,
    Companies,
    JobTitles { experience_id: Uuid },
    Bullets { experience_id: Uuid, job_title_id: Uuid },
    ProjectGroups { experience_id: Uuid, job_title_id: Uuid },
    Projects,
    Degrees { education_id: Uuid },
    Skills,
    Achievements,
}

impl ReorderList {
    pub fn section(self) -> Section {
        match self {
            ReorderList::ContactFields => Section::Contact,
            ReorderList::Companies
            | ReorderList::JobTitles { .. }
            | ReorderList::Bullets { .. }
            | ReorderList::ProjectGroups { .. } => Section::Experience,
            ReorderList::Projects => Section::Projects,
            ReorderList::Degrees { .. } => Section::Education,
            ReorderList::Skills => Section::Skills,
            ReorderList::Achievements => Section::Achievements,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ReorderList::ContactFields => "contact fields",
            ReorderList::Companies => "companies",
            ReorderList::JobTitles { .. } => "job titles",
            ReorderList::Bullets { .. } => "bullets",
            ReorderList::ProjectGroups { .. } => "project groups",
            ReorderList::Projects => "projects",
            ReorderList::Degrees { .. } => "degrees",
            ReorderList::Skills => "skills",
            ReorderList::Achievements => "achievements",
        }
    }

    /// Bullets are addressed by content index, project groups by named-group index,
    /// everything else by id.
    fn keyed_by_index(self) -> bool {
        matches!(
            self,
            ReorderList::Bullets { .. } | ReorderList::ProjectGroups { .. }
        )
    }
}

/// Element key inside a reorderable collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DragKey {
    Id(Uuid),
    Index(usize),
}

impl DragKey {
    fn id(self) -> Option<Uuid> {
        match self {
            DragKey::Id(id) => Some(id),
            DragKey::Index(_) => None,
        }
    }

    fn index(self) -> Option<usize> {
        match self {
            DragKey::Index(index) => Some(index),
            DragKey::Id(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveDrag {
    list: ReorderList,
    controller: ReorderController<DragKey>,
}

/// What the client needs to draw an in-progress drag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DragView {
    pub list: ReorderList,
    pub dragged: DragKey,
    pub hover_target: Option<DragKey>,
    pub hover_position: Option<DropPosition>,
}

/// Result of a completed drag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropResult {
    pub list: ReorderList,
    pub new_index: Option<usize>,
}

/// The whole editable résumé of one user.
#[derive(Debug, Clone)]
pub struct EditorSession {
    name: String,
    contacts: SectionBuffer<Vec<ContactField>>,
    experiences: SectionBuffer<Vec<ProfessionalExperience>>,
    education: SectionBuffer<Vec<Education>>,
    skills: SectionBuffer<Vec<Skill>>,
    achievements: SectionBuffer<Vec<Achievement>>,
    projects: ProjectSection,
    scope: KnowledgeScope,
    collapsed: HashSet<Uuid>,
    navigation: PageNavigation,
    drag: Option<ActiveDrag>,
    drag_throttle: Duration,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(DEFAULT_HOVER_THROTTLE)
    }
}

/// Saved copies of the sections ingestion overwrites.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedSections {
    pub name: String,
    pub contacts: Vec<ContactField>,
    pub experiences: Vec<ProfessionalExperience>,
    pub education: Vec<Education>,
    pub projects: ProjectStore,
    pub skills: Vec<Skill>,
    pub achievements: Vec<Achievement>,
}

impl EditorSession {
    pub fn new(drag_throttle: Duration) -> Self {
        Self {
            name: String::new(),
            contacts: SectionBuffer::new(default_contact_fields()),
            experiences: SectionBuffer::new(Vec::new()),
            education: SectionBuffer::new(Vec::new()),
            skills: SectionBuffer::new(Vec::new()),
            achievements: SectionBuffer::new(Vec::new()),
            projects: ProjectSection::new(ProjectStore::new(), Vec::new(), false),
            scope: KnowledgeScope::default(),
            collapsed: HashSet::new(),
            navigation: PageNavigation::default(),
            drag: None,
            drag_throttle,
        }
    }

    pub fn from_snapshot(snapshot: Snapshot, drag_throttle: Duration) -> Self {
        let open: HashSet<Section> = snapshot.open_sections.iter().copied().collect();
        let is_open = |section| open.contains(&section);
        Self {
            name: snapshot.name,
            contacts: SectionBuffer::restore(
                snapshot.saved_contact_fields,
                snapshot.contact_fields,
                is_open(Section::Contact),
            ),
            experiences: SectionBuffer::restore(
                snapshot.saved_professional_experiences,
                snapshot.professional_experiences,
                is_open(Section::Experience),
            ),
            education: SectionBuffer::restore(
                snapshot.saved_education,
                snapshot.education,
                is_open(Section::Education),
            ),
            skills: SectionBuffer::restore(
                snapshot.saved_skills,
                snapshot.skills,
                is_open(Section::Skills),
            ),
            achievements: SectionBuffer::restore(
                snapshot.saved_achievements,
                snapshot.achievements,
                is_open(Section::Achievements),
            ),
            projects: ProjectSection::new(
                snapshot.project_store,
                snapshot.editing_projects,
                is_open(Section::Projects),
            ),
            scope: snapshot.knowledge_scope,
            collapsed: snapshot.collapsed_experiences.into_iter().collect(),
            navigation: snapshot.navigation,
            drag: None,
            drag_throttle,
        }
    }

    pub fn to_snapshot(&self) -> Snapshot {
        let mut collapsed: Vec<Uuid> = self.collapsed.iter().copied().collect();
        collapsed.sort();
        Snapshot {
            version: SNAPSHOT_VERSION,
            name: self.name.clone(),
            contact_fields: self.contacts.editing().clone(),
            saved_contact_fields: self.contacts.saved().clone(),
            professional_experiences: self.experiences.editing().clone(),
            saved_professional_experiences: self.experiences.saved().clone(),
            education: self.education.editing().clone(),
            saved_education: self.education.saved().clone(),
            skills: self.skills.editing().clone(),
            saved_skills: self.skills.saved().clone(),
            achievements: self.achievements.editing().clone(),
            saved_achievements: self.achievements.saved().clone(),
            editing_projects: self.projects.editing().to_vec(),
            project_store: self.projects.saved().clone(),
            knowledge_scope: self.scope,
            open_sections: self.open_sections(),
            collapsed_experiences: collapsed,
            navigation: self.navigation.clone(),
        }
    }

    // ── accessors ──────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> KnowledgeScope {
        self.scope
    }

    pub fn contacts(&self) -> &SectionBuffer<Vec<ContactField>> {
        &self.contacts
    }

    pub fn experiences(&self) -> &SectionBuffer<Vec<ProfessionalExperience>> {
        &self.experiences
    }

    pub fn education(&self) -> &SectionBuffer<Vec<Education>> {
        &self.education
    }

    pub fn skills(&self) -> &SectionBuffer<Vec<Skill>> {
        &self.skills
    }

    pub fn achievements(&self) -> &SectionBuffer<Vec<Achievement>> {
        &self.achievements
    }

    pub fn projects(&self) -> &ProjectSection {
        &self.projects
    }

    pub fn navigation(&self) -> &PageNavigation {
        &self.navigation
    }

    pub fn collapsed(&self) -> &HashSet<Uuid> {
        &self.collapsed
    }

    /// The saved project list the current scope reads from.
    pub fn active_projects(&self) -> Vec<Project> {
        self.projects.saved().read_active(self.scope)
    }

    pub fn open_sections(&self) -> Vec<Section> {
        [
            (Section::Contact, self.contacts.is_open()),
            (Section::Experience, self.experiences.is_open()),
            (Section::Education, self.education.is_open()),
            (Section::Projects, self.projects.is_open()),
            (Section::Skills, self.skills.is_open()),
            (Section::Achievements, self.achievements.is_open()),
        ]
        .into_iter()
        .filter_map(|(section, open)| open.then_some(section))
        .collect()
    }

    pub fn is_dirty(&self, section: Section) -> bool {
        match section {
            Section::Contact => self.contacts.is_dirty(),
            Section::Experience => self.experiences.is_dirty(),
            Section::Education => self.education.is_dirty(),
            Section::Projects => self.projects.is_dirty(),
            Section::Skills => self.skills.is_dirty(),
            Section::Achievements => self.achievements.is_dirty(),
        }
    }

    // ── section lifecycle ──────────────────────────────────────────────────

    pub fn open_section(&mut self, section: Section) {
        debug!("Opening section {section:?}");
        match section {
            Section::Contact => self.contacts.open(),
            Section::Experience => self.experiences.open(),
            Section::Education => self.education.open(),
            Section::Projects => self.projects.open(self.scope),
            Section::Skills => self.skills.open(),
            Section::Achievements => self.achievements.open(),
        }
    }

    pub fn close_section(&mut self, section: Section, mode: CloseMode) {
        debug!("Closing section {section:?} ({mode:?})");
        match section {
            Section::Contact => self.contacts.close(mode),
            Section::Experience => self.experiences.close(mode),
            Section::Education => self.education.close(mode),
            Section::Projects => self.projects.close(self.scope, mode),
            Section::Skills => self.skills.close(mode),
            Section::Achievements => self.achievements.close(mode),
        }
        if self
            .drag
            .as_ref()
            .is_some_and(|drag| drag.list.section() == section)
        {
            self.drag = None;
        }
    }

    /// Changes the knowledge scope. An open project section is re-seeded from the newly
    /// active saved list, dropping unsaved edits from the editing buffer.
    pub fn set_scope(&mut self, scope: KnowledgeScope) {
        if scope == self.scope {
            return;
        }
        info!(
            "Knowledge scope changed: established={} expanding={}",
            scope.established_expertise, scope.expanding_knowledge_base
        );
        self.scope = scope;
        if self.projects.is_open() {
            self.projects.open(scope);
        }
    }

    pub fn set_navigation(&mut self, navigation: PageNavigation) {
        self.navigation = navigation;
    }

    /// Overwrites the saved half of every section ingestion produces.
    pub fn replace_saved(&mut self, saved: SavedSections) {
        self.name = saved.name;
        self.contacts.overwrite_saved(saved.contacts);
        self.experiences.overwrite_saved(saved.experiences);
        self.education.overwrite_saved(saved.education);
        self.projects.overwrite_saved(self.scope, saved.projects);
        self.skills.overwrite_saved(saved.skills);
        self.achievements.overwrite_saved(saved.achievements);
        self.collapsed.clear();
        self.drag = None;
        self.navigation.has_crafted = true;
        self.navigation.active_page = Page::Builder;
    }

    // ── edits ──────────────────────────────────────────────────────────────

    pub fn apply(&mut self, command: EditCommand) -> DocumentResult<Option<Uuid>> {
        use EditCommand as C;
        let scope = self.scope;
        match command {
            C::SetName { name } => {
                self.name = name;
                Ok(None)
            }
            C::AddContactField { label, value, kind } => self
                .contacts
                .edit(|fields| Ok(Some(doc::add_contact_field(fields, &label, &value, kind)))),
            C::UpdateContactField { id, patch } => self
                .contacts
                .edit(|fields| doc::update_contact_field(fields, id, patch).map(|_| None)),
            C::DeleteContactField { id } => self
                .contacts
                .edit(|fields| doc::delete_contact_field(fields, id).map(|_| None)),

            C::AddExperience => self
                .experiences
                .edit(|exps| Ok(Some(doc::add_experience(exps)))),
            C::UpdateCompany {
                experience_id,
                company,
            } => self
                .experiences
                .edit(|exps| doc::update_company(exps, experience_id, company).map(|_| None)),
            C::DeleteExperience { experience_id } => {
                let collapsed = &mut self.collapsed;
                self.experiences.edit(|exps| {
                    doc::delete_experience(exps, collapsed, experience_id).map(|_| None)
                })
            }
            C::ToggleCollapsed { experience_id } => {
                if !self.experiences.saved().iter().any(|e| e.id == experience_id) {
                    return Err(DocumentError::NotFound {
                        kind: "Experience",
                        id: experience_id,
                    });
                }
                if !self.collapsed.remove(&experience_id) {
                    self.collapsed.insert(experience_id);
                }
                Ok(None)
            }
            C::AddJobTitle { experience_id } => self
                .experiences
                .edit(|exps| doc::add_job_title(exps, experience_id).map(Some)),
            C::UpdateJobTitle {
                experience_id,
                job_title_id,
                patch,
            } => self.experiences.edit(|exps| {
                doc::update_job_title(exps, experience_id, job_title_id, patch).map(|_| None)
            }),
            C::DeleteJobTitle {
                experience_id,
                job_title_id,
            } => self.experiences.edit(|exps| {
                doc::delete_job_title(exps, experience_id, job_title_id).map(|_| None)
            }),
            C::AddBullet {
                experience_id,
                job_title_id,
            } => self.experiences.edit(|exps| {
                let jt = doc::job_title_mut(exps, experience_id, job_title_id)?;
                doc::add_bullet(jt);
                Ok(None)
            }),
            C::UpdateBullet {
                experience_id,
                job_title_id,
                index,
                text,
            } => self.experiences.edit(|exps| {
                let jt = doc::job_title_mut(exps, experience_id, job_title_id)?;
                doc::update_bullet(jt, index, text).map(|_| None)
            }),
            C::DeleteBullet {
                experience_id,
                job_title_id,
                index,
            } => self.experiences.edit(|exps| {
                let jt = doc::job_title_mut(exps, experience_id, job_title_id)?;
                doc::delete_bullet(jt, index).map(|_| None)
            }),
            C::AddProjectGroup {
                experience_id,
                job_title_id,
                name,
            } => self.experiences.edit(|exps| {
                let jt = doc::job_title_mut(exps, experience_id, job_title_id)?;
                doc::add_project_group(jt, &name);
                Ok(None)
            }),
            C::InsertBulletIntoGroup {
                experience_id,
                job_title_id,
                name,
            } => self.experiences.edit(|exps| {
                let jt = doc::job_title_mut(exps, experience_id, job_title_id)?;
                doc::insert_bullet_into_group(jt, &name).map(|_| None)
            }),
            C::RenameProjectGroup {
                experience_id,
                job_title_id,
                name,
                new_name,
            } => self.experiences.edit(|exps| {
                let jt = doc::job_title_mut(exps, experience_id, job_title_id)?;
                doc::rename_project_group(jt, &name, &new_name).map(|_| None)
            }),
            C::DeleteProjectGroup {
                experience_id,
                job_title_id,
                name,
            } => self.experiences.edit(|exps| {
                let jt = doc::job_title_mut(exps, experience_id, job_title_id)?;
                doc::delete_project_group(jt, &name).map(|_| None)
            }),
            C::ReorderProjectGroups {
                experience_id,
                job_title_id,
                from,
                to,
            } => self.experiences.edit(|exps| {
                let jt = doc::job_title_mut(exps, experience_id, job_title_id)?;
                doc::reorder_project_groups(jt, from, to).map(|_| None)
            }),
            C::SetProjectTechnologies {
                experience_id,
                job_title_id,
                name,
                technologies,
            } => self.experiences.edit(|exps| {
                let jt = doc::job_title_mut(exps, experience_id, job_title_id)?;
                doc::set_project_technologies(jt, &name, technologies).map(|_| None)
            }),

            C::AddEducation => self
                .education
                .edit(|edu| Ok(Some(doc::add_education(edu)))),
            C::UpdateEducation {
                education_id,
                patch,
            } => self
                .education
                .edit(|edu| doc::update_education(edu, education_id, patch).map(|_| None)),
            C::DeleteEducation { education_id } => self
                .education
                .edit(|edu| doc::delete_education(edu, education_id).map(|_| None)),
            C::AddDegree { education_id } => self
                .education
                .edit(|edu| doc::add_degree(edu, education_id).map(Some)),
            C::UpdateDegree {
                education_id,
                degree_id,
                patch,
            } => self.education.edit(|edu| {
                doc::update_degree(edu, education_id, degree_id, patch).map(|_| None)
            }),
            C::DeleteDegree {
                education_id,
                degree_id,
            } => self
                .education
                .edit(|edu| doc::delete_degree(edu, education_id, degree_id).map(|_| None)),

            C::AddProject => self
                .projects
                .edit(scope, |projects| Ok(Some(doc::add_project(projects)))),
            C::UpdateProject { project_id, patch } => self.projects.edit(scope, |projects| {
                doc::update_project(projects, project_id, patch).map(|_| None)
            }),
            C::DeleteProject { project_id } => self.projects.edit(scope, |projects| {
                doc::delete_project(projects, project_id).map(|_| None)
            }),
            C::AddProjectBullet { project_id } => self.projects.edit(scope, |projects| {
                doc::add_project_bullet(projects, project_id).map(|_| None)
            }),
            C::UpdateProjectBullet {
                project_id,
                index,
                text,
            } => self.projects.edit(scope, |projects| {
                doc::update_project_bullet(projects, project_id, index, text).map(|_| None)
            }),
            C::DeleteProjectBullet { project_id, index } => {
                self.projects.edit(scope, |projects| {
                    doc::delete_project_bullet(projects, project_id, index).map(|_| None)
                })
            }

            C::AddSkill => self.skills.edit(|skills| Ok(Some(doc::add_skill(skills)))),
            C::UpdateSkill { skill_id, patch } => self
                .skills
                .edit(|skills| doc::update_skill(skills, skill_id, patch).map(|_| None)),
            C::DeleteSkill { skill_id } => self
                .skills
                .edit(|skills| doc::delete_skill(skills, skill_id).map(|_| None)),

            C::AddAchievement => self
                .achievements
                .edit(|items| Ok(Some(doc::add_achievement(items)))),
            C::UpdateAchievement {
                achievement_id,
                patch,
            } => self.achievements.edit(|items| {
                doc::update_achievement(items, achievement_id, patch).map(|_| None)
            }),
            C::DeleteAchievement { achievement_id } => self
                .achievements
                .edit(|items| doc::delete_achievement(items, achievement_id).map(|_| None)),
        }
    }

    // ── drag and drop ──────────────────────────────────────────────────────

    pub fn drag_start(&mut self, list: ReorderList, key: DragKey) -> DocumentResult<()> {
        validate_key(list, key)?;
        let mut controller = ReorderController::new(self.drag_throttle);
        controller.start(key);
        self.drag = Some(ActiveDrag { list, controller });
        Ok(())
    }

    /// Pointer moved over `target`. `None` when ignored (no drag, other list, throttled).
    pub fn drag_hover(
        &mut self,
        list: ReorderList,
        target: DragKey,
        offset_y: f64,
        target_height: f64,
        now: Instant,
    ) -> Option<DropPosition> {
        let drag = self.drag.as_mut().filter(|drag| drag.list == list)?;
        drag.controller
            .hover_over(target, offset_y, target_height, now)
    }

    pub fn drag_cancel(&mut self) {
        if let Some(drag) = self.drag.take() {
            debug!("Drag on {:?} cancelled", drag.list);
        }
    }

    pub fn drag_state(&self) -> Option<DragView> {
        let drag = self.drag.as_ref()?;
        let dragged = *drag.controller.dragged()?;
        let hover = drag.controller.hover();
        Some(DragView {
            list: drag.list,
            dragged,
            hover_target: hover.map(|h| h.target),
            hover_position: hover.map(|h| h.position),
        })
    }

    /// Completes the active drag on `target` and reorders the collection.
    pub fn drag_drop(
        &mut self,
        list: ReorderList,
        target: DragKey,
        offset_y: f64,
        target_height: f64,
    ) -> DocumentResult<DropResult> {
        validate_key(list, target)?;
        let Some(mut drag) = self.drag.take() else {
            return Ok(DropResult {
                list,
                new_index: None,
            });
        };
        if drag.list != list {
            debug!("Drop on {list:?} ignored: drag started on {:?}", drag.list);
            return Ok(DropResult {
                list,
                new_index: None,
            });
        }
        let Some(outcome) = drag.controller.drop_on(target, offset_y, target_height) else {
            return Ok(DropResult {
                list,
                new_index: None,
            });
        };
        let new_index = self.apply_drop_outcome(list, &outcome)?;
        Ok(DropResult { list, new_index })
    }

    fn apply_drop_outcome(
        &mut self,
        list: ReorderList,
        outcome: &DropOutcome<DragKey>,
    ) -> DocumentResult<Option<usize>> {
        let scope = self.scope;
        match list {
            ReorderList::ContactFields => self
                .contacts
                .edit(|items| Ok(apply_drop(items, &by_id(outcome), |f| f.id))),
            ReorderList::Companies => self
                .experiences
                .edit(|items| Ok(apply_drop(items, &by_id(outcome), |e| e.id))),
            ReorderList::JobTitles { experience_id } => self.experiences.edit(|exps| {
                let experience = doc::find_mut(exps, experience_id)?;
                Ok(apply_drop(
                    &mut experience.job_titles,
                    &by_id(outcome),
                    |j| j.id,
                ))
            }),
            ReorderList::Bullets {
                experience_id,
                job_title_id,
            } => self.experiences.edit(|exps| {
                let jt = doc::job_title_mut(exps, experience_id, job_title_id)?;
                let (from, target) = by_index(outcome);
                match jt.content.get(from) {
                    Some(Entry::Bullet { .. }) => {}
                    Some(Entry::ProjectHeader { .. }) => {
                        return Err(DocumentError::NotABullet { index: from })
                    }
                    None => {
                        return Err(DocumentError::IndexOutOfRange {
                            index: from,
                            len: jt.content.len(),
                        })
                    }
                }
                Ok(reorder_by_drop(&mut jt.content, from, target, outcome.position))
            }),
            ReorderList::ProjectGroups {
                experience_id,
                job_title_id,
            } => self.experiences.edit(|exps| {
                let jt = doc::job_title_mut(exps, experience_id, job_title_id)?;
                let (from, target) = by_index(outcome);
                let len = grouping::group_names(&jt.content).len();
                if from >= len || target >= len {
                    return Err(DocumentError::IndexOutOfRange {
                        index: from.max(target),
                        len,
                    });
                }
                let to = drop_index(from, target, outcome.position, len);
                grouping::reorder_groups(&mut jt.content, from, to);
                Ok(Some(to))
            }),
            ReorderList::Projects => self
                .projects
                .edit(scope, |items| Ok(apply_drop(items, &by_id(outcome), |p| p.id))),
            ReorderList::Degrees { education_id } => self.education.edit(|edu| {
                let entry = doc::find_mut(edu, education_id)?;
                Ok(apply_drop(&mut entry.degrees, &by_id(outcome), |d| d.id))
            }),
            ReorderList::Skills => self
                .skills
                .edit(|items| Ok(apply_drop(items, &by_id(outcome), |s| s.id))),
            ReorderList::Achievements => self
                .achievements
                .edit(|items| Ok(apply_drop(items, &by_id(outcome), |a| a.id))),
        }
    }
}

fn validate_key(list: ReorderList, key: DragKey) -> DocumentResult<()> {
    let ok = if list.keyed_by_index() {
        key.index().is_some()
    } else {
        key.id().is_some()
    };
    if ok {
        Ok(())
    } else {
        Err(DocumentError::InvalidDragKey(list.label()))
    }
}

/// Keys are validated on drag start and drop, so a list keyed by id only ever sees ids.
fn by_id(outcome: &DropOutcome<DragKey>) -> DropOutcome<Uuid> {
    DropOutcome {
        dragged: outcome.dragged.id().unwrap_or_default(),
        target: outcome.target.id().unwrap_or_default(),
        position: outcome.position,
    }
}

fn by_index(outcome: &DropOutcome<DragKey>) -> (usize, usize) {
    (
        outcome.dragged.index().unwrap_or(usize::MAX),
        outcome.target.index().unwrap_or(usize::MAX),
    )
}
