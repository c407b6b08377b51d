//! Knowledge-Scope Router.
//!
//! Projects live in one store, each tagged Established or Expanding. The active list is a
//! query over that store driven by the two scope toggles:
//!
//! | established | expanding | reads                     | writes go to |
//! |-------------|-----------|---------------------------|--------------|
//! | any         | off       | Established               | Established  |
//! | off         | on        | Expanding                 | Expanding    |
//! | on          | on        | Established ++ Expanding  | Established, Expanding emptied |

use serde::{Deserialize, Serialize};

use crate::resume::model::Project;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectScope {
    Established,
    Expanding,
}

impl ProjectScope {
    /// Label used by upstream services.
    pub fn tag(self) -> &'static str {
        match self {
            ProjectScope::Established => "Established Expertise",
            ProjectScope::Expanding => "Expanding Knowledge Base",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeScope {
    #[serde(default = "default_true")]
    pub established_expertise: bool,
    #[serde(default)]
    pub expanding_knowledge_base: bool,
}

fn default_true() -> bool {
    true
}

impl Default for KnowledgeScope {
    fn default() -> Self {
        Self {
            established_expertise: true,
            expanding_knowledge_base: false,
        }
    }
}

/// The three distinct routing behaviors of the four toggle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Established,
    Expanding,
    Merged,
}

impl KnowledgeScope {
    pub fn new(established_expertise: bool, expanding_knowledge_base: bool) -> Self {
        Self {
            established_expertise,
            expanding_knowledge_base,
        }
    }

    pub fn route(self) -> Route {
        match (self.established_expertise, self.expanding_knowledge_base) {
            (true, true) => Route::Merged,
            (false, true) => Route::Expanding,
            _ => Route::Established,
        }
    }

    /// Scope tags of every selected toggle, in display order.
    pub fn tags(self) -> Vec<&'static str> {
        let mut tags = Vec::new();
        if self.established_expertise {
            tags.push(ProjectScope::Established.tag());
        }
        if self.expanding_knowledge_base {
            tags.push(ProjectScope::Expanding.tag());
        }
        tags
    }

    pub fn write_target(self) -> ProjectScope {
        match self.route() {
            Route::Expanding => ProjectScope::Expanding,
            Route::Established | Route::Merged => ProjectScope::Established,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopedProject {
    pub scope: ProjectScope,
    #[serde(flatten)]
    pub project: Project,
}

/// Single store of every flat project, tagged by scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectStore {
    entries: Vec<ScopedProject>,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lists(established: Vec<Project>, expanding: Vec<Project>) -> Self {
        let mut store = Self::new();
        store.replace(ProjectScope::Established, established);
        store.replace(ProjectScope::Expanding, expanding);
        store
    }

    pub fn entries(&self) -> &[ScopedProject] {
        &self.entries
    }

    pub fn list(&self, scope: ProjectScope) -> Vec<Project> {
        self.entries
            .iter()
            .filter(|e| e.scope == scope)
            .map(|e| e.project.clone())
            .collect()
    }

    pub fn count(&self, scope: ProjectScope) -> usize {
        self.entries.iter().filter(|e| e.scope == scope).count()
    }

    /// Replaces every project tagged `scope` with `projects`, leaving the other scope alone.
    pub fn replace(&mut self, scope: ProjectScope, projects: Vec<Project>) {
        self.entries.retain(|e| e.scope != scope);
        self.entries.extend(
            projects
                .into_iter()
                .map(|project| ScopedProject { scope, project }),
        );
    }

    /// The list the current scope reads from.
    pub fn read_active(&self, scope: KnowledgeScope) -> Vec<Project> {
        match scope.route() {
            Route::Established => self.list(ProjectScope::Established),
            Route::Expanding => self.list(ProjectScope::Expanding),
            Route::Merged => {
                let mut combined = self.list(ProjectScope::Established);
                combined.extend(self.list(ProjectScope::Expanding));
                combined
            }
        }
    }

    /// Stores the active list. With both toggles on everything collapses into Established
    /// so the next combined read cannot show a project twice.
    pub fn write_active(&mut self, scope: KnowledgeScope, projects: Vec<Project>) {
        match scope.route() {
            Route::Established | Route::Expanding => self.replace(scope.write_target(), projects),
            Route::Merged => {
                self.entries.clear();
                self.replace(ProjectScope::Established, projects);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(name: &str) -> Project {
        Project {
            name: name.to_string(),
            ..Project::blank()
        }
    }

    fn names(projects: &[Project]) -> Vec<&str> {
        projects.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_routes_for_all_four_states() {
        assert_eq!(KnowledgeScope::new(false, false).route(), Route::Established);
        assert_eq!(KnowledgeScope::new(true, false).route(), Route::Established);
        assert_eq!(KnowledgeScope::new(false, true).route(), Route::Expanding);
        assert_eq!(KnowledgeScope::new(true, true).route(), Route::Merged);
    }

    #[test]
    fn test_single_scope_reads_and_writes_its_own_list() {
        let mut store = ProjectStore::from_lists(vec![project("est")], vec![project("exp")]);
        let expanding = KnowledgeScope::new(false, true);
        assert_eq!(names(&store.read_active(expanding)), vec!["exp"]);

        store.write_active(expanding, vec![project("exp2"), project("exp3")]);
        assert_eq!(names(&store.list(ProjectScope::Established)), vec!["est"]);
        assert_eq!(names(&store.list(ProjectScope::Expanding)), vec!["exp2", "exp3"]);
    }

    #[test]
    fn test_both_scopes_read_concatenation() {
        let store = ProjectStore::from_lists(vec![project("a")], vec![project("b")]);
        let both = KnowledgeScope::new(true, true);
        assert_eq!(names(&store.read_active(both)), vec!["a", "b"]);
    }

    #[test]
    fn test_both_scopes_write_merges_into_established() {
        let mut store = ProjectStore::from_lists(vec![project("a")], vec![project("b")]);
        let both = KnowledgeScope::new(true, true);
        let mut active = store.read_active(both);
        active.push(project("c"));
        store.write_active(both, active);

        assert_eq!(store.count(ProjectScope::Expanding), 0);
        assert_eq!(store.read_active(both), store.list(ProjectScope::Established));
        assert_eq!(names(&store.read_active(both)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_scope_tags() {
        assert_eq!(
            KnowledgeScope::new(true, true).tags(),
            vec!["Established Expertise", "Expanding Knowledge Base"]
        );
        assert!(KnowledgeScope::new(false, false).tags().is_empty());
    }

    #[test]
    fn test_store_serializes_with_scope_tags() {
        let store = ProjectStore::from_lists(vec![project("a")], vec![]);
        let value = serde_json::to_value(&store).unwrap();
        assert_eq!(value[0]["scope"], "established");
        assert_eq!(value[0]["name"], "a");
        let back: ProjectStore = serde_json::from_value(value).unwrap();
        assert_eq!(back, store);
    }
}
