//! The `projects` collection

use serde::{Deserialize, Serialize};
use sessiongate_core::*;
use std::sync::Arc;

use crate::{Collection, StorageEngine};

pub const PROJECTS_COLLECTION: &str = "projects";

/// A stored project together with its id, as listed to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub id: ProjectId,
    #[serde(flatten)]
    pub project: Project,
}

#[derive(Clone)]
pub struct ProjectStore {
    projects: Arc<Collection>,
}

impl ProjectStore {
    pub fn new(engine: &StorageEngine) -> Result<Self> {
        Ok(ProjectStore {
            projects: Arc::new(engine.collection(PROJECTS_COLLECTION)?),
        })
    }

    pub fn create(&self, project: &Project) -> Result<ProjectId> {
        let id = ProjectId::generate();
        self.projects.set(id.as_str(), project)?;
        Ok(id)
    }

    pub fn get(&self, id: &ProjectId) -> Result<Option<Project>> {
        self.projects.get(id.as_str())
    }

    pub fn list(&self) -> Result<Vec<ProjectEntry>> {
        self.projects
            .list::<Project>()?
            .into_iter()
            .map(|(id, project)| {
                Ok(ProjectEntry {
                    id: ProjectId::new(&id)?,
                    project,
                })
            })
            .collect()
    }

    /// Apply `patch` to a stored project. Returns `false` for an unknown id.
    pub fn update(&self, id: &ProjectId, patch: ProjectPatch) -> Result<bool> {
        self.projects
            .update::<Project, _>(id.as_str(), |project| project.apply(patch))
    }

    /// Returns `false` for an unknown id
    pub fn delete(&self, id: &ProjectId) -> Result<bool> {
        self.projects.delete(id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(title: &str) -> Project {
        Project {
            title: Some(title.to_string()),
            description: Some("desc".to_string()),
            technologies: vec!["rust".to_string()],
            source_code: Some("https://example.com/repo".to_string()),
        }
    }

    #[test]
    fn test_project_lifecycle() {
        let (engine, _temp) = StorageEngine::temp().unwrap();
        let store = ProjectStore::new(&engine).unwrap();

        assert!(store.list().unwrap().is_empty());

        let id = store.create(&project("first")).unwrap();
        assert_eq!(store.get(&id).unwrap(), Some(project("first")));

        let patch = ProjectPatch {
            title: Some("renamed".to_string()),
            description: Some(String::new()),
            technologies: Some(vec![]),
            source_code: None,
        };
        assert!(store.update(&id, patch).unwrap());

        let updated = store.get(&id).unwrap().unwrap();
        assert_eq!(updated.title.as_deref(), Some("renamed"));
        assert_eq!(updated.description.as_deref(), Some("desc"));
        assert!(updated.technologies.is_empty());
        assert_eq!(updated.source_code.as_deref(), Some("https://example.com/repo"));

        assert!(store.delete(&id).unwrap());
        assert!(store.get(&id).unwrap().is_none());
    }

    #[test]
    fn test_unknown_id_is_reported() {
        let (engine, _temp) = StorageEngine::temp().unwrap();
        let store = ProjectStore::new(&engine).unwrap();
        let ghost = ProjectId::generate();

        assert!(!store.update(&ghost, ProjectPatch::default()).unwrap());
        assert!(!store.delete(&ghost).unwrap());
    }

    #[test]
    fn test_list_includes_ids_in_creation_order() {
        let (engine, _temp) = StorageEngine::temp().unwrap();
        let store = ProjectStore::new(&engine).unwrap();

        let first = store.create(&project("a")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = store.create(&project("b")).unwrap();

        let entries = store.list().unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, vec![first, second]);

        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(json["title"], "a");
        assert_eq!(json["sourceCode"], "https://example.com/repo");
        assert!(json["id"].is_string());
    }
}
