use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// A record that can be looked up by id inside a catalog partition.
pub trait Entity {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether admins marked this agent as starred for every user by default.
    #[serde(default)]
    pub is_default_starred: bool,
}

impl Agent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: None,
            is_default_starred: false,
        }
    }
}

impl Entity for Agent {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assistant {
    pub id: String,
    /// Underlying model surfaced on the session when this assistant is selected.
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Assistant {
    pub fn new(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            name: None,
        }
    }
}

impl Entity for Assistant {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Insertion-ordered id → entity map. Membership is the sole authority for
/// whether an entity exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMap<T> {
    entries: IndexMap<String, T>,
}

impl<T> Default for EntityMap<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<T: Entity> EntityMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity. Re-inserting an existing id replaces the record but
    /// keeps its original position.
    pub fn insert(&mut self, entity: T) {
        self.entries.insert(entity.id().to_string(), entity);
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// First entity in insertion order.
    pub fn first(&self) -> Option<&T> {
        self.entries.first().map(|(_, entity)| entity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }
}

impl<T: Entity> FromIterator<T> for EntityMap<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut map = Self::new();
        for entity in iter {
            map.insert(entity);
        }
        map
    }
}

pub type AgentCatalog = EntityMap<Agent>;
pub type AssistantNamespace = EntityMap<Assistant>;

/// Assistants partitioned by namespace (the endpoint that serves them).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantCatalog {
    namespaces: HashMap<String, AssistantNamespace>,
}

impl AssistantCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, namespace: impl Into<String>, assistant: Assistant) {
        self.namespaces
            .entry(namespace.into())
            .or_default()
            .insert(assistant);
    }

    pub fn namespace(&self, namespace: &str) -> Option<&AssistantNamespace> {
        self.namespaces.get(namespace)
    }

    pub fn get(&self, namespace: &str, id: &str) -> Option<&Assistant> {
        self.namespace(namespace).and_then(|ns| ns.get(id))
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.values().all(EntityMap::is_empty)
    }
}

/// Every catalog the selector reads from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalogs {
    pub agents: AgentCatalog,
    pub assistants: AssistantCatalog,
}

#[derive(Debug, Deserialize, Serialize)]
struct AssistantRecord {
    endpoint: String,
    #[serde(flatten)]
    assistant: Assistant,
}

/// Root structure of a catalog TOML file.
#[derive(Debug, Default, Deserialize, Serialize)]
struct CatalogFile {
    #[serde(default)]
    agents: Vec<Agent>,
    #[serde(default)]
    assistants: Vec<AssistantRecord>,
}

impl Catalogs {
    /// Load and merge catalog files in order. Later files override entities
    /// with the same id in place; new ids are appended.
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut catalogs = Self::default();
        for path in paths {
            let file = Self::load_file(path)?;
            catalogs.merge(file);
        }
        Ok(catalogs)
    }

    /// Parse a catalog from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(contents)?;
        let mut catalogs = Self::default();
        catalogs.merge(file);
        Ok(catalogs)
    }

    fn load_file(path: &Path) -> Result<CatalogFile> {
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "catalog file {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let file: CatalogFile = toml::from_str(&content).map_err(|e| {
            Error::Configuration(format!(
                "Failed to parse catalog at {}: {}",
                path.display(),
                e
            ))
        })?;

        debug!(
            path = %path.display(),
            agents = file.agents.len(),
            assistants = file.assistants.len(),
            "Loaded catalog file"
        );
        Ok(file)
    }

    fn merge(&mut self, file: CatalogFile) {
        for agent in file.agents {
            self.agents.insert(agent);
        }
        for record in file.assistants {
            self.assistants.insert(record.endpoint, record.assistant);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn entity_map_keeps_insertion_order() {
        let catalog: AgentCatalog = ["b", "a", "c"].into_iter().map(Agent::new).collect();

        assert_eq!(catalog.first().map(|a| a.id.as_str()), Some("b"));
        let ids: Vec<_> = catalog.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert!(catalog.contains("c"));
        assert!(!catalog.contains("d"));
    }

    #[test]
    fn reinserting_replaces_in_place() {
        let mut catalog: AgentCatalog = ["a", "b"].into_iter().map(Agent::new).collect();
        let mut renamed = Agent::new("a");
        renamed.name = Some("Alpha".to_string());
        catalog.insert(renamed);

        assert_eq!(catalog.len(), 2);
        let first = catalog.first().unwrap();
        assert_eq!(first.id, "a");
        assert_eq!(first.name.as_deref(), Some("Alpha"));
    }

    #[test]
    fn assistants_are_partitioned_by_namespace() {
        let mut catalog = AssistantCatalog::new();
        catalog.insert("assistants", Assistant::new("X1", "gpt-x"));
        catalog.insert("azureAssistants", Assistant::new("Z1", "gpt-z"));

        assert!(catalog.get("assistants", "X1").is_some());
        assert!(catalog.get("assistants", "Z1").is_none());
        assert_eq!(catalog.get("azureAssistants", "Z1").unwrap().model, "gpt-z");
        assert!(catalog.namespace("other").is_none());
        assert!(!catalog.is_empty());
    }

    #[test]
    fn parses_catalog_toml() {
        let toml = r#"
[[agents]]
id = "A1"
name = "Researcher"

[[agents]]
id = "A2"
is_default_starred = true

[[assistants]]
endpoint = "assistants"
id = "X1"
model = "gpt-x"
"#;
        let catalogs = Catalogs::from_toml(toml).unwrap();

        assert_eq!(catalogs.agents.len(), 2);
        assert!(catalogs.agents.get("A2").unwrap().is_default_starred);
        assert_eq!(
            catalogs.assistants.get("assistants", "X1").unwrap().model,
            "gpt-x"
        );
    }

    #[test]
    fn later_files_override_earlier_ones() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("base.toml");
        let overlay = dir.path().join("overlay.toml");
        fs::write(
            &base,
            r#"
[[agents]]
id = "A1"
name = "Old"

[[agents]]
id = "A2"
"#,
        )
        .unwrap();
        fs::write(
            &overlay,
            r#"
[[agents]]
id = "A1"
name = "New"

[[agents]]
id = "A3"
"#,
        )
        .unwrap();

        let catalogs = Catalogs::load(&[base, overlay]).unwrap();
        let ids: Vec<_> = catalogs.agents.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A2", "A3"]);
        assert_eq!(catalogs.agents.get("A1").unwrap().name.as_deref(), Some("New"));
    }

    #[test]
    fn missing_catalog_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = Catalogs::load(&[dir.path().join("absent.toml")]).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
