//! Connector settings.
//!
//! Settings are plain serde data, usually read from a JSON file:
//!
//! ```json
//! {
//!     "project_id": "my-project",
//!     "namespace": "staging",
//!     "models": [
//!         { "name": "Note", "properties": ["title", "body", "status"] },
//!         { "name": "Tag", "id_property": "slug", "properties": ["label"] }
//!     ]
//! }
//! ```

use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConnectorError, ConnectorResult},
    schema::{ModelDefinition, ModelRegistry},
};

/// Settings for a connector and its backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorSettings {
    /// The store project (or database) to connect to.
    pub project_id: String,
    /// Optional namespace partitioning kinds inside the project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Model definitions served by the connector.
    #[serde(default)]
    pub models: Vec<ModelDefinition>,
}

impl ConnectorSettings {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            namespace: None,
            models: Vec::new(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_model(mut self, model: ModelDefinition) -> Self {
        self.models.push(model);
        self
    }

    /// Parses settings from a JSON string.
    pub fn from_json_str(json: &str) -> ConnectorResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ConnectorError::Initialization(format!("invalid settings: {e}")))
    }

    /// Reads settings from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> ConnectorResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ConnectorError::Initialization(format!("cannot read {}: {e}", path.display()))
        })?;

        Self::from_json_str(&json)
    }

    /// Checks the settings are usable.
    ///
    /// The project id must be non-empty, and every model needs a non-empty, unique name
    /// and a non-empty identifier property.
    pub fn validate(&self) -> ConnectorResult<()> {
        if self.project_id.trim().is_empty() {
            return Err(ConnectorError::Initialization("missing project_id".into()));
        }

        if matches!(&self.namespace, Some(namespace) if namespace.trim().is_empty()) {
            return Err(ConnectorError::Initialization("namespace must not be empty when set".into()));
        }

        let mut seen = HashSet::new();

        for model in &self.models {
            if model.name.trim().is_empty() {
                return Err(ConnectorError::Initialization("model with an empty name".into()));
            }
            if model.id_property.trim().is_empty() {
                return Err(ConnectorError::Initialization(format!(
                    "model {} has an empty id_property",
                    model.name
                )));
            }
            if !seen.insert(model.name.as_str()) {
                return Err(ConnectorError::Initialization(format!(
                    "model {} is defined more than once",
                    model.name
                )));
            }
        }

        Ok(())
    }
}

impl ModelRegistry {
    /// Builds a registry from validated settings.
    pub fn from_settings(settings: &ConnectorSettings) -> ConnectorResult<Self> {
        settings.validate()?;

        Ok(settings.models.iter().cloned().collect())
    }
}
