use serde::{Deserialize, Serialize};
use strum::Display;

use crate::endpoint::{EndpointKind, EntityKind};

/// Index of a conversation pane. Scopes persisted last-used ids.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionSlot(pub usize);

impl std::fmt::Display for SessionSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session fields the selector is allowed to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionField {
    Model,
    AgentId,
    AssistantId,
}

/// Selection-relevant view of the active conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Applied preset/spec id, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
}

impl SessionState {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Self::default()
        }
    }

    pub fn endpoint_kind(&self) -> Option<EndpointKind> {
        EndpointKind::classify(self.endpoint.as_deref())
    }

    /// Currently selected id for an entity kind. A present value counts as a
    /// selection even when empty, matching the setter contract.
    pub fn selected_id(&self, kind: EntityKind) -> Option<&str> {
        match kind {
            EntityKind::Agent => self.agent_id.as_deref(),
            EntityKind::Assistant => self.assistant_id.as_deref(),
        }
    }

    pub fn field(&self, field: SessionField) -> Option<&str> {
        match field {
            SessionField::Model => self.model.as_deref(),
            SessionField::AgentId => self.agent_id.as_deref(),
            SessionField::AssistantId => self.assistant_id.as_deref(),
        }
    }

    fn slot_mut(&mut self, field: SessionField) -> &mut Option<String> {
        match field {
            SessionField::Model => &mut self.model,
            SessionField::AgentId => &mut self.agent_id,
            SessionField::AssistantId => &mut self.assistant_id,
        }
    }
}

/// Narrow write path into a session: the only way the selector mutates it.
pub trait OptionSetter {
    fn set_option(&mut self, field: SessionField, value: String);
}

impl OptionSetter for SessionState {
    fn set_option(&mut self, field: SessionField, value: String) {
        *self.slot_mut(field) = Some(value);
    }
}

/// Whether a field holds a non-empty value.
pub(crate) fn is_set(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}
