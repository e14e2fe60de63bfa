use serde::{Deserialize, Serialize};
use strum::Display;

use crate::session::SessionField;

/// Endpoint tag that puts a session into agents mode.
pub const AGENTS_ENDPOINT: &str = "agents";

/// Suffix shared by every assistants endpoint (`assistants`, `azureAssistants`, ...).
pub const ASSISTANTS_ENDPOINT_SUFFIX: &str = "assistants";

/// Selection mode of a session, derived once from its endpoint string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EndpointKind {
    Agents,
    Assistants,
    Generic,
}

impl EndpointKind {
    /// Classify an endpoint tag. Returns `None` when the session has no endpoint,
    /// which callers treat as an idle state rather than an error.
    pub fn classify(endpoint: Option<&str>) -> Option<Self> {
        let endpoint = endpoint.filter(|e| !e.is_empty())?;
        if is_agents_endpoint(endpoint) {
            Some(EndpointKind::Agents)
        } else if is_assistants_endpoint(endpoint) {
            Some(EndpointKind::Assistants)
        } else {
            Some(EndpointKind::Generic)
        }
    }

    /// The entity kind governed by this mode, if any.
    pub fn entity_kind(self) -> Option<EntityKind> {
        match self {
            EndpointKind::Agents => Some(EntityKind::Agent),
            EndpointKind::Assistants => Some(EntityKind::Assistant),
            EndpointKind::Generic => None,
        }
    }
}

pub fn is_agents_endpoint(endpoint: &str) -> bool {
    endpoint == AGENTS_ENDPOINT
}

pub fn is_assistants_endpoint(endpoint: &str) -> bool {
    endpoint
        .to_ascii_lowercase()
        .ends_with(ASSISTANTS_ENDPOINT_SUFFIX)
}

/// Kind of selectable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Agent,
    Assistant,
}

impl EntityKind {
    /// Prefix of the key-value store key holding the last-used id for a slot.
    pub fn storage_prefix(self) -> &'static str {
        match self {
            EntityKind::Agent => "agent_id__",
            EntityKind::Assistant => "assistant_id__",
        }
    }

    /// Session field that holds the selected id of this kind.
    pub fn session_field(self) -> SessionField {
        match self {
            EntityKind::Agent => SessionField::AgentId,
            EntityKind::Assistant => SessionField::AssistantId,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("agents"), Some(EndpointKind::Agents))]
    #[case(Some("assistants"), Some(EndpointKind::Assistants))]
    #[case(Some("azureAssistants"), Some(EndpointKind::Assistants))]
    #[case(Some("openAI"), Some(EndpointKind::Generic))]
    #[case(Some("Agents"), Some(EndpointKind::Generic))]
    #[case(Some(""), None)]
    #[case(None, None)]
    fn classifies_endpoints(#[case] endpoint: Option<&str>, #[case] expected: Option<EndpointKind>) {
        assert_eq!(EndpointKind::classify(endpoint), expected);
    }

    #[test]
    fn entity_kinds_map_to_session_fields() {
        assert_eq!(EntityKind::Agent.session_field(), SessionField::AgentId);
        assert_eq!(
            EntityKind::Assistant.session_field(),
            SessionField::AssistantId
        );
        assert_eq!(EndpointKind::Generic.entity_kind(), None);
    }
}
