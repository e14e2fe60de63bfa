use std::path::PathBuf;
use std::time::Duration;

use helm::commands::CommandContext;
use helm::commands::resolve::ResolveCommand;
use helm::scenario::{Scenario, SimulationEnv};
use helm_core::catalog::Catalogs;
use helm_core::config::{HelmConfig, StartupConfig};
use helm_core::diagnostics::DiagnosticKind;
use helm_core::persistence::PersistenceBridge;
use helm_core::session::{SessionSlot, SessionState};
use tempfile::TempDir;

const CATALOG: &str = r#"
[[agents]]
id = "A1"

[[agents]]
id = "A2"
is_default_starred = true

[[assistants]]
endpoint = "azureAssistants"
id = "X1"
model = "gpt-x"
"#;

fn context(dir: &TempDir, config: HelmConfig) -> CommandContext {
    let catalog_path = dir.path().join("catalog.toml");
    std::fs::write(&catalog_path, CATALOG).unwrap();
    CommandContext {
        config,
        config_path: dir.path().join("config.toml"),
        catalog_paths: vec![catalog_path],
        store_path: dir.path().join("selection.json"),
        slot: SessionSlot(0),
    }
}

#[test]
fn resolve_uses_configured_default_agent() {
    let dir = TempDir::new().unwrap();
    let config = HelmConfig {
        default_agent_id: Some("A2".to_string()),
        ..HelmConfig::default()
    };
    let command = ResolveCommand {
        context: context(&dir, config),
        session: SessionState::with_endpoint("agents"),
        json: true,
    };

    let report = command.resolve().unwrap();

    assert_eq!(report.session.agent_id.as_deref(), Some("A2"));
    assert_eq!(report.session.model.as_deref(), Some(""));
    let values = report.selected_values.unwrap();
    assert_eq!(values.endpoint, "agents");
    assert_eq!(values.model, "A2");
}

#[test]
fn resolve_reports_missing_assistant_namespace() {
    let dir = TempDir::new().unwrap();
    let command = ResolveCommand {
        context: context(&dir, HelmConfig::default()),
        session: SessionState::with_endpoint("assistants"),
        json: false,
    };

    let report = command.resolve().unwrap();

    assert_eq!(report.session, SessionState::with_endpoint("assistants"));
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].kind(), DiagnosticKind::ConditionsNotMet);
    assert!(report.selected_values.is_none());
}

#[test]
fn missing_catalog_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let mut context = context(&dir, HelmConfig::default());
    context.catalog_paths = vec![PathBuf::from("/nonexistent/catalog.toml")];

    assert!(context.load_catalogs().is_err());
}

fn env(catalogs: Catalogs) -> SimulationEnv {
    SimulationEnv {
        catalogs,
        persisted: PersistenceBridge::in_memory(),
        slot: SessionSlot(0),
        startup: StartupConfig::default(),
        quiet_window: Duration::from_millis(150),
    }
}

#[tokio::test(start_paused = true)]
async fn rapid_changes_coalesce_into_one_delivery() {
    let scenario = Scenario::from_toml(
        r#"
        [session]
        endpoint = "openAI"

        [[steps]]
        after_ms = 0
        model = "gpt-4o"

        [[steps]]
        after_ms = 50
        model = "gpt-4o-mini"

        [[steps]]
        after_ms = 50
        spec = "fast"
        "#,
    )
    .unwrap();

    let report = scenario
        .run(env(Catalogs::from_toml(CATALOG).unwrap()))
        .await
        .unwrap();

    assert_eq!(report.deliveries.len(), 1);
    let delivery = &report.deliveries[0];
    assert!((250..=251).contains(&delivery.at_ms));
    assert_eq!(delivery.values.model, "gpt-4o-mini");
    assert_eq!(delivery.values.model_spec, "fast");
}

#[tokio::test(start_paused = true)]
async fn explicit_pick_is_remembered_for_the_next_conversation() {
    let scenario = Scenario::from_toml(
        r#"
        [session]
        endpoint = "agents"

        [[steps]]
        after_ms = 300
        pick = { kind = "agent", id = "A2" }

        [[steps]]
        after_ms = 300
        reset = true
        endpoint = "agents"
        "#,
    )
    .unwrap();

    let report = scenario
        .run(env(Catalogs::from_toml(CATALOG).unwrap()))
        .await
        .unwrap();

    let models: Vec<&str> = report
        .deliveries
        .iter()
        .map(|d| d.values.model.as_str())
        .collect();
    assert_eq!(models, vec!["A1", "A2"]);
    assert_eq!(report.session.agent_id.as_deref(), Some("A2"));
    assert!(report.diagnostics.is_empty());
}
