// tests/sync_workflow.rs

//! End-to-end sync runs against a filesystem source and a SQLite target.

mod common;

use common::TestEnv;
use ledgersync::sync::{Comparator, SyncAction};
use ledgersync::{
    db, ConflictPolicy, EntityStatus, Error, Orchestrator, RecordSource, Stage, SyncOptions,
    SyncStatus,
};

const OLD: &str = "2024-01-31_23-00-00";
const NEW: &str = "2024-02-01_08-30-00";

fn options(entities: &[&str]) -> SyncOptions {
    SyncOptions {
        entities: entities.iter().map(|e| e.to_string()).collect(),
        ..Default::default()
    }
}

#[test]
fn test_insert_into_empty_target() {
    let env = TestEnv::new();
    env.write_extract(NEW, "contacts.json", r#"[{"id": 1, "name": "Acme"}]"#);
    let source = env.source();
    let orchestrator = Orchestrator::new(&env.registry, &source, &env.db_path);

    let report = orchestrator.run(&options(&["contacts"])).unwrap();

    let comparison = &report.comparisons["contacts"];
    assert_eq!(comparison.missing_in_target.len(), 1);
    assert!(comparison.missing_in_target.contains("1"));

    let recommendations = &report.recommendations["contacts"];
    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0].action, SyncAction::Insert);
    assert_eq!(recommendations[0].keys, vec!["1".to_string()]);

    assert_eq!(env.row_count("Contacts"), 1);
    assert_eq!(
        env.column_text("Contacts", "ID", "1", "Name"),
        Some("Acme".to_string())
    );
}

#[test]
fn test_update_changed_row() {
    let env = TestEnv::new();
    env.execute("INSERT INTO Contacts (ID, Name) VALUES ('1', 'Acme')");
    env.write_extract(NEW, "contacts.json", r#"[{"id": 1, "name": "Acme Corp"}]"#);
    let source = env.source();
    let orchestrator = Orchestrator::new(&env.registry, &source, &env.db_path);

    let report = orchestrator.run(&options(&["contacts"])).unwrap();

    assert!(report.comparisons["contacts"].changed.contains("1"));
    assert_eq!(
        report.comparisons["contacts"].field_diffs["1"],
        vec!["Name".to_string()]
    );
    assert_eq!(
        env.column_text("Contacts", "ID", "1", "Name"),
        Some("Acme Corp".to_string())
    );
    assert_eq!(report.execution_statistics.unwrap().totals.updates, 1);
}

#[test]
fn test_orphan_target_row_is_never_touched() {
    let env = TestEnv::new();
    env.execute("INSERT INTO Contacts (ID, Name) VALUES ('2', 'Ghost')");
    env.write_extract(NEW, "contacts.json", r#"[{"id": 1, "name": "Acme"}]"#);
    let source = env.source();
    let orchestrator = Orchestrator::new(&env.registry, &source, &env.db_path);

    let report = orchestrator.run(&options(&["contacts"])).unwrap();

    assert!(report.comparisons["contacts"].missing_in_source.contains("2"));
    let investigate = report.recommendations["contacts"]
        .iter()
        .find(|r| r.action == SyncAction::Investigate)
        .unwrap();
    assert_eq!(investigate.keys, vec!["2".to_string()]);
    assert_eq!(
        env.column_text("Contacts", "ID", "2", "Name"),
        Some("Ghost".to_string())
    );
    assert_eq!(env.row_count("Contacts"), 2);

    let stats = report.execution_statistics.unwrap();
    assert_eq!(stats.totals.investigations, 1);
    assert_eq!(stats.totals.records_deferred, 1);
}

#[test]
fn test_record_without_key_is_excluded() {
    let env = TestEnv::new();
    env.write_extract(
        NEW,
        "contacts.json",
        r#"[{"name": "No Key"}, {"id": "", "name": "Blank"}, {"id": 1, "name": "Acme"}]"#,
    );
    let source = env.source();
    let orchestrator = Orchestrator::new(&env.registry, &source, &env.db_path);

    let report = orchestrator.run(&options(&["contacts"])).unwrap();

    let comparison = &report.comparisons["contacts"];
    assert_eq!(comparison.source_count, 1);
    assert_eq!(comparison.dropped_records, 2);
    assert_eq!(comparison.diagnostics.len(), 2);
    assert_eq!(report.comparison_results["contacts"].dropped_records, 2);
    assert_eq!(env.row_count("Contacts"), 1);
    assert_eq!(
        report.verification_report.unwrap().sync_status,
        SyncStatus::Perfect
    );
}

#[test]
fn test_second_run_has_nothing_to_write() {
    let env = TestEnv::new();
    env.write_extract(
        NEW,
        "contacts.json",
        r#"{"contacts": [
            {"id": 1, "name": " Acme ", "email": null},
            {"id": "2", "name": "Globex", "email": "ops@globex.test", "active": true}
        ]}"#,
    );
    env.write_extract(
        NEW,
        "Items.json",
        r#"{"data": [{"item_id": 10, "rate": "12.50"}, {"item_id": 11, "rate": 3}]}"#,
    );
    let source = env.source();
    let orchestrator = Orchestrator::new(&env.registry, &source, &env.db_path);

    let first = orchestrator.run(&SyncOptions::default()).unwrap();
    assert_eq!(first.execution_statistics.unwrap().totals.inserts, 4);

    let second = orchestrator.run(&SyncOptions::default()).unwrap();
    for recommendations in second.recommendations.values() {
        assert!(recommendations.iter().all(|r| !r.action.is_write()));
    }
    let stats = second.execution_statistics.unwrap();
    assert_eq!(stats.totals.inserts, 0);
    assert_eq!(stats.totals.updates, 0);
    assert_eq!(stats.totals.skips, 4);
}

#[test]
fn test_inserted_keys_compare_identical() {
    let env = TestEnv::new();
    env.write_extract(
        NEW,
        "items.json",
        r#"[{"item_id": 10, "rate": 12.5}, {"item_id": "A-7", "rate": null}]"#,
    );
    let source = env.source();
    let orchestrator = Orchestrator::new(&env.registry, &source, &env.db_path);
    let report = orchestrator.run(&options(&["items"])).unwrap();
    let inserted = report.comparisons["items"].missing_in_target.clone();

    let loaded = source.load("items", None).unwrap();
    let conn = db::open(&env.db_path).unwrap();
    let comparison = Comparator::new(&env.registry)
        .compare(&conn, "items", &loaded.records)
        .unwrap();

    assert_eq!(comparison.identical, inserted);
    assert!(comparison.changed.is_empty());
    assert!(comparison.missing_in_target.is_empty());
}

#[test]
fn test_target_wins_keeps_changed_rows() {
    let env = TestEnv::new();
    env.execute("INSERT INTO Contacts (ID, Name) VALUES ('1', 'Acme')");
    env.write_extract(
        NEW,
        "contacts.json",
        r#"[{"id": 1, "name": "Acme Corp"}, {"id": 2, "name": "Globex"}]"#,
    );
    let source = env.source();
    let orchestrator = Orchestrator::new(&env.registry, &source, &env.db_path);

    let report = orchestrator
        .run(&SyncOptions {
            conflict_policy: ConflictPolicy::TargetWins,
            ..options(&["contacts"])
        })
        .unwrap();

    assert_eq!(
        env.column_text("Contacts", "ID", "1", "Name"),
        Some("Acme".to_string())
    );
    assert_eq!(
        env.column_text("Contacts", "ID", "2", "Name"),
        Some("Globex".to_string())
    );

    let stats = report.execution_statistics.unwrap();
    assert_eq!(stats.totals.updates, 0);
    assert_eq!(stats.totals.inserts, 1);
}

#[test]
fn test_manual_policy_writes_nothing() {
    let env = TestEnv::new();
    env.execute("INSERT INTO Contacts (ID, Name) VALUES ('1', 'Acme')");
    env.write_extract(
        NEW,
        "contacts.json",
        r#"[{"id": 1, "name": "Acme Corp"}, {"id": 2, "name": "Globex"}]"#,
    );
    let source = env.source();
    let orchestrator = Orchestrator::new(&env.registry, &source, &env.db_path);

    let report = orchestrator
        .run(&SyncOptions {
            conflict_policy: ConflictPolicy::Manual,
            ..options(&["contacts"])
        })
        .unwrap();

    assert_eq!(env.row_count("Contacts"), 1);
    assert_eq!(
        env.column_text("Contacts", "ID", "1", "Name"),
        Some("Acme".to_string())
    );
    assert_eq!(
        report.execution_statistics.unwrap().totals.records_deferred,
        2
    );
}

#[test]
fn test_dry_run_halts_before_execution() {
    let env = TestEnv::new();
    env.write_extract(NEW, "contacts.json", r#"[{"id": 1, "name": "Acme"}]"#);
    let source = env.source();
    let orchestrator = Orchestrator::new(&env.registry, &source, &env.db_path);

    let report = orchestrator
        .run(&SyncOptions {
            dry_run: true,
            ..Default::default()
        })
        .unwrap();

    assert_eq!(env.row_count("Contacts"), 0);
    assert!(report.execution_statistics.is_none());
    assert!(report.verification_report.is_none());
    assert_eq!(report.sync_recommendations.action_counts["insert"], 1);
}

#[test]
fn test_newest_generation_is_used() {
    let env = TestEnv::new();
    env.write_extract(OLD, "contacts.json", r#"[{"id": 1, "name": "Old Name"}]"#);
    env.write_extract(NEW, "contacts.json", r#"[{"id": 1, "name": "New Name"}]"#);
    let source = env.source();
    let orchestrator = Orchestrator::new(&env.registry, &source, &env.db_path);

    let report = orchestrator.run(&options(&["contacts"])).unwrap();
    assert_eq!(report.execution_summary.generation.as_str(), NEW);
    assert_eq!(
        env.column_text("Contacts", "ID", "1", "Name"),
        Some("New Name".to_string())
    );

    let report = orchestrator
        .run(&SyncOptions {
            generation: Some(OLD.to_string()),
            ..options(&["contacts"])
        })
        .unwrap();
    assert_eq!(report.execution_summary.generation.as_str(), OLD);
    assert_eq!(
        env.column_text("Contacts", "ID", "1", "Name"),
        Some("Old Name".to_string())
    );
}

#[test]
fn test_missing_extract_file_loads_empty() {
    let env = TestEnv::new();
    env.write_extract(NEW, "contacts.json", r#"[{"id": 1, "name": "Acme"}]"#);
    let source = env.source();
    let orchestrator = Orchestrator::new(&env.registry, &source, &env.db_path);

    let report = orchestrator.run(&SyncOptions::default()).unwrap();

    assert_eq!(report.data_loading.record_counts["items"], 0);
    assert!(report.data_loading.warnings.iter().any(|w| w.contains("items")));
    assert_eq!(report.entity_status["items"], EntityStatus::Completed);
}

#[test]
fn test_missing_table_fails_only_that_entity() {
    let env = TestEnv::new();
    env.execute("DROP TABLE Items");
    env.write_extract(NEW, "contacts.json", r#"[{"id": 1, "name": "Acme"}]"#);
    env.write_extract(NEW, "items.json", r#"[{"item_id": 10, "rate": 1}]"#);
    let source = env.source();
    let orchestrator = Orchestrator::new(&env.registry, &source, &env.db_path);

    let report = orchestrator.run(&SyncOptions::default()).unwrap();

    assert_eq!(report.entity_status["contacts"], EntityStatus::Completed);
    assert!(matches!(
        report.entity_status["items"],
        EntityStatus::Failed {
            stage: Stage::Compare,
            ..
        }
    ));
    assert_eq!(env.row_count("Contacts"), 1);
    assert!(report.has_failures());
}

#[test]
fn test_malformed_extract_fails_only_that_entity() {
    let env = TestEnv::new();
    env.write_extract(NEW, "contacts.json", r#"[{"id": 1, "name": "Acme"}]"#);
    env.write_extract(NEW, "items.json", "{not json");
    let source = env.source();
    let orchestrator = Orchestrator::new(&env.registry, &source, &env.db_path);

    let report = orchestrator.run(&SyncOptions::default()).unwrap();

    assert!(matches!(
        report.entity_status["items"],
        EntityStatus::Failed {
            stage: Stage::Load,
            ..
        }
    ));
    assert!(report.data_loading.load_errors.contains_key("items"));
    assert_eq!(report.entity_status["contacts"], EntityStatus::Completed);
}

#[test]
fn test_no_generations_aborts_run() {
    let env = TestEnv::new();
    let source = env.source();
    let orchestrator = Orchestrator::new(&env.registry, &source, &env.db_path);

    let result = orchestrator.run(&SyncOptions::default());
    assert!(matches!(result, Err(Error::NoGenerationsAvailable(_))));
}

#[test]
fn test_report_json_shape() {
    let env = TestEnv::new();
    env.write_extract(
        NEW,
        "contacts.json",
        r#"[{"id": 1, "name": "Acme"}, {"name": "No Key"}]"#,
    );
    let source = env.source();
    let orchestrator = Orchestrator::new(&env.registry, &source, &env.db_path);

    let report = orchestrator.run(&options(&["contacts"])).unwrap();
    let path = env.temp.path().join("reports").join("run.json");
    report.write_json(&path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    for section in [
        "execution_summary",
        "data_loading",
        "comparison_results",
        "sync_recommendations",
        "execution_statistics",
        "verification_report",
        "entity_status",
    ] {
        assert!(json.get(section).is_some(), "missing section {section}");
    }
    assert_eq!(json["execution_summary"]["dry_run"], false);
    assert_eq!(json["execution_summary"]["conflict_policy"], "source_wins");
    assert_eq!(json["verification_report"]["sync_status"], "perfect");
    assert_eq!(json["verification_report"]["entities"][0]["match"], true);
    assert_eq!(json["entity_status"]["contacts"]["status"], "completed");

    let contacts = &json["comparison_results"]["contacts"];
    assert_eq!(contacts["dropped_records"], 1);
    let diagnostics = contacts["diagnostics"].as_array().unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].as_str().unwrap().contains("record #1"));
}
