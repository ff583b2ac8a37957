//! Collector runs against offline metadata snapshots.

use clap::Parser;
use schemagraph_collect::{CatalogReport, Cli, run};
use std::path::Path;

const SNAPSHOT: &str = r#"{
    "product_name": "Snapshot",
    "schemas": [{ "TABLE_SCHEM": "public" }],
    "metadata": {
        "tables": [
            { "TABLE_SCHEM": "public", "TABLE_NAME": "app_user", "TABLE_TYPE": "TABLE" },
            { "TABLE_SCHEM": "public", "TABLE_NAME": "app_role", "TABLE_TYPE": "TABLE" },
            { "TABLE_SCHEM": "public", "TABLE_NAME": "app_role_user", "TABLE_TYPE": "TABLE" }
        ],
        "columns": [
            { "TABLE_SCHEM": "public", "TABLE_NAME": "app_user", "COLUMN_NAME": "id", "ORDINAL_POSITION": 1, "TYPE_NAME": "INTEGER" },
            { "TABLE_SCHEM": "public", "TABLE_NAME": "app_role_user", "COLUMN_NAME": "user_id", "ORDINAL_POSITION": 1, "TYPE_NAME": "INTEGER" }
        ],
        "foreign_keys": [
            {
                "FKTABLE_SCHEM": "public", "FKTABLE_NAME": "app_role_user", "FKCOLUMN_NAME": "user_id",
                "PKTABLE_SCHEM": "public", "PKTABLE_NAME": "app_user", "PKCOLUMN_NAME": "id",
                "KEY_SEQ": 1, "FK_NAME": "fk_role_user_user"
            }
        ]
    },
    "unsupported": ["procedures"]
}"#;

fn cli(snapshot: &Path, output: &Path, extra: &[&str]) -> Cli {
    let mut args = vec![
        "schemagraph-collect".to_string(),
        "--snapshot".to_string(),
        snapshot.display().to_string(),
        "--output".to_string(),
        output.display().to_string(),
    ];
    args.extend(extra.iter().map(|a| a.to_string()));
    Cli::try_parse_from(args).expect("valid arguments")
}

#[tokio::test]
async fn test_snapshot_crawl_writes_report() {
    let dir = tempfile::tempdir().expect("temp dir");
    let snapshot = dir.path().join("snapshot.json");
    let output = dir.path().join("catalog.json");
    std::fs::write(&snapshot, SNAPSHOT).expect("write snapshot");

    let report = run(&cli(&snapshot, &output, &[])).await.expect("crawl");

    assert_eq!(report.product_name, "Snapshot");
    assert_eq!(report.schemas, ["public"]);
    assert_eq!(report.tables.len(), 3);
    assert_eq!(report.foreign_keys.len(), 1);
    assert!(!report.foreign_keys[0].dangling);
    assert_eq!(report.warnings.len(), 1);

    let written: CatalogReport =
        serde_json::from_str(&std::fs::read_to_string(&output).expect("read report"))
            .expect("parse report");
    let match_keys = written.match_keys.expect("match keys");
    assert!(match_keys["public.app_role_user"].contains(&"role_user".to_string()));
}

#[tokio::test]
async fn test_snapshot_crawl_with_reduction() {
    let dir = tempfile::tempdir().expect("temp dir");
    let snapshot = dir.path().join("snapshot.json");
    let config = dir.path().join("crawl.json");
    let output = dir.path().join("catalog.json");
    std::fs::write(&snapshot, SNAPSHOT).expect("write snapshot");
    std::fs::write(
        &config,
        r#"{ "limit": { "tables": { "include": "public\\.app_role_user", "exclude": "" } } }"#,
    )
    .expect("write config");

    let report = run(&cli(
        &snapshot,
        &output,
        &[
            "--config",
            &config.display().to_string(),
            "--parent-depth",
            "1",
            "--weak-associations",
            "false",
        ],
    ))
    .await
    .expect("crawl");

    let mut names: Vec<&str> = report.tables.iter().map(|t| t.full_name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["public.app_role_user", "public.app_user"]);
    assert!(report.table("public.app_role").is_none());
    assert!(report.match_keys.is_none());
}

#[tokio::test]
async fn test_missing_source_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let cli = Cli::try_parse_from([
        "schemagraph-collect",
        "--output",
        &dir.path().join("catalog.json").display().to_string(),
    ])
    .expect("valid arguments");

    assert!(run(&cli).await.is_err());
}

#[tokio::test]
async fn test_invalid_snapshot_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let snapshot = dir.path().join("snapshot.json");
    std::fs::write(&snapshot, "not json").expect("write snapshot");

    let result = run(&cli(&snapshot, &dir.path().join("catalog.json"), &[])).await;

    assert!(result.is_err());
}
