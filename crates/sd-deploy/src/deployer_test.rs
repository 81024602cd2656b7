use super::*;
use sd_core::DatabaseConfig;
use std::collections::BTreeMap;

fn row(db: &str, name: &str, command: &str) -> ManifestRow {
    ManifestRow::new(db, name, command)
}

fn filter(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn memory_deployer(databases: &[&str], manifest: Vec<ManifestRow>) -> Deployer {
    let databases: BTreeMap<String, DatabaseConfig> = databases
        .iter()
        .map(|name| (name.to_string(), DatabaseConfig::new("duckdb", ":memory:")))
        .collect();
    let config = Config::new("/nonexistent", databases);
    Deployer::with_manifest(config, Box::new(manifest), DeployOptions::default())
}

fn tracker_table_exists(deployer: &mut Deployer, database: &str) -> bool {
    let table = deployer.config.tracker_table.clone();
    let count: i64 = deployer
        .connection(database)
        .unwrap()
        .query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            duckdb::params![table],
            |row| row.get(0),
        )
        .unwrap();
    count > 0
}

// ── Planning ───────────────────────────────────────────────────────────

#[test]
fn test_plan_groups_by_database_in_manifest_order() {
    let plans = plan_deployment(
        vec![
            row("orders", "001", "a"),
            row("billing", "001", "b"),
            row("orders", "002", "c"),
        ],
        None,
    );
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0].database, "orders");
    assert_eq!(
        plans[0].scripts.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        vec!["001", "002"]
    );
    assert_eq!(plans[1].database, "billing");
}

#[test]
fn test_plan_skips_rows_without_database() {
    let plans = plan_deployment(vec![row("", "orphan", "x"), row("  ", "blank", "y")], None);
    assert!(plans.is_empty());
}

#[test]
fn test_plan_duplicate_name_last_command_wins() {
    let plans = plan_deployment(
        vec![
            row("orders", "001", "old"),
            row("orders", "002", "other"),
            row("orders", "001", "new"),
        ],
        None,
    );
    let scripts = &plans[0].scripts;
    assert_eq!(scripts.len(), 2);
    assert_eq!(scripts[0].name, "001");
    assert_eq!(scripts[0].command, "new");
}

#[test]
fn test_plan_applies_database_filter() {
    let rows = vec![row("orders", "001", "a"), row("billing", "001", "b")];
    let only_billing = filter(&["billing"]);
    let plans = plan_deployment(rows.clone(), Some(&only_billing));
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].database, "billing");

    // An empty filter selects everything
    let empty = BTreeSet::new();
    assert_eq!(plan_deployment(rows, Some(&empty)).len(), 2);
}

#[test]
fn test_plan_trims_database_names() {
    let only_orders = filter(&["orders"]);
    let plans = plan_deployment(
        vec![row(" orders", "001", "a"), row("orders\t", "002", "b")],
        Some(&only_orders),
    );
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].database, "orders");
    assert_eq!(plans[0].scripts.len(), 2);
    assert!(plans[0].scripts.iter().all(|r| r.db == "orders"));
}

// ── Manual tracker commands ────────────────────────────────────────────

#[test]
fn test_mark_verify_unmark_round_trip() {
    let mut deployer = memory_deployer(&["db"], vec![]);

    assert_eq!(deployer.mark_script_as_run("db/x").unwrap(), CommandOutcome::Applied);
    assert!(deployer.verify_script_exists("db", "x").unwrap());

    assert_eq!(deployer.unmark_script_as_run("db/x").unwrap(), CommandOutcome::Applied);
    assert!(!deployer.verify_script_exists("db", "x").unwrap());
}

#[test]
fn test_unmark_never_marked_is_error() {
    let mut deployer = memory_deployer(&["db"], vec![]);
    let err = deployer.unmark_script_as_run("db/ghost.sql").unwrap_err();
    assert!(matches!(err, DeployError::ScriptNotTracked { ref script } if script == "db/ghost.sql"));
}

#[test]
fn test_routing_rejection_mutates_nothing() {
    let mut deployer = memory_deployer(&["db"], vec![]);
    assert_eq!(deployer.mark_script_as_run("noslash").unwrap(), CommandOutcome::Skipped);
    assert_eq!(deployer.unmark_script_as_run("noslash").unwrap(), CommandOutcome::Skipped);
    assert_eq!(deployer.add_to_tracker("noslash").unwrap(), CommandOutcome::Skipped);
    assert!(deployer.executed_scripts("db").unwrap().is_empty());
}

#[test]
fn test_add_to_tracker_uses_stem_and_records_path() {
    let mut deployer = memory_deployer(&["db"], vec![]);
    deployer.add_to_tracker(" db/007_manual_fix.sql ").unwrap();

    assert!(deployer.verify_script_exists("db", "007_manual_fix").unwrap());
    let (_, tracker) = open_tracker(&mut deployer.pool, &deployer.config, "db").unwrap();
    let records = tracker.tracked_scripts().unwrap();
    assert_eq!(records[0].body.as_deref(), Some("db/007_manual_fix.sql"));
}

#[test]
fn test_commands_on_unknown_database_fail() {
    let mut deployer = memory_deployer(&["db"], vec![]);
    let err = deployer.mark_script_as_run("other/x.sql").unwrap_err();
    assert!(matches!(err, DeployError::Db(_)));
}

#[test]
fn test_dry_run_commands_do_not_touch_tracker() {
    let mut deployer = memory_deployer(&["db"], vec![]);
    deployer.options.dry_run = true;
    assert_eq!(deployer.mark_script_as_run("db/x").unwrap(), CommandOutcome::DryRun);
    assert_eq!(deployer.add_to_tracker("db/y.sql").unwrap(), CommandOutcome::DryRun);
    assert!(deployer.executed_scripts("db").unwrap().is_empty());
    assert!(!tracker_table_exists(&mut deployer, "db"));
}

#[test]
fn test_dry_run_unmark_checks_existing_record() {
    let mut deployer = memory_deployer(&["db"], vec![]);
    deployer.mark_script_as_run("db/x").unwrap();
    deployer.options.dry_run = true;

    assert_eq!(deployer.unmark_script_as_run("db/x").unwrap(), CommandOutcome::DryRun);
    assert!(deployer.verify_script_exists("db", "x").unwrap());
    let err = deployer.unmark_script_as_run("db/other").unwrap_err();
    assert!(matches!(err, DeployError::ScriptNotTracked { .. }));
}

// ── Incremental deploys with inline scripts ────────────────────────────

#[test]
fn test_execute_updates_inline_scripts() {
    let mut deployer = memory_deployer(
        &["db"],
        vec![
            row("db", "001_init", "CREATE TABLE t (id INTEGER)"),
            row("db", "002_seed", "INSERT INTO t VALUES (1); INSERT INTO t VALUES (2)"),
        ],
    );

    let report = deployer.execute_updates(None, true).unwrap();
    assert_eq!(report.names_with(ScriptStatus::Applied), vec!["001_init", "002_seed"]);

    let count: i64 = deployer
        .connection("db")
        .unwrap()
        .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn test_execute_updates_routes_padded_database_names() {
    let mut deployer = memory_deployer(
        &["db"],
        vec![row(" db ", "001_init", "CREATE TABLE t (id INTEGER)")],
    );

    let report = deployer.execute_updates(None, true).unwrap();
    assert_eq!(report.names_with(ScriptStatus::Applied), vec!["001_init"]);
    assert_eq!(report.scripts[0].database, "db");
    assert!(deployer.verify_script_exists("db", "001_init").unwrap());
}

#[test]
fn test_dry_run_deploy_leaves_fresh_database_untouched() {
    let mut deployer = memory_deployer(
        &["db"],
        vec![row("db", "001_init", "CREATE TABLE t (id INTEGER)")],
    );
    deployer.options.dry_run = true;

    let report = deployer.execute_updates(None, true).unwrap();
    assert_eq!(report.names_with(ScriptStatus::DryRun), vec!["001_init"]);
    assert!(!tracker_table_exists(&mut deployer, "db"));
}

#[test]
fn test_dry_run_deploy_reads_existing_tracker() {
    let mut deployer = memory_deployer(
        &["db"],
        vec![
            row("db", "001_init", "CREATE TABLE t (id INTEGER)"),
            row("db", "002_more", "CREATE TABLE u (id INTEGER)"),
        ],
    );
    deployer.mark_script_as_run("db/001_init").unwrap();
    deployer.options.dry_run = true;

    let report = deployer.execute_updates(None, true).unwrap();
    assert_eq!(report.names_with(ScriptStatus::Skipped), vec!["001_init"]);
    assert_eq!(report.names_with(ScriptStatus::DryRun), vec!["002_more"]);
    assert!(!deployer.verify_script_exists("db", "002_more").unwrap());
}

#[test]
fn test_status_does_not_create_tracker() {
    let mut deployer = memory_deployer(
        &["db"],
        vec![row("db", "001", "CREATE TABLE a (id INTEGER)")],
    );
    let states = deployer.status(None).unwrap();
    assert!(!states[0].applied);
    assert!(!tracker_table_exists(&mut deployer, "db"));
}

#[test]
fn test_execute_updates_without_tracking_reruns_everything() {
    let mut deployer = memory_deployer(
        &["db"],
        vec![row("db", "001_log", "CREATE TABLE IF NOT EXISTS events (id INTEGER); INSERT INTO events VALUES (1)")],
    );

    deployer.execute_updates(None, false).unwrap();
    let report = deployer.execute_updates(None, false).unwrap();
    assert_eq!(report.count(ScriptStatus::Applied), 1);
    assert!(deployer.executed_scripts("db").unwrap().is_empty());

    let count: i64 = deployer
        .connection("db")
        .unwrap()
        .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn test_execute_updates_unsupported_engine_aborts_before_running() {
    let mut databases = BTreeMap::new();
    databases.insert("good".to_string(), DatabaseConfig::new("duckdb", ":memory:"));
    databases.insert("bad".to_string(), DatabaseConfig::new("postgresql", "ignored"));
    let mut deployer = Deployer::with_manifest(
        Config::new("/nonexistent", databases),
        Box::new(vec![
            row("good", "001", "CREATE TABLE t (id INTEGER)"),
            row("bad", "001", "CREATE TABLE t (id INTEGER)"),
        ]),
        DeployOptions::default(),
    );

    let err = deployer.execute_updates(None, true).unwrap_err();
    assert!(matches!(
        err,
        DeployError::Db(sd_db::DbError::UnsupportedEngine(ref id)) if id == "postgresql"
    ));
    assert!(deployer.executed_scripts("good").unwrap().is_empty());
}

#[test]
fn test_status_reports_applied_and_pending() {
    let mut deployer = memory_deployer(
        &["db"],
        vec![
            row("db", "001", "CREATE TABLE a (id INTEGER)"),
            row("db", "002", "CREATE TABLE b (id INTEGER)"),
        ],
    );
    deployer.mark_script_as_run("db/001").unwrap();

    let states = deployer.status(None).unwrap();
    assert_eq!(states.len(), 2);
    assert!(states[0].applied);
    assert!(states[0].applied_at.is_some());
    assert!(!states[1].applied);
    assert_eq!(states[1].applied_at, None);
}
