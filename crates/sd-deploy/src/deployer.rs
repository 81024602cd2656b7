//! The deployment engine.
//!
//! A [`Deployer`] owns the connection pool and the manifest source. Its
//! incremental mode ([`Deployer::execute_updates`]) runs every manifest script
//! that the target database's tracker has not recorded yet, one transaction
//! per script, and records each script only after its transaction committed.
//!
//! Scripts are independent: a failing script is rolled back, reported, and
//! left pending for the next run while its siblings still run. Structural
//! problems (unknown database, unsupported engine, unreadable script file,
//! tracker failures) abort the run.

use crate::error::{DeployError, DeployResult};
use crate::report::{DeploymentReport, ScriptStatus};
use crate::routing::ScriptRef;
use duckdb::Connection;
use sd_core::{Config, ManifestRow, ManifestSource, Script, YamlManifest};
use sd_db::{ConnectionPool, TrackedScript, Tracker, TransactionalExecutor};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Execution flags shared by every command
#[derive(Debug, Clone, Copy, Default)]
pub struct DeployOptions {
    /// Log statements instead of executing them; never touch tracker records
    pub dry_run: bool,
    /// Log every statement before it runs
    pub verbose: bool,
}

/// Result of a manual tracker command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The tracker was updated
    Applied,
    /// The script reference had no database segment; nothing was done
    Skipped,
    /// Dry run; the change was only logged
    DryRun,
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Applied => write!(f, "applied"),
            CommandOutcome::Skipped => write!(f, "skipped"),
            CommandOutcome::DryRun => write!(f, "dry_run"),
        }
    }
}

/// Manifest scripts grouped for one database, in manifest order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabasePlan {
    /// Target database
    pub database: String,
    /// Scripts, one row per distinct name
    pub scripts: Vec<ManifestRow>,
}

impl DatabasePlan {
    fn new(database: &str) -> Self {
        Self {
            database: database.to_string(),
            scripts: Vec::new(),
        }
    }

    /// A repeated name keeps its first position but takes the latest command
    fn upsert(&mut self, row: ManifestRow) {
        match self.scripts.iter_mut().find(|s| s.name == row.name) {
            Some(existing) => existing.command = row.command,
            None => self.scripts.push(row),
        }
    }
}

/// Applied/pending state of one manifest script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptState {
    /// Target database
    pub database: String,
    /// Script name
    pub name: String,
    /// Whether the tracker has a record for it
    pub applied: bool,
    /// When it was recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<String>,
}

/// Group manifest rows by database, dropping unroutable and filtered rows.
///
/// An empty or absent filter keeps every database. Databases appear in the
/// order of their first manifest row.
pub fn plan_deployment(
    rows: Vec<ManifestRow>,
    database_filter: Option<&BTreeSet<String>>,
) -> Vec<DatabasePlan> {
    let filter = database_filter.filter(|f| !f.is_empty());
    let mut plans: Vec<DatabasePlan> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for mut row in rows {
        let db = row.db.trim().to_string();
        if db.is_empty() {
            log::warn!("Skipping manifest row '{}': no database", row.name);
            continue;
        }
        row.db = db;
        if filter.is_some_and(|f| !f.contains(&row.db)) {
            continue;
        }

        let idx = *index.entry(row.db.clone()).or_insert_with(|| {
            plans.push(DatabasePlan::new(&row.db));
            plans.len() - 1
        });
        plans[idx].upsert(row);
    }

    plans
}

/// Open the connection for `database` and its tracker, creating the tracker
/// table if needed.
pub(crate) fn open_tracker<'p>(
    pool: &'p mut ConnectionPool,
    config: &Config,
    database: &str,
) -> DeployResult<(&'p Connection, Tracker<'p>)> {
    let engine = pool.engine(database)?;
    let conn = pool.connection(database)?;
    let tracker = Tracker::open(engine, conn, &config.tracker_table)?;
    Ok((conn, tracker))
}

/// Open the tracker for `database` read-only; `None` if it was never created.
pub(crate) fn read_tracker<'p>(
    pool: &'p mut ConnectionPool,
    config: &Config,
    database: &str,
) -> DeployResult<Option<Tracker<'p>>> {
    let engine = pool.engine(database)?;
    let conn = pool.connection(database)?;
    Ok(Tracker::open_existing(engine, conn, &config.tracker_table)?)
}

/// Deployment engine over the configured databases
pub struct Deployer {
    pub(crate) config: Config,
    pub(crate) manifest: Box<dyn ManifestSource>,
    pub(crate) pool: ConnectionPool,
    pub(crate) options: DeployOptions,
}

impl Deployer {
    /// Deployer reading the YAML manifest named in `config`
    pub fn new(config: Config, options: DeployOptions) -> Self {
        let manifest = YamlManifest::new(config.manifest_path_absolute());
        Self::with_manifest(config, Box::new(manifest), options)
    }

    /// Deployer over an explicit manifest source
    pub fn with_manifest(
        config: Config,
        manifest: Box<dyn ManifestSource>,
        options: DeployOptions,
    ) -> Self {
        let pool = ConnectionPool::new(config.resolved_databases());
        Self {
            config,
            manifest,
            pool,
            options,
        }
    }

    /// The loaded configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Pooled connection for `database`, e.g. to inspect deployed objects
    pub fn connection(&mut self, database: &str) -> DeployResult<&Connection> {
        Ok(self.pool.connection(database)?)
    }

    pub(crate) fn executor(&self) -> TransactionalExecutor {
        TransactionalExecutor::new(self.options.dry_run, self.options.verbose)
    }

    /// Names recorded as applied in `database`'s tracker
    pub fn executed_scripts(&mut self, database: &str) -> DeployResult<BTreeSet<String>> {
        match read_tracker(&mut self.pool, &self.config, database)? {
            Some(tracker) => Ok(tracker.get_executed_scripts()?),
            None => Ok(BTreeSet::new()),
        }
    }

    /// Whether `database`'s tracker has a record for `name`
    pub fn verify_script_exists(&mut self, database: &str, name: &str) -> DeployResult<bool> {
        match read_tracker(&mut self.pool, &self.config, database)? {
            Some(tracker) => Ok(tracker.verify_script_exists(name)?),
            None => Ok(false),
        }
    }

    /// Record `"<db>/<script>"` as applied without running it
    pub fn mark_script_as_run(&mut self, script: &str) -> DeployResult<CommandOutcome> {
        let Some(target) = route(script, "mark as run") else {
            return Ok(CommandOutcome::Skipped);
        };
        if self.options.dry_run {
            read_tracker(&mut self.pool, &self.config, &target.database)?;
            log::info!("Would mark script {} as run in {}", target.name, target.database);
            return Ok(CommandOutcome::DryRun);
        }
        let (_, tracker) = open_tracker(&mut self.pool, &self.config, &target.database)?;
        log::info!("Marking script {} as run in {}", target.name, target.database);
        tracker.mark_script_as_run(&target.name)?;
        Ok(CommandOutcome::Applied)
    }

    /// Remove the tracker record for `"<db>/<script>"` so the next deploy reruns it
    pub fn unmark_script_as_run(&mut self, script: &str) -> DeployResult<CommandOutcome> {
        let Some(target) = route(script, "unmark") else {
            return Ok(CommandOutcome::Skipped);
        };
        let dry_run = self.options.dry_run;
        let tracker = match read_tracker(&mut self.pool, &self.config, &target.database)? {
            Some(tracker) if tracker.verify_script_exists(&target.name)? => tracker,
            _ => return Err(DeployError::ScriptNotTracked { script: target.raw }),
        };

        if dry_run {
            log::info!("Would unmark script {} in {}", target.name, target.database);
            return Ok(CommandOutcome::DryRun);
        }
        log::info!("Unmarking script {} as run in {}", target.name, target.database);
        tracker.unmark_script_as_run(&target.name)?;
        Ok(CommandOutcome::Applied)
    }

    /// Register `"<db>/<script>"` in the tracker with its path as the body
    pub fn add_to_tracker(&mut self, script: &str) -> DeployResult<CommandOutcome> {
        let Some(target) = route(script, "add to tracker") else {
            return Ok(CommandOutcome::Skipped);
        };
        if self.options.dry_run {
            read_tracker(&mut self.pool, &self.config, &target.database)?;
            log::info!("Would add script {} to the {} tracker", target.name, target.database);
            return Ok(CommandOutcome::DryRun);
        }
        let (_, tracker) = open_tracker(&mut self.pool, &self.config, &target.database)?;
        log::info!("Adding script {} to the {} tracker", target.name, target.database);
        tracker.add_script_to_tracker(&target.name, &target.raw)?;
        Ok(CommandOutcome::Applied)
    }

    /// Run every manifest script not yet applied to its database.
    ///
    /// With `track_deployment` off, trackers are neither read nor written and
    /// every selected script runs. A dry run only reads trackers and never
    /// creates one.
    pub fn execute_updates(
        &mut self,
        database_filter: Option<&BTreeSet<String>>,
        track_deployment: bool,
    ) -> DeployResult<DeploymentReport> {
        let plans = plan_deployment(self.manifest.rows()?, database_filter);
        let executor = self.executor();
        let dry_run = self.options.dry_run;
        let schemas_path = self.config.schemas_path_absolute();
        let mut report = DeploymentReport::new(dry_run);
        log::info!("Starting deployment run {}", report.run_id);

        // Resolve every target before touching any, so a bad engine or
        // database name aborts the run up front.
        let mut executed: HashMap<String, BTreeSet<String>> = HashMap::new();
        for plan in &plans {
            let database = plan.database.as_str();
            if !track_deployment {
                self.pool.engine(database)?;
                continue;
            }
            let names = if dry_run {
                match read_tracker(&mut self.pool, &self.config, database)? {
                    Some(tracker) => tracker.get_executed_scripts()?,
                    None => BTreeSet::new(),
                }
            } else {
                let (_, tracker) = open_tracker(&mut self.pool, &self.config, database)?;
                tracker.get_executed_scripts()?
            };
            executed.insert(plan.database.clone(), names);
        }

        for plan in &plans {
            let database = plan.database.as_str();
            let (conn, tracker) = if track_deployment && !dry_run {
                let (conn, tracker) = open_tracker(&mut self.pool, &self.config, database)?;
                (conn, Some(tracker))
            } else {
                (self.pool.connection(database)?, None)
            };
            let already = executed.get(database);

            for row in &plan.scripts {
                if already.is_some_and(|names| names.contains(&row.name)) {
                    log::debug!("Skipping {database}/{}: already applied", row.name);
                    report.record(database, &row.name, ScriptStatus::Skipped);
                    continue;
                }

                let script = Script::from_manifest_row(row, &schemas_path);
                log::info!("Executing script: {} ({})", script.name, script.location());
                let statements = script.load_statements()?;

                let outcome = executor.execute(conn, &statements);
                if !outcome.success {
                    log::error!(
                        "Script {database}/{} failed and was rolled back; it remains pending",
                        script.name
                    );
                    report.record_failure(database, &script.name, &outcome);
                    continue;
                }

                if dry_run {
                    report.record(database, &script.name, ScriptStatus::DryRun);
                    continue;
                }
                if let Some(tracker) = &tracker {
                    tracker.mark_script_as_run(&script.name)?;
                }
                report.record(database, &script.name, ScriptStatus::Applied);
            }
        }

        log::info!(
            "Deployment run {} finished: {} applied, {} skipped, {} failed",
            report.run_id,
            report.count(ScriptStatus::Applied),
            report.count(ScriptStatus::Skipped),
            report.count(ScriptStatus::Failed),
        );
        Ok(report)
    }

    /// Applied/pending state of every manifest script. Read-only.
    pub fn status(
        &mut self,
        database_filter: Option<&BTreeSet<String>>,
    ) -> DeployResult<Vec<ScriptState>> {
        let plans = plan_deployment(self.manifest.rows()?, database_filter);
        let mut states = Vec::new();

        for plan in &plans {
            let records: HashMap<String, TrackedScript> =
                match read_tracker(&mut self.pool, &self.config, &plan.database)? {
                    Some(tracker) => tracker
                        .tracked_scripts()?
                        .into_iter()
                        .map(|r| (r.name.clone(), r))
                        .collect(),
                    None => HashMap::new(),
                };

            for row in &plan.scripts {
                let record = records.get(&row.name);
                states.push(ScriptState {
                    database: plan.database.clone(),
                    name: row.name.clone(),
                    applied: record.is_some(),
                    applied_at: record.map(|r| r.applied_at.clone()),
                });
            }
        }

        Ok(states)
    }
}

fn route(script: &str, action: &str) -> Option<ScriptRef> {
    let target = ScriptRef::parse(script);
    if target.is_none() {
        log::error!("No database name provided, cannot {action} '{}'", script.trim());
    }
    target
}

#[cfg(test)]
#[path = "deployer_test.rs"]
mod tests;
