use std::collections::HashSet;
use std::fs;

use launchpad_common::{Error, Result};
use launchpad_config::{AppConfig, EnvSource, MigrationsConfig};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::descriptor::{Descriptor, DescriptorKind};
use crate::ledger::Ledger;
use crate::procedural::ProceduralRunner;
use crate::sink::{LoggingSink, StatementSink};
use crate::source::SourceDirectory;

/// Outcome of a successful [`MigrationEngine::run`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Ids executed by this run, in execution order.
    pub applied: Vec<String>,
}

impl RunReport {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorStatus {
    pub id: String,
    pub kind: DescriptorKind,
    pub applied: bool,
}

/// Snapshot of discovered descriptors against the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub environment: String,
    pub descriptors: Vec<DescriptorStatus>,
    /// Ledger entries with no descriptor on disk. Kept, never removed.
    pub orphaned: Vec<String>,
}

impl MigrationStatus {
    pub fn pending(&self) -> impl Iterator<Item = &DescriptorStatus> {
        self.descriptors.iter().filter(|d| !d.applied)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs every pending descriptor in the source directory exactly once, in
/// lexicographic order, recording each success in the ledger before the next
/// descriptor starts.
pub struct MigrationEngine {
    environment: String,
    settings: MigrationsConfig,
    env: Box<dyn EnvSource>,
    sink: Box<dyn StatementSink>,
    procedural: ProceduralRunner,
    ledger: Ledger,
    source: SourceDirectory,
}

impl MigrationEngine {
    pub fn new(config: &AppConfig, env: Box<dyn EnvSource>) -> Result<Self> {
        let settings = config.migrations.clone();
        Ok(Self {
            environment: config.environment.clone(),
            procedural: ProceduralRunner::new(settings.procedural_fuel)?,
            ledger: Ledger::new(&settings.ledger_path),
            source: SourceDirectory::new(&settings.source_dir),
            sink: Box::new(LoggingSink),
            settings,
            env,
        })
    }

    /// Replace the default [`LoggingSink`].
    pub fn with_sink(mut self, sink: impl StatementSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Execute all pending descriptors.
    ///
    /// Stops at the first failure. Descriptors that completed before it stay
    /// recorded; nothing is retried or rolled back.
    pub fn run(&self) -> Result<RunReport> {
        info!(
            "starting database migrations for environment: {}",
            self.environment
        );

        let result = self.run_inner();
        if let Err(e) = &result {
            error!("migration run failed: {e}");
        }
        result
    }

    fn run_inner(&self) -> Result<RunReport> {
        self.check_connection()?;
        let lock = self.ledger.lock()?;
        debug!("holding ledger lock {}", lock.path().display());
        self.ensure_tracking_store();

        let executed = self.ledger.load()?;
        info!("{} migrations recorded in ledger", executed.len());

        self.source.ensure()?;
        let discovered = self.source.discover()?;
        info!(
            "discovered {} migrations in {}",
            discovered.len(),
            self.source.path().display()
        );

        let pending = pending_of(discovered, &executed);
        if pending.is_empty() {
            info!("no pending migrations found");
            return Ok(RunReport::default());
        }
        info!("found {} pending migrations", pending.len());

        let mut report = RunReport::default();
        for descriptor in &pending {
            self.execute(descriptor)?;
            report.applied.push(descriptor.id.clone());
        }

        info!("all migrations completed successfully");
        Ok(report)
    }

    /// Descriptors on disk that are not in the ledger, in execution order.
    /// Pure read: neither bootstraps the source directory nor takes the lock.
    pub fn pending(&self) -> Result<Vec<Descriptor>> {
        let executed = self.ledger.load()?;
        Ok(pending_of(self.source.discover()?, &executed))
    }

    pub fn status(&self) -> Result<MigrationStatus> {
        let executed = self.ledger.load()?;
        let discovered = self.source.discover()?;

        let on_disk: HashSet<&str> = discovered.iter().map(|d| d.id.as_str()).collect();
        let orphaned: Vec<String> = executed
            .iter()
            .filter(|id| !on_disk.contains(id.as_str()))
            .cloned()
            .collect();
        for id in &orphaned {
            warn!("ledger entry {id} has no matching migration file");
        }

        let applied: HashSet<&str> = executed.iter().map(String::as_str).collect();
        let descriptors = discovered
            .iter()
            .map(|d| DescriptorStatus {
                id: d.id.clone(),
                kind: d.kind,
                applied: applied.contains(d.id.as_str()),
            })
            .collect();

        Ok(MigrationStatus {
            environment: self.environment.clone(),
            descriptors,
            orphaned,
        })
    }

    fn check_connection(&self) -> Result<()> {
        info!("checking database connection...");
        let key = &self.settings.connection_env;
        if self.env.var(key).is_none() {
            return Err(Error::Configuration(format!(
                "{key} environment variable not set"
            )));
        }
        info!("database connection verified");
        Ok(())
    }

    /// The ledger file doubles as the tracking store, so there is nothing to
    /// create up front. It appears with the first recorded migration.
    fn ensure_tracking_store(&self) {
        info!(
            "migration tracking store ready at {}",
            self.ledger.path().display()
        );
    }

    fn execute(&self, descriptor: &Descriptor) -> Result<()> {
        let id = descriptor.id.as_str();
        info!("executing migration: {id}");

        match descriptor.kind {
            DescriptorKind::Declarative => {
                let statements =
                    fs::read_to_string(&descriptor.path).map_err(|e| Error::execution(id, e))?;
                self.sink
                    .execute(id, &statements)
                    .map_err(|e| Error::execution(id, e))?;
            }
            DescriptorKind::Procedural => self.procedural.run(id, &descriptor.path)?,
        }

        self.ledger.record(id)?;
        info!("migration completed: {id}");
        Ok(())
    }
}

fn pending_of(discovered: Vec<Descriptor>, executed: &[String]) -> Vec<Descriptor> {
    let executed: HashSet<&str> = executed.iter().map(String::as_str).collect();
    discovered
        .into_iter()
        .filter(|d| !executed.contains(d.id.as_str()))
        .collect()
}
