//! Export orchestration and edit operations
//!
//! One export cycle updates the client portal entry, writes both server
//! config files (as independent tasks; they touch disjoint files) and
//! pushes the gateway's address and build into the realm record. At most
//! one cycle runs at a time; a second invocation while one is in flight is
//! rejected outright, not queued.
//!
//! Per-file failures are captured as log lines in the returned report and
//! never abort the sibling export.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use sqlx::MySqlPool;
use thiserror::Error;

use crate::clientconf;
use crate::collection::ConfigCollection;
use crate::paths::ConfigPaths;
use crate::realm;
use crate::settings::Settings;
use crate::validate::{KEY_BUILD, KEY_EXTERNAL_ADDRESS, KNOWN_BUILDS};
use crate::writer::{self, BACKUP_DIR};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("an export is already in progress")]
    Busy,

    #[error("the database server must be running to export; start it and try again")]
    DatabaseUnavailable,
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error("address [{0}] is too short to be a usable IP")]
    AddressTooShort(String),

    #[error("build [{0}] is not a known 7.3.5 client build (expected one of {KNOWN_BUILDS:?})")]
    UnknownBuild(String),
}

/// Observability sink for long-running export steps. No correctness weight;
/// the default just logs.
pub trait Progress: Send + Sync {
    fn status(&self, msg: &str);
}

/// Default [`Progress`] that forwards to tracing.
pub struct LogProgress;

impl Progress for LogProgress {
    fn status(&self, msg: &str) {
        tracing::info!("[export] {}", msg);
    }
}

/// Running log of one export cycle. No failure vanishes: everything that
/// goes wrong lands here as a human-readable line.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub log: Vec<String>,
}

impl ExportReport {
    fn note(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::info!("[export] {}", msg);
        self.log.push(msg);
    }
}

/// Serial-export guard plus the export entry point.
pub struct ExportEngine {
    in_progress: AtomicBool,
}

impl ExportEngine {
    pub fn new() -> Self {
        Self {
            in_progress: AtomicBool::new(false),
        }
    }

    /// Run one full export cycle.
    ///
    /// `pool` may be `None` when the caller has no live connection even
    /// though the database is flagged available (hermetic tests); the realm
    /// push is then skipped with a log line.
    pub async fn export_all(
        &self,
        settings: &Settings,
        world: &ConfigCollection,
        bnet: &ConfigCollection,
        pool: Option<&MySqlPool>,
        progress: &dyn Progress,
    ) -> Result<ExportReport, ExportError> {
        if !settings.database_available {
            return Err(ExportError::DatabaseUnavailable);
        }
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ExportError::Busy);
        }

        let report = self.run_export(settings, world, bnet, pool, progress).await;
        self.in_progress.store(false, Ordering::SeqCst);
        Ok(report)
    }

    async fn run_export(
        &self,
        settings: &Settings,
        world: &ConfigCollection,
        bnet: &ConfigCollection,
        pool: Option<&MySqlPool>,
        progress: &dyn Progress,
    ) -> ExportReport {
        let mut report = ExportReport::default();
        // Folder settings may have changed since load; re-derive.
        let paths = ConfigPaths::discover(settings);

        let mut bnet_task = None;
        match &paths.bnet_conf {
            None => report.note("gateway export: config file cannot be found"),
            Some(path) if bnet.is_empty() => {
                report.note(format!(
                    "gateway export: current settings are empty, not writing {}",
                    path.display()
                ));
            }
            Some(path) => {
                // The client portal mirrors the gateway's external address,
                // so it is only touched when a gateway collection exists.
                self.update_client_portal(&paths, bnet, &mut report);

                progress.status(&format!("writing {}", path.display()));
                let path = path.clone();
                let content = bnet.to_text();
                bnet_task = Some(tokio::task::spawn_blocking(move || {
                    writer::export_config(&path, &content, Path::new(BACKUP_DIR))
                }));

                match pool {
                    Some(pool) => {
                        let build = bnet.get_value(KEY_BUILD);
                        let address = bnet.get_value(KEY_EXTERNAL_ADDRESS);
                        progress.status("updating realm record");
                        match realm::update_realm(pool, &address, &build).await {
                            Ok(()) => report.note(format!(
                                "realm record updated: address=[{}] build=[{}]",
                                address, build
                            )),
                            Err(e) => report.note(format!("realm record update failed: {}", e)),
                        }
                    }
                    None => report.note("realm update skipped: no database connection"),
                }
            }
        }

        let mut world_task = None;
        match &paths.world_conf {
            None => report.note("world export: config file cannot be found"),
            Some(path) if world.is_empty() => {
                report.note(format!(
                    "world export: current settings are empty, not writing {}",
                    path.display()
                ));
            }
            Some(path) => {
                progress.status(&format!("writing {}", path.display()));
                let path = path.clone();
                let content = world.to_text();
                world_task = Some(tokio::task::spawn_blocking(move || {
                    writer::export_config(&path, &content, Path::new(BACKUP_DIR))
                }));
            }
        }

        // Await both writes before declaring the cycle complete.
        for (which, task) in [("gateway", bnet_task), ("world", world_task)] {
            if let Some(task) = task {
                match task.await {
                    Ok(Ok(backup)) => report.note(format!(
                        "{} config written, previous version backed up to {}",
                        which,
                        backup.display()
                    )),
                    Ok(Err(e)) => report.note(format!("{} export failed: {}", which, e)),
                    Err(e) => report.note(format!("{} export task panicked: {}", which, e)),
                }
            }
        }

        report
    }

    fn update_client_portal(
        &self,
        paths: &ConfigPaths,
        bnet: &ConfigCollection,
        report: &mut ExportReport,
    ) {
        let Some(client_path) = &paths.client_conf else {
            report.note("client config cannot be found, portal entry not updated");
            return;
        };

        let text = match std::fs::read_to_string(client_path) {
            Ok(text) => text,
            Err(e) => {
                report.note(format!(
                    "cannot read client config {}: {}",
                    client_path.display(),
                    e
                ));
                return;
            }
        };

        let address = bnet.get_value(KEY_EXTERNAL_ADDRESS);
        match clientconf::update_portal(&text, &address) {
            Ok(updated) => match writer::export_config(client_path, &updated, Path::new(BACKUP_DIR))
            {
                Ok(_) => report.note(format!("client portal entry set to [{}]", address)),
                Err(e) => report.note(format!("client config write failed: {}", e)),
            },
            Err(e) => report.note(format!(
                "client config {}: {}",
                client_path.display(),
                e
            )),
        }
    }
}

impl Default for ExportEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ── edit operations ─────────────────────────────────────────────────────────

/// Set the gateway's external (hosting) address. The value is not validated
/// as a reachable IP, only against obviously unusable input.
pub fn set_external_address(bnet: &mut ConfigCollection, address: &str) -> Result<(), EditError> {
    // At least four digits and three dots make up an IP
    if address.len() <= 6 {
        return Err(EditError::AddressTooShort(address.to_string()));
    }
    bnet.update_value(KEY_EXTERNAL_ADDRESS, address);
    Ok(())
}

/// Set the client build in both server configs. The realm record follows on
/// the next export.
pub fn set_build(
    world: &mut ConfigCollection,
    bnet: &mut ConfigCollection,
    build: &str,
) -> Result<(), EditError> {
    if !KNOWN_BUILDS.contains(&build) {
        return Err(EditError::UnknownBuild(build.to_string()));
    }
    world.update_value(KEY_BUILD, build);
    bnet.update_value(KEY_BUILD, build);
    Ok(())
}

/// Replace a live collection wholesale with the template's contents.
pub fn apply_defaults(live: &mut ConfigCollection, template: &ConfigCollection) {
    *live = template.clone();
}
