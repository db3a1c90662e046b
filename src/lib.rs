//! realmconf - Config reconciliation for a Legion 7.3.5 server deployment
//!
//! Keeps worldserver.conf, bnetserver.conf, the game client's config.wtf and
//! the `legion_auth.realmlist` realm record mutually consistent: parse the
//! flat key=value config format, diff live configs against the shipped
//! templates, cross-check related settings across all four sources, and
//! export edits with backup-before-overwrite.

// ============================================
// Core Modules
// ============================================

/// ConfigEntry model, key=value parser, collection operations
pub mod collection;
/// Template drift detection and healing
pub mod diff;
/// Cross-source validation (server configs vs client config vs realm record)
pub mod validate;
/// Backup-then-overwrite file persistence
pub mod writer;

// ============================================
// Collaborators
// ============================================

/// Client config.wtf portal-line handling
pub mod clientconf;
/// Realm record access (legion_auth.realmlist)
pub mod realm;
/// Tool settings (install locations, database availability)
pub mod settings;
/// Config file path discovery
pub mod paths;
/// Export orchestration and edit operations
pub mod export;
