//! Config file path discovery
//!
//! The tool's settings only record two install folders. The concrete file
//! paths are derived with a fixed fallback order: repacks ship the server
//! configs either next to the install root or under `Servers/`, and the
//! client keeps its config.wtf under `WTF/`. A path that cannot be resolved
//! is `None`, which downstream code treats as "feature disabled".

use std::path::{Path, PathBuf};

use crate::settings::Settings;

/// Shipped reference templates, relative to the working directory.
pub const TEMPLATE_DIR: &str = "templates";

pub const WORLD_CONF: &str = "worldserver.conf";
pub const BNET_CONF: &str = "bnetserver.conf";
pub const CLIENT_CONF: &str = "config.wtf";

/// Resolved locations of the three managed files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPaths {
    pub world_conf: Option<PathBuf>,
    pub bnet_conf: Option<PathBuf>,
    pub client_conf: Option<PathBuf>,
}

impl ConfigPaths {
    /// Derive the file paths from the configured install folders.
    pub fn discover(settings: &Settings) -> Self {
        let mut paths = Self::default();

        if settings.server_dir.is_empty() {
            tracing::warn!("[paths] server install location is empty, nothing to parse");
        } else {
            let root = Path::new(&settings.server_dir);
            let servers = root.join("Servers");
            if root.join(WORLD_CONF).is_file() || root.join(BNET_CONF).is_file() {
                paths.world_conf = Some(root.join(WORLD_CONF));
                paths.bnet_conf = Some(root.join(BNET_CONF));
            } else if servers.join(WORLD_CONF).is_file()
                || servers.join(BNET_CONF).is_file()
                || servers.is_dir()
            {
                // Files may not exist yet; an existing Servers folder is the
                // best guess of where they will be written.
                paths.world_conf = Some(servers.join(WORLD_CONF));
                paths.bnet_conf = Some(servers.join(BNET_CONF));
            }
        }

        if settings.client_dir.is_empty() {
            tracing::warn!("[paths] client install location is empty, nothing to parse");
        } else {
            let root = Path::new(&settings.client_dir);
            let wtf = root.join("WTF");
            if root.join(CLIENT_CONF).is_file() {
                paths.client_conf = Some(root.join(CLIENT_CONF));
            } else if wtf.join(CLIENT_CONF).is_file() || wtf.is_dir() {
                paths.client_conf = Some(wtf.join(CLIENT_CONF));
            }
        }

        paths
    }

    pub fn world_template() -> PathBuf {
        Path::new(TEMPLATE_DIR).join(WORLD_CONF)
    }

    pub fn bnet_template() -> PathBuf {
        Path::new(TEMPLATE_DIR).join(BNET_CONF)
    }
}
