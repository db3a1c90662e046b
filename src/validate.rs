//! Cross-source validation
//!
//! Compares the two server configs, the client config and the realm record
//! for contradictions: mismatched builds and addresses, ports that will not
//! connect, feature flags that conflict with each other, and settings with
//! known-unsafe values. Structural anomalies (template drift, duplicate
//! keys, comments inside values) are reported too; drift is the one thing
//! healed automatically, since a completed collection is strictly safer
//! than one missing keys.
//!
//! Every check runs even after one fails; they are independent.

use std::fmt;

use crate::clientconf;
use crate::collection::ConfigCollection;
use crate::diff::{self, HealOutcome};
use crate::realm::RealmFields;

// Setting keys shared across checks and edit operations.
pub const KEY_BUILD: &str = "Game.Build.Version";
pub const KEY_EXTERNAL_ADDRESS: &str = "LoginREST.ExternalAddress";
pub const KEY_LOCAL_ADDRESS: &str = "LoginREST.LocalAddress";
pub const KEY_BIND_IP: &str = "BindIP";
pub const KEY_WORLD_PORT: &str = "WorldServerPort";

/// Every listener binds all interfaces; the deployment never changes this.
pub const WILDCARD_ADDR: &str = "0.0.0.0";
pub const LOOPBACK_ADDR: &str = "127.0.0.1";

/// Documented port defaults. Deviation is a warning, not fatal.
pub const DEFAULT_WORLD_PORT: &str = "8198";
pub const DEFAULT_GAME_PORT: &str = "8086";

/// 7.3.5 client builds the deployment supports.
pub const KNOWN_BUILDS: [&str; 6] = ["26124", "26365", "26654", "26822", "26899", "26972"];

/// Character templates are broken on this build.
const TEMPLATE_INCOMPATIBLE_BUILD: &str = "26972";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Confirmation or informational note.
    Ok,
    /// Non-fatal, advisory.
    Warning,
    /// Contradiction requiring user action.
    Alert,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Ok => write!(f, "OK"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Alert => write!(f, "ALERT"),
        }
    }
}

/// One tagged diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub check: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Ordered list of findings, accumulated across all checks. Never partially
/// discarded.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    findings: Vec<Finding>,
}

impl ValidationReport {
    fn push(&mut self, check: &'static str, severity: Severity, message: impl Into<String>) {
        self.findings.push(Finding {
            check,
            severity,
            message: message.into(),
        });
    }

    fn ok(&mut self, check: &'static str, message: impl Into<String>) {
        self.push(check, Severity::Ok, message);
    }

    fn warn(&mut self, check: &'static str, message: impl Into<String>) {
        self.push(check, Severity::Warning, message);
    }

    fn alert(&mut self, check: &'static str, message: impl Into<String>) {
        self.push(check, Severity::Alert, message);
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn has_alerts(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Alert)
    }

    pub fn has_warnings(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Warning)
    }

    /// Render for display, one tagged line per finding.
    pub fn render(&self) -> String {
        self.findings
            .iter()
            .map(|f| format!("[{}] {}", f.severity, f.message))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn finish(&mut self) {
        if self.has_alerts() {
            self.alert("summary", "Issues were found!");
        } else if self.has_warnings() {
            self.warn(
                "summary",
                "Warnings were found; these can impact server stability or \
                 performance and the flagged settings may need to change.",
            );
        } else {
            self.ok("summary", "No known problems were found!");
        }
    }
}

/// Run every check against the two live collections, the client config text
/// (None when the file was not found) and the realm record.
///
/// Drift-healing runs first and is the only mutation: missing template keys
/// are appended to the live collections before anything is compared, and the
/// healed keys are reported so the user knows to export afterwards.
pub fn validate(
    world: &mut ConfigCollection,
    bnet: &mut ConfigCollection,
    world_template: &ConfigCollection,
    bnet_template: &ConfigCollection,
    client_text: Option<&str>,
    realm: &RealmFields,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    report_drift(&mut report, "gateway", diff::heal(bnet, bnet_template));
    report_drift(&mut report, "world", diff::heal(world, world_template));

    // Even after healing nothing loaded means the templates themselves are
    // missing; none of the value checks can say anything useful.
    if world.is_empty() || bnet.is_empty() {
        report.alert(
            "structure",
            "A config collection is empty even after applying templates; \
             the template files may be missing.",
        );
        report.finish();
        return report;
    }

    check_build(&mut report, world, bnet, realm);
    check_bind_addresses(&mut report, world, bnet);
    check_external_addresses(&mut report, bnet, client_text, realm);
    check_local_addresses(&mut report, bnet, realm);
    check_ports(&mut report, world, realm);
    check_feature_flags(&mut report, world);
    check_structure(&mut report, "gateway", bnet);
    check_structure(&mut report, "world", world);

    report.finish();
    report
}

fn report_drift(report: &mut ValidationReport, which: &'static str, outcome: HealOutcome) {
    for name in &outcome.healed {
        report.warn(
            "template-drift",
            format!(
                "[{}] exists in the {} template but not in current settings. \
                 Entry added; export afterwards to save it.",
                name, which
            ),
        );
    }
    for name in &outcome.orphans {
        report.warn(
            "template-drift",
            format!(
                "[{}] exists in current {} settings but not in the template. \
                 Verify whether this entry is still needed.",
                name, which
            ),
        );
    }
}

fn check_build(
    report: &mut ValidationReport,
    world: &ConfigCollection,
    bnet: &ConfigCollection,
    realm: &RealmFields,
) {
    let world_build = world.get_value(KEY_BUILD);
    let bnet_build = bnet.get_value(KEY_BUILD);

    if bnet_build != realm.build || bnet_build != world_build {
        report.alert(
            "build",
            format!(
                "{} mismatch: realm record has [{}], world config has [{}], \
                 gateway config has [{}]. Set the build everywhere, then \
                 export.",
                KEY_BUILD, realm.build, world_build, bnet_build
            ),
        );
    } else {
        report.ok(
            "build",
            format!("{} [{}] numbers match.", KEY_BUILD, realm.build),
        );
    }
}

fn check_bind_addresses(
    report: &mut ValidationReport,
    world: &ConfigCollection,
    bnet: &ConfigCollection,
) {
    let world_bind = world.get_value(KEY_BIND_IP);
    let bnet_bind = bnet.get_value(KEY_BIND_IP);

    if world_bind != WILDCARD_ADDR || bnet_bind != WILDCARD_ADDR {
        report.alert(
            "bind-address",
            format!(
                "Both world and gateway {} should be \"{}\"; world has [{}], \
                 gateway has [{}].",
                KEY_BIND_IP, WILDCARD_ADDR, world_bind, bnet_bind
            ),
        );
    } else {
        report.ok(
            "bind-address",
            format!("{} settings match [{}] and are set properly.", KEY_BIND_IP, world_bind),
        );
    }
}

fn check_external_addresses(
    report: &mut ValidationReport,
    bnet: &ConfigCollection,
    client_text: Option<&str>,
    realm: &RealmFields,
) {
    let external = bnet.get_value(KEY_EXTERNAL_ADDRESS);

    let portal = match client_text {
        None => {
            report.alert(
                "client-config",
                "Client config file not found; cannot check the portal entry.",
            );
            None
        }
        Some(text) => {
            if text.lines().count() < 2 {
                report.warn(
                    "client-config",
                    "The client config is empty or near-empty. Run the client \
                     once and exit to populate it with defaults, then this \
                     tool can update it properly.",
                );
            }
            // A present file with no portal line compares as empty, which
            // flags the mismatch below.
            Some(clientconf::extract_portal(text).unwrap_or_default())
        }
    };

    let portal_mismatch = portal.as_deref().is_some_and(|p| p != external);

    if external != realm.address || portal_mismatch {
        report.alert(
            "external-address",
            format!(
                "Hosting addresses disagree: {} is [{}], realm record address \
                 is [{}], client portal entry is [{}]. All of these should \
                 match; ignore only if the client config is stale on purpose.",
                KEY_EXTERNAL_ADDRESS,
                external,
                realm.address,
                portal.as_deref().unwrap_or("unavailable")
            ),
        );
    } else if portal.is_none() {
        report.warn(
            "external-address",
            format!(
                "Hosting addresses for the realm record and gateway config \
                 match [{}], but the client config could not be verified.",
                realm.address
            ),
        );
    } else {
        report.ok(
            "external-address",
            format!("Hosting addresses all match [{}].", realm.address),
        );
    }
}

fn check_local_addresses(
    report: &mut ValidationReport,
    bnet: &ConfigCollection,
    realm: &RealmFields,
) {
    let local = bnet.get_value(KEY_LOCAL_ADDRESS);
    if local != LOOPBACK_ADDR || realm.local_address != LOOPBACK_ADDR {
        report.alert(
            "local-address",
            format!(
                "{} is [{}] and the realm record localAddress is [{}]; both \
                 should match and stay at {}.",
                KEY_LOCAL_ADDRESS, local, realm.local_address, LOOPBACK_ADDR
            ),
        );
    }
}

fn check_ports(report: &mut ValidationReport, world: &ConfigCollection, realm: &RealmFields) {
    let world_port = world.get_value(KEY_WORLD_PORT);

    if world_port != realm.port {
        report.alert(
            "server-port",
            format!(
                "{} is [{}] but the realm record port is [{}]; these must \
                 match or clients cannot connect.",
                KEY_WORLD_PORT, world_port, realm.port
            ),
        );
    }

    if world_port != DEFAULT_WORLD_PORT {
        report.warn(
            "port-default",
            format!(
                "{} is not {}, which is the default. This may lead to \
                 unexpected issues.",
                KEY_WORLD_PORT, DEFAULT_WORLD_PORT
            ),
        );
    }
    if realm.game_port != DEFAULT_GAME_PORT {
        report.warn(
            "port-default",
            format!(
                "Realm record gamePort is not {}, which is the default. This \
                 may lead to unexpected issues.",
                DEFAULT_GAME_PORT
            ),
        );
    }
}

fn check_feature_flags(report: &mut ValidationReport, world: &ConfigCollection) {
    let world_build = world.get_value(KEY_BUILD);

    // Solocraft scales players for solo play; the flexcraft family scales
    // the content instead. Running both fights itself.
    if world.is_enabled("Solocraft.Enable") {
        for flex in ["HealthCraft.Enable", "UnitModCraft.Enable", "Combat.Rating.Craft.Enable"] {
            if world.is_enabled(flex) {
                report.alert(
                    "solo-flex",
                    format!(
                        "Solocraft.Enable and {} are both enabled; this will \
                         cause conflicts. Disabling Solocraft is recommended.",
                        flex
                    ),
                );
            }
        }
    }

    if world.is_enabled("Bpay.Enabled") != world.is_enabled("Purchase.Shop.Enabled") {
        report.alert(
            "shop-flags",
            "Bpay.Enabled and Purchase.Shop.Enabled should both be enabled \
             or both be disabled in the world config.",
        );
    }

    if world.is_enabled("Battle.Coin.Vendor.Enable")
        && world.is_enabled("Battle.Coin.Vendor.Custom.Enable")
    {
        report.alert(
            "vendor-flags",
            "Battle.Coin.Vendor.Enable and Battle.Coin.Vendor.Custom.Enable \
             are both enabled; only one of the two vendors should be.",
        );
    }

    if world.is_enabled("Character.Template") && world_build == TEMPLATE_INCOMPATIBLE_BUILD {
        report.warn(
            "character-template",
            format!(
                "Character.Template does not work with client build {}. Set \
                 it to 0 on this build for best results.",
                TEMPLATE_INCOMPATIBLE_BUILD
            ),
        );
    }

    if !world.is_enabled("WorldChat.Enable") {
        report.warn(
            "world-chat",
            "WorldChat.Enable = 0 can crash the server when any command is \
             used, and disables all commands including for GMs. Enabling it \
             is recommended.",
        );
    }

    if world.is_enabled("BaseMapLoadAllGrids") || world.is_enabled("InstanceMapLoadAllGrids") {
        report.warn(
            "grid-memory",
            "BaseMapLoadAllGrids and InstanceMapLoadAllGrids should be 0. If \
             the worldserver crashes loading maps or runs out of memory, \
             this is why.",
        );
    }
    if !world.is_enabled("GridUnload") {
        report.warn(
            "grid-memory",
            "GridUnload may need to be 1 to unload unused map grids and \
             release memory. If the server runs out of memory under load, \
             this is why.",
        );
    }

    if world.is_enabled("Disallow.Multiple.Client") {
        report.warn(
            "multiple-clients",
            "Disallow.Multiple.Client = 1 blocks multiple client connections \
             from the same network. Set it to 0 for multiboxing or several \
             players behind one router.",
        );
    }

    if world.is_enabled("Custom.HurtInRealTime") {
        report.ok(
            "note",
            "Custom.HurtInRealTime = 1 means clicking for every weapon \
             swing. Set it to 0 for auto-attack.",
        );
    }
    if world.is_enabled("Custom.NoCastTime") {
        report.ok(
            "note",
            "Custom.NoCastTime = 1 may cause unintended effects when \
             casting. Set it to 0 to restore cast times.",
        );
    }

    if world.is_enabled("Garrisone.DisableUpgrade") {
        report.warn(
            "garrison",
            "Garrisone.DisableUpgrade = 1 breaks garrison upgrades. Set it \
             to 0 to enable them.",
        );
    }
}

fn check_structure(report: &mut ValidationReport, which: &'static str, collection: &ConfigCollection) {
    let duplicates = collection.duplicate_names();
    if !duplicates.is_empty() {
        report.alert(
            "duplicates",
            format!(
                "Duplicate entries found in the {} config for [{}].",
                which,
                duplicates.join(", ")
            ),
        );
    }

    for name in collection.inline_comment_names() {
        report.warn(
            "inline-comments",
            format!(
                "Entry [{}] in the {} config has a \"#\" character in its \
                 value. Keep comments on their own lines, separate from \
                 values.",
                name, which
            ),
        );
    }
}
