//! Template drift detection and healing
//!
//! The shipped template is the source of truth for which keys a config file
//! should carry. Keys the template has but the live file lacks are appended
//! to the live collection (with the template's value); keys the live file
//! has but the template no longer knows about are reported as orphans and
//! left alone. Silently removing a user's settings is not acceptable.

use crate::collection::ConfigCollection;

/// Result of one healing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealOutcome {
    /// Template keys that were missing from the live collection and were
    /// appended to it.
    pub healed: Vec<String>,
    /// Live keys the template does not contain. Preserved, not removed.
    pub orphans: Vec<String>,
}

impl HealOutcome {
    pub fn is_clean(&self) -> bool {
        self.healed.is_empty() && self.orphans.is_empty()
    }
}

/// Heal `live` against `template`. Idempotent: a second pass over unchanged
/// inputs heals nothing and reports the same orphan set.
pub fn heal(live: &mut ConfigCollection, template: &ConfigCollection) -> HealOutcome {
    let mut outcome = HealOutcome::default();

    for entry in template.iter() {
        if !live.has_key(&entry.name) {
            outcome.healed.push(entry.name.clone());
            live.push(entry.clone());
        }
    }

    for entry in live.iter() {
        if !template.has_key(&entry.name) {
            outcome.orphans.push(entry.name.clone());
        }
    }

    outcome
}
