//! Client config.wtf handling
//!
//! The game client records which server it connects to in a single line of
//! its config.wtf: `SET portal "<address>"`. The engine only ever touches
//! that one line; everything else passes through untouched (short/blank
//! lines are scrubbed on rewrite).

use thiserror::Error;

/// Marker that identifies the portal line.
pub const PORTAL_MARKER: &str = "SET portal";

#[derive(Debug, Error)]
pub enum PortalError {
    /// The file has no portal line. The client writes one on first run, so
    /// the fix is user-actionable: run the client once, then retry.
    #[error(
        "no '{PORTAL_MARKER}' entry found; the client config may be empty or \
         never populated. Run the client once and exit, then retry"
    )]
    Missing,
}

/// Extract the portal address: locate the line containing the marker and
/// return its first quoted token. Returns the LAST portal line's address if
/// the file somehow carries several.
pub fn extract_portal(text: &str) -> Option<String> {
    let mut portal = None;
    for line in text.lines() {
        if line.contains(PORTAL_MARKER) {
            if let Some(token) = line.split('"').nth(1) {
                portal = Some(token.to_string());
            }
        }
    }
    portal
}

/// Rewrite the portal line to point at `address`, passing other lines
/// through. Lines of two characters or fewer are dropped, which scrubs the
/// blank padding the client tends to leave behind.
pub fn update_portal(text: &str, address: &str) -> Result<String, PortalError> {
    let mut out = String::new();
    let mut found = false;

    for line in text.lines() {
        if line.contains(PORTAL_MARKER) {
            found = true;
            out.push_str(&format!("{} \"{}\"\n", PORTAL_MARKER, address));
        } else if line.len() > 2 {
            out.push_str(line);
            out.push('\n');
        }
    }

    if found {
        Ok(out)
    } else {
        Err(PortalError::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
SET textLocale \"enUS\"
SET audioLocale \"enUS\"
SET portal \"127.0.0.1\"
SET agentUID \"wow_enus\"
";

    #[test]
    fn test_extract_portal() {
        assert_eq!(extract_portal(SAMPLE), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_extract_portal_absent() {
        assert_eq!(extract_portal("SET textLocale \"enUS\"\n"), None);
        assert_eq!(extract_portal(""), None);
    }

    #[test]
    fn test_update_portal_rewrites_only_portal_line() {
        let updated = update_portal(SAMPLE, "192.168.1.50").unwrap();
        assert!(updated.contains("SET portal \"192.168.1.50\""));
        assert!(!updated.contains("127.0.0.1"));
        assert!(updated.contains("SET textLocale \"enUS\""));
        assert!(updated.contains("SET agentUID \"wow_enus\""));
    }

    #[test]
    fn test_update_portal_scrubs_short_lines() {
        let text = "SET portal \"127.0.0.1\"\n\n--\nSET x \"1\"\n";
        let updated = update_portal(text, "10.0.0.5").unwrap();
        assert_eq!(updated, "SET portal \"10.0.0.5\"\nSET x \"1\"\n");
    }

    #[test]
    fn test_update_portal_missing_is_error() {
        let err = update_portal("SET textLocale \"enUS\"\n", "10.0.0.5").unwrap_err();
        assert!(matches!(err, PortalError::Missing));
    }
}
