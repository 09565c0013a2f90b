//! Device-address normalization for sensor registration.

use crate::Error;

// ---

/// Normalize and validate a MAC-style device address.
///
/// Trims surrounding whitespace, uppercases, and replaces `-` with `:`.
/// The result must be six colon-separated two-digit hex groups
/// (`AA:BB:CC:11:22:33`); anything else is a [`Error::Validation`].
///
/// Pure and deterministic, and idempotent on already-normalized input.
pub fn normalize_mac(raw: &str) -> Result<String, Error> {
    // ---
    let v = raw.trim().to_uppercase().replace('-', ":");

    if v.is_empty() {
        return Err(Error::Validation("MAC address cannot be empty".into()));
    }

    let groups: Vec<&str> = v.split(':').collect();
    let well_formed = groups.len() == 6
        && groups
            .iter()
            .all(|g| g.len() == 2 && g.chars().all(|c| c.is_ascii_hexdigit()));

    if !well_formed {
        return Err(Error::Validation(
            "Invalid MAC address format. Use XX:XX:XX:XX:XX:XX".into(),
        ));
    }

    Ok(v)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_normalization() {
        // ---
        assert_eq!(
            normalize_mac("aa-bb-cc-11-22-33").unwrap(),
            "AA:BB:CC:11:22:33"
        );
        assert_eq!(
            normalize_mac("  aa:bb:cc:11:22:33  ").unwrap(),
            "AA:BB:CC:11:22:33"
        );
    }

    #[test]
    fn test_idempotence() {
        // ---
        let once = normalize_mac("aa-bb-cc-11-22-33").unwrap();
        let twice = normalize_mac(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input_rejected() {
        // ---
        assert!(matches!(normalize_mac(""), Err(Error::Validation(_))));
        assert!(matches!(normalize_mac("   "), Err(Error::Validation(_))));
    }

    #[test]
    fn test_malformed_input_rejected() {
        // ---
        // Non-hex characters
        assert!(normalize_mac("AA:BB:CC:11:22:ZZ").is_err());
        // Wrong group count
        assert!(normalize_mac("AA:BB:CC:11:22").is_err());
        assert!(normalize_mac("AA:BB:CC:11:22:33:44").is_err());
        // Wrong group width
        assert!(normalize_mac("AAA:BB:CC:11:22:3").is_err());
        // Wrong separator
        assert!(normalize_mac("AA.BB.CC.11.22.33").is_err());
    }
}
