//! Datastore path normalization
//!
//! Disk paths arrive in bracketed-datastore notation, for example
//! `[ds1] vmA/vmA.vmdk`. The same file can be referenced with different
//! casing, stray whitespace, or without the datastore prefix, so every
//! comparison in the auditor goes through the canonical forms produced
//! here. All functions are pure and infallible.

/// Filename suffixes of auto-generated dependent disk artifacts.
///
/// Files carrying one of these (delta chains, flat extents, change
/// tracking, raw device maps, sesparse snapshots, numbered snapshot
/// deltas) have no independent lifecycle and are never reported on
/// their own.
pub const DEPENDENT_SUFFIXES: &[&str] = &["-flat", "-delta", "-ctk", "-rdm", "-sesparse"];

/// Prefix of the numbered snapshot-delta family (`-000001`, `-000002`, ...)
const NUMBERED_DELTA_PREFIX: &str = "-000";

/// Canonicalize a datastore-qualified path for comparison.
///
/// Folds case, trims surrounding whitespace, and strips trailing path
/// separators. Idempotent: `normalize(normalize(p)) == normalize(p)`.
#[must_use]
pub fn normalize(path: &str) -> String {
    let trimmed = path.trim().to_lowercase();
    trimmed.trim_end_matches('/').to_string()
}

/// Extract the datastore name from a bracketed path.
///
/// `[ds1] vmA/vmA.vmdk` yields `ds1`; paths without a bracket prefix
/// yield `None`.
#[must_use]
pub fn datastore_name(path: &str) -> Option<&str> {
    let rest = path.trim_start().strip_prefix('[')?;
    let end = rest.find(']')?;
    Some(&rest[..end])
}

/// Strip the bracketed datastore prefix: `[ds1] vmA/vmA.vmdk` yields
/// `vmA/vmA.vmdk`. Returns `None` when the path has no such prefix.
#[must_use]
pub fn strip_datastore_prefix(path: &str) -> Option<&str> {
    let rest = path.trim_start().strip_prefix('[')?;
    let end = rest.find(']')?;
    Some(rest[end + 1..].trim_start())
}

/// Last path component of a datastore path
#[must_use]
pub fn base_name(path: &str) -> &str {
    let path = path.trim_end_matches('/');
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => strip_datastore_prefix(path).unwrap_or(path),
    }
}

/// Containing folder of a datastore path, without a trailing separator.
///
/// `[ds1] vmA/vmA.vmdk` yields `[ds1] vmA`; a path with no folder
/// component yields the datastore prefix alone (`[ds1]`).
#[must_use]
pub fn parent_folder(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[..idx],
        None => match trimmed.find(']') {
            Some(end) => trimmed[..=end].trim_end(),
            None => "",
        },
    }
}

/// File stem of a disk-image name: `vmA.vmdk` yields `vmA`.
///
/// The extension comparison is case-insensitive; names without a
/// recognized extension pass through unchanged.
#[must_use]
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if name[idx..].eq_ignore_ascii_case(".vmdk") => &name[..idx],
        _ => name,
    }
}

/// Strip a dependent-artifact suffix from a file stem, yielding the
/// base disk name.
///
/// `vmA-flat` yields `vmA`, `vmA-000002` yields `vmA`. A stem without
/// a recognized suffix is returned unchanged.
#[must_use]
pub fn strip_dependent_suffix(stem: &str) -> &str {
    // ASCII lowering keeps byte offsets aligned with the input
    let lower = stem.to_ascii_lowercase();
    for suffix in DEPENDENT_SUFFIXES {
        if lower.ends_with(suffix) {
            return &stem[..stem.len() - suffix.len()];
        }
    }
    // Numbered snapshot deltas: "-000" followed by trailing digits
    if let Some(idx) = lower.rfind(NUMBERED_DELTA_PREFIX) {
        let tail = &lower[idx + NUMBERED_DELTA_PREFIX.len()..];
        if tail.chars().all(|c| c.is_ascii_digit()) {
            return &stem[..idx];
        }
    }
    stem
}

/// `true` when a file name denotes a dependent-helper artifact that
/// must never produce a standalone classification record
#[must_use]
pub fn is_dependent_helper(file_name: &str) -> bool {
    let stem = file_stem(file_name);
    strip_dependent_suffix(stem).len() != stem.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        for p in [
            "[DS1] VmA/VmA.vmdk",
            "  [ds1] old/old.vmdk  ",
            "[ds1] trail/",
            "/plain/path.vmdk",
        ] {
            let once = normalize(p);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn normalize_folds_case_and_trims() {
        assert_eq!(normalize(" [DS1] VmA/VmA.vmdk "), "[ds1] vma/vma.vmdk");
        assert_eq!(normalize("[ds1] a/b/"), "[ds1] a/b");
    }

    #[test]
    fn datastore_prefix_roundtrip() {
        assert_eq!(datastore_name("[ds1] vmA/vmA.vmdk"), Some("ds1"));
        assert_eq!(strip_datastore_prefix("[ds1] vmA/vmA.vmdk"), Some("vmA/vmA.vmdk"));
        assert_eq!(strip_datastore_prefix("vmA/vmA.vmdk"), None);
    }

    #[test]
    fn base_name_and_parent_folder() {
        assert_eq!(base_name("[ds1] vmA/vmA.vmdk"), "vmA.vmdk");
        assert_eq!(parent_folder("[ds1] vmA/vmA.vmdk"), "[ds1] vmA");
        assert_eq!(base_name("[ds1] top.vmdk"), "top.vmdk");
        assert_eq!(parent_folder("[ds1] top.vmdk"), "[ds1]");
    }

    #[test]
    fn dependent_suffix_recognition() {
        assert_eq!(strip_dependent_suffix("vmA-flat"), "vmA");
        assert_eq!(strip_dependent_suffix("vmA-delta"), "vmA");
        assert_eq!(strip_dependent_suffix("vmA-ctk"), "vmA");
        assert_eq!(strip_dependent_suffix("vmA-rdm"), "vmA");
        assert_eq!(strip_dependent_suffix("vmA-sesparse"), "vmA");
        assert_eq!(strip_dependent_suffix("vmA-000001"), "vmA");
        assert_eq!(strip_dependent_suffix("vmA"), "vmA");
        assert_eq!(strip_dependent_suffix("vmA-data"), "vmA-data");
    }

    #[test]
    fn helper_detection_ignores_case() {
        assert!(is_dependent_helper("disk-flat.vmdk"));
        assert!(is_dependent_helper("disk-FLAT.VMDK"));
        assert!(is_dependent_helper("disk-000003.vmdk"));
        assert!(!is_dependent_helper("disk.vmdk"));
        assert!(!is_dependent_helper("disk-data.vmdk"));
    }
}
