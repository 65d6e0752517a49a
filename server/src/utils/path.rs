//! Path helpers for user-supplied locations

use std::path::PathBuf;

/// Resolve `~`, `~/...` and relative paths against the home and working
/// directories. Absolute paths pass through. Blank input means the working
/// directory.
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();
    if path.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let expanded = match (path, dirs::home_dir()) {
        ("~", Some(home)) => home,
        (p, Some(home)) if p.starts_with("~/") => home.join(&p[2..]),
        (p, _) => PathBuf::from(p),
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_unchanged() {
        assert_eq!(expand_path("  /srv/traces.json "), PathBuf::from("/srv/traces.json"));
    }

    #[test]
    fn test_relative_becomes_absolute() {
        let result = expand_path("fixtures/run.json");
        assert!(result.is_absolute());
        assert!(result.ends_with("fixtures/run.json"));
    }

    #[test]
    fn test_tilde_expands_to_home() {
        let result = expand_path("~/.tracescope");
        assert!(!result.to_string_lossy().contains('~'));
        assert!(result.ends_with(".tracescope"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~"), home);
        }
    }

    #[test]
    fn test_blank_is_current_dir() {
        assert!(expand_path("   ").is_absolute());
    }
}
