//! Configuration loading and resolution.

use std::path::PathBuf;

/// Resolve the preferences file path.
pub fn resolve_prefs_path(explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }

    if let Ok(env_path) = std::env::var("MACHINEVISOR_PREFS") {
        if !env_path.trim().is_empty() {
            return PathBuf::from(env_path);
        }
    }

    let cwd_prefs = PathBuf::from(".machinevisor/prefs.json");
    if cwd_prefs.exists() {
        return cwd_prefs;
    }

    resolve_default_prefs_path()
}

fn resolve_default_prefs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    PathBuf::from(home).join(".machinevisor").join("prefs.json")
}
