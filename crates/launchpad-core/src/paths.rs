use std::path::PathBuf;

/// Directory the working directory is placed in.
///
/// `LAUNCHPAD_HOME` wins when set, otherwise the directory holding the
/// running executable, otherwise the current directory.
pub fn launchpad_home() -> PathBuf {
    if let Ok(val) = std::env::var("LAUNCHPAD_HOME") {
        return PathBuf::from(val);
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Working directory for a companion app: `<home>/<display name, lowercased>work`.
pub fn default_work_dir(display_name: &str) -> PathBuf {
    launchpad_home().join(work_dir_name(display_name))
}

/// File name of the working directory for `display_name`.
pub fn work_dir_name(display_name: &str) -> String {
    format!("{}work", display_name.to_lowercase())
}
