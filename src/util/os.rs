/// Filesystem and environment helpers.
use std::{fs, io, path::{Path, PathBuf}};

pub type Error = String;

const APP_DIR_NAME: &str = ".ilcg";

pub fn mk_writable_dir(dirpath: &Path) -> io::Result<()> {
    fs::create_dir_all(dirpath)?;

    let mut perms = fs::metadata(dirpath)?.permissions();
    #[allow(clippy::permissions_set_readonly_false)]
    perms.set_readonly(false);
    #[cfg(unix)]
    {
        // Does not apply to Windows
        use std::os::unix::fs::PermissionsExt;
        perms.set_mode(0o700);
    }
    fs::set_permissions(dirpath, perms)
}

// Returns a path like $HOME/.ilcg/. Does not create it.
pub fn app_dir_path() -> Result<PathBuf, Error> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::from("Unable to determine home directory"))?;
    Ok(home_dir.join(APP_DIR_NAME))
}

/// $HOME/.ilcg/config.json, if it exists.
pub fn default_config_path() -> Option<PathBuf> {
    let path = app_dir_path().ok()?.join("config.json");
    if path.is_file() {
        Some(path)
    } else {
        None
    }
}

pub fn env_var_non_empty(name: &str) -> bool {
    match std::env::var(name) {
        Ok(v) => !v.is_empty(),
        Err(_) => false,
    }
}
