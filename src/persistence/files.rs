use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name of the per-directory data folder created by `timetally init`
pub const LOCAL_DIR_NAME: &str = ".timetally";

/// Resolve the data directory: a local .timetally first, then the platform data dir, then ~/.timetally
pub fn default_data_dir() -> Result<PathBuf> {
    let current_dir = env::current_dir().context("Could not determine current directory")?;
    if let Some(local_dir) = find_local_dir(&current_dir) {
        return Ok(local_dir);
    }

    if let Some(data) = dirs::data_dir() {
        return Ok(data.join("timetally"));
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(LOCAL_DIR_NAME))
}

/// Find a local .timetally directory by walking up the directory tree
pub fn find_local_dir(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;

    loop {
        let candidate = current.join(LOCAL_DIR_NAME);
        if candidate.is_dir() {
            return Some(candidate);
        }

        current = current.parent()?;
    }
}

/// Create `dir` if it is missing
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    Ok(())
}

/// Initialize a local .timetally directory inside `parent`
pub fn init_local_dir(parent: &Path) -> Result<PathBuf> {
    let dir = parent.join(LOCAL_DIR_NAME);

    if dir.exists() {
        anyhow::bail!("Data directory already exists: {}", dir.display());
    }

    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    Ok(dir)
}

/// Path of a user's snapshot document
pub fn user_file(data_dir: &Path, user_id: &str) -> PathBuf {
    data_dir.join(format!("user_{}.json", user_id))
}

pub fn config_file(data_dir: &Path) -> PathBuf {
    data_dir.join("config.json")
}

pub fn log_file(data_dir: &Path) -> PathBuf {
    data_dir.join("timetally.log")
}

/// Atomically write content to a file using temp file + rename
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    let dir = path
        .parent()
        .context("File path has no parent directory")?;

    let mut temp_file = NamedTempFile::new_in(dir)
        .context("Failed to create temporary file")?;

    temp_file
        .write_all(content.as_bytes())
        .context("Failed to write to temporary file")?;

    temp_file
        .as_file()
        .sync_all()
        .context("Failed to sync temporary file")?;

    temp_file
        .persist(path)
        .with_context(|| format!("Failed to persist file: {}", path.display()))?;

    Ok(())
}

/// Copy a file aside with a timestamp suffix; returns the backup path
pub fn backup_file<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let backup_path = path.with_extension(format!("bak.{}.json", timestamp));

    fs::copy(path, &backup_path)
        .with_context(|| format!("Failed to backup file: {}", path.display()))?;

    Ok(backup_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_local_dir_walks_up() {
        let root = tempfile::tempdir().unwrap();
        let local = init_local_dir(root.path()).unwrap();
        let nested = root.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_local_dir(&nested), Some(local));
    }

    #[test]
    fn test_init_local_dir_twice_fails() {
        let root = tempfile::tempdir().unwrap();
        init_local_dir(root.path()).unwrap();
        assert!(init_local_dir(root.path()).is_err());
    }

    #[test]
    fn test_user_file_name() {
        let path = user_file(Path::new("/data"), "alice");
        assert_eq!(path, PathBuf::from("/data/user_alice.json"));
    }

    #[test]
    fn test_atomic_write_replaces_content() {
        let temp_dir = tempfile::tempdir().unwrap();
        let test_file = temp_dir.path().join("test.json");

        atomic_write(&test_file, "first").unwrap();
        atomic_write(&test_file, "second").unwrap();

        assert_eq!(fs::read_to_string(&test_file).unwrap(), "second");
    }

    #[test]
    fn test_backup_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let test_file = temp_dir.path().join("user_x.json");

        atomic_write(&test_file, "{ broken").unwrap();
        let backup_path = backup_file(&test_file).unwrap();

        assert!(backup_path.exists());
        assert_ne!(backup_path, test_file);
        assert_eq!(fs::read_to_string(&backup_path).unwrap(), "{ broken");
    }
}
