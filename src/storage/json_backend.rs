use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    errors::{StorageError, StorageResult},
    utils::{ensure_dir, write_atomic},
};

use super::{Snapshot, SnapshotStore};

const DATA_FILE: &str = "budget.json";
const BACKUP_DIR: &str = "backups";
const BACKUP_PREFIX: &str = "budget";
const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%3f";
const DEFAULT_RETENTION: usize = 5;

/// Snapshot store persisted as a single pretty-printed JSON document.
///
/// Every committed write rewrites the file atomically; a failed write keeps
/// both the file and the in-memory state at their previous values.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
    state: RwLock<Snapshot>,
}

impl JsonStore {
    pub fn open(root: impl Into<PathBuf>, retention: Option<usize>) -> StorageResult<Self> {
        let root = root.into();
        ensure_dir(&root)?;
        let path = root.join(DATA_FILE);
        let snapshot = if path.exists() {
            load_snapshot(&path)?
        } else {
            Snapshot::default()
        };
        debug!(
            "opened json store at {} ({} groups)",
            path.display(),
            snapshot.groups.len()
        );
        Ok(Self {
            path,
            backups_dir: root.join(BACKUP_DIR),
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
            state: RwLock::new(snapshot),
        })
    }

    pub fn from_config(config: &Config) -> StorageResult<Self> {
        Self::open(config.resolve_data_dir(), Some(config.backup_retention))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copies the current state into a timestamped backup and prunes old ones.
    pub fn backup(&self, note: Option<&str>) -> StorageResult<String> {
        let snapshot = self.read(Snapshot::clone)?;
        ensure_dir(&self.backups_dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let stem = format!("{BACKUP_PREFIX}_{timestamp}_");
        let sequence = self
            .list_backups()?
            .iter()
            .filter_map(|name| name.strip_prefix(&stem))
            .filter_map(|rest| rest.get(..3)?.parse::<u32>().ok())
            .max()
            .map_or(0, |last| last + 1);
        let mut name = format!("{BACKUP_PREFIX}_{timestamp}_{sequence:03}");
        if let Some(label) = sanitize_note(note) {
            name.push('_');
            name.push_str(&label);
        }
        name.push_str(&format!(".{BACKUP_EXTENSION}"));

        let json = serde_json::to_string_pretty(&snapshot)?;
        write_atomic(&self.backups_dir.join(&name), &json)?;
        info!("wrote backup {}", name);
        self.prune_backups()?;
        Ok(name)
    }

    /// Backup file names, newest first.
    pub fn list_backups(&self) -> StorageResult<Vec<String>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                if name.starts_with(BACKUP_PREFIX) {
                    entries.push(name.to_string());
                }
            }
        }
        entries.sort_by(|a, b| b.cmp(a));
        Ok(entries)
    }

    /// Replaces the live state with a backup and persists it.
    ///
    /// Only names reported by [`list_backups`](Self::list_backups) are accepted.
    pub fn restore(&self, backup_name: &str) -> StorageResult<()> {
        if !self.list_backups()?.iter().any(|name| name == backup_name) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("backup `{backup_name}` not found"),
            )));
        }
        let restored = load_snapshot(&self.backups_dir.join(backup_name))?;
        self.write(|snapshot| {
            *snapshot = restored;
            Ok(())
        })?;
        info!("restored state from backup {}", backup_name);
        Ok(())
    }

    fn prune_backups(&self) -> StorageResult<()> {
        let backups = self.list_backups()?;
        for stale in backups.iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(self.backups_dir.join(stale)) {
                warn!("could not prune backup {}: {}", stale, err);
            }
        }
        Ok(())
    }
}

impl SnapshotStore for JsonStore {
    fn read<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> StorageResult<R> {
        let guard = self.state.read().map_err(|_| StorageError::Poisoned)?;
        Ok(f(&*guard))
    }

    fn write<R>(&self, f: impl FnOnce(&mut Snapshot) -> StorageResult<R>) -> StorageResult<R> {
        let mut guard = self.state.write().map_err(|_| StorageError::Poisoned)?;
        let mut staged = guard.clone();
        let output = f(&mut staged)?;
        let json = serde_json::to_string_pretty(&staged)?;
        write_atomic(&self.path, &json)?;
        *guard = staged;
        Ok(output)
    }
}

fn load_snapshot(path: &Path) -> StorageResult<Snapshot> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn sanitize_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_')) && !sanitized.is_empty() && !last_dash {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Description, DisplayOrder, Group, Name};
    use crate::storage::GroupRepository;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn store_with_temp_dir(retention: usize) -> (JsonStore, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let store = JsonStore::open(temp.path(), Some(retention)).expect("json store");
        (store, temp)
    }

    fn sample_group() -> Group {
        Group::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Name::new("Household").unwrap(),
            Description::default(),
            DisplayOrder::default(),
        )
    }

    #[test]
    fn writes_survive_reopen() {
        let (store, temp) = store_with_temp_dir(3);
        let group = sample_group();
        store.save_group(&group).expect("save group");

        let reopened = JsonStore::open(temp.path(), None).expect("reopen");
        assert_eq!(reopened.find_group(group.id()).expect("find group"), group);
    }

    #[test]
    fn backups_are_listed_newest_first_and_pruned() {
        let (store, _guard) = store_with_temp_dir(2);
        store.save_group(&sample_group()).unwrap();
        let first = store.backup(Some("Before import")).unwrap();
        let second = store.backup(None).unwrap();
        let third = store.backup(None).unwrap();
        assert!(first.ends_with("_before-import.json"), "{first}");

        let backups = store.list_backups().unwrap();
        assert_eq!(backups, vec![third, second]);
    }

    #[test]
    fn restore_replaces_state() {
        let (store, _guard) = store_with_temp_dir(3);
        let kept = sample_group();
        store.save_group(&kept).unwrap();
        let backup = store.backup(None).unwrap();
        let later = sample_group();
        store.save_group(&later).unwrap();

        store.restore(&backup).unwrap();
        assert!(store.find_group(kept.id()).is_ok());
        assert!(store.find_group(later.id()).is_err());
        assert!(store.restore("budget_missing.json").is_err());
    }

    #[test]
    fn restore_only_accepts_listed_backups() {
        let (store, temp) = store_with_temp_dir(3);
        store.save_group(&sample_group()).unwrap();
        store.backup(None).unwrap();
        let outside = temp.path().join("budget_outside.json");
        fs::write(&outside, "{}").unwrap();

        for name in ["../budget.json", "../budget_outside.json", outside.to_str().unwrap()] {
            let err = store.restore(name).unwrap_err();
            assert!(matches!(err, StorageError::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound), "{name}");
        }
        assert_eq!(store.read(|s| s.groups.len()).unwrap(), 1);
    }

    #[test]
    fn corrupt_state_is_refused_on_open() {
        let (store, temp) = store_with_temp_dir(3);
        let group = sample_group();
        store.save_group(&group).unwrap();
        let mut json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        json["groups"][0]["name"] = "".into();
        fs::write(store.path(), json.to_string()).unwrap();

        let err = JsonStore::open(temp.path(), None).unwrap_err();
        assert!(matches!(err, StorageError::Serde(_)), "{err}");
    }

    #[test]
    fn corrupt_backup_is_refused_on_restore() {
        let (store, _guard) = store_with_temp_dir(3);
        let group = sample_group();
        store.save_group(&group).unwrap();
        let backup = store.backup(None).unwrap();
        let path = store.backups_dir.join(&backup);
        let mut json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        json["groups"][0]["categories"] = serde_json::json!([{
            "id": Uuid::new_v4(),
            "group_id": Uuid::new_v4(),
            "name": "Food",
            "recurrence": {"kind": "recurring", "start": "2024-05", "end": "2024-01"},
            "budget": {"cents": -500, "currency": "USD"}
        }]);
        fs::write(&path, json.to_string()).unwrap();

        assert!(store.restore(&backup).is_err());
        assert_eq!(store.find_group(group.id()).unwrap(), group);
    }

    #[test]
    fn failed_persist_keeps_memory_and_file() {
        let (store, _guard) = store_with_temp_dir(3);
        let group = sample_group();
        store.save_group(&group).unwrap();
        let original = fs::read_to_string(store.path()).unwrap();

        fs::create_dir_all(crate::utils::tmp_path(store.path())).unwrap();
        assert!(store.save_group(&sample_group()).is_err());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), original);
        assert_eq!(store.read(|s| s.groups.len()).unwrap(), 1);
    }

    #[test]
    fn sanitize_note_rules() {
        assert_eq!(sanitize_note(Some("  Monthly  Close ")), Some("monthly-close".into()));
        assert_eq!(sanitize_note(Some("v1.2_final")), Some("v1-2-final".into()));
        assert_eq!(sanitize_note(Some("!!!")), None);
        assert_eq!(sanitize_note(None), None);
    }
}
