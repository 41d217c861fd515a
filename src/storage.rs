use crate::model::Roster;
use anyhow::{anyhow, Context};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Verrou tenu entre `load` et `save` ; relâché au drop.
#[derive(Debug, Default)]
pub struct StorageLock {
    _file: Option<File>,
}

pub trait Storage {
    /// Charge le document complet depuis un support.
    fn load(&self) -> anyhow::Result<Roster>;
    /// Sauvegarde de manière atomique.
    fn save(&self, roster: &Roster) -> anyhow::Result<()>;
    /// Exclusion entre processus partageant le support. Aucun verrou par défaut.
    fn lock(&self) -> anyhow::Result<StorageLock> {
        Ok(StorageLock::default())
    }
}

/// Stockage fichier JSON. Un fichier absent se charge comme un roster vide.
pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self { path: path.as_ref().to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fichier verrou voisin (`duties.json.lock`) : le roster lui-même est remplacé par
    /// renommage à chaque sauvegarde, un verrou posé dessus ne survivrait pas.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<Roster> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Roster::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", self.path.display()))
            }
        };
        let roster: Roster = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(roster)
    }

    fn save(&self, roster: &Roster) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(roster)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }

    fn lock(&self) -> anyhow::Result<StorageLock> {
        let path = self.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("locking {}", path.display()))?;
        Ok(StorageLock { _file: Some(file) })
    }
}

/// Stockage mémoire (tests, usage embarqué). Compte les écritures.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    roster: Roster,
    saves: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roster(roster: Roster) -> Self {
        Self { inner: Mutex::new(MemoryState { roster, saves: 0 }) }
    }

    /// Nombre de sauvegardes effectuées depuis la création.
    pub fn save_count(&self) -> usize {
        self.inner.lock().map(|state| state.saves).unwrap_or_default()
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> anyhow::Result<Roster> {
        let state = self.inner.lock().map_err(|_| anyhow!("memory storage poisoned"))?;
        Ok(state.roster.clone())
    }

    fn save(&self, roster: &Roster) -> anyhow::Result<()> {
        let mut state = self.inner.lock().map_err(|_| anyhow!("memory storage poisoned"))?;
        state.roster = roster.clone();
        state.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn json_lock_excludes_a_second_handle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("duties.json");
        let first = JsonStorage::open(&path).unwrap();
        let second = JsonStorage::open(&path).unwrap();
        assert_eq!(first.lock_path(), dir.path().join("duties.json.lock"));

        let guard = first.lock().unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        let waiter = std::thread::spawn(move || {
            let _held = second.lock().unwrap();
            tx.send(()).unwrap();
        });
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        drop(guard);
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        waiter.join().unwrap();
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::open(dir.path().join("absent.json")).unwrap();
        assert_eq!(storage.load().unwrap(), Roster::default());
    }
}
