use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use atlas_layout::{Grouping, Item};
use tracing::debug;

use crate::error::StoreError;
use crate::snapshot::Snapshot;
use crate::store::EmbeddingStore;

/// File format magic and version.
const MAGIC: [u8; 4] = *b"ATLS";
const VERSION: u32 = 1;
const HEADER_LEN: usize = 8;

/// [`EmbeddingStore`] backed by a single snapshot file.
///
/// The whole snapshot lives in memory; every mutation rewrites the file.
///
/// ```text
/// [4B magic "ATLS"] [4B version, little-endian]
/// [MessagePack-encoded Snapshot with named fields]
/// ```
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash leaves either the old or the new snapshot.
pub struct FileStore {
    path: PathBuf,
    inner: Mutex<Snapshot>,
}

impl FileStore {
    /// Opens the store at `path`, loading it if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let snapshot = if path.exists() {
            load(&path)?
        } else {
            Snapshot::default()
        };
        debug!(path = %path.display(), items = snapshot.len(), "store: opened");
        Ok(Self {
            path,
            inner: Mutex::new(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `f` to the snapshot and writes it out. On error the
    /// in-memory state is rolled back.
    fn update<T>(
        &self,
        f: impl FnOnce(&mut Snapshot) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let mut next = inner.clone();
        let out = f(&mut next)?;
        save(&self.path, &next)?;
        *inner = next;
        Ok(out)
    }
}

impl EmbeddingStore for FileStore {
    fn put_items(&self, items: &[Item]) -> Result<(), StoreError> {
        self.update(|s| {
            s.upsert(items);
            Ok(())
        })
    }

    fn items(&self) -> Result<Vec<Item>, StoreError> {
        Ok(self.inner.lock().unwrap().items())
    }

    fn get(&self, id: &str) -> Result<Option<Item>, StoreError> {
        Ok(self.inner.lock().unwrap().get(id))
    }

    fn missing(&self, ids: &[&str]) -> Result<Vec<String>, StoreError> {
        Ok(self.inner.lock().unwrap().missing(ids))
    }

    fn put_grouping(&self, grouping: &Grouping) -> Result<(), StoreError> {
        self.update(|s| s.set_grouping(grouping))
    }

    fn grouping(&self) -> Result<Option<Grouping>, StoreError> {
        Ok(self.inner.lock().unwrap().grouping())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.inner.lock().unwrap().len())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.update(|s| {
            s.clear();
            Ok(())
        })
    }
}

/// Encodes a snapshot with its header.
pub(crate) fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, StoreError> {
    let body = rmp_serde::to_vec_named(snapshot)?;
    let mut buf = Vec::with_capacity(HEADER_LEN + body.len());
    buf.extend_from_slice(&MAGIC);
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.extend_from_slice(&body);
    Ok(buf)
}

/// Decodes and checks a snapshot file's contents.
pub(crate) fn decode(data: &[u8]) -> Result<Snapshot, StoreError> {
    if data.len() < HEADER_LEN {
        return Err(StoreError::InvalidFormat(format!(
            "file too short: {} bytes",
            data.len()
        )));
    }
    if data[..4] != MAGIC {
        return Err(StoreError::InvalidFormat("bad magic".to_string()));
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != VERSION {
        return Err(StoreError::InvalidFormat(format!(
            "unsupported version {version}"
        )));
    }
    let snapshot: Snapshot = rmp_serde::from_slice(&data[HEADER_LEN..])?;
    snapshot.check()?;
    Ok(snapshot)
}

fn load(path: &Path) -> Result<Snapshot, StoreError> {
    decode(&fs::read(path)?)
}

fn save(path: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
    let data = encode(snapshot)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(&data)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), bytes = data.len(), "store: saved");
    Ok(())
}
