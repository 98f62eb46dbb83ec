/// Save record codec and save stores.
///
/// ## Wire format (JSON object)
///
///   v1: `{ v: 1, px, py, mem: [id], memData: [{id, title, text}], clockMin }`
///   v2: v1 + `zone`
///
/// Decoding is tolerant: any shape it does not understand means "no save",
/// individual bad fields fall back to their defaults, and a v1 record (or
/// a v2 record without a usable zone) lands in the hub.
///
/// ## Stores
///
/// `FileStore` writes one JSON file. Directory search order:
///   1. executable directory (if writable)
///   2. `~/.local/share/neonwalk`
///   3. current directory
///
/// Store failures are logged and reported as `false`, never raised.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::memory::Memory;

pub const SAVE_VERSION: u32 = 2;

const APP_DIR: &str = "neonwalk";

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed save data: {0}")]
    Json(#[from] serde_json::Error),
}

// ══════════════════════════════════════════════════════════════
// Record
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SaveRecord {
    pub v: u32,
    pub zone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub px: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub py: Option<f32>,
    pub mem: Vec<String>,
    #[serde(rename = "memData")]
    pub mem_data: Vec<Memory>,
    #[serde(rename = "clockMin", skip_serializing_if = "Option::is_none")]
    pub clock_min: Option<f32>,
}

impl SaveRecord {
    pub fn position(&self) -> Option<(f32, f32)> {
        Some((self.px?, self.py?))
    }
}

pub fn serialize(record: &SaveRecord) -> Result<Value, SaveError> {
    Ok(serde_json::to_value(record)?)
}

/// Decode a stored value. `hub` is the zone used when the record does not
/// name one. `None` means "no save".
pub fn deserialize(raw: &Value, hub: &str) -> Option<SaveRecord> {
    let obj = raw.as_object()?;
    let v = obj.get("v")?.as_u64()?;
    if v != 1 && v != 2 {
        debug!(v, "unsupported save version");
        return None;
    }

    let zone = match v {
        2 => obj.get("zone").and_then(Value::as_str).unwrap_or(hub),
        _ => hub,
    };

    let mem = obj
        .get("mem")
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    let mem_data = obj
        .get("memData")
        .and_then(Value::as_array)
        .map(|records| records.iter().filter_map(memory_from).collect())
        .unwrap_or_default();

    Some(SaveRecord {
        v: v as u32,
        zone: zone.to_string(),
        px: finite(obj.get("px")),
        py: finite(obj.get("py")),
        mem,
        mem_data,
        clock_min: finite(obj.get("clockMin")),
    })
}

fn finite(v: Option<&Value>) -> Option<f32> {
    let f = v?.as_f64()? as f32;
    f.is_finite().then_some(f)
}

/// A saved memory needs at least an id and a title.
fn memory_from(v: &Value) -> Option<Memory> {
    let id = v.get("id")?.as_str()?;
    let title = v.get("title")?.as_str()?;
    let text = v.get("text").and_then(Value::as_str).unwrap_or("");
    Some(Memory::new(id, title, text))
}

// ══════════════════════════════════════════════════════════════
// Stores
// ══════════════════════════════════════════════════════════════

/// Persistence boundary. Best effort: failures return `false` / `None`.
pub trait SaveStore {
    fn save(&mut self, value: &Value) -> bool;
    fn load(&self) -> Option<Value>;
    fn clear(&mut self) -> bool;
}

fn save_dir() -> PathBuf {
    // 1. Try exe directory (works for local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // Check if writable (system installs won't be)
            let marker = parent.join(".write_test_neonwalk");
            if std::fs::write(&marker, "").is_ok() {
                let _ = std::fs::remove_file(&marker);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share").join(APP_DIR);
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// `file_name` inside the first usable save directory. An absolute
    /// path is used as is.
    pub fn new(file_name: &str) -> Self {
        let store = if Path::new(file_name).is_absolute() {
            FileStore::at(file_name)
        } else {
            FileStore::at(save_dir().join(file_name))
        };
        info!(path = %store.path.display(), "save file");
        store
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, value: &Value) -> Result<(), SaveError> {
        let text = serde_json::to_string(value)?;
        std::fs::write(&self.path, text).map_err(|source| SaveError::Io { path: self.path.clone(), source })
    }

    fn read(&self) -> Result<Option<Value>, SaveError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SaveError::Io { path: self.path.clone(), source }),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }
}

impl SaveStore for FileStore {
    fn save(&mut self, value: &Value) -> bool {
        match self.write(value) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "save failed");
                false
            }
        }
    }

    fn load(&self) -> Option<Value> {
        match self.read() {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "load failed, starting fresh");
                None
            }
        }
    }

    fn clear(&mut self) -> bool {
        match std::fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "clear save failed");
                false
            }
        }
    }
}

/// In-process store.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    value: Option<Value>,
    /// When set, every write fails.
    pub read_only: bool,
    pub writes: usize,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_value(value: Value) -> Self {
        MemoryStore { value: Some(value), ..MemoryStore::default() }
    }
}

#[cfg(test)]
impl SaveStore for MemoryStore {
    fn save(&mut self, value: &Value) -> bool {
        if self.read_only {
            return false;
        }
        self.value = Some(value.clone());
        self.writes += 1;
        true
    }

    fn load(&self) -> Option<Value> {
        self.value.clone()
    }

    fn clear(&mut self) -> bool {
        self.value = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> SaveRecord {
        SaveRecord {
            v: SAVE_VERSION,
            zone: "canal".to_string(),
            px: Some(120.5),
            py: Some(300.0),
            mem: vec!["m_sticker".to_string()],
            mem_data: vec![Memory::new("m_sticker", "sticker", "stay soft. stay sharp.")],
            clock_min: Some(1275.25),
        }
    }

    #[test]
    fn record_round_trips() {
        let r = record();
        let v = serialize(&r).unwrap();
        assert_eq!(v["memData"][0]["title"], "sticker");
        assert_eq!(v["clockMin"], 1275.25);
        assert_eq!(deserialize(&v, "alley"), Some(r));
    }

    #[test]
    fn legacy_v1_lands_in_hub() {
        let raw = json!({
            "v": 1,
            "px": 168.0,
            "py": 696.0,
            "mem": ["m_sticker"],
            "memData": [{"id": "m_sticker", "title": "sticker", "text": "stay soft. stay sharp."}],
            "clockMin": 1270,
            "zone": "canal"
        });
        let r = deserialize(&raw, "alley").unwrap();
        assert_eq!(r.zone, "alley");
        assert_eq!(r.position(), Some((168.0, 696.0)));
        assert_eq!(r.mem, vec!["m_sticker".to_string()]);
        assert_eq!(r.clock_min, Some(1270.0));
    }

    #[test]
    fn v2_without_zone_defaults_to_hub() {
        let r = deserialize(&json!({"v": 2, "px": 1.0, "py": 2.0}), "alley").unwrap();
        assert_eq!(r.zone, "alley");
        assert!(r.mem.is_empty());
        assert_eq!(r.clock_min, None);
    }

    #[test]
    fn unknown_shapes_are_no_save() {
        for raw in [
            json!(null),
            json!("save"),
            json!([1, 2]),
            json!({}),
            json!({"v": "2"}),
            json!({"v": 3, "px": 1.0}),
            json!({"v": 0}),
        ] {
            assert_eq!(deserialize(&raw, "alley"), None, "{raw}");
        }
    }

    #[test]
    fn bad_fields_keep_defaults() {
        let raw = json!({
            "v": 2,
            "zone": 7,
            "px": "left",
            "py": 10.0,
            "mem": ["a", 5, null, "b"],
            "memData": [
                {"id": "a", "title": "first"},
                {"id": "b"},
                {"title": "orphan"},
                "junk"
            ],
            "clockMin": {"h": 3}
        });
        let r = deserialize(&raw, "alley").unwrap();
        assert_eq!(r.zone, "alley");
        assert_eq!(r.px, None);
        assert_eq!(r.position(), None);
        assert_eq!(r.mem, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(r.mem_data, vec![Memory::new("a", "first", "")]);
        assert_eq!(r.clock_min, None);
    }

    #[test]
    fn file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::at(dir.path().join("save.json"));
        assert_eq!(store.load(), None);

        let v = serialize(&record()).unwrap();
        assert!(store.save(&v));
        assert_eq!(store.load(), Some(v));

        assert!(store.clear());
        assert_eq!(store.load(), None);
        // clearing twice is fine
        assert!(store.clear());
    }

    #[test]
    fn file_store_garbage_is_no_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileStore::at(&path);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn file_store_write_failure_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::at(dir.path().join("missing").join("save.json"));
        assert!(!store.save(&json!({"v": 2})));
    }

    #[test]
    fn memory_store_read_only() {
        let mut s = MemoryStore { read_only: true, ..MemoryStore::default() };
        assert!(!s.save(&json!({"v": 2})));
        assert_eq!(s.load(), None);
        assert_eq!(s.writes, 0);
    }
}
