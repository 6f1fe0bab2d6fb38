//! Ranking persistence: every finished round is appended to a score-sorted
//! JSON list.
//!
//! Two stores are kept. The shared file under `assets/` is tried first and
//! written on a best-effort basis; the copy in the user's data directory is
//! the durable fallback and is always written. In the browser the only store
//! is the page's local storage. All storage access runs on the IO task pool.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use bevy::{
    prelude::*,
    tasks::{IoTaskPool, Task, block_on, futures_lite::future},
    window::PrimaryWindow,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::SessionEnded;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<RankingView>();

    app.add_systems(
        Update,
        (
            record_session_result.run_if(on_message::<SessionEnded>),
            poll_ranking_tasks,
        )
            .chain(),
    );
}

/// Titles the generated player names are built from.
const PLAYER_TITLES: [&str; 29] = [
    "Bolheiro",
    "Estourador",
    "Mestre das Bolhas",
    "Caçador",
    "Destruidor",
    "Ninja",
    "Campeão",
    "Lenda",
    "Herói",
    "Guerreiro",
    "Mago",
    "Arqueiro",
    "Paladino",
    "Assassino",
    "Druida",
    "Bárbaro",
    "Feiticeiro",
    "Monge",
    "Ranger",
    "Ladino",
    "Cavaleiro",
    "Samurai",
    "Pirata",
    "Viking",
    "Gladiador",
    "Espartano",
    "Centurião",
    "Legionário",
    "Templário",
];

/// A title followed by a number in `1..=999`, e.g. `Ninja42`.
pub fn generate_name(rng: &mut impl Rng) -> String {
    let title = PLAYER_TITLES[rng.random_range(0..PLAYER_TITLES.len())];
    let number = rng.random_range(1..=999);
    format!("{title}{number}")
}

/// One finished round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: String,
    pub score: u32,
    pub level: u32,
    /// Seconds since the unix epoch.
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RankingMetadata>,
}

/// Diagnostic details about the machine a score was set on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingMetadata {
    pub device_type: String,
    pub platform: String,
    pub os: String,
    pub arch: String,
    pub locale: Option<String>,
    pub screen_resolution: Option<String>,
}

impl RankingMetadata {
    pub fn collect(window_size: Option<Vec2>) -> Self {
        let os = std::env::consts::OS;
        let device_type = match os {
            "android" | "ios" => "mobile",
            _ => "desktop",
        };
        let locale = ["LC_ALL", "LANG"]
            .into_iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty());

        Self {
            device_type: device_type.to_string(),
            platform: std::env::consts::FAMILY.to_string(),
            os: os.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            locale,
            screen_resolution: window_size.map(|size| format!("{}x{}", size.x, size.y)),
        }
    }
}

#[cfg(not(target_family = "wasm"))]
fn unix_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

// `SystemTime` panics on wasm32-unknown-unknown; ask the browser instead.
#[cfg(target_family = "wasm")]
fn unix_timestamp() -> u64 {
    (js_sys::Date::now() / 1000.0) as u64
}

// =============================================================================
// STORAGE
// =============================================================================

/// Somewhere a whole ranking list can be read from and written to.
pub trait RankingBackend: Send + Sync {
    fn name(&self) -> &str;
    fn load(&self) -> io::Result<Vec<RankingEntry>>;
    fn save(&self, entries: &[RankingEntry]) -> io::Result<()>;
}

/// A ranking stored as one JSON document on disk.
#[derive(Debug, Clone)]
#[cfg_attr(target_family = "wasm", allow(dead_code))]
pub struct JsonFileBackend {
    name: &'static str,
    path: PathBuf,
}

#[cfg_attr(target_family = "wasm", allow(dead_code))]
impl JsonFileBackend {
    pub fn new(name: &'static str, path: impl Into<PathBuf>) -> Self {
        Self {
            name,
            path: path.into(),
        }
    }

    /// The file shipped next to the game's assets.
    pub fn shared() -> Self {
        Self::new("shared", Path::new("assets").join("ranking.json"))
    }

    /// The copy in the user's data directory.
    pub fn local() -> Option<Self> {
        dirs::data_local_dir()
            .map(|dir| Self::new("local", dir.join("bubble-pop").join("ranking.json")))
    }
}

impl RankingBackend for JsonFileBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn load(&self) -> io::Result<Vec<RankingEntry>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };
        decode_ranking(contents)
    }

    fn save(&self, entries: &[RankingEntry]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)
    }
}

/// Parse a stored ranking document. Nothing stored yet is `NotFound`.
fn decode_ranking(contents: Option<String>) -> io::Result<Vec<RankingEntry>> {
    let Some(contents) = contents else {
        return Err(io::ErrorKind::NotFound.into());
    };
    let entries = serde_json::from_str(&contents)?;
    Ok(entries)
}

/// A ranking kept under one key of the browser's `localStorage`.
#[cfg(target_family = "wasm")]
#[derive(Debug, Clone)]
pub struct LocalStorageBackend {
    key: &'static str,
}

#[cfg(target_family = "wasm")]
impl LocalStorageBackend {
    pub fn new(key: &'static str) -> Self {
        Self { key }
    }

    fn storage() -> io::Result<web_sys::Storage> {
        web_sys::window()
            .and_then(|window| window.local_storage().ok())
            .flatten()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Unsupported, "local storage is unavailable"))
    }
}

#[cfg(target_family = "wasm")]
impl RankingBackend for LocalStorageBackend {
    fn name(&self) -> &str {
        "browser"
    }

    fn load(&self) -> io::Result<Vec<RankingEntry>> {
        let item = Self::storage()?
            .get_item(self.key)
            .map_err(|e| io::Error::other(format!("{e:?}")))?;
        decode_ranking(item)
    }

    fn save(&self, entries: &[RankingEntry]) -> io::Result<()> {
        let json = serde_json::to_string(entries)?;
        Self::storage()?
            .set_item(self.key, &json)
            .map_err(|e| io::Error::other(format!("{e:?}")))
    }
}

/// Backends in load-preference order. The last one is the durable mirror.
pub struct RankingStore {
    backends: Vec<Box<dyn RankingBackend>>,
}

impl RankingStore {
    pub fn new(backends: Vec<Box<dyn RankingBackend>>) -> Self {
        Self { backends }
    }

    /// Shared file first, then the user's data directory.
    #[cfg(not(target_family = "wasm"))]
    pub fn standard() -> Self {
        let mut backends: Vec<Box<dyn RankingBackend>> = vec![Box::new(JsonFileBackend::shared())];
        match JsonFileBackend::local() {
            Some(local) => backends.push(Box::new(local)),
            None => warn!("Could not determine data directory for the ranking"),
        }
        Self::new(backends)
    }

    /// The browser has no file system, only the page's local storage.
    #[cfg(target_family = "wasm")]
    pub fn standard() -> Self {
        Self::new(vec![Box::new(LocalStorageBackend::new("bubble-pop-ranking"))])
    }

    /// The first list any backend can produce, or an empty one.
    pub fn load(&self) -> Vec<RankingEntry> {
        for backend in &self.backends {
            match backend.load() {
                Ok(entries) => {
                    info!("Loaded {} ranking entries from {} store", entries.len(), backend.name());
                    return entries;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("No ranking in {} store", backend.name());
                }
                Err(e) => warn!("Failed to load ranking from {} store: {}", backend.name(), e),
            }
        }
        Vec::new()
    }

    /// Write to every backend. Only the durable mirror's result is reported.
    pub fn save(&self, entries: &[RankingEntry]) -> io::Result<()> {
        let mut result = Err(io::Error::other("no ranking backend configured"));
        for backend in &self.backends {
            result = backend.save(entries);
            match &result {
                Ok(()) => info!("Saved ranking to {} store", backend.name()),
                Err(e) => warn!("Failed to save ranking to {} store: {}", backend.name(), e),
            }
        }
        result
    }

    /// Load, add `entry`, sort by score (highest first) and save.
    pub fn append(&self, entry: RankingEntry) -> Vec<RankingEntry> {
        let mut entries = self.load();
        entries.push(entry);
        sort_ranking(&mut entries);
        if let Err(e) = self.save(&entries) {
            warn!("Ranking was not persisted: {}", e);
        }
        entries
    }
}

/// Highest score first; ties keep their existing order.
pub fn sort_ranking(entries: &mut [RankingEntry]) {
    entries.sort_by(|a, b| b.score.cmp(&a.score));
}

// =============================================================================
// BACKGROUND TASKS
// =============================================================================

/// The latest ranking known to the game, plus any disk work in flight.
///
/// Tasks are held rather than detached so that a load requested while a save
/// is still running waits for that save's result instead of racing it.
#[derive(Resource, Default)]
pub struct RankingView {
    pub entries: Option<Vec<RankingEntry>>,
    task: Option<Task<Vec<RankingEntry>>>,
}

impl RankingView {
    /// Refresh from disk unless a save is about to deliver a fresher list.
    pub fn request_load(&mut self) {
        if self.task.is_some() {
            return;
        }
        self.entries = None;
        self.task = Some(IoTaskPool::get().spawn(async { RankingStore::standard().load() }));
    }

    pub fn request_append(&mut self, entry: RankingEntry) {
        let previous = self.task.take();
        self.entries = None;
        self.task = Some(IoTaskPool::get().spawn(async move {
            // Keep saves ordered behind whatever was already running.
            if let Some(previous) = previous {
                previous.await;
            }
            RankingStore::standard().append(entry)
        }));
    }
}

fn record_session_result(
    mut ended: MessageReader<SessionEnded>,
    mut view: ResMut<RankingView>,
    window: Option<Single<&Window, With<PrimaryWindow>>>,
) {
    let window_size = window.map(|window| window.size());
    let mut rng = rand::rng();

    for result in ended.read() {
        let entry = RankingEntry {
            name: generate_name(&mut rng),
            score: result.score,
            level: result.level,
            timestamp: unix_timestamp(),
            metadata: Some(RankingMetadata::collect(window_size)),
        };
        info!("Recording {} with {} points at level {}", entry.name, entry.score, entry.level);
        view.request_append(entry);
    }
}

fn poll_ranking_tasks(mut view: ResMut<RankingView>) {
    let Some(task) = view.task.as_mut() else {
        return;
    };
    if let Some(entries) = block_on(future::poll_once(task)) {
        view.entries = Some(entries);
        view.task = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    static NEXT_DIR: AtomicU32 = AtomicU32::new(0);

    fn temp_path(label: &str) -> PathBuf {
        let n = NEXT_DIR.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir()
            .join(format!("bubble-pop-test-{}-{}-{}", std::process::id(), label, n))
            .join("ranking.json")
    }

    fn entry(name: &str, score: u32) -> RankingEntry {
        RankingEntry {
            name: name.to_string(),
            score,
            level: 1,
            timestamp: 0,
            metadata: None,
        }
    }

    struct Unreachable;

    impl RankingBackend for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }

        fn load(&self) -> io::Result<Vec<RankingEntry>> {
            Err(io::Error::other("offline"))
        }

        fn save(&self, _: &[RankingEntry]) -> io::Result<()> {
            Err(io::Error::other("offline"))
        }
    }

    #[test]
    fn missing_files_load_as_empty() {
        let store = RankingStore::new(vec![Box::new(JsonFileBackend::new("local", temp_path("missing")))]);
        assert!(store.load().is_empty());
    }

    #[test]
    fn append_keeps_ranking_sorted() {
        let store = RankingStore::new(vec![Box::new(JsonFileBackend::new("local", temp_path("sorted")))]);
        for (name, score) in [("a", 120), ("b", 300), ("c", 50), ("d", 300)] {
            store.append(entry(name, score));
        }

        let loaded = store.load();
        let scores: Vec<u32> = loaded.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![300, 300, 120, 50]);
        // Equal scores keep insertion order
        assert_eq!(loaded[0].name, "b");
        assert_eq!(loaded[1].name, "d");
    }

    #[test]
    fn k_appends_yield_k_entries() {
        let store = RankingStore::new(vec![Box::new(JsonFileBackend::new("local", temp_path("count")))]);
        for score in 0..7 {
            store.append(entry("p", score * 10));
        }
        assert_eq!(store.load().len(), 7);
    }

    #[test]
    fn falls_back_when_shared_store_fails() {
        let local = JsonFileBackend::new("local", temp_path("fallback"));
        let store = RankingStore::new(vec![Box::new(Unreachable), Box::new(local.clone())]);

        let saved = store.append(entry("solo", 42));
        assert_eq!(saved.len(), 1);
        assert_eq!(local.load().unwrap(), saved);
        assert_eq!(store.load(), saved);
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let path = temp_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let store = RankingStore::new(vec![Box::new(JsonFileBackend::new("local", path))]);
        assert!(store.load().is_empty());
    }

    #[test]
    fn stored_documents_decode_or_report_missing() {
        let missing = decode_ranking(None).unwrap_err();
        assert_eq!(missing.kind(), io::ErrorKind::NotFound);

        assert!(decode_ranking(Some("[]".to_string())).unwrap().is_empty());
        assert!(decode_ranking(Some("{ not json".to_string())).is_err());

        let json = serde_json::to_string(&vec![entry("kept", 77)]).unwrap();
        assert_eq!(decode_ranking(Some(json)).unwrap(), vec![entry("kept", 77)]);
    }

    #[test]
    fn metadata_round_trips_through_json() {
        let mut record = entry("meta", 10);
        record.metadata = Some(RankingMetadata::collect(Some(Vec2::new(800.0, 600.0))));
        let json = serde_json::to_string(&record).unwrap();
        let back: RankingEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(
            back.metadata.and_then(|m| m.screen_resolution).as_deref(),
            Some("800x600")
        );
    }

    #[test]
    fn generated_names_use_known_titles() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            let name = generate_name(&mut rng);
            let title = PLAYER_TITLES
                .iter()
                .find(|title| name.starts_with(*title))
                .expect("name should start with a known title");
            let number: u32 = name[title.len()..].parse().unwrap();
            assert!((1..=999).contains(&number));
        }
    }
}
