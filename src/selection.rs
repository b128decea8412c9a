//! Per-facility pinned sensor selections.
//!
//! [`SelectionState`] is the plain value: an ordered, bounded id list per
//! facility plus the active facility tab. All transitions are methods on it.
//!
//! [`SelectionStore`] is the process-wide owner. It is constructed once at
//! startup, applies transitions, persists the whole state through a
//! [`SelectionStorage`] after every change, and publishes the new state to
//! subscribers. Persistence problems never surface as errors: an unreadable
//! file loads as empty state and a failed save is logged.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

// ---

/// Upper bound on pinned sensors per facility.
pub const MAX_PINNED: usize = 12;

/// Result of a toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// Facility already holds [`MAX_PINNED`] ids. Nothing changed.
    Rejected,
}

/// Serialized form is the persisted layout. Missing keys mean "nothing
/// chosen" and "no active facility".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionState {
    #[serde(default)]
    pub selections: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub active_facility: Option<String>,
}

impl SelectionState {
    // ---
    /// Ordered ids chosen for `facility_id`; empty if none.
    pub fn selections_for(&self, facility_id: &str) -> &[String] {
        self.selections
            .get(facility_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_at_capacity(&self, facility_id: &str) -> bool {
        self.selections_for(facility_id).len() >= MAX_PINNED
    }

    /// Remove `sensor_id` if pinned, otherwise pin it when below capacity.
    pub fn toggle(&mut self, facility_id: &str, sensor_id: &str) -> ToggleOutcome {
        // ---
        if let Some(ids) = self.selections.get_mut(facility_id) {
            if let Some(pos) = ids.iter().position(|id| id == sensor_id) {
                ids.remove(pos);
                if ids.is_empty() {
                    self.selections.remove(facility_id);
                }
                return ToggleOutcome::Removed;
            }
        }

        if self.is_at_capacity(facility_id) {
            return ToggleOutcome::Rejected;
        }

        self.selections
            .entry(facility_id.to_string())
            .or_default()
            .push(sensor_id.to_string());
        ToggleOutcome::Added
    }

    /// Replace the facility's selection. Duplicates are dropped (first
    /// occurrence wins) and the list is cut to the first [`MAX_PINNED`].
    pub fn set_selection<I, S>(&mut self, facility_id: &str, sensor_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // ---
        let ids = bounded_unique(sensor_ids.into_iter().map(Into::into));
        if ids.is_empty() {
            self.selections.remove(facility_id);
        } else {
            self.selections.insert(facility_id.to_string(), ids);
        }
    }

    pub fn clear(&mut self, facility_id: &str) {
        self.selections.remove(facility_id);
    }

    pub fn set_active_facility(&mut self, facility_id: &str) {
        self.active_facility = Some(facility_id.to_string());
    }

    /// Re-establish the per-facility invariants on externally sourced state.
    fn normalized(self) -> Self {
        // ---
        let selections = self
            .selections
            .into_iter()
            .map(|(facility, ids)| (facility, bounded_unique(ids)))
            .filter(|(_, ids)| !ids.is_empty())
            .collect();

        Self {
            selections,
            active_facility: self.active_facility.filter(|f| !f.is_empty()),
        }
    }
}

fn bounded_unique(ids: impl IntoIterator<Item = String>) -> Vec<String> {
    // ---
    let mut out: Vec<String> = Vec::new();
    for id in ids {
        if out.len() == MAX_PINNED {
            break;
        }
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

// ---

/// Backing storage for the serialized selection state.
pub trait SelectionStorage: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<SelectionState>>;
    fn save(&self, state: &SelectionState) -> Result<()>;
}

/// JSON file on local disk, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SelectionStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<SelectionState>> {
        // ---
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let state: SelectionState = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(Some(state))
    }

    fn save(&self, state: &SelectionState) -> Result<()> {
        // ---
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(state)?)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

/// Keeps the serialized form in memory. Useful for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    content: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from raw serialized content, which need not be valid.
    pub fn with_contents(content: impl Into<String>) -> Self {
        Self {
            content: Mutex::new(Some(content.into())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.content
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SelectionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<SelectionState>> {
        // ---
        match self.contents() {
            None => Ok(None),
            Some(content) => Ok(Some(serde_json::from_str(&content)?)),
        }
    }

    fn save(&self, state: &SelectionState) -> Result<()> {
        // ---
        let content = serde_json::to_string(state)?;
        *self.content.lock().unwrap_or_else(PoisonError::into_inner) = Some(content);
        Ok(())
    }
}

// ---

/// Shared owner of the selection state.
pub struct SelectionStore {
    state: RwLock<SelectionState>,
    storage: Box<dyn SelectionStorage>,
    /// Held for the duration of a save, never together with `state`'s write lock.
    save_lock: Mutex<()>,
    tx: watch::Sender<SelectionState>,
}

impl SelectionStore {
    // ---
    /// Load persisted state from `storage`, falling back to empty state.
    pub fn open(storage: impl SelectionStorage + 'static) -> Self {
        // ---
        let state = match storage.load() {
            Ok(Some(state)) => {
                let state = state.normalized();
                info!(
                    "Loaded selections for {} facilities (active: {:?})",
                    state.selections.len(),
                    state.active_facility
                );
                state
            }
            Ok(None) => {
                debug!("No persisted selections, starting empty");
                SelectionState::default()
            }
            Err(e) => {
                warn!("Discarding unreadable selection state: {:#}", e);
                SelectionState::default()
            }
        };

        let (tx, _rx) = watch::channel(state.clone());
        Self {
            state: RwLock::new(state),
            storage: Box::new(storage),
            save_lock: Mutex::new(()),
            tx,
        }
    }

    pub fn in_memory() -> Self {
        Self::open(MemoryStorage::new())
    }

    pub fn snapshot(&self) -> SelectionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn selections_for(&self, facility_id: &str) -> Vec<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .selections_for(facility_id)
            .to_vec()
    }

    pub fn active_facility(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .active_facility
            .clone()
    }

    /// Receiver of every state published after a change.
    pub fn subscribe(&self) -> watch::Receiver<SelectionState> {
        self.tx.subscribe()
    }

    pub fn toggle(&self, facility_id: &str, sensor_id: &str) -> (ToggleOutcome, SelectionState) {
        // ---
        let (outcome, state) = self.mutate(|s| s.toggle(facility_id, sensor_id));
        match outcome {
            ToggleOutcome::Rejected => info!(
                "Rejected pin of {} on {}: already at {} sensors",
                sensor_id, facility_id, MAX_PINNED
            ),
            _ => debug!("Toggled {} on {}: {:?}", sensor_id, facility_id, outcome),
        }
        (outcome, state)
    }

    pub fn set_selection<I, S>(&self, facility_id: &str, sensor_ids: I) -> SelectionState
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // ---
        let ((), state) = self.mutate(|s| s.set_selection(facility_id, sensor_ids));
        debug!(
            "Set {} selections on {}",
            state.selections_for(facility_id).len(),
            facility_id
        );
        state
    }

    pub fn clear(&self, facility_id: &str) -> SelectionState {
        debug!("Clearing selections on {}", facility_id);
        self.mutate(|s| s.clear(facility_id)).1
    }

    pub fn set_active_facility(&self, facility_id: &str) -> SelectionState {
        debug!("Active facility is now {}", facility_id);
        self.mutate(|s| s.set_active_facility(facility_id)).1
    }

    /// Apply `op`; when the state changed, publish and persist it.
    fn mutate<R>(&self, op: impl FnOnce(&mut SelectionState) -> R) -> (R, SelectionState) {
        // ---
        let (result, after, changed) = {
            let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let before = guard.clone();
            let result = op(&mut *guard);
            let after = guard.clone();
            let changed = after != before;
            if changed {
                self.tx.send_replace(after.clone());
            }
            (result, after, changed)
        };

        if changed {
            self.persist_latest();
        }
        (result, after)
    }

    /// Saves run one at a time and each writes the state current when it
    /// starts, so the last save to finish holds the newest state.
    fn persist_latest(&self) {
        // ---
        let _saving = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let latest = self.snapshot();
        if let Err(e) = self.storage.save(&latest) {
            warn!("Failed to persist selection state: {:#}", e);
        }
    }
}
