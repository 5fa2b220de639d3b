//! Progression state store
//!
//! Single owner of the user profile, the active learning path and the
//! bookmark list. Every mutation is synchronous and is written through to
//! storage before it returns. Invalid requests (no active path, bad index)
//! are logged and ignored.

pub mod storage;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::types::{LearningPath, ModuleContent, ModuleStatus, ResourceItem, UserProfile};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};

pub const PROFILE_KEY: &str = "cognosys_user";
pub const PATH_KEY: &str = "cognosys_path";
pub const BOOKMARKS_KEY: &str = "cognosys_bookmarks";

/// XP awarded the first time a module is completed
pub const COMPLETION_BONUS_XP: u64 = 100;

/// Outcome of [`ProgressionStore::update_module_status`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub previous: ModuleStatus,
    pub current: ModuleStatus,
    /// XP awarded by this call (0 on repeat completion)
    pub xp_awarded: u64,
    /// Index of a module that went from locked to active
    pub unlocked: Option<usize>,
}

pub struct ProgressionStore {
    storage: Box<dyn Storage>,
    profile: UserProfile,
    path: Option<LearningPath>,
    bookmarks: Vec<ResourceItem>,
    completion_bonus: u64,
    malformed: Vec<&'static str>,
}

impl ProgressionStore {
    /// Rehydrate every slot from storage. Missing or malformed slots fall
    /// back to defaults: a default profile, no path, no bookmarks.
    pub fn init(storage: Box<dyn Storage>) -> Self {
        let mut malformed = Vec::new();
        let profile = load_slot(storage.as_ref(), PROFILE_KEY, &mut malformed).unwrap_or_default();
        let path = load_slot(storage.as_ref(), PATH_KEY, &mut malformed);
        let bookmarks = load_slot(storage.as_ref(), BOOKMARKS_KEY, &mut malformed).unwrap_or_default();

        let mut store = Self {
            storage,
            profile,
            path,
            bookmarks,
            completion_bonus: COMPLETION_BONUS_XP,
            malformed,
        };

        // Profile is always present after first run
        if store.storage.get(PROFILE_KEY).ok().flatten().is_none() {
            write_slot(store.storage.as_mut(), PROFILE_KEY, &store.profile);
        }
        store
    }

    pub fn with_completion_bonus(mut self, xp: u64) -> Self {
        self.completion_bonus = xp;
        self
    }

    /// Write every slot back to storage
    pub fn teardown(&mut self) -> Result<(), StorageError> {
        self.storage.set(PROFILE_KEY, &serde_json::to_string(&self.profile)?)?;
        match &self.path {
            Some(path) => self.storage.set(PATH_KEY, &serde_json::to_string(path)?)?,
            None => self.storage.remove(PATH_KEY)?,
        }
        self.storage.set(BOOKMARKS_KEY, &serde_json::to_string(&self.bookmarks)?)?;
        info!("Progress flushed");
        Ok(())
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn active_path(&self) -> Option<&LearningPath> {
        self.path.as_ref()
    }

    pub fn bookmarks(&self) -> &[ResourceItem] {
        &self.bookmarks
    }

    /// Slots that held data which could not be deserialized at startup
    pub fn malformed_slots(&self) -> &[&'static str] {
        &self.malformed
    }

    pub fn add_xp(&mut self, amount: u64) {
        self.profile.xp = self.profile.xp.saturating_add(amount);
        debug!("Awarded {} XP (total {})", amount, self.profile.xp);
        write_slot(self.storage.as_mut(), PROFILE_KEY, &self.profile);
    }

    /// Replace the active path wholesale. `None` removes the stored slot.
    pub fn set_path(&mut self, path: Option<LearningPath>) {
        self.path = path;
        self.persist_path();
    }

    /// Install a freshly generated path with module 0 active and the rest locked
    pub fn create_path(&mut self, mut path: LearningPath) {
        path.normalize_statuses();
        info!("Created learning path '{}' with {} modules", path.topic, path.modules.len());
        self.set_path(Some(path));
    }

    /// Move module `index` forward to `status`.
    ///
    /// Completing a module for the first time awards the completion bonus and
    /// unlocks the next module if it is still locked. Backward moves, a
    /// missing path and out-of-range indices are ignored.
    pub fn update_module_status(&mut self, index: usize, status: ModuleStatus) -> Option<StatusChange> {
        let Some(path) = self.path.as_mut() else {
            warn!("update_module_status({}) ignored: no active path", index);
            return None;
        };
        let len = path.modules.len();
        if index >= len {
            warn!("update_module_status({}) ignored: path has {} modules", index, len);
            return None;
        }
        if status == ModuleStatus::Locked {
            warn!("update_module_status({}) ignored: modules cannot be re-locked", index);
            return None;
        }

        let previous = path.modules[index].effective_status();
        if previous != status && !previous.can_advance_to(status) {
            warn!("update_module_status({}) ignored: {} -> {} is backward", index, previous, status);
            return None;
        }
        path.modules[index].status = Some(status);

        let mut unlocked = None;
        if status == ModuleStatus::Completed && index + 1 < len {
            let next = &mut path.modules[index + 1];
            if next.is_locked() {
                next.status = Some(ModuleStatus::Active);
                unlocked = Some(index + 1);
            }
        }
        self.persist_path();

        let xp_awarded = if status == ModuleStatus::Completed && previous != ModuleStatus::Completed {
            self.completion_bonus
        } else {
            0
        };
        if xp_awarded > 0 {
            self.add_xp(xp_awarded);
        }

        Some(StatusChange {
            previous,
            current: status,
            xp_awarded,
            unlocked,
        })
    }

    /// Attach generated content to module `index`, replacing any previous content
    pub fn save_module_content(&mut self, index: usize, content: ModuleContent) -> bool {
        let Some(path) = self.path.as_mut() else {
            warn!("save_module_content({}) ignored: no active path", index);
            return false;
        };
        let len = path.modules.len();
        let Some(module) = path.modules.get_mut(index) else {
            warn!("save_module_content({}) ignored: path has {} modules", index, len);
            return false;
        };
        module.content = Some(content);
        self.persist_path();
        true
    }

    /// Add the resource if no bookmark has its id, otherwise remove it.
    /// Returns whether the resource is bookmarked afterwards.
    pub fn toggle_bookmark(&mut self, resource: &ResourceItem) -> bool {
        let bookmarked = if self.is_bookmarked(&resource.id) {
            self.bookmarks.retain(|r| r.id != resource.id);
            false
        } else {
            self.bookmarks.push(resource.clone());
            true
        };
        write_slot(self.storage.as_mut(), BOOKMARKS_KEY, &self.bookmarks);
        bookmarked
    }

    pub fn is_bookmarked(&self, id: &str) -> bool {
        self.bookmarks.iter().any(|r| r.id == id)
    }

    fn persist_path(&mut self) {
        match &self.path {
            Some(path) => write_slot(self.storage.as_mut(), PATH_KEY, path),
            None => {
                if let Err(e) = self.storage.remove(PATH_KEY) {
                    warn!("Failed to remove {}: {}", PATH_KEY, e);
                }
            }
        }
    }
}

/// Storage failures are logged; in-memory state stays authoritative
fn write_slot<T: Serialize>(storage: &mut dyn Storage, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(StorageError::from)
        .and_then(|text| storage.set(key, &text));
    if let Err(e) = result {
        warn!("Failed to persist {}: {}", key, e);
    }
}

fn load_slot<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &'static str,
    malformed: &mut Vec<&'static str>,
) -> Option<T> {
    let text = match storage.get(key) {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(e) => {
            warn!("Failed to read {}: {}", key, e);
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Stored {} is malformed, using defaults: {}", key, e);
            malformed.push(key);
            None
        }
    }
}
