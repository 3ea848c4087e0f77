// ABOUTME: Preference store holding the size preset and focus-retention flag
// ABOUTME: Persists on every set and notifies registered observers; dropping a Subscription unregisters it

use crate::config::{Preferences, PreferencesFile};
use crate::preset::SizePreset;
use anyhow::Result;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::{Rc, Weak};

/// Where preference records are read from and written to.
pub trait PreferenceBackend {
    /// `Ok(None)` means nothing has been stored yet.
    fn load(&self) -> Result<Option<PreferencesFile>>;

    fn save(&self, record: &PreferencesFile) -> Result<()>;
}

pub struct TomlFileBackend {
    path: PathBuf,
}

impl TomlFileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn at_default_location() -> Result<Self> {
        Ok(Self::new(PreferencesFile::default_path()?))
    }
}

impl PreferenceBackend for TomlFileBackend {
    fn load(&self) -> Result<Option<PreferencesFile>> {
        if !self.path.exists() {
            return Ok(None);
        }
        PreferencesFile::load_from_file(&self.path).map(Some)
    }

    fn save(&self, record: &PreferencesFile) -> Result<()> {
        record.save(&self.path)
    }
}

/// Keeps records in memory. Clones share the same record.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemoryBackend {
    record: Rc<RefCell<Option<PreferencesFile>>>,
    fail_saves: Rc<RefCell<bool>>,
}

#[cfg(test)]
impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: PreferencesFile) -> Self {
        let backend = Self::default();
        *backend.record.borrow_mut() = Some(record);
        backend
    }

    pub fn stored(&self) -> Option<PreferencesFile> {
        self.record.borrow().clone()
    }

    pub fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.borrow_mut() = fail;
    }
}

#[cfg(test)]
impl PreferenceBackend for MemoryBackend {
    fn load(&self) -> Result<Option<PreferencesFile>> {
        Ok(self.record.borrow().clone())
    }

    fn save(&self, record: &PreferencesFile) -> Result<()> {
        if *self.fail_saves.borrow() {
            anyhow::bail!("memory backend refused the write");
        }
        *self.record.borrow_mut() = Some(record.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceChange {
    SizePreset(SizePreset),
    RetainFocus(bool),
}

type Observer = Rc<dyn Fn(&PreferenceChange)>;

#[derive(Default)]
struct ObserverList {
    next_id: u64,
    entries: Vec<(u64, Observer)>,
}

/// Handle for a registered observer. The observer is removed when this is dropped.
#[must_use = "dropping a Subscription unregisters the observer immediately"]
pub struct Subscription {
    id: u64,
    observers: Weak<RefCell<ObserverList>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            observers.borrow_mut().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

pub struct PreferenceStore {
    current: Preferences,
    backend: Box<dyn PreferenceBackend>,
    observers: Rc<RefCell<ObserverList>>,
}

impl PreferenceStore {
    /// Loads once from `backend`. Anything unreadable resolves to defaults.
    pub fn load(backend: Box<dyn PreferenceBackend>) -> Self {
        let current = match backend.load() {
            Ok(Some(record)) => record.resolve(),
            Ok(None) => {
                tracing::info!("No stored preferences, using defaults");
                Preferences::default()
            }
            Err(e) => {
                tracing::warn!("Failed to load preferences: {e:#}. Using defaults.");
                Preferences::default()
            }
        };

        tracing::debug!(
            size_preset = %current.size_preset,
            retain_focus = current.retain_focus,
            "Preferences loaded"
        );

        Self {
            current,
            backend,
            observers: Rc::new(RefCell::new(ObserverList::default())),
        }
    }

    pub fn preferences(&self) -> Preferences {
        self.current
    }

    pub fn size_preset(&self) -> SizePreset {
        self.current.size_preset
    }

    pub fn retain_focus(&self) -> bool {
        self.current.retain_focus
    }

    pub fn set_size_preset(&mut self, preset: SizePreset) {
        self.current.size_preset = preset;
        self.commit(PreferenceChange::SizePreset(preset));
    }

    pub fn set_retain_focus(&mut self, retain: bool) {
        self.current.retain_focus = retain;
        self.commit(PreferenceChange::RetainFocus(retain));
    }

    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&PreferenceChange) + 'static,
    {
        let mut list = self.observers.borrow_mut();
        let id = list.next_id;
        list.next_id += 1;
        list.entries.push((id, Rc::new(observer)));

        Subscription {
            id,
            observers: Rc::downgrade(&self.observers),
        }
    }

    #[cfg(test)]
    pub fn observer_count(&self) -> usize {
        self.observers.borrow().entries.len()
    }

    fn commit(&self, change: PreferenceChange) {
        if let Err(e) = self.backend.save(&PreferencesFile::from(self.current)) {
            tracing::warn!("Failed to persist preferences: {e:#}");
        }

        tracing::info!(?change, "Preference changed");

        // Observers may subscribe or drop subscriptions while being notified
        let observers: Vec<Observer> = self
            .observers
            .borrow()
            .entries
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer(&change);
        }
    }
}
