use crate::core::{KeyValueStore, MemoryStore, SettingsError};
use web_sys as web;

/// `window.localStorage` behind the settings store interface.
pub struct LocalStore {
    storage: web::Storage,
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| SettingsError::Storage {
                key: key.to_string(),
                reason: format!("{:?}", e),
            })
    }
}

/// Local storage when the page may use it, else an in-memory map for the session.
pub fn open_store(window: &web::Window) -> Box<dyn KeyValueStore> {
    match window.local_storage() {
        Ok(Some(storage)) => Box::new(LocalStore { storage }),
        _ => {
            log::info!("[settings] localStorage unavailable, settings last for this session only");
            Box::new(MemoryStore::default())
        }
    }
}
