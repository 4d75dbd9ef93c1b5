//! Window Registry
//!
//! Owns every window record, keyed by the guest window id. Relations between
//! windows (client leader) are stored as ids and resolved through lookups.

use std::collections::HashMap;

use crate::error::WmError;
use crate::wm::client::Client;

#[derive(Debug, Default)]
pub struct WindowRegistry {
    clients: HashMap<u32, Client>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh record for `id`
    pub fn create(&mut self, id: u32) -> Result<&mut Client, WmError> {
        match self.clients.entry(id) {
            std::collections::hash_map::Entry::Occupied(_) => Err(WmError::DuplicateWindow(id)),
            std::collections::hash_map::Entry::Vacant(entry) => Ok(entry.insert(Client::new(id))),
        }
    }

    pub fn get(&self, id: u32) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Client> {
        self.clients.get_mut(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.clients.contains_key(&id)
    }

    /// Remove the record, if any
    pub fn destroy(&mut self, id: u32) -> Option<Client> {
        self.clients.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_lookup() {
        let mut registry = WindowRegistry::new();
        registry.create(0x200001).unwrap().title = "xterm".into();

        assert_eq!(registry.get(0x200001).map(|c| c.title.as_str()), Some("xterm"));
        assert!(registry.get(0x200002).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_create_is_rejected() {
        let mut registry = WindowRegistry::new();
        registry.create(7).unwrap().managed = true;

        assert!(matches!(registry.create(7), Err(WmError::DuplicateWindow(7))));
        // The existing record is untouched
        assert!(registry.get(7).is_some_and(|c| c.managed));
    }

    #[test]
    fn test_destroy_unknown_is_noop() {
        let mut registry = WindowRegistry::new();
        registry.create(1).unwrap();

        assert!(registry.destroy(2).is_none());
        assert!(registry.destroy(1).is_some());
        assert!(registry.is_empty());
    }
}
