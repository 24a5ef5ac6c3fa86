//! Session-id registry.
//!
//! Maps a process-lifetime [`SessionId`] to the `(deck path, local id)` pair
//! it stands in for. Implemented as an arena: a growable slot table indexed
//! by session id plus a reverse map. The two sides are always mutated within
//! one operation, so the mapping stays a bijection while both directions
//! exist. Ids are allocated monotonically and never reused.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::model::SessionId;

#[derive(Debug, Default)]
pub(crate) struct HandleRegistry {
    /// `slots[id - 1]` holds the address for session id `id`, or `None` once
    /// released.
    slots: Vec<Option<(PathBuf, u64)>>,
    reverse: HashMap<(PathBuf, u64), SessionId>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session id for a card, allocating one on first reference.
    pub fn handle_for(&mut self, deck: &Path, local_id: u64) -> SessionId {
        let key = (deck.to_path_buf(), local_id);
        if let Some(&sid) = self.reverse.get(&key) {
            return sid;
        }
        self.slots.push(Some(key.clone()));
        let sid = SessionId(self.slots.len() as u64);
        self.reverse.insert(key, sid);
        sid
    }

    /// Address for a session id, `None` once released or never allocated.
    pub fn resolve(&self, sid: SessionId) -> Option<(&Path, u64)> {
        let idx = (sid.0 as usize).checked_sub(1)?;
        self.slots
            .get(idx)?
            .as_ref()
            .map(|(deck, local_id)| (deck.as_path(), *local_id))
    }

    /// Remove both directions of one mapping.
    pub fn release(&mut self, sid: SessionId) {
        let Some(idx) = (sid.0 as usize).checked_sub(1) else {
            return;
        };
        if let Some(slot) = self.slots.get_mut(idx) {
            if let Some(key) = slot.take() {
                self.reverse.remove(&key);
            }
        }
    }

    /// Remove every mapping that points into `deck`. Returns the released ids.
    pub fn release_deck(&mut self, deck: &Path) -> Vec<SessionId> {
        let mut released = Vec::new();
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.as_ref().is_some_and(|(p, _)| p == deck) {
                if let Some(key) = slot.take() {
                    self.reverse.remove(&key);
                    released.push(SessionId(idx as u64 + 1));
                }
            }
        }
        released
    }
}
