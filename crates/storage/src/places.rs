use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::{Duration, Instant};
use tracing::debug;

use placehub_common::{StorageError, ValidationError};

use crate::clock::SharedClock;
use crate::entry::PlaceEntry;
use crate::sweeper::Sweep;

struct Shared {
    entries: DashMap<String, PlaceEntry>,
    ttl: Duration,
    clock: SharedClock,
}

/// Registro de places vivos, renovados por heartbeat.
///
/// Handle barato de clonar; todos os clones enxergam o mesmo mapa.
#[derive(Clone)]
pub struct PlaceRegistry {
    shared: Arc<Shared>,
}

impl PlaceRegistry {
    pub fn new(ttl: Duration, clock: SharedClock) -> Self {
        Self {
            shared: Arc::new(Shared {
                entries: DashMap::new(),
                ttl,
                clock,
            }),
        }
    }

    /// Insere ou renova o place `id`. Sem nome, o próprio id é usado.
    ///
    /// Escritas concorrentes no mesmo id ficam com o heartbeat de timestamp
    /// mais recente, não com o que terminou por último.
    pub fn upsert(&self, id: &str, display_name: Option<&str>) -> Result<(), ValidationError> {
        if id.is_empty() {
            return Err(ValidationError::MissingPlaceId);
        }
        let name = display_name.unwrap_or(id).to_string();
        let now = self.shared.clock.now();

        match self.shared.entries.entry(id.to_string()) {
            Entry::Occupied(mut occupied) => {
                if now >= occupied.get().last_seen {
                    *occupied.get_mut() = PlaceEntry::new(name, now);
                }
            }
            Entry::Vacant(vacant) => {
                debug!(place_id = id, "novo place registrado");
                vacant.insert(PlaceEntry::new(name, now));
            }
        }
        Ok(())
    }

    /// Places vivos (id -> nome). Faz uma passada de eviction antes de ler.
    pub fn snapshot_visible(&self) -> BTreeMap<String, String> {
        let now = self.shared.clock.now();
        self.evict_stale_at(now);

        self.shared
            .entries
            .iter()
            .filter(|e| !e.value().is_stale(now, self.shared.ttl))
            .map(|e| (e.key().clone(), e.value().display_name.clone()))
            .collect()
    }

    /// Remove todo place sem heartbeat há mais de `ttl`.
    pub fn evict_stale(&self) -> usize {
        self.evict_stale_at(self.shared.clock.now())
    }

    fn evict_stale_at(&self, now: Instant) -> usize {
        let ttl = self.shared.ttl;
        let mut removed = 0;
        self.shared.entries.retain(|id, entry| {
            let stale = entry.is_stale(now, ttl);
            if stale {
                removed += 1;
                debug!(place_id = %id, "place expirado removido");
            }
            !stale
        });
        removed
    }

    /// Entradas no mapa, incluindo as que ainda não foram varridas.
    pub fn len(&self) -> usize {
        self.shared.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.entries.is_empty()
    }
}

impl Sweep for PlaceRegistry {
    fn name(&self) -> &'static str {
        "places"
    }

    fn sweep(&self) -> Result<usize, StorageError> {
        Ok(self.evict_stale())
    }
}
