//! Locks por recurso
//!
//! Cada vehículo, alquiler o cuenta tiene su propio mutex async. Las
//! operaciones del núcleo toman todos los locks que necesitan antes de la
//! secuencia verificar-y-actuar, siempre en orden ascendente de id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct KeyedLocks {
    slots: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

/// Guardas retenidas mientras dura la operación
pub struct LockSet {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tomar los locks de todos los ids dados (ordenados y sin duplicados)
    pub async fn acquire(&self, ids: &[Uuid]) -> LockSet {
        let mut keys = ids.to_vec();
        keys.sort_unstable();
        keys.dedup();

        let mutexes: Vec<Arc<AsyncMutex<()>>> = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            // Los slots sin nadie esperando ni reteniendo se pueden soltar
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            keys.iter()
                .map(|key| slots.entry(*key).or_default().clone())
                .collect()
        };

        let mut guards = Vec::with_capacity(mutexes.len());
        for mutex in mutexes {
            guards.push(mutex.lock_owned().await);
        }

        LockSet { _guards: guards }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
