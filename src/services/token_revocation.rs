//! Revocación de tokens
//!
//! Un token cerrado con sign-out queda en la lista hasta su expiración; las
//! entradas vencidas se limpian en cada revocación.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[async_trait]
pub trait TokenRevocation: Send + Sync {
    async fn revoke(&self, token_id: Uuid, expires_at: DateTime<Utc>);

    async fn is_revoked(&self, token_id: Uuid) -> bool;
}

#[derive(Debug, Default)]
pub struct InMemoryRevocation {
    revoked: RwLock<HashMap<Uuid, DateTime<Utc>>>,
}

impl InMemoryRevocation {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRevocation for InMemoryRevocation {
    async fn revoke(&self, token_id: Uuid, expires_at: DateTime<Utc>) {
        let now = Utc::now();
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| *exp > now);
        revoked.insert(token_id, expires_at);
        debug!("🔒 Token {} revocado ({} en lista)", token_id, revoked.len());
    }

    async fn is_revoked(&self, token_id: Uuid) -> bool {
        self.revoked.read().await.contains_key(&token_id)
    }
}
