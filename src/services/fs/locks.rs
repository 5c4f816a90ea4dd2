use crate::models::entry::EntryId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Scope = Option<EntryId>;

/// Per-parent-scope mutual exclusion for check-then-act sequences such as
/// "resolve name, then add".
#[derive(Default)]
pub struct ScopeLocks {
    scopes: Mutex<HashMap<Scope, Arc<AsyncMutex<()>>>>,
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, scope: &Scope) -> Arc<AsyncMutex<()>> {
        let mut scopes = self.scopes.lock().unwrap_or_else(|p| p.into_inner());
        // Drop locks nobody holds or waits on.
        scopes.retain(|_, lock| Arc::strong_count(lock) > 1);
        scopes.entry(scope.clone()).or_default().clone()
    }

    pub async fn lock(&self, scope: Option<&EntryId>) -> OwnedMutexGuard<()> {
        self.handle(&scope.cloned()).lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_scope_is_exclusive() {
        let locks = Arc::new(ScopeLocks::new());
        let scope = EntryId::from("a");
        let guard = locks.lock(Some(&scope)).await;

        let contender = {
            let locks = locks.clone();
            let scope = scope.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(Some(&scope)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn distinct_scopes_do_not_block() {
        let locks = ScopeLocks::new();
        let _root = locks.lock(None).await;
        let _folder = locks.lock(Some(&"a".into())).await;
    }
}
