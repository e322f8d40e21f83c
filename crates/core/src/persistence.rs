// Resumable run pointers
//
// One run id per conversation, kept in an injected KeyValueStore so the
// controller can resume a run after a restart.

use std::sync::Arc;

use crate::error::Result;
use crate::traits::KeyValueStore;

const POINTER_PREFIX: &str = "agentic-run:";

/// Namespaced store key for a conversation's run pointer
pub fn pointer_key(conversation_id: &str) -> String {
    format!("{}{}", POINTER_PREFIX, conversation_id)
}

/// Conversation id -> resumable run id
#[derive(Clone)]
pub struct RunPointers {
    store: Arc<dyn KeyValueStore>,
}

impl RunPointers {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, conversation_id: &str) -> Result<Option<String>> {
        let value = self.store.get(&pointer_key(conversation_id)).await?;
        Ok(value.filter(|run_id| !run_id.trim().is_empty()))
    }

    pub async fn save(&self, conversation_id: &str, run_id: &str) -> Result<()> {
        self.store.set(&pointer_key(conversation_id), run_id).await
    }

    pub async fn clear(&self, conversation_id: &str) -> Result<()> {
        self.store.remove(&pointer_key(conversation_id)).await
    }
}

impl std::fmt::Debug for RunPointers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunPointers").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryKeyValueStore;

    #[tokio::test]
    async fn test_pointer_round_trip() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let pointers = RunPointers::new(store.clone());

        assert_eq!(pointers.load("conv-1").await.unwrap(), None);

        pointers.save("conv-1", "run-1").await.unwrap();
        assert_eq!(pointers.load("conv-1").await.unwrap().as_deref(), Some("run-1"));
        assert_eq!(
            store.get("agentic-run:conv-1").await.unwrap().as_deref(),
            Some("run-1")
        );

        pointers.clear("conv-1").await.unwrap();
        assert_eq!(pointers.load("conv-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pointers_scoped_per_conversation() {
        let pointers = RunPointers::new(Arc::new(InMemoryKeyValueStore::new()));
        pointers.save("a", "run-a").await.unwrap();
        pointers.save("b", "run-b").await.unwrap();
        pointers.clear("a").await.unwrap();

        assert_eq!(pointers.load("a").await.unwrap(), None);
        assert_eq!(pointers.load("b").await.unwrap().as_deref(), Some("run-b"));
    }
}
