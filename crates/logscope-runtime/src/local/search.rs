use crate::Result;
use crate::collaborators::TokenSearch;
use async_trait::async_trait;
use logscope_sessions::{SearchLimits, SessionStore};
use logscope_types::TokenMatch;
use std::path::Path;

/// Token search over the session corpus on the blocking pool.
#[derive(Debug, Clone)]
pub struct SessionTokenSearch {
    store: SessionStore,
}

impl SessionTokenSearch {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TokenSearch for SessionTokenSearch {
    async fn search(
        &self,
        token: &str,
        limits: SearchLimits,
        exclude: Option<&Path>,
    ) -> Result<Vec<TokenMatch>> {
        let store = self.store.clone();
        let token = token.to_string();
        let exclude = exclude.map(Path::to_path_buf);
        let hits = tokio::task::spawn_blocking(move || {
            store.search_token(&token, limits, exclude.as_deref())
        })
        .await??;
        Ok(hits)
    }
}
