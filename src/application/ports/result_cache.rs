use async_trait::async_trait;

#[derive(Debug)]
pub enum ResultCacheError {
    BackendError(String),
}

impl std::fmt::Display for ResultCacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultCacheError::BackendError(msg) => write!(f, "Cache backend error: {}", msg),
        }
    }
}

impl std::error::Error for ResultCacheError {}

/// Best-effort key-value result cache. Callers must treat any error from
/// either method as a cache miss / no-op, never as a request failure.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ResultCacheError>;

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<(), ResultCacheError>;
}
