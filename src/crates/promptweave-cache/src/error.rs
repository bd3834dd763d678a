use thiserror::Error;

/// Construction-time configuration failures.
///
/// No `get`/`set`/`delete`/`clear` call on a built [`crate::Cache`] can fail;
/// the only way to get this error is to hand `CacheConfig` something it
/// cannot honor before the cache ever starts serving requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheConfigError {
    #[error("cache max_size must be greater than zero")]
    ZeroCapacity,
}
