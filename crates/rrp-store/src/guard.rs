//! Insert-time collision policy.

use serde::{Deserialize, Serialize};
use tracing::warn;

use rrp_types::ResourceKey;

use crate::error::{StoreError, StoreResult};

/// What happens when a key that is already present is added again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Reject the add with [`StoreError::Duplicate`]; the store is untouched.
    #[default]
    Strict,
    /// Replace the existing producer. The last add to take the bucket's
    /// write lock wins.
    Permissive,
}

impl DuplicatePolicy {
    /// Decide whether an add for `key` may proceed given whether the key is
    /// already present. Called with the bucket's write lock held.
    pub fn admit(self, key: &ResourceKey, exists: bool, pack: &str) -> StoreResult<()> {
        if !exists {
            return Ok(());
        }
        match self {
            DuplicatePolicy::Strict => Err(StoreError::Duplicate {
                bucket: key.bucket(),
                key: key.clone(),
                pack: pack.to_string(),
            }),
            DuplicatePolicy::Permissive => {
                warn!(%key, pack, "overwriting duplicate resource");
                Ok(())
            }
        }
    }
}
