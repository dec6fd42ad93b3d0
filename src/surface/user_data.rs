//! ### English
//! Bounded key/value store attached to a surface.
//!
//! ### 中文
//! 附加在 surface 上的有界键值存储。

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{GsError, Result};
use crate::types::SURFACE_MAX_USER_DATA_COUNT;

#[derive(Debug, Default)]
pub(super) struct UserData {
    entries: Mutex<HashMap<String, String>>,
}

impl UserData {
    /// ### English
    /// Inserts or overwrites `key`. A new key beyond `SURFACE_MAX_USER_DATA_COUNT` is `OutOfRange`;
    /// overwriting an existing key always succeeds.
    ///
    /// ### 中文
    /// 插入或覆盖 `key`。超过 `SURFACE_MAX_USER_DATA_COUNT` 的新键返回 `OutOfRange`；
    /// 覆盖已有键总是成功。
    pub(super) fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get_mut(key) {
            value.clone_into(existing);
            return Ok(());
        }
        if entries.len() >= SURFACE_MAX_USER_DATA_COUNT {
            warn!(key, "user data is full");
            return Err(GsError::OutOfRange);
        }
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    pub(super) fn get(&self, key: &str) -> String {
        self.entries.lock().get(key).cloned().unwrap_or_default()
    }
}
