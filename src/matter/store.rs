//! Node attribute store.
//!
//! Holds the device's externally visible attribute state. The sampling loop
//! writes values here under the stack lock; the framework side reads them
//! when serving the data model and uses the version counter for change
//! detection.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::Result;

/// Typed attribute payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttrValue {
    /// 8-bit enumeration value
    Enum8(u8),
    /// Nullable single-precision float
    NullableFloat(Option<f32>),
}

/// Key addressing one attribute in the data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributePath {
    pub endpoint_id: u16,
    pub cluster_id: u32,
    pub attribute_id: u32,
}

/// Write access to the node's externally visible attribute state.
///
/// Callers must hold the stack lock for the duration of any update; the
/// sampling loop keeps its guard across both publishes of a cycle.
pub trait AttributeWriter: Send + Sync {
    /// Publish one attribute value. Each update is an independent one-shot
    /// message; ordering between updates is the caller's concern.
    fn update(
        &self,
        endpoint_id: u16,
        cluster_id: u32,
        attribute_id: u32,
        value: AttrValue,
    ) -> Result<()>;
}

/// Attribute store shared with the framework side.
pub struct NodeAttributeStore {
    values: RwLock<HashMap<AttributePath, AttrValue>>,
    version: AtomicU32,
}

impl NodeAttributeStore {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            version: AtomicU32::new(0),
        }
    }

    /// Read an attribute value, if one has been published.
    pub fn get(&self, endpoint_id: u16, cluster_id: u32, attribute_id: u32) -> Option<AttrValue> {
        self.values
            .read()
            .get(&AttributePath {
                endpoint_id,
                cluster_id,
                attribute_id,
            })
            .copied()
    }

    /// Get the current version (incremented on each update).
    pub fn version(&self) -> u32 {
        self.version.load(Ordering::SeqCst)
    }
}

impl Default for NodeAttributeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeWriter for NodeAttributeStore {
    fn update(
        &self,
        endpoint_id: u16,
        cluster_id: u32,
        attribute_id: u32,
        value: AttrValue,
    ) -> Result<()> {
        let path = AttributePath {
            endpoint_id,
            cluster_id,
            attribute_id,
        };
        self.values.write().insert(path, value);
        self.version.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_then_get() {
        let store = NodeAttributeStore::new();
        assert_eq!(store.get(1, 0x005b, 0x0000), None);

        store.update(1, 0x005b, 0x0000, AttrValue::Enum8(1)).unwrap();
        assert_eq!(store.get(1, 0x005b, 0x0000), Some(AttrValue::Enum8(1)));
    }

    #[test]
    fn test_update_increments_version() {
        let store = NodeAttributeStore::new();
        assert_eq!(store.version(), 0);

        store
            .update(1, 0x040d, 0x0000, AttrValue::NullableFloat(Some(400.0)))
            .unwrap();
        assert_eq!(store.version(), 1);

        store
            .update(1, 0x040d, 0x0000, AttrValue::NullableFloat(None))
            .unwrap();
        assert_eq!(store.version(), 2);
        assert_eq!(
            store.get(1, 0x040d, 0x0000),
            Some(AttrValue::NullableFloat(None))
        );
    }

    #[test]
    fn test_paths_are_independent() {
        let store = NodeAttributeStore::new();
        store.update(1, 0x005b, 0x0000, AttrValue::Enum8(2)).unwrap();
        store
            .update(1, 0x040d, 0x0000, AttrValue::NullableFloat(Some(1200.0)))
            .unwrap();

        assert_eq!(store.get(1, 0x005b, 0x0000), Some(AttrValue::Enum8(2)));
        assert_eq!(
            store.get(1, 0x040d, 0x0000),
            Some(AttrValue::NullableFloat(Some(1200.0)))
        );
        assert_eq!(store.get(2, 0x005b, 0x0000), None);
    }
}
