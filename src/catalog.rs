// In-memory item catalog: item id -> wear-slot metadata.
// Loaded once at startup from the items.json produced by `dump-items` and
// shared read-only between all requests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::playerkit::KIT_SLOTS;

/// Sentinel wear position meaning "not worn / not applicable".
pub const NO_WEAR_POS: i32 = -1;

/// Wear position convention for the head slot; a head item is chathead-eligible.
pub const HEAD_WEAR_POS: i32 = 0;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read item catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse item catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("item catalog key '{0}' is not an integer item id")]
    InvalidKey(String),
    #[error("item {0} not found in catalog")]
    ItemNotFound(i32),
}

fn default_wear_pos() -> i32 {
    NO_WEAR_POS
}

/// One entry of the catalog.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ItemDefinition {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "wearpos1", alias = "wearPos1", default = "default_wear_pos")]
    pub wear_pos1: i32,
    #[serde(rename = "wearpos2", alias = "wearPos2", default = "default_wear_pos")]
    pub wear_pos2: i32,
    #[serde(rename = "wearpos3", alias = "wearPos3", default = "default_wear_pos")]
    pub wear_pos3: i32,
}

impl ItemDefinition {
    /// Whether `wear_pos1` names a playerkit slot, i.e. the item can be equipped.
    pub fn is_equippable(&self) -> bool {
        usize::try_from(self.wear_pos1).is_ok_and(|slot| slot < KIT_SLOTS)
    }

    pub fn is_head_item(&self) -> bool {
        self.wear_pos1 == HEAD_WEAR_POS
    }
}

#[derive(Debug, Default)]
pub struct ItemCatalog {
    items: HashMap<i32, ItemDefinition>,
}

impl ItemCatalog {
    /// Reads and parses the catalog file. Any failure leaves no catalog behind.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|err| match err {
            CatalogError::Parse { source, .. } => CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let entries: HashMap<String, ItemDefinition> =
            serde_json::from_str(raw).map_err(|source| CatalogError::Parse {
                path: PathBuf::new(),
                source,
            })?;

        let mut items = HashMap::with_capacity(entries.len());
        for (key, item) in entries {
            let id = key
                .trim()
                .parse::<i32>()
                .map_err(|_| CatalogError::InvalidKey(key.clone()))?;
            items.insert(id, item);
        }

        Ok(Self { items })
    }

    pub fn from_items(items: impl IntoIterator<Item = ItemDefinition>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id, item)).collect(),
        }
    }

    pub fn lookup(&self, item_id: i32) -> Result<&ItemDefinition, CatalogError> {
        self.items
            .get(&item_id)
            .ok_or(CatalogError::ItemNotFound(item_id))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
