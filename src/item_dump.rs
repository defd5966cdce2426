// Conversion of raw item definition dumps into the catalog format.
//
// Upstream uses 0 both for "head slot" and for "blank", so wear positions are
// normalised here: -1 means "not applicable" everywhere in the catalog.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::{HEAD_WEAR_POS, ItemDefinition, NO_WEAR_POS};

/// Wear positions that on their own do not make an item visible on the body.
const UNRENDERED_SLOTS: [i32; 3] = [0, 12, 13];

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize catalog: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn default_head_model() -> i32 {
    -1
}

/// The subset of an upstream item definition dump the catalog needs.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawItemDefinition {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub wear_pos1: i32,
    #[serde(default)]
    pub wear_pos2: i32,
    #[serde(default)]
    pub wear_pos3: i32,
    #[serde(default = "default_head_model")]
    pub male_head_model: i32,
    #[serde(default = "default_head_model")]
    pub female_head_model: i32,
}

impl RawItemDefinition {
    fn has_head_model(&self) -> bool {
        self.male_head_model != -1 || self.female_head_model != -1
    }

    fn is_rendered(&self) -> bool {
        [self.wear_pos1, self.wear_pos2, self.wear_pos3]
            .iter()
            .any(|pos| !UNRENDERED_SLOTS.contains(pos))
            || self.has_head_model()
    }
}

fn blank_to_none(wear_pos: i32) -> i32 {
    if wear_pos == HEAD_WEAR_POS {
        NO_WEAR_POS
    } else {
        wear_pos
    }
}

/// Normalises a raw definition, or returns `None` for items that are never drawn.
///
/// Without a head model every 0 is blank. With one, the first wear position
/// keeps a 0 as the head slot and only the others are treated as blank.
pub fn normalize(raw: &RawItemDefinition) -> Option<ItemDefinition> {
    if !raw.is_rendered() {
        return None;
    }

    let wear_pos1 = if raw.has_head_model() {
        raw.wear_pos1
    } else {
        blank_to_none(raw.wear_pos1)
    };

    Some(ItemDefinition {
        id: raw.id,
        name: raw.name.clone(),
        wear_pos1,
        wear_pos2: blank_to_none(raw.wear_pos2),
        wear_pos3: blank_to_none(raw.wear_pos3),
    })
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NamePart {
    Number(u64),
    Text(String),
}

/// Sort key ordering `2.json` before `10.json`.
fn natural_key(name: &str) -> Vec<NamePart> {
    let mut parts = Vec::new();
    let mut rest = name;
    while let Some(first) = rest.chars().next() {
        let is_digit = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != is_digit)
            .unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(end);
        parts.push(match chunk.parse::<u64>() {
            Ok(number) if is_digit => NamePart::Number(number),
            _ => NamePart::Text(chunk.to_string()),
        });
        rest = tail;
    }
    parts
}

/// Reads every dump file in `input_dir` and returns the normalised catalog.
pub fn build_catalog(input_dir: &Path) -> Result<BTreeMap<i32, ItemDefinition>, DumpError> {
    let read_error = |source| DumpError::Read {
        path: input_dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(input_dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort_by_cached_key(|path| {
        natural_key(&path.file_name().unwrap_or_default().to_string_lossy())
    });

    let mut items = BTreeMap::new();
    for path in files {
        let raw = std::fs::read_to_string(&path).map_err(|source| DumpError::Read {
            path: path.clone(),
            source,
        })?;
        let definition: RawItemDefinition =
            serde_json::from_str(&raw).map_err(|source| DumpError::Parse {
                path: path.clone(),
                source,
            })?;

        if let Some(item) = normalize(&definition) {
            items.insert(item.id, item);
        }
    }

    Ok(items)
}

/// Writes `items.json` and `itemsmin.js` into `output_dir`.
pub fn write_catalog(
    items: &BTreeMap<i32, ItemDefinition>,
    output_dir: &Path,
) -> Result<(), DumpError> {
    let write = |path: PathBuf, contents: String| {
        std::fs::write(&path, contents).map_err(|source| DumpError::Write { path, source })
    };

    write(output_dir.join("items.json"), serde_json::to_string_pretty(items)?)?;
    write(
        output_dir.join("itemsmin.js"),
        format!("items={}", serde_json::to_string(items)?),
    )?;

    Ok(())
}
