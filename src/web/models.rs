// Request and response bodies of the HTTP API

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::pipeline::RenderRequest;
use crate::renderer::Rotation;

/// Item ids, either as `"30321, 1155"` or as `[30321, 1155]`.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum ItemIdList {
    Csv(String),
    List(Vec<i64>),
}

fn item_id(value: i64) -> Result<i32, RenderError> {
    i32::try_from(value)
        .ok()
        .filter(|id| *id >= 0)
        .ok_or_else(|| RenderError::Validation(format!("Invalid item id {}", value)))
}

impl ItemIdList {
    pub fn parse(&self) -> Result<Vec<i32>, RenderError> {
        let ids = match self {
            ItemIdList::Csv(raw) => raw
                .split(',')
                .map(|part| {
                    let part = part.trim();
                    part.parse::<i64>()
                        .map_err(|_| RenderError::Validation(format!("Invalid item id '{}'", part)))
                        .and_then(item_id)
                })
                .collect::<Result<Vec<_>, _>>()?,
            ItemIdList::List(values) => values
                .iter()
                .copied()
                .map(item_id)
                .collect::<Result<Vec<_>, _>>()?,
        };

        if ids.is_empty() {
            return Err(RenderError::Validation(
                "At least one item id is required".to_string(),
            ));
        }
        Ok(ids)
    }
}

/// Body of POST /render
#[derive(Deserialize, Debug, Clone)]
pub struct RenderRequestBody {
    pub ids: ItemIdList,
    pub rotation: i64,
    #[serde(rename = "poseAnim")]
    pub pose_anim: i32,
}

impl TryFrom<RenderRequestBody> for RenderRequest {
    type Error = RenderError;

    fn try_from(body: RenderRequestBody) -> Result<Self, Self::Error> {
        let rotation = Rotation::from_index(body.rotation).ok_or_else(|| {
            RenderError::Validation(format!(
                "Rotation must be between 0 and 3, got {}",
                body.rotation
            ))
        })?;

        Ok(RenderRequest {
            item_ids: body.ids.parse()?,
            rotation,
            pose_anim: body.pose_anim,
        })
    }
}

/// Body of GET /health
#[derive(Serialize, Debug, Clone)]
pub struct HealthResponse {
    pub status: &'static str,
    pub items: usize,
}
