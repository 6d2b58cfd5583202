//! Flat region records.
//!
//! The persisted document is a single object with a `regions` list. Each
//! element is a flat record:
//!
//! | key         | type    | required |
//! |-------------|---------|----------|
//! | `id`        | string  | yes      |
//! | `world`     | string  | yes      |
//! | `worldUuid` | string  | no       |
//! | `centerX`   | integer | no (0)   |
//! | `centerZ`   | integer | no (0)   |
//! | `radius`    | integer | no (0)   |
//! | `createdBy` | string  | no       |
//! | `createdAt` | string  | no       |
//!
//! Records are written with [`RegionRecord`] and read back leniently with
//! [`parse_record`], which works on untyped JSON so one bad record never
//! poisons the rest of the list. Unparsable numbers read as `0`, but a
//! `radius` that parses to a negative value or to more than
//! [`MAX_RADIUS`] rejects the record.

use chrono::{DateTime, SecondsFormat, Utc};
use keepregion_model::{MAX_RADIUS, PartitionRef, Region, RegionId, TileCoord};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::RecordError;

/// Name of the list field holding the records.
pub const REGIONS_KEY: &str = "regions";

/// The persisted document.
#[derive(Debug, Serialize)]
pub struct RegionDocument<'a> {
    /// Records in registry order.
    pub regions: Vec<RegionRecord<'a>>,
}

impl<'a> RegionDocument<'a> {
    /// Build a document from a region snapshot.
    #[must_use]
    pub fn from_regions(regions: &'a [Region]) -> Self {
        Self {
            regions: regions.iter().map(RegionRecord::from).collect(),
        }
    }
}

/// One region as written to the document. Field order matches the read side.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionRecord<'a> {
    pub id: String,
    pub world: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub world_uuid: Option<String>,
    pub center_x: i32,
    pub center_z: i32,
    pub radius: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl<'a> From<&'a Region> for RegionRecord<'a> {
    fn from(region: &'a Region) -> Self {
        Self {
            id: region.id().to_string(),
            world: region.partition().name(),
            world_uuid: region.partition().id().map(|id| id.hyphenated().to_string()),
            center_x: region.center().x,
            center_z: region.center().z,
            radius: region.radius(),
            created_by: region.created_by(),
            created_at: region
                .created_at()
                .map(|at| at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

/// Parse one untyped record into a [`Region`].
///
/// # Errors
///
/// Returns [`RecordError`] if the record is not an object, lacks an `id` or
/// `world`, carries an unparsable `id`, `worldUuid` or `createdAt`, or has a
/// `radius` outside `0..=MAX_RADIUS`. Unparsable numbers fall back to `0`.
pub fn parse_record(entry: &Value) -> Result<Region, RecordError> {
    let map = entry.as_object().ok_or(RecordError::NotARecord)?;

    let id = text_field(map.get("id")).ok_or(RecordError::MissingId)?;
    let id = Uuid::parse_str(&id).map_err(RecordError::InvalidId)?;

    let world = text_field(map.get("world"))
        .filter(|name| !name.is_empty())
        .ok_or(RecordError::MissingPartition)?;

    let world_uuid = match text_field(map.get("worldUuid")).filter(|raw| !raw.is_empty()) {
        Some(raw) => Some(Uuid::parse_str(&raw).map_err(RecordError::InvalidPartitionId)?),
        None => None,
    };

    let center_x: i32 = number_field(map.get("centerX"));
    let center_z: i32 = number_field(map.get("centerZ"));
    let radius: i64 = number_field(map.get("radius"));
    let radius = u32::try_from(radius)
        .ok()
        .filter(|radius| *radius <= MAX_RADIUS)
        .ok_or(RecordError::RadiusOutOfRange(radius))?;

    let created_by = text_field(map.get("createdBy"));
    let created_at = match text_field(map.get("createdAt")).filter(|raw| !raw.is_empty()) {
        Some(raw) => Some(
            DateTime::parse_from_rfc3339(&raw)
                .map_err(RecordError::InvalidTimestamp)?
                .with_timezone(&Utc),
        ),
        None => None,
    };

    Ok(Region::new(
        RegionId(id),
        PartitionRef::new(world, world_uuid),
        TileCoord::new(center_x, center_z),
        radius,
        created_by,
        created_at,
    ))
}

/// Scalar values as text; `null`, lists and nested records read as absent.
fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Integers, floats (truncated) and numeric strings; anything else is `0`.
fn number_field<T>(value: Option<&Value>) -> T
where
    T: TryFrom<i64> + std::str::FromStr + Default,
{
    let parsed = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .and_then(|raw| T::try_from(raw).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.unwrap_or_default()
}
