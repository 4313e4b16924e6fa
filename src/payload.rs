//! Content payload model
//!
//! The payload is the editable part of a record: title, description,
//! channel variations, page blocks, approvals, usage and brand metadata,
//! temporal metadata and relationship references. The integrity subsystem
//! treats it as opaque apart from canonical serialization; this module owns
//! its defaults, normalization and the top-level merge used by updates.

use crate::errors::{ContentError, ContentResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Top-level sections with a typed shape. A `null` in any of them counts as absent.
const KNOWN_SECTIONS: [&str; 10] = [
    "title",
    "type",
    "description",
    "variations",
    "blocks",
    "approvals",
    "usage",
    "brand",
    "temporal",
    "relationships",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub variations: Variations,
    #[serde(default)]
    pub blocks: Blocks,
    #[serde(default)]
    pub approvals: Approvals,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default)]
    pub brand: Brand,
    #[serde(default)]
    pub temporal: Temporal,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    /// Fields outside the known sections, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variations {
    #[serde(default)]
    pub social: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub print: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Blocks {
    #[serde(default)]
    pub paragraph: Option<String>,
    /// Accepts a list or a newline-separated string
    #[serde(default, deserialize_with = "features_from_text_or_list")]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Approvals {
    #[serde(default)]
    pub legal: Approval,
    #[serde(default)]
    pub marketing: Approval,
    #[serde(default)]
    pub compliance: Approval,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approval {
    #[serde(default = "default_approval_status")]
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub approver: Option<String>,
}

impl Default for Approval {
    fn default() -> Self {
        Self {
            status: default_approval_status(),
            timestamp: None,
            approver: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub translatable: bool,
    #[serde(default)]
    pub verbatim_required: bool,
    #[serde(default)]
    pub restrictions: Restrictions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restrictions {
    #[serde(default)]
    pub embargo: Option<String>,
    #[serde(default = "default_confidentiality")]
    pub confidentiality: String,
    #[serde(default = "default_usage_rights")]
    pub usage_rights: String,
}

impl Default for Restrictions {
    fn default() -> Self {
        Self {
            embargo: None,
            confidentiality: default_confidentiality(),
            usage_rights: default_usage_rights(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    #[serde(default)]
    pub trademark_required: bool,
    #[serde(default)]
    pub slogan_required: bool,
    #[serde(default)]
    pub style: BrandStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandStyle {
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_spacing")]
    pub spacing: String,
}

impl Default for BrandStyle {
    fn default() -> Self {
        Self {
            font: default_font(),
            color: default_color(),
            spacing: default_spacing(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temporal {
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub valid_until: Option<String>,
    #[serde(default = "default_version")]
    pub version: u64,
}

impl Default for Temporal {
    fn default() -> Self {
        Self {
            created_date: None,
            valid_until: None,
            version: default_version(),
        }
    }
}

/// Reference to another record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RelationshipInput")]
pub struct Relationship {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RelationshipInput {
    Reference {
        #[serde(rename = "type", default)]
        kind: Option<String>,
        id: ReferenceId,
    },
    Bare(ReferenceId),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReferenceId {
    Number(serde_json::Number),
    Text(String),
}

impl From<ReferenceId> for String {
    fn from(id: ReferenceId) -> Self {
        match id {
            ReferenceId::Number(n) => n.to_string(),
            ReferenceId::Text(s) => s,
        }
    }
}

impl From<RelationshipInput> for Relationship {
    fn from(input: RelationshipInput) -> Self {
        let (kind, id) = match input {
            RelationshipInput::Reference { kind, id } => (kind, id),
            RelationshipInput::Bare(id) => (None, id),
        };
        Relationship {
            kind: kind
                .filter(|k| !k.trim().is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            id: id.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeaturesInput {
    List(Vec<String>),
    Text(String),
}

fn features_from_text_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match FeaturesInput::deserialize(deserializer)? {
        FeaturesInput::List(list) => list,
        FeaturesInput::Text(text) => text
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect(),
    })
}

fn default_approval_status() -> String {
    "pending".to_string()
}

fn default_confidentiality() -> String {
    "public".to_string()
}

fn default_usage_rights() -> String {
    "unrestricted".to_string()
}

fn default_font() -> String {
    "SF Pro Text".to_string()
}

fn default_color() -> String {
    "#1D1D1F".to_string()
}

fn default_spacing() -> String {
    "relaxed".to_string()
}

fn default_version() -> u64 {
    1
}

impl ContentPayload {
    /// Parse and normalize a caller-supplied document.
    ///
    /// Anything other than a JSON object, or a known section with the wrong
    /// shape, is an encoding error.
    pub fn from_value(value: Value) -> ContentResult<Self> {
        let Value::Object(mut map) = value else {
            return Err(ContentError::encoding(
                "payload",
                "content payload must be a JSON object",
            ));
        };
        strip_known_nulls(&mut map);

        let mut payload: ContentPayload = serde_json::from_value(Value::Object(map))
            .map_err(|e| ContentError::encoding("payload", e))?;
        payload.normalize();
        Ok(payload)
    }

    /// Parse a payload submitted for creation. `temporal.version` is assigned
    /// by the store, so whatever the caller put there is discarded unread.
    pub fn from_input(value: Value) -> ContentResult<Self> {
        let mut value = value;
        if let Value::Object(map) = &mut value {
            drop_assigned_version(map);
        }
        Self::from_value(value)
    }

    /// Merge `patch` over this payload and return the result.
    ///
    /// Top-level sections in the patch replace the existing ones; omitted
    /// sections are left unchanged. `usage.restrictions` and `temporal` are
    /// merged key by key. The caller decides the resulting version.
    pub fn merged_with(&self, patch: &Value) -> ContentResult<Self> {
        let Value::Object(patch) = patch else {
            return Err(ContentError::encoding(
                "payload patch",
                "content patch must be a JSON object",
            ));
        };
        let mut patch = patch.clone();
        strip_known_nulls(&mut patch);
        drop_assigned_version(&mut patch);

        let Value::Object(mut base) = serde_json::to_value(self)
            .map_err(|e| ContentError::encoding("payload", e))?
        else {
            return Err(ContentError::encoding("payload", "payload is not an object"));
        };

        for (key, value) in patch {
            let merged = match key.as_str() {
                "usage" => merge_usage(base.get("usage"), value),
                "temporal" => merge_keys(base.get("temporal"), value),
                _ => value,
            };
            base.insert(key, merged);
        }

        Self::from_value(Value::Object(base))
    }

    /// Replace empty strings in defaulted fields with their defaults
    fn normalize(&mut self) {
        let restrictions = &mut self.usage.restrictions;
        if restrictions.confidentiality.trim().is_empty() {
            restrictions.confidentiality = default_confidentiality();
        }
        if restrictions.usage_rights.trim().is_empty() {
            restrictions.usage_rights = default_usage_rights();
        }
        if restrictions.embargo.as_deref().is_some_and(|e| e.trim().is_empty()) {
            restrictions.embargo = None;
        }
    }
}

fn merge_keys(base: Option<&Value>, patch: Value) -> Value {
    match (base, patch) {
        (Some(Value::Object(base)), Value::Object(patch)) => {
            let mut merged = base.clone();
            merged.extend(patch);
            Value::Object(merged)
        }
        (_, patch) => patch,
    }
}

/// A new `usage` replaces the old one, except that restrictions are
/// carried over and overlaid.
fn merge_usage(base: Option<&Value>, patch: Value) -> Value {
    let Value::Object(mut usage) = patch else {
        return patch;
    };
    let base_restrictions = base.and_then(|b| b.get("restrictions"));
    let restrictions = match usage.remove("restrictions") {
        Some(patch_restrictions) => merge_keys(base_restrictions, patch_restrictions),
        None => base_restrictions.cloned().unwrap_or(Value::Null),
    };
    if !restrictions.is_null() {
        usage.insert("restrictions".to_string(), restrictions);
    }
    Value::Object(usage)
}

fn drop_assigned_version(map: &mut Map<String, Value>) {
    if let Some(Value::Object(temporal)) = map.get_mut("temporal") {
        temporal.remove("version");
    }
}

fn strip_known_nulls(map: &mut Map<String, Value>) {
    map.retain(|key, value| !(value.is_null() && KNOWN_SECTIONS.contains(&key.as_str())));
    for key in KNOWN_SECTIONS {
        if let Some(section) = map.get_mut(key) {
            strip_nulls(section);
        }
    }
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}
