//! Typed schemas for the corpus documents.
//!
//! Each schema covers the parts of its document that exercise something
//! interesting (deep float arrays, integer-keyed maps, recursive trees,
//! non-ASCII strings). Members a schema leaves out are ignored on decode.
//! Everything defaults, so a schema also decodes documents that omit fields.

// Field names mirror the document members.
#![allow(missing_docs)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// CanadaGeometry
// ============================================================================

/// A GeoJSON feature collection with large polygon coordinate arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanadaRoot {
    /// Always `FeatureCollection`
    #[serde(rename = "type")]
    pub kind: String,
    /// Features in the collection
    pub features: Vec<CanadaFeature>,
}

/// A single GeoJSON feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanadaFeature {
    /// Always `Feature`
    #[serde(rename = "type")]
    pub kind: String,
    /// Free-form properties
    pub properties: BTreeMap<String, String>,
    /// Feature geometry
    pub geometry: Option<CanadaGeometry>,
}

/// Polygon geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanadaGeometry {
    /// Geometry kind, `Polygon` in practice
    #[serde(rename = "type")]
    pub kind: String,
    /// Rings of longitude/latitude pairs
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

// ============================================================================
// CITMCatalog
// ============================================================================

/// An event catalogue with many id-keyed lookup tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CitmRoot {
    /// Area id to name
    pub area_names: BTreeMap<String, String>,
    /// Audience sub-category id to name
    pub audience_sub_category_names: BTreeMap<String, String>,
    /// Event id to event
    pub events: BTreeMap<String, CitmEvent>,
    /// Scheduled performances
    pub performances: Vec<CitmPerformance>,
    /// Seat category id to name
    pub seat_category_names: BTreeMap<String, String>,
    /// Topic id to sub-topic ids
    pub topic_sub_topics: BTreeMap<String, Vec<i64>>,
    /// Venue code to name
    pub venue_names: BTreeMap<String, String>,
}

/// A catalogue event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CitmEvent {
    pub description: Option<String>,
    pub id: i64,
    pub logo: Option<String>,
    pub name: String,
    pub sub_topic_ids: Vec<i64>,
    pub subject_code: Option<String>,
    pub subtitle: Option<String>,
    pub topic_ids: Vec<i64>,
}

/// A performance of an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CitmPerformance {
    pub event_id: i64,
    pub id: i64,
    pub logo: Option<String>,
    pub name: Option<String>,
    pub prices: Vec<CitmPrice>,
    pub seat_categories: Vec<CitmSeatCategory>,
    pub seat_map_image: Option<String>,
    pub start: i64,
    pub venue_code: String,
}

/// Price of one seat category for one audience.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CitmPrice {
    pub amount: i64,
    pub audience_sub_category_id: i64,
    pub seat_category_id: i64,
}

/// Seat category with the areas it covers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CitmSeatCategory {
    pub areas: Vec<CitmArea>,
    pub seat_category_id: i64,
}

/// Area within a seat category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CitmArea {
    pub area_id: i64,
    pub block_ids: Vec<i64>,
}

// ============================================================================
// SyntheaFHIR
// ============================================================================

/// A FHIR transaction bundle of synthetic patient records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyntheaRoot {
    /// Always `Bundle`
    pub resource_type: String,
    /// Bundle type, `transaction` in practice
    #[serde(rename = "type")]
    pub kind: String,
    /// Bundle entries
    pub entry: Vec<SyntheaEntry>,
}

/// One bundle entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyntheaEntry {
    pub full_url: Option<String>,
    pub resource: Option<SyntheaResource>,
    pub request: Option<SyntheaRequest>,
}

/// The common header of every FHIR resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyntheaResource {
    pub resource_type: String,
    pub id: Option<String>,
    pub status: Option<String>,
    pub subject: Option<SyntheaReference>,
    pub code: Option<SyntheaCodeableConcept>,
}

/// A reference to another resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheaReference {
    pub reference: Option<String>,
}

/// A coded concept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheaCodeableConcept {
    pub coding: Vec<SyntheaCoding>,
    pub text: Option<String>,
}

/// A single code from a terminology system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheaCoding {
    pub system: Option<String>,
    pub code: Option<String>,
    pub display: Option<String>,
}

/// How the entry is applied to a server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheaRequest {
    pub method: String,
    pub url: String,
}

// ============================================================================
// TwitterStatus
// ============================================================================

/// A search API response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterRoot {
    /// Matching statuses
    pub statuses: Vec<TwitterStatus>,
    /// Search bookkeeping
    pub search_metadata: Option<TwitterSearchMetadata>,
}

/// A single status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterStatus {
    pub created_at: String,
    pub id: i64,
    pub id_str: String,
    pub text: String,
    pub source: Option<String>,
    pub truncated: bool,
    pub in_reply_to_status_id: Option<i64>,
    pub user: Option<TwitterUser>,
    pub retweet_count: i64,
    pub favorite_count: i64,
    pub entities: Option<TwitterEntities>,
    pub favorited: bool,
    pub retweeted: bool,
    pub lang: Option<String>,
}

/// The author of a status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterUser {
    pub id: i64,
    pub id_str: String,
    pub name: String,
    pub screen_name: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub followers_count: i64,
    pub friends_count: i64,
    pub verified: bool,
}

/// Entities extracted from status text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterEntities {
    pub hashtags: Vec<TwitterHashtag>,
    pub user_mentions: Vec<TwitterMention>,
}

/// A hashtag occurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterHashtag {
    pub text: String,
    pub indices: Vec<i64>,
}

/// A mention of another user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterMention {
    pub screen_name: String,
    pub id: i64,
    pub indices: Vec<i64>,
}

/// Search bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterSearchMetadata {
    pub completed_in: f64,
    pub max_id: i64,
    pub query: String,
    pub count: i64,
}

// ============================================================================
// GolangSource
// ============================================================================

/// A recursive tree of source files with change statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GolangRoot {
    /// Root of the tree
    pub tree: Option<GolangNode>,
    /// Owner of the tree
    pub username: String,
    /// Last modification time
    pub mod_time: i64,
}

/// A directory or file node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GolangNode {
    pub name: String,
    pub kids: Vec<GolangNode>,
    pub cl_weight: f64,
    pub touches: i64,
    pub min_t: i64,
    pub max_t: i64,
    pub mean_t: i64,
}

// ============================================================================
// StringUnicode
// ============================================================================

/// A flat map of strings with heavy use of non-ASCII text and escapes.
pub type StringRoot = BTreeMap<String, String>;
