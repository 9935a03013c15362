// src/nodeinfo/mod.rs
// =============================================================================
// This module understands the nodeinfo metadata protocol.
//
// A server publishes /.well-known/nodeinfo, a small discovery document that
// lists which schema versions it supports and where each one lives. Four
// schema versions are seen in the wild (1.0, 1.1, 2.0, 2.1) and they differ
// mainly in field presence and nesting.
//
// Submodules:
// - discovery: the well-known document and version negotiation
// - schema: the four versioned documents and their projection
//
// Everything outside this module only sees MetadataView, the
// version-normalized projection.
// =============================================================================

mod discovery;
mod schema;

pub use discovery::{negotiate, Negotiated, VersionError, WellKnown, WellKnownLink, SCHEMA_PREFIX};
pub use schema::{DecodeError, Decoder, Nodeinfo, SchemaVersion, KNOWN_VERSIONS};

use serde::{Deserialize, Serialize};

/// What the crawler keeps from a nodeinfo document, whatever its version.
///
/// Fields older schemas do not carry are `None`, never zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataView {
    pub schema_version: SchemaVersion,
    pub software_name: String,
    pub software_version: Option<String>,
    pub open_registrations: bool,
    pub total_users: Option<i64>,
    pub active_halfyear: Option<i64>,
    pub active_month: Option<i64>,
    pub local_posts: Option<i64>,
    pub local_comments: Option<i64>,
}
