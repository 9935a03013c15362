// src/nodeinfo/discovery.rs
// =============================================================================
// The well-known discovery document and schema version negotiation.
//
// /.well-known/nodeinfo looks like:
//
//   {"links": [{"rel": "http://nodeinfo.diaspora.software/ns/schema/2.0",
//               "href": "https://example.com/nodeinfo/2.0"}]}
//
// Negotiation keeps the links whose rel starts with the schema prefix,
// maps version -> href, then walks KNOWN_VERSIONS newest first and picks
// the first one the server offers.
// =============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::schema::{Decoder, SchemaVersion, KNOWN_VERSIONS};

/// Prefix shared by the rel of every nodeinfo schema link.
pub const SCHEMA_PREFIX: &str = "http://nodeinfo.diaspora.software/ns/schema/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellKnownLink {
    pub rel: String,
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellKnown {
    #[serde(default)]
    pub links: Vec<WellKnownLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("no supported nodeinfo version found (offered: {offered:?})")]
    NoSupportedVersion { offered: Vec<String> },
}

/// The outcome of negotiation: where to fetch the document and how to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    pub href: String,
    pub decoder: Decoder,
}

impl Negotiated {
    pub fn version(&self) -> SchemaVersion {
        self.decoder.version()
    }
}

/// Picks the highest schema version offered by the discovery document.
pub fn negotiate(well_known: &WellKnown) -> Result<Negotiated, VersionError> {
    let offered: HashMap<&str, &str> = well_known
        .links
        .iter()
        .filter_map(|link| {
            link.rel
                .strip_prefix(SCHEMA_PREFIX)
                .map(|version| (version, link.href.as_str()))
        })
        .collect();

    for version in KNOWN_VERSIONS {
        if let Some(href) = offered.get(version.as_str()) {
            return Ok(Negotiated {
                href: href.to_string(),
                decoder: Decoder::new(version),
            });
        }
    }

    let mut offered: Vec<String> = offered.into_keys().map(str::to_string).collect();
    offered.sort();
    Err(VersionError::NoSupportedVersion { offered })
}
