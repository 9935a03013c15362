// src/nodeinfo/schema.rs
// =============================================================================
// The four nodeinfo schema versions and their projection to MetadataView.
//
// Each version gets its own document struct so decoding follows that
// version's field layout. Nodeinfo is a tagged union over the four, and
// view() is the single projection per variant.
//
// Differences that matter to us:
// - 1.0 has no software version we trust, so it projects to None
// - 1.x nests protocols as {inbound, outbound}, 2.x uses a flat list
// - 2.1 adds software.repository and software.homepage
// =============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use super::MetadataView;

/// Supported schema versions, newest first. Negotiation walks this order.
pub const KNOWN_VERSIONS: [SchemaVersion; 4] = [
    SchemaVersion::V2_1,
    SchemaVersion::V2_0,
    SchemaVersion::V1_1,
    SchemaVersion::V1_0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaVersion {
    #[serde(rename = "1.0")]
    V1_0,
    #[serde(rename = "1.1")]
    V1_1,
    #[serde(rename = "2.0")]
    V2_0,
    #[serde(rename = "2.1")]
    V2_1,
}

impl SchemaVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::V1_0 => "1.0",
            SchemaVersion::V1_1 => "1.1",
            SchemaVersion::V2_0 => "2.0",
            SchemaVersion::V2_1 => "2.1",
        }
    }

    pub fn parse(version: &str) -> Option<Self> {
        KNOWN_VERSIONS.into_iter().find(|v| v.as_str() == version)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid nodeinfo {version} document: {source}")]
pub struct DecodeError {
    pub version: SchemaVersion,
    #[source]
    pub source: serde_json::Error,
}

/// Decoder bound to the version chosen during negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoder {
    version: SchemaVersion,
}

impl Decoder {
    pub fn new(version: SchemaVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    pub fn decode(&self, body: &[u8]) -> Result<Nodeinfo, DecodeError> {
        let wrap = |source| DecodeError {
            version: self.version,
            source,
        };

        Ok(match self.version {
            SchemaVersion::V1_0 => Nodeinfo::V1_0(serde_json::from_slice(body).map_err(wrap)?),
            SchemaVersion::V1_1 => Nodeinfo::V1_1(serde_json::from_slice(body).map_err(wrap)?),
            SchemaVersion::V2_0 => Nodeinfo::V2_0(serde_json::from_slice(body).map_err(wrap)?),
            SchemaVersion::V2_1 => Nodeinfo::V2_1(serde_json::from_slice(body).map_err(wrap)?),
        })
    }
}

/// A decoded nodeinfo document of one of the known versions.
#[derive(Debug, Clone)]
pub enum Nodeinfo {
    V1_0(v10::Document),
    V1_1(v11::Document),
    V2_0(v20::Document),
    V2_1(v21::Document),
}

impl Nodeinfo {
    pub fn view(&self) -> MetadataView {
        match self {
            Nodeinfo::V1_0(n) => MetadataView {
                schema_version: SchemaVersion::V1_0,
                software_name: n.software.name.clone(),
                software_version: None,
                open_registrations: n.open_registrations,
                total_users: n.usage.users.total,
                active_halfyear: n.usage.users.active_halfyear,
                active_month: n.usage.users.active_month,
                local_posts: n.usage.local_posts,
                local_comments: n.usage.local_comments,
            },
            Nodeinfo::V1_1(n) => project(SchemaVersion::V1_1, &n.software, n.open_registrations, &n.usage),
            Nodeinfo::V2_0(n) => project(SchemaVersion::V2_0, &n.software, n.open_registrations, &n.usage),
            Nodeinfo::V2_1(n) => MetadataView {
                schema_version: SchemaVersion::V2_1,
                software_name: n.software.name.clone(),
                software_version: non_empty(&n.software.version),
                open_registrations: n.open_registrations,
                total_users: n.usage.users.total,
                active_halfyear: n.usage.users.active_halfyear,
                active_month: n.usage.users.active_month,
                local_posts: n.usage.local_posts,
                local_comments: n.usage.local_comments,
            },
        }
    }
}

fn project(
    version: SchemaVersion,
    software: &common::Software,
    open_registrations: bool,
    usage: &common::Usage,
) -> MetadataView {
    MetadataView {
        schema_version: version,
        software_name: software.name.clone(),
        software_version: non_empty(&software.version),
        open_registrations,
        total_users: usage.users.total,
        active_halfyear: usage.users.active_halfyear,
        active_month: usage.users.active_month,
        local_posts: usage.local_posts,
        local_comments: usage.local_comments,
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Pieces shared verbatim by several versions.
pub mod common {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct Software {
        pub name: String,
        #[serde(default)]
        pub version: String,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Users {
        #[serde(default)]
        pub total: Option<i64>,
        #[serde(default)]
        pub active_halfyear: Option<i64>,
        #[serde(default)]
        pub active_month: Option<i64>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Usage {
        #[serde(default)]
        pub users: Users,
        #[serde(default)]
        pub local_posts: Option<i64>,
        #[serde(default)]
        pub local_comments: Option<i64>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct Services {
        #[serde(default)]
        pub inbound: Vec<String>,
        #[serde(default)]
        pub outbound: Vec<String>,
    }

    /// 1.x splits protocols by direction.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct DirectedProtocols {
        #[serde(default)]
        pub inbound: Vec<String>,
        #[serde(default)]
        pub outbound: Vec<String>,
    }
}

pub mod v10 {
    use serde::{Deserialize, Serialize};

    use super::common::{DirectedProtocols, Services, Usage};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Software {
        pub name: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Document {
        pub version: String,
        pub software: Software,
        #[serde(default)]
        pub protocols: DirectedProtocols,
        #[serde(default)]
        pub services: Services,
        pub open_registrations: bool,
        pub usage: Usage,
        #[serde(default)]
        pub metadata: serde_json::Value,
    }
}

pub mod v11 {
    use serde::{Deserialize, Serialize};

    use super::common::{DirectedProtocols, Services, Software, Usage};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Document {
        pub version: String,
        pub software: Software,
        #[serde(default)]
        pub protocols: DirectedProtocols,
        #[serde(default)]
        pub services: Services,
        pub open_registrations: bool,
        pub usage: Usage,
        #[serde(default)]
        pub metadata: serde_json::Value,
    }
}

pub mod v20 {
    use serde::{Deserialize, Serialize};

    use super::common::{Services, Software, Usage};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Document {
        pub version: String,
        pub software: Software,
        #[serde(default)]
        pub protocols: Vec<String>,
        #[serde(default)]
        pub services: Services,
        pub open_registrations: bool,
        pub usage: Usage,
        #[serde(default)]
        pub metadata: serde_json::Value,
    }
}

pub mod v21 {
    use serde::{Deserialize, Serialize};

    use super::common::{Services, Usage};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Software {
        pub name: String,
        #[serde(default)]
        pub version: String,
        #[serde(default)]
        pub repository: Option<String>,
        #[serde(default)]
        pub homepage: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Document {
        pub version: String,
        pub software: Software,
        #[serde(default)]
        pub protocols: Vec<String>,
        #[serde(default)]
        pub services: Services,
        pub open_registrations: bool,
        pub usage: Usage,
        #[serde(default)]
        pub metadata: serde_json::Value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V10: &str = r#"{
        "version": "1.0",
        "software": {"name": "diaspora", "version": "0.5.0"},
        "protocols": {"inbound": ["diaspora"], "outbound": ["diaspora"]},
        "services": {"inbound": [], "outbound": []},
        "openRegistrations": true,
        "usage": {"users": {"total": 12}},
        "metadata": {}
    }"#;

    const V11: &str = r#"{
        "version": "1.1",
        "software": {"name": "friendica", "version": "2019.01"},
        "protocols": {"inbound": ["dfrn"], "outbound": ["dfrn"]},
        "services": {"inbound": [], "outbound": []},
        "openRegistrations": false,
        "usage": {"users": {"total": 40, "activeMonth": 7}, "localPosts": 900},
        "metadata": {}
    }"#;

    const V20: &str = r#"{
        "version": "2.0",
        "software": {"name": "mastodon", "version": "4.2.1"},
        "protocols": ["activitypub"],
        "services": {"inbound": [], "outbound": []},
        "openRegistrations": true,
        "usage": {
            "users": {"total": 1000, "activeHalfyear": 500, "activeMonth": 250},
            "localPosts": 123456
        },
        "metadata": {"nodeName": "example"}
    }"#;

    const V21: &str = r#"{
        "version": "2.1",
        "software": {
            "name": "pleroma",
            "version": "2.6.0",
            "repository": "https://git.pleroma.social/pleroma/pleroma"
        },
        "protocols": ["activitypub"],
        "services": {"inbound": [], "outbound": []},
        "openRegistrations": false,
        "usage": {
            "users": {"total": 3, "activeHalfyear": 2, "activeMonth": 1},
            "localPosts": 77,
            "localComments": 5
        },
        "metadata": {}
    }"#;

    fn view_of(version: SchemaVersion, body: &str) -> MetadataView {
        Decoder::new(version).decode(body.as_bytes()).unwrap().view()
    }

    #[test]
    fn test_v10_has_no_software_version() {
        let view = view_of(SchemaVersion::V1_0, V10);
        assert_eq!(view.schema_version, SchemaVersion::V1_0);
        assert_eq!(view.software_name, "diaspora");
        assert_eq!(view.software_version, None);
        assert!(view.open_registrations);
        assert_eq!(view.total_users, Some(12));
        assert_eq!(view.active_month, None);
        assert_eq!(view.local_posts, None);
    }

    #[test]
    fn test_v11_projection() {
        let view = view_of(SchemaVersion::V1_1, V11);
        assert_eq!(view.software_name, "friendica");
        assert_eq!(view.software_version.as_deref(), Some("2019.01"));
        assert!(!view.open_registrations);
        assert_eq!(view.total_users, Some(40));
        assert_eq!(view.active_halfyear, None);
        assert_eq!(view.active_month, Some(7));
        assert_eq!(view.local_posts, Some(900));
        assert_eq!(view.local_comments, None);
    }

    #[test]
    fn test_v20_projection() {
        let view = view_of(SchemaVersion::V2_0, V20);
        assert_eq!(view.software_name, "mastodon");
        assert_eq!(view.software_version.as_deref(), Some("4.2.1"));
        assert_eq!(view.total_users, Some(1000));
        assert_eq!(view.active_halfyear, Some(500));
        assert_eq!(view.active_month, Some(250));
        assert_eq!(view.local_posts, Some(123456));
        assert_eq!(view.local_comments, None);
    }

    #[test]
    fn test_v21_projection() {
        let view = view_of(SchemaVersion::V2_1, V21);
        assert_eq!(view.schema_version, SchemaVersion::V2_1);
        assert_eq!(view.software_name, "pleroma");
        assert_eq!(view.software_version.as_deref(), Some("2.6.0"));
        assert_eq!(view.total_users, Some(3));
        assert_eq!(view.local_comments, Some(5));
    }

    #[test]
    fn test_missing_version_field_is_rejected() {
        let body = r#"{"software": {"name": "mastodon"}, "openRegistrations": true, "usage": {}}"#;
        let err = Decoder::new(SchemaVersion::V2_0).decode(body.as_bytes()).unwrap_err();
        assert_eq!(err.version, SchemaVersion::V2_0);
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_empty_software_version_maps_to_none() {
        let body = r#"{
            "version": "2.0",
            "software": {"name": "mastodon", "version": ""},
            "openRegistrations": true,
            "usage": {"users": {}}
        }"#;
        assert_eq!(view_of(SchemaVersion::V2_0, body).software_version, None);
    }

    #[test]
    fn test_parse_known_and_unknown_versions() {
        assert_eq!(SchemaVersion::parse("2.1"), Some(SchemaVersion::V2_1));
        assert_eq!(SchemaVersion::parse("1.0"), Some(SchemaVersion::V1_0));
        assert_eq!(SchemaVersion::parse("9.9"), None);
    }
}
