use serde::{Deserialize, Deserializer, Serialize};

/// Package metadata as returned by the ContentDB API.
///
/// The registry omits or nulls many fields depending on the endpoint
/// (search results carry far less than the detail view), so every field
/// falls back to its default when missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Package {
    // Identity
    #[serde(deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,

    // Display
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub short_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    // Versioning
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<u64>,

    /// Package type as reported by the registry (mod, game, txp)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    // Relations
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub content_warnings: Vec<String>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub maintainers: Vec<String>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<String>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<String>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    // Statistics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forums: Option<u64>,

    // Links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_tracker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Package {
    pub fn new(author: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// `author/name` key used by the registry
    pub fn id(&self) -> String {
        format!("{}/{}", self.author, self.name)
    }

    /// Release number as stored in mod.conf
    pub fn release_string(&self) -> String {
        self.release.map(|r| r.to_string()).unwrap_or_default()
    }
}

/// One downloadable revision of a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Release {
    pub id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Download location, usually relative to the registry host
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads: Option<u64>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_from_detail_json() {
        let json = r#"{
            "author": "rubenwardy",
            "name": "sfinv",
            "title": "Simple Fast Inventory",
            "short_description": "A cleaner, simpler inventory",
            "release": 4512,
            "type": "mod",
            "license": "MIT",
            "maintainers": ["rubenwardy"],
            "provides": ["sfinv"],
            "tags": ["inventory", "library"],
            "score": 412.5,
            "forums": null,
            "repo": "https://github.com/rubenwardy/sfinv",
            "unknown_field": {"ignored": true}
        }"#;

        let pkg: Package = serde_json::from_str(json).unwrap();
        assert_eq!(pkg.id(), "rubenwardy/sfinv");
        assert_eq!(pkg.title, "Simple Fast Inventory");
        assert_eq!(pkg.release, Some(4512));
        assert_eq!(pkg.release_string(), "4512");
        assert_eq!(pkg.package_type.as_deref(), Some("mod"));
        assert_eq!(pkg.tags, vec!["inventory", "library"]);
        assert_eq!(pkg.forums, None);
        assert_eq!(pkg.score, Some(412.5));
    }

    #[test]
    fn test_package_nulls_fall_back_to_defaults() {
        let json = r#"{"author": "a", "name": "b", "title": null, "short_description": null, "tags": null}"#;
        let pkg: Package = serde_json::from_str(json).unwrap();

        assert_eq!(pkg.title, "");
        assert_eq!(pkg.short_description, "");
        assert!(pkg.tags.is_empty());
        assert_eq!(pkg.release_string(), "");
    }

    #[test]
    fn test_package_serialization_skips_empty() {
        let pkg = Package::new("a", "b");
        let value = serde_json::to_value(&pkg).unwrap();

        assert_eq!(value["author"], "a");
        assert!(value.get("tags").is_none());
        assert!(value.get("release").is_none());
    }

    #[test]
    fn test_release_from_json() {
        let json = r#"{
            "id": 1234,
            "title": "2021-01-01",
            "release_date": "2021-01-01T10:00:00.000000",
            "url": "/packages/a/b/releases/1234/download/",
            "commit": "abc123",
            "downloads": 10
        }"#;

        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(release.id, 1234);
        assert_eq!(release.url, "/packages/a/b/releases/1234/download/");
        assert_eq!(release.commit.as_deref(), Some("abc123"));
    }
}
