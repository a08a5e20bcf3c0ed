use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

const VALID_ROADWAYS: [&str; 16] = [
    "motorway",
    "motorway_link",
    "trunk",
    "trunk_link",
    "primary",
    "primary_link",
    "secondary",
    "secondary_link",
    "tertiary",
    "tertiary_link",
    "unclassified",
    "residential",
    "living_street",
    "service",
    "road",
    "track",
];

/// Key-value tags of an element. Keys are unique.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tags(FxHashMap<String, String>);

impl Tags {
    const HIGHWAY: &'static str = "highway";
    const ONE_WAY: &'static str = "oneway";

    /// Marks temporary features created by upstream processing
    /// (such as roundabout handling) which must never be matched.
    pub const SPECIAL: &'static str = "conflate:special";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[inline]
    pub fn road_tag(&self) -> Option<&str> {
        self.value(Tags::HIGHWAY)
            .filter(|v| VALID_ROADWAYS.contains(v))
    }

    #[inline]
    pub fn one_way(&self) -> bool {
        self.value(Tags::ONE_WAY).is_some_and(|v| v == "yes")
    }

    #[inline]
    pub fn is_special(&self) -> bool {
        self.0.contains_key(Tags::SPECIAL)
    }
}

impl Deref for Tags {
    type Target = FxHashMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<K, V> FromIterator<(K, V)> for Tags
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Tags(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Editing history of an element, carried through conflation untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub version: i64,
    pub changeset: i64,
    pub timestamp: Option<DateTime<Utc>>,
    pub user: String,
    pub uid: i64,
    pub visible: bool,
}

impl Default for Provenance {
    fn default() -> Self {
        Self {
            version: 0,
            changeset: 0,
            timestamp: None,
            user: String::new(),
            uid: 0,
            visible: true,
        }
    }
}

/// Attributes shared by every element variant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementMeta {
    pub tags: Tags,
    pub provenance: Provenance,

    /// Positional uncertainty, in meters.
    pub circular_error: Option<f64>,
}

impl ElementMeta {
    pub fn with_tags(tags: Tags) -> Self {
        Self {
            tags,
            ..Self::default()
        }
    }
}
