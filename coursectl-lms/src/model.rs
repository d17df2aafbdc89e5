//! JSON:API documents returned by the LMS and the `Course` card built from them

use std::collections::HashMap;

use coursectl_core::Cursor;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Filter key carrying learning object types
pub const LO_TYPES_FILTER: &str = "loTypes";

/// Every learning object type the catalog lists, in display order
pub const LO_TYPES: [&str; 4] = ["course", "learningProgram", "certification", "jobAid"];

/// Resource type of catalog entries
pub const LEARNING_OBJECT: &str = "learningObject";

/// Resource type of a learning object's scheduled instance
pub const LEARNING_OBJECT_INSTANCE: &str = "learningObjectInstance";

/// Resource type of search hits, which point at a learning object via `model`
pub const SEARCH_RESULT: &str = "searchResult";

/// Query parameter in `links.next` that carries the continuation cursor
pub const CURSOR_PARAM: &str = "page[cursor]";

/// Skill references look like `course:1234_5678`; the trailing digits are the skill id
static SKILL_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(\d+)$").expect("valid regex"));

/// A page of resources
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListDocument {
    #[serde(default)]
    pub data: Vec<Resource>,
    #[serde(default)]
    pub included: Vec<Resource>,
    #[serde(default)]
    pub links: Links,
    #[serde(default)]
    pub meta: Meta,
}

/// A single resource
#[derive(Debug, Clone, Deserialize)]
pub struct SingleDocument {
    pub data: Resource,
    #[serde(default)]
    pub included: Vec<Resource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub relationships: HashMap<String, Relationship>,
}

/// Union of the attributes coursectl reads; absent fields stay empty
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Attributes {
    pub name: Option<String>,
    pub lo_type: Option<String>,
    pub lo_format: Option<String>,
    /// Seconds
    pub duration: Option<f64>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub localized_metadata: Vec<LocalizedMetadata>,
    /// Module content type, e.g. `SCORM2004` or `VIDEO`
    pub content_type: Option<String>,
    /// Expected module duration in seconds
    pub desired_duration: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocalizedMetadata {
    pub locale: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub overview: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<Linkage>,
}

/// Resource linkage: to-one or to-many
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    Many(Vec<ResourceRef>),
    One(ResourceRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Relationship {
    pub fn refs(&self) -> &[ResourceRef] {
        match &self.data {
            Some(Linkage::Many(refs)) => refs,
            Some(Linkage::One(one)) => std::slice::from_ref(one),
            None => &[],
        }
    }
}

impl Resource {
    /// References of a named relationship, empty when missing
    pub fn related(&self, name: &str) -> &[ResourceRef] {
        self.relationships
            .get(name)
            .map(Relationship::refs)
            .unwrap_or(&[])
    }

    /// Numeric skill ids referenced by this learning object, in order
    pub fn skill_ids(&self) -> impl Iterator<Item = &str> {
        self.related("skills").iter().filter_map(|r| skill_id(&r.id))
    }
}

/// Extract the skill id from a learning-object skill reference id
pub fn skill_id(reference_id: &str) -> Option<&str> {
    SKILL_ID
        .captures(reference_id)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

impl ListDocument {
    /// Continuation cursor from `links.next`, `None` at the end of results
    pub fn next_cursor(&self) -> Option<Cursor> {
        let next = self.links.next.as_deref()?;
        let cursor = cursor_from_link(next);
        if cursor.is_none() {
            tracing::warn!(link = next, "Next link has no page cursor; treating as last page");
        }
        cursor
    }

    /// Learning objects of this page in order.
    ///
    /// Search hits are swapped for the learning object they point at in
    /// `included`; hits whose target is missing are skipped.
    pub fn learning_objects(&self) -> Vec<&Resource> {
        self.data
            .iter()
            .filter_map(|resource| {
                if resource.kind == LEARNING_OBJECT {
                    return Some(resource);
                }
                if resource.kind == SEARCH_RESULT {
                    let target = resource.related("model").first()?;
                    let found = self
                        .included
                        .iter()
                        .find(|inc| inc.id == target.id && inc.kind == LEARNING_OBJECT);
                    // Dropped rather than rendered from the hit's own attributes,
                    // which carry no learning object fields
                    if found.is_none() {
                        tracing::debug!(id = %resource.id, model = %target.id, "Search hit without included learning object");
                    }
                    return found;
                }
                tracing::debug!(id = %resource.id, kind = %resource.kind, "Skipping non-catalog resource");
                None
            })
            .collect()
    }
}

impl SingleDocument {
    fn find_included(&self, reference: &ResourceRef) -> Option<&Resource> {
        self.included
            .iter()
            .find(|inc| inc.id == reference.id && inc.kind == reference.kind)
    }

    /// Modules of the first instance, in course order.
    ///
    /// Empty when the learning object has no instance or the instance's
    /// `loResources` were not included.
    pub fn modules(&self) -> Vec<Module> {
        let Some(instance_ref) = self.data.related("instances").first() else {
            return Vec::new();
        };
        let Some(instance) = self
            .find_included(instance_ref)
            .filter(|inc| inc.kind == LEARNING_OBJECT_INSTANCE)
        else {
            tracing::debug!(instance = %instance_ref.id, "Instance not included; no modules");
            return Vec::new();
        };

        instance
            .related("loResources")
            .iter()
            .filter_map(|r| self.find_included(r))
            .map(Module::from_resource)
            .collect()
    }

    /// Whether the caller holds an enrollment in this learning object
    pub fn is_enrolled(&self) -> bool {
        !self.data.related("enrollment").is_empty()
    }
}

/// One module (learning object resource) of a course instance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub duration_secs: u64,
}

impl Module {
    pub fn from_resource(resource: &Resource) -> Self {
        let attrs = &resource.attributes;
        let name = attrs
            .localized_metadata
            .first()
            .and_then(|m| m.name.clone())
            .or_else(|| attrs.name.clone())
            .unwrap_or_else(|| "Module".to_string());

        Self {
            id: resource.id.clone(),
            name,
            format: attrs.lo_format.clone(),
            content_type: attrs.content_type.clone(),
            duration_secs: seconds(attrs.desired_duration),
        }
    }
}

/// Everything `coursectl show` prints for one learning object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub enrolled: bool,
    pub modules: Vec<Module>,
}

fn seconds(value: Option<f64>) -> u64 {
    value.filter(|d| *d > 0.0).map(|d| d as u64).unwrap_or(0)
}

/// Read `page[cursor]` out of a next-page link
pub fn cursor_from_link(link: &str) -> Option<Cursor> {
    let url = Url::parse(link).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == CURSOR_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .map(Cursor::new)
}

/// Catalog card: what the view renders for one learning object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub lo_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lo_format: Option<String>,
    pub duration_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

impl Course {
    /// Build a card from a learning object. Skills are filled in separately.
    pub fn from_resource(resource: &Resource) -> Self {
        let attrs = &resource.attributes;
        let metadata = attrs.localized_metadata.first();
        let name = metadata
            .and_then(|m| m.name.clone())
            .or_else(|| attrs.name.clone())
            .unwrap_or_else(|| "Untitled Course".to_string());

        Self {
            id: resource.id.clone(),
            name,
            lo_type: attrs.lo_type.clone().unwrap_or_else(|| "course".to_string()),
            lo_format: attrs.lo_format.clone(),
            duration_secs: seconds(attrs.duration),
            description: metadata.and_then(|m| m.description.clone()).filter(|s| !s.is_empty()),
            overview: metadata.and_then(|m| m.overview.clone()).filter(|s| !s.is_empty()),
            image_url: attrs.image_url.clone().filter(|s| !s.trim().is_empty()),
            tags: attrs.tags.clone(),
            skills: Vec::new(),
            instance_id: resource.related("instances").first().map(|r| r.id.clone()),
        }
    }

    /// Path of the course overview page; falls back to the course id when
    /// there is no instance
    pub fn overview_path(&self) -> String {
        let instance = self.instance_id.as_deref().unwrap_or(&self.id);
        format!(
            "/overview?trainingId={}&trainingInstanceId={}",
            self.id, instance
        )
    }
}
