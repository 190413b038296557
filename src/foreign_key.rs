//! Choices for foreign key fields
//!
//! A [`ForeignKey`] points at another master file through two `[*]` paths:
//! one selecting the ids (`/data/[*]/itemGuid`) and one selecting what to show
//! for each id (`/data/[*]/name`). Both are expanded over that file's data and
//! paired by the array positions they went through.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::schema::ForeignKey;

/// Array positions taken to reach a value, keyed by the array's path
/// (`data`, `categories/1/items`; `root` for a top-level array)
pub type Indices = BTreeMap<String, usize>;

/// One selectable record for a foreign key field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignKeyOption {
    /// Value stored in the referencing field
    pub id: Value,
    /// Text shown for the record; hierarchy labels are prefixed with ` > `
    pub display: String,
    /// Concrete pointer of the id (`/data/0/itemGuid`)
    pub path: String,
    pub indices: Indices,
    /// Labels of the enclosing records, outermost first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hierarchy: Vec<String>,
    /// Outermost hierarchy label, for grouping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// Resolves a foreign key against the data of the file it points to
pub struct ForeignKeyResolver<'a> {
    data: &'a Value,
    key: &'a ForeignKey,
}

impl<'a> ForeignKeyResolver<'a> {
    pub fn new(data: &'a Value, key: &'a ForeignKey) -> Self {
        Self { data, key }
    }

    /// Every id paired with its display text, in data order.
    ///
    /// Ids without a display value at the same positions are left out.
    pub fn options(&self) -> Vec<ForeignKeyOption> {
        let hierarchy: Vec<Vec<Segment>> = self
            .key
            .hierarchy_display_paths
            .iter()
            .map(|path| parse_path(path))
            .collect();

        let ids = expand(self.data, &parse_path(&self.key.foreign_key_id_path), &[]);
        let displays = expand(self.data, &parse_path(&self.key.display_element_path), &hierarchy);

        ids.into_iter()
            .filter_map(|id| {
                let display = displays.iter().find(|d| d.indices == id.indices)?;
                Some(pair(id, display))
            })
            .collect()
    }

    /// Display text of the record whose id is `id`
    pub fn display_for(&self, id: &Value) -> Option<String> {
        self.find(id).map(|option| option.display)
    }

    /// Array positions of the record whose id is `id`
    pub fn indices_for(&self, id: &Value) -> Option<Indices> {
        self.find(id).map(|option| option.indices)
    }

    fn find(&self, id: &Value) -> Option<ForeignKeyOption> {
        self.options().into_iter().find(|option| &option.id == id)
    }
}

/// Options of `key` over `data`
pub fn resolve_options(data: &Value, key: &ForeignKey) -> Vec<ForeignKeyOption> {
    ForeignKeyResolver::new(data, key).options()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// `name`
    Key(String),
    /// `name/[*]`: every element of the array at `name`
    Each(String),
    /// Leading `[*]`: every element of the array being walked
    EachHere,
}

fn parse_path(path: &str) -> Vec<Segment> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    trimmed
        .replace("/[*]", "[*]")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if segment == "[*]" {
                Segment::EachHere
            } else if let Some(name) = segment.strip_suffix("[*]") {
                Segment::Each(name.to_string())
            } else {
                Segment::Key(segment.to_string())
            }
        })
        .collect()
}

/// A value reached by expanding a path
struct Hit<'v> {
    value: &'v Value,
    path: Vec<String>,
    indices: Indices,
    labels: Vec<String>,
}

fn expand<'v>(data: &'v Value, segments: &[Segment], hierarchy: &[Vec<Segment>]) -> Vec<Hit<'v>> {
    let mut hits = Vec::new();
    let start = Hit {
        value: data,
        path: Vec::new(),
        indices: Indices::new(),
        labels: Vec::new(),
    };
    walk(start, segments, 0, hierarchy, &mut hits);
    hits
}

fn walk<'v>(hit: Hit<'v>, segments: &[Segment], depth: usize, hierarchy: &[Vec<Segment>], out: &mut Vec<Hit<'v>>) {
    let Some(segment) = segments.get(depth) else {
        out.push(hit);
        return;
    };

    let (items, array_path) = match segment {
        Segment::Key(key) => {
            let next = match hit.value {
                Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
                other => other.get(key.as_str()),
            };
            if let Some(next) = next {
                let mut path = hit.path;
                path.push(key.clone());
                let child = Hit {
                    value: next,
                    path,
                    indices: hit.indices,
                    labels: hit.labels,
                };
                walk(child, segments, depth + 1, hierarchy, out);
            }
            return;
        }
        Segment::Each(name) => {
            let Some(Value::Array(items)) = hit.value.get(name.as_str()) else {
                return;
            };
            let mut path = hit.path.clone();
            path.push(name.clone());
            (items, path)
        }
        Segment::EachHere => {
            let Value::Array(items) = hit.value else {
                return;
            };
            (items, hit.path.clone())
        }
    };

    let index_key = if array_path.is_empty() {
        "root".to_string()
    } else {
        array_path.join("/")
    };

    for (index, item) in items.iter().enumerate() {
        let mut path = array_path.clone();
        path.push(index.to_string());

        let mut indices = hit.indices.clone();
        indices.insert(index_key.clone(), index);

        let mut labels = hit.labels.clone();
        labels.extend(hierarchy_labels(item, segments, depth, hierarchy));

        let element = Hit {
            value: item,
            path,
            indices,
            labels,
        };
        walk(element, segments, depth + 1, hierarchy, out);
    }
}

/// Labels of `item` for hierarchy paths ending one key below the array just expanded
fn hierarchy_labels(item: &Value, segments: &[Segment], depth: usize, hierarchy: &[Vec<Segment>]) -> Vec<String> {
    hierarchy
        .iter()
        .filter(|path| path.len() == depth + 2 && path[..=depth] == segments[..=depth])
        .filter_map(|path| match path.last() {
            Some(Segment::Key(key)) => item.get(key.as_str()).map(display_text),
            _ => None,
        })
        .collect()
}

fn pair(id: Hit<'_>, display: &Hit<'_>) -> ForeignKeyOption {
    let text = display_text(display.value);
    let (shown, group) = match display.labels.first() {
        Some(group) => {
            let mut parts = display.labels.clone();
            parts.push(text);
            (parts.join(" > "), Some(group.clone()))
        }
        None => (text, None),
    };

    ForeignKeyOption {
        id: id.value.clone(),
        display: shown,
        path: format!("/{}", id.path.join("/")),
        indices: id.indices,
        hierarchy: display.labels.clone(),
        group,
    }
}

fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
