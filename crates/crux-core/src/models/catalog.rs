// ABOUTME: Exercise, template, and session catalog records read from the authored JSON catalog
// ABOUTME: Session definitions accept both the flat `session_name` layout and the nested `context` layout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use super::common::Location;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Free-form prescription fields (`sets`, `reps`, `work_seconds`, `load_kg`, ...)
pub type Prescription = Map<String, Value>;

/// Lowercased string lists that also accept a bare string or `null`
pub mod string_list {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    fn normalize(raw: Option<OneOrMany>) -> Vec<String> {
        let items = match raw {
            None => Vec::new(),
            Some(OneOrMany::One(s)) => vec![s],
            Some(OneOrMany::Many(v)) => v,
        };
        items
            .into_iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Deserialize into a possibly empty list
    ///
    /// # Errors
    /// Returns an error when the value is neither a string nor a list of strings
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<OneOrMany>::deserialize(deserializer).map(normalize)
    }

    /// Deserialize keeping the difference between absent and empty
    ///
    /// # Errors
    /// Returns an error when the value is neither a string nor a list of strings
    pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<OneOrMany>::deserialize(deserializer)?.map(|raw| normalize(Some(raw))))
    }
}

const fn default_fatigue_cost() -> u32 {
    5
}

/// How the working load of an exercise is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadModel {
    /// Bodyweight plus added load
    TotalLoad,
    /// Added load only
    ExternalLoad,
    /// Climbing grade relative to a benchmark
    GradeRelative,
    /// No external load
    BodyweightOnly,
}

/// Setup attributes scored by the resolver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseAttributes {
    /// Edge depth in millimetres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_mm: Option<u32>,
    /// Grip type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grip: Option<String>,
    /// Fraction of max total load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity_pct: Option<f64>,
    /// Remaining attributes
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One catalog exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    /// Stable id
    #[serde(alias = "exercise_id")]
    pub id: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Roles this exercise can fill (`main`, `warmup`, `cooldown`, ...)
    #[serde(default, alias = "roles", deserialize_with = "string_list::deserialize")]
    pub role: Vec<String>,
    /// Training domains
    #[serde(default, deserialize_with = "string_list::deserialize")]
    pub domain: Vec<String>,
    /// Movement patterns
    #[serde(default, alias = "movement", deserialize_with = "string_list::deserialize")]
    pub pattern: Vec<String>,
    /// Intensity level label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity_level: Option<String>,
    /// Fatigue cost, 1..=10
    #[serde(default = "default_fatigue_cost")]
    pub fatigue_cost: u32,
    /// Recency grouping label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recency_group: Option<String>,
    /// Every listed item must be available
    #[serde(default, deserialize_with = "string_list::deserialize")]
    pub equipment_required: Vec<String>,
    /// At least one listed item must be available
    #[serde(default, deserialize_with = "string_list::deserialize")]
    pub equipment_required_any: Vec<String>,
    /// Locations where the exercise can be done
    #[serde(default)]
    pub location_allowed: Vec<Location>,
    /// Limitation flags that rule the exercise out
    #[serde(default, deserialize_with = "string_list::deserialize")]
    pub contraindications: Vec<String>,
    /// Default prescription
    #[serde(default, alias = "defaults")]
    pub prescription_defaults: Prescription,
    /// Setup attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<ExerciseAttributes>,
    /// Load expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_model: Option<LoadModel>,
    /// Stress tags, map or list
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub stress_tags: Value,
    /// Descriptive fields (description, cues, video_url, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Exercise {
    /// Whether the exercise can fill any of `roles`
    #[must_use]
    pub fn has_any_role(&self, roles: &[String]) -> bool {
        self.role.iter().any(|r| roles.contains(r))
    }

    /// Whether the exercise belongs to any of `domains`
    #[must_use]
    pub fn has_any_domain(&self, domains: &[String]) -> bool {
        self.domain.iter().any(|d| domains.contains(d))
    }
}

/// One filter set over exercise fields; empty lists do not constrain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    /// Accepted roles
    #[serde(default, deserialize_with = "string_list::deserialize_opt", skip_serializing_if = "Option::is_none")]
    pub role: Option<Vec<String>>,
    /// Accepted domains
    #[serde(default, deserialize_with = "string_list::deserialize", skip_serializing_if = "Vec::is_empty")]
    pub domain: Vec<String>,
    /// Accepted patterns
    #[serde(default, deserialize_with = "string_list::deserialize", skip_serializing_if = "Vec::is_empty")]
    pub pattern: Vec<String>,
    /// Accepted intensity levels
    #[serde(
        default,
        alias = "intensity",
        deserialize_with = "string_list::deserialize",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub intensity_level: Vec<String>,
    /// Exercise must require at least one of these
    #[serde(default, deserialize_with = "string_list::deserialize", skip_serializing_if = "Vec::is_empty")]
    pub equipment_any: Vec<String>,
    /// Exercise must require all of these
    #[serde(default, deserialize_with = "string_list::deserialize", skip_serializing_if = "Vec::is_empty")]
    pub equipment_all: Vec<String>,
}

/// Wrapper holding a filter set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStage {
    /// Filters
    #[serde(default)]
    pub filters: FilterSet,
}

/// Dynamic selection rules of a block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Filters tried first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<FilterStage>,
    /// Filters tried in order when the primary set selects nothing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<FilterStage>,
}

fn default_block_type() -> String {
    "main".to_owned()
}

const fn default_true() -> bool {
    true
}

/// Instruction fields copied verbatim into instruction-only output
pub const INSTRUCTION_KEYS: [&str; 4] = ["duration_min_range", "options", "focus", "notes"];

/// A named subsection of a template or an inline session module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Block id
    #[serde(default, alias = "id", skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    /// Block type (`warmup`, `main`, `core`, `cooldown`)
    #[serde(rename = "type", alias = "category", default = "default_block_type")]
    pub block_type: String,
    /// `instruction_only` marks blocks that never select exercises
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Explicit exercise, bypasses filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_id: Option<String>,
    /// Required roles for dynamic selection
    #[serde(default, deserialize_with = "string_list::deserialize_opt", skip_serializing_if = "Option::is_none")]
    pub role: Option<Vec<String>>,
    /// Domain filter
    #[serde(default, deserialize_with = "string_list::deserialize", skip_serializing_if = "Vec::is_empty")]
    pub domain: Vec<String>,
    /// Pattern filter
    #[serde(default, deserialize_with = "string_list::deserialize", skip_serializing_if = "Vec::is_empty")]
    pub pattern: Vec<String>,
    /// Primary and fallback filter sets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
    /// Block-level prescription overlay
    #[serde(default, alias = "params", skip_serializing_if = "Map::is_empty")]
    pub prescription: Prescription,
    /// Whether a failure here makes the session partial
    #[serde(default = "default_true")]
    pub required: bool,
    /// Instruction text and other authored fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Block {
    /// Whether the block only carries instructions
    #[must_use]
    pub fn is_instruction_only(&self) -> bool {
        self.mode
            .as_deref()
            .is_some_and(|m| m.trim().eq_ignore_ascii_case("instruction_only"))
    }

    /// Filter set tried first: `selection.primary` when authored, else the block's own fields
    #[must_use]
    pub fn primary_filters(&self) -> FilterSet {
        if let Some(stage) = self.selection.as_ref().and_then(|s| s.primary.as_ref()) {
            let mut filters = stage.filters.clone();
            if filters.role.is_none() {
                filters.role.clone_from(&self.role);
            }
            if filters.domain.is_empty() {
                filters.domain.clone_from(&self.domain);
            }
            if filters.pattern.is_empty() {
                filters.pattern.clone_from(&self.pattern);
            }
            return filters;
        }
        FilterSet {
            role: self.role.clone(),
            domain: self.domain.clone(),
            pattern: self.pattern.clone(),
            ..FilterSet::default()
        }
    }

    /// Fallback filter sets in declared order, inheriting the primary role when absent
    #[must_use]
    pub fn fallback_filters(&self) -> Vec<FilterSet> {
        let primary_role = self.primary_filters().role;
        self.selection
            .as_ref()
            .map(|s| {
                s.fallbacks
                    .iter()
                    .map(|stage| {
                        let mut filters = stage.filters.clone();
                        if filters.role.is_none() {
                            filters.role.clone_from(&primary_role);
                        }
                        filters
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Instruction fields for instruction-only output
    #[must_use]
    pub fn instructions(&self) -> Map<String, Value> {
        let mut out: Map<String, Value> = INSTRUCTION_KEYS
            .iter()
            .filter_map(|k| self.extra.get(*k).map(|v| ((*k).to_owned(), v.clone())))
            .collect();
        if !self.prescription.is_empty() {
            out.insert(
                "prescription".to_owned(),
                Value::Object(self.prescription.clone()),
            );
        }
        out
    }
}

fn default_version() -> String {
    "v1".to_owned()
}

/// An ordered list of blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Template id
    #[serde(alias = "id")]
    pub template_id: String,
    /// Template version
    #[serde(default = "default_version")]
    pub version: String,
    /// Blocks in order
    #[serde(alias = "components", alias = "steps")]
    pub blocks: Vec<Block>,
    /// Descriptive fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reference from a session to a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
    /// Template id
    pub template_id: String,
    /// Template version
    #[serde(default = "default_version")]
    pub version: String,
    /// Whether a failed block of this template makes the session partial
    #[serde(default = "default_true")]
    pub required: bool,
}

/// One session module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionModule {
    /// Bare template id
    Name(String),
    /// Template reference
    Template(TemplateRef),
    /// Block authored inline in the session
    Inline(Block),
}

impl SessionModule {
    /// Template reference for `Name` and `Template` modules
    #[must_use]
    pub fn template_ref(&self) -> Option<TemplateRef> {
        match self {
            Self::Name(id) => Some(TemplateRef {
                template_id: id.clone(),
                version: default_version(),
                required: true,
            }),
            Self::Template(r) => Some(r.clone()),
            Self::Inline(_) => None,
        }
    }
}

/// Session metadata as authored in the old nested layout
#[derive(Debug, Clone, Default, Deserialize)]
struct RawContext {
    #[serde(default, alias = "place")]
    location: Option<Location>,
    #[serde(default)]
    gym_id: Option<String>,
    #[serde(default)]
    intent: Option<String>,
}

/// Union of both on-disk session layouts
#[derive(Debug, Clone, Deserialize)]
struct RawSession {
    #[serde(default, alias = "id")]
    session_id: Option<String>,
    #[serde(default, alias = "name")]
    session_name: Option<String>,
    #[serde(default, alias = "session_version")]
    version: Option<String>,
    #[serde(default)]
    session_type: Option<String>,
    #[serde(default)]
    location: Option<Location>,
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    tags: Value,
    #[serde(default)]
    context: Option<RawContext>,
    #[serde(default, alias = "templates", alias = "components")]
    modules: Vec<SessionModule>,
}

impl From<RawSession> for SessionDefinition {
    fn from(raw: RawSession) -> Self {
        let context = raw.context.unwrap_or_default();
        Self {
            session_id: raw.session_id.unwrap_or_default(),
            session_name: raw.session_name,
            version: raw.version.unwrap_or_else(default_version),
            session_type: raw.session_type,
            location: raw.location.or(context.location),
            gym_id: context.gym_id,
            intent: raw.intent.or(context.intent),
            tags: raw.tags,
            modules: raw.modules,
        }
    }
}

/// A session definition with its ordered modules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSession")]
pub struct SessionDefinition {
    /// Session id; the loader fills it from the file stem when absent
    pub session_id: String,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
    /// Version
    pub version: String,
    /// Session type label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_type: Option<String>,
    /// Default location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Default gym
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gym_id: Option<String>,
    /// Training intent (`strength`, `power`, `technique`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Tags, map of flags or list of names
    #[serde(skip_serializing_if = "Value::is_null")]
    pub tags: Value,
    /// Ordered modules
    pub modules: Vec<SessionModule>,
}

impl SessionDefinition {
    /// Whether a tag is set, in either map or list form
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        tag_is_set(&self.tags, tag)
    }
}

/// Whether `tag` is truthy in a tag map or present in a tag list
#[must_use]
pub fn tag_is_set(tags: &Value, tag: &str) -> bool {
    match tags {
        Value::Object(map) => map.get(tag).is_some_and(|v| match v {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Number(n) => n.as_f64().is_some_and(|x| x.abs() > f64::EPSILON),
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
        }),
        Value::Array(items) => items
            .iter()
            .any(|v| v.as_str().is_some_and(|s| s.eq_ignore_ascii_case(tag))),
        _ => false,
    }
}

/// Listing entry for `GET /catalog/sessions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session id
    pub id: String,
    /// Display name (falls back to the id)
    pub name: String,
    /// Session type (`unknown` when absent)
    #[serde(rename = "type")]
    pub session_type: String,
    /// Location (`any` when absent)
    pub location: String,
    /// Tags
    pub tags: Value,
}

/// The immutable catalog: exercises, templates, and sessions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    exercises: Vec<Exercise>,
    templates: BTreeMap<String, Template>,
    sessions: BTreeMap<String, SessionDefinition>,
}

impl Catalog {
    /// Build from loaded parts; exercises are sorted by id
    #[must_use]
    pub fn new(
        mut exercises: Vec<Exercise>,
        templates: Vec<Template>,
        sessions: Vec<SessionDefinition>,
    ) -> Self {
        exercises.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            exercises,
            templates: templates
                .into_iter()
                .map(|t| (t.template_id.clone(), t))
                .collect(),
            sessions: sessions
                .into_iter()
                .map(|s| (s.session_id.clone(), s))
                .collect(),
        }
    }

    /// All exercises sorted by id
    #[must_use]
    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    /// Exercise by id, case-insensitive
    #[must_use]
    pub fn exercise(&self, id: &str) -> Option<&Exercise> {
        let wanted = id.trim().to_lowercase();
        self.exercises.iter().find(|e| e.id.to_lowercase() == wanted)
    }

    /// Template by id
    #[must_use]
    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    /// All templates sorted by id
    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }

    /// Session by id
    #[must_use]
    pub fn session(&self, id: &str) -> Option<&SessionDefinition> {
        self.sessions.get(id)
    }

    /// All sessions sorted by id
    pub fn sessions(&self) -> impl Iterator<Item = &SessionDefinition> {
        self.sessions.values()
    }

    /// Listing entries for every session, sorted by id
    #[must_use]
    pub fn session_summaries(&self) -> Vec<SessionSummary> {
        self.sessions
            .values()
            .map(|s| SessionSummary {
                id: s.session_id.clone(),
                name: s
                    .session_name
                    .clone()
                    .unwrap_or_else(|| s.session_id.clone()),
                session_type: s
                    .session_type
                    .clone()
                    .unwrap_or_else(|| "unknown".to_owned()),
                location: s
                    .location
                    .map_or_else(|| "any".to_owned(), |l| l.as_str().to_owned()),
                tags: s.tags.clone(),
            })
            .collect()
    }
}

/// Accept `[..]`, `{"exercises": [..]}`, `{"items": [..]}` or `{"data": [..]}`
///
/// # Errors
/// Returns an error when no exercise list is found or an entry is malformed
pub fn exercises_from_value(value: Value) -> Result<Vec<Exercise>, serde_json::Error> {
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => ["exercises", "items", "data"]
            .iter()
            .find_map(|k| match map.remove(*k) {
                Some(v @ Value::Array(_)) => Some(v),
                _ => None,
            })
            .unwrap_or(Value::Null),
        other => other,
    };
    Vec::<Exercise>::deserialize(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_both_session_layouts() {
        let flat: SessionDefinition = serde_json::from_value(json!({
            "session_name": "Strength long",
            "location": "gym",
            "intent": "strength",
            "tags": {"hard": true, "finger": true},
            "modules": ["warmup_climbing", {"template_id": "finger_max", "version": "v1"}]
        }))
        .unwrap();
        assert_eq!(flat.location, Some(Location::Gym));
        assert!(flat.has_tag("finger"));
        assert_eq!(flat.modules.len(), 2);

        let nested: SessionDefinition = serde_json::from_value(json!({
            "session_id": "legacy",
            "version": "v2",
            "context": {"location": "home", "gym_id": null},
            "modules": [{"id": "inline_core", "role": "core", "domain": ["core"]}]
        }))
        .unwrap();
        assert_eq!(nested.location, Some(Location::Home));
        assert_eq!(nested.version, "v2");
        assert!(matches!(nested.modules[0], SessionModule::Inline(_)));
    }

    #[test]
    fn test_exercise_lists_are_lowercased() {
        let ex: Exercise = serde_json::from_value(json!({
            "id": "max_hang_5s",
            "roles": "Main",
            "domain": ["Finger_Strength"],
            "location_allowed": ["home", "gym"]
        }))
        .unwrap();
        assert_eq!(ex.role, vec!["main"]);
        assert_eq!(ex.domain, vec!["finger_strength"]);
        assert_eq!(ex.fatigue_cost, 5);
    }

    #[test]
    fn test_primary_filters_fall_back_to_block_fields() {
        let block: Block = serde_json::from_value(json!({
            "block_id": "main",
            "role": ["main"],
            "domain": ["finger_strength"],
            "selection": {"fallbacks": [{"filters": {"domain": ["pulling_strength"]}}]}
        }))
        .unwrap();
        let primary = block.primary_filters();
        assert_eq!(primary.role.as_deref(), Some(&["main".to_owned()][..]));
        let fallbacks = block.fallback_filters();
        assert_eq!(fallbacks[0].role, primary.role);
        assert!(block.required);
    }

    #[test]
    fn test_exercise_list_shapes() {
        let wrapped = json!({"version": "2.1", "exercises": [{"id": "a"}]});
        assert_eq!(exercises_from_value(wrapped).unwrap().len(), 1);
        assert!(exercises_from_value(json!({"nothing": 1})).is_err());
    }
}
