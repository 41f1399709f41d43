use crate::error::{Result, StoreError};
use crate::selector::Selector;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Canonical entity namespace: `zone/base/name`
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Canon {
    pub zone: Option<String>,
    pub base: Option<String>,
    pub name: String,
}

impl Canon {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            zone: None,
            base: None,
            name: name.into(),
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Parse `name`, `base/name` or `zone/base/name`; `-` marks an absent part
    pub fn parse(canon: &str) -> Result<Self> {
        let part = |s: &str| -> Option<String> {
            match s.trim() {
                "" | "-" => None,
                other => Some(other.to_string()),
            }
        };

        let segments: Vec<&str> = canon.split('/').collect();
        let (zone, base, name) = match segments.as_slice() {
            [name] => (None, None, part(name)),
            [base, name] => (None, part(base), part(name)),
            [zone, base, name] => (part(zone), part(base), part(name)),
            _ => {
                return Err(StoreError::translation(format!(
                    "Invalid entity canon '{}': expected at most zone/base/name",
                    canon
                )))
            }
        };

        let name = name.ok_or_else(|| {
            StoreError::translation(format!("Entity canon '{}' has no name", canon))
        })?;

        Ok(Self { zone, base, name })
    }
}

impl fmt::Display for Canon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.zone.as_deref().unwrap_or("-"),
            self.base.as_deref().unwrap_or("-"),
            self.name
        )
    }
}

/// A logical record exchanged with callers
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub canon: Canon,
    /// Identity of an existing row. Saving an entity with an id updates it.
    pub id: Option<Value>,
    /// Caller-chosen id for a new row. Saving inserts with this id.
    pub new_id: Option<Value>,
    pub fields: Map<String, Value>,
}

impl Entity {
    pub fn new(canon: Canon) -> Self {
        Self {
            canon,
            id: None,
            new_id: None,
            fields: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_new_id(mut self, id: impl Into<Value>) -> Self {
        self.new_id = Some(id.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Build from a JSON object. `id` selects an existing row, `id$` supplies
    /// the id of a new one; every other key is a field.
    pub fn from_json(canon: Canon, value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            StoreError::translation("Entity data must be a JSON object".to_string())
        })?;

        let mut entity = Entity::new(canon);
        for (key, value) in object {
            match key.as_str() {
                "id" if !value.is_null() => entity.id = Some(value.clone()),
                "id" => {}
                "id$" => entity.new_id = Some(value.clone()),
                _ => {
                    entity.fields.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(entity)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Render as `{ "id": ..., field: value, ... }`
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        if let Some(id) = &self.id {
            object.insert("id".to_string(), id.clone());
        }
        for (key, value) in &self.fields {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }
}

/// Sort direction; `1` ascending, `-1` descending in document form
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Literal SQL executed as-is, with positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct NativeQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl NativeQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }
}

/// Query descriptor: a selector plus shaping modifiers
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub selector: Selector,
    pub sort: Vec<(String, SortDirection)>,
    /// `None` or `Some(0)` means unlimited
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    /// Projection; `None` selects every column
    pub fields: Option<Vec<String>>,
    /// Opaque id list, AND-ed with the selector
    pub ids: Option<Vec<Value>>,
    /// Remove every matching row instead of at most one
    pub all: bool,
    pub native: Option<NativeQuery>,
}

impl Default for Query {
    fn default() -> Self {
        Self::new(Selector::All)
    }
}

impl Query {
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            sort: Vec::new(),
            limit: None,
            skip: None,
            fields: None,
            ids: None,
            all: false,
            native: None,
        }
    }

    /// Direct id lookup
    pub fn by_id(id: impl Into<Value>) -> Self {
        Self::new(Selector::Ids(vec![id.into()]))
    }

    pub fn native(native: NativeQuery) -> Self {
        Self {
            native: Some(native),
            ..Self::default()
        }
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn ids<I, V>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn all(mut self) -> Self {
        self.all = true;
        self
    }

    /// Effective limit, folding `0` into "unlimited"
    pub fn effective_limit(&self) -> Option<u64> {
        self.limit.filter(|l| *l > 0)
    }

    /// Effective offset, folding `0` into "none"
    pub fn effective_skip(&self) -> Option<u64> {
        self.skip.filter(|s| *s > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canon_parse() {
        let canon = Canon::parse("zen/moon/bar").unwrap();
        assert_eq!(canon.zone.as_deref(), Some("zen"));
        assert_eq!(canon.base.as_deref(), Some("moon"));
        assert_eq!(canon.name, "bar");

        let canon = Canon::parse("-/moon/bar").unwrap();
        assert!(canon.zone.is_none());
        assert_eq!(canon.base.as_deref(), Some("moon"));

        let canon = Canon::parse("foo").unwrap();
        assert_eq!(canon, Canon::new("foo"));
        assert_eq!(canon.to_string(), "-/-/foo");

        assert!(Canon::parse("a/b/c/d").is_err());
        assert!(Canon::parse("zen/moon/-").is_err());
    }

    #[test]
    fn test_entity_from_json() {
        let entity = Entity::from_json(
            Canon::new("foo"),
            &json!({"id$": "foo1", "p1": "v1", "p2": 2}),
        )
        .unwrap();
        assert!(entity.id.is_none());
        assert_eq!(entity.new_id, Some(json!("foo1")));
        assert_eq!(entity.get("p1"), Some(&json!("v1")));
        assert_eq!(entity.fields.len(), 2);

        let entity = Entity::from_json(Canon::new("foo"), &json!({"id": "foo2"})).unwrap();
        assert_eq!(entity.id, Some(json!("foo2")));

        assert!(Entity::from_json(Canon::new("foo"), &json!([1, 2])).is_err());
    }

    #[test]
    fn test_entity_to_json_keeps_field_order() {
        let entity = Entity::new(Canon::new("foo"))
            .with_id("a1")
            .with_field("zeta", 1)
            .with_field("alpha", 2);
        let rendered = serde_json::to_string(&entity.to_json()).unwrap();
        assert_eq!(rendered, r#"{"id":"a1","zeta":1,"alpha":2}"#);
    }

    #[test]
    fn test_effective_limit_and_skip() {
        let query = Query::default().limit(0).skip(0);
        assert_eq!(query.effective_limit(), None);
        assert_eq!(query.effective_skip(), None);

        let query = Query::default().limit(5).skip(2);
        assert_eq!(query.effective_limit(), Some(5));
        assert_eq!(query.effective_skip(), Some(2));
    }
}
