//! Lock resources and their canonical form.
//!
//! A procedure describes what it needs locked as a list of `LockResource`s.
//! `filter_resources` turns that list into the ordered, deduplicated set of
//! names the lock service sees. The rules are fixed: procedures choose the
//! resources, never how they are cleaned.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Something that knows which lock name represents it.
///
/// Implement on domain entities (an order, an account) so procedures can
/// return the entity itself as a lock resource.
pub trait LockEntity: Send + Sync {
    /// The lock name for this entity.
    fn retrieve_lock_resource(&self) -> String;
}

/// One entry of a procedure's lock resource list, before filtering.
#[derive(Clone)]
pub enum LockResource {
    Name(String),
    Int(i64),
    Bool(bool),
    Null,
    /// Nested resources, flattened in place. Empty lists are dropped.
    List(Vec<LockResource>),
    Entity(Arc<dyn LockEntity>),
}

impl LockResource {
    /// Wrap a domain entity.
    pub fn entity<E: LockEntity + 'static>(entity: E) -> Self {
        LockResource::Entity(Arc::new(entity))
    }
}

impl fmt::Debug for LockResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockResource::Name(name) => f.debug_tuple("Name").field(name).finish(),
            LockResource::Int(n) => f.debug_tuple("Int").field(n).finish(),
            LockResource::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            LockResource::Null => f.write_str("Null"),
            LockResource::List(items) => f.debug_tuple("List").field(items).finish(),
            LockResource::Entity(entity) => f
                .debug_tuple("Entity")
                .field(&entity.retrieve_lock_resource())
                .finish(),
        }
    }
}

impl From<&str> for LockResource {
    fn from(name: &str) -> Self {
        LockResource::Name(name.to_string())
    }
}

impl From<String> for LockResource {
    fn from(name: String) -> Self {
        LockResource::Name(name)
    }
}

impl From<i64> for LockResource {
    fn from(n: i64) -> Self {
        LockResource::Int(n)
    }
}

impl From<bool> for LockResource {
    fn from(b: bool) -> Self {
        LockResource::Bool(b)
    }
}

impl From<Arc<dyn LockEntity>> for LockResource {
    fn from(entity: Arc<dyn LockEntity>) -> Self {
        LockResource::Entity(entity)
    }
}

impl<T: Into<LockResource>> From<Option<T>> for LockResource {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(LockResource::Null)
    }
}

impl<T: Into<LockResource>> From<Vec<T>> for LockResource {
    fn from(items: Vec<T>) -> Self {
        LockResource::List(items.into_iter().map(Into::into).collect())
    }
}

/// JSON input fields can be used directly as resources.
impl From<Value> for LockResource {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => LockResource::Null,
            Value::Bool(b) => LockResource::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => LockResource::Int(i),
                None => LockResource::Name(n.to_string()),
            },
            Value::String(s) => LockResource::Name(s),
            Value::Array(items) => items.into(),
            Value::Object(map) if map.is_empty() => LockResource::List(Vec::new()),
            Value::Object(map) => LockResource::Name(Value::Object(map).to_string()),
        }
    }
}

/// Reduce a resource list to the names to lock.
///
/// Drops absent entries (`""`, `"0"`, `0`, `false`, `Null`, empty lists),
/// resolves entities to their lock name, renders `true` as `"1"` and
/// integers in decimal, flattens lists, and keeps only the first
/// occurrence of each name.
pub fn filter_resources<I>(resources: I) -> Vec<String>
where
    I: IntoIterator<Item = LockResource>,
{
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for resource in resources {
        collect(resource, &mut seen, &mut names);
    }
    names
}

fn collect(resource: LockResource, seen: &mut HashSet<String>, names: &mut Vec<String>) {
    let name = match resource {
        LockResource::Name(name) => name,
        LockResource::Int(n) => n.to_string(),
        LockResource::Bool(true) => "1".to_string(),
        LockResource::Bool(false) | LockResource::Null => return,
        LockResource::List(items) => {
            for item in items {
                collect(item, seen, names);
            }
            return;
        }
        LockResource::Entity(entity) => entity.retrieve_lock_resource(),
    };

    if name.is_empty() || name == "0" {
        return;
    }
    if seen.insert(name.clone()) {
        names.push(name);
    }
}

/// Stable lock name for a type: generic arguments are dropped and every
/// `::` becomes `_`.
///
/// `canonical_name("shop::orders::CreateOrder")` is `"shop_orders_CreateOrder"`,
/// and so is `canonical_name("shop::orders::CreateOrder<alloc::string::String>")`.
pub fn canonical_name(type_name: &str) -> String {
    let path = match type_name.find('<') {
        Some(generics) => &type_name[..generics],
        None => type_name,
    };
    path.replace("::", "_")
}
