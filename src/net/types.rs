//! Wire DTOs shared by the session core and feature modules.
//!
//! DESIGN
//! ======
//! `Profile` is both the persisted identity snapshot and the in-memory session
//! user, so its decoding is lenient in exactly the places persisted data can
//! drift (missing `id`, missing `role`) and strict everywhere else.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Role label used when the backend provides none.
pub const DEFAULT_ROLE: &str = "user";

/// Denormalized identity snapshot of the signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Primary identity. `0` when the source omitted it or sent `null`.
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl Profile {
    /// Placeholder used when the post-login profile lookup fails.
    ///
    /// Its `id` is `0`, which never passes [`Profile::has_valid_id`].
    #[must_use]
    pub fn placeholder(username: &str) -> Self {
        Self { id: 0, name: username.to_owned(), role: DEFAULT_ROLE.to_owned(), is_staff: false, groups: Vec::new() }
    }

    #[must_use]
    pub fn has_valid_id(&self) -> bool {
        self.id > 0
    }

    /// Whether this user authored a record owned by `owner_id`.
    #[must_use]
    pub fn is_requester(&self, owner_id: i64) -> bool {
        self.has_valid_id() && self.id == owner_id
    }

    #[must_use]
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

fn default_role() -> String {
    DEFAULT_ROLE.to_owned()
}

/// Row returned by the user-listing endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default, deserialize_with = "deserialize_groups")]
    pub groups: Vec<String>,
}

impl UserRecord {
    /// `"First Last"` when both parts are non-blank, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let first = self.first_name.trim();
        let last = self.last_name.trim();
        if first.is_empty() || last.is_empty() {
            return self.username.clone();
        }
        format!("{first} {last}")
    }

    #[must_use]
    pub fn into_profile(self) -> Profile {
        let name = self.display_name();
        let role = self
            .role
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(default_role);
        Profile { id: self.id, name, role, is_staff: self.is_staff, groups: self.groups }
    }
}

/// Envelope used by every list endpoint. Only `results` is guaranteed to be
/// meaningful; some endpoints answer with `{"results": [...]}` alone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    #[must_use]
    pub fn empty() -> Self {
        Self { count: 0, next: None, previous: None, results: Vec::new() }
    }

    /// Wrap a complete result set as a single page.
    #[must_use]
    pub fn single(results: Vec<T>) -> Self {
        Self { count: results.len() as u64, next: None, previous: None, results }
    }

    /// Number of pages needed to show `count` rows at `page_size` per page.
    #[must_use]
    pub fn page_count(&self, page_size: u32) -> u64 {
        if page_size == 0 {
            return 0;
        }
        self.count.div_ceil(u64::from(page_size))
    }
}

/// Page parameters re-derived by list views instead of following `next`/`previous`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1, page_size: 10 }
    }
}

impl PageQuery {
    #[must_use]
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page: page.max(1), page_size: page_size.max(1) }
    }

    /// Append `page`/`page_size` to `path`, keeping any existing query string.
    #[must_use]
    pub fn apply(&self, path: &str) -> String {
        let sep = if path.contains('?') { '&' } else { '?' };
        format!("{path}{sep}page={}&page_size={}", self.page, self.page_size)
    }
}

/// Body sent to the token endpoint.
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Success body of the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access: String,
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(0),
        serde_json::Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| D::Error::custom("expected integer id")),
        _ => Err(D::Error::custom("expected integer id")),
    }
}

/// Group names from strings, numeric ids or `{name}` / `{id}` objects.
/// Entries that carry neither are skipped; membership is advisory and must
/// never fail the row.
fn deserialize_groups<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let serde_json::Value::Array(values) = serde_json::Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(values.into_iter().filter_map(group_name).collect())
}

fn group_name(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(name) => Some(name),
        serde_json::Value::Number(id) => Some(id.to_string()),
        serde_json::Value::Object(mut obj) => match (obj.remove("name"), obj.remove("id")) {
            (Some(serde_json::Value::String(name)), _) => Some(name),
            (_, Some(serde_json::Value::Number(id))) => Some(id.to_string()),
            _ => None,
        },
        _ => None,
    }
}
