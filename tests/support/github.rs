//! In-memory GitHub double.
//!
//! Implements just enough of the REST API for the relay and guard: `/user`,
//! `/rate_limit`, and the Actions secrets endpoints for repository,
//! environment, and organization scopes. Each scope gets its own sealed-box
//! key pair; written values are unsealed and kept so tests can check what
//! GitHub would have stored.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use crypto_box::aead::OsRng;
use crypto_box::SecretKey;
use reqwest::Method;
use serde_json::{json, Value};

use ghseal::core::cipher;
use ghseal::core::github::{ApiRequest, ApiResponse, Transport};
use ghseal::core::relay::{Scope, SecretMetadata, Visibility};
use ghseal::error::Result;

/// A secret as GitHub would hold it, already unsealed.
#[derive(Debug, Clone)]
pub struct Stored {
    pub value: Vec<u8>,
    pub key_id: String,
    pub visibility: Option<String>,
    pub selected_repository_ids: Vec<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stored {
    pub fn text(&self) -> String {
        String::from_utf8(self.value.clone()).expect("stored value is not utf-8")
    }
}

/// A request the double received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub token: String,
}

struct ScopeKey {
    key_id: String,
    secret: SecretKey,
}

#[derive(Default)]
struct State {
    users: HashMap<String, (String, u64)>,
    keys: HashMap<String, ScopeKey>,
    secrets: HashMap<String, BTreeMap<String, Stored>>,
    requests: Vec<Recorded>,
    next_key_id: u64,
    rate_limited: bool,
    secondary_limited: bool,
    unavailable: bool,
}

/// Fake GitHub REST API.
#[derive(Default)]
pub struct MockGithub {
    state: Mutex<State>,
}

impl MockGithub {
    pub fn new() -> Self {
        let github = Self::default();
        github.add_user(super::TOKEN, super::LOGIN);
        github
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Accept `token` as belonging to `login`.
    pub fn add_user(&self, token: &str, login: &str) {
        let mut state = self.lock();
        let id = 1000 + state.users.len() as u64;
        state.users.insert(token.to_string(), (login.to_string(), id));
    }

    /// Answer every authenticated request with a rate-limited 403.
    pub fn set_rate_limited(&self, limited: bool) {
        self.lock().rate_limited = limited;
    }

    /// Answer every authenticated request with a secondary-limit 403 that
    /// carries no quota headers.
    pub fn set_secondary_limited(&self, limited: bool) {
        self.lock().secondary_limited = limited;
    }

    /// Answer every request with 503.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Replace a scope's key, as GitHub does on rotation.
    pub fn rotate_key(&self, scope: &Scope) -> String {
        let mut state = self.lock();
        let key = new_key(&mut state);
        let key_id = key.key_id.clone();
        state.keys.insert(scope.secrets_path(), key);
        key_id
    }

    /// Current key ID of a scope, creating its key if needed.
    pub fn key_id(&self, scope: &Scope) -> String {
        let mut state = self.lock();
        scope_key(&mut state, &scope.secrets_path()).0
    }

    /// Store a secret directly, bypassing the API.
    pub fn seed(&self, scope: &Scope, name: &str, value: &str) {
        let now = Utc::now();
        let mut state = self.lock();
        let key_id = scope_key(&mut state, &scope.secrets_path()).0;
        state
            .secrets
            .entry(scope.secrets_path())
            .or_default()
            .insert(
                name.to_string(),
                Stored {
                    value: value.as_bytes().to_vec(),
                    key_id,
                    visibility: None,
                    selected_repository_ids: Vec::new(),
                    created_at: now,
                    updated_at: now,
                },
            );
    }

    /// Unseal base64 ciphertext with a scope's current key.
    pub fn open(&self, scope: &Scope, encrypted: &str) -> Option<Vec<u8>> {
        let mut state = self.lock();
        let collection = scope.secrets_path();
        scope_key(&mut state, &collection);
        let sealed = BASE64.decode(encrypted).ok()?;
        cipher::unseal(&sealed, &state.keys[&collection].secret).ok()
    }

    pub fn stored(&self, scope: &Scope, name: &str) -> Option<Stored> {
        self.lock()
            .secrets
            .get(&scope.secrets_path())
            .and_then(|secrets| secrets.get(name))
            .cloned()
    }

    pub fn secret_count(&self, scope: &Scope) -> usize {
        self.lock()
            .secrets
            .get(&scope.secrets_path())
            .map_or(0, BTreeMap::len)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.lock().requests.clone()
    }

    /// Number of requests with `method` whose path ends with `suffix`.
    pub fn count(&self, method: Method, suffix: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path.ends_with(suffix))
            .count()
    }

    /// Number of public key fetches.
    pub fn key_fetches(&self) -> usize {
        self.count(Method::GET, "/public-key")
    }
}

impl Transport for MockGithub {
    fn send(&self, request: &ApiRequest<'_>) -> Result<ApiResponse> {
        let mut state = self.lock();
        state.requests.push(Recorded {
            method: request.method.clone(),
            path: request.path.clone(),
            token: request.token.to_string(),
        });

        if state.unavailable {
            return Ok(ApiResponse::new(503, r#"{"message":"Service Unavailable"}"#));
        }

        let Some((login, id)) = state.users.get(request.token).cloned() else {
            return Ok(ApiResponse::new(401, r#"{"message":"Bad credentials"}"#));
        };

        if state.rate_limited {
            let mut response = ApiResponse::new(403, r#"{"message":"API rate limit exceeded"}"#);
            response.rate_limit_remaining = Some(0);
            return Ok(response);
        }

        if state.secondary_limited {
            return Ok(ApiResponse::new(
                403,
                r#"{"message":"You have exceeded a secondary rate limit. Please wait a few minutes before you try again.","documentation_url":"https://docs.github.com/rest/overview/rate-limits-for-the-rest-api#about-secondary-rate-limits"}"#,
            ));
        }

        let (path, query) = match request.path.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (request.path.clone(), String::new()),
        };

        match (request.method.as_str(), path.as_str()) {
            ("GET", "/user") => Ok(ok(json!({ "login": login, "id": id, "name": null }))),
            ("GET", "/rate_limit") => Ok(ok(json!({
                "rate": { "limit": 5000, "remaining": 4999, "reset": 1_700_000_000u64, "used": 1 }
            }))),
            _ => secrets_route(&mut state, request, &path, &query),
        }
    }
}

fn ok(body: Value) -> ApiResponse {
    ApiResponse::new(200, body.to_string())
}

fn not_found() -> ApiResponse {
    ApiResponse::new(404, r#"{"message":"Not Found"}"#)
}

fn new_key(state: &mut State) -> ScopeKey {
    state.next_key_id += 1;
    ScopeKey {
        key_id: format!("56825016724254974{}", state.next_key_id),
        secret: SecretKey::generate(&mut OsRng),
    }
}

/// `(key_id, base64 public key)` for a collection, created on first use.
fn scope_key(state: &mut State, collection: &str) -> (String, String) {
    if !state.keys.contains_key(collection) {
        let key = new_key(state);
        state.keys.insert(collection.to_string(), key);
    }
    let key = &state.keys[collection];
    (
        key.key_id.clone(),
        BASE64.encode(key.secret.public_key().as_bytes()),
    )
}

fn metadata(name: &str, stored: &Stored) -> SecretMetadata {
    SecretMetadata {
        name: name.to_string(),
        created_at: stored.created_at,
        updated_at: stored.updated_at,
        visibility: stored.visibility.as_deref().and_then(|v| v.parse::<Visibility>().ok()),
        selected_repositories_url: None,
    }
}

fn query_param(query: &str, name: &str, default: usize) -> usize {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| value.parse().ok())
        .unwrap_or(default)
}

fn secrets_route(
    state: &mut State,
    request: &ApiRequest<'_>,
    path: &str,
    query: &str,
) -> Result<ApiResponse> {
    let Some(index) = path.find("/secrets") else {
        return Ok(not_found());
    };
    let collection = &path[..index + "/secrets".len()];
    let rest = &path[index + "/secrets".len()..];
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

    match (request.method.as_str(), segments.as_slice()) {
        ("GET", []) => {
            let per_page = query_param(query, "per_page", 30);
            let page = query_param(query, "page", 1);
            let all: Vec<SecretMetadata> = state
                .secrets
                .get(collection)
                .map(|secrets| secrets.iter().map(|(n, s)| metadata(n, s)).collect())
                .unwrap_or_default();
            let batch: Vec<&SecretMetadata> =
                all.iter().skip((page - 1) * per_page).take(per_page).collect();
            Ok(ok(json!({ "total_count": all.len(), "secrets": batch })))
        }
        ("GET", ["public-key"]) => {
            let (key_id, key) = scope_key(state, collection);
            Ok(ok(json!({ "key_id": key_id, "key": key })))
        }
        ("GET", [name]) => {
            let name = decode(name);
            match state.secrets.get(collection).and_then(|s| s.get(&name)) {
                Some(stored) => Ok(ok(serde_json::to_value(metadata(&name, stored))?)),
                None => Ok(not_found()),
            }
        }
        ("PUT", [name]) => Ok(put_secret(state, collection, &decode(name), request.body.as_ref())),
        ("DELETE", [name]) => {
            let name = decode(name);
            match state.secrets.get_mut(collection).and_then(|s| s.remove(&name)) {
                Some(_) => Ok(ApiResponse::new(204, "")),
                None => Ok(not_found()),
            }
        }
        ("GET", [name, "repositories"]) => {
            let name = decode(name);
            let Some(stored) = state.secrets.get(collection).and_then(|s| s.get(&name)) else {
                return Ok(not_found());
            };
            let repositories: Vec<Value> = stored
                .selected_repository_ids
                .iter()
                .map(|id| json!({ "id": id, "name": format!("repo-{}", id), "full_name": format!("acme/repo-{}", id) }))
                .collect();
            Ok(ok(json!({ "total_count": repositories.len(), "repositories": repositories })))
        }
        ("PUT", [name, "repositories"]) => {
            let name = decode(name);
            let ids: Vec<u64> = request
                .body
                .as_ref()
                .and_then(|b| serde_json::from_value(b["selected_repository_ids"].clone()).ok())
                .unwrap_or_default();
            match state.secrets.get_mut(collection).and_then(|s| s.get_mut(&name)) {
                Some(stored) => {
                    stored.selected_repository_ids = ids;
                    Ok(ApiResponse::new(204, ""))
                }
                None => Ok(not_found()),
            }
        }
        _ => Ok(not_found()),
    }
}

fn put_secret(state: &mut State, collection: &str, name: &str, body: Option<&Value>) -> ApiResponse {
    let unprocessable = |message: &str| ApiResponse::new(422, json!({ "message": message }).to_string());

    let Some(body) = body else {
        return unprocessable("missing body");
    };
    let (Some(encrypted), Some(key_id)) = (body["encrypted_value"].as_str(), body["key_id"].as_str()) else {
        return unprocessable("encrypted_value and key_id are required");
    };

    let (current_id, _) = scope_key(state, collection);
    if key_id != current_id {
        return unprocessable("Bad key_id");
    }
    let Ok(sealed) = BASE64.decode(encrypted) else {
        return unprocessable("encrypted_value is not base64");
    };
    let Ok(value) = cipher::unseal(&sealed, &state.keys[collection].secret) else {
        return unprocessable("encrypted_value does not open with the scope key");
    };

    let selected_repository_ids: Vec<u64> =
        serde_json::from_value(body["selected_repository_ids"].clone()).unwrap_or_default();
    if selected_repository_ids.contains(&0) {
        return unprocessable("Invalid repository id");
    }

    let now = Utc::now();
    let secrets = state.secrets.entry(collection.to_string()).or_default();
    let created_at = secrets.get(name).map_or(now, |s| s.created_at);
    let existed = secrets.contains_key(name);
    secrets.insert(
        name.to_string(),
        Stored {
            value,
            key_id: key_id.to_string(),
            visibility: body["visibility"].as_str().map(String::from),
            selected_repository_ids,
            created_at,
            updated_at: now,
        },
    );

    if existed {
        ApiResponse::new(204, "")
    } else {
        ApiResponse::new(201, "")
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}
