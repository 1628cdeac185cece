// crates/api-probe-runners/src/postman.rs
// ============================================================================
// Module: Postman Collection Model
// Description: Postman v2.1 item tree parsing and variable substitution.
// Purpose: Turn a collection document into an ordered list of requests.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`flatten_items`] walks the item tree depth-first, descending into
//! folders in document order, and yields one [`PostmanItem`] per request.
//! Only the parts of the format the native runner uses are modeled: method,
//! URL, headers, raw bodies, bearer auth, and the kinds of attached scripts.
//!
//! Auth blocks inherit downward from the collection through folders to each
//! request; the nearest block wins and `noauth` clears it. Bearer auth
//! becomes an `Authorization` header template.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Public Types
// ============================================================================

/// One executable request from a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostmanItem {
    /// Item name, prefixed by its folder path (`folder / request`).
    pub name: String,
    /// HTTP method, upper-cased.
    pub method: String,
    /// URL template.
    pub url: String,
    /// Enabled header templates, in order.
    pub headers: Vec<(String, String)>,
    /// Raw body template, if the body mode is `raw`.
    pub body: Option<String>,
    /// Body mode when present but not `raw`.
    pub unsupported_body: Option<String>,
    /// Effective auth type when it is neither `bearer` nor `noauth`.
    pub unsupported_auth: Option<String>,
    /// Script kinds attached to the item (`prerequest`, `test`).
    pub scripts: Vec<String>,
}

/// Collection structure errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostmanParseError {
    /// The document does not match the item tree shape.
    #[error("invalid collection item tree: {0}")]
    Shape(String),
    /// A request item has no usable URL.
    #[error("request {0} has no url")]
    MissingUrl(String),
}

// ============================================================================
// SECTION: Wire Model
// ============================================================================

/// Collection root.
#[derive(Deserialize)]
struct CollectionNode {
    /// Top-level items.
    item: Vec<ItemNode>,
    /// Collection-wide auth.
    #[serde(default)]
    auth: Option<AuthNode>,
}

/// Folder or request item.
#[derive(Deserialize)]
struct ItemNode {
    /// Item name.
    #[serde(default)]
    name: String,
    /// Child items; present on folders.
    #[serde(default)]
    item: Option<Vec<ItemNode>>,
    /// Request definition; present on requests.
    #[serde(default)]
    request: Option<RequestNode>,
    /// Attached scripts.
    #[serde(default)]
    event: Vec<EventNode>,
    /// Folder auth, inherited by children.
    #[serde(default)]
    auth: Option<AuthNode>,
}

/// Request definition, either a bare URL or a full object.
#[derive(Deserialize)]
#[serde(untagged)]
enum RequestNode {
    /// Shorthand GET.
    Url(String),
    /// Full request object.
    Detailed(RequestDetail),
}

/// Full request object.
#[derive(Deserialize)]
struct RequestDetail {
    /// HTTP method.
    #[serde(default)]
    method: Option<String>,
    /// Target URL.
    #[serde(default)]
    url: Option<UrlNode>,
    /// Request headers.
    #[serde(default)]
    header: Option<HeaderList>,
    /// Request body.
    #[serde(default)]
    body: Option<BodyNode>,
    /// Request auth, overriding any inherited block.
    #[serde(default)]
    auth: Option<AuthNode>,
}

/// URL as a raw string or a structured object.
#[derive(Deserialize)]
#[serde(untagged)]
enum UrlNode {
    /// Raw URL string.
    Raw(String),
    /// Structured URL.
    Detailed(UrlDetail),
}

/// Structured URL.
#[derive(Deserialize)]
struct UrlDetail {
    /// Raw URL, preferred when present.
    #[serde(default)]
    raw: Option<String>,
    /// Scheme.
    #[serde(default)]
    protocol: Option<String>,
    /// Host segments.
    #[serde(default)]
    host: Option<Segments>,
    /// Path segments.
    #[serde(default)]
    path: Option<Segments>,
    /// Port.
    #[serde(default)]
    port: Option<Port>,
    /// Query parameters.
    #[serde(default)]
    query: Vec<QueryNode>,
}

/// Port given as a string or a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum Port {
    /// String form, as exported.
    Text(String),
    /// Numeric form.
    Number(u16),
}

/// One query parameter.
#[derive(Deserialize)]
struct QueryNode {
    /// Parameter name.
    #[serde(default)]
    key: Option<String>,
    /// Parameter value; `None` renders the bare key.
    #[serde(default)]
    value: Option<String>,
    /// Disabled parameters are skipped.
    #[serde(default)]
    disabled: bool,
}

/// Host or path given as one string or a list of segments.
#[derive(Deserialize)]
#[serde(untagged)]
enum Segments {
    /// Single string.
    Joined(String),
    /// Segment list.
    List(Vec<String>),
}

/// Header list, or a raw header block.
#[derive(Deserialize)]
#[serde(untagged)]
enum HeaderList {
    /// Structured headers.
    List(Vec<HeaderNode>),
    /// `Name: value` lines.
    Raw(String),
}

/// One header.
#[derive(Deserialize)]
struct HeaderNode {
    /// Header name.
    key: String,
    /// Header value.
    #[serde(default)]
    value: String,
    /// Disabled headers are skipped.
    #[serde(default)]
    disabled: bool,
}

/// Request body.
#[derive(Deserialize)]
struct BodyNode {
    /// Body mode (`raw`, `urlencoded`, `formdata`, ...).
    #[serde(default)]
    mode: Option<String>,
    /// Raw body text.
    #[serde(default)]
    raw: Option<String>,
    /// Disabled bodies are not sent.
    #[serde(default)]
    disabled: bool,
}

/// Auth block.
#[derive(Deserialize)]
struct AuthNode {
    /// Auth type (`bearer`, `noauth`, `basic`, ...).
    #[serde(rename = "type")]
    kind: String,
    /// Bearer parameters.
    #[serde(default)]
    bearer: Vec<AuthParam>,
}

/// One auth parameter.
#[derive(Deserialize)]
struct AuthParam {
    /// Parameter name.
    key: String,
    /// Parameter value.
    #[serde(default)]
    value: Value,
}

/// Script attachment.
#[derive(Deserialize)]
struct EventNode {
    /// Hook name.
    #[serde(default)]
    listen: String,
}

// ============================================================================
// SECTION: Flattening
// ============================================================================

/// Returns the collection's requests in execution order.
///
/// # Errors
///
/// Returns [`PostmanParseError`] when the document is not an item tree or a
/// request lacks a URL.
pub fn flatten_items(document: &Value) -> Result<Vec<PostmanItem>, PostmanParseError> {
    let root = CollectionNode::deserialize(document)
        .map_err(|err| PostmanParseError::Shape(err.to_string()))?;
    let mut items = Vec::new();
    walk(&root.item, "", effective_auth(root.auth.as_ref(), None), &mut items)?;
    Ok(items)
}

/// Depth-first walk collecting requests.
fn walk(
    nodes: &[ItemNode],
    prefix: &str,
    inherited: Option<&AuthNode>,
    out: &mut Vec<PostmanItem>,
) -> Result<(), PostmanParseError> {
    for node in nodes {
        let name = if prefix.is_empty() {
            node.name.clone()
        } else {
            format!("{prefix} / {}", node.name)
        };
        if let Some(children) = &node.item {
            walk(children, &name, effective_auth(node.auth.as_ref(), inherited), out)?;
            continue;
        }
        if let Some(request) = &node.request {
            out.push(resolve(name, request, &node.event, inherited)?);
        }
    }
    Ok(())
}

/// Resolves one request node.
fn resolve(
    name: String,
    request: &RequestNode,
    events: &[EventNode],
    inherited: Option<&AuthNode>,
) -> Result<PostmanItem, PostmanParseError> {
    let scripts = events
        .iter()
        .map(|event| event.listen.clone())
        .filter(|listen| !listen.is_empty())
        .collect();
    let detail = match request {
        RequestNode::Url(url) => {
            let mut headers = Vec::new();
            let unsupported_auth = apply_auth(inherited, &mut headers);
            return Ok(PostmanItem {
                name,
                method: "GET".to_string(),
                url: url.clone(),
                headers,
                body: None,
                unsupported_body: None,
                unsupported_auth,
                scripts,
            });
        }
        RequestNode::Detailed(detail) => detail,
    };
    let url = detail
        .url
        .as_ref()
        .and_then(url_template)
        .ok_or_else(|| PostmanParseError::MissingUrl(name.clone()))?;
    let mut headers = match &detail.header {
        Some(HeaderList::List(list)) => list
            .iter()
            .filter(|header| !header.disabled)
            .map(|header| (header.key.clone(), header.value.clone()))
            .collect(),
        Some(HeaderList::Raw(block)) => block
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .collect(),
        None => Vec::new(),
    };
    let unsupported_auth =
        apply_auth(effective_auth(detail.auth.as_ref(), inherited), &mut headers);
    let (body, unsupported_body) = match &detail.body {
        Some(body) if body.disabled => (None, None),
        Some(BodyNode {
            mode: Some(mode),
            raw,
            ..
        }) if mode == "raw" => (raw.clone(), None),
        Some(BodyNode {
            mode: Some(mode),
            ..
        }) => (None, Some(mode.clone())),
        Some(_) | None => (None, None),
    };
    Ok(PostmanItem {
        name,
        method: detail.method.as_deref().unwrap_or("GET").trim().to_ascii_uppercase(),
        url,
        headers,
        body,
        unsupported_body,
        unsupported_auth,
        scripts,
    })
}

/// Picks the nearest auth block; `inherit` defers to the parent.
fn effective_auth<'a>(
    own: Option<&'a AuthNode>,
    inherited: Option<&'a AuthNode>,
) -> Option<&'a AuthNode> {
    match own {
        Some(auth) if auth.kind != "inherit" => Some(auth),
        _ => inherited,
    }
}

/// Adds the header for `auth` and returns its type if it cannot be applied.
///
/// An explicit `Authorization` header on the request takes precedence.
fn apply_auth(auth: Option<&AuthNode>, headers: &mut Vec<(String, String)>) -> Option<String> {
    let auth = auth?;
    match auth.kind.as_str() {
        "noauth" => None,
        "bearer" => {
            let token = auth
                .bearer
                .iter()
                .find(|param| param.key == "token")
                .and_then(|param| param.value.as_str());
            let Some(token) = token else {
                return Some(auth.kind.clone());
            };
            if !headers.iter().any(|(key, _)| key.eq_ignore_ascii_case("authorization")) {
                headers.push(("Authorization".to_string(), format!("Bearer {token}")));
            }
            None
        }
        other => Some(other.to_string()),
    }
}

/// Returns the URL template for a URL node.
fn url_template(url: &UrlNode) -> Option<String> {
    match url {
        UrlNode::Raw(raw) => Some(raw.clone()).filter(|raw| !raw.trim().is_empty()),
        UrlNode::Detailed(detail) => {
            if let Some(raw) = detail.raw.as_ref().filter(|raw| !raw.trim().is_empty()) {
                return Some(raw.clone());
            }
            let host = join(detail.host.as_ref()?, ".");
            let path = detail.path.as_ref().map(|path| join(path, "/")).unwrap_or_default();
            let scheme = detail.protocol.as_deref().unwrap_or("https");
            let mut url = format!("{scheme}://{host}");
            match &detail.port {
                Some(Port::Text(port)) if !port.is_empty() => {
                    url.push(':');
                    url.push_str(port);
                }
                Some(Port::Number(port)) => {
                    url.push(':');
                    url.push_str(&port.to_string());
                }
                Some(Port::Text(_)) | None => {}
            }
            let path = path.trim_start_matches('/');
            if !path.is_empty() {
                url.push('/');
                url.push_str(path);
            }
            let query: Vec<String> = detail
                .query
                .iter()
                .filter(|param| !param.disabled)
                .filter_map(|param| {
                    let key = param.key.as_deref()?;
                    Some(match &param.value {
                        Some(value) => format!("{key}={value}"),
                        None => key.to_string(),
                    })
                })
                .collect();
            if !query.is_empty() {
                url.push('?');
                url.push_str(&query.join("&"));
            }
            Some(url)
        }
    }
}

/// Joins URL segments.
fn join(segments: &Segments, separator: &str) -> String {
    match segments {
        Segments::Joined(joined) => joined.clone(),
        Segments::List(list) => list.join(separator),
    }
}

// ============================================================================
// SECTION: Variables
// ============================================================================

/// Replaces `{{name}}` placeholders with values from `variables`.
///
/// Unknown placeholders are left as written.
#[must_use]
pub fn substitute_variables(template: &str, variables: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        match variables.get(after[..end].trim()) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests use direct unwraps for clarity.")]

    use serde_json::json;

    use super::*;

    #[test]
    fn folders_are_walked_in_order() {
        let document = json!({
            "item": [
                { "name": "health", "request": "{{BaseURL}}/health" },
                { "name": "users", "item": [
                    { "name": "list", "request": { "method": "get", "url": { "raw": "{{BaseURL}}/users" } } },
                    { "name": "create", "request": {
                        "method": "POST",
                        "url": "{{BaseURL}}/users",
                        "header": [
                            { "key": "Authorization", "value": "Bearer {{COGNITO_JWT}}" },
                            { "key": "X-Debug", "value": "1", "disabled": true }
                        ],
                        "body": { "mode": "raw", "raw": "{\"name\":\"probe\"}" }
                    },
                    "event": [{ "listen": "test", "script": { "exec": ["pm.test()"] } }] }
                ]}
            ]
        });

        let items = flatten_items(&document).unwrap();

        let names: Vec<&str> = items.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, ["health", "users / list", "users / create"]);
        assert_eq!(items[1].method, "GET");
        assert_eq!(items[2].headers, [("Authorization".to_string(), "Bearer {{COGNITO_JWT}}".to_string())]);
        assert_eq!(items[2].body.as_deref(), Some("{\"name\":\"probe\"}"));
        assert_eq!(items[2].scripts, ["test".to_string()]);
    }

    #[test]
    fn structured_url_without_raw_is_assembled() {
        let document = json!({ "item": [{ "name": "x", "request": {
            "url": { "protocol": "http", "host": ["api", "example", "com"], "path": ["v1", "ping"] }
        }}]});
        let items = flatten_items(&document).unwrap();
        assert_eq!(items[0].url, "http://api.example.com/v1/ping");
    }

    #[test]
    fn structured_url_keeps_port_and_query() {
        let document = json!({ "item": [{ "name": "x", "request": {
            "url": {
                "protocol": "http",
                "host": ["localhost"],
                "port": "3000",
                "path": ["items"],
                "query": [
                    { "key": "limit", "value": "5" },
                    { "key": "debug", "value": "1", "disabled": true }
                ]
            }
        }}]});
        let items = flatten_items(&document).unwrap();
        assert_eq!(items[0].url, "http://localhost:3000/items?limit=5");
    }

    #[test]
    fn bearer_auth_is_inherited_and_overridden() {
        let document = json!({
            "auth": { "type": "bearer", "bearer": [
                { "key": "token", "value": "{{COGNITO_JWT}}", "type": "string" }
            ]},
            "item": [
                { "name": "inherits", "request": "{{BaseURL}}/a" },
                { "name": "open", "request": { "url": "{{BaseURL}}/b", "auth": { "type": "noauth" } } },
                { "name": "basic", "request": { "url": "{{BaseURL}}/c", "auth": { "type": "basic" } } },
                { "name": "explicit", "request": {
                    "url": "{{BaseURL}}/d",
                    "auth": { "type": "inherit" },
                    "header": [{ "key": "authorization", "value": "Token other" }]
                }}
            ]
        });

        let items = flatten_items(&document).unwrap();

        assert_eq!(
            items[0].headers,
            [("Authorization".to_string(), "Bearer {{COGNITO_JWT}}".to_string())]
        );
        assert!(items[1].headers.is_empty());
        assert_eq!(items[1].unsupported_auth, None);
        assert!(items[2].headers.is_empty());
        assert_eq!(items[2].unsupported_auth.as_deref(), Some("basic"));
        assert_eq!(items[3].headers, [("authorization".to_string(), "Token other".to_string())]);
    }

    #[test]
    fn folder_auth_applies_to_its_children_only() {
        let document = json!({ "item": [
            { "name": "secured", "auth": { "type": "bearer", "bearer": [{ "key": "token", "value": "abc" }] },
              "item": [{ "name": "one", "request": "http://x/1" }] },
            { "name": "two", "request": "http://x/2" }
        ]});

        let items = flatten_items(&document).unwrap();

        assert_eq!(items[0].headers, [("Authorization".to_string(), "Bearer abc".to_string())]);
        assert!(items[1].headers.is_empty());
    }

    #[test]
    fn request_without_url_is_rejected() {
        let document = json!({ "item": [{ "name": "broken", "request": { "method": "GET" } }] });
        assert_eq!(
            flatten_items(&document).unwrap_err(),
            PostmanParseError::MissingUrl("broken".to_string())
        );
    }

    #[test]
    fn non_raw_body_modes_are_flagged() {
        let document = json!({ "item": [{ "name": "form", "request": {
            "method": "POST", "url": "http://x", "body": { "mode": "urlencoded", "urlencoded": [] }
        }}]});
        let items = flatten_items(&document).unwrap();
        assert_eq!(items[0].body, None);
        assert_eq!(items[0].unsupported_body.as_deref(), Some("urlencoded"));
    }

    #[test]
    fn substitution_replaces_known_and_keeps_unknown() {
        let variables = BTreeMap::from([
            ("BaseURL".to_string(), "https://api.example.com".to_string()),
            ("COGNITO_JWT".to_string(), "t0ken".to_string()),
        ]);
        assert_eq!(
            substitute_variables("{{BaseURL}}/a?x={{ missing }}&t={{ COGNITO_JWT }}", &variables),
            "https://api.example.com/a?x={{ missing }}&t=t0ken"
        );
        assert_eq!(substitute_variables("open {{BaseURL", &variables), "open {{BaseURL");
    }
}
