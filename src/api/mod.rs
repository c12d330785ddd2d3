//! Remote directory client.
//!
//! Talks to the user-record HTTP API: list queries filtered by inactivity
//! criteria, per-user detail fetches, the disable mutation, and the server
//! version probe that drives header chrome selection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::filter::FilterCriteria;

const LIST_FIELDS: &str = "id,username,firstName,surname,disabled,created,lastLogin";
const DETAIL_FIELDS: &str = "id,username,firstName,surname,disabled,created,lastLogin,\
userRoles[id,name],userGroups[id,name],organisationUnits[id,name]";

/// Immutable snapshot of one user record as returned by the list query.
/// Superseded wholesale on refetch; never patched in place.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(deserialize_with = "ts::required")]
    pub created: DateTime<Utc>,
    /// Absent means the account never logged in.
    #[serde(default, deserialize_with = "ts::optional")]
    pub last_login: Option<DateTime<Utc>>,
}

/// A related entity referenced by name (role, group, organisation unit).
#[derive(Clone, Debug, Deserialize)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

/// Extended, read-only view of one user. Fetched fresh per request.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRecord {
    #[serde(flatten)]
    pub user: UserRecord,
    #[serde(default)]
    pub user_roles: Vec<NamedRef>,
    #[serde(default)]
    pub user_groups: Vec<NamedRef>,
    #[serde(default)]
    pub organisation_units: Vec<NamedRef>,
}

#[derive(Debug, Deserialize)]
struct UserListResponse {
    #[serde(default)]
    users: Vec<UserRecord>,
}

#[derive(Debug, Deserialize)]
struct SystemInfoResponse {
    version: Option<String>,
}

/// Parsed server version from the `/system/info` probe.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub snapshot: bool,
}

impl ServerVersion {
    /// Parse a dotted version string with an optional `-SNAPSHOT` suffix.
    /// Missing or unparseable components default to zero.
    pub fn parse(raw: &str) -> Self {
        let snapshot = raw.contains("SNAPSHOT");
        let cleaned = raw.replace("-SNAPSHOT", "");
        let mut parts = cleaned.split('.');
        let mut next = || {
            parts
                .next()
                .and_then(|p| p.trim().parse::<u32>().ok())
                .unwrap_or(0)
        };
        Self {
            major: next(),
            minor: next(),
            patch: next(),
            snapshot,
        }
    }

    pub fn header_chrome(&self) -> HeaderChrome {
        if self.minor < 42 {
            HeaderChrome::Legacy
        } else {
            HeaderChrome::Modern
        }
    }
}

/// Which header chrome the presentation layer should use.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeaderChrome {
    Legacy,
    Modern,
}

/// Boundary to the remote user directory.
///
/// The bulk workflow and the view code depend on this trait only, so tests
/// drive them with an in-memory double instead of a live server.
#[async_trait]
pub trait DirectoryClient {
    /// Fetch users matching the primary predicate (lastLogin inequality
    /// plus optional disabled exclusion).
    async fn fetch_users(&self, criteria: &FilterCriteria) -> ApiResult<Vec<UserRecord>>;

    /// Fetch users that never logged in. The remote API cannot combine a
    /// null check with an inequality filter on the same field, hence the
    /// second query.
    async fn fetch_never_logged_in(&self, include_disabled: bool) -> ApiResult<Vec<UserRecord>>;

    /// Fetch one user's extended attributes.
    async fn fetch_user_detail(&self, id: &str) -> ApiResult<DetailRecord>;

    /// Disable one account via full-record read-modify-write.
    ///
    /// Known race: the GET/PUT pair carries no version or ETag check, so a
    /// concurrent external edit between the two calls is lost
    /// (last-writer-wins).
    async fn disable_user(&self, id: &str) -> ApiResult<()>;

    /// Probe the server version.
    async fn fetch_version(&self) -> ApiResult<ServerVersion>;
}

/// Fetch the full record set for the current criteria.
///
/// Issues the primary query, then, when never-logged-in accounts are
/// included, the second query, and concatenates the results. No
/// deduplication happens here; the two predicates are mutually exclusive
/// (`lastLogin:lt:` vs. `lastLogin:null`).
pub async fn load_user_list<C: DirectoryClient + ?Sized>(
    client: &C,
    criteria: &FilterCriteria,
) -> ApiResult<Vec<UserRecord>> {
    let mut users = client.fetch_users(criteria).await?;
    if criteria.include_never_logged_in {
        let mut never = client.fetch_never_logged_in(criteria.include_disabled).await?;
        users.append(&mut never);
    }
    tracing::debug!(count = users.len(), "fetched user list");
    Ok(users)
}

/// Decide which header chrome to render. A failed probe falls back to the
/// legacy chrome, matching pre-probe servers.
pub async fn negotiate_chrome<C: DirectoryClient + ?Sized>(client: &C) -> HeaderChrome {
    match client.fetch_version().await {
        Ok(version) => version.header_chrome(),
        Err(err) => {
            tracing::warn!(error = %err, "version probe failed, assuming legacy chrome");
            HeaderChrome::Legacy
        }
    }
}

/// `reqwest`-backed client using basic auth from a pre-established account.
pub struct HttpDirectoryClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpDirectoryClient {
    pub fn new(base_url: &str, username: &str, password: &str) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{}", self.base_url, path))
            .basic_auth(&self.username, Some(&self.password))
    }

    async fn fetch_user_page(&self, filters: &[String]) -> ApiResult<Vec<UserRecord>> {
        let mut req = self
            .get("/api/users.json")
            .query(&[("fields", LIST_FIELDS), ("paging", "false")]);
        for f in filters {
            req = req.query(&[("filter", f.as_str())]);
        }
        let resp = req.send().await?;
        let resp = check_status(Call::Read, resp, "users").await?;
        let body: UserListResponse = resp.json().await?;
        Ok(body.users)
    }
}

/// Which side of the API a status check guards. A failed read is a
/// transport-level error; only a rejected write is a remote error.
#[derive(Copy, Clone)]
enum Call {
    Read,
    Write,
}

fn status_error(call: Call, status: reqwest::StatusCode, what: &str, body: &str) -> ApiError {
    if status == reqwest::StatusCode::NOT_FOUND {
        return ApiError::NotFound(what.to_string());
    }
    let msg = format!("{what}: HTTP {status}: {body}");
    match call {
        Call::Read => ApiError::Transport(msg),
        Call::Write => ApiError::Remote(msg),
    }
}

async fn check_status(
    call: Call,
    resp: reqwest::Response,
    what: &str,
) -> ApiResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(status_error(call, status, what, &body))
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    async fn fetch_users(&self, criteria: &FilterCriteria) -> ApiResult<Vec<UserRecord>> {
        self.fetch_user_page(&criteria.primary_filters()).await
    }

    async fn fetch_never_logged_in(&self, include_disabled: bool) -> ApiResult<Vec<UserRecord>> {
        let criteria = FilterCriteria {
            threshold: None,
            include_disabled,
            include_never_logged_in: true,
        };
        self.fetch_user_page(&criteria.never_logged_in_filters()).await
    }

    async fn fetch_user_detail(&self, id: &str) -> ApiResult<DetailRecord> {
        let resp = self
            .get(&format!("/api/users/{id}.json"))
            .query(&[("fields", DETAIL_FIELDS)])
            .send()
            .await?;
        let resp = check_status(Call::Read, resp, id).await?;
        Ok(resp.json().await?)
    }

    async fn disable_user(&self, id: &str) -> ApiResult<()> {
        // Full-record replace: fetch the owned fields, flip the flag, write
        // the whole record back.
        let resp = self
            .get(&format!("/api/users/{id}.json"))
            .query(&[("fields", ":owner")])
            .send()
            .await?;
        let resp = check_status(Call::Read, resp, id).await?;
        let mut record: serde_json::Value = resp.json().await?;
        match record.as_object_mut() {
            Some(obj) => {
                obj.insert("disabled".to_string(), serde_json::Value::Bool(true));
            }
            None => return Err(ApiError::Remote(format!("{id}: unexpected record payload"))),
        }

        let resp = self
            .http
            .put(format!("{}/api/users/{id}", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .json(&record)
            .send()
            .await?;
        check_status(Call::Write, resp, id).await?;
        tracing::info!(user = id, "disabled account");
        Ok(())
    }

    async fn fetch_version(&self) -> ApiResult<ServerVersion> {
        let resp = self
            .get("/api/system/info.json")
            .query(&[("fields", "version")])
            .send()
            .await?;
        let resp = check_status(Call::Read, resp, "system info").await?;
        let body: SystemInfoResponse = resp.json().await?;
        Ok(ServerVersion::parse(body.version.as_deref().unwrap_or("0.0.0")))
    }
}

/// Timestamp deserialization tolerant of payloads without a UTC offset
/// (the server emits `2024-01-01T00:00:00.000` with no zone designator).
mod ts {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|n| n.and_utc())
    }

    pub fn required<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("bad timestamp: {raw}")))
    }

    pub fn optional<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        match raw {
            None => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("bad timestamp: {s}"))),
        }
    }
}
