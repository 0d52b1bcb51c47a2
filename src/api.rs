use std::fmt;
use std::str::FromStr;

use reqwest::blocking;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Config;
use crate::duration::{human_duration_value, DurationBreakdown};
use crate::error::{ApiError, ApiResult};
use crate::models::{Group, TimeSlip, User, Workspace};
use crate::record::ValueObject;
use crate::report::{collect_pages, Params, ReportPage, ReportParams};

/// The only two methods the API is queried with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl FromStr for HttpMethod {
    type Err = ApiError;

    fn from_str(method: &str) -> Result<Self, Self::Err> {
        match method {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            other => Err(ApiError::invalid(format!(
                "GET or POST are the only supported request methods, got {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        })
    }
}

/// Which of the two API surfaces a path is relative to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryType {
    /// `{api_base_url}/v{api_version}`
    #[default]
    Core,
    /// `{api_base_reports_url}/v{api_reports_version}`
    Report,
}

/// A successful response, body not parsed
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        parse_json(&self.body)
    }
}

fn parse_json<T: DeserializeOwned>(text: &str) -> ApiResult<T> {
    serde_json::from_str(text).map_err(|source| ApiError::Parsing {
        text: text.to_string(),
        source,
    })
}

/// Trait to DRY up sending a request and turning a bad status into an `ApiError`
trait ConsolidateApiErrors {
    fn send_checked(self) -> ApiResult<blocking::Response>;

    fn get_raw(self) -> ApiResult<RawResponse>
    where
        Self: Sized,
    {
        let resp = self.send_checked()?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.text()?;
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    fn get_json<T: DeserializeOwned>(self) -> ApiResult<T>
    where
        Self: Sized,
    {
        let resp = self.send_checked()?;
        parse_json(&resp.text()?)
    }
}

impl ConsolidateApiErrors for blocking::RequestBuilder {
    fn send_checked(self) -> ApiResult<blocking::Response> {
        let resp = self.send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .unwrap_or_else(|err| format!("<couldn't read response body: {}>", err));
            log::warn!("Toggl answered {}: {}", status, body);
            return Err(ApiError::server(status, body));
        }
        Ok(resp)
    }
}

// A trait to add .add_api_key to reqwest::blocking::RequestBuilder
trait AddApiKey {
    fn add_api_key(self, api: &Api) -> Self;
}

impl AddApiKey for blocking::RequestBuilder {
    fn add_api_key(self, api: &Api) -> Self {
        self.basic_auth(&api.api_token, Some("api_token"))
    }
}

/// The main Api object. Configuration is fixed at construction.
pub struct Api {
    api_token: String,
    config: Config,
    api_url: String,
    api_reports_url: String,
    client: blocking::Client,
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("api_url", &self.api_url)
            .field("api_reports_url", &self.api_reports_url)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Api {
    /// Client with the default `Config`
    pub fn new(api_token: impl Into<String>) -> ApiResult<Self> {
        Self::with_config(api_token, Config::default())
    }

    pub fn with_config(api_token: impl Into<String>, config: Config) -> ApiResult<Self> {
        let mut builder = blocking::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            api_token: api_token.into(),
            api_url: config.api_url(),
            api_reports_url: config.reports_url(),
            client: builder.build()?,
            config,
        })
    }

    /// Token from `TOGGL_API_KEY`, options from the other `TOGGL_*` variables
    pub fn from_env() -> ApiResult<Self> {
        Self::with_config(Config::token_from_env()?, Config::from_env()?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn api_reports_url(&self) -> &str {
        &self.api_reports_url
    }

    fn request(
        &self,
        path: &str,
        params: &Params,
        method: &str,
        query_type: QueryType,
    ) -> ApiResult<blocking::RequestBuilder> {
        let method: HttpMethod = method.parse()?;
        let base = match query_type {
            QueryType::Core => &self.api_url,
            QueryType::Report => &self.api_reports_url,
        };
        let endpoint = format!("{}{}", base, path);
        log::debug!("Requesting: {} {}", method, endpoint);

        let request = match method {
            HttpMethod::Get => self.client.get(endpoint),
            HttpMethod::Post => self.client.post(endpoint),
        }
        .add_api_key(self)
        .header(CONTENT_TYPE, "application/json");

        Ok(match method {
            HttpMethod::Get => request.query(params),
            HttpMethod::Post => request.json(params),
        })
    }

    /// Runs any API call and decodes the JSON answer. `path` is appended to the core or
    /// reports URL depending on `query_type`; `method` must be `"GET"` or `"POST"`.
    pub fn query(
        &self,
        path: &str,
        params: &Params,
        method: &str,
        query_type: QueryType,
    ) -> ApiResult<Value> {
        self.query_as(path, params, method, query_type)
    }

    /// Like `query`, deserializing straight into `T`
    pub fn query_as<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &Params,
        method: &str,
        query_type: QueryType,
    ) -> ApiResult<T> {
        self.request(path, params, method, query_type)?.get_json()
    }

    /// Like `query`, but hands back status, headers and body untouched
    pub fn query_raw(
        &self,
        path: &str,
        params: &Params,
        method: &str,
        query_type: QueryType,
    ) -> ApiResult<RawResponse> {
        self.request(path, params, method, query_type)?.get_raw()
    }

    pub fn query_report(&self, path: &str, params: &Params, method: &str) -> ApiResult<Value> {
        self.query(path, params, method, QueryType::Report)
    }

    pub fn query_report_raw(
        &self,
        path: &str,
        params: &Params,
        method: &str,
    ) -> ApiResult<RawResponse> {
        self.query_raw(path, params, method, QueryType::Report)
    }

    /// Get workspaces, in the order the API lists them
    pub fn get_workspaces(&self) -> ApiResult<Vec<Workspace>> {
        self.query_as("/workspaces", &Params::new(), "GET", QueryType::Core)
    }

    /// First workspace whose `by` field equals `value`, e.g. `get_workspace("Acme", "name")`
    pub fn get_workspace(
        &self,
        value: impl Into<Value>,
        by: &str,
    ) -> ApiResult<Option<Workspace>> {
        Ok(find_by(self.get_workspaces()?, by, &value.into()))
    }

    pub fn get_workspace_users(&self, workspace_id: i64) -> ApiResult<Vec<User>> {
        if workspace_id <= 0 {
            return Err(ApiError::invalid("a workspace ID is required to find users"));
        }
        let path = format!("/workspaces/{}/workspace_users", workspace_id);
        self.query_as(&path, &Params::new(), "GET", QueryType::Core)
    }

    /// First user of the workspace whose `by` field equals `value`
    pub fn get_user(
        &self,
        value: impl Into<Value>,
        workspace_id: i64,
        by: &str,
    ) -> ApiResult<Option<User>> {
        Ok(find_by(
            self.get_workspace_users(workspace_id)?,
            by,
            &value.into(),
        ))
    }

    /// Summary report rows, one `Group` per `grouping` value
    pub fn get_summary(&self, params: &ReportParams) -> ApiResult<Vec<Group>> {
        let query = params.to_summary_params(&self.config.user_agent)?;
        let page: ReportPage = self.query_as("/summary", &query, "GET", QueryType::Report)?;
        Ok(page
            .data
            .into_iter()
            .map(|row| Group::from_record(row.into()))
            .collect())
    }

    /// Time tracked by the first group of the summary report (a single user, when the report
    /// is filtered to one). Nothing tracked gives zero.
    pub fn get_user_hours(&self, params: &ReportParams) -> ApiResult<DurationBreakdown> {
        let groups = self.get_summary(params)?;
        match groups.first().and_then(Group::time) {
            Some(time) if !time.is_null() => human_duration_value(time, true),
            _ => Ok(DurationBreakdown::default()),
        }
    }

    /// A single page of the detailed report. `params.page` picks the page, 1 by default.
    pub fn get_details_page(&self, params: &ReportParams) -> ApiResult<ReportPage> {
        let query = params.to_details_params(&self.config.user_agent)?;
        self.query_as("/details", &query, "GET", QueryType::Report)
    }

    /// Every time entry of the detailed report, all pages, ordered by `params.order_field`
    pub fn get_timeslips(&self, params: &ReportParams) -> ApiResult<Vec<TimeSlip>> {
        let rows = collect_pages(|page| self.get_details_page(&params.clone().page(page)))?;
        Ok(rows
            .into_iter()
            .map(|row| TimeSlip::from_record(row.into()))
            .collect())
    }

    /// Same as `get_timeslips`
    pub fn get_all_timeslips(&self, params: &ReportParams) -> ApiResult<Vec<TimeSlip>> {
        self.get_timeslips(params)
    }
}

fn find_by<T: ValueObject>(items: Vec<T>, by: &str, value: &Value) -> Option<T> {
    items
        .into_iter()
        .find(|item| item.get(by).map_or(false, |field| values_match(field, value)))
}

/// JSON equality, except numbers compare by value: `0` matches `0.0`
fn values_match(field: &Value, value: &Value) -> bool {
    match (field, value) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => match (a.as_u64(), b.as_u64()) {
                (Some(a), Some(b)) => a == b,
                _ => a.as_f64() == b.as_f64(),
            },
        },
        _ => field == value,
    }
}
