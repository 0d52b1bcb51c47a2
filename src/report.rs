//! Reports API parameters and pagination.
//! https://github.com/toggl/toggl_api_docs/blob/master/reports.md

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};

/// Flat key/value parameters: the query string of a GET, the JSON body of a POST.
pub type Params = BTreeMap<String, String>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TotalCurrency {
    pub currency: Option<String>,
    pub amount: Option<f64>,
}

/// One page of a report. `data` rows are left as raw JSON objects for the caller to wrap.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ReportPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_grand: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_billable: Option<i64>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub per_page: u64,
    #[serde(default)]
    pub total_currencies: Vec<TotalCurrency>,
    #[serde(default)]
    pub data: Vec<Map<String, Value>>,
}

impl ReportPage {
    /// How many pages the whole report spans, as far as this page knows.
    /// 0 or 1 both mean there is nothing more to fetch.
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 || self.total_count == 0 {
            return 0;
        }
        (self.total_count + self.per_page - 1) / self.per_page
    }
}

/// Fetches every page of a report. `fetch` is called with page numbers `1..=total_pages`,
/// strictly in order, where `total_pages` comes from the first page. Rows come back in page
/// order, then in-page order.
pub fn collect_pages<F>(mut fetch: F) -> ApiResult<Vec<Map<String, Value>>>
where
    F: FnMut(u64) -> ApiResult<ReportPage>,
{
    let first = fetch(1)?;
    let total_pages = first.total_pages();
    let mut rows = first.data;

    if total_pages > 1 {
        log::debug!(
            "Report has {} rows over {} pages",
            first.total_count,
            total_pages
        );
        for page in 2..=total_pages {
            log::trace!("Fetching report page {}/{}", page, total_pages);
            rows.extend(fetch(page)?.data);
        }
    }
    Ok(rows)
}

/// Parameters shared by the summary and detailed reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportParams {
    /// Required. The workspace whose data you want to access.
    pub workspace_id: i64,
    /// Defaults to today
    pub since: Option<NaiveDate>,
    /// Defaults to today
    pub until: Option<NaiveDate>,
    pub grouping: String,
    pub subgrouping: String,
    /// Detailed reports only: "date", "description", "duration", or "user"
    pub order_field: String,
    pub page: Option<u64>,
    /// Any other filter the reports API takes (`user_ids`, `billable`, ...)
    pub extra: Params,
}

impl ReportParams {
    pub fn new(workspace_id: i64) -> Self {
        Self {
            workspace_id,
            since: None,
            until: None,
            grouping: "users".to_string(),
            subgrouping: "projects".to_string(),
            order_field: "date".to_string(),
            page: None,
            extra: Params::new(),
        }
    }

    pub fn since(mut self, date: NaiveDate) -> Self {
        self.since = Some(date);
        self
    }

    pub fn until(mut self, date: NaiveDate) -> Self {
        self.until = Some(date);
        self
    }

    pub fn grouping(mut self, grouping: impl Into<String>) -> Self {
        self.grouping = grouping.into();
        self
    }

    pub fn subgrouping(mut self, subgrouping: impl Into<String>) -> Self {
        self.subgrouping = subgrouping.into();
        self
    }

    pub fn order_field(mut self, order_field: impl Into<String>) -> Self {
        self.order_field = order_field.into();
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets a filter with no dedicated builder method. Doesn't override the named fields.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.extra.insert(key.into(), value.to_string());
        self
    }

    /// Flattens into query params for the summary report
    pub fn to_summary_params(&self, user_agent: &str) -> ApiResult<Params> {
        self.to_params(user_agent, false)
    }

    /// Flattens into query params for the detailed report, including `order_field` and `page`
    pub fn to_details_params(&self, user_agent: &str) -> ApiResult<Params> {
        self.to_params(user_agent, true)
    }

    fn to_params(&self, user_agent: &str, detailed: bool) -> ApiResult<Params> {
        if self.workspace_id <= 0 {
            return Err(ApiError::invalid(
                "a workspace ID is required to run reports",
            ));
        }
        let today = Local::now().date_naive();
        let since = self.since.unwrap_or(today);
        let until = self.until.unwrap_or(today);
        if until < since {
            return Err(ApiError::invalid(format!(
                "report range ends ({}) before it starts ({})",
                until, since
            )));
        }

        let summary = SummaryQuery {
            user_agent,
            workspace_id: self.workspace_id,
            since,
            until,
            grouping: &self.grouping,
            subgrouping: &self.subgrouping,
        };
        let named = if detailed {
            flatten_params(&DetailsQuery {
                summary,
                order_field: &self.order_field,
                page: self.page.unwrap_or(1),
            })?
        } else {
            flatten_params(&summary)?
        };

        let mut params = self.extra.clone();
        params.extend(named);
        Ok(params)
    }
}

// We use serde here to make it easier to build the query string
#[derive(Serialize, Debug)]
struct SummaryQuery<'a> {
    user_agent: &'a str,
    workspace_id: i64,
    since: NaiveDate,
    until: NaiveDate,
    grouping: &'a str,
    subgrouping: &'a str,
}

#[derive(Serialize, Debug)]
struct DetailsQuery<'a> {
    #[serde(flatten)]
    summary: SummaryQuery<'a>,
    order_field: &'a str,
    page: u64,
}

/// Serializes a query struct into flat params. Nulls are dropped, arrays become comma lists.
fn flatten_params<T: Serialize>(query: &T) -> ApiResult<Params> {
    let map = match serde_json::to_value(query)? {
        Value::Object(map) => map,
        other => {
            return Err(ApiError::invalid(format!(
                "query params must be an object, got {}",
                other
            )))
        }
    };
    let mut params = Params::new();
    for (key, value) in map {
        let text = match value {
            Value::Null => continue,
            Value::Array(items) => items
                .iter()
                .map(scalar_param)
                .collect::<ApiResult<Vec<_>>>()?
                .join(","),
            other => scalar_param(&other)?,
        };
        params.insert(key, text);
    }
    Ok(params)
}

fn scalar_param(value: &Value) -> ApiResult<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(ApiError::invalid(format!(
            "query param must be a plain value, got {}",
            other
        ))),
    }
}
