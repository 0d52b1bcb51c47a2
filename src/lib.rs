//! Blocking client for the Toggl v8 API and the v2 reports API.
//!
//! ```no_run
//! use toggl_client::{Api, ReportParams};
//!
//! let api = Api::new("my-api-token")?;
//! let workspace = api.get_workspace("Acme", "name")?.expect("no such workspace");
//! let slips = api.get_timeslips(&ReportParams::new(workspace.id().unwrap_or_default()))?;
//! for slip in &slips {
//!     println!("{:?} {:?}", slip.description(), slip.trac_tickets());
//! }
//! # Ok::<(), toggl_client::ApiError>(())
//! ```

pub mod api;
pub mod config;
pub mod duration;
pub mod error;
pub mod models;
pub mod record;
pub mod report;

pub use api::{Api, HttpMethod, QueryType, RawResponse};
pub use config::Config;
pub use duration::{human_duration, human_duration_value, pretty_duration, DurationBreakdown};
pub use error::{ApiError, ApiResult};
pub use models::{Group, TimeSlip, Timeslip, User, Workspace};
pub use record::{Record, ValueObject};
pub use report::{collect_pages, Params, ReportPage, ReportParams, TotalCurrency};
