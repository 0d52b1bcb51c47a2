use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::duration::{human_duration_value, DurationBreakdown};
use crate::error::ApiResult;
use crate::record::{value_object, ValueObject};

value_object!(
    /// https://github.com/toggl/toggl_api_docs/blob/master/chapters/workspaces.md
    Workspace, "Workspace", [
        "id" => json!(0),
        "default_currency" => json!("USD"),
        "rounding_minutes" => json!(0),
        "premium" => json!(true),
        "name" => json!(""),
        "default_hourly_rate" => json!(0),
        "admin" => json!(true),
        "campaign_taken" => json!(true),
        "ical_url" => json!(""),
        "rounding" => json!(1),
        "only_admins_see_team_dashboard" => json!(false),
        "at" => json!(""),
        "api_token" => json!(""),
        "projects_billable_by_default" => json!(true),
        "logo_url" => json!(""),
        "only_admins_may_create_projects" => json!(false),
        "only_admins_see_billable_rates" => json!(false),
    ]
);

value_object!(
    /// A workspace member, as listed by `/workspaces/{id}/workspace_users`
    User, "User", [
        "id" => json!(0),
        "active" => json!(false),
        "admin" => json!(false),
        "at" => json!(""),
        "avatar_file_name" => json!(""),
        "email" => json!(""),
        "group_ids" => json!([]),
        "inactive" => json!(false),
        "name" => json!(""),
        "uid" => json!(0),
        "wid" => json!(0),
    ]
);

value_object!(
    /// One row of a detailed report.
    /// https://github.com/toggl/toggl_api_docs/blob/master/reports/detailed.md
    TimeSlip, "TimeSlip", [
        "updated" => json!(""),
        "task" => Value::Null,
        "end" => json!(""),
        "description" => json!(""),
        "tags" => json!([]),
        "billable" => json!(0.0),
        "pid" => json!(0),
        "project" => json!(""),
        "start" => json!(""),
        "client" => Value::Null,
        "user" => json!(""),
        "is_billable" => json!(false),
        "tid" => Value::Null,
        "uid" => json!(0),
        "dur" => json!(0),
        "use_stop" => json!(true),
        "id" => json!(0),
        "cur" => json!("USD"),
    ]
);

value_object!(
    /// One row of a summary report, i.e. one group of time entries.
    Group, "Group", []
);

/// Older name for `TimeSlip`
pub type Timeslip = TimeSlip;

impl Workspace {
    pub fn id(&self) -> Option<i64> {
        self.0.get_i64("id")
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get_str("name")
    }

    pub fn default_currency(&self) -> Option<&str> {
        self.0.get_str("default_currency")
    }

    /// If someone is paying for the workspace or not
    pub fn premium(&self) -> Option<bool> {
        self.0.get_bool("premium")
    }

    /// Whether the requesting user has admin access to the workspace
    pub fn admin(&self) -> Option<bool> {
        self.0.get_bool("admin")
    }
}

impl User {
    /// Workspace-user id
    pub fn id(&self) -> Option<i64> {
        self.0.get_i64("id")
    }

    /// The user's own id
    pub fn uid(&self) -> Option<i64> {
        self.0.get_i64("uid")
    }

    pub fn wid(&self) -> Option<i64> {
        self.0.get_i64("wid")
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get_str("name")
    }

    pub fn email(&self) -> Option<&str> {
        self.0.get_str("email")
    }

    pub fn active(&self) -> Option<bool> {
        self.0.get_bool("active")
    }

    pub fn admin(&self) -> Option<bool> {
        self.0.get_bool("admin")
    }

    pub fn group_ids(&self) -> Vec<i64> {
        match self.0.get("group_ids") {
            Some(Value::Array(ids)) => ids.iter().filter_map(Value::as_i64).collect(),
            _ => Vec::new(),
        }
    }
}

// t12345, t 12345 (leading only), T12345, #12345, ticket 12345, TICKET 12345
static TICKET_REGEXES: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"^[tT#]\s?[0-9]+").expect("invalid ticket regex"),
        Regex::new(r"[tT#][0-9]+").expect("invalid ticket regex"),
        Regex::new(r"(?i)ticket\s?[0-9]+").expect("invalid ticket regex"),
    ]
});

// pr12345, pr 2345, PR2345, pull request 2345, pullrequest2345
static PULL_REQUEST_REGEXES: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"[pP][rR]\s?[0-9]+").expect("invalid pull request regex"),
        Regex::new(r"(?i)pull\s?request\s?[0-9]+").expect("invalid pull request regex"),
    ]
});

fn digits_matching(text: &str, patterns: &[Regex]) -> BTreeSet<String> {
    patterns
        .iter()
        .flat_map(|re| re.find_iter(text))
        .map(|m| m.as_str().chars().filter(char::is_ascii_digit).collect())
        .collect()
}

impl TimeSlip {
    pub fn id(&self) -> Option<i64> {
        self.0.get_i64("id")
    }

    pub fn description(&self) -> Option<&str> {
        self.0.get_str("description")
    }

    pub fn project(&self) -> Option<&str> {
        self.0.get_str("project")
    }

    /// Full name of the user whose time entry it is
    pub fn user(&self) -> Option<&str> {
        self.0.get_str("user")
    }

    pub fn uid(&self) -> Option<i64> {
        self.0.get_i64("uid")
    }

    pub fn pid(&self) -> Option<i64> {
        self.0.get_i64("pid")
    }

    /// Time entry duration in milliseconds
    pub fn dur(&self) -> Option<i64> {
        self.0.get_i64("dur")
    }

    /// ISO 8601, as sent
    pub fn start(&self) -> Option<&str> {
        self.0.get_str("start")
    }

    pub fn end(&self) -> Option<&str> {
        self.0.get_str("end")
    }

    pub fn tags(&self) -> Vec<&str> {
        match self.0.get("tags") {
            Some(Value::Array(tags)) => tags.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_billable(&self) -> Option<bool> {
        self.0.get_bool("is_billable")
    }

    /// `dur` broken down into weeks/days/hours/minutes/seconds
    pub fn duration(&self) -> ApiResult<DurationBreakdown> {
        match self.0.get("dur") {
            Some(dur) => human_duration_value(dur, true),
            None => Ok(DurationBreakdown::default()),
        }
    }

    /// Trac ticket numbers mentioned in the description:
    /// `t12345`, `t 12345`, `T12345`, `#12345`, `# 12345`, `ticket 12345`, `TICKET 12345`.
    /// The space forms only count at the very start of the description.
    pub fn trac_tickets(&self) -> BTreeSet<String> {
        digits_matching(self.description().unwrap_or_default(), &*TICKET_REGEXES)
    }

    /// Pull request numbers mentioned in the description:
    /// `pr12345`, `pr 2345`, `PR2345`, `PR 2345`, `pull request 2345`.
    pub fn pull_requests(&self) -> BTreeSet<String> {
        digits_matching(self.description().unwrap_or_default(), &*PULL_REQUEST_REGEXES)
    }
}

impl Group {
    /// Group id, e.g. the user id when grouping by users
    pub fn id(&self) -> Option<i64> {
        self.0.get_i64("id")
    }

    /// Total milliseconds tracked in the group
    pub fn time(&self) -> Option<&Value> {
        self.get("time")
    }

    /// Subgroup rows, e.g. per-project totals
    pub fn items(&self) -> &[Value] {
        match self.get("items") {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn slip(description: &str) -> TimeSlip {
        TimeSlip::from_value(json!({ "id": 1, "description": description })).unwrap()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ticket_numbers() {
        assert_eq!(
            slip("Fixed t123 and #456, see ticket 789").trac_tickets(),
            set(&["123", "456", "789"])
        );
    }

    #[test]
    fn ticket_space_form_only_at_start() {
        assert_eq!(slip("# 12 then t 34").trac_tickets(), set(&["12"]));
        assert_eq!(slip("TICKET 5 and T5 again").trac_tickets(), set(&["5"]));
    }

    #[test]
    fn pull_request_numbers() {
        assert_eq!(
            slip("See PR 42 and pull request 99").pull_requests(),
            set(&["42", "99"])
        );
        assert_eq!(slip("pr7, Pr 7 and PullRequest7").pull_requests(), set(&["7"]));
    }

    #[test]
    fn no_description_no_numbers() {
        let slip = TimeSlip::from_value(json!({ "id": 1 })).unwrap();
        assert!(slip.trac_tickets().is_empty());
        assert!(slip.pull_requests().is_empty());
        let slip = TimeSlip::from_value(json!({ "description": null })).unwrap();
        assert!(slip.trac_tickets().is_empty());
    }

    #[test]
    fn unknown_fields_are_kept() {
        let ws = Workspace::from_value(json!({"id": 3, "name": "Acme", "brand_new": [1]})).unwrap();
        assert_eq!(ws.id(), Some(3));
        assert_eq!(ws.name(), Some("Acme"));
        assert_eq!(ws.get("brand_new"), Some(&json!([1])));
        assert_eq!(ws.default_currency(), None);
        assert_eq!(ws.field_or_default("default_currency"), Some(json!("USD")));
        assert_eq!(ws.field_or_default("name"), Some(json!("Acme")));
        assert_eq!(ws.field_or_default("nonsense"), None);
    }

    #[test]
    fn defaults_are_not_shared() {
        let mut first = User::defaults();
        first.insert("group_ids".to_string(), json!([1, 2]));
        assert_eq!(User::defaults().get("group_ids"), Some(&json!([])));
        assert_eq!(User::defaults().len(), User::DEFAULT_FIELDS.len());
        assert_eq!(Workspace::defaults().len(), Workspace::DEFAULT_FIELDS.len());
        assert_eq!(TimeSlip::defaults().len(), TimeSlip::DEFAULT_FIELDS.len());
        assert!(Group::DEFAULT_FIELDS.is_empty());
    }

    #[test]
    fn dump_uses_kind() {
        let user = User::from_value(json!({"name": "Ann", "uid": 9, "group_ids": [4]})).unwrap();
        assert_eq!(
            user.to_string(),
            "<User>.name = Ann\n<User>.uid = 9\n<User>.group_ids = [4]\n"
        );
        assert_eq!(user.group_ids(), vec![4]);
    }

    #[test]
    fn serializes_as_plain_object() {
        let slip: Timeslip = Record::from_value(json!({"id": 5, "dur": 61_000}))
            .unwrap()
            .into();
        assert_eq!(slip.to_json().unwrap(), r#"{"id":5,"dur":61000}"#);
        assert_eq!(slip.duration().unwrap().as_tuple(), (0, 0, 0, 1, 1));
        let back: TimeSlip = serde_json::from_str(&slip.to_json().unwrap()).unwrap();
        assert_eq!(back, slip);
    }

    #[test]
    fn group_rows() {
        let group = Group::from_value(json!({"id": 2, "time": 3_600_000, "items": [{"time": 1}]}))
            .unwrap();
        assert_eq!(group.id(), Some(2));
        assert_eq!(group.time(), Some(&json!(3_600_000)));
        assert_eq!(group.items().len(), 1);
    }
}
