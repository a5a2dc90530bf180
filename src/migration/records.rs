//! Migration Records Module
//! Linked / unmatched user records, the sync report, and the display helpers
//! used by the user browser and detail view.

use crate::data::{format_thousands, load_json, load_jsonl, truncate_chars, LoaderError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const LINKED_USERS_FILE: &str = "linked_users.jsonl";
pub const UNMATCHED_USERS_FILE: &str = "unmatched_users.jsonl";
pub const SYNC_REPORT_FILE: &str = "sync_report.json";

const ID_MAX_CHARS: usize = 45;
const EMAIL_MAX_CHARS: usize = 50;
const NAME_MAX_CHARS: usize = 40;
/// Timestamps above this are milliseconds.
const MILLIS_THRESHOLD: f64 = 1e12;

#[derive(Error, Debug)]
pub enum RecordsError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("Invalid record in {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Sum of `pointsEarned` values; stays an integer until a fractional value is added.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointsTotal {
    Whole(i64),
    Fractional(f64),
}

impl Default for PointsTotal {
    fn default() -> Self {
        PointsTotal::Whole(0)
    }
}

impl PointsTotal {
    pub fn as_f64(self) -> f64 {
        match self {
            PointsTotal::Whole(n) => n as f64,
            PointsTotal::Fractional(x) => x,
        }
    }

    /// Add one JSON number; non-numeric values are ignored.
    pub fn add(self, value: &Value) -> Self {
        match (self, value.as_i64()) {
            (PointsTotal::Whole(total), Some(n)) => match total.checked_add(n) {
                Some(sum) => PointsTotal::Whole(sum),
                None => PointsTotal::Fractional(total as f64 + n as f64),
            },
            _ => match value.as_f64() {
                Some(x) => PointsTotal::Fractional(self.as_f64() + x),
                None => self,
            },
        }
    }
}

/// A user present in both Clerk and Convex, merged with their Convex history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkedUser {
    pub clerk_id: String,
    pub convex_id: Option<String>,
    pub clerk_data: Map<String, Value>,
    pub convex_profile: Option<Map<String, Value>>,
    pub points_history: Vec<Value>,
    pub referrals_made: Vec<Value>,
    pub referred_by: Option<Value>,
    pub mini_game_progress: Vec<Value>,
    pub total_points_earned: PointsTotal,
    pub total_referrals_made: u64,
    pub has_clerk_data: bool,
    pub has_convex_data: bool,
}

/// A user present in only one of the two systems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnmatchedUser {
    pub source: String,
    pub id: String,
    pub data: Map<String, Value>,
    pub reason: String,
}

/// Summary counters of a matching run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncReport {
    pub total_clerk_users: u64,
    pub total_convex_users: u64,
    pub matched_users: u64,
    pub clerk_only: u64,
    pub convex_only: u64,
    pub total_points_records: u64,
    pub total_referral_records: u64,
    pub total_mini_game_records: u64,
    pub match_rate_percent: f64,
    pub total_unique_users: u64,
}

impl SyncReport {
    pub fn unmatched(&self) -> u64 {
        self.clerk_only + self.convex_only
    }
}

/// Paths of the three migration files; `None` entries are skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationPaths {
    pub linked_users: Option<PathBuf>,
    pub unmatched_users: Option<PathBuf>,
    pub sync_report: Option<PathBuf>,
}

impl MigrationPaths {
    /// Files from a previous comparison run found in `dir`.
    pub fn discover(dir: &Path) -> Self {
        let existing = |name: &str| {
            let path = dir.join(name);
            path.exists().then_some(path)
        };
        Self {
            linked_users: existing(LINKED_USERS_FILE),
            unmatched_users: existing(UNMATCHED_USERS_FILE),
            sync_report: existing(SYNC_REPORT_FILE),
        }
    }
}

/// Everything the migration tab displays.
#[derive(Debug, Clone, Default)]
pub struct MigrationData {
    pub linked_users: Vec<LinkedUser>,
    pub unmatched_users: Vec<UnmatchedUser>,
    pub sync_report: Option<SyncReport>,
}

fn decode<T: serde::de::DeserializeOwned>(path: &Path, value: Value) -> Result<T, RecordsError> {
    serde_json::from_value(value).map_err(|source| RecordsError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn usable(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref()
        .filter(|p| !p.as_os_str().is_empty() && p.exists())
}

/// Load whichever migration files are present.
pub fn load_migration_files(paths: &MigrationPaths) -> Result<MigrationData, RecordsError> {
    let mut data = MigrationData::default();

    if let Some(path) = usable(&paths.linked_users) {
        data.linked_users = load_jsonl(path)?
            .into_iter()
            .map(|v| decode(path, v))
            .collect::<Result<_, _>>()?;
    }

    if let Some(path) = usable(&paths.unmatched_users) {
        data.unmatched_users = load_jsonl(path)?
            .into_iter()
            .map(|v| decode(path, v))
            .collect::<Result<_, _>>()?;
    }

    if let Some(path) = usable(&paths.sync_report) {
        data.sync_report = Some(decode(path, load_json(path)?)?);
    }

    info!(
        "Loaded migration data: {} linked, {} unmatched, sync report: {}",
        data.linked_users.len(),
        data.unmatched_users.len(),
        data.sync_report.is_some()
    );

    Ok(data)
}

fn text_field(map: Option<&Map<String, Value>>, key: &str) -> String {
    match map.and_then(|m| m.get(key)) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn field_or_na(map: &Map<String, Value>, key: &str) -> String {
    let text = text_field(Some(map), key);
    if text.is_empty() {
        "N/A".to_string()
    } else {
        text
    }
}

fn first_non_empty(a: String, b: String) -> String {
    if a.is_empty() {
        b
    } else {
        a
    }
}

fn full_name(map: Option<&Map<String, Value>>) -> String {
    format!(
        "{} {}",
        text_field(map, "first_name"),
        text_field(map, "last_name")
    )
}

impl LinkedUser {
    pub fn email(&self) -> String {
        first_non_empty(
            text_field(Some(&self.clerk_data), "primary_email_address"),
            text_field(self.convex_profile.as_ref(), "email"),
        )
    }

    pub fn display_name(&self) -> String {
        first_non_empty(
            text_field(self.convex_profile.as_ref(), "name"),
            full_name(Some(&self.clerk_data)),
        )
    }
}

impl UnmatchedUser {
    pub fn email(&self) -> String {
        text_field(Some(&self.data), "primary_email_address")
    }

    pub fn display_name(&self) -> String {
        full_name(Some(&self.data))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserFilter {
    #[default]
    All,
    Matched,
    Unmatched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKind {
    Matched,
    Unmatched,
}

/// Points to a user inside `MigrationData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRef {
    pub kind: UserKind,
    pub index: usize,
}

/// One line of the user browser.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub user: UserRef,
    pub id: String,
    pub email: String,
    pub name: String,
    pub points: String,
}

/// Format a points total as a rounded integer with thousands separators.
pub fn format_points(points: f64) -> String {
    let rounded = points.round();
    let text = format_thousands(rounded.abs() as u64);
    if rounded < 0.0 {
        format!("-{}", text)
    } else {
        text
    }
}

/// Apply the filter and search term to all users, matched first.
pub fn filter_users(data: &MigrationData, filter: UserFilter, search: &str) -> Vec<UserRow> {
    let term = search.trim().to_lowercase();
    let matches = |id: &str, email: &str, name: &str| {
        term.is_empty() || format!("{} {} {}", id, email, name).to_lowercase().contains(&term)
    };

    let mut rows = Vec::new();

    if filter != UserFilter::Unmatched {
        for (index, user) in data.linked_users.iter().enumerate() {
            let (email, name) = (user.email(), user.display_name());
            if !matches(&user.clerk_id, &email, &name) {
                continue;
            }
            rows.push(UserRow {
                user: UserRef {
                    kind: UserKind::Matched,
                    index,
                },
                id: truncate_chars(&user.clerk_id, ID_MAX_CHARS),
                email: truncate_chars(&email, EMAIL_MAX_CHARS),
                name: truncate_chars(&name, NAME_MAX_CHARS),
                points: format_points(user.total_points_earned.as_f64()),
            });
        }
    }

    if filter != UserFilter::Matched {
        for (index, user) in data.unmatched_users.iter().enumerate() {
            let (email, name) = (user.email(), user.display_name());
            if !matches(&user.id, &email, &name) {
                continue;
            }
            rows.push(UserRow {
                user: UserRef {
                    kind: UserKind::Unmatched,
                    index,
                },
                id: truncate_chars(&user.id, ID_MAX_CHARS),
                email: truncate_chars(&email, EMAIL_MAX_CHARS),
                name: truncate_chars(&name, NAME_MAX_CHARS),
                points: "N/A".to_string(),
            });
        }
    }

    rows
}

fn json_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn join_lines(mut lines: Vec<String>) -> String {
    lines.push(String::new());
    lines.join("\n")
}

fn contact_lines(lines: &mut Vec<String>, data: &Map<String, Value>) {
    lines.push(format!("  First Name: {}", field_or_na(data, "first_name")));
    lines.push(format!("  Last Name: {}", field_or_na(data, "last_name")));
    lines.push(format!("  Username: {}", field_or_na(data, "username")));
    lines.push(format!("  Email: {}", field_or_na(data, "primary_email_address")));
    lines.push(format!("  Phone: {}", field_or_na(data, "primary_phone_number")));
}

/// Detail text for a matched user.
pub fn matched_user_details(user: &LinkedUser) -> String {
    let mut lines = vec![
        "USER DETAILS - MATCHED USER".to_string(),
        "=".repeat(70),
        String::new(),
        format!("CLERK ID: {}", user.clerk_id),
        format!("CONVEX ID: {}", user.convex_id.as_deref().unwrap_or("N/A")),
        String::new(),
        "CLERK DATA:".to_string(),
    ];

    if !user.clerk_data.is_empty() {
        contact_lines(&mut lines, &user.clerk_data);
    }

    if let Some(profile) = user.convex_profile.as_ref().filter(|p| !p.is_empty()) {
        lines.push(String::new());
        lines.push("CONVEX PROFILE:".to_string());
        lines.push(format!("  Name: {}", field_or_na(profile, "name")));
        lines.push(format!("  Email: {}", field_or_na(profile, "email")));
        lines.push(format!("  Country: {}", field_or_na(profile, "country")));
        lines.push(format!(
            "  Affiliate Level: {}",
            field_or_na(profile, "affiliateLevel")
        ));
        lines.push("  Points Breakdown:".to_string());
        if let Some(Value::Object(breakdown)) = profile.get("pointsBreakdown") {
            for (key, value) in breakdown {
                lines.push(format!("    {}: {}", key, json_display(value)));
            }
        }
        lines.push(format!("  Referral Code: {}", field_or_na(profile, "referralCode")));
    }

    lines.push(String::new());
    lines.push("STATISTICS:".to_string());
    lines.push(format!(
        "  Total Points Earned: {}",
        format_points(user.total_points_earned.as_f64())
    ));
    lines.push(format!("  Total Referrals Made: {}", user.total_referrals_made));
    lines.push(format!("  Points History Entries: {}", user.points_history.len()));
    lines.push(format!("  Referrals Made: {}", user.referrals_made.len()));

    if let Some(Value::Object(referred_by)) = &user.referred_by {
        lines.push(format!("  Referred By: {}", field_or_na(referred_by, "referrerId")));
    }

    join_lines(lines)
}

/// Detail text for a user found in only one system.
pub fn unmatched_user_details(user: &UnmatchedUser) -> String {
    let na = |s: &str| if s.is_empty() { "N/A".to_string() } else { s.to_string() };

    let mut lines = vec![
        "USER DETAILS - UNMATCHED USER".to_string(),
        "=".repeat(70),
        String::new(),
        format!("SOURCE: {}", na(&user.source)),
        format!("USER ID: {}", na(&user.id)),
        format!("REASON: {}", na(&user.reason)),
        String::new(),
        "USER DATA:".to_string(),
    ];

    if !user.data.is_empty() {
        contact_lines(&mut lines, &user.data);
    }

    join_lines(lines)
}

/// Summary text of a sync report.
pub fn sync_report_summary(report: &SyncReport) -> String {
    join_lines(vec![
        "SYNC REPORT SUMMARY".to_string(),
        "=".repeat(70),
        String::new(),
        format!("Total Clerk Users: {}", format_thousands(report.total_clerk_users)),
        format!("Total Convex Users: {}", format_thousands(report.total_convex_users)),
        format!("Matched Users: {}", format_thousands(report.matched_users)),
        format!("Clerk Only: {}", format_thousands(report.clerk_only)),
        format!("Convex Only: {}", format_thousands(report.convex_only)),
        format!("Match Rate: {:.2}%", report.match_rate_percent),
        String::new(),
        format!("Points Records: {}", format_thousands(report.total_points_records)),
        format!("Referral Records: {}", format_thousands(report.total_referral_records)),
        format!("Mini-Game Records: {}", format_thousands(report.total_mini_game_records)),
    ])
}

fn number(value: Option<&Value>) -> Option<f64> {
    value.and_then(|v| v.as_f64())
}

/// (timestamp in seconds, points earned) for each points history entry.
pub fn points_timeline(user: &LinkedUser) -> Vec<[f64; 2]> {
    user.points_history
        .iter()
        .map(|entry| {
            let time = number(entry.get("createdAt"))
                .or_else(|| number(entry.get("_creationTime")))
                .unwrap_or(0.0);
            let time = if time > MILLIS_THRESHOLD {
                time / 1000.0
            } else {
                time
            };
            let points = number(entry.get("pointsEarned")).unwrap_or(0.0);
            [time, points]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn linked(id: &str, clerk: Value, profile: Value, points: f64) -> LinkedUser {
        serde_json::from_value(json!({
            "clerkId": id,
            "convexId": format!("cx_{}", id),
            "clerkData": clerk,
            "convexProfile": profile,
            "totalPointsEarned": points,
        }))
        .unwrap()
    }

    fn sample() -> MigrationData {
        MigrationData {
            linked_users: vec![
                linked(
                    "user_a",
                    json!({"primary_email_address": "a@x.io", "first_name": "Ann", "last_name": "Lee"}),
                    json!({"name": "Annie"}),
                    1234.6,
                ),
                linked(
                    "user_b",
                    json!({"first_name": "Bob", "last_name": "Ray"}),
                    json!({"email": "bob@convex.io"}),
                    5.0,
                ),
            ],
            unmatched_users: vec![serde_json::from_value(json!({
                "source": "clerk",
                "id": "user_c",
                "data": {"primary_email_address": "c@x.io", "first_name": "Cy", "last_name": null},
                "reason": "missing_in_convex"
            }))
            .unwrap()],
            sync_report: None,
        }
    }

    #[test]
    fn display_fields_fall_back() {
        let data = sample();
        assert_eq!(data.linked_users[0].email(), "a@x.io");
        assert_eq!(data.linked_users[0].display_name(), "Annie");
        assert_eq!(data.linked_users[1].email(), "bob@convex.io");
        assert_eq!(data.linked_users[1].display_name(), "Bob Ray");
        assert_eq!(data.unmatched_users[0].display_name(), "Cy ");
    }

    #[test]
    fn filter_and_search() {
        let data = sample();
        assert_eq!(filter_users(&data, UserFilter::All, "").len(), 3);
        assert_eq!(filter_users(&data, UserFilter::Matched, "").len(), 2);

        let unmatched = filter_users(&data, UserFilter::Unmatched, "");
        assert_eq!(unmatched.len(), 1);
        assert_eq!(unmatched[0].points, "N/A");
        assert_eq!(unmatched[0].user.kind, UserKind::Unmatched);

        let found = filter_users(&data, UserFilter::All, "  CONVEX.IO ");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "user_b");
        assert!(filter_users(&data, UserFilter::Unmatched, "annie").is_empty());
    }

    #[test]
    fn rows_format_points_and_truncate() {
        let mut data = sample();
        data.linked_users[0].clerk_id = "u".repeat(60);
        let rows = filter_users(&data, UserFilter::Matched, "");
        assert_eq!(rows[0].points, "1,235");
        assert_eq!(rows[0].id.len(), ID_MAX_CHARS);
    }

    #[test]
    fn matched_details_include_profile() {
        let mut user = sample().linked_users[0].clone();
        user.convex_profile
            .as_mut()
            .unwrap()
            .insert("pointsBreakdown".into(), json!({"games": 10, "bonus": 2}));
        user.referred_by = Some(json!({"referrerId": "user_z"}));

        let text = matched_user_details(&user);
        assert!(text.starts_with("USER DETAILS - MATCHED USER"));
        assert!(text.contains("CONVEX ID: cx_user_a"));
        assert!(text.contains("  Username: N/A"));
        assert!(text.contains("    games: 10\n    bonus: 2"));
        assert!(text.contains("  Total Points Earned: 1,235"));
        assert!(text.contains("  Referred By: user_z"));
    }

    #[test]
    fn unmatched_details() {
        let text = unmatched_user_details(&sample().unmatched_users[0]);
        assert!(text.contains("SOURCE: clerk"));
        assert!(text.contains("REASON: missing_in_convex"));
        assert!(text.contains("  Last Name: N/A"));
    }

    #[test]
    fn sync_summary_formats_counts() {
        let report = SyncReport {
            total_clerk_users: 12000,
            matched_users: 11000,
            clerk_only: 1000,
            convex_only: 5,
            match_rate_percent: 91.6667,
            ..Default::default()
        };
        assert_eq!(report.unmatched(), 1005);
        let text = sync_report_summary(&report);
        assert!(text.contains("Total Clerk Users: 12,000"));
        assert!(text.contains("Match Rate: 91.67%"));
    }

    #[test]
    fn timeline_converts_milliseconds() {
        let mut user = LinkedUser::default();
        user.points_history = vec![
            json!({"createdAt": 1_700_000_000_000.0_f64, "pointsEarned": 5}),
            json!({"_creationTime": 1_700_000_100.0_f64, "pointsEarned": 7}),
            json!({}),
        ];
        let points = points_timeline(&user);
        assert_eq!(points[0], [1_700_000_000.0, 5.0]);
        assert_eq!(points[1], [1_700_000_100.0, 7.0]);
        assert_eq!(points[2], [0.0, 0.0]);
    }

    #[test]
    fn sync_report_missing_fields_default_to_zero() {
        let report: SyncReport = serde_json::from_value(json!({"matched_users": 3})).unwrap();
        assert_eq!(report.matched_users, 3);
        assert_eq!(report.total_clerk_users, 0);
    }

    #[test]
    fn discovers_and_loads_files() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(
            dir.path().join(LINKED_USERS_FILE),
            "{\"clerkId\": \"u1\", \"totalPointsEarned\": 10}\n",
        )
        .unwrap();
        fs::write(dir.path().join(SYNC_REPORT_FILE), "{\"matched_users\": 1}").unwrap();

        let paths = MigrationPaths::discover(dir.path());
        assert!(paths.linked_users.is_some());
        assert!(paths.unmatched_users.is_none());

        let data = load_migration_files(&paths).unwrap();
        assert_eq!(data.linked_users.len(), 1);
        assert!(data.unmatched_users.is_empty());
        assert_eq!(data.sync_report.unwrap().matched_users, 1);
    }

    #[test]
    fn invalid_record_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(LINKED_USERS_FILE);
        fs::write(&path, "{\"clerkId\": 5}\n").unwrap();

        let paths = MigrationPaths {
            linked_users: Some(path),
            ..Default::default()
        };
        assert!(matches!(
            load_migration_files(&paths),
            Err(RecordsError::Decode { .. })
        ));
    }
}
