//! User Data Comparer
//! Matches Clerk users (CSV export) against a Convex snapshot and writes
//! the linked / unmatched records plus a sync report.

use crate::data::{any_value_text, load_csv_as_text, load_jsonl_lenient, LoaderError};
use crate::migration::records::{
    LinkedUser, PointsTotal, SyncReport, UnmatchedUser, LINKED_USERS_FILE, SYNC_REPORT_FILE,
    UNMATCHED_USERS_FILE,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

const USERS_TABLE: &str = "users";
const POINTS_TABLE: &str = "pointsHistory";
const REFERRALS_TABLE: &str = "referralHistory";
const MINI_GAMES_TABLE: &str = "userMiniGameProgress";

#[derive(Error, Debug)]
pub enum CompareError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

type Record = Map<String, Value>;

/// Convex tables keyed by user id.
#[derive(Debug, Default)]
struct ConvexTables {
    users: BTreeMap<String, Record>,
    points: HashMap<String, Vec<Value>>,
    referrals_made: HashMap<String, Vec<Value>>,
    referred_by: HashMap<String, Value>,
    mini_games: HashMap<String, Vec<Value>>,
}

fn string_field(record: &Value, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn creation_time(record: &Value) -> f64 {
    record
        .get("_creationTime")
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

/// Records that made it into a grouping; key-less ones are not counted.
fn grouped_count(grouped: &HashMap<String, Vec<Value>>) -> u64 {
    grouped.values().map(Vec::len).sum::<usize>() as u64
}

fn sort_by_creation(records: &mut [Value]) {
    records.sort_by(|a, b| creation_time(a).total_cmp(&creation_time(b)));
}

pub struct UserDataComparer {
    clerk_csv: PathBuf,
    convex_snapshot: PathBuf,
    output_dir: PathBuf,
    report: SyncReport,
}

impl UserDataComparer {
    pub fn new(
        clerk_csv: impl Into<PathBuf>,
        convex_snapshot: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            clerk_csv: clerk_csv.into(),
            convex_snapshot: convex_snapshot.into(),
            output_dir: output_dir.into(),
            report: SyncReport::default(),
        }
    }

    /// Run the whole comparison and write the three output files.
    pub fn run(mut self) -> Result<SyncReport, CompareError> {
        let clerk = self.load_clerk_users()?;
        let convex = self.load_convex_tables();

        let clerk_ids: BTreeSet<&String> = clerk.keys().collect();
        let convex_ids: BTreeSet<&String> = convex.users.keys().collect();
        let matched: Vec<&String> = clerk_ids.intersection(&convex_ids).copied().collect();
        let clerk_only: Vec<&String> = clerk_ids.difference(&convex_ids).copied().collect();
        let convex_only: Vec<&String> = convex_ids.difference(&clerk_ids).copied().collect();

        self.report.matched_users = matched.len() as u64;
        self.report.clerk_only = clerk_only.len() as u64;
        self.report.convex_only = convex_only.len() as u64;
        info!(
            "Matched: {}, Clerk only: {}, Convex only: {}",
            matched.len(),
            clerk_only.len(),
            convex_only.len()
        );

        fs::create_dir_all(&self.output_dir).map_err(|source| CompareError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let linked: Vec<LinkedUser> = matched
            .iter()
            .map(|id| Self::link_user(id, &clerk, &convex))
            .collect();
        self.write_jsonl(LINKED_USERS_FILE, &linked)?;

        let unmatched: Vec<UnmatchedUser> = clerk_only
            .iter()
            .map(|id| UnmatchedUser {
                source: "clerk".to_string(),
                id: (*id).clone(),
                data: clerk.get(*id).cloned().unwrap_or_default(),
                reason: "missing_in_convex".to_string(),
            })
            .chain(convex_only.iter().map(|id| UnmatchedUser {
                source: "convex".to_string(),
                id: (*id).clone(),
                data: convex.users.get(*id).cloned().unwrap_or_default(),
                reason: "missing_in_clerk".to_string(),
            }))
            .collect();
        self.write_jsonl(UNMATCHED_USERS_FILE, &unmatched)?;

        let union = clerk_ids.union(&convex_ids).count();
        self.report.total_unique_users = union as u64;
        self.report.match_rate_percent = if union == 0 {
            0.0
        } else {
            (matched.len() as f64 / union as f64 * 100.0 * 100.0).round() / 100.0
        };
        self.write_report()?;

        info!(
            "Comparison finished: {:.2}% match rate, output in {}",
            self.report.match_rate_percent,
            self.output_dir.display()
        );
        Ok(self.report)
    }

    /// Clerk users by id, with trimmed values and empty fields as null.
    fn load_clerk_users(&mut self) -> Result<BTreeMap<String, Record>, CompareError> {
        info!("Loading Clerk users from {}", self.clerk_csv.display());
        let df = load_csv_as_text(&self.clerk_csv)?;
        let columns = df.get_columns();
        let mut users = BTreeMap::new();

        for row in 0..df.height() {
            let mut record = Record::new();
            for column in columns {
                let text = column
                    .get(row)
                    .map(|v| any_value_text(&v))
                    .unwrap_or_default();
                let text = text.trim();
                let value = if text.is_empty() {
                    Value::Null
                } else {
                    Value::String(text.to_string())
                };
                record.insert(column.name().to_string(), value);
            }

            let Some(id) = record.get("id").and_then(Value::as_str).map(str::to_string) else {
                continue;
            };
            users.insert(id, record);
            self.report.total_clerk_users += 1;
        }

        info!("Loaded {} Clerk users", self.report.total_clerk_users);
        Ok(users)
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.convex_snapshot.join(table).join("documents.jsonl")
    }

    fn group_by_user(records: Vec<Value>, key: &str) -> HashMap<String, Vec<Value>> {
        let mut grouped: HashMap<String, Vec<Value>> = HashMap::new();
        for record in records {
            if let Some(id) = string_field(&record, key) {
                grouped.entry(id).or_default().push(record);
            }
        }
        grouped
    }

    fn load_convex_tables(&mut self) -> ConvexTables {
        info!("Loading Convex snapshot from {}", self.convex_snapshot.display());
        let mut tables = ConvexTables::default();

        for record in load_jsonl_lenient(&self.table_path(USERS_TABLE)) {
            let Some(id) = string_field(&record, "userId") else {
                continue;
            };
            if let Value::Object(map) = record {
                tables.users.insert(id, map);
                self.report.total_convex_users += 1;
            }
        }

        let points = load_jsonl_lenient(&self.table_path(POINTS_TABLE));
        tables.points = Self::group_by_user(points, "userId");
        self.report.total_points_records = grouped_count(&tables.points);

        let referrals = load_jsonl_lenient(&self.table_path(REFERRALS_TABLE));
        for record in &referrals {
            if let Some(referred) = string_field(record, "referredId") {
                tables
                    .referred_by
                    .entry(referred)
                    .or_insert_with(|| record.clone());
            }
        }
        tables.referrals_made = Self::group_by_user(referrals, "referrerId");
        self.report.total_referral_records = grouped_count(&tables.referrals_made);

        let mini_games = load_jsonl_lenient(&self.table_path(MINI_GAMES_TABLE));
        tables.mini_games = Self::group_by_user(mini_games, "userId");
        self.report.total_mini_game_records = grouped_count(&tables.mini_games);

        info!(
            "Loaded {} Convex users, {} points, {} referrals, {} mini-game records",
            self.report.total_convex_users,
            self.report.total_points_records,
            self.report.total_referral_records,
            self.report.total_mini_game_records
        );
        tables
    }

    fn link_user(id: &str, clerk: &BTreeMap<String, Record>, convex: &ConvexTables) -> LinkedUser {
        let clerk_data = clerk.get(id).cloned().unwrap_or_default();
        let profile = convex.users.get(id).cloned();

        let mut points_history = convex.points.get(id).cloned().unwrap_or_default();
        sort_by_creation(&mut points_history);
        let mut referrals_made = convex.referrals_made.get(id).cloned().unwrap_or_default();
        sort_by_creation(&mut referrals_made);

        let total_points_earned = points_history
            .iter()
            .filter_map(|p| p.get("pointsEarned"))
            .fold(PointsTotal::default(), PointsTotal::add);

        LinkedUser {
            clerk_id: id.to_string(),
            convex_id: profile
                .as_ref()
                .and_then(|p| p.get("_id"))
                .and_then(Value::as_str)
                .map(str::to_string),
            has_clerk_data: !clerk_data.is_empty(),
            has_convex_data: profile.as_ref().is_some_and(|p| !p.is_empty()),
            clerk_data,
            convex_profile: profile,
            total_points_earned,
            total_referrals_made: referrals_made.len() as u64,
            points_history,
            referrals_made,
            referred_by: convex.referred_by.get(id).cloned(),
            mini_game_progress: convex.mini_games.get(id).cloned().unwrap_or_default(),
        }
    }

    fn output_file(&self, name: &str) -> Result<(PathBuf, BufWriter<File>), CompareError> {
        let path = self.output_dir.join(name);
        let file = File::create(&path).map_err(|source| CompareError::Io {
            path: path.clone(),
            source,
        })?;
        Ok((path, BufWriter::new(file)))
    }

    fn write_jsonl<T: Serialize>(&self, name: &str, records: &[T]) -> Result<(), CompareError> {
        let (path, mut writer) = self.output_file(name)?;
        let io_err = |source| CompareError::Io {
            path: path.clone(),
            source,
        };
        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n").map_err(io_err)?;
        }
        writer.flush().map_err(io_err)?;
        info!("Wrote {} records to {}", records.len(), path.display());
        Ok(())
    }

    fn write_report(&self) -> Result<(), CompareError> {
        let (path, mut writer) = self.output_file(SYNC_REPORT_FILE)?;
        serde_json::to_writer_pretty(&mut writer, &self.report)?;
        writer
            .flush()
            .map_err(|source| CompareError::Io { path, source })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::records::{load_migration_files, MigrationPaths};
    use std::path::Path;
    use tempfile::TempDir;

    fn write_table(snapshot: &Path, table: &str, lines: &[&str]) {
        let dir = snapshot.join(table);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("documents.jsonl"), lines.join("\n")).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("clerk.csv"),
            "id,first_name,primary_email_address\n\
             user_b, Bob ,bob@x.io\n\
             user_a,Ann,\n\
             user_c,Cy,cy@x.io\n\
             ,Nobody,no@x.io\n",
        )
        .unwrap();

        let snapshot = dir.path().join("snapshot");
        write_table(
            &snapshot,
            USERS_TABLE,
            &[
                r#"{"_id": "cx1", "userId": "user_a", "name": "Ann Lee"}"#,
                r#"{"_id": "cx2", "userId": "user_b"}"#,
                r#"{"_id": "cx3", "userId": "user_d"}"#,
                "not json",
            ],
        );
        write_table(
            &snapshot,
            POINTS_TABLE,
            &[
                r#"{"userId": "user_a", "pointsEarned": 5, "_creationTime": 20}"#,
                r#"{"userId": "user_a", "pointsEarned": 10, "_creationTime": 10}"#,
                r#"{"userId": "user_d", "pointsEarned": 1, "_creationTime": 5}"#,
            ],
        );
        write_table(
            &snapshot,
            REFERRALS_TABLE,
            &[
                r#"{"referrerId": "user_a", "referredId": "user_b", "_creationTime": 1}"#,
                r#"{"referrerId": "user_d", "referredId": "user_b", "_creationTime": 2}"#,
            ],
        );
        dir
    }

    fn run(dir: &TempDir) -> SyncReport {
        UserDataComparer::new(
            dir.path().join("clerk.csv"),
            dir.path().join("snapshot"),
            dir.path().join("output"),
        )
        .run()
        .unwrap()
    }

    #[test]
    fn counts_and_match_rate() {
        let dir = fixture();
        let report = run(&dir);
        assert_eq!(report.total_clerk_users, 3);
        assert_eq!(report.total_convex_users, 3);
        assert_eq!(report.matched_users, 2);
        assert_eq!(report.clerk_only, 1);
        assert_eq!(report.convex_only, 1);
        assert_eq!(report.total_points_records, 3);
        assert_eq!(report.total_referral_records, 2);
        assert_eq!(report.total_mini_game_records, 0);
        assert_eq!(report.total_unique_users, 4);
        assert_eq!(report.match_rate_percent, 50.0);
    }

    #[test]
    fn output_files_round_trip() {
        let dir = fixture();
        let report = run(&dir);
        let data = load_migration_files(&MigrationPaths::discover(&dir.path().join("output")))
            .unwrap();

        assert_eq!(data.sync_report, Some(report));

        let ids: Vec<&str> = data.linked_users.iter().map(|u| u.clerk_id.as_str()).collect();
        assert_eq!(ids, vec!["user_a", "user_b"]);

        let ann = &data.linked_users[0];
        assert_eq!(ann.convex_id.as_deref(), Some("cx1"));
        assert_eq!(ann.total_points_earned, PointsTotal::Whole(15));
        assert_eq!(ann.points_history[0]["_creationTime"], 10);
        assert_eq!(ann.total_referrals_made, 1);
        assert!(ann.has_clerk_data && ann.has_convex_data);
        assert_eq!(ann.clerk_data["primary_email_address"], Value::Null);

        let bob = &data.linked_users[1];
        assert_eq!(bob.clerk_data["first_name"], "Bob");
        assert_eq!(bob.referred_by.as_ref().unwrap()["referrerId"], "user_a");

        let unmatched: Vec<(&str, &str)> = data
            .unmatched_users
            .iter()
            .map(|u| (u.id.as_str(), u.reason.as_str()))
            .collect();
        assert_eq!(
            unmatched,
            vec![("user_c", "missing_in_convex"), ("user_d", "missing_in_clerk")]
        );
    }

    #[test]
    fn records_without_group_key_are_not_counted() {
        let dir = fixture();
        let snapshot = dir.path().join("snapshot");
        write_table(
            &snapshot,
            POINTS_TABLE,
            &[
                r#"{"userId": "user_a", "pointsEarned": 2}"#,
                r#"{"userId": "  ", "pointsEarned": 9}"#,
            ],
        );
        write_table(
            &snapshot,
            REFERRALS_TABLE,
            &[
                r#"{"referrerId": "user_a", "referredId": "user_b"}"#,
                r#"{"referredId": "user_c"}"#,
            ],
        );
        write_table(
            &snapshot,
            MINI_GAMES_TABLE,
            &[r#"{"userId": "user_b", "gameId": "g1"}"#, r#"{"gameId": "g2"}"#],
        );

        let report = run(&dir);
        assert_eq!(report.total_points_records, 1);
        assert_eq!(report.total_referral_records, 1);
        assert_eq!(report.total_mini_game_records, 1);
    }

    #[test]
    fn points_total_keeps_integers_whole() {
        let dir = fixture();
        run(&dir);
        let linked = fs::read_to_string(dir.path().join("output").join(LINKED_USERS_FILE)).unwrap();
        assert!(linked.contains("\"totalPointsEarned\":15,"));

        write_table(
            &dir.path().join("snapshot"),
            POINTS_TABLE,
            &[
                r#"{"userId": "user_a", "pointsEarned": 1}"#,
                r#"{"userId": "user_a", "pointsEarned": 1.5}"#,
            ],
        );
        run(&dir);
        let data = load_migration_files(&MigrationPaths::discover(&dir.path().join("output")))
            .unwrap();
        assert_eq!(data.linked_users[0].total_points_earned, PointsTotal::Fractional(2.5));
    }

    #[test]
    fn empty_inputs_give_zero_rate() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("clerk.csv"), "id,first_name\n").unwrap();
        fs::create_dir_all(dir.path().join("snapshot")).unwrap();

        let report = run(&dir);
        assert_eq!(report.total_unique_users, 0);
        assert_eq!(report.match_rate_percent, 0.0);
        assert!(dir.path().join("output").join(SYNC_REPORT_FILE).exists());
    }
}
