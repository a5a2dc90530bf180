//! Migration module - Clerk/Convex user matching and its records
mod compare;
mod records;

pub use compare::UserDataComparer;
pub use records::{
    filter_users, load_migration_files, matched_user_details, points_timeline,
    sync_report_summary, unmatched_user_details, MigrationData, MigrationPaths, SyncReport,
    UserFilter, UserKind, UserRef, UserRow,
};
