//! Fixed signal tables for schema classification.
//!
//! Classification is deterministic keyword matching over table and column
//! names; the constants here are the whole vocabulary. Weights and
//! confidences attached to each signal live with the classifiers.

use seedwright_core::{ContentDomain, SchemaSnapshot};

/// Tables whose presence indicates a team/organization platform.
pub const TEAM_TABLES: &[&str] = &[
    "teams",
    "team_members",
    "organizations",
    "organization_members",
    "memberships",
    "invitations",
    "workspaces",
    "workspace_members",
];

/// Tables whose presence indicates per-user account modeling.
pub const USER_TABLES: &[&str] = &["users", "profiles", "accounts", "user_settings"];

/// Columns that mark the personal/team hybrid account idiom.
pub const PERSONAL_ACCOUNT_COLUMNS: &[&str] =
    &["is_personal_account", "personal_account", "is_personal"];

/// Columns that indicate membership of a team-scoped entity.
pub const MEMBERSHIP_COLUMNS: &[&str] = &["team_id", "organization_id", "workspace_id"];

/// Keyword vocabulary per content domain. Generic has no keywords; it is
/// the baseline every schema scores against.
pub fn domain_keywords(domain: ContentDomain) -> &'static [&'static str] {
    match domain {
        ContentDomain::Outdoor => &[
            "trails",
            "campsites",
            "gear",
            "activities",
            "parks",
            "routes",
            "hikes",
            "expeditions",
        ],
        ContentDomain::Saas => &[
            "subscriptions",
            "plans",
            "invoices",
            "billing_customers",
            "features",
            "api_keys",
            "usage_records",
            "webhooks",
        ],
        ContentDomain::Ecommerce => &[
            "products",
            "orders",
            "order_items",
            "carts",
            "cart_items",
            "payments",
            "inventory",
            "shipments",
        ],
        ContentDomain::Social => &[
            "posts",
            "comments",
            "likes",
            "follows",
            "followers",
            "messages",
            "notifications",
            "feeds",
        ],
        ContentDomain::Generic => &[],
    }
}

/// Team-named tables found in the snapshot.
pub fn team_tables_present(snapshot: &SchemaSnapshot) -> Vec<String> {
    let names = snapshot.table_names();
    TEAM_TABLES
        .iter()
        .filter(|table| names.iter().any(|name| name == *table))
        .map(|table| table.to_string())
        .collect()
}

/// User-named tables found in the snapshot.
pub fn user_tables_present(snapshot: &SchemaSnapshot) -> Vec<String> {
    let names = snapshot.table_names();
    USER_TABLES
        .iter()
        .filter(|table| names.iter().any(|name| name == *table))
        .map(|table| table.to_string())
        .collect()
}

/// True when any table carries a personal-account marker column.
pub fn has_personal_account_marker(snapshot: &SchemaSnapshot) -> bool {
    PERSONAL_ACCOUNT_COLUMNS
        .iter()
        .any(|column| snapshot.has_column(column))
}

/// Membership columns found anywhere in the snapshot.
pub fn membership_columns_present(snapshot: &SchemaSnapshot) -> Vec<String> {
    MEMBERSHIP_COLUMNS
        .iter()
        .filter(|column| snapshot.has_column(column))
        .map(|column| column.to_string())
        .collect()
}

/// Domain keyword tables found in the snapshot for one domain.
pub fn domain_tables_present(snapshot: &SchemaSnapshot, domain: ContentDomain) -> Vec<String> {
    let names = snapshot.table_names();
    domain_keywords(domain)
        .iter()
        .filter(|keyword| names.iter().any(|name| name == *keyword))
        .map(|keyword| keyword.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedwright_core::{ColumnInfo, TableInfo};

    fn snapshot_with(tables: &[(&str, &[&str])]) -> SchemaSnapshot {
        SchemaSnapshot {
            tables: tables
                .iter()
                .map(|(name, columns)| TableInfo {
                    name: name.to_string(),
                    columns: columns
                        .iter()
                        .map(|column| ColumnInfo {
                            name: column.to_string(),
                            data_type: "text".to_string(),
                            is_nullable: true,
                        })
                        .collect(),
                })
                .collect(),
            relationships: Vec::new(),
            integrity_rules: Vec::new(),
        }
    }

    #[test]
    fn finds_team_signals() {
        let snapshot = snapshot_with(&[("teams", &["id"]), ("team_members", &["team_id"])]);
        assert_eq!(team_tables_present(&snapshot), vec!["teams", "team_members"]);
        assert_eq!(membership_columns_present(&snapshot), vec!["team_id"]);
    }

    #[test]
    fn finds_personal_account_marker() {
        let snapshot = snapshot_with(&[("accounts", &["id", "is_personal_account"])]);
        assert!(has_personal_account_marker(&snapshot));
    }

    #[test]
    fn generic_has_no_keywords() {
        assert!(domain_keywords(ContentDomain::Generic).is_empty());
    }
}
