//! SQL helper statements for table housekeeping

/// SQL to check if a table exists
pub fn table_exists_sql(name: &str) -> String {
    format!(
        "SELECT EXISTS (SELECT 1 FROM INFORMATION_SCHEMA.TABLES WHERE TABLES.TABLE_NAME='{name}');"
    )
}

/// SQL to count the rows in a table
pub fn count_sql(name: &str) -> String {
    format!("SELECT COUNT(*) FROM \"{name}\";")
}

/// SQL to estimate the rows in a table from planner statistics, cheap but
/// only as fresh as the last ANALYZE
pub fn estimate_count_sql(name: &str) -> String {
    format!("SELECT reltuples::BIGINT AS estimate FROM pg_class WHERE relname='{name}';")
}

/// SQL to drop a table and its dependent objects
pub fn drop_table_sql(name: &str) -> String {
    format!("DROP TABLE IF EXISTS {name} CASCADE;")
}
