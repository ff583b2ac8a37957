//! SQLite crawl tests.
//!
//! This test suite covers:
//! - Schema, table, column, foreign key and trigger introspection
//! - Unsupported categories degrading to catalog warnings
//! - Reduction along foreign keys of a real database
//! - Row counts through a per-table query
//! - Match keys for prefixed table names

#![cfg(feature = "sqlite")]

use schemagraph_core::{
    CrawlOptions, FilterOptions, InformationSchemaKey, InformationSchemaViews, LimitOptions,
    Result, RulePatterns, SchemaCrawler, SqliteMetadataSource, Table,
    models::{ActionTiming, Catalog, EventManipulation, ForeignKeyRule},
};

const SHOP_DDL: &[&str] = &[
    "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
    "CREATE TABLE orders (
        id INTEGER PRIMARY KEY,
        customer_id INTEGER REFERENCES customers(id) ON DELETE CASCADE,
        placed_at TEXT
    )",
    "CREATE TABLE products (id INTEGER PRIMARY KEY, sku TEXT)",
    "CREATE TABLE order_items (
        id INTEGER PRIMARY KEY,
        order_id INTEGER NOT NULL REFERENCES orders(id),
        product_id INTEGER REFERENCES products(id),
        quantity INTEGER
    )",
    "CREATE VIEW big_orders AS SELECT * FROM orders",
    "CREATE TRIGGER orders_audit AFTER INSERT ON orders BEGIN SELECT 1; END",
    "INSERT INTO customers (id, name) VALUES (1, 'Ada'), (2, 'Grace')",
];

/// Opens an in-memory database populated with `ddl`.
async fn source_with(ddl: &[&str]) -> Result<SqliteMetadataSource> {
    let source = SqliteMetadataSource::connect("sqlite::memory:").await?;
    for statement in ddl {
        sqlx::query(statement)
            .execute(source.pool())
            .await
            .expect("DDL must apply");
    }
    Ok(source)
}

fn table<'a>(catalog: &'a Catalog, name: &str) -> &'a Table {
    catalog
        .tables()
        .find(|t| t.name == name)
        .unwrap_or_else(|| panic!("table {} not retained", name))
}

fn retained(catalog: &Catalog) -> Vec<&str> {
    let mut names: Vec<&str> = catalog.tables().map(|t| t.name.as_str()).collect();
    names.sort_unstable();
    names
}

#[tokio::test]
async fn test_sqlite_full_crawl() -> Result<()> {
    let source = source_with(SHOP_DDL).await?;

    let result = SchemaCrawler::new(&source, CrawlOptions::new()).crawl().await?;
    let catalog = &result.catalog;

    assert_eq!(catalog.info().product_name, "SQLite");
    let schemas: Vec<&str> = catalog.schemas().map(|s| s.full_name.as_str()).collect();
    assert_eq!(schemas, ["main"]);
    assert_eq!(
        retained(catalog),
        ["big_orders", "customers", "order_items", "orders", "products"]
    );

    let orders = table(catalog, "orders");
    assert_eq!(orders.full_name, "main.orders");
    let columns: Vec<&str> = orders.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, ["id", "customer_id", "placed_at"]);
    assert_eq!(table(catalog, "big_orders").table_type, "VIEW");
    assert!(table(catalog, "big_orders").definition.is_some());

    let customers = table(catalog, "customers");
    assert!(!customers.columns()[1].nullable);

    source.close().await;
    Ok(())
}

#[tokio::test]
async fn test_sqlite_foreign_keys_and_triggers() -> Result<()> {
    let source = source_with(SHOP_DDL).await?;

    let result = SchemaCrawler::new(&source, CrawlOptions::new()).crawl().await?;
    let catalog = &result.catalog;

    let orders = table(catalog, "orders");
    let imported: Vec<_> = catalog.imported_foreign_keys(orders.id).collect();
    assert_eq!(imported.len(), 1);
    let reference = &imported[0].column_references[0];
    assert_eq!(reference.foreign_key_column.column, "customer_id");
    assert_eq!(reference.primary_key_column.column, "id");
    assert_eq!(
        reference.primary_key_column.table,
        table(catalog, "customers").id
    );
    assert_eq!(imported[0].delete_rule, ForeignKeyRule::Cascade);

    let items = table(catalog, "order_items");
    assert_eq!(catalog.imported_foreign_keys(items.id).count(), 2);

    let triggers = orders.triggers();
    assert_eq!(triggers.len(), 1);
    assert_eq!(triggers[0].name, "orders_audit");
    assert_eq!(triggers[0].action_timing, ActionTiming::After);
    assert_eq!(triggers[0].event_manipulation, EventManipulation::Insert);

    source.close().await;
    Ok(())
}

#[tokio::test]
async fn test_sqlite_unsupported_categories_become_warnings() -> Result<()> {
    let source = source_with(SHOP_DDL).await?;

    let result = SchemaCrawler::new(&source, CrawlOptions::new()).crawl().await?;
    let warnings = &result.catalog.info().warnings;

    for category in ["functions", "procedures", "table_constraints"] {
        assert!(
            warnings.iter().any(|w| w.contains(category)),
            "expected a warning for {}, got {:?}",
            category,
            warnings
        );
    }
    assert_eq!(result.catalog.routine_count(), 0);

    source.close().await;
    Ok(())
}

#[tokio::test]
async fn test_sqlite_reduction_follows_foreign_keys() -> Result<()> {
    let source = source_with(SHOP_DDL).await?;
    let options = CrawlOptions::new()
        .with_limit(LimitOptions::new().with_tables(RulePatterns::new("main\\.order_items", "")))
        .with_filter(FilterOptions::new().with_parent_depth(1));

    let result = SchemaCrawler::new(&source, options).crawl().await?;

    assert_eq!(
        retained(&result.catalog),
        ["order_items", "orders", "products"]
    );

    source.close().await;
    Ok(())
}

#[tokio::test]
async fn test_sqlite_row_counts() -> Result<()> {
    let source = source_with(SHOP_DDL).await?;
    let views = InformationSchemaViews::new().with_sql(
        InformationSchemaKey::TableRowCounts,
        "SELECT COUNT(*) AS ROW_COUNT FROM ${table}",
    )?;
    let options = CrawlOptions::new()
        .with_limit(LimitOptions::new().with_tables(RulePatterns::new("main\\.customers", "")))
        .with_information_schema_views(views)
        .with_row_counts(true);

    let result = SchemaCrawler::new(&source, options).crawl().await?;

    assert_eq!(table(&result.catalog, "customers").row_count, Some(2));
    assert!(result.catalog.info().warnings.iter().all(|w| !w.contains("count")));

    source.close().await;
    Ok(())
}

#[tokio::test]
async fn test_sqlite_match_keys_for_prefixed_tables() -> Result<()> {
    let source = source_with(&[
        "CREATE TABLE app_user (id INTEGER PRIMARY KEY)",
        "CREATE TABLE app_role (id INTEGER PRIMARY KEY)",
        "CREATE TABLE app_role_user (user_id INTEGER, role_id INTEGER)",
    ])
    .await?;

    let result = SchemaCrawler::new(&source, CrawlOptions::new()).crawl().await?;
    let catalog = &result.catalog;
    let match_keys = result.match_keys.as_ref().expect("inference is on by default");

    assert_eq!(retained(catalog), ["app_role", "app_role_user", "app_user"]);
    let keys = match_keys.get(table(catalog, "app_role_user").id);
    assert!(keys.iter().any(|k| k == "role_user"), "keys: {:?}", keys);
    assert_eq!(match_keys.prefixes(), ["app_", ""]);

    source.close().await;
    Ok(())
}
