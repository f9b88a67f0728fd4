//! Schema initialization tests.
//!
//! Re-running `init_schema` on a live database must stay safe: the migration
//! runner does not surface statement-level "already exists" results.

use docbay_state::migrations;

#[tokio::test]
async fn init_schema_is_idempotent() {
    let db = surrealdb::engine::any::connect("mem://")
        .await
        .expect("connect failed");
    db.use_ns("docbay")
        .use_db("main")
        .await
        .expect("namespace selection failed");

    migrations::init_schema(&db).await.expect("first init failed");
    migrations::init_schema(&db).await.expect("second init failed");
}

#[tokio::test]
async fn fresh_database_starts_empty() {
    let registry = docbay_state::SurrealDocsRegistry::in_memory()
        .await
        .expect("in_memory() failed");

    use docbay_state::DocsRegistry;
    let urls = registry.all_repository_urls().await.expect("query failed");
    assert!(urls.is_empty());
}
