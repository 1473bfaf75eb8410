use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Statements run at startup. Each one is idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS records (
        id          UUID PRIMARY KEY,
        kind        TEXT NOT NULL,
        data        JSONB NOT NULL DEFAULT '{}'::jsonb,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS records_kind_created_idx ON records (kind, created_at DESC, id DESC)",
    "CREATE INDEX IF NOT EXISTS records_client_ref_idx ON records ((data->>'clientId')) WHERE kind = 'mandate'",
    "CREATE UNIQUE INDEX IF NOT EXISTS records_candidate_email_idx ON records (lower(data->>'email')) WHERE kind = 'candidate'",
];

/// Creates and returns a PostgreSQL connection pool with the schema in place.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");

    for statement in SCHEMA {
        sqlx::query(statement).execute(&pool).await?;
    }
    info!("Database schema ready");

    Ok(pool)
}
