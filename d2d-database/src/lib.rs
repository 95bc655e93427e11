pub mod config;
pub mod database;
pub mod models;
pub mod types;

use crate::config::get_database_url;
use crate::models::{characterization_data, kinetic_raw_data, temp_raw_data};
use once_cell::sync::Lazy;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use std::sync::Mutex;

/**
 * The global database connection
 */
static DB_CONN: Lazy<Mutex<Option<DatabaseConnection>>> = Lazy::new(|| Mutex::new(None));

/**
 * Initialize the environment (Just for testing purposes, dotenv is called in the main function of the server)
 *
 * # Returns
 * @return () - The result of the operation
 */
pub fn init() {
    dotenv::dotenv().ok();
}

/**
 * Establish a connection to the database configured in the environment
 *
 * # Returns
 * @return Result<(), sea_orm::DbErr> - The result of the operation
 */
pub async fn setup() -> Result<(), DbErr> {
    let database_url = get_database_url()
        .ok_or_else(|| DbErr::Custom("DB_URL or DB_CONNECT_PARAMS must be set".into()))?;
    setup_with_url(&database_url).await
}

/**
 * Establish a connection to the given database url and store it globally
 *
 * # Arguments
 * @param database_url: &str - The connection url
 *
 * # Returns
 * @return Result<(), sea_orm::DbErr> - The result of the operation
 */
pub async fn setup_with_url(database_url: &str) -> Result<(), DbErr> {
    let mut options = ConnectOptions::new(database_url.to_string());
    // an in-memory sqlite database lives and dies with its single connection
    if database_url.starts_with("sqlite::memory:") {
        options.max_connections(1).min_connections(1);
    }
    options.sqlx_logging(false);
    let db_conn = Database::connect(options).await?;
    let mut db_conn_global = DB_CONN
        .lock()
        .map_err(|_| DbErr::Custom("Database connection lock poisoned".into()))?;
    *db_conn_global = Some(db_conn);
    Ok(())
}

/**
 * Get a reference to the established database connection
 *
 * # Returns
 * @return Result<DatabaseConnection, sea_orm::DbErr> - The database connection or an error
 */
pub async fn get_database_connection() -> Result<DatabaseConnection, DbErr> {
    let db_conn = DB_CONN
        .lock()
        .map_err(|_| DbErr::Custom("Database connection lock poisoned".into()))?;
    if let Some(ref conn) = *db_conn {
        Ok(conn.clone())
    } else {
        Err(DbErr::Custom("Database connection is not established".into()))
    }
}

/**
 * Create the tables for every entity, skipping the ones that already exist
 *
 * # Arguments
 * @param conn: &DatabaseConnection - The database connection
 *
 * # Returns
 * @return Result<(), sea_orm::DbErr> - The result of the operation
 */
pub async fn create_schema(conn: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);
    let mut statements = vec![
        schema.create_table_from_entity(characterization_data::Entity),
        schema.create_table_from_entity(kinetic_raw_data::Entity),
        schema.create_table_from_entity(temp_raw_data::Entity),
    ];
    for statement in statements.iter_mut() {
        statement.if_not_exists();
        conn.execute(backend.build(&*statement)).await?;
    }
    Ok(())
}

/**
 * Sets up a fresh in-memory database with the full schema. Every call replaces
 * the global connection, so callers must run serially.
 */
pub async fn setup_test_environment() {
    init();
    setup_with_url("sqlite::memory:")
        .await
        .expect("Failed to setup database connection.");
    let conn = get_database_connection()
        .await
        .expect("Database connection missing after setup.");
    create_schema(&conn).await.expect("Failed to create schema.");
}
