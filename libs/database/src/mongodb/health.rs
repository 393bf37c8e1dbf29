use mongodb::{Client, bson::doc};

use super::MongoError;

/// Check MongoDB health with a `ping` against `database`.
///
/// # Example
/// ```ignore
/// use database::mongodb::check_health;
///
/// check_health(&client, "inventory").await?;
/// ```
pub async fn check_health(client: &Client, database: &str) -> Result<(), MongoError> {
    client
        .database(database)
        .run_command(doc! { "ping": 1 })
        .await?;
    Ok(())
}
