use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::debug;

use super::error::{MongoDaoError, MongoResult};

const PING_ATTEMPTS: u32 = 10;
const FIRST_PING_DELAY: Duration = Duration::from_millis(250);
const MAX_PING_DELAY: Duration = Duration::from_secs(5);

/// Build a client and wait until the server answers a ping.
///
/// The storage supervisor retries on its own schedule once this gives up.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);
    wait_for_ping(&database).await?;
    Ok((client, database))
}

async fn wait_for_ping(database: &Database) -> MongoResult<()> {
    let mut delay = FIRST_PING_DELAY;
    for attempt in 1..=PING_ATTEMPTS {
        let err = match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => return Ok(()),
            Err(err) => err,
        };
        if attempt == PING_ATTEMPTS {
            return Err(MongoDaoError::InitialPing {
                attempts: attempt,
                source: err,
            });
        }
        debug!(attempt, database = database.name(), error = %err, "MongoDB ping failed; retrying");
        sleep(delay).await;
        delay = delay.saturating_mul(2).min(MAX_PING_DELAY);
    }
    Ok(())
}
