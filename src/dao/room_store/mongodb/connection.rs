use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::debug;

use super::error::{MongoDaoError, MongoResult};

const APP_NAME: &str = "guesso-back";
const PING_ATTEMPTS: u32 = 5;
const FIRST_PING_DELAY: Duration = Duration::from_millis(200);
const MAX_PING_DELAY: Duration = Duration::from_secs(3);

/// Doubling delays between ping attempts, capped at [`MAX_PING_DELAY`].
fn ping_delays() -> impl Iterator<Item = Duration> {
    std::iter::successors(Some(FIRST_PING_DELAY), |delay| {
        Some((*delay * 2).min(MAX_PING_DELAY))
    })
}

/// Build a client for `database_name` and wait until the server answers a ping.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let mut options = options.clone();
    options.app_name.get_or_insert_with(|| APP_NAME.to_owned());

    let client = Client::with_options(options)
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut delays = ping_delays();
    let mut attempt = 0;
    loop {
        attempt += 1;
        let err = match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => return Ok((client, database)),
            Err(err) => err,
        };

        if attempt >= PING_ATTEMPTS {
            return Err(MongoDaoError::InitialPing {
                attempts: attempt,
                source: err,
            });
        }

        let delay = delays.next().unwrap_or(MAX_PING_DELAY);
        debug!(attempt, error = %err, ?delay, "mongo ping failed; retrying");
        sleep(delay).await;
    }
}
