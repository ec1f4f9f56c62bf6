use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::error::{MongoDaoError, MongoResult};

const PING_ATTEMPTS: u32 = 10;
const FIRST_RETRY: Duration = Duration::from_millis(250);
const LONGEST_RETRY: Duration = Duration::from_secs(5);

/// Wait before the ping following failed attempt `attempt` (1-based).
fn retry_delay(attempt: u32) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(16);
    FIRST_RETRY.saturating_mul(factor).min(LONGEST_RETRY)
}

/// Build a client for `database_name` and hold until the server answers a ping.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut attempt = 1;
    loop {
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => {
                debug!(database = database_name, attempt, "MongoDB answered ping");
                return Ok((client, database));
            }
            Err(source) if attempt >= PING_ATTEMPTS => {
                return Err(MongoDaoError::InitialPing {
                    attempts: attempt,
                    source,
                });
            }
            Err(err) => {
                let delay = retry_delay(attempt);
                warn!(
                    database = database_name,
                    attempt,
                    wait_ms = delay.as_millis(),
                    error = %err,
                    "MongoDB not reachable yet; retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_doubles_up_to_the_cap() {
        let delays: Vec<u128> = (1..=7).map(|attempt| retry_delay(attempt).as_millis()).collect();
        assert_eq!(delays, vec![250, 500, 1_000, 2_000, 4_000, 5_000, 5_000]);
        assert_eq!(retry_delay(u32::MAX), LONGEST_RETRY);
    }
}
