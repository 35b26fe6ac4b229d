use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use super::{Address, CALENDAR_CONTENT_TYPE, Exchange, HttpClient};
use crate::error::{CalSyncError, CalSyncResult};
use crate::fingerprint::fingerprint;
use crate::outcome::SyncOutcome;
use crate::store::ResourceStore;

/// Upload a locally edited calendar with PUT.
///
/// The snapshot is only replaced after the server accepts the upload, so a
/// failed PUT leaves nothing half-committed.
pub(crate) async fn push(
    store: &ResourceStore,
    address: &str,
    http: &HttpClient,
) -> CalSyncResult<SyncOutcome> {
    if !store.current_exists() {
        return Ok(SyncOutcome::NotFound);
    }

    // Touching metadata alone isn't worth a round-trip.
    if store.current_mtime()? <= store.last_synced_mtime()? {
        return Ok(SyncOutcome::NoChange);
    }

    let data = store.stage_current()?;

    if store.last_synced_exists() && fingerprint(&data) == store.last_synced_fingerprint()? {
        debug!(path = %store.current_path().display(), "mtime changed but content did not");
        return Ok(SyncOutcome::NoChange);
    }

    let address = Address::parse(address);
    let response = http
        .request(Method::PUT, &address)
        .header(CONTENT_TYPE, CALENDAR_CONTENT_TYPE)
        .body(data)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(CalSyncError::HttpStatus {
            method: "PUT",
            url: address.url,
            status: response.status().as_u16(),
        });
    }

    let exchange = Exchange::read(response).await?;
    store.write_log(&exchange.trace())?;

    store.commit_temp_as_last_synced()?;
    Ok(SyncOutcome::Ok)
}
