use reqwest::Method;
use tracing::warn;

use super::{Address, Exchange, HttpClient};
use crate::error::CalSyncResult;
use crate::fingerprint::fingerprint;
use crate::outcome::SyncOutcome;
use crate::store::ResourceStore;

/// Fetch a remote calendar and materialize it as the current file.
///
/// Nothing on disk changes until the response has been accepted as a
/// calendar; the trace log is written either way.
pub(crate) async fn pull(
    store: &ResourceStore,
    address: &str,
    http: &HttpClient,
) -> CalSyncResult<SyncOutcome> {
    let address = Address::parse(address);
    let response = http.request(Method::GET, &address).send().await?;

    let exchange = Exchange::read(response).await?;
    store.write_log(&exchange.trace())?;

    if !exchange.status.is_success() {
        warn!(url = %address.url, status = %exchange.status, "remote calendar not available");
        return Ok(SyncOutcome::NotFound);
    }

    if !http.accepts(exchange.content_type()) {
        warn!(
            url = %address.url,
            content_type = exchange.content_type().unwrap_or("(none)"),
            "response is not a calendar"
        );
        return Ok(SyncOutcome::NotFound);
    }

    if store.current_exists() && fingerprint(&exchange.body) == store.current_fingerprint()? {
        return Ok(SyncOutcome::NoChange);
    }

    store.stage_bytes(&exchange.body)?;
    store.commit_temp_as_current()?;
    Ok(SyncOutcome::Ok)
}
