use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::llm::provider::FailureCause;

/// Sends one JSON POST and returns the decoded 2xx body.
///
/// There is no retry: a transport failure or non-2xx status is returned as-is.
/// Timeouts are whatever the blocking client defaults to.
pub(crate) fn post_json<T, R>(
    client: &Client,
    url: &str,
    payload: &T,
    authorize: impl FnOnce(RequestBuilder) -> RequestBuilder,
) -> Result<R, FailureCause>
where
    T: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let request = authorize(client.post(url)).json(payload);
    let response = request.send()?;
    let response = ensure_success(response)?;
    Ok(response.json()?)
}

fn ensure_success(response: Response) -> Result<Response, FailureCause> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(FailureCause::Api { status, body })
}
