//! POST helper that wraps a payload as `{"data": <payload>}` and hands the
//! response back untouched.

use std::sync::LazyLock;

use serde::Serialize;
use tracing::debug;

use crate::adapter::{Client, RestBytes, RestError, RestRequest, RestResponse, RestResult};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

static DEFAULT_CLIENT: LazyLock<Client> = LazyLock::new(Client::new);

#[derive(Serialize)]
struct DataEnvelope<'a, T: ?Sized> {
    data: &'a T,
}

/// Serializes as `{}`, the payload used when the caller sends none.
#[derive(Serialize)]
struct EmptyPayload {}

/// Encodes `data` as the compact JSON body `{"data":<data>}`.
pub fn encode_body<T>(data: &T) -> RestResult<RestBytes>
where
    T: Serialize + ?Sized,
{
    sonic_rs::to_vec(&DataEnvelope { data })
        .map(RestBytes::from)
        .map_err(RestError::encode)
}

impl Client {
    /// Issues a single `POST` to `endpoint` with `data` wrapped under the
    /// `data` key.
    ///
    /// `data` is normally an object, but any serializable value is wrapped
    /// as-is: a scalar such as `5` goes out as `{"data":5}`.
    ///
    /// The response is returned whatever its status; only serialization and
    /// transport failures produce an error.
    pub async fn send_post<T>(&self, endpoint: &str, data: &T) -> RestResult<RestResponse>
    where
        T: Serialize + ?Sized,
    {
        let body = encode_body(data)?;
        let request = RestRequest::post(self.resolve(endpoint))
            .with_header(CONTENT_TYPE, APPLICATION_JSON)
            .with_body(body);

        debug!(
            method = %request.method,
            url = %request.url,
            body_len = request.body().len(),
            "sending json post"
        );

        match self.execute(request).await {
            Ok(response) => {
                debug!(
                    status = response.status,
                    elapsed_ms = response.elapsed.as_millis() as u64,
                    "json post completed"
                );
                Ok(response)
            }
            Err(err) => {
                debug!(kind = ?err.kind(), "json post failed");
                Err(err)
            }
        }
    }

    /// Same as [`Client::send_post`] with an empty payload, body `{"data":{}}`.
    pub async fn send_post_empty(&self, endpoint: &str) -> RestResult<RestResponse> {
        self.send_post(endpoint, &EmptyPayload {}).await
    }
}

/// [`Client::send_post`] through a lazily built process-wide reqwest client.
pub async fn send_post<T>(endpoint: &str, data: &T) -> RestResult<RestResponse>
where
    T: Serialize + ?Sized,
{
    DEFAULT_CLIENT.send_post(endpoint, data).await
}

pub async fn send_post_empty(endpoint: &str) -> RestResult<RestResponse> {
    DEFAULT_CLIENT.send_post_empty(endpoint).await
}
