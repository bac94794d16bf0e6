//! Send a JSON `POST` whose body wraps the caller's payload as
//! `{"data": <payload>}`, over reqwest or an in-memory mock transport for
//! deterministic tests.

pub mod adapter;
pub mod mock;
pub mod sender;

pub use reqwest::Method;

pub use adapter::{
    Client, ReqwestTransport, RestBytes, RestError, RestErrorKind, RestFuture, RestRequest,
    RestResponse, RestResult, RestTransport, RestTransportState,
};
pub use mock::{
    MockBehavior, MockBehaviorPlan, MockResponse, MockRestAdapter, MockRestStateSnapshot,
};
pub use sender::{APPLICATION_JSON, CONTENT_TYPE, encode_body, send_post, send_post_empty};
