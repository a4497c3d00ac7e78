//! Turns a JSON request description into a replayable [`RequestTemplate`](crate::engine::RequestTemplate).

mod builder;
mod encode;
mod model;
mod multipart;

pub use builder::{build_template, BuildContext};
pub use encode::{encode_body, EncodedBody};
pub use model::{load_request_data, RequestData};
