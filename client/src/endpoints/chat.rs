pub mod chat_request;
pub mod chat_response;

pub use chat_request::*;
pub use chat_response::*;
