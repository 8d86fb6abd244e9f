pub mod pull_request;
pub mod bucket;

pub use pull_request::*;
pub use bucket::*;
