pub mod json_body;
pub mod params;

pub use json_body::{JsonBody, read_json};
pub use params::{IdParam, single_query_param};
