mod client;
mod response;
mod search_url;

pub use client::*;
pub use response::*;
pub use search_url::*;
