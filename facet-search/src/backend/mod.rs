//! Search backend implementations.

mod http;
#[cfg(test)]
mod mock;

pub use http::HttpSearchBackend;
#[cfg(test)]
pub use mock::MockSearchBackend;
