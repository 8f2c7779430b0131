//! Execution client implementations.

mod http;
mod mock;

pub use self::{
    http::HttpExecutionClient,
    mock::{MockExecutionClient, MockExecutionClientBuilder},
};
