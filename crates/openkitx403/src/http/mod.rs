/*
[INPUT]:  HTTP client configuration and a wallet signer
[OUTPUT]: Authenticated HTTP responses and client errors
[POS]:    HTTP layer - client side of the protocol
[UPDATE]: When adding client options or error sources
*/

pub mod client;
pub mod error;

pub use client::{ClientConfig, OpenKitClient};
pub use error::{ClientError, Result};
