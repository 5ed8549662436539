//! A set of helpers for testing

mod http_client;
mod substance;

pub use http_client::{create_test_http_client, get_http_client_from_http_pool};
pub use substance::{RegistryBuilder, SubstanceBuilder};
