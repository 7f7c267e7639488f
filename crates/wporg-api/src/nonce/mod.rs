// Nonce handling for self-hosted sites
//
// `store` holds the one nonce a client caches; `retrieval` knows how to
// get a fresh one out of an authenticated admin session.

pub mod retrieval;
pub mod store;

pub use retrieval::{NonceRetrieval, RetrievalMethod, scrape_nonce};
pub use store::{Nonce, NonceStore};
