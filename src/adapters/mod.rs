// Adapters layer: concrete implementations for external systems (http, blob storage, warehouse).

pub mod archive;
pub mod http;
pub mod storage;
pub mod warehouse;
