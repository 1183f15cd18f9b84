pub mod inference_client;
pub mod pgvector_search;
