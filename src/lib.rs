pub mod core;
pub mod llm;
pub mod models;
pub mod rag;
pub mod server;
pub mod state;
