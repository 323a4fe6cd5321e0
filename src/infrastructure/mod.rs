pub mod in_memory;
pub mod token_store;
