pub mod store;
pub mod test_utils;

pub use store::InMemoryStore;
