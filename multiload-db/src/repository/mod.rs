pub mod find_by_id;
pub mod find_by_ids;
pub mod transactional;

// Re-exports
pub use find_by_id::*;
pub use find_by_ids::*;
pub use transactional::*;
