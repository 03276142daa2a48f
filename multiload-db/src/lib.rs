pub mod loader;
pub mod models;
pub mod repository;
pub mod session;

pub use loader::MultiLoad;
pub use models::identifiable::Identifiable;
pub use session::unit_of_work::{SharedEntity, UnitOfWork};
