use async_trait::async_trait;
use uuid::Uuid;

use crate::models::identifiable::Identifiable;

/// Generic repository trait for fetching multiple entities by their IDs
///
/// This trait provides the bulk form of [`FindById`](crate::repository::find_by_id::FindById):
/// one call corresponds to exactly one backing-store round trip. Identifiers
/// with no matching row are silently absent from the result; they are not an
/// error. The result carries no ordering guarantee.
///
/// # Type Parameters
/// * `T` - The entity type that must implement Identifiable trait
///
/// # Example
/// ```ignore
/// impl FindByIds<PersonModel> for InMemoryStore<PersonModel> {
///     async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<PersonModel>, Box<dyn Error + Send + Sync>> {
///         // Implementation
///     }
/// }
/// ```
#[async_trait]
pub trait FindByIds<T: Identifiable>: Send + Sync {
    /// Fetch the entities matching the given identifiers in one round trip
    ///
    /// # Arguments
    /// * `ids` - A slice of UUIDs of the entities to fetch
    ///
    /// # Returns
    /// * `Ok(Vec<T>)` - The entities that exist, in no particular order
    /// * `Err` - An error if the query could not be executed
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<T>, Box<dyn std::error::Error + Send + Sync>>;
}
