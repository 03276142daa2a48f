use async_trait::async_trait;

/// Transactional surface of a backing-store session
///
/// Every fetch issued through a session must happen inside a transaction
/// opened with `begin_transaction` and ended with `commit` (or discarded by
/// `close`). Methods take `&self`; implementations keep the transaction
/// state behind interior mutability so a session can be shared with the
/// repositories built on top of it.
///
/// This trait only exposes the transaction boundary. Isolation, locking and
/// rollback semantics belong to the backing store.
#[async_trait]
pub trait Transactional: Send + Sync {
    /// Open a transaction on this session
    ///
    /// # Returns
    /// * `Ok(())` - A transaction is now active
    /// * `Err` - If a transaction is already active or the store refused
    async fn begin_transaction(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Commit the active transaction
    ///
    /// # Returns
    /// * `Ok(())` - The transaction was committed
    /// * `Err` - If no transaction is active or the commit failed
    async fn commit(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Close the session, discarding any still-active transaction
    async fn close(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Whether a transaction is currently active on this session
    fn in_transaction(&self) -> bool;
}
