use crate::Operation;

/// The external resource client a [`GatedClient`] wraps.
///
/// A backend performs one blocking remote call per [`Operation`]. It is
/// shared by every thread issuing operations through the client, so it must
/// be `Send + Sync`; connection management is entirely its own business.
///
/// [`GatedClient`]: crate::GatedClient
pub trait Backend: Send + Sync {
    type Op: Operation + Sync;
    type Reply: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Performs the remote call.
    fn call(&self, op: &Self::Op) -> Result<Self::Reply, Self::Error>;

    /// Returns `true` for failures that are a normal outcome of the call,
    /// such as a missing row. Benign errors still reach the caller but are
    /// not counted or reported as failures.
    fn is_benign(&self, _error: &Self::Error) -> bool {
        false
    }
}
