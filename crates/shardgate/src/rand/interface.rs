/// A source of uniformly distributed indices.
///
/// The [`SlotRouter`] draws from it when a key carries nothing to hash. The
/// abstraction lets tests pin the outcome with a fixed source.
///
/// # Example
/// ```
/// use shardgate::RandSource;
///
/// struct FixedRand;
/// impl RandSource for FixedRand {
///     fn below(&self, bound: usize) -> usize {
///         7 % bound
///     }
/// }
///
/// assert_eq!(FixedRand.below(16384), 7);
/// ```
///
/// [`SlotRouter`]: crate::SlotRouter
pub trait RandSource {
    /// Returns a value in `[0, bound)`. `bound` is never zero.
    fn below(&self, bound: usize) -> usize;
}
