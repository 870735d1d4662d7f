//! Fan-out for the subtree recursion in `subtree::children`.
//!
//! The left and right halves of a subtree are independent until their
//! chaining values meet in a parent node, so the recursion is written against
//! the `Join` trait. `SerialJoin` runs the halves one after the other and is
//! what [`Hasher::update`](crate::Hasher::update) and the all-at-once
//! functions use. `RayonJoin` (behind the `rayon` feature) hands them to
//! [`rayon_core::join`] and backs
//! [`Hasher::update_rayon`](crate::Hasher::update_rayon). Both shapes of the
//! recursion are identical, so both produce identical output.

/// Run two closures and return both results.
pub trait Join {
    fn join<L, R, LOut, ROut>(left: L, right: R) -> (LOut, ROut)
    where
        L: FnOnce() -> LOut + Send,
        R: FnOnce() -> ROut + Send,
        LOut: Send,
        ROut: Send;
}

/// Left, then right, on the calling thread.
pub enum SerialJoin {}

impl Join for SerialJoin {
    #[inline]
    fn join<L, R, LOut, ROut>(left: L, right: R) -> (LOut, ROut)
    where
        L: FnOnce() -> LOut + Send,
        R: FnOnce() -> ROut + Send,
        LOut: Send,
        ROut: Send,
    {
        let left = left();
        (left, right())
    }
}

/// Both sides on the Rayon thread pool, potentially in parallel.
#[cfg(feature = "rayon")]
pub enum RayonJoin {}

#[cfg(feature = "rayon")]
impl Join for RayonJoin {
    #[inline]
    fn join<L, R, LOut, ROut>(left: L, right: R) -> (LOut, ROut)
    where
        L: FnOnce() -> LOut + Send,
        R: FnOnce() -> ROut + Send,
        LOut: Send,
        ROut: Send,
    {
        rayon_core::join(left, right)
    }
}
