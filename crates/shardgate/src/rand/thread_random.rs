use crate::RandSource;
use rand::{Rng, rng};

/// A [`RandSource`] backed by the thread-local RNG (`rand::rng()`).
///
/// Each OS thread has its own generator, so concurrent routers never contend.
/// The type stores nothing and is freely shared across threads.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadRandom;

impl RandSource for ThreadRandom {
    fn below(&self, bound: usize) -> usize {
        rng().random_range(0..bound)
    }
}
