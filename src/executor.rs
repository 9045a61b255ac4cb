// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Running independent units of work.

use rayon::prelude::*;

/// How independent units of work (e.g. one per frequency) are run. Whichever
/// variant is used, results always come back in index order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Executor {
    /// Run each unit one after the other on the calling thread.
    Serial,

    /// Run units on the rayon thread pool. The number of parallel threads can
    /// be controlled by setting `RAYON_NUM_THREADS`.
    #[default]
    Rayon,
}

impl Executor {
    /// Call `f` for every index in `0..n` and gather the results in index
    /// order, regardless of completion order.
    pub fn map_ordered<T, F>(self, n: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        match self {
            Executor::Serial => (0..n).map(f).collect(),
            Executor::Rayon => (0..n).into_par_iter().map(f).collect(),
        }
    }
}
