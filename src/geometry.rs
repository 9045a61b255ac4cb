// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Dish positions and the baselines between them.

use rand::Rng;

/// Positions of the dishes along the line \[metres\]. The first dish is always
/// at 0 and positions increase monotonically.
#[derive(Debug, Clone, PartialEq)]
pub struct DishLayout {
    positions: Vec<f64>,
}

impl DishLayout {
    /// Lay out `ndishes` dishes. When `redundant` is true, consecutive dishes
    /// are exactly `ddish` apart. Otherwise each spacing is chosen at random
    /// from `ddish`, `1.25 * ddish` and `1.5 * ddish` using `rng`.
    pub fn new<R: Rng>(ndishes: usize, ddish: f64, redundant: bool, rng: &mut R) -> DishLayout {
        let mut positions = Vec::with_capacity(ndishes);
        let mut current = 0.0;
        for i in 0..ndishes {
            if i > 0 {
                let step = if redundant {
                    ddish
                } else {
                    let k: u8 = rng.gen_range(0..3);
                    ddish * (1.0 + f64::from(k) / 4.0)
                };
                current += step;
            }
            positions.push(current);
        }
        DishLayout { positions }
    }

    /// The dish positions \[metres\].
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    /// The number of dishes.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The distance between the first and last dish \[metres\].
    pub fn extent(&self) -> f64 {
        match (self.positions.first(), self.positions.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Distances between consecutive dishes \[metres\].
    pub fn spacings(&self) -> Vec<f64> {
        self.positions.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// The sorted, distinct consecutive-dish spacings \[metres\]. A redundant
    /// array has exactly one.
    pub fn unique_spacings(&self) -> Vec<f64> {
        sorted_unique(&self.spacings())
    }
}

/// All dish pairs of a [`DishLayout`] and their separations, grouped by
/// separation.
#[derive(Debug, Clone, PartialEq)]
pub struct Baselines {
    /// Dish index pairs `(i, j)` with `i < j`, in combination order.
    pairs: Vec<(usize, usize)>,
    /// `lengths[k]` is the separation of `pairs[k]` \[metres\].
    lengths: Vec<f64>,
    /// Sorted distinct values of `lengths`.
    unique_lengths: Vec<f64>,
    /// `groups[u]` holds the indices into `pairs` whose length is
    /// `unique_lengths[u]`.
    groups: Vec<Vec<usize>>,
}

impl Baselines {
    pub fn new(layout: &DishLayout) -> Baselines {
        let positions = layout.positions();
        let n = positions.len();
        let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        let mut lengths = Vec::with_capacity(pairs.capacity());
        for i in 0..n {
            for j in i + 1..n {
                pairs.push((i, j));
                lengths.push(positions[j] - positions[i]);
            }
        }

        // Lengths are grouped by exact equality; a quasi-redundant layout can
        // produce pairs whose nominal lengths agree but whose floats don't.
        let unique_lengths = sorted_unique(&lengths);
        let mut groups = vec![vec![]; unique_lengths.len()];
        for (i_pair, length) in lengths.iter().enumerate() {
            if let Ok(i_unique) = unique_lengths.binary_search_by(|u| u.total_cmp(length)) {
                groups[i_unique].push(i_pair);
            }
        }

        Baselines {
            pairs,
            lengths,
            unique_lengths,
            groups,
        }
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn lengths(&self) -> &[f64] {
        &self.lengths
    }

    pub fn unique_lengths(&self) -> &[f64] {
        &self.unique_lengths
    }

    /// The number of distinct baseline lengths.
    pub fn num_unique(&self) -> usize {
        self.unique_lengths.len()
    }

    /// The redundancy group for each unique baseline length (indices into
    /// [`Baselines::pairs`]).
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// Iterate over the dish index pairs sharing unique baseline `i_unique`.
    pub fn group_pairs(&self, i_unique: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.groups[i_unique].iter().map(|&k| self.pairs[k])
    }
}

fn sorted_unique(values: &[f64]) -> Vec<f64> {
    let mut unique = values.to_vec();
    unique.sort_unstable_by(f64::total_cmp);
    unique.dedup();
    unique
}
