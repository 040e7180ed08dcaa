/**
 * ItemKNN
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::fmt::Debug;

use thiserror::Error;

use crate::vectors::{MutableSparseVector, VectorError};

#[derive(Debug, Error, PartialEq, Clone)]
pub enum NormalizeError {
    #[error(transparent)]
    Vector(#[from] VectorError),
    #[error("normalized value {value} for key {key} is not finite")]
    NonFinite { key: i64, value: f64 },
    #[error("{0}")]
    Rejected(String),
}

/// Rewrites the values of an item's rating vector according to some statistical policy. The
/// vector serves both as the reference the statistics are computed from and as the target that
/// is rewritten. Implementations must not depend on anything but the item and the vector.
pub trait ItemVectorNormalizer: Debug {
    fn normalize(&self, item: i64, vector: &mut MutableSparseVector) -> Result<(), NormalizeError>;
}

impl<'a, N: ItemVectorNormalizer + ?Sized> ItemVectorNormalizer for &'a N {
    fn normalize(&self, item: i64, vector: &mut MutableSparseVector) -> Result<(), NormalizeError> {
        (**self).normalize(item, vector)
    }
}

impl<N: ItemVectorNormalizer + ?Sized> ItemVectorNormalizer for Box<N> {
    fn normalize(&self, item: i64, vector: &mut MutableSparseVector) -> Result<(), NormalizeError> {
        (**self).normalize(item, vector)
    }
}

/// The built-in normalization policies.
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum Normalizer {
    /// Leaves ratings untouched.
    Identity,
    /// Subtracts the item mean. With a positive `damping`, the mean is shrunk towards
    /// `global_mean` as if `damping` extra ratings of that value had been observed.
    MeanCentering { damping: f64, global_mean: f64 },
    /// Converts ratings to z-scores. `damping` is added to the sum of squared deviations and to
    /// the count, which keeps the deviation of sparsely rated items away from zero.
    MeanVariance { damping: f64 },
}

impl Normalizer {

    pub fn mean_centering() -> Self {
        Normalizer::MeanCentering { damping: 0.0, global_mean: 0.0 }
    }

    pub fn z_score() -> Self {
        Normalizer::MeanVariance { damping: 0.0 }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::Identity
    }
}

impl ItemVectorNormalizer for Normalizer {

    fn normalize(&self, _item: i64, vector: &mut MutableSparseVector) -> Result<(), NormalizeError> {

        let reference = vector.view()?;
        let count = reference.size() as f64;

        match *self {
            Normalizer::Identity => {},

            Normalizer::MeanCentering { damping, global_mean } => {
                if count + damping > 0.0 {
                    let mean = (reference.sum() + damping * global_mean) / (count + damping);
                    vector.map_values(|_, value| value - mean)?;
                }
            },

            Normalizer::MeanVariance { damping } => {
                if count > 0.0 {
                    let mean = reference.mean();
                    let squared_deviations: f64 = reference.values().iter()
                        .map(|value| (value - mean) * (value - mean))
                        .sum();

                    let deviation = ((squared_deviations + damping) / (count + damping)).sqrt();

                    if deviation > 0.0 {
                        vector.map_values(|_, value| (value - mean) / deviation)?;
                    } else {
                        vector.map_values(|_, value| value - mean)?;
                    }
                }
            },
        }

        Ok(())
    }
}
