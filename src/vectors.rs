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

use std::mem;

use fnv::FnvHashMap;
use serde_derive::Serialize;
use thiserror::Error;

use crate::types::Rating;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum VectorError {
    #[error("vector has been frozen and can no longer be used")]
    Frozen,
    #[error("key {0} is not part of the vector's key set")]
    KeyNotFound(i64),
    #[error("keys are not strictly increasing at position {position}")]
    Unsorted { position: usize },
    #[error("got {keys} keys but {values} values")]
    LengthMismatch { keys: usize, values: usize },
}

/// Immutable sparse vector from long keys to double values, stored as two parallel arrays. Keys
/// are strictly increasing, so lookups are binary searches and scans run in key order.
#[derive(PartialEq, Clone, Debug, Default, Serialize)]
pub struct SparseVector {
    keys: Vec<i64>,
    values: Vec<f64>,
}

impl SparseVector {

    pub fn empty() -> Self {
        SparseVector::default()
    }

    pub fn from_parts(keys: Vec<i64>, values: Vec<f64>) -> Result<Self, VectorError> {
        if keys.len() != values.len() {
            return Err(VectorError::LengthMismatch { keys: keys.len(), values: values.len() });
        }

        if let Some(position) = keys.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(VectorError::Unsorted { position: position + 1 });
        }

        Ok(SparseVector { keys, values })
    }

    /// Builds the rating vector of a single item, keyed by user. If a user rated the item more
    /// than once, the rating with the latest timestamp wins. Ratings with equal or missing
    /// timestamps are resolved in favour of the one that comes later in the list.
    pub fn from_ratings(ratings: &[Rating]) -> Self {

        let mut latest: FnvHashMap<i64, (f64, Option<i64>)> =
            FnvHashMap::with_capacity_and_hasher(ratings.len(), Default::default());

        for rating in ratings {
            let superseded = match (latest.get(&rating.user), rating.timestamp) {
                (Some(&(_, Some(seen))), Some(timestamp)) => timestamp < seen,
                _ => false,
            };

            if !superseded {
                latest.insert(rating.user, (rating.value, rating.timestamp));
            }
        }

        let mut entries: Vec<(i64, f64)> = latest.into_iter()
            .map(|(user, (value, _))| (user, value))
            .collect();

        entries.sort_unstable_by_key(|&(user, _)| user);

        let (keys, values): (Vec<i64>, Vec<f64>) = entries.into_iter().unzip();

        SparseVector { keys, values }
    }

    pub fn size(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[i64] {
        &self.keys
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    fn position_of(&self, key: i64) -> Option<usize> {
        self.keys.binary_search(&key).ok()
    }

    pub fn contains_key(&self, key: i64) -> bool {
        self.position_of(key).is_some()
    }

    pub fn get(&self, key: i64) -> Option<f64> {
        self.position_of(key).map(|position| self.values[position])
    }

    /// Entries in ascending key order.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item=(i64, f64)> + 'a {
        self.keys.iter().cloned().zip(self.values.iter().cloned())
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Arithmetic mean of the values, zero for an empty vector.
    pub fn mean(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.sum() / self.size() as f64
        }
    }

    pub fn sum_of_squares(&self) -> f64 {
        self.values.iter().map(|value| value * value).sum()
    }

    pub fn norm(&self) -> f64 {
        self.sum_of_squares().sqrt()
    }

    /// Dot product over the keys both vectors share, computed by merging the sorted key arrays.
    pub fn dot(&self, other: &SparseVector) -> f64 {

        let mut product = 0.0;
        let (mut i, mut j) = (0, 0);

        while i < self.keys.len() && j < other.keys.len() {
            if self.keys[i] < other.keys[j] {
                i += 1;
            } else if self.keys[i] > other.keys[j] {
                j += 1;
            } else {
                product += self.values[i] * other.values[j];
                i += 1;
                j += 1;
            }
        }

        product
    }
}

/// Editable counterpart of `SparseVector`. The key set is fixed at construction; only values can
/// be rewritten. Once frozen, every further use fails with `VectorError::Frozen`.
#[derive(PartialEq, Clone, Debug)]
pub struct MutableSparseVector {
    vector: SparseVector,
    frozen: bool,
}

impl MutableSparseVector {

    pub fn from_ratings(ratings: &[Rating]) -> Self {
        SparseVector::from_ratings(ratings).into()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Read access to the current keys and values.
    pub fn view(&self) -> Result<&SparseVector, VectorError> {
        if self.frozen {
            Err(VectorError::Frozen)
        } else {
            Ok(&self.vector)
        }
    }

    pub fn set(&mut self, key: i64, value: f64) -> Result<(), VectorError> {
        let position = self.view()?
            .position_of(key)
            .ok_or(VectorError::KeyNotFound(key))?;

        self.vector.values[position] = value;

        Ok(())
    }

    pub fn values_mut(&mut self) -> Result<&mut [f64], VectorError> {
        if self.frozen {
            return Err(VectorError::Frozen);
        }

        Ok(&mut self.vector.values)
    }

    /// Rewrites every value as `f(key, value)`.
    pub fn map_values<F>(&mut self, mut f: F) -> Result<(), VectorError>
        where F: FnMut(i64, f64) -> f64 {

        if self.frozen {
            return Err(VectorError::Frozen);
        }

        let SparseVector { ref keys, ref mut values } = self.vector;
        for (key, value) in keys.iter().zip(values.iter_mut()) {
            *value = f(*key, *value);
        }

        Ok(())
    }

    /// Hands out the current contents as an immutable vector and invalidates this one.
    pub fn freeze(&mut self) -> Result<SparseVector, VectorError> {
        if self.frozen {
            return Err(VectorError::Frozen);
        }

        self.frozen = true;

        Ok(mem::replace(&mut self.vector, SparseVector::empty()))
    }
}

impl From<SparseVector> for MutableSparseVector {

    fn from(vector: SparseVector) -> Self {
        MutableSparseVector { vector, frozen: false }
    }
}
