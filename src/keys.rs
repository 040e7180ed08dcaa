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

use serde_derive::Serialize;

/// Dense index over a set of long keys. Position `i` maps to the `i`-th smallest key, so the
/// index can be used to lay out per-key data in plain arrays.
#[derive(PartialEq, Eq, Clone, Debug, Default, Serialize)]
pub struct SortedKeyIndex {
    keys: Vec<i64>,
}

impl SortedKeyIndex {

    pub fn from_keys<I>(keys: I) -> Self
        where I: IntoIterator<Item=i64> {

        let mut keys: Vec<i64> = keys.into_iter().collect();
        keys.sort_unstable();
        keys.dedup();
        keys.shrink_to_fit();

        SortedKeyIndex { keys }
    }

    pub fn size(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key_at(&self, position: usize) -> Option<i64> {
        self.keys.get(position).cloned()
    }

    pub fn position_of(&self, key: i64) -> Option<usize> {
        self.keys.binary_search(&key).ok()
    }

    pub fn contains_key(&self, key: i64) -> bool {
        self.position_of(key).is_some()
    }

    pub fn keys(&self) -> &[i64] {
        &self.keys
    }

    pub fn iter<'a>(&'a self) -> impl Iterator<Item=i64> + 'a {
        self.keys.iter().cloned()
    }
}

/// Packed, immutable sorted set of longs.
#[derive(PartialEq, Eq, Clone, Debug, Default, Serialize)]
pub struct LongSortedSet {
    index: SortedKeyIndex,
}

impl LongSortedSet {

    pub fn len(&self) -> usize {
        self.index.size()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: i64) -> bool {
        self.index.contains_key(key)
    }

    pub fn as_slice(&self) -> &[i64] {
        self.index.keys()
    }

    pub fn iter<'a>(&'a self) -> impl Iterator<Item=i64> + 'a {
        self.index.iter()
    }
}

/// Packs a list of longs into a sorted set, sorting it and dropping repeated values.
pub fn packed_set(values: Vec<i64>) -> LongSortedSet {
    LongSortedSet { index: SortedKeyIndex::from_keys(values) }
}
