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

use crate::keys::{LongSortedSet, SortedKeyIndex};
use crate::types::UserItemSets;
use crate::vectors::SparseVector;

/// Everything an item-item similarity model needs to know about the training data: the normalized
/// rating vector of every item, laid out along a sorted item index, and for every user the set
/// of items the user rated.
#[derive(PartialEq, Clone, Debug)]
pub struct BuildContext {
    items: SortedKeyIndex,
    item_data: Vec<SparseVector>,
    user_item_sets: UserItemSets,
    empty: LongSortedSet,
}

/// Basic statistics of a build context.
#[derive(PartialEq, Clone, Debug, Serialize)]
pub struct ContextSummary {
    pub num_items: usize,
    pub num_users: usize,
    pub num_ratings: usize,
    pub density: f64,
}

impl BuildContext {

    /// `item_data[i]` must hold the vector of `items.key_at(i)`.
    pub(crate) fn new(
        items: SortedKeyIndex,
        item_data: Vec<SparseVector>,
        user_item_sets: UserItemSets,
    ) -> Self {

        debug_assert_eq!(items.size(), item_data.len());

        BuildContext { items, item_data, user_item_sets, empty: LongSortedSet::default() }
    }

    pub fn items(&self) -> &SortedKeyIndex {
        &self.items
    }

    /// Item vectors, aligned with the positions of `items()`.
    pub fn item_data(&self) -> &[SparseVector] {
        &self.item_data
    }

    pub fn item_vector(&self, item: i64) -> Option<&SparseVector> {
        self.items.position_of(item).map(|position| &self.item_data[position])
    }

    /// The items rated by `user`, empty for a user we have never seen.
    pub fn user_items(&self, user: i64) -> &LongSortedSet {
        self.user_item_sets.get(&user).unwrap_or(&self.empty)
    }

    pub fn user_item_sets(&self) -> &UserItemSets {
        &self.user_item_sets
    }

    /// All users with at least one rating, in ascending order.
    pub fn users(&self) -> Vec<i64> {
        let mut users: Vec<i64> = self.user_item_sets.keys().cloned().collect();
        users.sort_unstable();
        users
    }

    pub fn num_ratings(&self) -> usize {
        self.item_data.iter().map(|vector| vector.size()).sum()
    }

    pub fn summary(&self) -> ContextSummary {
        let num_items = self.items.size();
        let num_users = self.user_item_sets.len();
        let num_ratings = self.num_ratings();

        let density = if num_items == 0 || num_users == 0 {
            0.0
        } else {
            num_ratings as f64 / (num_items as f64 * num_users as f64)
        };

        ContextSummary { num_items, num_users, num_ratings, density }
    }
}
