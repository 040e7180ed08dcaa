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

use fnv::FnvHashMap;
use serde_derive::{Deserialize, Serialize};

use crate::keys::LongSortedSet;

/// A single observed rating of an item by a user. Fields are in the column order of rating
/// files, the timestamp column is optional.
#[derive(PartialEq, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Rating {
    pub user: i64,
    pub item: i64,
    pub value: f64,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl Rating {

    pub fn new(user: i64, item: i64, value: f64) -> Self {
        Rating { user, item, value, timestamp: None }
    }

    pub fn with_timestamp(user: i64, item: i64, value: f64, timestamp: i64) -> Self {
        Rating { user, item, value, timestamp: Some(timestamp) }
    }
}

/// All ratings of one item, as lent out by a rating stream. The slice borrows the stream's
/// internal buffer, which is reused for the next group.
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct ItemRatings<'a> {
    pub item: i64,
    pub ratings: &'a [Rating],
}

/// Inverted index from a user to the sorted set of items the user rated.
pub type UserItemSets = FnvHashMap<i64, LongSortedSet>;

/// Intermediate per-user item lists, append-only while the rating stream is consumed.
pub type UserItemLists = FnvHashMap<i64, Vec<i64>>;

pub fn new_user_item_lists(capacity: usize) -> UserItemLists {
    FnvHashMap::with_capacity_and_hasher(capacity, Default::default())
}
