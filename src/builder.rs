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

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use fnv::FnvHashMap;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::context::BuildContext;
use crate::keys::{self, SortedKeyIndex};
use crate::normalize::{ItemVectorNormalizer, NormalizeError};
use crate::source::{ClosingStream, RatingStreamSource, SourceError};
use crate::types::{self, UserItemSets};
use crate::utils;
use crate::vectors::{MutableSparseVector, SparseVector};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to read ratings{}: {source}", after_item(.item))]
    DataSource { item: Option<i64>, source: SourceError },
    #[error("failed to normalize ratings of item {item}: {source}")]
    Normalizer { item: i64, source: NormalizeError },
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("build was cancelled{}", after_item(.item))]
    Cancelled { item: Option<i64> },
    #[error("item {item} occurs in more than one rating group")]
    DuplicateItemGroup { item: i64 },
}

impl BuildError {

    /// The item the failure is attributed to, if there is one.
    pub fn item(&self) -> Option<i64> {
        match *self {
            BuildError::DataSource { item, .. } => item,
            BuildError::Normalizer { item, .. } => Some(item),
            BuildError::InvalidState(_) => None,
            BuildError::Cancelled { item } => item,
            BuildError::DuplicateItemGroup { item } => Some(item),
        }
    }
}

fn after_item(item: &Option<i64>) -> String {
    match *item {
        Some(item) => format!(" after item {}", item),
        None => String::new(),
    }
}

/// Shared flag for cancelling a running build from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {

    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum BuildState {
    Fresh,
    Building,
    Done,
    Failed,
}

/// Builds a `BuildContext` by normalizing ratings per item rather than per user, which only needs
/// a single pass when the normalization is item-based (e.g. subtracting item means). Make sure to
/// use a compatible normalization for user vectors when scoring.
///
/// A builder is good for exactly one build.
pub struct ItemwiseBuildContextBuilder<S, N> {
    source: S,
    normalizer: N,
    state: BuildState,
}

impl<S, N> ItemwiseBuildContextBuilder<S, N>
    where S: RatingStreamSource, N: ItemVectorNormalizer {

    pub fn new(source: S, normalizer: N) -> Self {
        ItemwiseBuildContextBuilder { source, normalizer, state: BuildState::Fresh }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn build(&mut self) -> Result<BuildContext, BuildError> {
        self.build_with(&CancellationToken::new())
    }

    /// Like `build`, but gives up with `BuildError::Cancelled` as soon as `cancellation` fires.
    /// The token is checked before each item.
    pub fn build_with(
        &mut self,
        cancellation: &CancellationToken,
    ) -> Result<BuildContext, BuildError> {

        if self.state != BuildState::Fresh {
            return Err(BuildError::InvalidState(
                format!("a builder can only be used once, but is {:?}", self.state)));
        }

        self.state = BuildState::Building;

        let result = self.assemble(cancellation);

        self.state = match result {
            Ok(_) => BuildState::Done,
            Err(_) => BuildState::Failed,
        };

        result
    }

    fn assemble(&mut self, cancellation: &CancellationToken) -> Result<BuildContext, BuildError> {

        info!("constructing build context");
        let start = Instant::now();
        debug!("using normalizer {:?}", self.normalizer);

        let stream = self.source.grouped_by_item()
            .map_err(|source| BuildError::DataSource { item: None, source })?;

        // Closes the stream when dropped, so every early return releases it.
        let mut stream = ClosingStream::new(stream);

        debug!("building item data");
        let mut user_items = types::new_user_item_lists(1000);
        let mut item_vectors: FnvHashMap<i64, SparseVector> =
            FnvHashMap::with_capacity_and_hasher(1000, Default::default());

        let mut last_item: Option<i64> = None;

        loop {
            if cancellation.is_cancelled() {
                return Err(BuildError::Cancelled { item: last_item });
            }

            let group = match stream.next_group() {
                Ok(Some(group)) => group,
                Ok(None) => break,
                Err(source) => return Err(BuildError::DataSource { item: last_item, source }),
            };

            let item = group.item;

            if item_vectors.contains_key(&item) {
                return Err(BuildError::DuplicateItemGroup { item });
            }

            trace!("processing {} ratings for item {}", group.ratings.len(), item);

            let mut vector = MutableSparseVector::from_ratings(group.ratings);

            self.normalizer.normalize(item, &mut vector)
                .map_err(|source| BuildError::Normalizer { item, source })?;

            let vector = vector.freeze()
                .map_err(|failure| BuildError::Normalizer { item, source: failure.into() })?;

            if let Some((key, value)) = vector.iter().find(|&(_, value)| !value.is_finite()) {
                return Err(BuildError::Normalizer {
                    item,
                    source: NormalizeError::NonFinite { key, value },
                });
            }

            for user in vector.keys() {
                // lists are cheap to append to, and we see each item only once
                user_items.entry(*user).or_insert_with(Vec::new).push(item);
            }

            item_vectors.insert(item, vector);
            last_item = Some(item);
        }

        stream.close().map_err(|source| BuildError::DataSource { item: last_item, source })?;

        debug!("packing item sets of {} users", user_items.len());
        let user_item_sets: UserItemSets = user_items.into_iter()
            .map(|(user, items)| (user, keys::packed_set(items)))
            .collect();

        let mut entries: Vec<(i64, SparseVector)> = item_vectors.into_iter().collect();
        entries.sort_unstable_by_key(|&(item, _)| item);

        let (item_ids, item_data): (Vec<i64>, Vec<SparseVector>) = entries.into_iter().unzip();
        let items = SortedKeyIndex::from_keys(item_ids);

        info!(
            "finished build context for {} items in {}ms",
            items.size(),
            utils::to_millis(start.elapsed()),
        );

        Ok(BuildContext::new(items, item_data, user_item_sets))
    }
}


#[cfg(test)]
mod tests {

    use crate::builder::{BuildError, BuildState, CancellationToken, ItemwiseBuildContextBuilder};
    use crate::normalize::{ItemVectorNormalizer, NormalizeError, Normalizer};
    use crate::source::MemoryRatingSource;
    use crate::types::Rating;
    use crate::vectors::MutableSparseVector;

    #[derive(Debug)]
    struct FreezingNormalizer;

    impl ItemVectorNormalizer for FreezingNormalizer {
        fn normalize(&self, _: i64, vector: &mut MutableSparseVector) -> Result<(), NormalizeError> {
            vector.freeze()?;
            Ok(())
        }
    }

    #[derive(Debug)]
    struct DividingByZero;

    impl ItemVectorNormalizer for DividingByZero {
        fn normalize(&self, _: i64, vector: &mut MutableSparseVector) -> Result<(), NormalizeError> {
            vector.map_values(|_, value| value / 0.0)?;
            Ok(())
        }
    }

    fn ratings() -> MemoryRatingSource {
        MemoryRatingSource::new(vec![
            Rating::new(1, 10, 3.0),
            Rating::new(2, 10, 5.0),
            Rating::new(2, 20, 1.0),
        ])
    }

    #[test]
    fn state_transitions() {
        let mut builder = ItemwiseBuildContextBuilder::new(ratings(), Normalizer::Identity);
        assert_eq!(builder.state(), BuildState::Fresh);

        builder.build().unwrap();
        assert_eq!(builder.state(), BuildState::Done);

        match builder.build() {
            Err(BuildError::InvalidState(_)) => {},
            other => panic!("expected an invalid state, got {:?}", other),
        }
        assert_eq!(builder.state(), BuildState::Done);
    }

    #[test]
    fn failed_builder_cannot_be_reused() {
        let mut builder = ItemwiseBuildContextBuilder::new(ratings(), DividingByZero);

        assert!(builder.build().is_err());
        assert_eq!(builder.state(), BuildState::Failed);

        match builder.build() {
            Err(BuildError::InvalidState(_)) => {},
            other => panic!("expected an invalid state, got {:?}", other),
        }
    }

    #[test]
    fn cancelled_before_start() {
        let cancellation = CancellationToken::new();
        cancellation.cancel();

        let mut builder = ItemwiseBuildContextBuilder::new(ratings(), Normalizer::Identity);

        match builder.build_with(&cancellation) {
            Err(BuildError::Cancelled { item: None }) => {},
            other => panic!("expected a cancellation, got {:?}", other),
        }
        assert_eq!(builder.state(), BuildState::Failed);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut builder = ItemwiseBuildContextBuilder::new(ratings(), DividingByZero);

        match builder.build() {
            Err(BuildError::Normalizer { item: 10, source: NormalizeError::NonFinite { .. } }) => {},
            other => panic!("expected a normalizer error, got {:?}", other),
        }
    }

    #[test]
    fn normalizer_must_not_freeze() {
        let mut builder = ItemwiseBuildContextBuilder::new(ratings(), FreezingNormalizer);

        let failure = builder.build().unwrap_err();
        assert_eq!(failure.item(), Some(10));
        assert!(failure.to_string().contains("item 10"));
    }

    #[test]
    fn error_messages_name_the_item() {
        let cancelled = BuildError::Cancelled { item: Some(42) };
        assert_eq!(cancelled.to_string(), "build was cancelled after item 42");

        let cancelled = BuildError::Cancelled { item: None };
        assert_eq!(cancelled.to_string(), "build was cancelled");

        let duplicate = BuildError::DuplicateItemGroup { item: 7 };
        assert_eq!(duplicate.item(), Some(7));
    }
}
