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

use std::io;
use std::iter::FromIterator;

use fnv::FnvHashMap;
use thiserror::Error;
use tracing::warn;

use crate::types::{ItemRatings, Rating};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed rating on line {line}: {message}")]
    Malformed { line: u64, message: String },
    #[error("rating stream has already been closed")]
    Closed,
    #[error("{0}")]
    Other(String),
}

/// A single pass over ratings grouped by item, holding some resource that must be released
/// through `close`.
pub trait RatingStream {

    /// Lends out the next group. The ratings borrow the stream's buffer and are only valid until
    /// the next call. Returns `None` once all groups have been seen.
    fn next_group(&mut self) -> Result<Option<ItemRatings<'_>>, SourceError>;

    fn close(&mut self) -> Result<(), SourceError>;
}

/// Something that can open a stream of ratings grouped by item, with exactly one group per item.
pub trait RatingStreamSource {
    type Stream: RatingStream;

    fn grouped_by_item(&mut self) -> Result<Self::Stream, SourceError>;
}

impl<'a, S: RatingStreamSource + ?Sized> RatingStreamSource for &'a mut S {
    type Stream = S::Stream;

    fn grouped_by_item(&mut self) -> Result<Self::Stream, SourceError> {
        (**self).grouped_by_item()
    }
}

/// Wraps a rating stream and makes sure it is closed exactly once. On the success path, callers
/// close explicitly and see close failures. If the guard is dropped before that, for example
/// because an error is propagated, the stream is closed from `drop` and close failures are only
/// logged.
pub struct ClosingStream<S: RatingStream> {
    stream: S,
    closed: bool,
}

impl<S: RatingStream> ClosingStream<S> {

    pub fn new(stream: S) -> Self {
        ClosingStream { stream, closed: false }
    }

    pub fn next_group(&mut self) -> Result<Option<ItemRatings<'_>>, SourceError> {
        if self.closed {
            return Err(SourceError::Closed);
        }

        self.stream.next_group()
    }

    pub fn close(&mut self) -> Result<(), SourceError> {
        if self.closed {
            return Ok(());
        }

        self.closed = true;
        self.stream.close()
    }
}

impl<S: RatingStream> Drop for ClosingStream<S> {

    fn drop(&mut self) {
        if let Err(failure) = self.close() {
            warn!("failed to close rating stream: {}", failure);
        }
    }
}

/// Rating source over ratings held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryRatingSource {
    groups: Vec<(i64, Vec<Rating>)>,
}

impl MemoryRatingSource {

    /// Groups the ratings by item. Groups come out in the order in which their item first
    /// appears, ratings within a group keep their relative order.
    pub fn new(ratings: Vec<Rating>) -> Self {

        let mut positions: FnvHashMap<i64, usize> = FnvHashMap::default();
        let mut groups: Vec<(i64, Vec<Rating>)> = Vec::new();

        for rating in ratings {
            let position = *positions.entry(rating.item).or_insert_with(|| {
                groups.push((rating.item, Vec::new()));
                groups.len() - 1
            });

            groups[position].1.push(rating);
        }

        MemoryRatingSource { groups }
    }

    /// Takes the groups as they are, without checking that every item occurs only once.
    pub fn from_groups(groups: Vec<(i64, Vec<Rating>)>) -> Self {
        MemoryRatingSource { groups }
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }
}

impl FromIterator<Rating> for MemoryRatingSource {

    fn from_iter<I: IntoIterator<Item=Rating>>(ratings: I) -> Self {
        MemoryRatingSource::new(ratings.into_iter().collect())
    }
}

impl RatingStreamSource for MemoryRatingSource {
    type Stream = MemoryRatingStream;

    fn grouped_by_item(&mut self) -> Result<MemoryRatingStream, SourceError> {
        Ok(MemoryRatingStream {
            groups: self.groups.clone().into_iter(),
            buffer: Vec::new(),
            closed: false,
        })
    }
}

pub struct MemoryRatingStream {
    groups: std::vec::IntoIter<(i64, Vec<Rating>)>,
    buffer: Vec<Rating>,
    closed: bool,
}

impl RatingStream for MemoryRatingStream {

    fn next_group(&mut self) -> Result<Option<ItemRatings<'_>>, SourceError> {
        if self.closed {
            return Err(SourceError::Closed);
        }

        match self.groups.next() {
            Some((item, ratings)) => {
                self.buffer.clear();
                self.buffer.extend(ratings);
                Ok(Some(ItemRatings { item, ratings: &self.buffer }))
            },
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<(), SourceError> {
        self.closed = true;
        self.buffer = Vec::new();
        Ok(())
    }
}
