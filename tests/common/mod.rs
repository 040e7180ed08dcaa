#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use itemknn::{ItemRatings, ItemVectorNormalizer, MutableSparseVector, NormalizeError, Rating,
    RatingStream, RatingStreamSource, SourceError};

/// Source over fixed groups that remembers how often its streams were opened and closed and can
/// be told to fail when a given group is requested.
pub struct SpySource {
    groups: Vec<(i64, Vec<Rating>)>,
    fail_at: Option<usize>,
    pub opened: Rc<Cell<usize>>,
    pub closed: Rc<Cell<usize>>,
}

impl SpySource {

    pub fn new(groups: Vec<(i64, Vec<Rating>)>) -> Self {
        SpySource {
            groups,
            fail_at: None,
            opened: Rc::new(Cell::new(0)),
            closed: Rc::new(Cell::new(0)),
        }
    }

    pub fn from_ratings(ratings: &[(i64, i64, f64)]) -> Self {
        let mut groups: Vec<(i64, Vec<Rating>)> = Vec::new();

        for &(user, item, value) in ratings {
            let rating = Rating::new(user, item, value);
            match groups.iter_mut().find(|group| group.0 == item) {
                Some(group) => group.1.push(rating),
                None => groups.push((item, vec![rating])),
            }
        }

        SpySource::new(groups)
    }

    /// Fails when the group at `position` (counting from zero) is requested.
    pub fn failing_at(mut self, position: usize) -> Self {
        self.fail_at = Some(position);
        self
    }
}

impl RatingStreamSource for SpySource {
    type Stream = SpyStream;

    fn grouped_by_item(&mut self) -> Result<SpyStream, SourceError> {
        self.opened.set(self.opened.get() + 1);

        Ok(SpyStream {
            groups: self.groups.clone(),
            position: 0,
            fail_at: self.fail_at,
            carrier: Vec::new(),
            closed: Rc::clone(&self.closed),
        })
    }
}

pub struct SpyStream {
    groups: Vec<(i64, Vec<Rating>)>,
    position: usize,
    fail_at: Option<usize>,
    carrier: Vec<Rating>,
    closed: Rc<Cell<usize>>,
}

impl RatingStream for SpyStream {

    fn next_group(&mut self) -> Result<Option<ItemRatings<'_>>, SourceError> {
        if self.fail_at == Some(self.position) {
            return Err(SourceError::Other(format!("cursor broke at group {}", self.position)));
        }

        if self.position >= self.groups.len() {
            return Ok(None);
        }

        let item = self.groups[self.position].0;
        self.carrier.clear();
        self.carrier.extend_from_slice(&self.groups[self.position].1);
        self.position += 1;

        Ok(Some(ItemRatings { item, ratings: &self.carrier }))
    }

    fn close(&mut self) -> Result<(), SourceError> {
        self.closed.set(self.closed.get() + 1);
        Ok(())
    }
}

/// Refuses to normalize one particular item.
#[derive(Debug)]
pub struct RejectingNormalizer {
    pub item: i64,
}

impl ItemVectorNormalizer for RejectingNormalizer {

    fn normalize(&self, item: i64, _: &mut MutableSparseVector) -> Result<(), NormalizeError> {
        if item == self.item {
            Err(NormalizeError::Rejected(format!("cannot drop the ratings of item {}", item)))
        } else {
            Ok(())
        }
    }
}

pub fn assert_close(value: f64, expected: f64) {
    assert!((value - expected).abs() < 1e-9, "{} is not close to {}", value, expected);
}
