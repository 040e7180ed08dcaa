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

use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::io::stdout;
use std::path::{Path, PathBuf};

use serde_derive::Serialize;
use serde_json::json;

use crate::context::BuildContext;
use crate::source::{RatingStream, RatingStreamSource, SourceError};
use crate::types::{ItemRatings, Rating};

/// Reads a CSV input file. We expect NO headers, and a user-item-rating triple per line with tab
/// separation, optionally followed by a timestamp.
pub fn csv_reader(file: &Path) -> Result<csv::Reader<File>, csv::Error> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b'\t')
        .from_path(file)?;

    Ok(reader)
}

/// Rating source backed by a tab-separated file. The file is streamed, so all ratings of an item
/// must be on consecutive lines.
#[derive(Clone, Debug)]
pub struct CsvRatingSource {
    path: PathBuf,
}

impl CsvRatingSource {

    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        CsvRatingSource { path: path.as_ref().to_path_buf() }
    }
}

impl RatingStreamSource for CsvRatingSource {
    type Stream = CsvRatingStream<File>;

    fn grouped_by_item(&mut self) -> Result<CsvRatingStream<File>, SourceError> {
        Ok(CsvRatingStream::from_reader(csv_reader(&self.path)?))
    }
}

/// Turns runs of consecutive lines with the same item into rating groups.
pub struct CsvRatingStream<R: io::Read> {
    reader: Option<csv::Reader<R>>,
    record: csv::StringRecord,
    pending: Option<Rating>,
    buffer: Vec<Rating>,
}

impl<R: io::Read> CsvRatingStream<R> {

    pub fn from_reader(reader: csv::Reader<R>) -> Self {
        CsvRatingStream {
            reader: Some(reader),
            record: csv::StringRecord::new(),
            pending: None,
            buffer: Vec::new(),
        }
    }

    fn read_rating(&mut self) -> Result<Option<Rating>, SourceError> {

        let reader = self.reader.as_mut().ok_or(SourceError::Closed)?;

        if !reader.read_record(&mut self.record)? {
            return Ok(None);
        }

        let line = self.record.position().map(|position| position.line()).unwrap_or(0);

        let rating: Rating = self.record.deserialize(None)
            .map_err(|failure| SourceError::Malformed { line, message: failure.to_string() })?;

        Ok(Some(rating))
    }
}

impl<R: io::Read> RatingStream for CsvRatingStream<R> {

    fn next_group(&mut self) -> Result<Option<ItemRatings<'_>>, SourceError> {

        if self.reader.is_none() {
            return Err(SourceError::Closed);
        }

        let first = match self.pending.take() {
            Some(rating) => rating,
            None => match self.read_rating()? {
                Some(rating) => rating,
                None => return Ok(None),
            },
        };

        let item = first.item;
        self.buffer.clear();
        self.buffer.push(first);

        loop {
            match self.read_rating()? {
                Some(rating) if rating.item == item => self.buffer.push(rating),
                Some(rating) => {
                    self.pending = Some(rating);
                    break;
                },
                None => break,
            }
        }

        Ok(Some(ItemRatings { item, ratings: &self.buffer }))
    }

    fn close(&mut self) -> Result<(), SourceError> {
        self.reader = None;
        self.pending = None;
        self.buffer = Vec::new();
        Ok(())
    }
}

/// Struct used for JSON serialization of the normalized item vectors. Field names will be used
/// in JSON.
#[derive(Serialize)]
struct ItemVector<'a> {
    item: i64,
    users: &'a [i64],
    values: &'a [f64],
}

/// Output the summary and the normalized item vectors of a build context in JSON format, one
/// object per line. If an `output_path` is supplied, we write to a file at the specified path,
/// otherwise, we output to stdout.
pub fn write_context(context: &BuildContext, output_path: Option<String>) -> io::Result<()> {

    let mut out: Box<dyn Write> = match output_path {
        Some(path) => Box::new(File::create(&Path::new(&path))?),
        _ => Box::new(stdout())
    };

    writeln!(out, "{}", json!(context.summary()))?;

    for (item, vector) in context.items().iter().zip(context.item_data().iter()) {

        let item_vector = ItemVector { item, users: vector.keys(), values: vector.values() };

        writeln!(out, "{}", json!(item_vector))?;
    }

    out.flush()
}
