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

use std::env;
use std::error::Error;

use getopts::Options;
use tracing::info;

use itemknn::io;
use itemknn::{ItemwiseBuildContextBuilder, Normalizer};

fn main() {

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("i", "inputfile", "Input file name (required). The input consists of ratings \
        of items by users. The input file must contain a user, an item and a rating per line, \
        optionally followed by a timestamp, separated by tabs. All ratings of an item must be on \
        consecutive lines.", "PATH");
    opts.optopt("o", "outputfile", "Output file name (optional, output will be written to stdout \
        by default).", "PATH");
    opts.optopt("n", "normalizer", "Normalization applied to the ratings of each item, one of \
        'identity', 'mean' or 'zscore' (optional, defaults to 'mean').", "NAME");
    opts.optopt("d", "damping", "Damping for the item mean or deviation (optional, defaults \
        to 0).", "NUMBER");
    opts.optopt("l", "log-level", "One of 'error', 'warn', 'info', 'debug' or 'trace' \
        (optional, defaults to 'info').", "LEVEL");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    let ratings_path = match matches.opt_str("i") {
        Some(path) => path,
        None => return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify an inputfile via --inputfile."),
        ),
    };

    let output_path = matches.opt_str("o");

    let damping: f64 = match matches.opt_get_default("d", 0.0) {
        Ok(damping) => damping,
        Err(failure) => {
            let hint = format!("Problem with option 'd': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let normalizer = match matches.opt_str("n").as_ref().map(String::as_str) {
        Some("identity") => Normalizer::Identity,
        Some("mean") | None => Normalizer::MeanCentering { damping, global_mean: 0.0 },
        Some("zscore") => Normalizer::MeanVariance { damping },
        Some(other) => {
            let hint = format!("Unknown normalizer '{}'.", other);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let log_level = match matches.opt_str("l").as_ref().map(String::as_str) {
        Some("error") => tracing::Level::ERROR,
        Some("warn") => tracing::Level::WARN,
        Some("debug") => tracing::Level::DEBUG,
        Some("trace") => tracing::Level::TRACE,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(failure) = compute_context(&ratings_path, normalizer, output_path) {
        eprintln!("Failed to build context: {}", failure);
        std::process::exit(1);
    }
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
}

fn compute_context(
    ratings_path: &str,
    normalizer: Normalizer,
    output_path: Option<String>
) -> Result<(), Box<dyn Error>> {

    info!("Reading {} to build the item context", ratings_path);

    let source = io::CsvRatingSource::new(ratings_path);
    let mut builder = ItemwiseBuildContextBuilder::new(source, normalizer);
    let context = builder.build()?;

    let summary = context.summary();
    info!(
        "Found {} ratings between {} users and {} items.",
        summary.num_ratings,
        summary.num_users,
        summary.num_items,
    );

    info!("Writing item vectors...");
    io::write_context(&context, output_path)?;

    Ok(())
}
