pub mod types;
pub mod vectors;
pub mod keys;
pub mod normalize;
pub mod source;
pub mod io;
pub mod context;
pub mod builder;
pub mod utils;


pub use crate::builder::{BuildError, BuildState, CancellationToken, ItemwiseBuildContextBuilder};
pub use crate::context::{BuildContext, ContextSummary};
pub use crate::keys::{LongSortedSet, SortedKeyIndex};
pub use crate::normalize::{ItemVectorNormalizer, NormalizeError, Normalizer};
pub use crate::source::{MemoryRatingSource, RatingStream, RatingStreamSource, SourceError};
pub use crate::types::{ItemRatings, Rating};
pub use crate::vectors::{MutableSparseVector, SparseVector, VectorError};


/// Streams the ratings of `source` item by item, normalizes each item's rating vector with
/// `normalizer` and collects the result, together with the items rated by every user, into a
/// `BuildContext`. The stream is closed again on every path.
pub fn build_context<S, N>(source: S, normalizer: N) -> Result<BuildContext, BuildError>
    where S: RatingStreamSource, N: ItemVectorNormalizer {

    ItemwiseBuildContextBuilder::new(source, normalizer).build()
}
