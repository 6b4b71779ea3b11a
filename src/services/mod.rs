pub mod executor;
pub mod normalizer;
pub mod providers;
pub mod search;

pub use executor::WorkerPool;
pub use normalizer::Normalizer;
pub use providers::{create_resolver, UpstreamResolver};
pub use search::{SearchService, SearchSettings};
