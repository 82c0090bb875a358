pub mod extractor;
pub mod fetcher;
pub mod loader;
