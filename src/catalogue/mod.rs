pub mod config;
pub mod document;
pub mod facets;
pub mod index;
pub mod language;
pub mod materials;
pub mod metadata;
pub mod paths;
pub mod pipeline;
pub mod projection;
pub mod scripts;
pub mod store;
pub mod tfidf;
