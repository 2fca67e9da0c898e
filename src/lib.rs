//! Minimum release cover library - shared modules for all binaries.

pub mod contribution;
pub mod docs;
pub mod library;
pub mod models;
pub mod musicbrainz;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod report;
pub mod resolver;
pub mod solver;
pub mod titles;
