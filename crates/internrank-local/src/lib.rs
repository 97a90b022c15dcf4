//! Internship ranking engine plus local collaborator implementations.
//!
//! Engine (pure, synchronous): [`textprep`] -> [`dedup`] -> [`vectorize`] ->
//! [`explain`] -> [`fusion`] -> [`rank`].
//!
//! Collaborators (async, IO): [`store::JsonCatalogStore`], [`extract::PdfExtractor`].

pub mod config;
pub mod dedup;
pub mod explain;
pub mod extract;
pub mod fusion;
pub mod rank;
pub mod store;
pub mod textprep;
pub mod vectorize;

pub use rank::{rank, Ranker};
