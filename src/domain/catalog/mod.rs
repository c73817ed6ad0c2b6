pub mod entity;
pub mod seed;

pub use entity::{Album, ArtistStats, BaseCatalog, CatalogView, Track};
