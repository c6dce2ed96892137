//! Named texture and font registry.

mod cache;
mod error;

pub use cache::{decode_rgba8, AssetCache, DecodedImage};
pub use error::AssetError;
