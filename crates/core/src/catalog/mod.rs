//! Artists, their collections, art pieces, purchasable variants and media.

pub mod art;
pub mod artist;
pub mod collection;
pub mod media;
pub mod variant;

pub use art::{Art, ArtDetail, ArtFilter, ArtInput, ArtRecord, ArtSummary};
pub use artist::{Artist, ArtistInput};
pub use collection::{Collection, CollectionInput, CollectionView};
pub use media::{HomepageSlot, Media, MediaInput, MediaKind, Placement};
pub use variant::{ArtVariant, VariantInput, VariantMedium};
