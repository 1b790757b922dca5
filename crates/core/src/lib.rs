//! Domain core of the Atelier gallery storefront.
//!
//! Artists own collections of art, each art piece is sold through up to
//! three [`catalog::VariantMedium`] formats, users fill a single basket and
//! check out into immutable orders. Persistence sits behind
//! [`store::GalleryStore`]; [`service::Gallery`] enforces the invariants on
//! top of it.

/// Text mapping for enums stored as `TEXT` columns.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {} '{other}'", stringify!($name))),
                }
            }
        }
    };
}

pub mod basket;
pub mod catalog;
pub mod error;
pub mod events;
pub mod exhibition;
pub mod ids;
pub mod message;
pub mod money;
pub mod order;
pub mod payment;
pub mod service;
pub mod store;
pub mod validate;

pub use error::{GalleryError, GalleryResult};
pub use service::Gallery;
