//! Bridges codecs onto `serde`.
//!
//! - [`SerializeDriver`]: a [`Serialize`](serde_core::Serialize) view of any
//!   value whose codec the registry can resolve.
//! - [`DeserializeDriver`]: a [`DeserializeSeed`](serde_core::de::DeserializeSeed)
//!   feeding a deserializer's events into a [`Driver`](crate::builder::Driver).
//!
//! Structures become maps, sequences become sequences and scalars are
//! written as the matching serde primitive. The discriminator of a value
//! travels as its map's first key, [`SPACE_KEY`]:
//!
//! ```text
//! { "shape": { "@type": "circle", "radius": 2 } }
//! ```

// -----------------------------------------------------------------------------
// Modules

mod de;
mod ser;

// -----------------------------------------------------------------------------
// Exports

pub use de::DeserializeDriver;
pub use ser::SerializeDriver;

/// The map key holding a value's discriminator.
pub const SPACE_KEY: &str = "@type";
