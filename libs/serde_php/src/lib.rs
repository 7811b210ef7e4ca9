//! # PHP serialization format
//!
//! Serde support for the text format produced by PHP's `serialize` and read
//! by its `unserialize`, restricted to integers, floats, strings, and arrays.
//! The format is self-describing, so deserializing any is supported.
//!
//! The types in this serialization format are as follows:
//!
//! - `i:<n>;`: decimal integer
//! - `d:<f>;`: decimal float, or `INF`, `-INF`, `NAN`
//! - `s:<len>:"<bytes>";`: string of exactly `len` raw bytes. The payload is
//!   not escaped and may contain quotes, semicolons, or anything else.
//! - `a:<n>:{<key><value>...}`: ordered array of `n` entries, each an integer
//!   or string key followed by a value
//!
//! Rust types map to these as follows:
//!
//! - integer: all integer types
//! - float: [`f32`] and [`f64`]
//! - string: [`str`], [`char`], byte slices, and unit enum variants by name
//! - array: structs keyed by their converted field names, maps, and
//!   sequences keyed by their index
//!
//! Booleans, null, objects, and references are not supported in either
//! direction. Options are written as their content and always read as
//! [`Some`].
//!
//! Struct field names don't have to match the keys on the wire verbatim.
//! Instead, every key is passed through a [`NameConverter`](naming::NameConverter).
//! By default, the deserializer expects `PascalCase` fields and turns
//! `snake_case` keys into those while the serializer does the opposite. Keys
//! that don't match any field are logged and skipped.
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! #[derive(serde::Deserialize)]
//! #[serde(rename_all = "PascalCase")]
//! struct Coupon {
//!     code: String,
//!     max_uses: i64,
//!     products: BTreeMap<i64, String>,
//! }
//!
//! let input = r#"a:3:{s:4:"code";s:4:"SALE";s:8:"max_uses";i:3;s:8:"products";a:1:{i:7;s:3:"cup";}}"#;
//! let coupon: Coupon = serde_php::from_str(input)?;
//! assert_eq!(coupon.code, "SALE");
//! assert_eq!(coupon.max_uses, 3);
//! assert_eq!(coupon.products[&7], "cup");
//! # Ok::<(), serde_php::Error>(())
//! ```

mod codec;
pub mod de;
mod error;
pub mod naming;
mod read;
pub mod ser;
pub mod value;

pub use codec::Codec;
pub use de::{from_reader, from_slice, from_str};
pub use error::{Error, FormatError, Position, Result};
pub use ser::{to_string, to_vec, to_writer};
pub use value::{Key, Value};

#[cfg(test)]
mod tests;
