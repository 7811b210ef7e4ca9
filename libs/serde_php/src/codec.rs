//! A reusable pairing of encoder and decoder settings.

use std::io;

use serde::{de, ser};

use crate::de::{DEFAULT_MAX_DEPTH, Deserializer};
use crate::error::{Error, Result};
use crate::naming::{NameConverter, PascalToUnderscore, UnderscoreToPascal};
use crate::read::{IoRead, SliceRead};
use crate::ser::Serializer;

/// A configured pair of encoder and decoder.
///
/// Holds the [`NameConverter`] used for struct keys in each direction and
/// the options for decoding. It is never mutated by use, so one codec can be
/// shared between threads if its converters can.
///
/// # Examples
///
/// ```
/// use serde_php::Codec;
/// use serde_php::naming::Identity;
///
/// #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
/// struct Item {
///     item_name: String,
/// }
///
/// let codec = Codec::with_converters(Identity, Identity);
/// let text = codec.to_string(&Item { item_name: "cup".to_owned() })?;
/// assert_eq!(text, r#"a:1:{s:9:"item_name";s:3:"cup";}"#);
/// assert_eq!(codec.from_str::<Item>(&text)?.item_name, "cup");
/// # Ok::<(), serde_php::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Codec<D = UnderscoreToPascal, E = PascalToUnderscore> {
    decode: D,
    encode: E,
    max_depth: Option<usize>,
}

impl Codec {
    /// Creates a codec with the default converters.
    pub fn new() -> Self {
        Self::with_converters(UnderscoreToPascal, PascalToUnderscore)
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: NameConverter, E: NameConverter> Codec<D, E> {
    /// Creates a codec with custom converters.
    ///
    /// `decode` converts wire keys to struct field names, `encode` converts
    /// struct field names to wire keys.
    pub fn with_converters(decode: D, encode: E) -> Self {
        Self {
            decode,
            encode,
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }

    /// Sets how deeply arrays may be nested when decoding.
    ///
    /// [`None`] removes the limit.
    #[must_use]
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Creates a deserializer for a slice that uses this codec's settings.
    pub fn slice_deserializer<'de>(&self, buf: &'de [u8]) -> Deserializer<SliceRead<'de>, &D> {
        Deserializer::with_converter(SliceRead::new(buf), &self.decode).max_depth(self.max_depth)
    }

    /// Creates a deserializer for a reader that uses this codec's settings.
    pub fn reader_deserializer<R: io::Read>(&self, reader: R) -> Deserializer<IoRead<R>, &D> {
        Deserializer::with_converter(IoRead::new(reader), &self.decode).max_depth(self.max_depth)
    }

    /// Creates a serializer that uses this codec's settings.
    pub fn serializer<W: io::Write>(&self, writer: W) -> Serializer<W, &E> {
        Serializer::with_converter(writer, &self.encode)
    }

    /// Deserializes a value from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is malformed, doesn't match `T`, or is
    /// followed by trailing bytes.
    pub fn from_slice<'de, T>(&self, buf: &'de [u8]) -> Result<T>
    where
        T: de::Deserialize<'de>,
    {
        let mut de = self.slice_deserializer(buf);
        let value = T::deserialize(&mut de)?;
        de.end()?;
        Ok(value)
    }

    /// Deserializes a value from a string slice.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is malformed, doesn't match `T`, or is
    /// followed by trailing bytes.
    pub fn from_str<'de, T>(&self, s: &'de str) -> Result<T>
    where
        T: de::Deserialize<'de>,
    {
        self.from_slice(s.as_bytes())
    }

    /// Deserializes a value from a [`io::Read`].
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails, the input is malformed, or it
    /// doesn't match `T`.
    pub fn from_reader<T, R>(&self, reader: R) -> Result<T>
    where
        T: de::DeserializeOwned,
        R: io::Read,
    {
        T::deserialize(&mut self.reader_deserializer(reader))
    }

    /// Serializes a value to a [`io::Write`].
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or the value contains a type the
    /// format can't represent.
    pub fn to_writer<T, W>(&self, writer: W, value: &T) -> Result<()>
    where
        T: ?Sized + ser::Serialize,
        W: io::Write,
    {
        value.serialize(&mut self.serializer(writer))
    }

    /// Serializes a value to a [`Vec<u8>`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value contains a type the format can't
    /// represent.
    pub fn to_vec<T>(&self, value: &T) -> Result<Vec<u8>>
    where
        T: ?Sized + ser::Serialize,
    {
        let mut ser = self.serializer(Vec::new());
        value.serialize(&mut ser)?;
        Ok(ser.into_writer())
    }

    /// Serializes a value to a [`String`].
    ///
    /// Use [`Self::to_vec`] if the value may hold strings that aren't valid
    /// UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the value contains a type the format can't
    /// represent, or [`Error::InvalidUtf8Output`] if any serialized string
    /// contained invalid UTF-8.
    pub fn to_string<T>(&self, value: &T) -> Result<String>
    where
        T: ?Sized + ser::Serialize,
    {
        let buf = self.to_vec(value)?;
        String::from_utf8(buf).map_err(|_| Error::InvalidUtf8Output)
    }
}
