//! Exposes a deserializer and deserialization helper methods.

use std::{io, str};

use serde::de::{self, IntoDeserializer as _};

use crate::error::{Error, FormatError, Position, Result};
use crate::naming::{NameConverter, UnderscoreToPascal};
pub use crate::read::{IoRead, Read, SliceRead};

/// The default maximum nesting depth of arrays.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Deserializes a value from a byte slice.
///
/// In addition to other deserialization errors, this returns
/// [`Error::TrailingBytes`] if the slice isn't fully consumed.
///
/// # Errors
///
/// Returns an error if the input is malformed or doesn't match `T`.
pub fn from_slice<'de, T>(buf: &'de [u8]) -> Result<T>
where
    T: de::Deserialize<'de>,
{
    let mut de = Deserializer::from_slice(buf);
    let value = T::deserialize(&mut de)?;
    de.end()?;
    Ok(value)
}

/// Deserializes a value from a string slice.
///
/// Equivalent to [`from_slice`] with the string's bytes.
///
/// # Errors
///
/// Returns an error if the input is malformed or doesn't match `T`.
pub fn from_str<'de, T>(s: &'de str) -> Result<T>
where
    T: de::Deserialize<'de>,
{
    from_slice(s.as_bytes())
}

/// Deserializes a value from a [`io::Read`].
///
/// The reader is left positioned right after the value, so it may still have
/// bytes available when this function returns successfully.
///
/// # Errors
///
/// Returns an error if reading fails, the input is malformed, or it doesn't
/// match `T`.
pub fn from_reader<T, R>(reader: R) -> Result<T>
where
    T: de::DeserializeOwned,
    R: io::Read,
{
    T::deserialize(&mut Deserializer::from_reader(reader))
}

/// A [`Deserializer`] for this crate's format. The trait is only implemented
/// by `&mut`.
///
/// Struct keys are passed through the [`NameConverter`] `C` before they are
/// matched against the struct's fields. Keys that don't match any field are
/// logged and their values are parsed and discarded.
///
/// [`Deserializer`]: serde::de::Deserializer
#[derive(Debug)]
pub struct Deserializer<R, C = UnderscoreToPascal> {
    reader: R,
    converter: C,
    scratch: Vec<u8>,
    remaining_depth: Option<usize>,
}

impl<'de, R: Read<'de>> Deserializer<R> {
    /// Creates a new deserializer that reads a value from a [`Read`].
    ///
    /// When reading from a slice, using [`Self::from_slice`] may be clearer.
    pub fn new(reader: R) -> Self {
        Self::with_converter(reader, UnderscoreToPascal)
    }
}

impl<'de, R: Read<'de>, C: NameConverter> Deserializer<R, C> {
    /// Creates a new deserializer with a custom [`NameConverter`] for struct
    /// keys.
    pub fn with_converter(reader: R, converter: C) -> Self {
        Self {
            reader,
            converter,
            scratch: Vec::new(),
            remaining_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }

    /// Sets how deeply arrays may be nested.
    ///
    /// [`None`] removes the limit. Deeply nested input may then overflow the
    /// stack.
    #[must_use]
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.remaining_depth = max_depth;
        self
    }

    /// Verifies that the whole input has been consumed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TrailingBytes`] if there is more input.
    pub fn end(&mut self) -> Result<()> {
        match self.reader.peek()? {
            None => Ok(()),
            Some(_) => Err(Error::TrailingBytes {
                position: self.position(),
            }),
        }
    }

    /// Gets the position of the next byte in the input.
    pub fn position(&self) -> Position {
        self.reader.position()
    }
}

impl<'de> Deserializer<SliceRead<'de>> {
    /// Creates a new deserializer that reads a value from a slice.
    ///
    /// This is useful over [`from_slice`] when you want the remainder of the
    /// slice instead of an error.
    pub fn from_slice(buf: &'de [u8]) -> Self {
        Self::new(SliceRead::new(buf))
    }
}

impl<'de, C> Deserializer<SliceRead<'de>, C> {
    /// Gets the remaining unread part of the slice.
    pub fn remainder(&self) -> &'de [u8] {
        self.reader.remainder()
    }
}

impl<R: io::Read> Deserializer<IoRead<R>> {
    /// Creates a new deserializer that reads a value from a [`io::Read`].
    ///
    /// If you're working with a byte slice, it is more efficient to use
    /// [`from_slice`].
    pub fn from_reader(reader: R) -> Self {
        Self::new(IoRead::new(reader))
    }
}

impl<R, C> Deserializer<IoRead<R>, C> {
    /// Unwraps the deserializer into its inner reader.
    pub fn into_reader(self) -> R {
        self.reader.inner
    }
}

/// How to hand a string payload to a visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StrMode {
    /// As [`str`] if it is valid UTF-8, otherwise as bytes.
    Any,
    /// As [`str`], failing if it isn't valid UTF-8.
    Str,
    /// As bytes.
    Bytes,
}

/// An integer token, which may not fit into an [`i64`] if it's positive.
enum Integer {
    Signed(i64),
    Unsigned(u64),
}

// tokenizer
impl<'de, R: Read<'de>, C: NameConverter> Deserializer<R, C> {
    /// Peeks the tag of the next value.
    fn peek_tag(&mut self) -> Result<u8> {
        match self.reader.peek()? {
            Some(tag) => Ok(tag),
            None => Err(self.eof()),
        }
    }

    /// Consumes a byte that has just been peeked.
    fn eat(&mut self) -> Result<()> {
        self.reader.next()?;
        Ok(())
    }

    /// Consumes the next byte, failing if it isn't `expected`.
    fn expect(&mut self, expected: u8, name: &'static str) -> Result<()> {
        let position = self.position();
        match self.reader.next()? {
            Some(b) if b == expected => Ok(()),
            Some(b) => Err(Error::Parse {
                expected: name,
                found: char::from(b).escape_default().to_string(),
                position,
            }),
            None => Err(Error::Eof { position }),
        }
    }

    /// Consumes the opening or closing quote of a string payload.
    fn expect_quote(&mut self) -> Result<()> {
        let position = self.position();
        match self.reader.next()? {
            Some(b'"') => Ok(()),
            Some(_) => Err(Error::Format {
                kind: FormatError::UnquotedString,
                position,
            }),
            None => Err(Error::Eof { position }),
        }
    }

    /// Reads the text of a number token into the scratch buffer.
    ///
    /// The token ends right before the next delimiter. Returns the position
    /// the token started at.
    fn scan_number(&mut self) -> Result<Position> {
        // longer than any number the format can represent
        const MAX_LEN: usize = 64;

        let position = self.position();
        self.scratch.clear();
        while let Some(b) = self.reader.peek()? {
            if matches!(b, b':' | b';' | b'{' | b'}' | b'"') {
                break;
            }

            if self.scratch.len() == MAX_LEN {
                return Err(self.number_error("a number", position));
            }

            self.scratch.push(b);
            self.eat()?;
        }

        Ok(position)
    }

    fn number_error(&self, expected: &'static str, position: Position) -> Error {
        Error::Parse {
            expected,
            found: String::from_utf8_lossy(&self.scratch).into_owned(),
            position,
        }
    }

    /// Reads `:<length>:` as it follows the tag of strings and arrays.
    fn parse_len(&mut self) -> Result<usize> {
        self.expect(b':', "`:`")?;
        let position = self.scan_number()?;
        let len = (!self.scratch.is_empty() && self.scratch.iter().all(u8::is_ascii_digit))
            .then(|| str::from_utf8(&self.scratch).ok()?.parse().ok())
            .flatten()
            .ok_or_else(|| self.number_error("a length", position))?;

        self.expect(b':', "`:`")?;
        Ok(len)
    }

    /// Reads the integer production `i:<digits>;`.
    fn parse_int(&mut self) -> Result<Integer> {
        self.expect(b'i', "`i`")?;
        self.expect(b':', "`:`")?;
        let position = self.scan_number()?;
        let text = str::from_utf8(&self.scratch).unwrap_or_default();
        let value = if text.starts_with('-') {
            text.parse().map(Integer::Signed).ok()
        } else {
            text.parse().map(Integer::Unsigned).ok()
        };

        let value = value.ok_or_else(|| self.number_error("an integer", position))?;
        self.expect(b';', "`;`")?;
        Ok(value)
    }

    /// Reads the float production `d:<decimal>;`.
    ///
    /// Besides decimal text, PHP writes non-finite floats as `INF`, `-INF` and
    /// `NAN`.
    fn parse_float(&mut self) -> Result<f64> {
        self.expect(b'd', "`d`")?;
        self.expect(b':', "`:`")?;
        let position = self.scan_number()?;
        let value = match self.scratch.as_slice() {
            b"INF" => Some(f64::INFINITY),
            b"-INF" => Some(f64::NEG_INFINITY),
            b"NAN" => Some(f64::NAN),
            text if text
                .iter()
                .all(|b| matches!(b, b'0'..=b'9' | b'.' | b'-' | b'+' | b'e' | b'E')) =>
            {
                str::from_utf8(text).ok().and_then(|t| t.parse().ok())
            },
            _ => None,
        };

        let value = value.ok_or_else(|| self.number_error("a float", position))?;
        self.expect(b';', "`;`")?;
        Ok(value)
    }

    /// Reads the string production `s:<length>:"<bytes>";` and hands the
    /// payload to the visitor.
    fn parse_str<V>(&mut self, mode: StrMode, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.expect(b's', "`s`")?;
        let len = self.parse_len()?;
        self.expect_quote()?;

        let position = self.position();
        let value = match self.reader.try_read_bytes_borrow(len) {
            Some(bytes) => {
                let bytes = bytes?;
                match (mode, str::from_utf8(bytes)) {
                    (StrMode::Bytes, _) | (StrMode::Any, Err(_)) => {
                        visitor.visit_borrowed_bytes(bytes)
                    },
                    (_, Ok(s)) => visitor.visit_borrowed_str(s),
                    (StrMode::Str, Err(_)) => Err(Error::InvalidUtf8 { position }),
                }
            },
            None => self
                .reader
                .read_byte_view(len, |bytes| match (mode, str::from_utf8(bytes)) {
                    (StrMode::Bytes, _) | (StrMode::Any, Err(_)) => visitor.visit_bytes(bytes),
                    (_, Ok(s)) => visitor.visit_str(s),
                    (StrMode::Str, Err(_)) => Err(Error::InvalidUtf8 { position }),
                }),
        }?;

        self.expect_quote()?;
        self.expect(b';', "`;`")?;
        Ok(value)
    }

    /// Reads a string production into an owned [`String`].
    fn parse_string(&mut self) -> Result<String> {
        self.expect(b's', "`s`")?;
        let len = self.parse_len()?;
        self.expect_quote()?;

        let position = self.position();
        let bytes = self.reader.read_byte_vec(len)?;
        let value = String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8 { position })?;

        self.expect_quote()?;
        self.expect(b';', "`;`")?;
        Ok(value)
    }

    /// Reads `a:<count>:{` and descends one level.
    fn begin_array(&mut self) -> Result<usize> {
        self.expect(b'a', "`a`")?;
        let len = self.parse_len()?;
        self.expect(b'{', "`{`")?;

        if let Some(depth) = &mut self.remaining_depth {
            if *depth == 0 {
                return Err(Error::RecursionLimitExceeded {
                    position: self.reader.position(),
                });
            }

            *depth -= 1;
        }

        Ok(len)
    }

    /// Reads the `}` closing an array with `declared` entries and ascends
    /// one level.
    fn end_array(&mut self, declared: usize) -> Result<()> {
        if let Some(depth) = &mut self.remaining_depth {
            *depth += 1;
        }

        let position = self.position();
        match self.reader.peek()? {
            Some(b'}') => self.eat(),
            Some(b'i' | b's') => Err(Error::Format {
                kind: FormatError::ExtraEntries { declared },
                position,
            }),
            _ => self.expect(b'}', "`}`"),
        }
    }

    /// Reads a value of any supported type and discards it.
    ///
    /// This still parses the value in full to find where it ends.
    fn skip_value(&mut self) -> Result<()> {
        match self.peek_tag()? {
            b'i' => _ = self.parse_int()?,
            b'd' => _ = self.parse_float()?,
            b's' => {
                self.eat()?;
                let len = self.parse_len()?;
                self.expect_quote()?;
                self.reader.skip_bytes(len)?;
                self.expect_quote()?;
                self.expect(b';', "`;`")?;
            },
            b'a' => {
                let len = self.begin_array()?;
                for index in 0..len {
                    self.check_entry(len, index)?;
                    self.skip_key()?;
                    self.skip_value()?;
                }

                self.end_array(len)?;
            },
            tag => return Err(self.unsupported_tag(tag)),
        }

        Ok(())
    }

    /// Reads an array key and discards it.
    fn skip_key(&mut self) -> Result<()> {
        match self.peek_tag()? {
            b'i' | b's' => self.skip_value(),
            tag => Err(self.key_error(tag)),
        }
    }

    /// Ensures the array hasn't been closed before entry `index` of
    /// `declared`.
    fn check_entry(&mut self, declared: usize, index: usize) -> Result<()> {
        if self.reader.peek()? == Some(b'}') {
            return Err(Error::Format {
                kind: FormatError::MissingEntries {
                    declared,
                    found: index,
                },
                position: self.position(),
            });
        }

        Ok(())
    }

    /// Reads a struct key.
    ///
    /// Structs are keyed by name, so integer keys are rejected.
    fn parse_struct_key(&mut self) -> Result<String> {
        match self.peek_tag()? {
            b's' => self.parse_string(),
            b'i' => Err(Error::TypeMismatch {
                expected: "string",
                found: "integer",
                position: self.position(),
            }),
            tag => Err(self.key_error(tag)),
        }
    }

    /// Reads a map key as a string, formatting integer keys as text.
    fn parse_key_str<V>(&mut self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.peek_tag()? {
            b's' => self.parse_str(StrMode::Str, visitor),
            b'i' => match self.parse_int()? {
                Integer::Signed(v) => visitor.visit_string(v.to_string()),
                Integer::Unsigned(v) => visitor.visit_string(v.to_string()),
            },
            tag => Err(self.key_error(tag)),
        }
    }

    fn unsupported_tag(&self, tag: u8) -> Error {
        Error::UnsupportedTag {
            tag: char::from(tag),
            position: self.position(),
        }
    }

    fn key_error(&self, tag: u8) -> Error {
        Error::Parse {
            expected: "an integer or string key",
            found: char::from(tag).escape_default().to_string(),
            position: self.position(),
        }
    }

    fn eof(&self) -> Error {
        Error::Eof {
            position: self.position(),
        }
    }

    /// Attaches the current position to errors raised by visitors.
    fn fix_position(&self, err: Error) -> Error {
        match err {
            Error::Custom(message) => Error::Located {
                message,
                position: self.position(),
            },
            err => err,
        }
    }

    fn visit_array<V>(&mut self, kind: ArrayKind, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let len = self.begin_array()?;
        let mut access = ArrayAccess {
            deserializer: &mut *self,
            kind,
            declared: len,
            remaining: len,
        };

        let value = match kind {
            ArrayKind::List => visitor.visit_seq(&mut access)?,
            ArrayKind::Map | ArrayKind::Struct { .. } => visitor.visit_map(&mut access)?,
        };

        let remaining = access.remaining;
        if remaining != 0 {
            return Err(Error::Format {
                kind: FormatError::UnreadEntries { remaining },
                position: self.position(),
            });
        }

        self.end_array(len)?;
        Ok(value)
    }
}

// implemented by mut because this avoids adding another layer of indirection
// for every nested Deserialize call.
impl<'de, R: Read<'de>, C: NameConverter> de::Deserializer<'de> for &mut Deserializer<R, C> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let value = match self.peek_tag()? {
            b'i' => match self.parse_int()? {
                Integer::Signed(v) => visitor.visit_i64(v),
                Integer::Unsigned(v) => visitor.visit_u64(v),
            },
            b'd' => {
                let v = self.parse_float()?;
                visitor.visit_f64(v)
            },
            b's' => self.parse_str(StrMode::Any, visitor),
            b'a' => self.visit_array(ArrayKind::Map, visitor),
            tag => Err(self.unsupported_tag(tag)),
        };

        value.map_err(|e| self.fix_position(e))
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 unit unit_struct
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.peek_tag()? {
            b's' => self
                .parse_str(StrMode::Str, visitor)
                .map_err(|e| self.fix_position(e)),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.peek_tag()? {
            b's' => self
                .parse_str(StrMode::Bytes, visitor)
                .map_err(|e| self.fix_position(e)),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        // there is no null, so anything present is some
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.peek_tag()? {
            b'a' => self
                .visit_array(ArrayKind::List, visitor)
                .map_err(|e| self.fix_position(e)),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_any(visitor)
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.peek_tag()? {
            b'a' => self
                .visit_array(ArrayKind::Struct { name, fields }, visitor)
                .map_err(|e| self.fix_position(e)),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        // only unit variants are supported, and those are just their name
        match self.peek_tag()? {
            b's' => {
                let variant = self.parse_string()?;
                visitor
                    .visit_enum(variant.into_deserializer())
                    .map_err(|e| self.fix_position(e))
            },
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        log::trace!("skipping value at {}", self.position());
        self.skip_value()?;
        visitor.visit_unit()
    }
}

/// How the entries of an array are presented to the visitor.
#[derive(Debug, Clone, Copy)]
enum ArrayKind {
    /// As a sequence of values. The keys are discarded.
    List,
    /// As a map with keys as they are.
    Map,
    /// As a map of fields, with keys converted to field names.
    Struct {
        name: &'static str,
        fields: &'static [&'static str],
    },
}

/// Provides access to the entries of an array.
struct ArrayAccess<'a, R, C> {
    deserializer: &'a mut Deserializer<R, C>,
    kind: ArrayKind,
    declared: usize,
    remaining: usize,
}

impl<'de, R: Read<'de>, C: NameConverter> ArrayAccess<'_, R, C> {
    /// Claims the next entry, returning `false` when all declared entries
    /// have been read.
    fn claim_entry(&mut self) -> Result<bool> {
        if self.remaining == 0 {
            return Ok(false);
        }

        let index = self.declared - self.remaining;
        self.deserializer.check_entry(self.declared, index)?;
        self.remaining -= 1;
        Ok(true)
    }
}

impl<'de, R: Read<'de>, C: NameConverter> de::SeqAccess<'de> for &mut ArrayAccess<'_, R, C> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        if !self.claim_entry()? {
            return Ok(None);
        }

        self.deserializer.skip_key()?;
        seed.deserialize(&mut *self.deserializer).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

impl<'de, R: Read<'de>, C: NameConverter> de::MapAccess<'de> for &mut ArrayAccess<'_, R, C> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        if !self.claim_entry()? {
            return Ok(None);
        }

        match self.kind {
            ArrayKind::Struct { name, fields } => {
                let key = self.deserializer.parse_struct_key()?;
                let field = self.deserializer.converter.convert(&key).into_owned();
                if !fields.contains(&field.as_str()) {
                    log::warn!("`{name}` has no field `{field}` for key `{key}`, skipping it");
                }

                seed.deserialize(field.into_deserializer()).map(Some)
            },
            ArrayKind::List | ArrayKind::Map => seed
                .deserialize(KeyDeserializer {
                    deserializer: &mut *self.deserializer,
                })
                .map(Some),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        seed.deserialize(&mut *self.deserializer)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

/// Deserializes map keys, which may only be integers or strings.
///
/// Keys are taken as-is, except that integer keys read as strings are
/// formatted as text. PHP itself stores numeric string keys as integers, so
/// maps keyed by strings would otherwise fail on such data.
struct KeyDeserializer<'a, R, C> {
    deserializer: &'a mut Deserializer<R, C>,
}

impl<'de, R: Read<'de>, C: NameConverter> KeyDeserializer<'_, R, C> {
    fn check_key(&mut self) -> Result<()> {
        match self.deserializer.peek_tag()? {
            b'i' | b's' => Ok(()),
            tag => Err(self.deserializer.key_error(tag)),
        }
    }
}

impl<'de, R: Read<'de>, C: NameConverter> de::Deserializer<'de> for KeyDeserializer<'_, R, C> {
    type Error = Error;

    fn deserialize_any<V>(mut self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.check_key()?;
        de::Deserializer::deserialize_any(self.deserializer, visitor)
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let de = self.deserializer;
        de.parse_key_str(visitor).map_err(|e| de.fix_position(e))
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        mut self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.check_key()?;
        de::Deserializer::deserialize_enum(self.deserializer, name, variants, visitor)
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char bytes byte_buf
        unit unit_struct seq tuple tuple_struct map struct ignored_any
    }
}
