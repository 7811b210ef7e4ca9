//! Exposes a serializer and serialization helper methods.

use std::fmt::Display;
use std::io;

use serde::ser::{self, Impossible};

use crate::error::{Error, Result};
use crate::naming::{NameConverter, PascalToUnderscore};

/// Serializes a value to a [`Vec<u8>`].
///
/// # Errors
///
/// Returns an error if the value contains a type the format can't represent.
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + ser::Serialize,
{
    let mut ser = Serializer::from_writer(Vec::new());
    value.serialize(&mut ser)?;
    Ok(ser.into_writer())
}

/// Serializes a value to a [`String`].
///
/// Strings in the format are raw bytes. Use [`to_vec`] if the value may hold
/// strings that aren't valid UTF-8.
///
/// # Errors
///
/// Returns an error if the value contains a type the format can't represent,
/// or [`Error::InvalidUtf8Output`] if any serialized string contained invalid
/// UTF-8.
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + ser::Serialize,
{
    let buf = to_vec(value)?;
    String::from_utf8(buf).map_err(|_| Error::InvalidUtf8Output)
}

/// Serializes a value to a [`io::Write`].
///
/// Output is written as it is produced. If an error occurs, part of the value
/// may already have been written.
///
/// # Errors
///
/// Returns an error if writing fails or the value contains a type the format
/// can't represent.
pub fn to_writer<T, W>(writer: W, value: &T) -> Result<()>
where
    T: ?Sized + ser::Serialize,
    W: io::Write,
{
    value.serialize(&mut Serializer::from_writer(writer))
}

/// A [`Serializer`] for this crate's format. The trait is only implemented by
/// `&mut`.
///
/// Struct field names are passed through the [`NameConverter`] `C` before
/// they are written.
///
/// [`Serializer`]: serde::ser::Serializer
#[derive(Debug)]
pub struct Serializer<W, C = PascalToUnderscore> {
    writer: W,
    converter: C,
}

impl<W: io::Write> Serializer<W> {
    /// Creates a new serializer that writes a value to a [`io::Write`].
    pub fn from_writer(writer: W) -> Self {
        Self::with_converter(writer, PascalToUnderscore)
    }
}

impl<W: io::Write, C: NameConverter> Serializer<W, C> {
    /// Creates a new serializer with a custom [`NameConverter`] for struct
    /// field names.
    pub fn with_converter(writer: W, converter: C) -> Self {
        Self { writer, converter }
    }

    /// Unwraps the serializer into its inner writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Gets a reference to the inner writer.
    pub fn as_writer(&mut self) -> &mut W {
        &mut self.writer
    }

    fn write_int(&mut self, v: impl Display) -> Result<()> {
        Ok(write!(self.writer, "i:{v};")?)
    }

    fn write_float(&mut self, v: f64, text: impl Display) -> Result<()> {
        if v.is_nan() {
            self.writer.write_all(b"d:NAN;")?;
        } else if v.is_infinite() {
            let sign = if v.is_sign_negative() { "-" } else { "" };
            write!(self.writer, "d:{sign}INF;")?;
        } else {
            write!(self.writer, "d:{text};")?;
        }

        Ok(())
    }

    fn write_bytes(&mut self, v: &[u8]) -> Result<()> {
        // the length counts bytes, not characters
        write!(self.writer, "s:{}:\"", v.len())?;
        self.writer.write_all(v)?;
        self.writer.write_all(b"\";")?;
        Ok(())
    }

    fn write_array_start(&mut self, len: usize) -> Result<()> {
        Ok(write!(self.writer, "a:{len}:{{")?)
    }

    fn write_array_end(&mut self) -> Result<()> {
        Ok(self.writer.write_all(b"}")?)
    }
}

impl<'a, W: io::Write, C: NameConverter> ser::Serializer for &'a mut Serializer<W, C> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = SerializeList<'a, W, C>;
    type SerializeTuple = SerializeList<'a, W, C>;
    type SerializeTupleStruct = SerializeList<'a, W, C>;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = SerializeMap<'a, W, C>;
    type SerializeStruct = SerializeStruct<'a, W, C>;
    type SerializeStructVariant = Impossible<(), Error>;

    fn serialize_bool(self, _v: bool) -> Result<()> {
        Err(Error::UnsupportedType("bool"))
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.write_int(v)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.write_int(v)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.write_int(v)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.write_int(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.write_int(v)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.write_int(v)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.write_int(v)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.write_int(v)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        // formatted at its own precision so it reads back as the same f32
        self.write_float(v.into(), format_args!("{v:?}"))
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        // debug formatting is the shortest text that parses back to the same
        // value and switches to exponents for very large or small values
        self.write_float(v, format_args!("{v:?}"))
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.write_bytes(v.encode_utf8(&mut [0u8; 4]).as_bytes())
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.write_bytes(v.as_bytes())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.write_bytes(v)
    }

    fn serialize_none(self) -> Result<()> {
        Err(Error::UnsupportedType("none"))
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + ser::Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Err(Error::UnsupportedType("unit"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Err(Error::UnsupportedType("unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + ser::Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()>
    where
        T: ?Sized + ser::Serialize,
    {
        Err(Error::UnsupportedType("newtype variant"))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        let len = len.ok_or(Error::LengthRequired)?;
        self.write_array_start(len)?;
        Ok(SerializeList {
            ser: self,
            len,
            index: 0,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::UnsupportedType("tuple variant"))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        let len = len.ok_or(Error::LengthRequired)?;
        self.write_array_start(len)?;
        Ok(SerializeMap {
            ser: self,
            len,
            count: 0,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.write_array_start(len)?;
        Ok(SerializeStruct {
            ser: self,
            len,
            count: 0,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::UnsupportedType("struct variant"))
    }
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::LengthIncorrect { expected, actual })
    }
}

/// Allows serializing a sequence of elements as an array keyed by index.
#[doc(hidden)]
pub struct SerializeList<'a, W, C> {
    ser: &'a mut Serializer<W, C>,
    len: usize,
    index: usize,
}

/// Allows serializing a map as an array.
#[doc(hidden)]
pub struct SerializeMap<'a, W, C> {
    ser: &'a mut Serializer<W, C>,
    len: usize,
    count: usize,
}

/// Allows serializing a struct as an array keyed by converted field names.
#[doc(hidden)]
pub struct SerializeStruct<'a, W, C> {
    ser: &'a mut Serializer<W, C>,
    len: usize,
    count: usize,
}

impl<W: io::Write, C: NameConverter> SerializeList<'_, W, C> {
    fn element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + ser::Serialize,
    {
        self.ser.write_int(self.index)?;
        value.serialize(&mut *self.ser)?;
        self.index += 1;
        Ok(())
    }

    fn finish(self) -> Result<()> {
        check_len(self.len, self.index)?;
        self.ser.write_array_end()
    }
}

impl<W: io::Write, C: NameConverter> ser::SerializeSeq for SerializeList<'_, W, C> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + ser::Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<W: io::Write, C: NameConverter> ser::SerializeTuple for SerializeList<'_, W, C> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + ser::Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<W: io::Write, C: NameConverter> ser::SerializeTupleStruct for SerializeList<'_, W, C> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + ser::Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<W: io::Write, C: NameConverter> ser::SerializeMap for SerializeMap<'_, W, C> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + ser::Serialize,
    {
        key.serialize(MapKeySerializer { ser: &mut *self.ser })
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + ser::Serialize,
    {
        value.serialize(&mut *self.ser)?;
        self.count += 1;
        Ok(())
    }

    fn end(self) -> Result<()> {
        check_len(self.len, self.count)?;
        self.ser.write_array_end()
    }
}

impl<W: io::Write, C: NameConverter> ser::SerializeStruct for SerializeStruct<'_, W, C> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + ser::Serialize,
    {
        let name = self.ser.converter.convert(key);
        self.ser.write_bytes(name.as_bytes())?;
        value.serialize(&mut *self.ser)?;
        self.count += 1;
        Ok(())
    }

    fn end(self) -> Result<()> {
        check_len(self.len, self.count)?;
        self.ser.write_array_end()
    }
}

/// Serializes map keys, which may only be integers or strings.
struct MapKeySerializer<'a, W, C> {
    ser: &'a mut Serializer<W, C>,
}

impl<W: io::Write, C: NameConverter> ser::Serializer for MapKeySerializer<'_, W, C> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Impossible<(), Error>;
    type SerializeTuple = Impossible<(), Error>;
    type SerializeTupleStruct = Impossible<(), Error>;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = Impossible<(), Error>;
    type SerializeStruct = Impossible<(), Error>;
    type SerializeStructVariant = Impossible<(), Error>;

    fn serialize_bool(self, _v: bool) -> Result<()> {
        Err(Error::KeyMustBeIntOrString)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.ser.write_int(v)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.ser.write_int(v)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.ser.write_int(v)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.ser.write_int(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.ser.write_int(v)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.ser.write_int(v)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.ser.write_int(v)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.ser.write_int(v)
    }

    fn serialize_f32(self, _v: f32) -> Result<()> {
        Err(Error::KeyMustBeIntOrString)
    }

    fn serialize_f64(self, _v: f64) -> Result<()> {
        Err(Error::KeyMustBeIntOrString)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.ser.write_bytes(v.encode_utf8(&mut [0u8; 4]).as_bytes())
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.ser.write_bytes(v.as_bytes())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.ser.write_bytes(v)
    }

    fn serialize_none(self) -> Result<()> {
        Err(Error::KeyMustBeIntOrString)
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + ser::Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Err(Error::KeyMustBeIntOrString)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Err(Error::KeyMustBeIntOrString)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.ser.write_bytes(variant.as_bytes())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + ser::Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()>
    where
        T: ?Sized + ser::Serialize,
    {
        Err(Error::KeyMustBeIntOrString)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Error::KeyMustBeIntOrString)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Error::KeyMustBeIntOrString)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(Error::KeyMustBeIntOrString)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::KeyMustBeIntOrString)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::KeyMustBeIntOrString)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(Error::KeyMustBeIntOrString)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::KeyMustBeIntOrString)
    }
}
