//! Conversion between the field names used on the wire and in Rust.
//!
//! Data produced by PHP conventionally names its keys in `lower_snake_case`,
//! while the record types read from it conventionally use `PascalCase`
//! through `#[serde(rename_all = "PascalCase")]`. The deserializer converts
//! every struct key with one [`NameConverter`], the serializer every struct
//! field name with another.
//!
//! The default pair, [`UnderscoreToPascal`] and [`PascalToUnderscore`], only
//! guarantee that `PascalToUnderscore(UnderscoreToPascal(name)) == name` when
//! `name` consists of lowercase ASCII words starting with a letter and joined
//! by single underscores. Digits at the start of a word, acronyms, and
//! repeated underscores do not survive the round trip.

use std::borrow::Cow;

/// Converts a field name from one naming convention to another.
pub trait NameConverter {
    /// Converts the name.
    fn convert<'a>(&self, name: &'a str) -> Cow<'a, str>;
}

impl<C: NameConverter + ?Sized> NameConverter for &C {
    fn convert<'a>(&self, name: &'a str) -> Cow<'a, str> {
        (**self).convert(name)
    }
}

impl<C: NameConverter + ?Sized> NameConverter for Box<C> {
    fn convert<'a>(&self, name: &'a str) -> Cow<'a, str> {
        (**self).convert(name)
    }
}

/// Converts `this_is_an_example` to `ThisIsAnExample`.
///
/// Every underscore separated segment has its first character uppercased.
/// The underscores themselves are removed.
///
/// This is the default for deserialization.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnderscoreToPascal;

impl NameConverter for UnderscoreToPascal {
    fn convert<'a>(&self, name: &'a str) -> Cow<'a, str> {
        let mut out = String::with_capacity(name.len());
        for part in name.split('_') {
            let mut chars = part.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }

        Cow::Owned(out)
    }
}

/// Converts `ThisIsAnExample` to `this_is_an_example`.
///
/// Every uppercase character but the very first gets an underscore inserted
/// before it. Then the whole name is lowercased.
///
/// This is the default for serialization.
#[derive(Debug, Default, Clone, Copy)]
pub struct PascalToUnderscore;

impl NameConverter for PascalToUnderscore {
    fn convert<'a>(&self, name: &'a str) -> Cow<'a, str> {
        let mut out = String::with_capacity(name.len() + name.len() / 4);
        for c in name.chars() {
            if !out.is_empty() && c.is_uppercase() {
                out.push('_');
            }

            out.extend(c.to_lowercase());
        }

        Cow::Owned(out)
    }
}

/// Leaves names as they are.
///
/// Useful for Rust structs that keep their `snake_case` field names as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl NameConverter for Identity {
    fn convert<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(name)
    }
}

/// A [`NameConverter`] that calls a closure.
///
/// Created by [`from_fn`].
#[derive(Debug, Clone, Copy)]
pub struct FromFn<F>(F);

/// Creates a [`NameConverter`] from a closure.
///
/// # Examples
///
/// ```
/// use serde_php::naming::{NameConverter as _, from_fn};
///
/// let upper = from_fn(|name: &str| name.to_ascii_uppercase());
/// assert_eq!(upper.convert("apply_to"), "APPLY_TO");
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&str) -> String,
{
    FromFn(f)
}

impl<F> NameConverter for FromFn<F>
where
    F: Fn(&str) -> String,
{
    fn convert<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Cow::Owned((self.0)(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underscore_to_pascal() {
        let cases = [
            ("minimum_qty_restrict", "MinimumQtyRestrict"),
            ("bulk_length", "BulkLength"),
            ("wholesale", "Wholesale"),
            ("apply__to", "ApplyTo"),
            ("_leading", "Leading"),
            ("", ""),
        ];

        for (input, expected) in cases {
            assert_eq!(UnderscoreToPascal.convert(input), expected, "for {input:?}");
        }
    }

    #[test]
    fn pascal_to_underscore() {
        let cases = [
            ("MinimumQtyRestrict", "minimum_qty_restrict"),
            ("Dummy", "dummy"),
            ("already_lower", "already_lower"),
            ("HTTPServer", "h_t_t_p_server"),
            ("", ""),
        ];

        for (input, expected) in cases {
            assert_eq!(PascalToUnderscore.convert(input), expected, "for {input:?}");
        }
    }

    #[test]
    fn round_trip_lower_words() {
        let names = [
            "a",
            "bulk_length",
            "max_uses_per_user",
            "item2_name",
            "x_y_z",
            "version3",
        ];

        for name in names {
            let pascal = UnderscoreToPascal.convert(name);
            let back = PascalToUnderscore.convert(&pascal);
            assert_eq!(back, name, "round trip through {pascal:?}");
        }
    }

    #[test]
    fn identity_borrows() {
        assert!(
            matches!(Identity.convert("as_is"), Cow::Borrowed("as_is")),
            "identity must not allocate"
        );
    }

    #[test]
    fn boxed_and_ref_delegate() {
        fn convert<C: NameConverter>(converter: C, name: &str) -> String {
            converter.convert(name).into_owned()
        }

        let boxed: Box<dyn NameConverter> = Box::new(UnderscoreToPascal);
        assert_eq!(convert(boxed, "apply_to"), "ApplyTo", "box must delegate");
        assert_eq!(convert(&PascalToUnderscore, "ApplyTo"), "apply_to", "ref must delegate");
    }
}
