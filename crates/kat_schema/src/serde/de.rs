use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;
use core::marker::PhantomData;

use serde_core::de::{self, DeserializeSeed, Error as _, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_core::Deserializer;

use crate::Flags;
use crate::builder::Driver;
use crate::codec::Token;
use crate::error::ProtocolError;
use crate::info::{Object, TypeInfo, Typed};
use crate::registry::Registry;
use crate::serde::SPACE_KEY;

/// Reads the first key of a map, and the discriminator if it is one.
///
/// Returns the discriminator and the first key of an entry.
fn peek_space<'de, A: MapAccess<'de>>(map: &mut A) -> Result<(Option<String>, Option<String>), A::Error> {
    match map.next_key::<String>()? {
        Some(key) if key == SPACE_KEY => {
            let space = map.next_value::<String>()?;
            Ok((Some(space), map.next_key()?))
        }
        key => Ok((None, key)),
    }
}

/// Feeds the entries of a map, starting with the already read `key`.
fn entries<'de, A: MapAccess<'de>>(driver: &mut Driver, map: &mut A, mut key: Option<String>) -> Result<(), A::Error> {
    while let Some(alias) = key {
        map.next_value_seed(Entry {
            driver: &mut *driver,
            alias: Some(&alias),
            index: None,
        })?;
        key = map.next_key()?;
    }
    Ok(())
}

fn elements<'de, A: SeqAccess<'de>>(driver: &mut Driver, seq: &mut A) -> Result<(), A::Error> {
    let mut index = 0;
    while seq
        .next_element_seed(Entry {
            driver: &mut *driver,
            alias: None,
            index: Some(index),
        })?
        .is_some()
    {
        index += 1;
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// DeserializeDriver

/// Deserializes a `T` by driving the builder protocol.
///
/// Maps open objects, sequences open sequences, anything else is a scalar
/// entry. A map whose first key is [`SPACE_KEY`] is read as the subtype it
/// names, when that subtype may stand in for the declared type.
///
/// # Examples
///
/// ```
/// use serde_core::de::DeserializeSeed;
///
/// use kat_schema::registry::Registry;
/// use kat_schema::serde::DeserializeDriver;
///
/// let registry = Registry::global();
/// let mut data = serde_json::Deserializer::from_str(r#"{"a": [1, 2], "b": []}"#);
///
/// let output = DeserializeDriver::<std::collections::BTreeMap<String, Vec<u8>>>::new(registry)
///     .deserialize(&mut data)
///     .unwrap();
///
/// assert_eq!(output["a"], vec![1, 2]);
/// assert!(output["b"].is_empty());
/// ```
pub struct DeserializeDriver<'a, T> {
    registry: &'a Arc<Registry>,
    flags: Flags,
    marker: PhantomData<fn() -> T>,
}

impl<'a, T: Typed> DeserializeDriver<'a, T> {
    #[inline]
    pub fn new(registry: &'a Arc<Registry>) -> Self {
        Self {
            registry,
            flags: Flags::empty(),
            marker: PhantomData,
        }
    }

    #[inline]
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }
}

impl<'de, T: Typed> DeserializeSeed<'de> for DeserializeDriver<'_, T> {
    type Value = T;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<T, D::Error> {
        let mut driver = self.registry.driver(self.flags);
        let value = deserializer.deserialize_any(Root {
            info: T::type_info(),
            registry: self.registry,
            driver: &mut driver,
        })?;
        T::take(value).map_err(D::Error::custom)
    }
}

// -----------------------------------------------------------------------------
// Root

struct Root<'d> {
    info: &'static TypeInfo,
    registry: &'d Registry,
    driver: &'d mut Driver,
}

impl Root<'_> {
    fn scalar<E: de::Error>(self, token: Token<'_>) -> Result<Box<dyn Object>, E> {
        let codec = self.registry.try_resolve(self.info).map_err(E::custom)?;
        let context = self.driver.context().ok_or_else(|| E::custom(ProtocolError::Idle))?;
        codec.read(context, token).map_err(E::custom)
    }

    // Closes the root and takes its value, abandoning the parse on failure.
    fn conclude<E: de::Error>(self, fed: Result<(), E>) -> Result<Box<dyn Object>, E> {
        let outcome = fed.and_then(|()| self.driver.close().map_err(E::custom));
        match outcome {
            Ok(()) => self.driver.finish().map_err(E::custom),
            Err(error) => {
                self.driver.abandon();
                Err(error)
            }
        }
    }
}

impl<'de> Visitor<'de> for Root<'_> {
    type Value = Box<dyn Object>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a value of `{}`", self.info.type_path())
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        self.scalar(Token::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        self.scalar(Token::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        self.scalar(Token::UInt(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        self.scalar(Token::Float(v))
    }

    fn visit_char<E: de::Error>(self, v: char) -> Result<Self::Value, E> {
        self.scalar(Token::Char(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        self.scalar(Token::str(v))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        self.scalar(Token::Null)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        self.scalar(Token::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let (space, first) = peek_space(&mut map)?;
        let codec = self
            .registry
            .try_resolve_with(self.info, space.as_deref())
            .map_err(A::Error::custom)?;
        self.driver.begin(&*codec).map_err(A::Error::custom)?;

        let fed = entries(self.driver, &mut map, first);
        self.conclude(fed)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let codec = self.registry.try_resolve(self.info).map_err(A::Error::custom)?;
        self.driver.begin(&*codec).map_err(A::Error::custom)?;

        let fed = elements(self.driver, &mut seq);
        self.conclude(fed)
    }
}

// -----------------------------------------------------------------------------
// Entry

/// One entry of an open value, as a seed and as its own visitor.
struct Entry<'d> {
    driver: &'d mut Driver,
    alias: Option<&'d str>,
    index: Option<usize>,
}

impl Entry<'_> {
    fn scalar<E: de::Error>(self, token: Token<'_>) -> Result<(), E> {
        self.driver.emit(self.alias, self.index, token).map_err(E::custom)
    }
}

impl<'de> DeserializeSeed<'de> for Entry<'_> {
    type Value = ();

    #[inline]
    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for Entry<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<(), E> {
        self.scalar(Token::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<(), E> {
        self.scalar(Token::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<(), E> {
        self.scalar(Token::UInt(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<(), E> {
        self.scalar(Token::Float(v))
    }

    fn visit_char<E: de::Error>(self, v: char) -> Result<(), E> {
        self.scalar(Token::Char(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<(), E> {
        self.scalar(Token::str(v))
    }

    fn visit_none<E: de::Error>(self) -> Result<(), E> {
        self.scalar(Token::Null)
    }

    fn visit_unit<E: de::Error>(self) -> Result<(), E> {
        self.scalar(Token::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        let (space, first) = peek_space(&mut map)?;
        let opened = self
            .driver
            .open(self.alias, self.index, space.as_deref())
            .map_err(A::Error::custom)?;

        if !opened {
            if first.is_some() {
                map.next_value::<IgnoredAny>()?;
            }
            while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
            return Ok(());
        }

        entries(self.driver, &mut map, first)?;
        self.driver.close().map_err(A::Error::custom)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        let opened = self
            .driver
            .open(self.alias, self.index, None)
            .map_err(A::Error::custom)?;

        if !opened {
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            return Ok(());
        }

        elements(self.driver, &mut seq)?;
        self.driver.close().map_err(A::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::{String, ToString};
    use alloc::vec;
    use alloc::vec::Vec;

    use serde_core::de::DeserializeSeed;

    use super::DeserializeDriver;
    use crate::Flags;
    use crate::info::Object;
    use crate::registry::Registry;
    use crate::schema::{Describe, Expose, SchemaBuilder};
    use crate::serde::SerializeDriver;

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    crate::impls::impl_structure!(Point, "Point", spaces = ["point"]);

    impl Describe for Point {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .field("x", |p| &p.x, |p| &mut p.x, Expose::new().index(0))
                .field("y", |p| &p.y, |p| &mut p.y, Expose::new().index(1))
                .default_with(Point::default);
        }
    }

    #[derive(Debug, Default)]
    struct Drawing {
        name: String,
        points: Vec<Point>,
        shape: Option<Box<dyn Object>>,
    }

    crate::impls::impl_structure!(Drawing, "Drawing");

    impl Describe for Drawing {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .field("name", |d| &d.name, |d| &mut d.name, Expose::new())
                .field("points", |d| &d.points, |d| &mut d.points, Expose::new())
                .optional("shape", |d| &d.shape, |d| &mut d.shape, Expose::new())
                .default_with(Drawing::default);
        }
    }

    fn json<T: crate::info::Typed>(registry: &alloc::sync::Arc<Registry>, input: &str) -> T {
        let mut data = serde_json::Deserializer::from_str(input);
        DeserializeDriver::<T>::new(registry).deserialize(&mut data).unwrap()
    }

    #[test]
    fn json_round_trip() {
        let registry = Registry::global();
        let point = Point { x: 1, y: -2 };

        let output = serde_json::to_string(&SerializeDriver::new(&point, registry)).unwrap();
        assert_eq!(output, r#"{"x":1,"y":-2}"#);
        assert_eq!(json::<Point>(registry, &output), point);
    }

    #[test]
    fn ron_round_trip() {
        let registry = Registry::global();
        let drawing = Drawing {
            name: "line".to_string(),
            points: vec![Point { x: 0, y: 0 }, Point { x: 3, y: 4 }],
            shape: None,
        };

        let output = ron::to_string(&SerializeDriver::new(&drawing, registry)).unwrap();
        let mut data = ron::Deserializer::from_str(&output).unwrap();
        let back = DeserializeDriver::<Drawing>::new(registry)
            .deserialize(&mut data)
            .unwrap();

        assert_eq!(back.name, "line");
        assert_eq!(back.points, drawing.points);
        assert!(back.shape.is_none());
    }

    #[test]
    fn polymorphic_entry() {
        let registry = Registry::global();
        let drawing = Drawing {
            name: "dot".to_string(),
            points: Vec::new(),
            shape: Some(Box::new(Point { x: 5, y: 6 })),
        };

        let output = serde_json::to_string(&SerializeDriver::new(&drawing, registry)).unwrap();
        assert_eq!(
            output,
            r#"{"name":"dot","points":[],"shape":{"@type":"point","x":5,"y":6}}"#
        );

        let back = json::<Drawing>(registry, &output);
        let shape = back.shape.unwrap();
        assert_eq!(shape.downcast_ref::<Point>(), Some(&Point { x: 5, y: 6 }));
    }

    #[test]
    fn dynamic_root() {
        let registry = Registry::global();
        let value: Box<dyn Object> = Box::new(Point { x: 7, y: 8 });

        let driver = SerializeDriver::new(&value, registry).with_flags(Flags::WRITE_SPACE);
        let output = serde_json::to_string(&driver).unwrap();
        assert_eq!(output, r#"{"@type":"point","x":7,"y":8}"#);

        let back = json::<Box<dyn Object>>(registry, &output);
        assert_eq!(back.downcast_ref::<Point>(), Some(&Point { x: 7, y: 8 }));

        // Without a known discriminator the entries are kept by name.
        let back = json::<Box<dyn Object>>(registry, r#"{"a":1,"b":"two"}"#);
        let map = back
            .downcast_ref::<alloc::collections::BTreeMap<String, Box<dyn Object>>>()
            .unwrap();
        assert_eq!(map["a"].downcast_ref::<i64>(), Some(&1));
        assert_eq!(map["b"].downcast_ref::<String>().map(String::as_str), Some("two"));
    }

    #[test]
    fn unknown_and_mismatched_entries() {
        let registry = Registry::global();

        let point = json::<Point>(registry, r#"{"x":"abc","z":{"deep":[1,2]},"y":3}"#);
        assert_eq!(point, Point { x: 0, y: 3 });

        let mut data = serde_json::Deserializer::from_str(r#"{"x":1,"z":2}"#);
        let denied = DeserializeDriver::<Point>::new(registry)
            .with_flags(Flags::DENY_UNKNOWN)
            .deserialize(&mut data);
        assert!(denied.is_err());
    }
}
