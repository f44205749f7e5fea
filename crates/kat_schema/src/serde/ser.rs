use alloc::format;
use alloc::string::ToString;
use alloc::sync::Arc;
use core::mem;

use serde_core::ser::{Error as _, SerializeMap, SerializeSeq};
use serde_core::{Serialize, Serializer};

use crate::Flags;
use crate::chan::Chan;
use crate::codec::{self, Codec, Shape, Token};
use crate::error::CodecError;
use crate::info::Object;
use crate::registry::Registry;
use crate::serde::SPACE_KEY;

impl Serialize for Token<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::UInt(v) => serializer.serialize_u64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Char(v) => serializer.serialize_char(*v),
            Self::Str(v) => serializer.serialize_str(v),
        }
    }
}

// -----------------------------------------------------------------------------
// SerializeDriver

/// Serializes a value through its codec.
///
/// Without [`with_codec`](Self::with_codec) the codec is resolved from the
/// value's runtime type. The root value only carries its discriminator
/// when the flags contain [`Flags::WRITE_SPACE`].
///
/// # Examples
///
/// ```
/// use kat_schema::registry::Registry;
/// use kat_schema::serde::SerializeDriver;
///
/// let value = vec![Some(1_i32), None];
/// let registry = Registry::global();
///
/// let output = serde_json::to_string(&SerializeDriver::new(&value, registry)).unwrap();
/// assert_eq!(output, "[1,null]");
/// ```
pub struct SerializeDriver<'a> {
    registry: &'a Registry,
    flags: Flags,
    codec: Option<&'a dyn Codec>,
    value: &'a dyn Object,
    space: Option<&'a str>,
}

impl<'a> SerializeDriver<'a> {
    #[inline]
    pub fn new(value: &'a dyn Object, registry: &'a Registry) -> Self {
        Self {
            registry,
            flags: Flags::empty(),
            codec: None,
            value,
            space: None,
        }
    }

    #[inline]
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Writes the value with `codec` instead of its runtime type's codec.
    #[inline]
    pub fn with_codec(mut self, codec: &'a dyn Codec) -> Self {
        self.codec = Some(codec);
        self
    }
}

impl Serialize for SerializeDriver<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let resolved: Arc<dyn Codec>;
        let (codec, value) = match self.codec {
            Some(codec) => (codec, self.value),
            None => {
                let (codec, value) = codec::runtime(self.registry, self.value).map_err(S::Error::custom)?;
                resolved = codec;
                (&*resolved, value)
            }
        };

        let space = self.space.or_else(|| {
            (self.flags.contains(Flags::WRITE_SPACE) && codec.shape() == Shape::Object)
                .then(|| codec.info().space())
        });

        let mut writer = Writer {
            registry: self.registry,
            flags: self.flags,
            state: State::Ready(serializer),
            space,
            error: None,
        };
        match codec.write(&mut writer, value) {
            Ok(()) => writer.finish(),
            Err(error) => Err(writer.error.take().unwrap_or_else(|| S::Error::custom(error))),
        }
    }
}

// -----------------------------------------------------------------------------
// Writer

enum State<S: Serializer> {
    Ready(S),
    Map(S::SerializeMap),
    Seq(S::SerializeSeq),
    Done(S::Ok),
    Spent,
}

/// The [`Chan`] writing one value into a serializer.
struct Writer<'a, S: Serializer> {
    registry: &'a Registry,
    flags: Flags,
    state: State<S>,
    space: Option<&'a str>,
    // The serializer's own error, returned in place of the codec error.
    error: Option<S::Error>,
}

impl<S: Serializer> Writer<'_, S> {
    fn fail(&mut self, error: S::Error) -> CodecError {
        let message = error.to_string();
        self.error = Some(error);
        CodecError::Custom(message)
    }

    fn misplaced(&self, op: &str) -> CodecError {
        let state = match self.state {
            State::Ready(_) => "before the value started",
            State::Map(_) | State::Seq(_) => "inside a structure",
            State::Done(_) | State::Spent => "after the value ended",
        };
        CodecError::Custom(format!("`{op}` called {state}"))
    }

    fn finish(self) -> Result<S::Ok, S::Error> {
        match self.state {
            State::Done(ok) => Ok(ok),
            _ => Err(S::Error::custom("the value was left unfinished")),
        }
    }
}

impl<S: Serializer> Chan for Writer<'_, S> {
    #[inline]
    fn registry(&self) -> &Registry {
        self.registry
    }

    #[inline]
    fn flags(&self) -> Flags {
        self.flags
    }

    fn emit(&mut self, token: Token<'_>) -> Result<(), CodecError> {
        let serializer = match mem::replace(&mut self.state, State::Spent) {
            State::Ready(serializer) => serializer,
            other => {
                self.state = other;
                return Err(self.misplaced("emit"));
            }
        };
        match token.serialize(serializer) {
            Ok(ok) => {
                self.state = State::Done(ok);
                Ok(())
            }
            Err(error) => Err(self.fail(error)),
        }
    }

    fn open(&mut self, shape: Shape) -> Result<(), CodecError> {
        let serializer = match mem::replace(&mut self.state, State::Spent) {
            State::Ready(serializer) => serializer,
            other => {
                self.state = other;
                return Err(self.misplaced("open"));
            }
        };
        let opened = match shape {
            Shape::Object => serializer.serialize_map(None).and_then(|mut map| {
                if let Some(space) = self.space.take() {
                    map.serialize_entry(SPACE_KEY, space)?;
                }
                Ok(State::Map(map))
            }),
            Shape::Sequence => serializer.serialize_seq(None).map(State::Seq),
            Shape::Scalar => return Err(CodecError::Custom("a scalar cannot be opened".to_string())),
        };
        match opened {
            Ok(state) => {
                self.state = state;
                Ok(())
            }
            Err(error) => Err(self.fail(error)),
        }
    }

    fn close(&mut self) -> Result<(), CodecError> {
        let closed = match mem::replace(&mut self.state, State::Spent) {
            State::Map(map) => SerializeMap::end(map),
            State::Seq(seq) => SerializeSeq::end(seq),
            other => {
                self.state = other;
                return Err(self.misplaced("close"));
            }
        };
        match closed {
            Ok(ok) => {
                self.state = State::Done(ok);
                Ok(())
            }
            Err(error) => Err(self.fail(error)),
        }
    }

    fn set(
        &mut self,
        alias: Option<&str>,
        space: Option<&str>,
        codec: &dyn Codec,
        value: &dyn Object,
    ) -> Result<(), CodecError> {
        let entry = SerializeDriver {
            registry: self.registry,
            flags: self.flags,
            codec: Some(codec),
            value,
            space,
        };
        let written = match (&mut self.state, alias) {
            (State::Map(map), Some(alias)) => map.serialize_entry(alias, &entry),
            (State::Seq(seq), _) => seq.serialize_element(&entry),
            (State::Map(_), None) => return Err(CodecError::Custom("an object entry needs a name".to_string())),
            _ => return Err(self.misplaced("set")),
        };
        written.map_err(|error| self.fail(error))
    }

    fn null(&mut self, alias: Option<&str>) -> Result<(), CodecError> {
        let written = match (&mut self.state, alias) {
            (State::Map(map), Some(alias)) => map.serialize_entry(alias, &Token::Null),
            (State::Seq(seq), _) => seq.serialize_element(&Token::Null),
            (State::Map(_), None) => return Err(CodecError::Custom("an object entry needs a name".to_string())),
            _ => return Err(self.misplaced("null")),
        };
        written.map_err(|error| self.fail(error))
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::vec;

    use super::SerializeDriver;
    use crate::Flags;
    use crate::registry::Registry;

    #[test]
    fn scalars_and_lists() {
        let registry = Registry::global();

        let output = serde_json::to_string(&SerializeDriver::new(&7_u8, registry)).unwrap();
        assert_eq!(output, "7");

        let value = vec![String::from("a"), String::from("b")];
        let output = serde_json::to_string(&SerializeDriver::new(&value, registry)).unwrap();
        assert_eq!(output, r#"["a","b"]"#);
    }

    #[test]
    fn maps_keep_key_order() {
        let registry = Registry::global();
        let mut value = BTreeMap::new();
        value.insert(String::from("b"), vec![true]);
        value.insert(String::from("a"), vec![]);

        let output = serde_json::to_string(&SerializeDriver::new(&value, registry)).unwrap();
        assert_eq!(output, r#"{"a":[],"b":[true]}"#);

        // Maps are not structures, the discriminator is their short name.
        let output = serde_json::to_string(&SerializeDriver::new(&value, registry).with_flags(Flags::WRITE_SPACE)).unwrap();
        assert_eq!(output, r#"{"@type":"BTreeMap","a":[],"b":[true]}"#);
    }
}
