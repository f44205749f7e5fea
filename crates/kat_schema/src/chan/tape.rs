use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::Flags;
use crate::builder::Driver;
use crate::chan::Chan;
use crate::codec::{self, Codec, Shape, Token};
use crate::error::{CodecError, ProtocolError};
use crate::info::Object;
use crate::registry::Registry;

/// One recorded write.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Open {
        alias: Option<Box<str>>,
        space: Option<Box<str>>,
        shape: Shape,
    },
    Scalar {
        alias: Option<Box<str>>,
        token: Token<'static>,
    },
    Close,
}

// -----------------------------------------------------------------------------
// Tape

/// An in-memory recording of what a codec wrote.
///
/// [`replay`](Self::replay) feeds the recording back through a [`Driver`],
/// the same way a parser would, without any text format in between.
///
/// # Examples
///
/// ```
/// use kat_schema::chan::Tape;
/// use kat_schema::registry::Registry;
///
/// let registry = Registry::global();
/// let tape = Tape::record(registry, Default::default(), &vec![1_u8, 2, 3]).unwrap();
///
/// let codec = registry.resolve(<Vec<u8> as kat_schema::info::Typed>::type_info()).unwrap();
/// let mut driver = registry.driver(Default::default());
/// let value = tape.replay(&mut driver, &*codec).unwrap();
///
/// assert_eq!(value.downcast_ref::<Vec<u8>>(), Some(&vec![1, 2, 3]));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tape {
    events: Vec<Event>,
}

impl Tape {
    /// Records `value` with the codec of its runtime type.
    pub fn record(registry: &Registry, flags: Flags, value: &dyn Object) -> Result<Self, CodecError> {
        let (codec, value) = codec::runtime(registry, value)?;
        Self::record_with(registry, flags, &*codec, value)
    }

    /// Records `value` with `codec`.
    pub fn record_with(
        registry: &Registry,
        flags: Flags,
        codec: &dyn Codec,
        value: &dyn Object,
    ) -> Result<Self, CodecError> {
        let mut recorder = Recorder {
            registry,
            flags,
            events: Vec::new(),
            pending: None,
        };
        codec.write(&mut recorder, value)?;
        Ok(Self {
            events: recorder.events,
        })
    }

    #[inline]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Aliases of the root value's entries, in write order.
    pub fn aliases(&self) -> Vec<&str> {
        let mut depth = 0_usize;
        let mut aliases = Vec::new();
        for event in &self.events {
            match event {
                Event::Open { alias, .. } => {
                    if depth == 1
                        && let Some(alias) = alias
                    {
                        aliases.push(&**alias);
                    }
                    depth += 1;
                }
                Event::Scalar { alias: Some(alias), .. } if depth == 1 => aliases.push(&**alias),
                Event::Close => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        aliases
    }

    /// Drives `driver` with the recording and returns the root value.
    ///
    /// Entries without an alias carry their position. A nested value the
    /// driver declines is skipped whole. On failure the driver is abandoned.
    pub fn replay(&self, driver: &mut Driver, codec: &dyn Codec) -> Result<Box<dyn Object>, CodecError> {
        let (first, rest) = match self.events.split_first() {
            Some(split) => split,
            None => return Err(ProtocolError::Idle.into()),
        };

        match first {
            Event::Scalar { token, .. } => {
                let context = driver.context().ok_or(ProtocolError::Idle)?;
                codec.read(context, token.by_ref())
            }
            Event::Open { .. } => {
                driver.begin(codec)?;
                match Self::drive(driver, rest) {
                    Ok(()) => driver.finish(),
                    Err(error) => {
                        driver.abandon();
                        Err(error)
                    }
                }
            }
            Event::Close => Err(ProtocolError::NotOpen.into()),
        }
    }

    fn drive(driver: &mut Driver, events: &[Event]) -> Result<(), CodecError> {
        // Entry count of every open level.
        let mut counters = Vec::from([0_usize]);
        let mut skip = 0_usize;

        let next = |counters: &mut Vec<usize>, alias: &Option<Box<str>>| {
            let counter = counters.last_mut()?;
            let index = *counter;
            *counter += 1;
            alias.is_none().then_some(index)
        };

        for event in events {
            if skip > 0 {
                match event {
                    Event::Open { .. } => skip += 1,
                    Event::Close => skip -= 1,
                    Event::Scalar { .. } => {}
                }
                continue;
            }

            match event {
                Event::Open { alias, space, .. } => {
                    let index = next(&mut counters, alias);
                    if driver.open(alias.as_deref(), index, space.as_deref())? {
                        counters.push(0);
                    } else {
                        skip = 1;
                    }
                }
                Event::Scalar { alias, token } => {
                    let index = next(&mut counters, alias);
                    driver.emit(alias.as_deref(), index, token.by_ref())?;
                }
                Event::Close => {
                    counters.pop();
                    driver.close()?;
                }
            }
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Recorder

struct Recorder<'r> {
    registry: &'r Registry,
    flags: Flags,
    events: Vec<Event>,
    // Alias and space of the entry being written.
    pending: Option<(Option<Box<str>>, Option<Box<str>>)>,
}

impl Chan for Recorder<'_> {
    #[inline]
    fn registry(&self) -> &Registry {
        self.registry
    }

    #[inline]
    fn flags(&self) -> Flags {
        self.flags
    }

    fn emit(&mut self, token: Token<'_>) -> Result<(), CodecError> {
        let (alias, _) = self.pending.take().unwrap_or_default();
        self.events.push(Event::Scalar {
            alias,
            token: token.into_owned(),
        });
        Ok(())
    }

    fn open(&mut self, shape: Shape) -> Result<(), CodecError> {
        let (alias, space) = self.pending.take().unwrap_or_default();
        self.events.push(Event::Open { alias, space, shape });
        Ok(())
    }

    fn close(&mut self) -> Result<(), CodecError> {
        self.events.push(Event::Close);
        Ok(())
    }

    fn set(
        &mut self,
        alias: Option<&str>,
        space: Option<&str>,
        codec: &dyn Codec,
        value: &dyn Object,
    ) -> Result<(), CodecError> {
        self.pending = Some((alias.map(Into::into), space.map(Into::into)));
        codec.write(self, value)
    }

    fn null(&mut self, alias: Option<&str>) -> Result<(), CodecError> {
        self.events.push(Event::Scalar {
            alias: alias.map(Into::into),
            token: Token::Null,
        });
        Ok(())
    }
}
