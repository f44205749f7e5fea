use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::sync::Arc;
use core::any::Any;

use crate::Flags;
use crate::access::{Accessor, Arguments};
use crate::builder::{Assembly, Builder, Context};
use crate::chan::{Chan, Inline};
use crate::codec::{Codec, Shape, Token, nested, read_or_zero, write_entry};
use crate::error::{CodecError, ProtocolError, SchemaError};
use crate::info::{Object, TypeInfo};
use crate::registry::Registry;
use crate::schema::{Construct, Describe, Schema, SchemaBuilder};

// -----------------------------------------------------------------------------
// SchemaCodec

/// The codec of a described type.
///
/// Writes the schema's properties in order. Reads by applying entries to
/// the instance, draft or constructor arguments, depending on the schema's
/// [`Construct`] strategy.
pub struct SchemaCodec<T> {
    schema: Arc<Schema<T>>,
}

impl<T: Describe> SchemaCodec<T> {
    #[inline]
    pub fn new(schema: Schema<T>) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }

    /// [`Synthesize`](crate::info::Synthesize) hook of described types.
    pub fn synthesize(_: &Registry) -> Result<Arc<dyn Codec>, SchemaError> {
        Ok(Arc::new(Self::new(SchemaBuilder::<T>::describe()?)))
    }

    #[inline]
    pub fn schema(&self) -> &Schema<T> {
        &self.schema
    }
}

impl<T: Describe> Codec for SchemaCodec<T> {
    #[inline]
    fn info(&self) -> &'static TypeInfo {
        T::type_info()
    }

    #[inline]
    fn shape(&self) -> Shape {
        Shape::Object
    }

    fn builder(&self, _: &Context) -> Result<Builder, CodecError> {
        Ok(Builder::new(SchemaAssembly {
            schema: self.schema.clone(),
            target: None,
            pending: None,
        }))
    }

    fn write(&self, chan: &mut dyn Chan, value: &dyn Object) -> Result<(), CodecError> {
        let target = value.innermost().as_any();
        let skip_null = chan.flags().contains(Flags::SKIP_NULL);

        chan.open(Shape::Object)?;
        for property in self.schema.properties() {
            let accessor = property.accessor();
            let Some(peek) = accessor.get(target)? else {
                if property.is_nullable() && !skip_null {
                    chan.null(Some(property.name()))?;
                }
                continue;
            };

            let declared = accessor.prepare(chan.registry())?;
            if property.is_unwrapped() && declared.shape() != Shape::Scalar {
                declared.write(&mut Inline::new(chan), peek.as_object())?;
            } else {
                write_entry(chan, Some(property.name()), Some(declared), peek.as_object())?;
            }
        }
        chan.close()
    }
}

// -----------------------------------------------------------------------------
// SchemaAssembly

enum Target<T> {
    Instance(T),
    Arguments(Arguments),
    Draft(Box<dyn Any + Send>),
}

struct SchemaAssembly<T> {
    schema: Arc<Schema<T>>,
    target: Option<Target<T>>,
    // Accessor of the open nested entry.
    pending: Option<Arc<dyn Accessor>>,
}

impl<T: Describe> SchemaAssembly<T> {
    /// Finds the accessor applying an entry, by name then by position.
    fn writer(
        &self,
        cx: &Context,
        alias: Option<&str>,
        index: Option<usize>,
    ) -> Result<Option<(Arc<dyn Accessor>, bool)>, CodecError> {
        let schema = &self.schema;
        let fold = cx.flags().contains(Flags::FOLD_ALIAS);

        let slot = alias
            .and_then(|name| schema.writer(name, fold))
            .or_else(|| index.and_then(|index| schema.nth(index)).and_then(|p| schema.writer(p.name(), false)));
        if let Some(slot) = slot
            && let Some(accessor) = slot.get(schema.construct().role())
        {
            return Ok(Some((accessor.clone(), slot.is_required())));
        }

        let name = match (alias, index) {
            (Some(alias), _) => alias.into(),
            (None, Some(index)) => index.to_string().into_boxed_str(),
            (None, None) => "<anonymous>".into(),
        };
        if cx.flags().contains(Flags::DENY_UNKNOWN) {
            return Err(CodecError::Unknown(name));
        }
        log::debug!("`{}` has no property `{name}`, skipping", schema.info().type_path());
        Ok(None)
    }

    fn apply(&mut self, accessor: &Arc<dyn Accessor>, value: Option<Box<dyn Object>>) -> Result<(), CodecError> {
        match self.target.as_mut().ok_or(ProtocolError::NotOpen)? {
            Target::Instance(instance) => {
                accessor.set(instance, value)?;
            }
            Target::Draft(draft) => {
                accessor.set(&mut **draft, value)?;
            }
            Target::Arguments(arguments) => accessor.put(arguments, value)?,
        }
        Ok(())
    }
}

impl<T: Describe> Assembly for SchemaAssembly<T> {
    fn on_create(&mut self, _: &Context) -> Result<(), CodecError> {
        self.target = Some(match self.schema.construct() {
            Construct::Default(default) => Target::Instance(default()),
            Construct::Arguments { arity, .. } => Target::Arguments(Arguments::new(*arity)),
            Construct::Draft(draft) => Target::Draft(draft.create()),
        });
        Ok(())
    }

    fn on_emit(
        &mut self,
        cx: &Context,
        alias: Option<&str>,
        index: Option<usize>,
        token: Token<'_>,
    ) -> Result<(), CodecError> {
        let Some((accessor, required)) = self.writer(cx, alias, index)? else {
            return Ok(());
        };
        if token.is_null() {
            return self.apply(&accessor, None);
        }

        let codec = accessor.prepare(cx.registry())?;
        let value = match read_or_zero(&**codec, cx, token, required) {
            Ok(value) => value,
            Err(error) if error.is_unsupported() && !cx.is_strict() => {
                log::debug!("skipping a scalar entry: {error}");
                return Ok(());
            }
            Err(error) => return Err(error),
        };
        self.apply(&accessor, value)
    }

    fn on_open(
        &mut self,
        cx: &Context,
        alias: Option<&str>,
        index: Option<usize>,
        space: Option<&str>,
    ) -> Result<Option<Builder>, CodecError> {
        let Some((accessor, _)) = self.writer(cx, alias, index)? else {
            return Ok(None);
        };
        let child = nested(cx, accessor.prepare(cx.registry())?, space)?;
        if child.is_some() {
            self.pending = Some(accessor);
        }
        Ok(child)
    }

    fn on_child(&mut self, _: &Context, value: Box<dyn Object>) -> Result<(), CodecError> {
        let accessor = self.pending.take().ok_or(ProtocolError::NotOpen)?;
        self.apply(&accessor, Some(value))
    }

    fn build(self: Box<Self>, cx: &Context) -> Result<Box<dyn Object>, CodecError> {
        let Self { schema, target, .. } = *self;
        let value = match target {
            Some(Target::Instance(instance)) => instance,
            Some(Target::Draft(draft)) => match schema.construct() {
                Construct::Draft(finisher) => finisher.finish(draft)?,
                _ => return Err(ProtocolError::NotOpen.into()),
            },
            Some(Target::Arguments(mut arguments)) => {
                for (position, accessor) in schema.arguments().iter().enumerate() {
                    if !arguments.is_vacant(position) {
                        continue;
                    }
                    if let Some(zero) = accessor.prepare(cx.registry())?.zero() {
                        arguments.put(position, zero)?;
                    }
                }
                match schema.construct() {
                    Construct::Arguments { make, .. } => make(&mut arguments)?,
                    _ => return Err(ProtocolError::NotOpen.into()),
                }
            }
            None => return Err(ProtocolError::NotOpen.into()),
        };
        Ok(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::Flags;
    use crate::chan::Tape;
    use crate::codec::Token;
    use crate::derive::Schema;
    use crate::error::CodecError;
    use crate::info::{Object, Typed};
    use crate::registry::{Registry, RegistryBuilder};

    fn isolated() -> Arc<Registry> {
        Arc::new(RegistryBuilder::new().without_auto_register().build())
    }

    #[derive(Schema, Debug, PartialEq)]
    struct User {
        #[kat(index = 0)]
        id: i32,
        #[kat(index = 1)]
        name: String,
    }

    #[test]
    fn arguments_fall_back_to_zero() {
        let registry = isolated();
        let codec = registry.try_resolve(User::type_info()).unwrap();

        let user = User {
            id: 1,
            name: String::from("kraity"),
        };
        let tape = Tape::record(&registry, Flags::empty(), &user).unwrap();
        assert_eq!(tape.aliases(), ["id", "name"]);
        let mut driver = registry.driver(Flags::empty());
        assert_eq!(User::take(tape.replay(&mut driver, &*codec).unwrap()).unwrap(), user);

        let mut driver = registry.driver(Flags::empty());
        driver.begin(&*codec).unwrap();
        driver.emit(Some("id"), None, Token::str("abc")).unwrap();
        driver.emit(Some("name"), None, Token::str("kraity")).unwrap();
        driver.close().unwrap();
        let user = driver.finish_as::<User>().unwrap();
        assert_eq!(user, User { id: 0, name: String::from("kraity") });

        // Positional entries, and a vacant argument.
        let mut driver = registry.driver(Flags::empty());
        driver.begin(&*codec).unwrap();
        driver.emit(None, Some(0), Token::Int(9)).unwrap();
        driver.close().unwrap();
        let user = driver.finish_as::<User>().unwrap();
        assert_eq!(user, User { id: 9, name: String::new() });
    }

    #[derive(Schema, Debug, Default, PartialEq)]
    #[kat(default)]
    struct Extra {
        #[kat(rename = "tag")]
        label: String,
    }

    #[derive(Schema, Debug, Default, PartialEq)]
    #[kat(default)]
    struct Account {
        #[kat(required)]
        balance: i64,
        #[kat(alias = "nick", not_null)]
        nickname: Option<String>,
        #[kat(hidden)]
        secret: String,
        #[kat(skip)]
        cache: Vec<u8>,
        #[kat(unwrapped)]
        extra: Extra,
    }

    #[test]
    fn tape_round_trip() {
        let registry = isolated();
        let value = Account {
            balance: 12,
            nickname: None,
            secret: String::from("s"),
            cache: vec![1, 2],
            extra: Extra {
                label: String::from("x"),
            },
        };

        let tape = Tape::record(&registry, Flags::empty(), &value).unwrap();
        assert_eq!(tape.aliases(), ["balance", "tag"]);

        let codec = registry.try_resolve(Account::type_info()).unwrap();
        let mut driver = registry.driver(Flags::empty());
        let read = Account::take(tape.replay(&mut driver, &*codec).unwrap()).unwrap();
        // Unwrapped entries are written only, `tag` is unknown on the way back.
        assert_eq!(read, Account { balance: 12, ..Account::default() });
    }

    #[test]
    fn required_and_aliases() {
        let registry = isolated();
        let codec = registry.try_resolve(Account::type_info()).unwrap();

        let mut driver = registry.driver(Flags::empty());
        driver.begin(&*codec).unwrap();
        assert!(matches!(
            driver.emit(Some("balance"), None, Token::str("lots")),
            Err(CodecError::Coercion(_))
        ));
        driver.emit(Some("nick"), None, Token::str("kat")).unwrap();
        driver.emit(Some("secret"), None, Token::str("read anyway")).unwrap();
        driver.close().unwrap();

        let account = driver.finish_as::<Account>().unwrap();
        assert_eq!(account.balance, 0);
        assert_eq!(account.nickname.as_deref(), Some("kat"));
        assert_eq!(account.secret, "read anyway");

        let mut driver = registry.driver(Flags::DENY_UNKNOWN);
        driver.begin(&*codec).unwrap();
        assert!(matches!(
            driver.emit(Some("tag"), None, Token::str("x")),
            Err(CodecError::Unknown(_))
        ));
        driver.abandon();
    }

    #[derive(Schema, Debug, Default, PartialEq)]
    #[kat(default, space = "kat.test.animal")]
    struct Animal {
        name: String,
    }

    #[derive(Schema, Debug, Default, PartialEq)]
    #[kat(default, space = "kat.test.cat", parent = Animal, auto_register)]
    struct Cat {
        #[kat(inherit)]
        animal: Animal,
        lives: u8,
    }

    #[derive(Schema, Default)]
    #[kat(default)]
    struct Zoo {
        pets: Vec<Box<dyn Object>>,
        star: Option<Animal>,
    }

    #[test]
    fn polymorphic_entries() {
        let registry = isolated();
        let cat = Cat {
            animal: Animal {
                name: String::from("tom"),
            },
            lives: 9,
        };
        let zoo = Zoo {
            pets: vec![Box::new(cat), Box::new(Animal { name: String::from("rex") })],
            star: None,
        };

        // Writing resolves both runtime types, which embeds their spaces.
        let tape = Tape::record(&registry, Flags::empty(), &zoo).unwrap();
        assert_eq!(tape.aliases(), ["pets", "star"]);

        let codec = registry.try_resolve(Zoo::type_info()).unwrap();
        let mut driver = registry.driver(Flags::empty());
        let read = Zoo::take(tape.replay(&mut driver, &*codec).unwrap()).unwrap();

        assert_eq!(read.pets.len(), 2);
        let cat = read.pets[0].innermost().downcast_ref::<Cat>().unwrap();
        assert_eq!((cat.animal.name.as_str(), cat.lives), ("tom", 9));
        let dog = read.pets[1].innermost().downcast_ref::<Animal>().unwrap();
        assert_eq!(dog.name, "rex");
        assert!(read.star.is_none());
    }

    #[cfg(feature = "auto_register")]
    #[test]
    fn auto_registered_spaces() {
        let registry = RegistryBuilder::new().build();
        assert_eq!(registry.subtype(Animal::type_info(), "kat.test.cat"), Some(Cat::type_info()));
        // Not submitted, so unknown until resolved.
        assert_eq!(registry.subtype(Animal::type_info(), "kat.test.animal"), None);
    }
}
