use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::access::{
    Accessor, ArgumentAccessor, Arguments, Caps, FieldAccessor, GetterAccessor, Inherited, OptionAccessor,
    SetterAccessor,
};
use crate::error::{CodecError, SchemaError};
use crate::info::Typed;
use crate::schema::{Construct, Describe, Draft, Expose, Property, Schema};
use crate::table::PropertyTable;
use crate::table::order::Sequence;

struct Member {
    name: Box<str>,
    expose: Expose,
    grade: u32,
    accessor: Arc<dyn Accessor>,
}

// -----------------------------------------------------------------------------
// SchemaBuilder

/// Collects the members of a type, then [`finish`](Self::finish)es into a
/// [`Schema`].
///
/// Members of ancestors added through [`inherit`](Self::inherit) rank after
/// the type's own members, so a name declared by the type itself wins.
pub struct SchemaBuilder<T> {
    grade: u32,
    members: Vec<Member>,
    inherited: Vec<Member>,
    explicit: Option<Construct<T>>,
    default: Option<fn() -> T>,
    arguments: Option<(usize, fn(&mut Arguments) -> Result<T, CodecError>)>,
}

impl<T: Describe> SchemaBuilder<T> {
    /// Runs `T`'s description and builds its schema.
    pub fn describe() -> Result<Schema<T>, SchemaError> {
        let mut builder = Self::new();
        T::describe(&mut builder);
        builder.finish()
    }

    /// Adds the members of the ancestor `B` embedded in `T`, one grade
    /// deeper.
    ///
    /// The ancestor's constructor arguments and strategy are ignored.
    pub fn inherit<B: Describe>(&mut self, up: fn(&T) -> &B, up_mut: fn(&mut T) -> &mut B) -> &mut Self {
        let mut base = SchemaBuilder::<B>::with_grade(self.grade + 1);
        B::describe(&mut base);

        for member in base.members.into_iter().chain(base.inherited) {
            if member.accessor.caps() - Caps::POSITION == Caps::empty() {
                continue;
            }
            self.inherited.push(Member {
                name: member.name,
                expose: member.expose,
                grade: member.grade,
                accessor: Arc::new(Inherited::new(member.accessor, up, up_mut)),
            });
        }
        self
    }
}

impl<T: Typed + Send + Sync> SchemaBuilder<T> {
    #[inline]
    pub fn new() -> Self {
        Self::with_grade(0)
    }

    fn with_grade(grade: u32) -> Self {
        Self {
            grade,
            members: Vec::new(),
            inherited: Vec::new(),
            explicit: None,
            default: None,
            arguments: None,
        }
    }

    /// Adds a member with a custom accessor.
    pub fn member(&mut self, name: impl Into<Box<str>>, accessor: Arc<dyn Accessor>, expose: Expose) -> &mut Self {
        self.members.push(Member {
            name: name.into(),
            expose,
            grade: self.grade,
            accessor,
        });
        self
    }

    /// Adds a field, read and written in place.
    pub fn field<F: Typed + Send + Sync>(
        &mut self,
        name: &str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
        expose: Expose,
    ) -> &mut Self {
        let accessor = FieldAccessor::with_codec(get, get_mut, expose.codec.clone());
        self.member(name, Arc::new(accessor), expose)
    }

    /// Adds an `Option` field, whose `None` is the property's null.
    pub fn optional<F: Typed + Send + Sync>(
        &mut self,
        name: &str,
        get: fn(&T) -> &Option<F>,
        get_mut: fn(&mut T) -> &mut Option<F>,
        expose: Expose,
    ) -> &mut Self {
        let accessor = OptionAccessor::with_codec(get, get_mut, expose.codec.clone());
        self.member(name, Arc::new(accessor), expose)
    }

    /// Adds a computed, write-only property.
    pub fn getter<F: Typed + Send + Sync>(&mut self, name: &str, get: fn(&T) -> Option<F>, expose: Expose) -> &mut Self {
        let accessor = GetterAccessor::new(get, expose.codec.clone());
        self.member(name, Arc::new(accessor), expose)
    }

    /// Adds a read-only property applied through a method.
    pub fn setter<F: Typed + Send + Sync>(&mut self, name: &str, set: fn(&mut T, F), expose: Expose) -> &mut Self {
        let accessor = SetterAccessor::new(set, expose.codec.clone());
        self.member(name, Arc::new(accessor), expose)
    }

    /// Adds a constructor argument at `position`.
    pub fn argument<F: Typed + Send + Sync>(&mut self, name: &str, position: usize, expose: Expose) -> &mut Self {
        let accessor = ArgumentAccessor::<F>::new(position, expose.codec.clone());
        self.member(name, Arc::new(accessor), expose)
    }

    /// Adds a property applied to a draft of type `D`.
    pub fn draft_setter<D: 'static, F: Typed + Send + Sync>(
        &mut self,
        name: &str,
        set: fn(&mut D, F),
        expose: Expose,
    ) -> &mut Self {
        let accessor = SetterAccessor::new(set, expose.codec.clone());
        self.member(name, Arc::new(accessor), expose)
    }

    /// Offers construction from a default instance.
    #[inline]
    pub fn default_with(&mut self, default: fn() -> T) -> &mut Self {
        self.default = Some(default);
        self
    }

    /// Offers construction from `arity` positional arguments.
    ///
    /// Of several offers the one with the most arguments is kept, the
    /// earlier one on a tie.
    #[inline]
    pub fn arguments_with(&mut self, arity: usize, make: fn(&mut Arguments) -> Result<T, CodecError>) -> &mut Self {
        match self.arguments {
            Some((kept, _)) if kept >= arity => {}
            _ => self.arguments = Some((arity, make)),
        }
        self
    }

    /// Constructs through a draft `D`, filled by
    /// [`draft_setter`](Self::draft_setter)s.
    ///
    /// A draft is always preferred over the other strategies.
    #[inline]
    pub fn draft<D: Send + 'static>(&mut self, new: fn() -> D, finish: fn(D) -> Result<T, CodecError>) -> &mut Self {
        self.prefer(Construct::Draft(Draft::new(new, finish)))
    }

    /// Chooses the construction strategy, overriding the default choice.
    #[inline]
    pub fn prefer(&mut self, construct: Construct<T>) -> &mut Self {
        self.explicit = Some(construct);
        self
    }

    /// Builds the schema.
    ///
    /// The strategy is the explicit one, else the positional constructor
    /// when it takes arguments or is the only one, else the default
    /// instance.
    pub fn finish(self) -> Result<Schema<T>, SchemaError> {
        let info = T::type_info();
        let ty = info.type_path();

        let construct = match (self.explicit, self.arguments, self.default) {
            (Some(construct), _, _) => construct,
            (None, Some((arity, make)), None) => Construct::Arguments { arity, make },
            (None, Some((arity, make)), Some(_)) if arity > 0 => Construct::Arguments { arity, make },
            (None, _, Some(default)) => Construct::Default(default),
            (None, None, None) => return Err(SchemaError::NoConstructor(ty)),
        };

        let mut table = PropertyTable::new();
        let mut order = Sequence::new();
        let mut positions: Vec<Option<Arc<dyn Accessor>>> = Vec::new();
        if let Construct::Arguments { arity, .. } = &construct {
            positions.resize(*arity, None);
        }

        for member in self.members.into_iter().chain(self.inherited) {
            let Member {
                name,
                expose,
                grade,
                accessor,
            } = member;
            let caps = accessor.caps();

            for key in core::iter::once(&name).chain(&expose.aliases) {
                if caps.contains(Caps::WRITE) {
                    table.add_setter(key, accessor.clone());
                }
                if caps.contains(Caps::POSITION) {
                    table.add_argument(key, accessor.clone());
                }
                if expose.required {
                    table.require(key);
                }
            }

            if let Some(position) = accessor.position() {
                let Some(slot) = positions.get_mut(position) else {
                    if let Construct::Arguments { arity, .. } = &construct {
                        return Err(SchemaError::ArgumentOutOfRange {
                            ty,
                            index: position,
                            arity: *arity,
                        });
                    }
                    continue;
                };
                if slot.is_some() {
                    return Err(SchemaError::DuplicateArgument { ty, index: position });
                }
                *slot = Some(accessor.clone());
            }

            if caps.contains(Caps::READ) && table.add_getter(&name, accessor.clone()) && !expose.hidden {
                order.insert(
                    expose.index,
                    grade,
                    Property {
                        name,
                        aliases: expose.aliases.into_boxed_slice(),
                        index: expose.index,
                        grade,
                        nullable: expose.nullable,
                        unwrapped: expose.unwrapped,
                        required: expose.required,
                        accessor,
                    },
                );
            }
        }

        let arguments = positions
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(SchemaError::MissingArgument { ty, index }))
            .collect::<Result<Box<[_]>, _>>()?;

        log::debug!("built the schema of `{ty}`: {} properties, {construct:?}", order.len());
        Ok(Schema {
            info,
            properties: order.into_vec().into_boxed_slice(),
            table,
            construct,
            arguments,
        })
    }
}

impl<T: Typed + Send + Sync> Default for SchemaBuilder<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec::Vec;

    use super::SchemaBuilder;
    use crate::error::SchemaError;
    use crate::schema::{Construct, Describe, Expose};

    #[derive(Default)]
    struct Ordered {
        a: i32,
        b: i32,
        c: i32,
        d: i32,
    }

    crate::impls::impl_structure!(Ordered, "Ordered");

    impl Describe for Ordered {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .field("d", |v| &v.d, |v| &mut v.d, Expose::new().last())
                .field("a", |v| &v.a, |v| &mut v.a, Expose::new().index(2))
                .field("b", |v| &v.b, |v| &mut v.b, Expose::new().index(0))
                .field("c", |v| &v.c, |v| &mut v.c, Expose::new())
                .getter("hidden", |v| Some(v.a), Expose::new().hidden())
                .default_with(Ordered::default);
        }
    }

    #[test]
    fn property_order() {
        let schema = SchemaBuilder::<Ordered>::describe().unwrap();
        let names: Vec<_> = schema.properties().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["b", "a", "c", "d"]);
        assert!(matches!(schema.construct(), Construct::Default(_)));
        assert!(schema.getter("hidden", false).is_some());
    }

    #[derive(Default)]
    struct Base {
        name: String,
        id: i64,
    }

    crate::impls::impl_structure!(Base, "Base");

    impl Describe for Base {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .field("name", |v| &v.name, |v| &mut v.name, Expose::new().index(0))
                .field("id", |v| &v.id, |v| &mut v.id, Expose::new())
                .default_with(Base::default);
        }
    }

    #[derive(Default)]
    struct Derived {
        base: Base,
        name: String,
        level: u8,
    }

    crate::impls::impl_structure!(Derived, "Derived", parents = [Base]);

    impl Describe for Derived {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .field("level", |v| &v.level, |v| &mut v.level, Expose::new().index(0))
                .field("name", |v| &v.name, |v| &mut v.name, Expose::new())
                .inherit::<Base>(|v| &v.base, |v| &mut v.base)
                .default_with(Derived::default);
        }
    }

    #[test]
    fn inherited_members() {
        let schema = SchemaBuilder::<Derived>::describe().unwrap();
        let properties: Vec<_> = schema.properties().iter().map(|p| (p.name(), p.grade())).collect();
        // The ancestor's `name` is shadowed. Its natural `id` ranks first.
        assert_eq!(properties, [("level", 0), ("id", 1), ("name", 0)]);

        let mut value = Derived::default();
        let name = schema.setter("name", false).unwrap();
        name.set(&mut value, Some(Box::new(String::from("own")))).unwrap();
        let id = schema.setter("id", false).unwrap();
        id.set(&mut value, Some(Box::new(7_i64))).unwrap();
        assert_eq!(value.name, "own");
        assert!(value.base.name.is_empty());
        assert_eq!(value.base.id, 7);
    }

    #[derive(Default)]
    struct Pair {
        left: i32,
        right: i32,
    }

    crate::impls::impl_structure!(Pair, "Pair");

    impl Describe for Pair {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .field("left", |v| &v.left, |v| &mut v.left, Expose::new())
                .argument::<i32>("left", 0, Expose::new())
                .field("right", |v| &v.right, |v| &mut v.right, Expose::new())
                .argument::<i32>("right", 1, Expose::new())
                .arguments_with(2, |arguments| {
                    Ok(Pair {
                        left: arguments.take(0)?,
                        right: arguments.take(1)?,
                    })
                });
        }
    }

    fn make_pair(arguments: &mut crate::access::Arguments) -> Result<Pair, crate::error::CodecError> {
        Ok(Pair {
            left: arguments.take(0)?,
            right: arguments.take(1)?,
        })
    }

    #[test]
    fn argument_errors() {
        let schema = SchemaBuilder::<Pair>::describe().unwrap();
        assert_eq!(schema.arguments().len(), 2);
        assert!(schema.argument("right", false).is_some());
        assert!(matches!(schema.construct(), Construct::Arguments { arity: 2, .. }));

        let ty = core::any::type_name::<Pair>();

        let mut missing = SchemaBuilder::<Pair>::new();
        missing.argument::<i32>("left", 0, Expose::new()).arguments_with(2, make_pair);
        assert_eq!(missing.finish().unwrap_err(), SchemaError::MissingArgument { ty, index: 1 });

        let mut duplicate = SchemaBuilder::<Pair>::new();
        duplicate
            .argument::<i32>("left", 0, Expose::new())
            .argument::<i32>("right", 0, Expose::new())
            .arguments_with(2, make_pair);
        assert_eq!(duplicate.finish().unwrap_err(), SchemaError::DuplicateArgument { ty, index: 0 });

        let mut beyond = SchemaBuilder::<Pair>::new();
        beyond.argument::<i32>("left", 2, Expose::new()).arguments_with(2, make_pair);
        assert_eq!(
            beyond.finish().unwrap_err(),
            SchemaError::ArgumentOutOfRange { ty, index: 2, arity: 2 }
        );

        let nothing = SchemaBuilder::<Pair>::new();
        assert_eq!(nothing.finish().unwrap_err(), SchemaError::NoConstructor(ty));
    }

    fn make_left(arguments: &mut crate::access::Arguments) -> Result<Pair, crate::error::CodecError> {
        Ok(Pair {
            left: arguments.take(0)?,
            right: 0,
        })
    }

    #[test]
    fn richest_constructor() {
        let mut richest_first = SchemaBuilder::<Pair>::new();
        richest_first
            .argument::<i32>("left", 0, Expose::new())
            .argument::<i32>("right", 1, Expose::new())
            .arguments_with(2, make_pair)
            .arguments_with(1, make_left);
        let schema = richest_first.finish().unwrap();
        assert!(matches!(schema.construct(), Construct::Arguments { arity: 2, .. }));

        let mut richest_last = SchemaBuilder::<Pair>::new();
        richest_last
            .argument::<i32>("left", 0, Expose::new())
            .argument::<i32>("right", 1, Expose::new())
            .arguments_with(1, make_left)
            .arguments_with(2, make_pair);
        let schema = richest_last.finish().unwrap();
        assert!(matches!(schema.construct(), Construct::Arguments { arity: 2, .. }));

        let mut with_default = SchemaBuilder::<Pair>::new();
        with_default
            .argument::<i32>("left", 0, Expose::new())
            .default_with(Pair::default)
            .arguments_with(1, make_left);
        let schema = with_default.finish().unwrap();
        assert!(matches!(schema.construct(), Construct::Arguments { arity: 1, .. }));
    }
}
