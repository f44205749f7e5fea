//! [`Typed`](crate::info::Typed) for the built-in types.
//!
//! - scalars: `bool`, integers, floats, `char`, `String`, `()`;
//! - `Option<T>`, `Vec<T>`;
//! - `HashMap<String, V>`, `BTreeMap<String, V>`;
//! - `Box<dyn Object>`, the dynamic type.

// -----------------------------------------------------------------------------
// Modules

mod collections;
mod object;
mod scalars;

/// Implements [`Typed`](crate::info::Typed) for a type implementing
/// [`Describe`](crate::schema::Describe), without the derive macro.
///
/// `parents` lists the types a value may stand in for when read through a
/// discriminator.
///
/// ```
/// use kat_schema::schema::{Describe, Expose, SchemaBuilder};
///
/// #[derive(Default)]
/// struct Unit;
///
/// kat_schema::impls::impl_structure!(Unit, "Unit", spaces = ["unit"]);
///
/// impl Describe for Unit {
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema.default_with(Unit::default);
///     }
/// }
///
/// use kat_schema::info::Typed;
/// assert_eq!(Unit::type_info().space(), "unit");
/// ```
#[macro_export]
macro_rules! impl_structure {
    (
        $ty:ty, $name:literal
        $(, spaces = [$($space:literal),* $(,)?])?
        $(, parents = [$($parent:ty),* $(,)?])?
        $(,)?
    ) => {
        impl $crate::info::Typed for $ty {
            fn type_info() -> &'static $crate::info::TypeInfo {
                static CELL: $crate::info::NonGenericTypeInfoCell = $crate::info::NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| {
                    $crate::info::TypeInfo::structure::<Self>($name)
                        $(.with_spaces(&[$($space),*]))?
                        $(.with_parents({
                            const PARENTS: &[fn() -> &'static $crate::info::TypeInfo] =
                                &[$(<$parent as $crate::info::Typed>::type_info),*];
                            PARENTS
                        }))?
                })
            }
        }
    };
}

pub use crate::impl_structure;
