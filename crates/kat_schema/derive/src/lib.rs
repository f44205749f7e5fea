//! See [`Schema`].
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static SCHEMA_ATTRIBUTE_NAME: &str = "kat";

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod path;
mod schema;

// -----------------------------------------------------------------------------
// Macros

/// # Schema Derivation
///
/// `#[derive(Schema)]` implements `Typed` and `Describe` for a struct with
/// named fields. Every field is a property named after the field, in
/// declaration order.
///
/// ```rust, ignore
/// #[derive(Schema)]
/// struct User {
///     id: i64,
///     name: String,
/// }
/// ```
///
/// ## Construction
///
/// By default the struct is built from its properties as constructor
/// arguments, so it needs no `Default`. Arguments that never arrive take
/// their type's zero value.
///
/// With `#[kat(default)]` the struct starts from `Default::default()` and
/// each entry is written into its field.
///
/// ```rust, ignore
/// #[derive(Schema, Default)]
/// #[kat(default)]
/// struct Settings {
///     verbose: bool,
/// }
/// ```
///
/// ## Type Attributes
///
/// - `space = "name"`: another name of the type, repeatable. The first one
///   is the discriminator of dynamic values, the short type name otherwise.
/// - `parent = Path`: a type this one may stand in for, repeatable.
/// - `default`: see above.
/// - `auto_register`: submits the type so that every registry knows its
///   spaces. A no-op when the `auto_register` feature is disabled.
///
/// ## Field Attributes
///
/// ```rust, ignore
/// #[derive(Schema, Default)]
/// #[kat(default, space = "animal")]
/// struct Animal {
///     #[kat(index = 0, alias = "label")]
///     name: String,
///     #[kat(not_null)]
///     owner: Option<String>,
///     #[kat(skip)]
///     cache: Vec<u8>,
/// }
///
/// #[derive(Schema, Default)]
/// #[kat(default, parent = Animal)]
/// struct Cat {
///     #[kat(inherit)]
///     animal: Animal,
///     #[kat(rename = "lives", required)]
///     remaining_lives: u8,
/// }
/// ```
///
/// - `rename = "name"`, `alias = "name"`
/// - `index = N`, `last`
/// - `not_null`, `unwrapped`, `hidden`, `required`
/// - `codec = expr`: an `Arc<dyn Codec>` used instead of the resolved codec.
/// - `skip`: not a property. Takes its `Default` when the struct is built
///   from arguments.
/// - `inherit`: the field is a described ancestor, whose properties are
///   flattened into this type one grade deeper. Needs `#[kat(default)]`.
///
/// `Option<T>` fields hold the property's null as `None`.
///
/// Generic types, tuple structs and enums are not supported.
#[proc_macro_derive(Schema, attributes(kat))]
pub fn derive_schema(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match schema::SchemaDerive::parse(&ast) {
        Ok(derive) => derive.generate().into(),
        Err(err) => err.into_compile_error().into(),
    }
}
