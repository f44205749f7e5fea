//! Parsing of `#[kat(...)]` attributes.

use proc_macro2::Span;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Expr, LitInt, LitStr, Path};

use crate::SCHEMA_ATTRIBUTE_NAME;

fn flag(meta: &ParseNestedMeta, slot: &mut Option<Span>) -> syn::Result<()> {
    if slot.is_some() {
        return Err(meta.error("duplicate attribute"));
    }
    *slot = Some(meta.path.require_ident()?.span());
    Ok(())
}

// -----------------------------------------------------------------------------
// TypeAttributes

/// Container attributes.
///
/// - `space = "name"`: an extra name of the type, repeatable. The first one
///   is the discriminator written for dynamic values.
/// - `parent = Path`: a type this one may stand in for, repeatable.
/// - `default`: construct from `Default::default()` and apply properties
///   through the fields. Without it, the type is built from all its fields
///   as constructor arguments.
/// - `auto_register`: make the spaces known to every registry.
#[derive(Default)]
pub(crate) struct TypeAttributes {
    pub spaces: Vec<LitStr>,
    pub parents: Vec<Path>,
    pub default: Option<Span>,
    #[cfg_attr(not(feature = "auto_register"), allow(dead_code))]
    pub auto_register: Option<Span>,
}

impl TypeAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident(SCHEMA_ATTRIBUTE_NAME)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("space") {
                    this.spaces.push(meta.value()?.parse()?);
                } else if meta.path.is_ident("parent") {
                    this.parents.push(meta.value()?.parse()?);
                } else if meta.path.is_ident("default") {
                    flag(&meta, &mut this.default)?;
                } else if meta.path.is_ident("auto_register") {
                    flag(&meta, &mut this.auto_register)?;
                } else {
                    return Err(meta.error("unsupported type attribute"));
                }
                Ok(())
            })?;
        }
        Ok(this)
    }
}

// -----------------------------------------------------------------------------
// FieldAttributes

/// Field attributes.
///
/// | attribute            | effect |
/// |----------------------|--------|
/// | `rename = "name"`    | the property name, instead of the field name |
/// | `alias = "name"`     | an extra name accepted on read, repeatable |
/// | `index = N`          | explicit position |
/// | `last`               | after every other property |
/// | `not_null`           | nulls are not written |
/// | `unwrapped`          | entries written into the enclosing object |
/// | `hidden`             | read but never written |
/// | `required`           | no zero fallback on bad tokens |
/// | `codec = expr`       | an `Arc<dyn Codec>` to use instead of the resolved one |
/// | `skip`               | not a property |
/// | `inherit`            | a described ancestor whose properties are flattened in |
#[derive(Default)]
pub(crate) struct FieldAttributes {
    pub rename: Option<LitStr>,
    pub aliases: Vec<LitStr>,
    pub index: Option<LitInt>,
    pub last: Option<Span>,
    pub not_null: Option<Span>,
    pub unwrapped: Option<Span>,
    pub hidden: Option<Span>,
    pub required: Option<Span>,
    pub codec: Option<Expr>,
    pub skip: Option<Span>,
    pub inherit: Option<Span>,
}

impl FieldAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident(SCHEMA_ATTRIBUTE_NAME)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    this.rename = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("alias") {
                    this.aliases.push(meta.value()?.parse()?);
                } else if meta.path.is_ident("index") {
                    this.index = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("codec") {
                    this.codec = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("last") {
                    flag(&meta, &mut this.last)?;
                } else if meta.path.is_ident("not_null") {
                    flag(&meta, &mut this.not_null)?;
                } else if meta.path.is_ident("unwrapped") {
                    flag(&meta, &mut this.unwrapped)?;
                } else if meta.path.is_ident("hidden") {
                    flag(&meta, &mut this.hidden)?;
                } else if meta.path.is_ident("required") {
                    flag(&meta, &mut this.required)?;
                } else if meta.path.is_ident("skip") {
                    flag(&meta, &mut this.skip)?;
                } else if meta.path.is_ident("inherit") {
                    flag(&meta, &mut this.inherit)?;
                } else {
                    return Err(meta.error("unsupported field attribute"));
                }
                Ok(())
            })?;
        }
        this.validity()?;
        Ok(this)
    }

    fn validity(&self) -> syn::Result<()> {
        if let (Some(index), Some(span)) = (&self.index, self.last) {
            let mut error = syn::Error::new(span, "`last` conflicts with `index`");
            error.combine(syn::Error::new(index.span(), "`index` declared here"));
            return Err(error);
        }
        if let (Some(span), true) = (self.skip, self.inherit.is_some()) {
            return Err(syn::Error::new(span, "`skip` conflicts with `inherit`"));
        }
        Ok(())
    }
}
