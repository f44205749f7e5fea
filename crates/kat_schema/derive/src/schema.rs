use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, GenericArgument, Ident, LitStr, PathArguments, Type};

use crate::attributes::{FieldAttributes, TypeAttributes};
use crate::path;

// -----------------------------------------------------------------------------
// FieldData

struct FieldData<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    attrs: FieldAttributes,
}

impl FieldData<'_> {
    fn name(&self) -> LitStr {
        match &self.attrs.rename {
            Some(rename) => rename.clone(),
            None => LitStr::new(&self.ident.unraw().to_string(), self.ident.span()),
        }
    }

    fn is_property(&self) -> bool {
        self.attrs.skip.is_none() && self.attrs.inherit.is_none()
    }
}

/// The `T` of an `Option<T>` field, matched by the last path segment.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };
    match arguments.args.first() {
        Some(GenericArgument::Type(inner)) if arguments.args.len() == 1 => Some(inner),
        _ => None,
    }
}

// -----------------------------------------------------------------------------
// SchemaDerive

pub(crate) struct SchemaDerive<'a> {
    ident: &'a Ident,
    attrs: TypeAttributes,
    fields: Vec<FieldData<'a>>,
    kat_schema: syn::Path,
}

impl<'a> SchemaDerive<'a> {
    pub fn parse(input: &'a DeriveInput) -> syn::Result<Self> {
        if !input.generics.params.is_empty() {
            return Err(syn::Error::new(
                input.generics.span(),
                "`Schema` cannot be derived for generic types, implement `Describe` by hand",
            ));
        }

        let named = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(fields) => Some(&fields.named),
                Fields::Unit => None,
                Fields::Unnamed(fields) => {
                    return Err(syn::Error::new(fields.span(), "`Schema` needs named fields"));
                }
            },
            Data::Enum(data) => {
                return Err(syn::Error::new(data.enum_token.span, "`Schema` cannot be derived for enums"));
            }
            Data::Union(data) => {
                return Err(syn::Error::new(data.union_token.span, "`Schema` cannot be derived for unions"));
            }
        };

        let attrs = TypeAttributes::parse_attrs(&input.attrs)?;

        let mut fields = Vec::new();
        for field in named.into_iter().flatten() {
            let Some(ident) = &field.ident else {
                continue;
            };
            let field_attrs = FieldAttributes::parse_attrs(&field.attrs)?;
            if let Some(span) = field_attrs.inherit
                && attrs.default.is_none()
            {
                return Err(syn::Error::new(
                    span,
                    "`inherit` needs `#[kat(default)]` on the type, ancestors are not constructor arguments",
                ));
            }
            fields.push(FieldData {
                ident,
                ty: &field.ty,
                attrs: field_attrs,
            });
        }

        Ok(Self {
            ident: &input.ident,
            attrs,
            fields,
            kat_schema: path::kat_schema(),
        })
    }

    pub fn generate(&self) -> TokenStream {
        let typed = self.typed_impl();
        let describe = self.describe_impl();
        let auto_register = self.auto_register_impl();

        quote! {
            const _: () = {
                #typed
                #describe
                #auto_register
            };
        }
    }

    fn typed_impl(&self) -> TokenStream {
        let info_ = path::info_(&self.kat_schema);
        let ident = self.ident;
        let name = LitStr::new(&ident.unraw().to_string(), ident.span());

        let spaces = &self.attrs.spaces;
        let with_spaces = (!spaces.is_empty()).then(|| quote! { .with_spaces(&[#(#spaces),*]) });

        let parents = &self.attrs.parents;
        let with_parents = (!parents.is_empty()).then(|| {
            quote! {
                .with_parents({
                    const PARENTS: &[fn() -> &'static #info_::TypeInfo] =
                        &[#(<#parents as #info_::Typed>::type_info),*];
                    PARENTS
                })
            }
        });

        quote! {
            impl #info_::Typed for #ident {
                fn type_info() -> &'static #info_::TypeInfo {
                    static CELL: #info_::NonGenericTypeInfoCell = #info_::NonGenericTypeInfoCell::new();
                    CELL.get_or_init(|| {
                        #info_::TypeInfo::structure::<Self>(#name)
                            #with_spaces
                            #with_parents
                    })
                }
            }
        }
    }

    fn expose(&self, field: &FieldData) -> TokenStream {
        let schema_ = path::schema_(&self.kat_schema);
        let attrs = &field.attrs;

        let aliases = &attrs.aliases;
        let index = attrs.index.as_ref().map(|index| quote! { .index(#index) });
        let last = attrs.last.map(|span| quote_spanned! { span => .last() });
        let not_null = attrs.not_null.map(|span| quote_spanned! { span => .not_null() });
        let unwrapped = attrs.unwrapped.map(|span| quote_spanned! { span => .unwrapped() });
        let hidden = attrs.hidden.map(|span| quote_spanned! { span => .hidden() });
        let required = attrs.required.map(|span| quote_spanned! { span => .required() });
        let codec = attrs.codec.as_ref().map(|codec| quote! { .codec(#codec) });

        quote! {
            #schema_::Expose::new()
                #(.alias(#aliases))*
                #index
                #last
                #not_null
                #unwrapped
                #hidden
                #required
                #codec
        }
    }

    fn describe_impl(&self) -> TokenStream {
        let schema_ = path::schema_(&self.kat_schema);
        let ident = self.ident;
        let by_arguments = self.attrs.default.is_none();

        let mut members = Vec::new();
        let mut position = 0_usize;
        for field in &self.fields {
            let member = field.ident;
            let ty = field.ty;

            if let Some(span) = field.attrs.inherit {
                members.push(quote_spanned! { span =>
                    schema.inherit::<#ty>(|v| &v.#member, |v| &mut v.#member);
                });
                continue;
            }
            if !field.is_property() {
                continue;
            }

            let name = field.name();
            let expose = self.expose(field);
            let shared = if by_arguments {
                quote! { ::core::clone::Clone::clone(&expose) }
            } else {
                quote! { expose }
            };
            let property = match option_inner(ty) {
                Some(inner) => quote! {
                    schema.optional::<#inner>(#name, |v| &v.#member, |v| &mut v.#member, #shared);
                },
                None => quote! {
                    schema.field::<#ty>(#name, |v| &v.#member, |v| &mut v.#member, #shared);
                },
            };
            let argument = by_arguments.then(|| {
                quote! {
                    schema.argument::<#ty>(#name, #position, expose);
                }
            });
            position += 1;

            members.push(quote! {
                {
                    let expose = #expose;
                    #property
                    #argument
                }
            });
        }

        let construct = if self.attrs.default.is_some() {
            quote! {
                schema.default_with(<Self as ::core::default::Default>::default);
            }
        } else {
            self.arguments_constructor(position)
        };

        quote! {
            impl #schema_::Describe for #ident {
                fn describe(schema: &mut #schema_::SchemaBuilder<Self>) {
                    #(#members)*
                    #construct
                }
            }
        }
    }

    /// Builds `Self` from one argument per property, in declaration order.
    /// Skipped fields take their `Default`.
    fn arguments_constructor(&self, arity: usize) -> TokenStream {
        let arguments_ = path::arguments_(&self.kat_schema);
        let codec_error_ = path::codec_error_(&self.kat_schema);

        let mut position = 0_usize;
        let inits = self.fields.iter().map(|field| {
            let member = field.ident;
            let ty = field.ty;
            if field.is_property() {
                let init = quote! { #member: arguments.take::<#ty>(#position)? };
                position += 1;
                init
            } else {
                quote! { #member: ::core::default::Default::default() }
            }
        });
        let inits: Vec<_> = inits.collect();

        quote! {
            schema.arguments_with(
                #arity,
                |arguments: &mut #arguments_| -> ::core::result::Result<Self, #codec_error_> {
                    ::core::result::Result::Ok(Self { #(#inits),* })
                },
            );
        }
    }

    #[cfg(feature = "auto_register")]
    fn auto_register_impl(&self) -> TokenStream {
        let Some(span) = self.attrs.auto_register else {
            return TokenStream::new();
        };
        let info_ = path::info_(&self.kat_schema);
        let auto_register_ = path::auto_register_(&self.kat_schema);
        let ident = self.ident;

        quote_spanned! { span =>
            #auto_register_::inventory::submit!{
                #auto_register_::TypeEntry(<#ident as #info_::Typed>::type_info)
            }
        }
    }

    #[cfg(not(feature = "auto_register"))]
    fn auto_register_impl(&self) -> TokenStream {
        TokenStream::new()
    }
}
