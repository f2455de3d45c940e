use std::collections::BTreeSet;

use darling::{FromDeriveInput, FromVariant, ast::Data};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Generics, Ident};

use crate::{
    path_overrides::PathOverrides,
    rename::{RenameRule, distinct_aliases},
};

#[derive(FromDeriveInput)]
#[darling(attributes(field_enum), supports(enum_unit))]
struct FieldEnumInput {
    ident: Ident,
    generics: Generics,
    data: Data<FieldEnumVariant, ()>,

    #[darling(default)]
    rename: Option<String>,

    #[darling(default)]
    rename_all: Option<RenameRule>,

    #[darling(default)]
    path_overrides: PathOverrides,
}

#[derive(FromVariant)]
#[darling(attributes(field_enum))]
struct FieldEnumVariant {
    ident: Ident,

    #[darling(default)]
    rename: Option<String>,

    #[darling(default, multiple)]
    alias: Vec<String>,
}

struct WireVariant {
    ident: Ident,
    name: String,
    aliases: Vec<String>,
}

fn wire_variants(
    variants: Vec<FieldEnumVariant>,
    rename_all: RenameRule,
) -> darling::Result<Vec<WireVariant>> {
    let mut errors = darling::Error::accumulator();
    let mut seen = BTreeSet::new();
    let mut wire = Vec::new();

    for FieldEnumVariant {
        ident,
        rename,
        alias,
    } in variants
    {
        let name = rename.unwrap_or_else(|| rename_all.apply(&ident.to_string()));
        let aliases = distinct_aliases(&name, std::iter::once(ident.to_string()).chain(alias));

        for spelling in std::iter::once(&name).chain(&aliases) {
            if !seen.insert(spelling.clone()) {
                errors.push(
                    darling::Error::custom(format!("`{spelling}` names more than one variant"))
                        .with_span(&ident),
                );
            }
        }

        wire.push(WireVariant {
            ident,
            name,
            aliases,
        });
    }

    errors.finish_with(wire)
}

pub fn derive(input: DeriveInput) -> TokenStream {
    let FieldEnumInput {
        ident,
        generics,
        data,
        rename,
        rename_all,
        path_overrides: PathOverrides { swaggering: sw },
    } = match FieldEnumInput::from_derive_input(&input) {
        Ok(input) => input,
        Err(err) => return err.write_errors(),
    };

    if !generics.params.is_empty() {
        return darling::Error::custom("`#[derive(FieldEnum)]` does not support generic types")
            .with_span(&generics)
            .write_errors();
    }

    let variants = data
        .take_enum()
        .expect("`supports(enum_unit)` only accepts enums");

    let variants =
        match wire_variants(variants, rename_all.unwrap_or(RenameRule::ScreamingSnakeCase)) {
            Ok(variants) => variants,
            Err(err) => return err.write_errors(),
        };

    let type_name = rename.unwrap_or_else(|| ident.to_string());
    let idents = variants.iter().map(|variant| &variant.ident).collect::<Vec<_>>();
    let names = variants.iter().map(|variant| &variant.name).collect::<Vec<_>>();
    let patterns = variants.iter().map(|WireVariant { name, aliases, .. }| {
        quote! { #name #(| #aliases)* }
    });

    quote! {
        #[automatically_derived]
        impl #ident {
            /// The wire names of all variants, in declaration order.
            pub const VARIANTS: &'static [&'static str] = &[#(#names),*];

            /// Returns the wire name of the variant.
            pub fn as_str(&self) -> &'static str {
                match *self {
                    #(Self::#idents => #names,)*
                }
            }
        }

        #[automatically_derived]
        impl ::core::fmt::Display for #ident {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        #[automatically_derived]
        impl #sw::FieldValue for #ident {
            fn type_name() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(#type_name)
            }

            fn from_field_value(
                value: #sw::Value,
            ) -> ::core::result::Result<Self, #sw::ValueError> {
                let variant = match &value {
                    #sw::Value::String(name) => match name.as_str() {
                        #(#patterns => ::core::option::Option::Some(Self::#idents),)*
                        _ => ::core::option::Option::None,
                    },
                    _ => ::core::option::Option::None,
                };

                variant.ok_or_else(|| #sw::value::mismatch::<Self>(value))
            }

            fn to_field_value(&self) -> #sw::Value {
                #sw::Value::String(::std::borrow::ToOwned::to_owned(self.as_str()))
            }
        }

        #[automatically_derived]
        impl #sw::__private::serde::Serialize for #ident {
            fn serialize<__S>(&self, serializer: __S) -> ::core::result::Result<__S::Ok, __S::Error>
            where
                __S: #sw::__private::serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }
    }
}
