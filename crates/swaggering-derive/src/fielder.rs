use std::collections::BTreeSet;

use darling::{FromDeriveInput, FromField, ast::Data};
use proc_macro2::{Literal, TokenStream};
use quote::quote;
use syn::{DeriveInput, Generics, Ident, ext::IdentExt};

use crate::{
    path_overrides::PathOverrides,
    rename::{RenameRule, distinct_aliases, exported},
};

#[derive(FromDeriveInput)]
#[darling(attributes(fielder), supports(struct_named))]
struct FielderInput {
    ident: Ident,
    generics: Generics,
    data: Data<(), FielderField>,

    /// Overrides the type name reported in errors and text output.
    #[darling(default)]
    rename: Option<String>,

    #[darling(default)]
    rename_all: Option<RenameRule>,

    #[darling(default)]
    path_overrides: PathOverrides,
}

#[derive(FromField)]
#[darling(attributes(fielder))]
struct FielderField {
    ident: Option<Ident>,

    #[darling(default)]
    rename: Option<String>,

    #[darling(default, multiple)]
    alias: Vec<String>,

    /// Marks the field holding the presence tracker.
    #[darling(default)]
    presence: bool,

    /// Excludes the field from the schema. It is neither populated nor
    /// marshalled.
    #[darling(default)]
    skip: bool,
}

struct SchemaField {
    ident: Ident,
    name: String,
    aliases: Vec<String>,
}

struct Layout {
    presence: Ident,
    fields: Vec<SchemaField>,
}

fn layout(
    fields: Vec<FielderField>,
    rename_all: RenameRule,
    ident: &Ident,
) -> darling::Result<Layout> {
    let mut errors = darling::Error::accumulator();
    let mut presence = Vec::new();
    let mut schema_fields = Vec::<SchemaField>::new();
    let mut names = BTreeSet::new();

    for field in fields {
        let Some(field_ident) = field.ident else {
            continue;
        };

        if field.presence {
            if field.rename.is_some() || !field.alias.is_empty() || field.skip {
                errors.push(
                    darling::Error::custom(
                        "the presence field cannot be renamed, aliased or skipped",
                    )
                    .with_span(&field_ident),
                );
            }
            presence.push(field_ident);
            continue;
        }

        if field.skip {
            continue;
        }

        let unraw = field_ident.unraw().to_string();
        let name = field
            .rename
            .clone()
            .unwrap_or_else(|| rename_all.apply(&unraw));

        if !names.insert(name.clone()) {
            errors.push(
                darling::Error::custom(format!("duplicate field name `{name}`"))
                    .with_span(&field_ident),
            );
            continue;
        }

        let aliases = distinct_aliases(
            &name,
            [exported(&unraw), unraw].into_iter().chain(field.alias),
        );

        schema_fields.push(SchemaField {
            ident: field_ident,
            name,
            aliases,
        });
    }

    let presence = match presence.len() {
        1 => presence.pop(),
        0 => {
            errors.push(
                darling::Error::custom(
                    "`#[derive(Fielder)]` requires a field marked with `#[fielder(presence)]`",
                )
                .with_span(ident),
            );
            None
        }
        _ => {
            errors.push(
                darling::Error::custom("only one field can be marked with `#[fielder(presence)]`")
                    .with_span(ident),
            );
            None
        }
    };

    errors.finish()?;
    let presence =
        presence.ok_or_else(|| darling::Error::custom("missing presence field").with_span(ident))?;

    Ok(Layout {
        presence,
        fields: schema_fields,
    })
}

pub fn derive(input: DeriveInput) -> TokenStream {
    let FielderInput {
        ident,
        generics,
        data,
        rename,
        rename_all,
        path_overrides: PathOverrides { swaggering: sw },
    } = match FielderInput::from_derive_input(&input) {
        Ok(input) => input,
        Err(err) => return err.write_errors(),
    };

    if !generics.params.is_empty() {
        return darling::Error::custom("`#[derive(Fielder)]` does not support generic types")
            .with_span(&generics)
            .write_errors();
    }

    let fields = data
        .take_struct()
        .expect("`supports(struct_named)` only accepts structs")
        .fields;

    let Layout { presence, fields } =
        match layout(fields, rename_all.unwrap_or(RenameRule::CamelCase), &ident) {
            Ok(layout) => layout,
            Err(err) => return err.write_errors(),
        };

    let type_name = rename.unwrap_or_else(|| ident.to_string());
    let descriptors = fields.iter().map(|SchemaField { name, aliases, .. }| {
        quote! { #sw::FieldDescriptor::new(#name, &[#(#aliases),*]) }
    });
    let indices = (0..fields.len()).map(Literal::usize_unsuffixed).collect::<Vec<_>>();
    let idents = fields.iter().map(|field| &field.ident).collect::<Vec<_>>();

    quote! {
        #[automatically_derived]
        impl #sw::Schema for #ident {
            const TYPE_NAME: &'static str = #type_name;
            const FIELDS: &'static [#sw::FieldDescriptor] = &[#(#descriptors),*];

            fn presence(&self) -> &#sw::Presence {
                &self.#presence
            }

            fn presence_mut(&mut self) -> &mut #sw::Presence {
                &mut self.#presence
            }

            fn read_slot(&self, index: usize) -> ::core::option::Option<#sw::Value> {
                match index {
                    #(#indices => ::core::option::Option::Some(
                        #sw::FieldValue::to_field_value(&self.#idents)
                    ),)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn write_slot(
                &mut self,
                index: usize,
                value: #sw::Value,
            ) -> ::core::result::Result<(), #sw::ValueError> {
                match index {
                    #(#indices => #sw::FieldValue::from_field_value(value)
                        .map(|field| self.#idents = field),)*
                    _ => ::core::result::Result::Err(#sw::ValueError::NoSuchSlot {
                        type_name: <Self as #sw::Schema>::TYPE_NAME,
                        index,
                    }),
                }
            }

            fn reset(&mut self)
            where
                Self: ::core::default::Default + ::core::marker::Sized,
            {
                let fresh = <Self as ::core::default::Default>::default();
                self.#presence = fresh.#presence;
                #(self.#idents = fresh.#idents;)*
            }
        }

        #[automatically_derived]
        impl #sw::FieldValue for #ident {
            fn type_name() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(<Self as #sw::Schema>::TYPE_NAME)
            }

            fn from_field_value(
                value: #sw::Value,
            ) -> ::core::result::Result<Self, #sw::ValueError> {
                #sw::populate::dto_from_value(value)
            }

            fn to_field_value(&self) -> #sw::Value {
                #sw::format::marshal_value(self)
            }
        }

        #[automatically_derived]
        impl #sw::Dto for #ident {
            fn dto_type_name(&self) -> &'static str {
                <Self as #sw::Schema>::TYPE_NAME
            }

            fn populate_value(
                &mut self,
                value: #sw::Value,
                options: &#sw::PopulateOptions,
            ) -> ::core::result::Result<(), #sw::PopulateError> {
                #sw::populate::populate_object(self, value, options)
            }

            fn marshal_value(&self) -> #sw::Value {
                #sw::format::marshal_value(self)
            }

            fn absorb(
                &mut self,
                other: &dyn #sw::Dto,
            ) -> ::core::result::Result<(), #sw::AbsorbError> {
                #sw::dto::absorb_from(self, other)
            }

            fn format_text(&self) -> ::std::string::String {
                #sw::format::format_text(<Self as #sw::Schema>::TYPE_NAME, self)
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }
        }

        #[automatically_derived]
        impl #sw::__private::serde::Serialize for #ident {
            fn serialize<__S>(&self, serializer: __S) -> ::core::result::Result<__S::Ok, __S::Error>
            where
                __S: #sw::__private::serde::Serializer,
            {
                #sw::format::serialize_dto(self, serializer)
            }
        }
    }
}
