//! Code generation for `#[derive(Record)]` and `#[derive(FromRow)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    spanned::Spanned, Data, DeriveInput, Error, Fields, GenericArgument, Ident, PathArguments,
    Result, Type,
};

use super::attrs::{parse_sheet_attrs, SheetKind};

/// One field of the derived struct.
struct FieldSpec {
    ident: Ident,
    ty: Type,
    /// Name used in descriptors and property paths.
    name: String,
    kind: SheetKind,
    /// The declared type is `Option<T>`.
    optional: bool,
    /// The inner type is `String`, `str` or `Cow<str>` and can be borrowed.
    borrowed_text: bool,
    display: bool,
    skip: bool,
}

/// Main implementation of the Record derive macro.
pub fn record_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let type_name = struct_name.to_string();
    let fields = collect_fields(&input, "Record")?;
    let container = parse_sheet_attrs(&input.attrs)?;
    if container.has_field_options() {
        return Err(Error::new(
            container.span,
            "only `display` is allowed on the struct itself",
        ));
    }

    let table = descriptor_table(&fields);
    let value_arms = fields.iter().filter(|f| !f.skip).map(|field| {
        let name = &field.name;
        let value = value_expr(field);
        quote! { #name => ::core::option::Option::Some(#value), }
    });

    let cell_text = if container.display {
        quote! {
            fn cell_text(&self) -> ::std::string::String {
                ::std::string::ToString::to_string(self)
            }
        }
    } else {
        quote! {}
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::sheetmap::Record for #struct_name #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                #type_name
            }

            fn fields(&self) -> &'static [::sheetmap::FieldDescriptor] {
                #table
            }

            fn field_value(&self, name: &str) -> ::core::option::Option<::sheetmap::FieldValue<'_>> {
                match name {
                    #(#value_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            #cell_text
        }
    })
}

/// Main implementation of the FromRow derive macro.
pub fn from_row_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let type_name = struct_name.to_string();
    let fields = collect_fields(&input, "FromRow")?;

    let table = descriptor_table(&fields);
    let mut ordinal = 0usize;
    let inits: Vec<TokenStream> = fields
        .iter()
        .map(|field| {
            let ident = &field.ident;
            let ty = &field.ty;
            if field.skip {
                quote! { #ident: ::core::default::Default::default(), }
            } else {
                let index = ordinal;
                ordinal += 1;
                quote! { #ident: slots.take::<#ty>(#index)?, }
            }
        })
        .collect();

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::sheetmap::FromRow for #struct_name #ty_generics #where_clause {
            fn row_type_name() -> &'static str {
                #type_name
            }

            fn row_fields() -> &'static [::sheetmap::FieldDescriptor] {
                #table
            }

            fn from_slots(slots: &mut ::sheetmap::RowSlots) -> ::sheetmap::Result<Self> {
                ::core::result::Result::Ok(#struct_name {
                    #(#inits)*
                })
            }
        }
    })
}

fn collect_fields(input: &DeriveInput, derive_name: &str) -> Result<Vec<FieldSpec>> {
    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    format!("{derive_name} can only be derived for structs with named fields"),
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                format!("{derive_name} can only be derived for structs"),
            ))
        }
    };

    let mut specs = Vec::with_capacity(named.len());
    for field in named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;
        let attrs = parse_sheet_attrs(&field.attrs)?;

        let (inner, optional) = unwrap_option(&field.ty);
        let kind = if attrs.display {
            SheetKind::String
        } else {
            attrs.kind.unwrap_or_else(|| infer_kind(inner))
        };

        let name = attrs
            .rename
            .unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string());
        if !attrs.skip && specs.iter().any(|s: &FieldSpec| !s.skip && s.name == name) {
            return Err(Error::new(
                field.span(),
                format!("duplicate field name `{name}`"),
            ));
        }

        specs.push(FieldSpec {
            ident,
            ty: field.ty.clone(),
            name,
            kind,
            optional,
            borrowed_text: is_text_type(inner),
            display: attrs.display,
            skip: attrs.skip,
        });
    }

    if specs.iter().all(|s| s.skip) {
        return Err(Error::new(
            input.span(),
            format!("{derive_name} needs at least one field that is not skipped"),
        ));
    }

    Ok(specs)
}

fn descriptor_table(fields: &[FieldSpec]) -> TokenStream {
    let entries = fields.iter().filter(|f| !f.skip).enumerate().map(|(ordinal, field)| {
        let name = &field.name;
        let kind = field.kind.variant_path();
        quote! { ::sheetmap::FieldDescriptor::new(#name, #kind, #ordinal), }
    });

    quote! {
        const FIELDS: &[::sheetmap::FieldDescriptor] = &[
            #(#entries)*
        ];
        FIELDS
    }
}

/// Expression producing the `FieldValue` of one field of `self`.
fn value_expr(field: &FieldSpec) -> TokenStream {
    let ident = &field.ident;
    let present = present_value(field);

    if field.optional {
        quote! {
            match &self.#ident {
                ::core::option::Option::Some(value) => #present,
                ::core::option::Option::None => ::sheetmap::FieldValue::Null,
            }
        }
    } else {
        quote! {
            {
                let value = &self.#ident;
                #present
            }
        }
    }
}

/// Expression converting `value` (a reference to the inner type) to a `FieldValue`.
fn present_value(field: &FieldSpec) -> TokenStream {
    if field.display {
        return quote! { ::sheetmap::FieldValue::display(value) };
    }

    match field.kind {
        SheetKind::String if field.borrowed_text => quote! {
            ::sheetmap::FieldValue::text(::core::convert::AsRef::<str>::as_ref(value))
        },
        SheetKind::String | SheetKind::Integer | SheetKind::Long | SheetKind::Double => {
            quote! { ::sheetmap::FieldValue::display(value) }
        }
        SheetKind::Date => quote! {
            ::sheetmap::FieldValue::Date(::sheetmap::AsDateTime::as_date_time(value))
        },
        SheetKind::Collection => quote! {
            ::sheetmap::FieldValue::Collection(
                value
                    .iter()
                    .map(|element| element as &dyn ::sheetmap::Record)
                    .collect(),
            )
        },
        SheetKind::Nested => quote! {
            ::sheetmap::FieldValue::Nested(value as &dyn ::sheetmap::Record)
        },
    }
}

/// Splits `Option<T>` into `(T, true)`; any other type is returned as is.
fn unwrap_option(ty: &Type) -> (&Type, bool) {
    if let Some((ident, Some(inner))) = last_segment(ty) {
        if ident == "Option" {
            return (inner, true);
        }
    }
    (ty, false)
}

/// Last path segment of a type and its first generic type argument.
fn last_segment(ty: &Type) -> Option<(String, Option<&Type>)> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    let first_arg = match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        }),
        _ => None,
    };
    Some((segment.ident.to_string(), first_arg))
}

fn is_text_type(ty: &Type) -> bool {
    match ty {
        Type::Reference(reference) => is_text_type(&reference.elem),
        _ => matches!(
            last_segment(ty).map(|(ident, _)| ident).as_deref(),
            Some("String" | "str" | "Cow")
        ),
    }
}

/// Infers the field kind from the declared (non-`Option`) type.
fn infer_kind(ty: &Type) -> SheetKind {
    match ty {
        Type::Reference(reference) => infer_kind(&reference.elem),
        Type::Array(_) | Type::Slice(_) => SheetKind::Collection,
        Type::Group(group) => infer_kind(&group.elem),
        Type::Paren(paren) => infer_kind(&paren.elem),
        _ => {
            let Some((ident, _)) = last_segment(ty) else {
                return SheetKind::Nested;
            };
            match ident.as_str() {
                "String" | "str" | "Cow" | "bool" | "char" => SheetKind::String,
                "i8" | "i16" | "i32" | "u8" | "u16" | "u32" => SheetKind::Integer,
                "i64" | "u64" | "i128" | "u128" | "isize" | "usize" => SheetKind::Long,
                "f32" | "f64" => SheetKind::Double,
                "NaiveDateTime" | "NaiveDate" | "DateTime" => SheetKind::Date,
                "Vec" | "VecDeque" | "HashSet" | "BTreeSet" | "LinkedList" => {
                    SheetKind::Collection
                }
                _ => SheetKind::Nested,
            }
        }
    }
}
