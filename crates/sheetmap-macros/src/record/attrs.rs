//! Attribute parsing for the Record and FromRow derive macros.
//!
//! Both derives read the same `#[sheet(...)]` attribute, on fields and on
//! the container.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Lit, Meta, Result, Token,
};

/// Field kind named in `#[sheet(kind = "...")]` or inferred from the field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    String,
    Integer,
    Long,
    Double,
    Date,
    Collection,
    Nested,
}

impl SheetKind {
    /// Parse a kind from a string literal.
    pub fn from_str(s: &str, span: Span) -> Result<Self> {
        match s {
            "string" | "String" => Ok(SheetKind::String),
            "integer" | "Integer" => Ok(SheetKind::Integer),
            "long" | "Long" => Ok(SheetKind::Long),
            "double" | "Double" => Ok(SheetKind::Double),
            "date" | "Date" => Ok(SheetKind::Date),
            "collection" | "Collection" => Ok(SheetKind::Collection),
            "nested" | "Nested" => Ok(SheetKind::Nested),
            other => Err(Error::new(
                span,
                format!(
                    "unknown field kind: '{}'. Expected one of: string, integer, long, double, date, collection, nested",
                    other
                ),
            )),
        }
    }

    /// The `sheetmap::FieldKind` variant for this kind.
    pub fn variant_path(self) -> TokenStream {
        match self {
            SheetKind::String => quote! { ::sheetmap::FieldKind::String },
            SheetKind::Integer => quote! { ::sheetmap::FieldKind::Integer },
            SheetKind::Long => quote! { ::sheetmap::FieldKind::Long },
            SheetKind::Double => quote! { ::sheetmap::FieldKind::Double },
            SheetKind::Date => quote! { ::sheetmap::FieldKind::Date },
            SheetKind::Collection => quote! { ::sheetmap::FieldKind::Collection },
            SheetKind::Nested => quote! { ::sheetmap::FieldKind::Nested },
        }
    }
}

/// Attributes from `#[sheet(...)]`.
#[derive(Debug, Clone)]
pub struct SheetAttr {
    /// Leave the field out of the descriptor table.
    pub skip: bool,
    /// Field name used in property paths (default: the Rust field name).
    pub rename: Option<String>,
    /// Explicit kind, overriding inference.
    pub kind: Option<SheetKind>,
    /// Write the value through its `Display` impl.
    pub display: bool,
    /// The span for error reporting.
    pub span: Span,
}

impl Default for SheetAttr {
    fn default() -> Self {
        SheetAttr {
            skip: false,
            rename: None,
            kind: None,
            display: false,
            span: Span::call_site(),
        }
    }
}

impl SheetAttr {
    /// Returns `true` if any field-only option is set.
    pub fn has_field_options(&self) -> bool {
        self.skip || self.rename.is_some() || self.kind.is_some()
    }
}

impl Parse for SheetAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = SheetAttr {
            span: input.span(),
            ..SheetAttr::default()
        };

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::Path(p) if p.is_ident("skip") => attr.skip = true,
                Meta::Path(p) if p.is_ident("display") => attr.display = true,

                Meta::NameValue(nv) => {
                    let syn::Expr::Lit(syn::ExprLit {
                        lit: Lit::Str(s), ..
                    }) = &nv.value
                    else {
                        return Err(Error::new(
                            nv.value.span(),
                            "sheet attribute values must be string literals",
                        ));
                    };

                    if nv.path.is_ident("rename") {
                        if s.value().is_empty() || s.value().contains('.') {
                            return Err(Error::new(
                                s.span(),
                                "rename must be non-empty and must not contain '.'",
                            ));
                        }
                        attr.rename = Some(s.value());
                    } else if nv.path.is_ident("kind") {
                        attr.kind = Some(SheetKind::from_str(&s.value(), s.span())?);
                    } else {
                        return Err(Error::new(
                            nv.path.span(),
                            "unknown attribute. Expected: rename or kind",
                        ));
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown sheet attribute. Expected: skip, display, rename = \"...\", or kind = \"...\"",
                    ));
                }
            }
        }

        if attr.display && attr.kind.is_some_and(|kind| kind != SheetKind::String) {
            return Err(Error::new(
                attr.span,
                "display fields are always written with kind string",
            ));
        }

        Ok(attr)
    }
}

/// Extract `#[sheet(...)]` attributes.
pub fn parse_sheet_attrs(attrs: &[Attribute]) -> Result<SheetAttr> {
    for attr in attrs {
        if attr.path().is_ident("sheet") {
            return attr.parse_args::<SheetAttr>();
        }
    }
    Ok(SheetAttr::default())
}
