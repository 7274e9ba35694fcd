//! Proc-macros for blueberry-ui.
//!
//! Currently provided:
//! - `#[derive(WithBuilders)]`: generates `with_<field>(...)` builder methods for
//!   style and configuration structs. `Option<T>` fields take a plain `T`.
//! - `#[derive(Cascade)]`: generates the layered-defaults protocol for structs
//!   whose constraint fields are all `Option<_>`:
//!   - `overwrite(&mut self, other: &Self)` copies every constraint unconditionally
//!   - `merge(&mut self, other: &Self)` copies only the constraints `other` has set
//!   - `clear_constraints(&mut self)` unsets every constraint
//!
//! ## Field control
//! Fields that hold state rather than constraints are excluded with
//! `#[cascade(skip)]`. Skipped fields may have any type.
//!
//! ### Example
//! ```ignore
//! use blueberry_ui_macros::Cascade;
//!
//! #[derive(Clone, Debug, Default, Cascade)]
//! pub struct Constraints {
//!     pub fill: Option<f32>,
//!     pub colspan: Option<i32>,
//!     #[cascade(skip)]
//!     pub row: usize,
//! }
//!
//! let mut cell = Constraints::default();
//! let defaults = Constraints { fill: Some(1.0), colspan: None, row: 0 };
//! cell.merge(&defaults);
//! assert_eq!(cell.fill, Some(1.0));
//! ```

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, spanned::Spanned, Data, DeriveInput, Fields, GenericArgument, PathArguments,
    Type,
};

/// Derive that generates `with_<field>` builder methods for structs with named fields.
///
/// Generated methods take `self` by value and return `Self`. An `Option<T>`
/// field gets a builder taking `T` that stores `Some(value)`.
///
/// Field attributes:
/// - `#[with_builders(skip)]`: do not generate a builder method for this field.
#[proc_macro_derive(WithBuilders, attributes(with_builders))]
pub fn derive_with_builders(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let ident = &input.ident;
    let generics = &input.generics;

    let Data::Struct(data_struct) = &input.data else {
        return syn::Error::new(input.span(), "#[derive(WithBuilders)] only supports structs")
            .to_compile_error()
            .into();
    };

    let Fields::Named(fields_named) = &data_struct.fields else {
        return syn::Error::new(
            data_struct.fields.span(),
            "#[derive(WithBuilders)] only supports structs with named fields",
        )
        .to_compile_error()
        .into();
    };

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut methods = Vec::with_capacity(fields_named.named.len());
    for field in fields_named.named.iter() {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        if has_attr_flag(field, "with_builders", "skip") {
            continue;
        }

        let method_ident = format_ident!("with_{}", field_ident);
        let method = match option_inner(&field.ty) {
            Some(inner) => quote! {
                #[inline]
                pub fn #method_ident(mut self, value: #inner) -> Self {
                    self.#field_ident = ::core::option::Option::Some(value);
                    self
                }
            },
            None => {
                let field_ty = &field.ty;
                quote! {
                    #[inline]
                    pub fn #method_ident(mut self, value: #field_ty) -> Self {
                        self.#field_ident = value;
                        self
                    }
                }
            }
        };
        methods.push(method);
    }

    quote! {
        impl #impl_generics #ident #ty_generics #where_clause {
            #(#methods)*
        }
    }
    .into()
}

/// Derive that generates `overwrite`, `merge` and `clear_constraints` for structs
/// with named `Option<_>` fields.
///
/// Field attributes:
/// - `#[cascade(skip)]`: leave this field out of all three methods.
#[proc_macro_derive(Cascade, attributes(cascade))]
pub fn derive_cascade(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let ident = &input.ident;
    let generics = &input.generics;

    let Data::Struct(data_struct) = &input.data else {
        return syn::Error::new(input.span(), "#[derive(Cascade)] only supports structs")
            .to_compile_error()
            .into();
    };

    let Fields::Named(fields_named) = &data_struct.fields else {
        return syn::Error::new(
            data_struct.fields.span(),
            "#[derive(Cascade)] only supports structs with named fields",
        )
        .to_compile_error()
        .into();
    };

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut overwrites = Vec::new();
    let mut merges = Vec::new();
    let mut clears = Vec::new();
    for field in fields_named.named.iter() {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };

        if has_attr_flag(field, "cascade", "skip") {
            continue;
        }

        if !is_option(&field.ty) {
            return syn::Error::new(
                field.ty.span(),
                "#[derive(Cascade)] fields must be `Option<_>`; mark state fields with #[cascade(skip)]",
            )
            .to_compile_error()
            .into();
        }

        overwrites.push(quote! {
            self.#field_ident = ::core::clone::Clone::clone(&other.#field_ident);
        });
        merges.push(quote! {
            if other.#field_ident.is_some() {
                self.#field_ident = ::core::clone::Clone::clone(&other.#field_ident);
            }
        });
        clears.push(quote! {
            self.#field_ident = ::core::option::Option::None;
        });
    }

    quote! {
        impl #impl_generics #ident #ty_generics #where_clause {
            /// Copies every constraint from `other`, including unset ones.
            pub fn overwrite(&mut self, other: &Self) {
                #(#overwrites)*
            }

            /// Copies the constraints that `other` has set, leaving the rest untouched.
            pub fn merge(&mut self, other: &Self) {
                #(#merges)*
            }

            /// Unsets every constraint.
            pub fn clear_constraints(&mut self) {
                #(#clears)*
            }
        }
    }
    .into()
}

fn is_option(ty: &Type) -> bool {
    option_inner(ty).is_some()
}

/// `T` for a field typed `Option<T>`
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

/// Whether the field carries `#[<attr>(<flag>)]`
fn has_attr_flag(field: &syn::Field, attr_name: &str, flag: &str) -> bool {
    field
        .attrs
        .iter()
        .filter(|attr| attr.path().is_ident(attr_name))
        .any(|attr| {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident(flag) {
                    found = true;
                }
                Ok(())
            });
            found
        })
}
