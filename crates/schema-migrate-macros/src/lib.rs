//! Proc macros for `schema-migrate`.
//!
//! Provides two macros:
//!
//! - **`#[versioned_schema]`**: Attribute macro that implements
//!   `VersionedSchema` for a struct or enum.
//!
//! - **`#[converter]`**: Attribute macro that wraps a conversion function
//!   into a `Converter` implementation.

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, punctuated::Punctuated, token::Comma, DeriveInput, ItemFn, Meta, Type,
};

/// Parse `key = <int>` pairs, rejecting keys outside `allowed`.
fn parse_int_args(
    args: &Punctuated<Meta, Comma>,
    allowed: &[&str],
) -> Result<Vec<(String, u32)>, syn::Error> {
    let mut out = Vec::new();
    for meta in args {
        let Meta::NameValue(nv) = meta else {
            return Err(syn::Error::new_spanned(meta, "expected `key = value`"));
        };
        let key = nv
            .path
            .get_ident()
            .map(|i| i.to_string())
            .unwrap_or_default();
        if !allowed.contains(&key.as_str()) {
            return Err(syn::Error::new_spanned(
                &nv.path,
                format!("unknown attribute `{key}`"),
            ));
        }
        match &nv.value {
            syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Int(lit),
                ..
            }) => out.push((key, lit.base10_parse()?)),
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    format!("`{key}` must be an integer literal"),
                ))
            }
        }
    }
    Ok(out)
}

fn required(args: &[(String, u32)], key: &str) -> Result<u32, syn::Error> {
    args.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| *v)
        .ok_or_else(|| {
            syn::Error::new(
                proc_macro2::Span::call_site(),
                format!("missing required attribute `{key}`"),
            )
        })
}

/// Attribute macro that implements `schema_migrate::VersionedSchema`.
///
/// # Attributes
///
/// - `version = N`: **Required.** The schema version number.
///
/// # Example
///
/// ```ignore
/// use schema_migrate::versioned_schema;
/// use serde::{Serialize, Deserialize};
///
/// #[versioned_schema(version = 1)]
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Settings {
///     dark: bool,
/// }
/// ```
#[proc_macro_attribute]
pub fn versioned_schema(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let args = parse_macro_input!(attr with Punctuated::<Meta, Comma>::parse_terminated);

    let version = match parse_int_args(&args, &["version"]).and_then(|a| required(&a, "version")) {
        Ok(v) => v,
        Err(e) => return e.to_compile_error().into(),
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        #input

        impl #impl_generics schema_migrate::VersionedSchema for #name #ty_generics #where_clause {
            const VERSION: u32 = #version;
        }
    };

    expanded.into()
}

/// If `ty` is `Result<T, ..>`, return `T`.
fn result_ok_type(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let last = path.path.segments.last()?;
    if last.ident != "Result" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        syn::GenericArgument::Type(t) => Some(t),
        _ => None,
    })
}

/// Attribute macro that wraps a conversion function into a `Converter`.
///
/// The function takes the old version's record and returns either the new
/// record or `Result<New, E>` where `E: Into<SchemaError>`. Both record
/// types must implement serde's `Serialize`/`Deserialize`.
///
/// # Attributes
///
/// - `from = N`: **Required.** Source schema version.
/// - `to = M`: **Required.** Target schema version; must be `N + 1`.
///
/// # Generated Code
///
/// Creates a struct `{FnName}Converter` that implements `Converter`, plus a
/// `register_{fn_name}` function returning it boxed.
///
/// # Example
///
/// ```ignore
/// use schema_migrate::converter;
///
/// #[converter(from = 1, to = 2)]
/// fn add_humidity(old: SensorV1) -> SensorV2 {
///     SensorV2 { temperature: old.temperature, humidity: None }
/// }
/// // Generates: AddHumidityConverter struct + impl Converter
/// // Generates: fn register_add_humidity() -> Box<dyn Converter>
/// ```
#[proc_macro_attribute]
pub fn converter(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    let args = parse_macro_input!(attr with Punctuated::<Meta, Comma>::parse_terminated);

    let versions = parse_int_args(&args, &["from", "to"])
        .and_then(|a| Ok((required(&a, "from")?, required(&a, "to")?)));
    let (from_ver, to_ver) = match versions {
        Ok(v) => v,
        Err(e) => return e.to_compile_error().into(),
    };
    if from_ver.checked_add(1) != Some(to_ver) {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            format!("converter must advance exactly one version, got {from_ver} -> {to_ver}"),
        )
        .to_compile_error()
        .into();
    }

    let fn_name = &input.sig.ident;
    let vis = &input.vis;

    let input_type = match (input.sig.inputs.len(), input.sig.inputs.first()) {
        (1, Some(syn::FnArg::Typed(pat_type))) => &pat_type.ty,
        _ => {
            return syn::Error::new_spanned(
                &input.sig,
                "converter function must take exactly one argument",
            )
            .to_compile_error()
            .into();
        }
    };

    let output_type = match &input.sig.output {
        syn::ReturnType::Type(_, ty) => ty.as_ref(),
        syn::ReturnType::Default => {
            return syn::Error::new_spanned(&input.sig, "converter function must have a return type")
                .to_compile_error()
                .into();
        }
    };

    let (new_type, call) = match result_ok_type(output_type) {
        Some(ok) => (ok, quote! { #fn_name(old)? }),
        None => (output_type, quote! { #fn_name(old) }),
    };

    // snake_case -> PascalCase + "Converter"
    let struct_name = {
        let name = fn_name.to_string();
        let pascal: String = name
            .split('_')
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect();
        syn::Ident::new(&format!("{pascal}Converter"), fn_name.span())
    };

    let register_fn = syn::Ident::new(&format!("register_{fn_name}"), fn_name.span());

    let expanded = quote! {
        #input

        /// Auto-generated conversion step.
        #vis struct #struct_name;

        impl schema_migrate::Converter for #struct_name {
            fn source_version(&self) -> u32 {
                #from_ver
            }

            fn target_version(&self) -> u32 {
                #to_ver
            }

            fn convert(
                &self,
                data: schema_migrate::Value,
            ) -> ::core::result::Result<schema_migrate::Value, schema_migrate::SchemaError> {
                let old: #input_type = schema_migrate::decode(data)?;
                let new: #new_type = #call;
                schema_migrate::encode(&new, #to_ver)
            }
        }

        /// Boxed instance of this conversion step.
        #vis fn #register_fn() -> ::std::boxed::Box<dyn schema_migrate::Converter> {
            ::std::boxed::Box::new(#struct_name)
        }
    };

    expanded.into()
}
