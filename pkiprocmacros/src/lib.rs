//! Procedural macros used in the definition and implementation of getters and setters for the
//! PolicySettings and PolicyResults maps used by trustval.
//!
//! Each macro takes the name of a key (i.e., `PS_HOSTNAME`), the type of the value associated with
//! that key and, for the `_with_default` variants, an expression that yields the value returned when
//! the key is absent. The key name, minus its three character prefix, is lower cased to form the
//! names of the generated `get_` and `set_` methods.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::parse::{Parse, ParseStream, Result};
use syn::{Expr, Ident, Token};

type ValueName = Ident;
type ValueType = Ident;
type DefaultValue = Expr;

/// Signature contains the results of parsing a gets_and_sets definition, i.e., the name of a value
/// stored in a map, the corresponding type and, optionally, a default value. For example:
///     ```text
///     ps_gets_and_sets!(PS_HOSTNAME, String);
///     ps_gets_and_sets_with_default!(PS_USE_ALLOWLIST, bool, true);
///     ```
struct Signature {
    value_name: ValueName,
    value_type: ValueType,
    default_value: Option<DefaultValue>,
}

impl Parse for Signature {
    fn parse(stream: ParseStream<'_>) -> Result<Self> {
        let value_name: ValueName = stream.parse()?;
        let _comma: Token!(,) = stream.parse()?;
        let value_type: ValueType = stream.parse()?;
        let default_value = if stream.peek(Token!(,)) {
            let _comma: Token!(,) = stream.parse()?;
            Some(stream.parse()?)
        } else {
            None
        };
        if !stream.is_empty() {
            return Err(stream.error("expected NAME, Type[, default]"));
        }
        Ok(Signature {
            value_name,
            value_type,
            default_value,
        })
    }
}

/// Identifies which map the accessors are generated for.
#[derive(Clone, Copy, PartialEq)]
enum Target {
    Settings,
    Results,
}

/// is_string_numeric is used to determine if a string value contains only numeric characters.
/// It is used to process a slice that omits the first character, i.e., in order to identify
/// types like u8, u32, etc.
fn is_string_numeric(str: &str) -> bool {
    !str.is_empty() && str.chars().all(|c| c.is_numeric())
}

/// Returns the name of the enum variant that carries values of the given type.
fn variant_name(type_str: &str) -> String {
    if type_str == "bool" {
        "Bool".to_string()
    } else if type_str.len() > 1 && is_string_numeric(&type_str[1..]) {
        type_str.to_uppercase()
    } else {
        type_str.to_string()
    }
}

fn accessors(target: Target, signature: Signature) -> TokenStream {
    let flag = signature.value_name;
    let return_t = signature.value_type;

    let flag_str = format!("{}", flag)[3..].to_lowercase();
    let getter_str = format!("get_{}", flag_str);
    let setter_str = format!("set_{}", flag_str);
    let variant = Ident::new(&variant_name(&return_t.to_string()), return_t.span());
    let getter = Ident::new(&getter_str, flag.span());
    let setter = Ident::new(&setter_str, flag.span());

    let (map_t, value_t, key) = match target {
        Target::Settings => (
            Ident::new("PolicySettings", Span::call_site()),
            Ident::new("PolicyProcessingTypes", Span::call_site()),
            quote! { #flag.to_string() },
        ),
        Target::Results => (
            Ident::new("PolicyResults", Span::call_site()),
            Ident::new("PolicyResultsTypes", Span::call_site()),
            quote! { #flag },
        ),
    };

    let getter_comment = format!(
        "`{}` is used to retrieve `{}` items from a [`{}`] instance",
        getter_str, flag, map_t
    );
    let setter_comment = format!(
        "`{}` is used to set `{}` items in a [`{}`] instance",
        setter_str, flag, map_t
    );

    let getter_fn = match signature.default_value {
        Some(default_value) => quote! {
            #[doc = #getter_comment]
            pub fn #getter(&self) -> #return_t {
                match self.0.get(#flag) {
                    Some(#value_t::#variant(v)) => v.clone(),
                    _ => #default_value,
                }
            }
        },
        None => quote! {
            #[doc = #getter_comment]
            pub fn #getter(&self) -> Option<#return_t> {
                match self.0.get(#flag) {
                    Some(#value_t::#variant(v)) => Some(v.clone()),
                    _ => None,
                }
            }
        },
    };

    quote! {
        impl #map_t {
            #getter_fn

            #[doc = #setter_comment]
            pub fn #setter(&mut self, v: #return_t) {
                self.0.insert(#key, #value_t::#variant(v));
            }
        }
    }
}

fn expand(target: Target, input: proc_macro::TokenStream, want_default: bool) -> proc_macro::TokenStream {
    let signature = match syn::parse::<Signature>(input) {
        Ok(s) => s,
        Err(e) => return e.to_compile_error().into(),
    };
    if signature.default_value.is_some() != want_default {
        let msg = if want_default {
            "a default value is required"
        } else {
            "unexpected default value, use the _with_default form"
        };
        return syn::Error::new(signature.value_name.span(), msg)
            .to_compile_error()
            .into();
    }
    accessors(target, signature).into()
}

/// Generates `get_x(&self) -> Option<T>` and `set_x(&mut self, T)` on `PolicySettings`.
#[proc_macro]
pub fn ps_gets_and_sets(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    expand(Target::Settings, input, false)
}

/// Generates `get_x(&self) -> T` (returning the default when absent) and `set_x(&mut self, T)` on
/// `PolicySettings`.
#[proc_macro]
pub fn ps_gets_and_sets_with_default(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    expand(Target::Settings, input, true)
}

/// Generates `get_x(&self) -> Option<T>` and `set_x(&mut self, T)` on `PolicyResults`.
#[proc_macro]
pub fn pr_gets_and_sets(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    expand(Target::Results, input, false)
}

/// Generates `get_x(&self) -> T` (returning the default when absent) and `set_x(&mut self, T)` on
/// `PolicyResults`.
#[proc_macro]
pub fn pr_gets_and_sets_with_default(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    expand(Target::Results, input, true)
}
