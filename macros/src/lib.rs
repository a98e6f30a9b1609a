use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashSet;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, Attribute, Ident, Meta, Token};

/// Helper enum for parsed attribute values
enum MetaValue {
    Str(syn::LitStr),
    Expr(syn::Expr),
}

/// Keys whose value must be a string literal
const STRING_KEYS: &[&str] = &[
    "default",
    "prefix",
    "bundle",
    "include_if",
    "exclude_if",
    "proxy",
];

/// Keys whose value is an arbitrary expression
const EXPR_KEYS: &[&str] = &["convert", "sub_cast", "preprocessor", "postprocessor"];

/// Build an `envwrap::Wrapper` from `#[var(...)] NAME` entries
///
/// Expands to `Wrapper::new(...)`, so the result is a
/// `Result<Wrapper, EnvError>`. Names are checked at compile time.
///
/// ```ignore
/// let wrapper: Result<Wrapper, EnvError> = define_wrapper! {
///     #[var(convert = bool)]
///     FLAG,
///     #[var(default = "foo", include_if = "FLAG")]
///     VAR,
/// };
/// ```
#[proc_macro]
pub fn define_wrapper(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as WrapperInput);

    match generate_wrapper(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct WrapperInput {
    entries: Punctuated<Entry, Token![,]>,
}

struct Entry {
    attrs: Vec<Attribute>,
    name: Ident,
}

impl Parse for WrapperInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        Ok(Self {
            entries: Punctuated::parse_terminated(input)?,
        })
    }
}

impl Parse for Entry {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        Ok(Self {
            attrs: input.call(Attribute::parse_outer)?,
            name: input.parse()?,
        })
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn generate_wrapper(input: &WrapperInput) -> syn::Result<proc_macro2::TokenStream> {
    let mut seen = HashSet::new();
    let mut declarations = Vec::new();

    for entry in &input.entries {
        let name = entry.name.to_string();
        if !is_valid_name(&name) {
            return Err(syn::Error::new_spanned(
                &entry.name,
                format!("variable name `{}` must match [A-Z0-9_]+", name),
            ));
        }
        if !seen.insert(name.clone()) {
            return Err(syn::Error::new_spanned(
                &entry.name,
                format!("variable `{}` is declared more than once", name),
            ));
        }

        let values = parse_var_config(&entry.attrs)?;
        check_conditions(entry, &values)?;

        let builder_calls = values.iter().map(|(key, value)| builder_call(key, value));
        declarations.push(quote! {
            (#name, ::envwrap::Variable::new() #(#builder_calls)*)
        });
    }

    Ok(quote! {
        ::envwrap::Wrapper::new(
            ::std::vec::Vec::<(&'static str, ::envwrap::Variable)>::from([#(#declarations),*])
        )
    })
}

/// `include_if` and `exclude_if` naming the same variable can never be satisfied
fn check_conditions(entry: &Entry, values: &[(String, MetaValue)]) -> syn::Result<()> {
    let literal = |key: &str| {
        values.iter().find_map(|(k, v)| match v {
            MetaValue::Str(lit) if k == key => Some(lit.value()),
            _ => None,
        })
    };
    if let (Some(include), Some(exclude)) = (literal("include_if"), literal("exclude_if")) {
        if include == exclude {
            return Err(syn::Error::new_spanned(
                &entry.name,
                format!(
                    "`{}` cannot be both included and excluded by `{}`",
                    entry.name, include
                ),
            ));
        }
    }
    Ok(())
}

fn builder_call(key: &str, value: &MetaValue) -> proc_macro2::TokenStream {
    let method = Ident::new(&format!("with_{}", key), proc_macro2::Span::call_site());
    match value {
        MetaValue::Str(lit) => quote! { .#method(#lit) },
        MetaValue::Expr(expr) if key == "convert" || key == "sub_cast" => {
            let cast = cast_expr(expr);
            quote! { .#method(#cast) }
        }
        MetaValue::Expr(expr) => quote! { .#method(#expr) },
    }
}

/// Short cast names map to `Cast` variants; any other expression is used as-is
fn cast_expr(expr: &syn::Expr) -> proc_macro2::TokenStream {
    let ident = match expr {
        syn::Expr::Path(path) if path.qself.is_none() => path.path.get_ident(),
        _ => None,
    };
    let variant = ident.and_then(|ident| match ident.to_string().as_str() {
        "str" => Some(quote! { Str }),
        "bool" => Some(quote! { Bool }),
        "int" => Some(quote! { Int }),
        "float" => Some(quote! { Float }),
        "literal" => Some(quote! { Literal }),
        "json" => Some(quote! { Json }),
        "bytes" => Some(quote! { Bytes }),
        _ => None,
    });
    match variant {
        Some(variant) => quote! { ::envwrap::Cast::#variant },
        None => quote! { #expr },
    }
}

/// Parse #[var(key = value, ...)] syntax, keeping the written order
fn parse_var_list(meta_list: &syn::MetaList) -> syn::Result<Vec<(String, MetaValue)>> {
    let mut values: Vec<(String, MetaValue)> = Vec::new();

    meta_list.parse_nested_meta(|meta| {
        let key = meta
            .path
            .get_ident()
            .ok_or_else(|| meta.error("expected identifier"))?
            .to_string();

        if values.iter().any(|(k, _)| *k == key) {
            return Err(meta.error(format!("`{}` is given more than once", key)));
        }

        if STRING_KEYS.contains(&key.as_str()) {
            let value: syn::LitStr = meta.value()?.parse()?;
            values.push((key, MetaValue::Str(value)));
        } else if EXPR_KEYS.contains(&key.as_str()) {
            let expr: syn::Expr = meta.value()?.parse()?;
            values.push((key, MetaValue::Expr(expr)));
        } else {
            return Err(meta.error(format!(
                "unknown key `{}`; expected one of: {}, {}",
                key,
                STRING_KEYS.join(", "),
                EXPR_KEYS.join(", ")
            )));
        }

        Ok(())
    })?;

    Ok(values)
}

fn parse_var_config(attrs: &[Attribute]) -> syn::Result<Vec<(String, MetaValue)>> {
    let mut values = Vec::new();

    for attr in attrs {
        if !attr.path().is_ident("var") {
            return Err(syn::Error::new_spanned(
                attr,
                "only #[var(...)] attributes are supported",
            ));
        }
        let parsed = match &attr.meta {
            Meta::List(list) => parse_var_list(list)?,
            _ => {
                return Err(syn::Error::new_spanned(
                    attr,
                    "var attribute must be a list: #[var(default = \"...\", ...)]",
                ));
            }
        };
        for (key, value) in parsed {
            if values.iter().any(|(k, _): &(String, MetaValue)| *k == key) {
                return Err(syn::Error::new_spanned(
                    attr,
                    format!("`{}` is given more than once", key),
                ));
            }
            values.push((key, value));
        }
    }

    Ok(values)
}
