//! Conversion between a [`Wrapper`] and textual representations.
//!
//! The [`Encoder`] walks a wrapper's declarations and hands each variable's
//! textual form to caller-supplied callbacks; the [`Decoder`] goes the other
//! way, inferring a cast for every raw string it is given.

pub mod dotenv;
pub mod ini;
pub mod json;
pub mod source_file;

pub use ini::{IniDocument, IniOptions};
pub use json::JsonOptions;
pub use source_file::{LineParser, SourceFormat};

use crate::bundle::Bundle;
use crate::cast::{Cast, TRUE_STRINGS};
use crate::error::EnvError;
use crate::variable::Variable;
use crate::wrapper::Wrapper;

/// Textual forms of `false` and `true` used when writing and inferring booleans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolTokens {
    pub false_token: String,
    pub true_token: String,
}

impl BoolTokens {
    pub fn new(false_token: impl Into<String>, true_token: impl Into<String>) -> Self {
        Self {
            false_token: false_token.into(),
            true_token: true_token.into(),
        }
    }

    pub fn render(&self, value: bool) -> &str {
        if value {
            &self.true_token
        } else {
            &self.false_token
        }
    }

    /// Whether `raw` is exactly one of the two tokens
    pub fn matches(&self, raw: &str) -> bool {
        raw == self.false_token || raw == self.true_token
    }
}

impl Default for BoolTokens {
    fn default() -> Self {
        Self::new("false", "true")
    }
}

/// A variable as presented to encoder callbacks
#[derive(Debug)]
pub struct EncodedVariable<'a> {
    /// Declared name, lowercased unless the encoder preserves case
    pub name: String,
    pub variable: &'a Variable,
    /// Environment key the raw value is read from
    pub key: String,
    pub raw: String,
    /// Raw string, or the configured token for boolean variables
    pub text: String,
}

type OnVariable<T> = Box<dyn Fn(&mut T, &EncodedVariable<'_>)>;
type OnBundle<T> = Box<dyn Fn(&mut T, &str, &Bundle)>;
type OnBundledVariable<T> = Box<dyn Fn(&mut T, &str, &EncodedVariable<'_>)>;

/// Visits a wrapper and writes into a target of type `T`
///
/// # Example
/// ```rust
/// use envwrap::{Encoder, Variable, Wrapper};
/// use std::collections::HashMap;
///
/// let wrapper = Wrapper::new([("VAR", Variable::new().with_default("foo"))])
///     .unwrap()
///     .with_source(HashMap::<String, String>::new());
///
/// let encoder = Encoder::new().on_variable(|out: &mut Vec<String>, var| {
///     out.push(format!("{}={}", var.name, var.text));
/// });
/// assert_eq!(encoder.encode(&wrapper, Vec::new).unwrap(), vec!["var=foo"]);
/// ```
pub struct Encoder<T> {
    on_variable: Option<OnVariable<T>>,
    on_bundle: Option<OnBundle<T>>,
    on_bundled_variable: Option<OnBundledVariable<T>>,
    preserve_case: bool,
    bool_tokens: BoolTokens,
}

impl<T> Encoder<T> {
    pub fn new() -> Self {
        Self {
            on_variable: None,
            on_bundle: None,
            on_bundled_variable: None,
            preserve_case: false,
            bool_tokens: BoolTokens::default(),
        }
    }

    /// Called for every declared variable, bundled or not
    pub fn on_variable<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T, &EncodedVariable<'_>) + 'static,
    {
        self.on_variable = Some(Box::new(f));
        self
    }

    /// Called once per bundle, before its members
    pub fn on_bundle<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T, &str, &Bundle) + 'static,
    {
        self.on_bundle = Some(Box::new(f));
        self
    }

    /// Called for every member of a bundle with the bundle's encoded name
    pub fn on_bundled_variable<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T, &str, &EncodedVariable<'_>) + 'static,
    {
        self.on_bundled_variable = Some(Box::new(f));
        self
    }

    pub fn preserve_case(mut self, preserve_case: bool) -> Self {
        self.preserve_case = preserve_case;
        self
    }

    pub fn bool_tokens(mut self, bool_tokens: BoolTokens) -> Self {
        self.bool_tokens = bool_tokens;
        self
    }

    pub fn ensure_case(&self, name: &str) -> String {
        if self.preserve_case {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    /// Boolean variables render as a token, everything else as its raw string
    pub fn text_of(&self, wrapper: &Wrapper, var: &Variable) -> Result<String, EnvError> {
        if var.convert().is_bool() {
            let value = wrapper.value_of(var)?;
            Ok(self.bool_tokens.render(value.is_truthy()).to_string())
        } else {
            Ok(wrapper.raw_value_of(var))
        }
    }

    fn encode_variable<'a>(
        &self,
        wrapper: &Wrapper,
        var: &'a Variable,
    ) -> Result<EncodedVariable<'a>, EnvError> {
        Ok(EncodedVariable {
            name: self.ensure_case(var.name().unwrap_or_default()),
            variable: var,
            key: wrapper.source_key(var),
            raw: wrapper.raw_value_of(var),
            text: self.text_of(wrapper, var)?,
        })
    }

    /// Build a target with `factory` and run the callbacks over `wrapper`
    pub fn encode<F>(&self, wrapper: &Wrapper, factory: F) -> Result<T, EnvError>
    where
        F: FnOnce() -> T,
    {
        let mut target = factory();

        if let Some(on_variable) = &self.on_variable {
            for var in wrapper.variables() {
                let encoded = self.encode_variable(wrapper, var)?;
                on_variable(&mut target, &encoded);
            }
        }

        if let Some(on_bundle) = &self.on_bundle {
            for bundle in wrapper.bundles() {
                let bundle_name = self.ensure_case(bundle.name());
                on_bundle(&mut target, &bundle_name, bundle);

                if let Some(on_bundled_variable) = &self.on_bundled_variable {
                    for member in bundle.members() {
                        if let Some(var) = wrapper.variable(member) {
                            let encoded = self.encode_variable(wrapper, var)?;
                            on_bundled_variable(&mut target, &bundle_name, &encoded);
                        }
                    }
                }
            }
        }

        Ok(target)
    }
}

impl<T> Default for Encoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a wrapper from raw `(name, value)` pairs, inferring each cast
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    bool_tokens: BoolTokens,
}

impl Decoder {
    pub fn new(bool_tokens: BoolTokens) -> Self {
        Self { bool_tokens }
    }

    /// Boolean if `raw` is one of the tokens, else integer, else float, else string
    pub fn infer_cast(&self, raw: &str) -> Cast {
        if self.bool_tokens.matches(raw) {
            Cast::Bool
        } else if Cast::Int.apply(raw).is_ok() {
            Cast::Int
        } else if Cast::Float.apply(raw).is_ok() {
            Cast::Float
        } else {
            Cast::Str
        }
    }

    /// Declaration for one decoded value; the raw string becomes the default
    pub fn declaration(&self, raw: &str, bundle: Option<&str>) -> Variable {
        let cast = self.infer_cast(raw);
        let mut var = Variable::new().with_default(raw);

        let true_token = self.bool_tokens.true_token.clone();
        if cast.is_bool() && !TRUE_STRINGS.contains(&true_token.to_lowercase().as_str()) {
            var = var.with_preprocessor(move |s: &str| {
                if s == true_token {
                    "true".to_string()
                } else {
                    s.to_string()
                }
            });
        }

        let var = var.with_convert(cast);
        match bundle {
            Some(bundle) => var.with_bundle(bundle.to_uppercase()),
            None => var,
        }
    }

    /// Decode ungrouped `(name, value)` pairs and `(bundle, name, value)` triples
    ///
    /// Names are uppercased; a later value for the same name replaces the
    /// earlier one in place.
    pub fn decode<V, B>(&self, variables: V, bundles: B) -> Result<Wrapper, EnvError>
    where
        V: IntoIterator<Item = (String, String)>,
        B: IntoIterator<Item = (String, String, String)>,
    {
        let mut declarations: Vec<(String, Variable)> = Vec::new();

        let ungrouped = variables
            .into_iter()
            .map(|(name, raw)| (None, name, raw));
        let grouped = bundles
            .into_iter()
            .map(|(bundle, name, raw)| (Some(bundle), name, raw));

        for (bundle, name, raw) in ungrouped.chain(grouped) {
            let var = self.declaration(&raw, bundle.as_deref());
            upsert(&mut declarations, name.to_uppercase(), var);
        }

        tracing::debug!(variables = declarations.len(), "decoded declarations");
        Wrapper::new(declarations)
    }
}

/// Insert or replace `key`, keeping the position of the first insertion
pub(crate) fn upsert<V>(entries: &mut Vec<(String, V)>, key: String, value: V) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

impl Wrapper {
    /// Environment key -> raw string for every declared variable, in declaration order
    ///
    /// Proxied variables are exported under the key they are read from.
    pub fn collect(&self) -> Result<Vec<(String, String)>, EnvError> {
        Encoder::new()
            .preserve_case(true)
            .on_variable(|collected: &mut Vec<(String, String)>, var| {
                upsert(collected, var.key.clone(), var.raw.clone());
            })
            .encode(self, Vec::new)
    }
}
