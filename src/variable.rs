use crate::cast::{Cast, Preprocessor, ValueFn};
use crate::error::EnvError;
use crate::source::EnvSource;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Whether `name` is a valid variable name: `[A-Z0-9_]+`
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// A declared environment variable
///
/// A `Variable` holds no value. Every read resolves the raw string from the
/// environment (or the default) and runs it through the cast pipeline:
/// preprocessor, cast, postprocessor, then the element-wise sub-cast.
///
/// # Example
/// ```rust
/// use envwrap::{Cast, Variable};
/// use std::collections::HashMap;
///
/// let mut port = Variable::new().with_convert(Cast::Int).with_default("8080");
/// port.set_name("PORT").unwrap();
///
/// let env: HashMap<String, String> = HashMap::new();
/// assert_eq!(port.value_from(&env).unwrap().as_int(), Some(8080));
/// ```
#[derive(Clone, Default)]
pub struct Variable {
    name: Option<String>,
    prefix: String,
    default: String,
    convert: Cast,
    sub_cast: Option<Cast>,
    preprocessor: Option<Preprocessor>,
    postprocessor: Option<ValueFn>,
    bundle: Option<String>,
    include_if: Option<String>,
    exclude_if: Option<String>,
    proxy: Option<String>,
}

impl Variable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_convert(mut self, convert: Cast) -> Self {
        self.convert = convert;
        self
    }

    /// Cast applied to each element when the cast result is a container
    pub fn with_sub_cast(mut self, sub_cast: Cast) -> Self {
        self.sub_cast = Some(sub_cast);
        self
    }

    /// Raw string used when the environment key is unset
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    /// Prepended to the name to form the environment key
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.bundle = Some(bundle.into()).filter(|b: &String| !b.is_empty());
        self
    }

    /// Visible only while the named boolean variable is true
    pub fn with_include_if(mut self, reference: impl Into<String>) -> Self {
        self.include_if = Some(reference.into());
        self
    }

    /// Hidden while the named boolean variable is true
    pub fn with_exclude_if(mut self, reference: impl Into<String>) -> Self {
        self.exclude_if = Some(reference.into());
        self
    }

    /// Read the raw value through another key instead of this variable's own
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into()).filter(|p: &String| !p.is_empty());
        self
    }

    pub fn with_preprocessor<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.preprocessor = Some(Arc::new(f));
        self
    }

    pub fn with_postprocessor<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.postprocessor = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Assign the name; a name can be set once and must match `[A-Z0-9_]+`
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), EnvError> {
        let name = name.into();
        if let Some(current) = &self.name {
            return Err(EnvError::NameAlreadySet {
                name: current.clone(),
                attempted: name,
            });
        }
        if !is_valid_name(&name) {
            return Err(EnvError::InvalidName { name });
        }
        self.name = Some(name);
        Ok(())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn default_value(&self) -> &str {
        &self.default
    }

    pub fn convert(&self) -> &Cast {
        &self.convert
    }

    pub fn sub_cast(&self) -> Option<&Cast> {
        self.sub_cast.as_ref()
    }

    pub fn bundle(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    pub fn include_if(&self) -> Option<&str> {
        self.include_if.as_deref()
    }

    pub fn exclude_if(&self) -> Option<&str> {
        self.exclude_if.as_deref()
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// Environment key this variable reads when it has no proxy
    pub fn os_name(&self) -> String {
        format!("{}{}", self.prefix, self.name.as_deref().unwrap_or_default())
    }

    /// Reject declarations that can never be satisfied
    pub fn validate(&self) -> Result<(), EnvError> {
        match (&self.include_if, &self.exclude_if) {
            (Some(include), Some(exclude)) if include == exclude => {
                Err(EnvError::ConflictingCondition {
                    name: self.name.clone().unwrap_or_default(),
                    reference: include.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Run the cast pipeline on a raw string
    pub fn process(&self, raw: &str) -> Result<Value, EnvError> {
        let invalid = |reason: String| EnvError::InvalidValue {
            key: self.os_name(),
            value: raw.to_string(),
            reason,
        };

        let input = match &self.preprocessor {
            Some(pre) => pre(raw),
            None => raw.to_string(),
        };
        let mut value = self.convert.apply(&input).map_err(invalid)?;
        if let Some(post) = &self.postprocessor {
            value = post(value).map_err(invalid)?;
        }
        if let Some(sub_cast) = &self.sub_cast {
            value = sub_cast.apply_each(value).map_err(invalid)?;
        }
        Ok(value)
    }

    /// Raw string read directly from `source`, without a wrapper's declarations
    ///
    /// A proxy is read as a plain environment key, as [`Wrapper`](crate::Wrapper) does.
    pub fn raw_value_from(&self, source: &dyn EnvSource) -> String {
        let key = match &self.proxy {
            Some(proxy) => proxy.clone(),
            None => self.os_name(),
        };
        source.var_or(&key, &self.default)
    }

    /// Resolve and cast directly from `source`
    pub fn value_from(&self, source: &dyn EnvSource) -> Result<Value, EnvError> {
        self.process(&self.raw_value_from(source))
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("default", &self.default)
            .field("convert", &self.convert)
            .field("sub_cast", &self.sub_cast)
            .field("preprocessor", &self.preprocessor.is_some())
            .field("postprocessor", &self.postprocessor.is_some())
            .field("bundle", &self.bundle)
            .field("include_if", &self.include_if)
            .field("exclude_if", &self.exclude_if)
            .field("proxy", &self.proxy)
            .finish()
    }
}
