use crate::bundle::Bundle;
use crate::error::EnvError;
use crate::source::{EnvSource, ProcessEnv};
use crate::value::Value;
use crate::variable::Variable;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// How a failed lookup is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStyle {
    /// Every miss becomes [`EnvError::Key`]
    Index,
    /// Every miss becomes [`EnvError::NoAttribute`]
    Attribute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hidden {
    Excluded,
    NotIncluded,
}

/// An immutable set of declared variables and the bundles they form
///
/// Values are never stored: every lookup re-reads the environment and
/// re-evaluates include/exclude conditions.
///
/// # Example
/// ```rust
/// use envwrap::{Cast, Value, Variable, Wrapper};
/// use std::collections::HashMap;
///
/// let env: HashMap<String, String> = [
///     ("FLAG".to_string(), "on".to_string()),
///     ("VAR".to_string(), "hello".to_string()),
/// ]
/// .into_iter()
/// .collect();
///
/// let wrapper = Wrapper::new([
///     ("FLAG", Variable::new().with_convert(Cast::Bool)),
///     ("VAR", Variable::new().with_include_if("FLAG")),
/// ])
/// .unwrap()
/// .with_source(env);
///
/// assert_eq!(wrapper.resolve("VAR").unwrap(), Value::from("hello"));
/// ```
#[derive(Clone)]
pub struct Wrapper {
    vars: Vec<Variable>,
    index: HashMap<String, usize>,
    bundles: Vec<Bundle>,
    source: Arc<dyn EnvSource>,
}

impl Wrapper {
    /// Build a wrapper from `(name, declaration)` pairs, reading the process environment
    ///
    /// Fails on malformed or duplicate names, on conflicting include/exclude
    /// references, and on condition loops between declared variables.
    pub fn new<I, N>(declarations: I) -> Result<Self, EnvError>
    where
        I: IntoIterator<Item = (N, Variable)>,
        N: Into<String>,
    {
        let mut wrapper = Self::default();

        for (name, mut var) in declarations {
            let name = name.into();
            var.set_name(name.clone())?;
            var.validate()?;
            if wrapper.index.contains_key(&name) {
                return Err(EnvError::Duplicate { name });
            }
            if let Some(bundle) = var.bundle() {
                let bundle = bundle.to_string();
                wrapper.update_bundle(bundle, &name);
            }
            wrapper.index.insert(name, wrapper.vars.len());
            wrapper.vars.push(var);
        }

        wrapper.check_condition_cycles()?;

        tracing::debug!(
            variables = wrapper.vars.len(),
            bundles = wrapper.bundles.len(),
            "wrapper constructed"
        );
        Ok(wrapper)
    }

    /// Read values from `source` instead of the process environment
    pub fn with_source<S: EnvSource + 'static>(mut self, source: S) -> Self {
        self.source = Arc::new(source);
        self
    }

    pub fn source(&self) -> &dyn EnvSource {
        self.source.as_ref()
    }

    fn update_bundle(&mut self, bundle: String, member: &str) {
        match self.bundles.iter_mut().find(|b| b.name() == bundle) {
            Some(existing) => existing.insert(member),
            None => {
                let mut created = Bundle::new(bundle);
                created.insert(member);
                self.bundles.push(created);
            }
        }
    }

    fn check_condition_cycles(&self) -> Result<(), EnvError> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            wrapper: &'a Wrapper,
            name: &'a str,
            marks: &mut HashMap<&'a str, Mark>,
        ) -> Result<(), EnvError> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    return Err(EnvError::ConditionCycle {
                        name: name.to_string(),
                    })
                }
                None => {}
            }
            marks.insert(name, Mark::Visiting);
            for next in wrapper.dependencies(name) {
                visit(wrapper, next, marks)?;
            }
            marks.insert(name, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        for var in &self.vars {
            if let Some(name) = var.name() {
                visit(self, name, &mut marks)?;
            }
        }
        Ok(())
    }

    /// Names whose value is needed to decide the visibility of `name`
    fn dependencies(&self, name: &str) -> Vec<&str> {
        if let Some(var) = self.variable(name) {
            [var.include_if(), var.exclude_if()]
                .into_iter()
                .flatten()
                .filter(|r| self.variable(r).is_some() || self.bundle(r).is_some())
                .collect()
        } else if let Some(bundle) = self.bundle(name) {
            bundle.members().iter().map(String::as_str).collect()
        } else {
            Vec::new()
        }
    }

    /// Declared variables in declaration order
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.vars.iter()
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.index.get(name).map(|&i| &self.vars[i])
    }

    /// Bundles in order of first declaration
    pub fn bundles(&self) -> impl Iterator<Item = &Bundle> {
        self.bundles.iter()
    }

    pub fn bundle(&self, name: &str) -> Option<&Bundle> {
        self.bundles.iter().find(|b| b.name() == name)
    }

    /// Environment key a variable's raw value is read from
    ///
    /// A proxy names the key itself. A declared variable of the same name
    /// does not contribute its prefix or its own proxy.
    pub fn source_key(&self, var: &Variable) -> String {
        match var.proxy() {
            Some(proxy) => proxy.to_string(),
            None => var.os_name(),
        }
    }

    /// Raw string of a variable: its source key, or its own default when unset
    pub fn raw_value_of(&self, var: &Variable) -> String {
        self.source
            .var_or(&self.source_key(var), var.default_value())
    }

    /// Raw string of a declared variable, ignoring visibility
    pub fn raw_value(&self, name: &str) -> Option<String> {
        self.variable(name).map(|var| self.raw_value_of(var))
    }

    /// Cast value of a variable, ignoring visibility
    pub fn value_of(&self, var: &Variable) -> Result<Value, EnvError> {
        var.process(&self.raw_value_of(var))
    }

    /// Resolved mapping of a bundle's visible members, keyed by lowercased name
    pub fn bundle_value(&self, bundle: &Bundle) -> Result<Value, EnvError> {
        let mut map = IndexMap::new();
        for member in bundle.members() {
            let Some(var) = self.variable(member) else {
                continue;
            };
            if self.hidden(var)?.is_some() {
                continue;
            }
            map.insert(member.to_lowercase(), self.value_of(var)?);
        }
        Ok(Value::Map(map))
    }

    fn condition(&self, reference: &str) -> Result<bool, EnvError> {
        match self.lookup(reference, Some(LookupStyle::Index)) {
            Ok(value) => Ok(value.is_truthy()),
            Err(err) if err.is_configuration() || err.is_not_found() => {
                Err(EnvError::UndeclaredReference {
                    name: reference.to_string(),
                })
            }
            Err(err) => Err(err),
        }
    }

    fn hidden(&self, var: &Variable) -> Result<Option<Hidden>, EnvError> {
        if let Some(reference) = var.exclude_if() {
            if self.condition(reference)? {
                return Ok(Some(Hidden::Excluded));
            }
        }
        if let Some(reference) = var.include_if() {
            if !self.condition(reference)? {
                return Ok(Some(Hidden::NotIncluded));
            }
        }
        Ok(None)
    }

    fn lookup(&self, name: &str, style: Option<LookupStyle>) -> Result<Value, EnvError> {
        let miss = |default: EnvError| match style {
            Some(LookupStyle::Index) => EnvError::Key {
                name: name.to_string(),
            },
            Some(LookupStyle::Attribute) => EnvError::NoAttribute {
                name: name.to_string(),
            },
            None => default,
        };

        if let Some(var) = self.variable(name) {
            match self.hidden(var)? {
                Some(Hidden::Excluded) => Err(miss(EnvError::Excluded {
                    name: name.to_string(),
                })),
                Some(Hidden::NotIncluded) => Err(miss(EnvError::NotIncluded {
                    name: name.to_string(),
                })),
                None => self.value_of(var),
            }
        } else if let Some(bundle) = self.bundle(name) {
            self.bundle_value(bundle)
        } else if looks_like_env_name(name) {
            Err(miss(EnvError::NotDeclared {
                name: name.to_string(),
            }))
        } else {
            Err(miss(EnvError::NoAttribute {
                name: name.to_string(),
            }))
        }
    }

    /// Look up a variable or bundle, reporting exactly why it is unavailable
    ///
    /// Errors: [`EnvError::Excluded`], [`EnvError::NotIncluded`],
    /// [`EnvError::NotDeclared`] for undeclared uppercase names and
    /// [`EnvError::NoAttribute`] for anything else.
    pub fn resolve(&self, name: &str) -> Result<Value, EnvError> {
        self.lookup(name, None)
    }

    /// Index-style lookup: every miss is an [`EnvError::Key`]
    pub fn get_item(&self, name: &str) -> Result<Value, EnvError> {
        self.lookup(name, Some(LookupStyle::Index))
    }

    /// Attribute-style lookup: every miss is an [`EnvError::NoAttribute`]
    pub fn attr(&self, name: &str) -> Result<Value, EnvError> {
        self.lookup(name, Some(LookupStyle::Attribute))
    }

    /// Value if available, `None` on any lookup or visibility failure
    ///
    /// Cast failures still propagate.
    pub fn get(&self, name: &str) -> Result<Option<Value>, EnvError> {
        match self.get_item(name) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_configuration() || err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Like [`get`](Self::get) with a fallback value
    pub fn get_or(&self, name: &str, default: impl Into<Value>) -> Result<Value, EnvError> {
        Ok(self.get(name)?.unwrap_or_else(|| default.into()))
    }

    /// Whether `name` is currently available; never fails
    pub fn contains(&self, name: &str) -> bool {
        self.get_item(name).is_ok()
    }

    /// Currently visible variable and bundle names
    pub fn keys(&self) -> Vec<String> {
        let vars = self.vars.iter().filter_map(|v| v.name());
        let bundles = self
            .bundles
            .iter()
            .map(Bundle::name)
            .filter(|b| !self.index.contains_key(*b));
        vars.chain(bundles)
            .filter(|name| self.contains(name))
            .map(str::to_string)
            .collect()
    }

    /// `(name, value)` for every currently visible variable and bundle
    pub fn items(&self) -> Result<Vec<(String, Value)>, EnvError> {
        self.keys()
            .into_iter()
            .map(|name| {
                let value = self.get_item(&name)?;
                Ok((name, value))
            })
            .collect()
    }

    /// Number of currently visible names
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve every visible variable, collecting all failures instead of stopping at the first
    pub fn check(&self) -> Result<(), Vec<EnvError>> {
        let mut errors = Vec::new();
        for var in &self.vars {
            let result = self.hidden(var).and_then(|hidden| match hidden {
                Some(_) => Ok(()),
                None => self.value_of(var).map(|_| ()),
            });
            if let Err(err) = result {
                errors.push(err);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            tracing::warn!(errors = errors.len(), "environment check failed");
            Err(errors)
        }
    }
}

impl Default for Wrapper {
    fn default() -> Self {
        Self {
            vars: Vec::new(),
            index: HashMap::new(),
            bundles: Vec::new(),
            source: Arc::new(ProcessEnv),
        }
    }
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("vars", &self.vars)
            .field("bundles", &self.bundles)
            .finish_non_exhaustive()
    }
}

/// Uppercase-looking names are treated as environment variables, others as attributes
fn looks_like_env_name(name: &str) -> bool {
    name.chars().any(char::is_uppercase) && !name.chars().any(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::Cast;
    use crate::test_util::SharedEnv;

    fn flag_wrapper(env: &SharedEnv, var: Variable) -> Wrapper {
        Wrapper::new([
            ("FLAG", Variable::new().with_convert(Cast::Bool)),
            ("VAR1", var),
        ])
        .unwrap()
        .with_source(env.clone())
    }

    #[test]
    fn test_empty_wrapper() {
        let wrapper = Wrapper::default();
        assert!(wrapper.keys().is_empty());
        assert!(wrapper.is_empty());
    }

    #[test]
    fn test_keys_and_len() {
        let env = SharedEnv::default();
        let wrapper = Wrapper::new([("VAR1", Variable::new()), ("VAR2", Variable::new())])
            .unwrap()
            .with_source(env);
        assert_eq!(wrapper.keys(), vec!["VAR1".to_string(), "VAR2".to_string()]);
        assert_eq!(wrapper.len(), 2);
    }

    #[test]
    fn test_values_are_reread_on_every_access() {
        let env = SharedEnv::new(&[("ENV", "production")]);
        let wrapper = Wrapper::new([("ENV", Variable::new().with_default("testing"))])
            .unwrap()
            .with_source(env.clone());

        assert_eq!(wrapper.attr("ENV").unwrap(), Value::from("production"));
        env.clear();
        assert_eq!(wrapper.attr("ENV").unwrap(), Value::from("testing"));
        env.set("ENV", "integration");
        assert_eq!(wrapper.attr("ENV").unwrap(), Value::from("integration"));
    }

    #[test]
    fn test_get_falls_back() {
        let wrapper = Wrapper::default().with_source(SharedEnv::default());
        assert_eq!(wrapper.get("YADA").unwrap(), None);
        assert_eq!(
            wrapper.get_or("YADA", "some_value").unwrap(),
            Value::from("some_value")
        );
    }

    #[test]
    fn test_get_propagates_cast_failures() {
        let env = SharedEnv::new(&[("PORT", "eighty")]);
        let wrapper = Wrapper::new([("PORT", Variable::new().with_convert(Cast::Int))])
            .unwrap()
            .with_source(env);
        assert!(matches!(
            wrapper.get("PORT"),
            Err(EnvError::InvalidValue { .. })
        ));
        assert!(!wrapper.contains("PORT"));
    }

    #[test]
    fn test_bool_flag_follows_environment() {
        let env = SharedEnv::new(&[("FLAG", "on")]);
        let wrapper = Wrapper::new([("FLAG", Variable::new().with_convert(Cast::Bool))])
            .unwrap()
            .with_source(env.clone());
        assert_eq!(wrapper.attr("FLAG").unwrap(), Value::Bool(true));

        env.set("FLAG", "0");
        assert_eq!(wrapper.attr("FLAG").unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_prefixed_variable_keeps_declared_name() {
        let env = SharedEnv::new(&[("APP_VAR", "foo")]);
        let wrapper = Wrapper::new([("VAR", Variable::new().with_prefix("APP_"))])
            .unwrap()
            .with_source(env);
        assert!(wrapper.keys().contains(&"VAR".to_string()));
        assert!(!wrapper.contains("APP_VAR"));
        assert_eq!(wrapper.get_item("VAR").unwrap(), Value::from("foo"));
    }

    #[test]
    fn test_inclusion() {
        let env = SharedEnv::new(&[("VAR1", "some_value"), ("FLAG", "on")]);
        let wrapper = flag_wrapper(&env, Variable::new().with_include_if("FLAG"));
        assert!(wrapper.keys().contains(&"VAR1".to_string()));
        assert_eq!(wrapper.resolve("VAR1").unwrap(), Value::from("some_value"));

        env.set("FLAG", "off");
        assert!(!wrapper.keys().contains(&"VAR1".to_string()));
        assert!(matches!(
            wrapper.resolve("VAR1"),
            Err(EnvError::NotIncluded { ref name }) if name == "VAR1"
        ));
    }

    #[test]
    fn test_exclusion() {
        let env = SharedEnv::new(&[("VAR1", "some_value"), ("FLAG", "off")]);
        let wrapper = flag_wrapper(&env, Variable::new().with_exclude_if("FLAG"));
        assert!(wrapper.contains("VAR1"));

        env.set("FLAG", "on");
        assert!(!wrapper.contains("VAR1"));
        assert!(matches!(
            wrapper.resolve("VAR1"),
            Err(EnvError::Excluded { ref name }) if name == "VAR1"
        ));
    }

    #[test]
    fn test_include_and_exclude_together() {
        let env = SharedEnv::new(&[("INC", "yes"), ("EXC", "no"), ("VAR", "foo")]);
        let wrapper = Wrapper::new([
            ("INC", Variable::new().with_convert(Cast::Bool)),
            ("EXC", Variable::new().with_convert(Cast::Bool)),
            (
                "VAR",
                Variable::new().with_include_if("INC").with_exclude_if("EXC"),
            ),
        ])
        .unwrap()
        .with_source(env.clone());
        assert!(wrapper.contains("VAR"));

        env.set("EXC", "yes");
        assert!(!wrapper.contains("VAR"));

        env.set("EXC", "no");
        env.set("INC", "no");
        assert!(!wrapper.contains("VAR"));
    }

    #[test]
    fn test_conflicting_conditions_fail_construction() {
        let result = Wrapper::new([(
            "VAR",
            Variable::new().with_include_if("REF1").with_exclude_if("REF1"),
        )]);
        assert!(matches!(
            result,
            Err(EnvError::ConflictingCondition { ref name, ref reference })
                if name == "VAR" && reference == "REF1"
        ));
    }

    #[test]
    fn test_undeclared_reference() {
        let wrapper = Wrapper::new([(
            "VAR1",
            Variable::new().with_include_if("VAR2").with_default("set"),
        )])
        .unwrap()
        .with_source(SharedEnv::default());

        // Not masked by the lookup style
        for result in [
            wrapper.resolve("VAR1"),
            wrapper.get_item("VAR1"),
            wrapper.attr("VAR1"),
        ] {
            assert!(matches!(
                result,
                Err(EnvError::UndeclaredReference { ref name }) if name == "VAR2"
            ));
        }
        assert_eq!(wrapper.get("VAR1").unwrap(), None);
        assert!(!wrapper.contains("VAR1"));
    }

    #[test]
    fn test_error_taxonomy_by_lookup_style() {
        let env = SharedEnv::new(&[("FLAG", "on")]);
        let wrapper = flag_wrapper(&env, Variable::new().with_exclude_if("FLAG"));

        assert!(matches!(
            wrapper.resolve("YADA"),
            Err(EnvError::NotDeclared { .. })
        ));
        assert!(matches!(
            wrapper.resolve("yada"),
            Err(EnvError::NoAttribute { .. })
        ));
        assert!(matches!(
            wrapper.resolve("VAR1"),
            Err(EnvError::Excluded { .. })
        ));

        assert!(matches!(wrapper.get_item("yada"), Err(EnvError::Key { .. })));
        assert!(matches!(wrapper.get_item("YADA"), Err(EnvError::Key { .. })));
        assert!(matches!(wrapper.get_item("VAR1"), Err(EnvError::Key { .. })));

        assert!(matches!(
            wrapper.attr("YADA"),
            Err(EnvError::NoAttribute { .. })
        ));
        assert!(matches!(
            wrapper.attr("VAR1"),
            Err(EnvError::NoAttribute { .. })
        ));
    }

    #[test]
    fn test_bundle_mapping() {
        let env = SharedEnv::new(&[("VAR1", "foo"), ("VAR2", "bar")]);
        let wrapper = Wrapper::new([
            (
                "VAR1",
                Variable::new()
                    .with_bundle("VARS")
                    .with_preprocessor(|raw| raw.to_uppercase()),
            ),
            (
                "VAR2",
                Variable::new()
                    .with_bundle("VARS")
                    .with_preprocessor(|raw| raw.to_uppercase()),
            ),
        ])
        .unwrap()
        .with_source(env);

        let keys = wrapper.keys();
        assert_eq!(keys, vec!["VAR1", "VAR2", "VARS"]);

        let mut expected = IndexMap::new();
        expected.insert("var1".to_string(), Value::from("FOO"));
        expected.insert("var2".to_string(), Value::from("BAR"));
        assert_eq!(wrapper.attr("VARS").unwrap(), Value::Map(expected));
    }

    #[test]
    fn test_bundle_members_follow_conditions() {
        let env = SharedEnv::new(&[("FLAG", "on")]);
        let wrapper = Wrapper::new([
            (
                "FLAG",
                Variable::new().with_convert(Cast::Bool).with_bundle("SETTINGS"),
            ),
            (
                "VAR_1",
                Variable::new()
                    .with_include_if("FLAG")
                    .with_bundle("SETTINGS")
                    .with_default("foo"),
            ),
            (
                "VAR_2",
                Variable::new()
                    .with_exclude_if("FLAG")
                    .with_bundle("SETTINGS")
                    .with_default("bar"),
            ),
        ])
        .unwrap()
        .with_source(env.clone());

        let settings = wrapper.get("SETTINGS").unwrap().unwrap();
        let map = settings.as_map().unwrap();
        assert!(map.contains_key("flag"));
        assert!(map.contains_key("var_1"));
        assert!(!map.contains_key("var_2"));
        assert!(wrapper.contains("VAR_1"));
        assert!(!wrapper.contains("VAR_2"));

        env.set("FLAG", "off");
        let settings = wrapper.get("SETTINGS").unwrap().unwrap();
        let map = settings.as_map().unwrap();
        assert!(map.contains_key("flag"));
        assert!(!map.contains_key("var_1"));
        assert!(map.contains_key("var_2"));
        assert!(wrapper.contains("SETTINGS"));
    }

    #[test]
    fn test_items() {
        let env = SharedEnv::new(&[("VAR1", "foo"), ("VAR2", "bar")]);
        let wrapper = Wrapper::new([("VAR1", Variable::new()), ("VAR2", Variable::new())])
            .unwrap()
            .with_source(env);
        let items = wrapper.items().unwrap();
        assert_eq!(
            items,
            vec![
                ("VAR1".to_string(), Value::from("foo")),
                ("VAR2".to_string(), Value::from("bar")),
            ]
        );
    }

    #[test]
    fn test_proxy_reads_alternate_key() {
        let env = SharedEnv::new(&[("PROXY", "yada")]);
        let wrapper = Wrapper::new([("PROXIED", Variable::new().with_proxy("PROXY"))])
            .unwrap()
            .with_source(env.clone());
        assert_eq!(wrapper.attr("PROXIED").unwrap(), Value::from("yada"));

        env.clear();
        assert_eq!(wrapper.attr("PROXIED").unwrap(), Value::from(""));
    }

    #[test]
    fn test_proxy_falls_back_to_own_default() {
        let env = SharedEnv::new(&[("VAR1", "yada"), ("OS_VAR1", "spam")]);
        let wrapper = Wrapper::new([(
            "VAR1",
            Variable::new().with_default("foo").with_proxy("OS_VAR1"),
        )])
        .unwrap()
        .with_source(env.clone());
        assert_eq!(wrapper.attr("VAR1").unwrap(), Value::from("spam"));

        env.remove("OS_VAR1");
        assert_eq!(wrapper.attr("VAR1").unwrap(), Value::from("foo"));
    }

    #[test]
    fn test_proxy_reads_named_key_not_declared_variable() {
        let env = SharedEnv::new(&[("REAL", "from-real"), ("APP_REAL", "from-app-real")]);
        let wrapper = Wrapper::new([
            ("REAL", Variable::new().with_prefix("APP_")),
            ("ALIAS", Variable::new().with_proxy("REAL").with_default("x")),
        ])
        .unwrap()
        .with_source(env.clone());

        let alias = wrapper.variable("ALIAS").unwrap();
        assert_eq!(wrapper.source_key(alias), "REAL");
        assert_eq!(wrapper.attr("ALIAS").unwrap(), Value::from("from-real"));
        assert_eq!(wrapper.attr("REAL").unwrap(), Value::from("from-app-real"));
        assert_eq!(
            wrapper.collect().unwrap(),
            vec![
                ("APP_REAL".to_string(), "from-app-real".to_string()),
                ("REAL".to_string(), "from-real".to_string()),
            ]
        );

        env.remove("REAL");
        assert_eq!(wrapper.attr("ALIAS").unwrap(), Value::from("x"));
    }

    #[test]
    fn test_mutual_proxies_read_each_other() {
        let env = SharedEnv::new(&[("A", "from-a"), ("B", "from-b")]);
        let wrapper = Wrapper::new([
            ("A", Variable::new().with_proxy("B")),
            ("B", Variable::new().with_proxy("A").with_default("fallback")),
        ])
        .unwrap()
        .with_source(env.clone());

        assert_eq!(wrapper.attr("A").unwrap(), Value::from("from-b"));
        assert_eq!(wrapper.attr("B").unwrap(), Value::from("from-a"));

        env.remove("A");
        assert_eq!(wrapper.attr("B").unwrap(), Value::from("fallback"));
    }

    #[test]
    fn test_deeply_nested_literal_is_a_cast_error() {
        let depth = 5000;
        let raw = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
        let env = SharedEnv::new(&[("DATA", raw.as_str())]);
        let wrapper = Wrapper::new([("DATA", Variable::new().with_convert(Cast::Literal))])
            .unwrap()
            .with_source(env);

        assert!(matches!(
            wrapper.get("DATA"),
            Err(EnvError::InvalidValue { ref key, ref reason, .. })
                if key == "DATA" && reason.contains("nested too deeply")
        ));
        assert!(!wrapper.contains("DATA"));
    }

    #[test]
    fn test_condition_cycle_rejected() {
        let result = Wrapper::new([
            ("A", Variable::new().with_include_if("B")),
            ("B", Variable::new().with_exclude_if("A")),
        ]);
        assert!(matches!(result, Err(EnvError::ConditionCycle { .. })));
    }

    #[test]
    fn test_duplicate_and_invalid_names() {
        let result = Wrapper::new([("VAR", Variable::new()), ("VAR", Variable::new())]);
        assert!(matches!(result, Err(EnvError::Duplicate { ref name }) if name == "VAR"));

        let result = Wrapper::new([("var", Variable::new())]);
        assert!(matches!(result, Err(EnvError::InvalidName { .. })));
    }

    #[test]
    fn test_named_variable_cannot_be_redeclared() {
        let mut var = Variable::new();
        var.set_name("FOO").unwrap();
        let result = Wrapper::new([("BAR", var)]);
        assert!(matches!(result, Err(EnvError::NameAlreadySet { .. })));
    }

    #[test]
    fn test_raw_value_ignores_cast() {
        let env = SharedEnv::new(&[("FLAG", "yes")]);
        let wrapper = Wrapper::new([("FLAG", Variable::new().with_convert(Cast::Bool))])
            .unwrap()
            .with_source(env);
        assert_eq!(wrapper.raw_value("FLAG").as_deref(), Some("yes"));
        assert_eq!(wrapper.raw_value("NOPE"), None);
    }

    #[test]
    fn test_check_collects_every_failure() {
        let env = SharedEnv::new(&[("PORT", "eighty"), ("WORKERS", "many")]);
        let wrapper = Wrapper::new([
            ("PORT", Variable::new().with_convert(Cast::Int)),
            ("WORKERS", Variable::new().with_convert(Cast::Int)),
            ("HOST", Variable::new().with_default("localhost")),
            (
                "RATIO",
                Variable::new()
                    .with_convert(Cast::Float)
                    .with_include_if("ENABLED"),
            ),
            ("ENABLED", Variable::new().with_convert(Cast::Bool)),
        ])
        .unwrap()
        .with_source(env.clone());

        let errors = wrapper.check().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, EnvError::InvalidValue { .. })));

        env.set("PORT", "80");
        env.set("WORKERS", "4");
        assert!(wrapper.check().is_ok());

        env.set("ENABLED", "1");
        env.set("RATIO", "half");
        assert_eq!(wrapper.check().unwrap_err().len(), 1);
    }
}
