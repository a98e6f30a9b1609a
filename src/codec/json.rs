//! JSON documents: ungrouped variables as top-level strings, bundles as nested objects.

use super::{BoolTokens, Decoder, Encoder};
use crate::error::EnvError;
use crate::wrapper::Wrapper;
use serde_json::{Map, Value as Json};
use std::collections::HashSet;
use std::io::{Read, Write};

/// Options for reading and writing JSON
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonOptions {
    /// Keep declared names as-is instead of lowercasing them
    pub preserve_case: bool,
    /// Sort keys at every level instead of keeping declaration order
    pub sort_keys: bool,
    /// Indented output
    pub pretty: bool,
    pub bool_tokens: BoolTokens,
}

impl JsonOptions {
    pub fn with_preserve_case(mut self, preserve_case: bool) -> Self {
        self.preserve_case = preserve_case;
        self
    }

    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_bool_tokens(mut self, bool_tokens: BoolTokens) -> Self {
        self.bool_tokens = bool_tokens;
        self
    }
}

fn sorted(value: Json) -> Json {
    match value {
        Json::Object(map) => {
            let mut entries: Vec<(String, Json)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Json::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        other => other,
    }
}

/// Text of a scalar read from JSON; `null` is empty
fn scalar_text(value: &Json) -> String {
    match value {
        Json::Null => String::new(),
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Wrapper {
    /// Encode into a JSON object
    ///
    /// Fails when a bundle would share its key with an ungrouped variable.
    pub fn to_json_value(&self, options: &JsonOptions) -> Result<Json, EnvError> {
        let encoder = Encoder::new()
            .preserve_case(options.preserve_case)
            .bool_tokens(options.bool_tokens.clone())
            .on_variable(|map: &mut Map<String, Json>, var| {
                if var.variable.bundle().is_none() {
                    map.insert(var.name.clone(), Json::String(var.text.clone()));
                }
            })
            .on_bundle(|map, name, _| {
                map.entry(name.to_string())
                    .or_insert_with(|| Json::Object(Map::new()));
            })
            .on_bundled_variable(|map, bundle, var| {
                if let Some(Json::Object(members)) = map.get_mut(bundle) {
                    members.insert(var.name.clone(), Json::String(var.text.clone()));
                }
            });

        let ungrouped: HashSet<String> = self
            .variables()
            .filter(|var| var.bundle().is_none())
            .filter_map(|var| var.name())
            .map(|name| encoder.ensure_case(name))
            .collect();
        if let Some(bundle) = self
            .bundles()
            .find(|bundle| ungrouped.contains(&encoder.ensure_case(bundle.name())))
        {
            return Err(EnvError::Parse {
                line: None,
                message: format!(
                    "bundle '{}' and an ungrouped variable share the JSON key '{}'",
                    bundle.name(),
                    encoder.ensure_case(bundle.name())
                ),
            });
        }

        let map = encoder.encode(self, Map::new)?;
        let value = Json::Object(map);
        Ok(if options.sort_keys { sorted(value) } else { value })
    }

    pub fn write_to_json<W: Write>(&self, mut out: W, options: &JsonOptions) -> Result<(), EnvError> {
        let value = self.to_json_value(options)?;
        if options.pretty {
            serde_json::to_writer_pretty(&mut out, &value)?;
        } else {
            serde_json::to_writer(&mut out, &value)?;
        }
        Ok(())
    }

    /// Decode a JSON object: scalars become variables, nested objects become bundles
    pub fn read_from_json<R: Read>(reader: R, options: &JsonOptions) -> Result<Wrapper, EnvError> {
        let root: Json = serde_json::from_reader(reader)?;
        let Json::Object(root) = root else {
            return Err(EnvError::Parse {
                line: None,
                message: "top-level JSON value must be an object".to_string(),
            });
        };

        let mut variables = Vec::new();
        let mut bundles = Vec::new();
        for (name, value) in &root {
            match value {
                Json::Object(members) => {
                    for (member, value) in members {
                        bundles.push((name.clone(), member.clone(), scalar_text(value)));
                    }
                }
                scalar => variables.push((name.clone(), scalar_text(scalar))),
            }
        }

        Decoder::new(options.bool_tokens.clone()).decode(variables, bundles)
    }
}
