//! INI-style configuration files.
//!
//! Ungrouped variables live in the default section and every bundle gets a
//! section of its own. Sections do not inherit values from the default one.

use super::{BoolTokens, Decoder, Encoder};
use crate::error::EnvError;
use crate::wrapper::Wrapper;
use std::fmt;
use std::io::{Read, Write};

pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Options for reading and writing INI files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniOptions {
    /// Section holding ungrouped variables
    pub default_section: String,
    /// Keep declared names as-is instead of lowercasing them
    pub preserve_case: bool,
    pub bool_tokens: BoolTokens,
}

impl Default for IniOptions {
    fn default() -> Self {
        Self {
            default_section: DEFAULT_SECTION.to_string(),
            preserve_case: false,
            bool_tokens: BoolTokens::default(),
        }
    }
}

impl IniOptions {
    pub fn with_default_section(mut self, name: impl Into<String>) -> Self {
        self.default_section = name.into();
        self
    }

    pub fn with_preserve_case(mut self, preserve_case: bool) -> Self {
        self.preserve_case = preserve_case;
        self
    }

    pub fn with_bool_tokens(mut self, bool_tokens: BoolTokens) -> Self {
        self.bool_tokens = bool_tokens;
        self
    }
}

type Entries = Vec<(String, String)>;

/// Ordered in-memory INI document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniDocument {
    default_section: String,
    defaults: Entries,
    sections: Vec<(String, Entries)>,
}

impl IniDocument {
    pub fn new(default_section: impl Into<String>) -> Self {
        Self {
            default_section: default_section.into(),
            defaults: Vec::new(),
            sections: Vec::new(),
        }
    }

    pub fn default_section(&self) -> &str {
        &self.default_section
    }

    pub fn defaults(&self) -> &[(String, String)] {
        &self.defaults
    }

    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<String>) {
        super::upsert(&mut self.defaults, key.into(), value.into());
    }

    /// Add an empty section; an existing one is left untouched
    pub fn add_section(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.section(&name).is_none() {
            self.sections.push((name, Vec::new()));
        }
    }

    /// Set a key in `section`, creating the section if needed
    pub fn set(&mut self, section: &str, key: impl Into<String>, value: impl Into<String>) {
        if section == self.default_section {
            self.set_default(key, value);
            return;
        }
        self.add_section(section);
        if let Some((_, entries)) = self.sections.iter_mut().find(|(s, _)| s == section) {
            super::upsert(entries, key.into(), value.into());
        }
    }

    pub fn section(&self, name: &str) -> Option<&[(String, String)]> {
        self.sections
            .iter()
            .find(|(s, _)| s == name)
            .map(|(_, entries)| entries.as_slice())
    }

    /// Named sections in order of appearance, excluding the default one
    pub fn sections(&self) -> impl Iterator<Item = (&str, &[(String, String)])> {
        self.sections
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    /// Parse INI text
    ///
    /// Blank lines and lines starting with `#` or `;` are ignored. Entries use
    /// `key = value` or `key: value`, both sides trimmed.
    pub fn parse(text: &str, default_section: &str) -> Result<Self, EnvError> {
        let mut doc = Self::new(default_section);
        let mut current: Option<String> = None;

        for (index, line) in text.lines().enumerate() {
            let number = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let Some(name) = header.strip_suffix(']') else {
                    return Err(EnvError::Parse {
                        line: Some(number),
                        message: format!("unterminated section header '{}'", line),
                    });
                };
                let name = name.trim().to_string();
                if name != doc.default_section {
                    doc.add_section(name.clone());
                }
                current = Some(name);
                continue;
            }

            let Some(section) = current.as_deref() else {
                return Err(EnvError::Parse {
                    line: Some(number),
                    message: "entry before any section header".to_string(),
                });
            };

            let Some(split) = line.find(|c: char| c == '=' || c == ':') else {
                return Err(EnvError::Parse {
                    line: Some(number),
                    message: format!("expected 'key = value', found '{}'", line),
                });
            };
            let key = line[..split].trim();
            if key.is_empty() {
                return Err(EnvError::Parse {
                    line: Some(number),
                    message: "missing key".to_string(),
                });
            }
            let value = line[split + 1..].trim();
            doc.set(section, key, value);
        }

        Ok(doc)
    }
}

impl fmt::Display for IniDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let default = (!self.defaults.is_empty()).then_some((&self.default_section, &self.defaults));
        let named = self.sections.iter().map(|(name, entries)| (name, entries));

        for (name, entries) in default.into_iter().chain(named) {
            writeln!(f, "[{}]", name)?;
            for (key, value) in entries {
                writeln!(f, "{} = {}", key, value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Wrapper {
    /// Encode into an [`IniDocument`]
    pub fn to_ini(&self, options: &IniOptions) -> Result<IniDocument, EnvError> {
        let default_section = options.default_section.clone();
        Encoder::new()
            .preserve_case(options.preserve_case)
            .bool_tokens(options.bool_tokens.clone())
            .on_variable(|doc: &mut IniDocument, var| {
                if var.variable.bundle().is_none() {
                    doc.set_default(var.name.clone(), var.text.clone());
                }
            })
            .on_bundle(|doc, name, _| doc.add_section(name))
            .on_bundled_variable(|doc, bundle, var| {
                doc.set(bundle, var.name.clone(), var.text.clone())
            })
            .encode(self, move || IniDocument::new(default_section))
    }

    pub fn write_to_config<W: Write>(&self, mut out: W, options: &IniOptions) -> Result<(), EnvError> {
        let doc = self.to_ini(options)?;
        write!(out, "{}", doc)?;
        Ok(())
    }

    /// Decode an INI file: the default section holds variables, other sections become bundles
    pub fn read_from_config<R: Read>(mut reader: R, options: &IniOptions) -> Result<Wrapper, EnvError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let doc = IniDocument::parse(&text, &options.default_section)?;

        let variables = doc.defaults().to_vec();
        let bundles: Vec<(String, String, String)> = doc
            .sections()
            .flat_map(|(section, entries)| {
                entries
                    .iter()
                    .map(move |(k, v)| (section.to_string(), k.clone(), v.clone()))
            })
            .collect();

        Decoder::new(options.bool_tokens.clone()).decode(variables, bundles)
    }
}
