use crate::wrapper::Wrapper;
use std::{fs, path::Path};

/// Description of one declared variable, for documentation generation
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableDoc {
    /// Declared name
    pub name: String,
    /// Environment key the value is read from, after prefix and proxy
    pub key: String,
    /// Cast applied to the raw string
    pub cast: String,
    /// Default raw string, empty when none
    pub default: String,
    pub bundle: Option<String>,
    /// Include/exclude condition in words
    pub condition: Option<String>,
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

impl Wrapper {
    /// Documentation entries in declaration order
    pub fn docs(&self) -> Vec<VariableDoc> {
        self.variables()
            .map(|var| {
                let cast = match var.sub_cast() {
                    Some(sub) => format!("{}[{}]", var.convert().name(), sub.name()),
                    None => var.convert().name().to_string(),
                };
                let condition = match (var.include_if(), var.exclude_if()) {
                    (Some(i), Some(e)) => Some(format!("if {}, unless {}", i, e)),
                    (Some(i), None) => Some(format!("if {}", i)),
                    (None, Some(e)) => Some(format!("unless {}", e)),
                    (None, None) => None,
                };
                VariableDoc {
                    name: var.name().unwrap_or_default().to_string(),
                    key: self.source_key(var),
                    cast,
                    default: var.default_value().to_string(),
                    bundle: var.bundle().map(str::to_string),
                    condition,
                }
            })
            .collect()
    }

    /// Markdown summary table of every declared variable
    pub fn docs_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("## Environment Variables Summary\n\n");
        md.push_str("| Variable | Key | Type | Default | Bundle | Condition |\n");
        md.push_str("|----------|-----|------|---------|--------|-----------|\n");
        for doc in self.docs() {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                doc.name,
                doc.key,
                doc.cast,
                or_dash(&doc.default),
                or_dash(doc.bundle.as_deref().unwrap_or_default()),
                or_dash(doc.condition.as_deref().unwrap_or_default()),
            ));
        }
        md
    }

    /// Write [`docs_markdown`](Self::docs_markdown) to a file
    ///
    /// # Example
    /// ```no_run
    /// use envwrap::{Variable, Wrapper};
    ///
    /// let wrapper = Wrapper::new([("PORT", Variable::new().with_default("8080"))]).unwrap();
    /// wrapper.write_docs("CONFIG.md").unwrap();
    /// ```
    pub fn write_docs(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        fs::write(path, self.docs_markdown())
    }
}

#[cfg(test)]
mod tests {
    use crate::cast::Cast;
    use crate::test_util::SharedEnv;
    use crate::variable::Variable;
    use crate::wrapper::Wrapper;

    fn sample() -> Wrapper {
        Wrapper::new([
            ("FLAG", Variable::new().with_convert(Cast::Bool)),
            (
                "PORT",
                Variable::new()
                    .with_prefix("APP_")
                    .with_convert(Cast::Int)
                    .with_default("8080")
                    .with_include_if("FLAG"),
            ),
            (
                "HOSTS",
                Variable::new()
                    .with_convert(Cast::Literal)
                    .with_sub_cast(Cast::Str)
                    .with_bundle("NET")
                    .with_proxy("SERVERS"),
            ),
        ])
        .unwrap()
        .with_source(SharedEnv::default())
    }

    #[test]
    fn test_docs_entries() {
        let docs = sample().docs();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[1].key, "APP_PORT");
        assert_eq!(docs[1].cast, "int");
        assert_eq!(docs[1].condition.as_deref(), Some("if FLAG"));
        assert_eq!(docs[2].key, "SERVERS");
        assert_eq!(docs[2].cast, "literal[str]");
        assert_eq!(docs[2].bundle.as_deref(), Some("NET"));
    }

    #[test]
    fn test_docs_markdown() {
        let md = sample().docs_markdown();
        assert!(md.starts_with("## Environment Variables Summary\n\n"));
        assert!(md.contains("| FLAG | FLAG | bool | - | - | - |\n"));
        assert!(md.contains("| PORT | APP_PORT | int | 8080 | - | if FLAG |\n"));
        assert!(md.contains("| HOSTS | SERVERS | literal[str] | - | NET | - |\n"));
    }

    #[test]
    fn test_write_docs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CONFIG.md");
        let wrapper = sample();
        wrapper.write_docs(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), wrapper.docs_markdown());
    }
}
