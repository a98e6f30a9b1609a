/// A named group of variables, exposed as one nested mapping
///
/// Holds member names only. The mapping itself is computed by the owning
/// [`Wrapper`](crate::Wrapper) on every access, keyed by lowercased member name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    name: String,
    members: Vec<String>,
}

impl Bundle {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, member: impl Into<String>) {
        let member = member.into();
        if !self.members.contains(&member) {
            self.members.push(member);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member variable names in declaration order
    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn contains(&self, member: &str) -> bool {
        self.members.iter().any(|m| m == member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_keep_order_without_duplicates() {
        let mut bundle = Bundle::new("SETTINGS");
        bundle.insert("VAR2");
        bundle.insert("VAR1");
        bundle.insert("VAR2");

        assert_eq!(bundle.name(), "SETTINGS");
        assert_eq!(bundle.members().to_vec(), vec!["VAR2".to_string(), "VAR1".to_string()]);
        assert!(bundle.contains("VAR1"));
        assert!(!bundle.contains("VAR3"));
    }
}
