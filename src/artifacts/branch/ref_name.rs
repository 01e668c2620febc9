use crate::artifacts::branch::{
    DEFAULT_LOCAL_REF, DEFAULT_REMOTE_REF, INVALID_REF_NAME_REGEX, REF_ALIASES,
    REF_RESOLUTION_RULES,
};
use anyhow::Context;
use derive_new::new;

/// Target of a symbolic ref, e.g. `refs/heads/master` in `ref: refs/heads/master`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord, new)]
pub struct SymRefName(String);

impl SymRefName {
    pub fn as_ref_path(&self) -> &str {
        &self.0
    }
}

/// A validated ref name as given by a user: `master`, `origin/master`,
/// `refs/heads/master`, `HEAD` or the `@` alias
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefName(String);

impl RefName {
    pub fn try_parse(name: String) -> anyhow::Result<Self> {
        if name.is_empty() {
            anyhow::bail!("ref name cannot be empty");
        }

        let name = REF_ALIASES
            .get(name.as_str())
            .map(|alias| alias.to_string())
            .unwrap_or(name);

        let re = regex::Regex::new(INVALID_REF_NAME_REGEX)
            .with_context(|| format!("invalid ref name regex: {INVALID_REF_NAME_REGEX}"))?;

        if re.is_match(&name) {
            anyhow::bail!("invalid ref name: {}", name);
        }

        Ok(Self(name))
    }

    pub fn default_local() -> Self {
        Self(DEFAULT_LOCAL_REF.to_string())
    }

    pub fn default_remote() -> Self {
        Self(DEFAULT_REMOTE_REF.to_string())
    }

    /// Full ref paths to try when resolving this name, most specific first
    pub fn candidates(&self) -> Vec<String> {
        REF_RESOLUTION_RULES
            .iter()
            .map(|rule| rule.replace("%s", &self.0))
            .collect()
    }
}

impl std::str::FromStr for RefName {
    type Err = anyhow::Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::try_parse(name.to_string())
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
