//! Placeholder substitution: `{version}`, `{os}`, `{arch}`, and
//! `{deps.<name>.version}` tokens in step params (spec.md §4.3 step 3).
//! A plain string scan rather than a templating crate, since the token set
//! is small and fixed — matches the teacher's own `{version}`/`{arch}`
//! substitution in `vx-installer::installer`'s URL building.

use std::collections::BTreeMap;

use anvil_core::Platform;

/// Context available when expanding one step's params.
pub struct SubstitutionContext<'a> {
    pub version: &'a str,
    pub platform: &'a Platform,
    /// Resolved versions of this recipe's declared dependencies, keyed by
    /// name, so a step can reference `{deps.node.version}`.
    pub dependency_versions: &'a BTreeMap<String, String>,
}

impl<'a> SubstitutionContext<'a> {
    fn resolve_token(&self, token: &str) -> Option<String> {
        match token {
            "version" => Some(self.version.to_string()),
            "os" => Some(self.platform.os.to_string()),
            "arch" => Some(self.platform.arch.to_string()),
            other => other
                .strip_prefix("deps.")
                .and_then(|rest| rest.strip_suffix(".version"))
                .and_then(|name| self.dependency_versions.get(name))
                .cloned(),
        }
    }

    /// Replace every `{token}` occurrence in `input`. Unknown tokens are
    /// left untouched verbatim — decomposition never silently drops text a
    /// recipe author wrote, it only expands tokens it recognizes.
    pub fn expand(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(start) = rest.find('{') {
            let Some(end) = rest[start..].find('}') else {
                out.push_str(rest);
                return out;
            };
            let end = start + end;
            out.push_str(&rest[..start]);
            let token = &rest[start + 1..end];
            match self.resolve_token(token) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push('{');
                    out.push_str(token);
                    out.push('}');
                }
            }
            rest = &rest[end + 1..];
        }
        out.push_str(rest);
        out
    }

    /// Expand every string-valued param in a params map; non-string values
    /// pass through unchanged.
    pub fn expand_params(&self, params: &BTreeMap<String, toml::Value>) -> BTreeMap<String, toml::Value> {
        params
            .iter()
            .map(|(key, value)| {
                let expanded = match value {
                    toml::Value::String(s) => toml::Value::String(self.expand(s)),
                    other => other.clone(),
                };
                (key.clone(), expanded)
            })
            .collect()
    }
}
