//! Guard settings from `SQL_GUARD_*` environment variables.

use crate::error::PipelineError;
use crate::guard::GuardPolicy;

impl GuardPolicy {
    /// Reads `SQL_GUARD_STRICT` and `SQL_GUARD_CALLER_SCOPE` (both default `true`).
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            strict: flag(&lookup, "SQL_GUARD_STRICT", true)?,
            enforce_caller_scope: flag(&lookup, "SQL_GUARD_CALLER_SCOPE", true)?,
        })
    }
}

fn flag<F>(lookup: &F, var: &'static str, default: bool) -> Result<bool, PipelineError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var).filter(|v| !v.trim().is_empty()) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(PipelineError::Config {
            var,
            reason: format!("expected a boolean, got {raw:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_are_strict() {
        assert_eq!(GuardPolicy::from_lookup(lookup(&[])).unwrap(), GuardPolicy::default());
    }

    #[test]
    fn flags_accept_common_spellings() {
        let p = GuardPolicy::from_lookup(lookup(&[
            ("SQL_GUARD_STRICT", "off"),
            ("SQL_GUARD_CALLER_SCOPE", "No"),
        ]))
        .unwrap();
        assert!(!p.strict);
        assert!(!p.enforce_caller_scope);
    }

    #[test]
    fn garbage_is_a_config_error() {
        let err = GuardPolicy::from_lookup(lookup(&[("SQL_GUARD_STRICT", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("SQL_GUARD_STRICT"));
    }
}
