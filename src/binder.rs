//! Merges the context layers of a template run into the variable registry.

use crate::context::ContextLayers;
use crate::error::{Error, Result};
use crate::registry::{default_choice, Binding, Registry};
use log::debug;
use serde_json::{Map, Value};

fn check_choices(key: &str, value: &Value) -> Result<()> {
    match value {
        Value::Array(choices) if choices.is_empty() => Err(Error::ContextError(format!(
            "variable '{key}' has an empty list of choices"
        ))),
        _ => Ok(()),
    }
}

fn variable(key: &str, value: &Value, use_defaults: bool, gate: Option<&str>) -> Result<Binding> {
    check_choices(key, value)?;
    Ok(if use_defaults {
        Binding::Cached(default_choice(value))
    } else {
        Binding::Prompt { default: value.clone(), gate: gate.map(str::to_string) }
    })
}

fn bind_group(
    registry: &mut Registry,
    group: &str,
    members: &Map<String, Value>,
    use_defaults: bool,
) -> Result<()> {
    registry.register(group, Binding::Toggle { ask: !use_defaults });

    for (key, value) in members {
        if value.is_object() {
            return Err(Error::ContextError(format!(
                "group '{group}' member '{key}' is itself a group, only one level of nesting is supported"
            )));
        }
        if key == group {
            return Err(Error::ContextError(format!(
                "group '{group}' has a member with its own name"
            )));
        }
        registry.register(key.as_str(), variable(key, value, use_defaults, Some(group))?);
    }
    Ok(())
}

/// Binds every variable of `layers` into `registry`.
///
/// Layers are bound in order (inline defaults, then stored answers) and a
/// later layer overwrites entries of an earlier one by key. Overwriting is
/// flat: a stored answer named like a group member replaces that member
/// only, a stored group replaces the toggle and its members by name.
///
/// # Arguments
/// * `registry` - Registry receiving the bindings
/// * `layers` - Context layers of the run
/// * `use_defaults` - Answer every variable with its default instead of asking
///
/// # Errors
/// * `Error::ContextError` for empty choice lists and nested groups
pub fn bind(registry: &mut Registry, layers: &ContextLayers, use_defaults: bool) -> Result<()> {
    for layer in layers.iter() {
        for (key, value) in layer {
            match value {
                Value::Object(members) => {
                    debug!("Binding group '{key}' with {} member(s).", members.len());
                    bind_group(registry, key, members, use_defaults)?;
                }
                _ => {
                    debug!("Binding '{key}'.");
                    registry.register(key.as_str(), variable(key, value, use_defaults, None)?);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::parse_variables;
    use serde_json::json;

    fn layers(defaults: &str, stored: Option<&str>) -> ContextLayers {
        ContextLayers::new(
            Some(parse_variables(defaults).unwrap()),
            stored.map(|s| parse_variables(s).unwrap()),
        )
    }

    #[test]
    fn defaults_mode_caches_first_choice() {
        let mut registry = Registry::new();
        bind(&mut registry, &layers(r#"{"name": "Acme", "license": ["MIT", "BSD"]}"#, None), true)
            .unwrap();

        assert_eq!(registry.resolve("name"), Some(&Binding::Cached(json!("Acme"))));
        assert_eq!(registry.resolve("license"), Some(&Binding::Cached(json!("MIT"))));
    }

    #[test]
    fn interactive_mode_prompts_with_full_default() {
        let mut registry = Registry::new();
        bind(&mut registry, &layers(r#"{"license": ["MIT", "BSD"]}"#, None), false).unwrap();

        assert_eq!(
            registry.resolve("license"),
            Some(&Binding::Prompt { default: json!(["MIT", "BSD"]), gate: None })
        );
    }

    #[test]
    fn groups_register_toggle_and_gated_members() {
        let mut registry = Registry::new();
        bind(&mut registry, &layers(r#"{"advanced": {"port": 8080}}"#, None), false).unwrap();

        assert_eq!(registry.resolve("advanced"), Some(&Binding::Toggle { ask: true }));
        assert_eq!(
            registry.resolve("port"),
            Some(&Binding::Prompt { default: json!(8080), gate: Some("advanced".into()) })
        );

        let mut registry = Registry::new();
        bind(&mut registry, &layers(r#"{"advanced": {"port": [1, 2]}}"#, None), true).unwrap();
        assert_eq!(registry.resolve("advanced"), Some(&Binding::Toggle { ask: false }));
        assert_eq!(registry.resolve("port"), Some(&Binding::Cached(json!(1))));
    }

    #[test]
    fn stored_answers_override_by_key() {
        let mut registry = Registry::new();
        let layers = layers(
            r#"{"name": "Acme", "advanced": {"port": 8080}}"#,
            Some(r#"{"name": "Initech", "port": 9090, "extra": true}"#),
        );
        bind(&mut registry, &layers, true).unwrap();

        assert_eq!(registry.resolve("name"), Some(&Binding::Cached(json!("Initech"))));
        assert_eq!(registry.resolve("port"), Some(&Binding::Cached(json!(9090))));
        assert_eq!(registry.resolve("extra"), Some(&Binding::Cached(json!(true))));
        assert_eq!(registry.resolve("advanced"), Some(&Binding::Toggle { ask: false }));
    }

    #[test]
    fn rejects_empty_choices() {
        let mut registry = Registry::new();
        let err = bind(&mut registry, &layers(r#"{"license": []}"#, None), true).unwrap_err();
        assert!(err.to_string().contains("license"));
    }

    #[test]
    fn rejects_nested_groups() {
        let mut registry = Registry::new();
        let err =
            bind(&mut registry, &layers(r#"{"a": {"b": {"c": 1}}}"#, None), false).unwrap_err();
        assert!(matches!(err, Error::ContextError(_)));
    }
}
