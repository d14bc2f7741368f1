/// Value of `key` when set and non-empty, `default` otherwise.
pub fn env_or_default(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

/// Port from `PORT`, falling back to `default` when unset or unparsable.
pub fn port_from_env(default: u16) -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .filter(|port| *port != 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_default() {
        temp_env::with_vars(
            [("DEMO_SET", Some("eu-central-1")), ("DEMO_EMPTY", Some(""))],
            || {
                assert_eq!(env_or_default("DEMO_SET", "us-west-2"), "eu-central-1");
                assert_eq!(env_or_default("DEMO_EMPTY", "us-west-2"), "us-west-2");
                assert_eq!(env_or_default("DEMO_UNSET_KEY", "us-west-2"), "us-west-2");
            },
        );
    }

    #[test]
    fn test_port_from_env() {
        temp_env::with_var("PORT", Some("9100"), || assert_eq!(port_from_env(8080), 9100));
        temp_env::with_var("PORT", Some("not-a-port"), || assert_eq!(port_from_env(8080), 8080));
        temp_env::with_var("PORT", Some("0"), || assert_eq!(port_from_env(8080), 8080));
        temp_env::with_var_unset("PORT", || assert_eq!(port_from_env(8082), 8082));
    }
}
