#[cfg(test)]
mod tests {
    use super::super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.arch_label, "kubernetes.io/arch");
        assert_eq!(config.max_concurrent_fetches, 4);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert!(config.registry.insecure.is_empty());
        assert!(!config.registry.accept_invalid_certificates);
        assert!(config.registries.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
arch_label = "example.com/arch"
max_concurrent_fetches = 1

[registry]
insecure = ["localhost:5000"]

[registries."ghcr.io"]
username = "bot"
password = "token"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.arch_label, "example.com/arch");
        assert_eq!(config.max_concurrent_fetches, 1);
        assert_eq!(config.fetch_timeout_secs, 10);
        assert_eq!(config.registry.insecure, vec!["localhost:5000".to_string()]);
        assert_eq!(
            config.registries.get("ghcr.io"),
            Some(&AuthConfig::basic("bot", "token"))
        );
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_concurrent_fetches = \"many\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = Config::load_from(Path::new("/nonexistent/archfilter.toml"));
        assert!(result.is_err());
    }
}
