#[cfg(test)]
mod tests {
    use super::super::*;
    use base64::Engine;
    use oci_distribution::secrets::RegistryAuth;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_anonymous() {
        let auth = AuthConfig::anonymous();
        assert!(auth.is_anonymous());
        assert!(matches!(auth.to_registry_auth(), RegistryAuth::Anonymous));
    }

    #[test]
    fn test_basic_to_registry_auth() {
        let auth = AuthConfig::basic("user", "pass");
        assert!(!auth.is_anonymous());
        match auth.to_registry_auth() {
            RegistryAuth::Basic(u, p) => {
                assert_eq!(u, "user");
                assert_eq!(p, "pass");
            }
            _ => panic!("expected basic auth"),
        }
    }

    #[test]
    fn test_encoded_auth_is_decoded() {
        let auth = AuthConfig {
            auth: Some(base64::engine::general_purpose::STANDARD.encode("robot:s3cret")),
            ..Default::default()
        };
        match auth.to_registry_auth() {
            RegistryAuth::Basic(u, p) => {
                assert_eq!(u, "robot");
                assert_eq!(p, "s3cret");
            }
            _ => panic!("expected basic auth"),
        }
    }

    #[test]
    fn test_undecodable_auth_is_anonymous() {
        let auth = AuthConfig {
            auth: Some("%%%".to_string()),
            ..Default::default()
        };
        assert!(matches!(auth.to_registry_auth(), RegistryAuth::Anonymous));
    }

    #[test]
    fn test_registry_variants() {
        let variants = registry_variants("docker.io");
        assert!(variants.contains(&"index.docker.io".to_string()));
        assert!(variants.contains(&"https://index.docker.io/v1/".to_string()));

        let variants = registry_variants("quay.io");
        assert_eq!(variants[0], "quay.io");
        assert!(variants.contains(&"https://quay.io".to_string()));
    }

    #[test]
    fn test_docker_config_keychain_reads_auths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let encoded = base64::engine::general_purpose::STANDARD.encode("u:p");
        fs::write(
            &path,
            format!(r#"{{"auths":{{"https://quay.io":{{"auth":"{}"}}}}}}"#, encoded),
        )
        .unwrap();

        let keychain = DockerConfigKeychain::with_paths(vec![path]);
        let auth = keychain.resolve("quay.io").unwrap();
        assert_eq!(auth.auth.as_deref(), Some(encoded.as_str()));
        assert!(keychain.resolve("ghcr.io").unwrap().is_anonymous());
    }

    #[test]
    fn test_docker_config_keychain_skips_broken_file() {
        let dir = tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        let good = dir.path().join("good.json");
        fs::write(&broken, "{not json").unwrap();
        fs::write(
            &good,
            r#"{"auths":{"ghcr.io":{"username":"a","password":"b"}}}"#,
        )
        .unwrap();

        let keychain = DockerConfigKeychain::with_paths(vec![broken, good]);
        assert_eq!(keychain.resolve("ghcr.io").unwrap(), AuthConfig::basic("a", "b"));
    }

    #[test]
    fn test_chain_prefers_first_non_anonymous() {
        let mut first = HashMap::new();
        first.insert("ghcr.io".to_string(), AuthConfig::basic("config", "pw"));
        let mut second = HashMap::new();
        second.insert("ghcr.io".to_string(), AuthConfig::basic("docker", "pw"));
        second.insert("quay.io".to_string(), AuthConfig::basic("docker", "pw"));

        let chain = ChainKeychain::new(vec![
            Box::new(StaticKeychain::new(first)),
            Box::new(StaticKeychain::new(second)),
        ]);

        assert_eq!(chain.resolve("ghcr.io").unwrap().username.as_deref(), Some("config"));
        assert_eq!(chain.resolve("quay.io").unwrap().username.as_deref(), Some("docker"));
        assert!(chain.resolve("gcr.io").unwrap().is_anonymous());
    }
}
