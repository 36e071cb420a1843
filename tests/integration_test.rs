use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(config: &str) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("config.toml"), config)?;
        Ok(Self { dir })
    }

    fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, content)?;
        Ok(path)
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    fn command(&self) -> Result<Command> {
        let mut cmd = Command::cargo_bin("archfilter")?;
        cmd.arg("--config").arg(self.config());
        // Keep the user's Docker credentials out of the tests
        cmd.env("DOCKER_CONFIG", self.dir.path());
        cmd.env_remove("REGISTRY_AUTH_FILE");
        Ok(cmd)
    }
}

const LOCAL_REGISTRY_CONFIG: &str = r#"
fetch_timeout_secs = 5
deadline_secs = 10

[registry]
insecure = ["127.0.0.1:1"]
"#;

fn pod(images: &[&str]) -> String {
    let mut yaml = String::from("metadata:\n  name: web\nspec:\n  containers:\n");
    for (i, image) in images.iter().enumerate() {
        yaml.push_str(&format!("  - name: c{}\n    image: {}\n", i, image));
    }
    yaml
}

fn node(arch: Option<&str>) -> String {
    match arch {
        Some(arch) => format!(
            "metadata:\n  name: worker\n  labels:\n    kubernetes.io/arch: {}\n",
            arch
        ),
        None => "metadata:\n  name: worker\n  labels:\n    kubernetes.io/os: linux\n".to_string(),
    }
}

fn check(fixture: &Fixture, pod: &Path, node: &Path) -> Result<Command> {
    let mut cmd = fixture.command()?;
    cmd.arg("check").arg("--pod").arg(pod).arg("--node").arg(node);
    Ok(cmd)
}

#[test]
fn test_version_command() -> Result<()> {
    let mut cmd = Command::cargo_bin("archfilter")?;
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("archfilter 0.1.0"));
    Ok(())
}

#[test]
fn test_version_subcommand() -> Result<()> {
    let mut cmd = Command::cargo_bin("archfilter")?;
    cmd.arg("version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("archfilter 0.1.0"));
    Ok(())
}

#[test]
fn test_help_command() -> Result<()> {
    let mut cmd = Command::cargo_bin("archfilter")?;
    cmd.arg("--help");
    cmd.assert().success().stdout(predicate::str::contains(
        "checks container image architectures against a node",
    ));
    Ok(())
}

#[test]
fn test_check_help() -> Result<()> {
    let mut cmd = Command::cargo_bin("archfilter")?;
    cmd.arg("check").arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--pod"))
        .stdout(predicate::str::contains("--node"));
    Ok(())
}

#[test]
fn test_check_node_without_arch_admits() -> Result<()> {
    let fixture = Fixture::new(LOCAL_REGISTRY_CONFIG)?;
    let pod = fixture.write("pod.yaml", &pod(&["127.0.0.1:1/app:v1"]))?;
    let node = fixture.write("node.yaml", &node(None))?;

    check(&fixture, &pod, &node)?
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ADMIT"))
        .stdout(predicate::str::contains("node architecture not found"));
    Ok(())
}

#[test]
fn test_check_unreachable_registry_fails_open() -> Result<()> {
    let fixture = Fixture::new(LOCAL_REGISTRY_CONFIG)?;
    let pod = fixture.write(
        "pod.yaml",
        &pod(&["127.0.0.1:1/app:v1", "127.0.0.1:1/sidecar:v1"]),
    )?;
    let node = fixture.write("node.yaml", &node(Some("arm64")))?;

    check(&fixture, &pod, &node)?
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ADMIT"))
        .stdout(predicate::str::contains("2 could not be checked"));
    Ok(())
}

#[test]
fn test_check_malformed_reference_fails_open() -> Result<()> {
    let fixture = Fixture::new(LOCAL_REGISTRY_CONFIG)?;
    let pod = fixture.write("pod.yaml", &pod(&["\"Not A Valid::Ref\""]))?;
    let node = fixture.write("node.yaml", &node(Some("amd64")))?;

    check(&fixture, &pod, &node)?
        .assert()
        .success()
        .stdout(predicate::str::contains("1 could not be checked: Not A Valid::Ref"));
    Ok(())
}

#[test]
fn test_check_workload_without_images_admits() -> Result<()> {
    let fixture = Fixture::new("")?;
    let pod = fixture.write("pod.yaml", "metadata:\n  name: empty\nspec: {}\n")?;
    let node = fixture.write("node.yaml", &node(Some("amd64")))?;

    check(&fixture, &pod, &node)?
        .assert()
        .success()
        .stdout(predicate::str::contains("ADMIT: no images to check"));
    Ok(())
}

#[test]
fn test_check_missing_input_exits_with_error() -> Result<()> {
    let fixture = Fixture::new("")?;
    let node = fixture.write("node.yaml", &node(Some("amd64")))?;
    let missing = fixture.dir.path().join("missing.yaml");

    check(&fixture, &missing, &node)?
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty());
    Ok(())
}

#[test]
fn test_invalid_config_exits_with_error() -> Result<()> {
    let fixture = Fixture::new("max_concurrent_fetches = \"lots\"")?;
    let pod = fixture.write("pod.yaml", &pod(&["alpine"]))?;
    let node = fixture.write("node.yaml", &node(Some("amd64")))?;

    check(&fixture, &pod, &node)?.assert().code(2);
    Ok(())
}
