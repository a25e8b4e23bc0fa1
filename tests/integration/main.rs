//! Integration tests for deplayer

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use sha2::{Digest, Sha256};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const STACK: &str = "io.buildpacks.stacks.jammy";
    const ARTIFACT: &[u8] = b"pnpm 8.6.2 standalone";

    fn deplayer() -> Command {
        let mut cmd = cargo_bin_cmd!("deplayer");
        cmd.env_remove("BP_DISABLE_SBOM")
            .env_remove("CNB_LAYERS_DIR")
            .env_remove("CNB_BP_PLAN_PATH")
            .env_remove("CNB_BUILDPACK_DIR")
            .env_remove("CNB_PLATFORM_DIR")
            .env_remove("CNB_STACK_ID");
        cmd
    }

    /// Buildpack directory, plan file, layers directory and platform directory
    struct Fixture {
        root: TempDir,
    }

    impl Fixture {
        fn new(plan: &str) -> Self {
            let root = TempDir::new().unwrap();
            let buildpack = root.path().join("buildpack");
            fs::create_dir_all(buildpack.join("artifacts")).unwrap();
            fs::create_dir_all(root.path().join("layers")).unwrap();
            fs::create_dir_all(root.path().join("platform")).unwrap();

            fs::write(buildpack.join("artifacts/pnpm-8.6.2.tgz"), ARTIFACT).unwrap();
            let sha = hex::encode(Sha256::digest(ARTIFACT));
            fs::write(
                buildpack.join("buildpack.toml"),
                format!(
                    r#"
api = "0.8"

[buildpack]
id = "example/pnpm"
name = "Pnpm Buildpack"
version = "1.2.3"
sbom-formats = [
    "application/vnd.cyclonedx+json",
    "application/spdx+json",
    "application/vnd.syft+json",
]

[metadata.default-versions]
pnpm = "8.*"

[[metadata.dependencies]]
id = "pnpm"
name = "Pnpm"
version = "8.6.2"
stacks = ["{STACK}"]
uri = "artifacts/pnpm-8.6.2.tgz"
sha256 = "{sha}"
licenses = ["MIT"]
"#
                ),
            )
            .unwrap();
            fs::write(root.path().join("plan.toml"), plan).unwrap();

            Self { root }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.root.path().join(name)
        }

        fn layers(&self) -> PathBuf {
            self.path("layers")
        }

        fn build(&self) -> Command {
            let mut cmd = deplayer();
            cmd.arg("build")
                .arg("--layers")
                .arg(self.layers())
                .arg("--plan")
                .arg(self.path("plan.toml"))
                .arg("--buildpack")
                .arg(self.path("buildpack"))
                .arg("--platform")
                .arg(self.path("platform"))
                .args(["--stack", STACK]);
            cmd
        }
    }

    const BUILD_PLAN: &str = r#"
[[entries]]
name = "pnpm"

[entries.metadata]
version = "8.*"
build = true
"#;

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn help_displays() {
        deplayer()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cached dependency layer"));
    }

    #[test]
    fn version_displays() {
        deplayer()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("deplayer"));
    }

    #[test]
    fn build_installs_then_reuses() {
        let fixture = Fixture::new(BUILD_PLAN);

        fixture
            .build()
            .assert()
            .success()
            .stdout(predicate::str::contains("Executing build process"))
            .stdout(predicate::str::contains("Installing Pnpm 8.6.2"))
            .stdout(predicate::str::contains("Layer pnpm rebuilt"));

        let layers = fixture.layers();
        assert!(layers.join("pnpm/pnpm-8.6.2.tgz").exists());
        let metadata = read(&layers.join("pnpm.toml"));
        assert!(metadata.contains("cache_sha"));
        assert!(metadata.contains(&hex::encode(Sha256::digest(ARTIFACT))));
        assert!(layers.join("pnpm.sbom.cdx.json").exists());
        assert!(layers.join("pnpm.sbom.spdx.json").exists());
        assert!(layers.join("pnpm.sbom.syft.json").exists());
        assert!(read(&layers.join("build.toml")).contains("[[bom]]"));
        assert!(!layers.join("launch.toml").exists());

        fixture
            .build()
            .assert()
            .success()
            .stdout(predicate::str::contains("Reusing cached layer"))
            .stdout(predicate::str::contains("Executing build process").not())
            .stdout(predicate::str::contains("Layer pnpm reused"));

        assert!(layers.join("pnpm/pnpm-8.6.2.tgz").exists());
    }

    #[test]
    fn invalid_disable_sbom_fails_before_layer_changes() {
        let fixture = Fixture::new(BUILD_PLAN);

        fixture
            .build()
            .env("BP_DISABLE_SBOM", "maybe")
            .assert()
            .failure()
            .stderr(predicate::str::contains("BP_DISABLE_SBOM"));

        assert!(!fixture.layers().join("pnpm").exists());
        assert!(!fixture.layers().join("pnpm.toml").exists());
    }

    #[test]
    fn disable_sbom_skips_documents() {
        let fixture = Fixture::new(BUILD_PLAN);

        fixture
            .build()
            .env("BP_DISABLE_SBOM", "true")
            .assert()
            .success()
            .stdout(predicate::str::contains("Skipping SBOM generation"));

        let layers = fixture.layers();
        assert!(layers.join("pnpm.toml").exists());
        assert!(!layers.join("pnpm.sbom.cdx.json").exists());
        assert!(!layers.join("pnpm.sbom.spdx.json").exists());
    }

    #[test]
    fn missing_plan_entry_fails() {
        let fixture = Fixture::new(
            r#"
[[entries]]
name = "node"
"#,
        );

        fixture
            .build()
            .assert()
            .failure()
            .stderr(predicate::str::contains("pnpm"));

        assert!(!fixture.layers().join("pnpm").exists());
    }

    #[test]
    fn unsupported_version_fails() {
        let fixture = Fixture::new(
            r#"
[[entries]]
name = "pnpm"

[entries.metadata]
version = "9.*"
"#,
        );

        fixture
            .build()
            .assert()
            .failure()
            .stderr(predicate::str::contains("8.6.2"));
    }

    #[test]
    fn inspect_after_build() {
        let fixture = Fixture::new(BUILD_PLAN);
        fixture.build().assert().success();

        deplayer()
            .arg("inspect")
            .arg("pnpm")
            .arg("--layers")
            .arg(fixture.layers())
            .args(["--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"cache\": true"))
            .stdout(predicate::str::contains("\"build\": true"))
            .stdout(predicate::str::contains(hex::encode(Sha256::digest(ARTIFACT))))
            .stdout(predicate::str::contains("application/spdx+json"));
    }

    #[test]
    fn inspect_empty_layer() {
        let layers = TempDir::new().unwrap();

        deplayer()
            .arg("inspect")
            .arg("--layers")
            .arg(layers.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Layer: pnpm"))
            .stdout(predicate::str::contains("not installed"));
    }
}
