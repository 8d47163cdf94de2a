//! Integration tests for the finalize shim

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn finalize() -> Command {
        cargo_bin_cmd!("finalize")
    }

    fn staging_args(temp: &TempDir) -> Vec<String> {
        ["app", "cache", "deps", "1", "profile"]
            .iter()
            .map(|name| {
                if *name == "1" {
                    name.to_string()
                } else {
                    temp.path().join(name).display().to_string()
                }
            })
            .collect()
    }

    #[test]
    fn help_displays() {
        finalize()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Finalize step"));
    }

    #[test]
    fn missing_arguments_fail() {
        finalize()
            .args(["/tmp/app", "/tmp/cache"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("required"));
    }

    #[test]
    fn missing_stack_fails() {
        let temp = TempDir::new().unwrap();
        finalize()
            .env_remove("CF_STACK")
            .args(staging_args(&temp))
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Failed finalize step: CF_STACK is not set"));
    }

    #[test]
    fn missing_buildpack_manifest_fails() {
        let temp = TempDir::new().unwrap();
        let buildpack = temp.path().join("buildpack");
        std::fs::create_dir_all(&buildpack).unwrap();

        finalize()
            .env("CF_STACK", "cflinuxfs3")
            .env("BUILDPACK_DIR", &buildpack)
            .env("CNB_SHIM_HOME", temp.path().join("vcap"))
            .args(staging_args(&temp))
            .assert()
            .code(1)
            .stderr(predicate::str::contains("manifest.yml"));
    }

    #[test]
    fn missing_order_fragments_fail_merge() {
        let temp = TempDir::new().unwrap();
        let buildpack = temp.path().join("buildpack");
        std::fs::create_dir_all(&buildpack).unwrap();
        std::fs::write(buildpack.join("manifest.yml"), "language: nodejs\n").unwrap();
        std::fs::write(buildpack.join("VERSION"), "1.2.3\n").unwrap();

        finalize()
            .env("CF_STACK", "cflinuxfs3")
            .env("BUILDPACK_DIR", &buildpack)
            .env("CNB_SHIM_HOME", temp.path().join("vcap"))
            .args(staging_args(&temp))
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Merging order metadata"))
            .stderr(predicate::str::contains(
                "Failed finalize step: failed to merge order metadata: no order.toml found",
            ));
    }
}

#[cfg(unix)]
mod staging_tests {
    use async_trait::async_trait;
    use buildpack_shim::config::{FinalizeConfig, Layout};
    use buildpack_shim::finalize::{Finalizer, Phase};
    use buildpack_shim::lifecycle::{Detector, Installer};
    use buildpack_shim::metadata::{
        BuildpackDescriptor, BuildpackManifest, BuildpackRef, Group, LayerMetadata, Order,
    };
    use buildpack_shim::order::fragment_path;
    use buildpack_shim::{ShimError, ShimResult};
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    const BUILDER: &str = r#"#!/bin/sh
set -e
while [ $# -gt 0 ]; do
  case "$1" in
    -app) APP="$2"; shift ;;
    -layers) LAYERS="$2"; shift ;;
  esac
  shift
done
if [ -f "$LAYERS/lang-b/modules/marker" ]; then
  echo restored > "$APP/restored"
fi
mkdir -p "$LAYERS/lang-b/modules" "$LAYERS/lang-b/launch-only" "$LAYERS/config"
echo built > "$LAYERS/lang-b/modules/marker"
printf 'build = false\nlaunch = true\ncache = true\n' > "$LAYERS/lang-b/modules.toml"
echo run > "$LAYERS/lang-b/launch-only/marker"
printf 'launch = true\n' > "$LAYERS/lang-b/launch-only.toml"
printf '[[processes]]\ntype = "web"\ncommand = "npm start"\n' > "$LAYERS/config/metadata.toml"
echo built > "$APP/built"
echo "builder done"
"#;

    const FAILING_BUILDER: &str = "#!/bin/sh\necho boom >&2\nexit 7\n";

    const DESCRIPTOR: &str = r#"
[buildpack]
id = "lang-b"
name = "Lang B"
version = "1.0.0"

[[stacks]]
id = "org.cloudfoundry.stacks.cflinuxfs3"
"#;

    const OVERRIDE: &str = r#"lang:
  default_versions:
    - name: runtime
      version: 2.x
  dependencies:
    - name: runtime
      version: 2.1.0
      uri: https://mirror.example/runtime-2.1.0.tgz
      sha256: abc123
      cf_stacks: [cflinuxfs3]
"#;

    struct CountingDetector(Arc<AtomicUsize>);

    #[async_trait]
    impl Detector for CountingDetector {
        async fn run_lifecycle_detect(&self) -> ShimResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Installs a shell script in place of the lifecycle builder
    struct ScriptInstaller {
        builder: &'static str,
    }

    fn write_executable(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut file = std::fs::File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.sync_all().unwrap();
        drop(file);
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[async_trait]
    impl Installer for ScriptInstaller {
        async fn install_lifecycle(&self, dir: &Path) -> ShimResult<()> {
            write_executable(&dir.join("builder"), self.builder);
            Ok(())
        }

        async fn install_only_version(&self, name: &str, dir: &Path) -> ShimResult<()> {
            write_executable(&dir.join(name), "#!/bin/sh\n");
            Ok(())
        }
    }

    struct Staging {
        temp: TempDir,
        config: FinalizeConfig,
        detects: Arc<AtomicUsize>,
    }

    impl Staging {
        /// Two legacy buildpacks already supplied; this one sits at index 2
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let deps = temp.path().join("deps");
            let config = FinalizeConfig {
                v2_app_dir: temp.path().join("app"),
                v2_cache_dir: temp.path().join("cache"),
                v2_deps_dir: deps.clone(),
                deps_index: "2".to_string(),
                profile_dir: temp.path().join("profile.d"),
                layout: Layout::under(&temp.path().join("vcap")),
                lifecycle_dir: temp.path().join("lifecycle"),
                launcher_dir: deps.join("launcher"),
                stack: "cflinuxfs3".to_string(),
            };

            let staging = Self {
                temp,
                config,
                detects: Arc::new(AtomicUsize::new(0)),
            };
            staging.seed();
            staging
        }

        fn seed(&self) {
            let config = &self.config;

            std::fs::create_dir_all(&config.v2_app_dir).unwrap();
            std::fs::create_dir_all(&config.v2_cache_dir).unwrap();
            std::fs::create_dir_all(&config.layout.app_dir).unwrap();
            std::fs::write(config.layout.app_dir.join("package.json"), "{}").unwrap();

            let legacy0 = config.deps_slot("0");
            std::fs::create_dir_all(legacy0.join("bin")).unwrap();
            std::fs::create_dir_all(legacy0.join("env")).unwrap();
            std::fs::write(legacy0.join("bin").join("tool"), "tool").unwrap();
            std::fs::write(legacy0.join("env").join("TOOL_HOME"), "/tool").unwrap();

            let legacy1 = config.deps_slot("1");
            std::fs::create_dir_all(&legacy1).unwrap();
            std::fs::write(legacy1.join("override.yml"), OVERRIDE).unwrap();

            std::fs::create_dir_all(config.deps_slot("2")).unwrap();

            single("lang-a")
                .write(&fragment_path(&config.layout.order_dir, 0))
                .unwrap();
            single("lang-b")
                .write(&fragment_path(&config.layout.order_dir, 1))
                .unwrap();

            Group {
                buildpacks: vec![BuildpackRef::new("lang-b")],
            }
            .write(&config.group_metadata())
            .unwrap();
            std::fs::write(config.plan_metadata(), "").unwrap();

            let descriptor = self.descriptor_path();
            std::fs::create_dir_all(descriptor.parent().unwrap()).unwrap();
            std::fs::write(descriptor, DESCRIPTOR).unwrap();
        }

        fn descriptor_path(&self) -> PathBuf {
            self.config
                .layout
                .buildpacks_dir
                .join("lang-b")
                .join("1.0.0")
                .join("buildpack.toml")
        }

        fn finalizer(&self, builder: &'static str) -> Finalizer {
            Finalizer::new(
                self.config.clone(),
                Box::new(CountingDetector(self.detects.clone())),
                Box::new(ScriptInstaller { builder }),
                BuildpackManifest {
                    language: "nodejs".to_string(),
                    version: "1.2.3".to_string(),
                },
            )
        }

        fn path(&self, relative: &str) -> PathBuf {
            self.temp.path().join(relative)
        }
    }

    fn single(id: &str) -> Order {
        Order {
            groups: vec![Group {
                buildpacks: vec![BuildpackRef::new(id)],
            }],
        }
    }

    #[tokio::test]
    async fn full_staging() {
        let staging = Staging::new();
        let config = &staging.config;
        let mut finalizer = staging.finalizer(BUILDER);

        finalizer.run().await.unwrap();

        assert_eq!(finalizer.state().completed, Phase::ALL.to_vec());
        assert_eq!(staging.detects.load(Ordering::SeqCst), 0);

        // Merged order keeps fragments in index order
        let order = Order::from_file(&config.order_metadata()).unwrap();
        assert_eq!(order.groups.len(), 2);
        assert_eq!(order.groups[0].ids(), vec!["lang-a"]);
        assert_eq!(order.groups[1].ids(), vec!["lang-b"]);

        // Legacy buildpacks lead the group in ascending index order
        let group = Group::from_file(&config.group_metadata()).unwrap();
        assert_eq!(group.ids(), vec!["buildpack.0", "buildpack.1", "lang-b"]);
        assert_eq!(finalizer.state().injected, vec!["buildpack.0", "buildpack.1"]);
        for id in ["buildpack.0", "buildpack.1"] {
            let build = config
                .layout
                .buildpacks_dir
                .join(id)
                .join("latest")
                .join("bin")
                .join("build");
            let mode = std::fs::metadata(&build).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }

        // Override pinned into the lifecycle buildpack
        let descriptor = BuildpackDescriptor::from_file(&staging.descriptor_path()).unwrap();
        assert_eq!(descriptor.metadata.default_versions["runtime"], "2.x");
        assert_eq!(descriptor.metadata.dependencies.len(), 1);
        assert_eq!(descriptor.metadata.dependencies[0].sha256, "abc123");

        // App relocated with builder output and exposed metadata
        let app = &config.v2_app_dir;
        assert!(app.join("package.json").is_file());
        assert!(app.join("built").is_file());
        assert!(app.join(".cloudfoundry").join("metadata.toml").is_file());
        assert!(!app.join("restored").exists());
        assert!(!config.layout.app_dir.exists());

        // Layers migrated to deps
        let deps = &config.v2_deps_dir;
        assert!(deps.join("lang-b").join("modules").join("marker").is_file());
        assert!(deps.join("lang-b").join("launch-only").join("marker").is_file());
        assert!(deps.join("buildpack.0").join("layer").join("bin").join("tool").is_file());
        assert!(deps
            .join("buildpack.0")
            .join("layer")
            .join("env.build")
            .join("TOOL_HOME")
            .is_file());
        assert!(deps.join("config").join("metadata.toml").is_file());
        assert!(deps.join("launcher").join("launcher").is_file());
        assert!(!deps.join("0").exists());
        assert!(!deps.join("2").exists());

        // Only cacheable layers cached
        let cache = staging.path("cache/cnb");
        assert!(cache.join("lang-b").join("modules").join("marker").is_file());
        assert_eq!(
            LayerMetadata::for_layer(&cache.join("lang-b").join("modules")).unwrap(),
            Some(LayerMetadata {
                build: false,
                launch: true,
                cache: true,
            })
        );
        assert!(!cache.join("lang-b").join("launch-only").exists());
        assert!(!cache.join("buildpack.0").exists());

        let metadata = std::fs::read_to_string(staging.path("cache/BUILDPACK_METADATA")).unwrap();
        assert!(metadata.contains("nodejs"));
        assert!(metadata.contains("1.2.3"));

        let profile = std::fs::read_to_string(staging.path("profile.d/0_shim.sh")).unwrap();
        assert!(profile.contains("export CNB_STACK_ID=\"org.cloudfoundry.stacks.cflinuxfs3\""));
        assert!(profile.contains("exec $DEPS_DIR/launcher/launcher \"$2\""));

        finalizer.cleanup_staging().unwrap();
        for dir in config.staging_dirs() {
            assert!(!dir.exists(), "{} should be removed", dir.display());
        }
    }

    #[tokio::test]
    async fn cached_layers_are_restored_before_build() {
        let staging = Staging::new();
        let cached = staging.path("cache/cnb/lang-b/modules");
        std::fs::create_dir_all(&cached).unwrap();
        std::fs::write(cached.join("marker"), "previous").unwrap();
        LayerMetadata {
            build: false,
            launch: true,
            cache: true,
        }
        .write_for_layer(&cached)
        .unwrap();

        let mut finalizer = staging.finalizer(BUILDER);
        finalizer.run().await.unwrap();

        assert!(finalizer.state().cache_restored);
        assert!(staging.config.v2_app_dir.join("restored").is_file());
        assert_eq!(
            std::fs::read_to_string(cached.join("marker")).unwrap().trim(),
            "built"
        );
    }

    #[tokio::test]
    async fn builder_failure_keeps_staging() {
        let staging = Staging::new();
        let config = &staging.config;
        let mut finalizer = staging.finalizer(FAILING_BUILDER);

        let err = finalizer.run().await.unwrap_err();

        assert_eq!(err.phase(), Some(Phase::RunBuild));
        assert!(err.chain().starts_with("failed to run lifecycle builder: "));
        assert!(err.chain().contains("boom"));
        match &err {
            ShimError::Phase { source, .. } => assert!(matches!(
                source.as_ref(),
                ShimError::CommandExecution { code: Some(7), .. }
            )),
            other => panic!("unexpected error: {:?}", other),
        }

        for dir in config.staging_dirs() {
            assert!(dir.exists(), "{} should be kept", dir.display());
        }
        assert!(!staging.path("profile.d/0_shim.sh").exists());
        assert!(config.layout.app_dir.exists());
    }

    #[tokio::test]
    async fn detect_runs_without_plan() {
        let staging = Staging::new();
        std::fs::remove_file(staging.config.plan_metadata()).unwrap();

        let mut finalizer = staging.finalizer(BUILDER);
        finalizer.run().await.unwrap();

        assert_eq!(staging.detects.load(Ordering::SeqCst), 1);
        assert!(finalizer.state().detected);
    }
}
