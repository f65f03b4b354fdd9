use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use product_catalog_core::stack::{synthesize, StackConfig};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Lambda binaries packaged as `bootstrap` zips, one per function.
const LAMBDA_BINARIES: [&str; 3] = [
    "fetch_products_lambda",
    "seed_db_lambda",
    "seed_trigger_lambda",
];

const DIST_DIR: &str = "infra/dist";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the product catalog workspace",
    long_about = "A unified CLI for packaging the Lambda functions, synthesizing\n\
                  the CloudFormation template, and running CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and package the Lambda bootstrap zips
    ServerlessPackage {
        /// Compilation target triple for Lambda binaries
        #[arg(long, default_value = "aarch64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
    /// Write the CloudFormation template for the stack
    Synth {
        /// Stack name used to prefix named resources
        #[arg(long, env = "STACK_NAME", default_value = "ServerlessExampleStack")]
        stack_name: String,
        /// Output file path
        #[arg(long, default_value = "infra/product-catalog.template.json")]
        output: PathBuf,
    },
    /// Run CI checks (fmt, clippy, tests)
    Ci,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn package_serverless_lambdas(target: &str, profile: BuildProfile) {
    ensure_rust_target_installed(target);
    ensure_c_linker_available(target);

    step("Build serverless lambda binaries");

    let mut cargo_args = vec!["build", "-p", "product_catalog_lambda", "--target", target];
    for bin in LAMBDA_BINARIES {
        cargo_args.extend(["--bin", bin]);
    }
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package lambda zip artifacts");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    let dist_dir = Path::new(DIST_DIR);
    fs::create_dir_all(dist_dir).expect("failed to create lambda dist directory");

    let mut packaged = Vec::with_capacity(LAMBDA_BINARIES.len());
    for bin in LAMBDA_BINARIES {
        let zip_path = dist_dir.join(format!("{bin}.zip"));
        package_lambda_zip(&target_dir.join(bin), &zip_path)
            .unwrap_or_else(|error| panic!("failed to package '{}': {error}", zip_path.display()));
        packaged.push(zip_path);
    }

    eprintln!("\nPackaged artifacts:");
    for path in packaged {
        eprintln!("- {}", path.display());
    }
}

fn ensure_rust_target_installed(target: &str) {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();

    let output = match output {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "failed to list installed rust targets; run `rustup target list --installed` manually. details: {}",
            stderr.trim()
        );
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "required rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- serverless-package`"
        );
    }
}

/// Cross GCC driver name for a `*-unknown-linux-gnu` target on Debian-style hosts.
fn cross_gcc_for(target: &str) -> Option<String> {
    let arch = target.strip_suffix("-unknown-linux-gnu")?;
    Some(format!("{arch}-linux-gnu-gcc"))
}

/// Environment overrides consulted before the canonical cross GCC: cargo's
/// linker setting and the compiler cc-rs uses for C sources (ring, aws-lc-sys).
fn linker_override_keys(target: &str) -> [String; 4] {
    let underscored = target.replace('-', "_");
    [
        format!("CARGO_TARGET_{}_LINKER", underscored.to_uppercase()),
        format!("CC_{underscored}"),
        format!("CC_{target}"),
        "TARGET_CC".to_string(),
    ]
}

fn ensure_c_linker_available(target: &str) {
    let Some(canonical) = cross_gcc_for(target) else {
        return;
    };
    for key in linker_override_keys(target) {
        if let Ok(value) = std::env::var(&key) {
            let candidate = value.trim();
            if !candidate.is_empty() && tool_works(candidate) {
                return;
            }
        }
    }

    if tool_works(&canonical) {
        return;
    }

    let cc_key = format!("CC_{}", target.replace('-', "_"));
    let triple = canonical.trim_end_matches("-gcc");
    panic!(
        "missing C cross toolchain for target `{target}`. install `{canonical}` (Debian package `gcc-{triple}`) or set {cc_key} before running `cargo run -p xtask -- serverless-package`.\n\
         .cargo/config.toml links this target with `{canonical}`, and ring/aws-lc-sys compile C sources for it."
    );
}

fn tool_works(program: &str) -> bool {
    let mut parts = program.split_whitespace();
    let Some(bin) = parts.next() else {
        return false;
    };
    let args: Vec<&str> = parts.collect();

    Command::new(bin)
        .args(&args)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Writes `binary_path` into `zip_path` as an executable `bootstrap` entry.
fn package_lambda_zip(binary_path: &Path, zip_path: &Path) -> io::Result<()> {
    if !binary_path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("expected lambda binary at '{}'", binary_path.display()),
        ));
    }

    let binary = fs::read(binary_path)?;
    let file = fs::File::create(zip_path)?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)?;
    zip.write_all(&binary)?;
    zip.finish()?;
    Ok(())
}

/// Synthesizes the stack into `output` and returns the template fingerprint.
fn write_template(config: &StackConfig, output: &Path) -> io::Result<String> {
    let template = synthesize(config)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;
    let json = template.to_json_pretty()?;

    if let Some(parent) = output.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, json)?;
    Ok(template.fingerprint())
}

// ── CI ─────────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test product_catalog_core");
    run_cargo(&["test", "-p", "product_catalog_core"]);

    step("Test product_catalog_lambda");
    run_cargo(&["test", "-p", "product_catalog_lambda"]);

    step("Test xtask");
    run_cargo(&["test", "-p", "xtask"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::ServerlessPackage { target, profile } => {
            package_serverless_lambdas(&target, profile);
        }
        Commands::Synth { stack_name, output } => {
            step("Synthesize CloudFormation template");
            let config = StackConfig::new(stack_name);
            match write_template(&config, &output) {
                Ok(fingerprint) => {
                    eprintln!("Wrote {}", output.display());
                    eprintln!("Template fingerprint: {fingerprint}");
                }
                Err(error) => {
                    eprintln!("error: failed to write '{}': {error}", output.display());
                    exit(1);
                }
            }
        }
        Commands::Ci => {
            ci_check();
            eprintln!("\nCI job passed.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn synth_writes_template_into_nested_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("infra").join("stack.template.json");

        let fingerprint =
            write_template(&StackConfig::default(), &output).expect("template should be written");

        let written = fs::read_to_string(&output).expect("template file");
        let parsed: serde_json::Value = serde_json::from_str(&written).expect("valid json");
        assert_eq!(parsed["AWSTemplateFormatVersion"], "2010-09-09");
        assert!(parsed["Resources"]["CreateDatabaseTrigger"].is_object());
        let expected = synthesize(&StackConfig::default()).expect("default config");
        assert_eq!(fingerprint, expected.fingerprint());
    }

    #[test]
    fn synth_refuses_invalid_config_without_writing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("stack.template.json");
        let config = StackConfig {
            availability_zones: 0,
            ..StackConfig::default()
        };

        let error = write_template(&config, &output).expect_err("zero zones should fail");

        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
        assert!(!output.exists());
    }

    #[test]
    fn package_zips_binary_as_bootstrap() {
        let dir = tempfile::tempdir().expect("tempdir");
        let binary = dir.path().join("seed_db_lambda");
        fs::write(&binary, b"\x7fELF fake binary").expect("binary");
        let zip_path = dir.path().join("seed_db_lambda.zip");

        package_lambda_zip(&binary, &zip_path).expect("zip should be written");

        let mut archive =
            zip::ZipArchive::new(fs::File::open(&zip_path).expect("zip file")).expect("archive");
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_name("bootstrap").expect("bootstrap entry");
        assert_eq!(entry.unix_mode().map(|mode| mode & 0o777), Some(0o755));
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).expect("read entry");
        assert_eq!(contents, b"\x7fELF fake binary");
    }

    #[test]
    fn cross_gcc_follows_target_architecture() {
        assert_eq!(
            cross_gcc_for("aarch64-unknown-linux-gnu").as_deref(),
            Some("aarch64-linux-gnu-gcc")
        );
        assert_eq!(
            cross_gcc_for("x86_64-unknown-linux-gnu").as_deref(),
            Some("x86_64-linux-gnu-gcc")
        );
        assert_eq!(cross_gcc_for("aarch64-unknown-linux-musl"), None);
    }

    #[test]
    fn linker_overrides_cover_cargo_and_cc_rs_variables() {
        let keys = linker_override_keys("aarch64-unknown-linux-gnu");

        assert_eq!(keys[0], "CARGO_TARGET_AARCH64_UNKNOWN_LINUX_GNU_LINKER");
        assert_eq!(keys[1], "CC_aarch64_unknown_linux_gnu");
        assert_eq!(keys[2], "CC_aarch64-unknown-linux-gnu");
    }

    #[test]
    fn missing_tool_is_reported_as_unusable() {
        assert!(!tool_works("product-catalog-no-such-compiler"));
        assert!(!tool_works("   "));
    }

    #[test]
    fn workspace_config_links_lambda_target_with_cross_gcc() {
        let config = include_str!("../../.cargo/config.toml");
        assert!(config.contains("[target.aarch64-unknown-linux-gnu]"));
        assert!(config.contains("linker = \"aarch64-linux-gnu-gcc\""));
    }

    #[test]
    fn package_reports_missing_binary() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = package_lambda_zip(
            &dir.path().join("missing"),
            &dir.path().join("missing.zip"),
        )
        .expect_err("missing binary should fail");

        assert_eq!(error.kind(), io::ErrorKind::NotFound);
    }
}
