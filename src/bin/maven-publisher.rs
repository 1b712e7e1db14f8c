//! Maven Publisher CLI
//!
//! Builds, signs and publishes a Java library in Maven layout

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use maven_publisher::build::{BuildLayout, PomGenerator};
use maven_publisher::core::{
    ArtifactSigner, ConfigLoadOptions, ConfigLoader, ConfigOverrides, CredentialsConfig,
    FormatMode, PipelineStateMachine, PublishConfig, PublishError, SigningConfig,
    CONFIG_FILENAME,
};
use maven_publisher::security::{secret_env_names, write_private_file};
use maven_publisher::{
    HttpTransport, PgpSigner, PipelineOptions, PublishReport, ReleasePipeline,
    SecureCredentialManager,
};
use secrecy::ExposeSecret;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, OnceLock};
use tracing_subscriber::EnvFilter;

const STARTER_CONFIG: &str = include_str!("../../.publish-config.example.yaml");

/// Credential variables named by the loaded configuration
static SECRET_NAMES: OnceLock<Vec<String>> = OnceLock::new();

/// Build, sign and publish Java libraries to Maven repositories
#[derive(Parser)]
#[command(name = "maven-publisher")]
#[command(version)]
#[command(about = "Build, sign and publish Java libraries to Maven repositories", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, sign and upload the library
    Publish {
        /// Project path (defaults to current directory)
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        /// Build and sign, then print the upload plan without uploading
        #[arg(long)]
        dry_run: bool,

        /// Skip source formatting
        #[arg(long)]
        skip_format: bool,

        /// Fail instead of reformatting sources
        #[arg(long)]
        check_format: bool,

        /// Do not sign (dry runs and snapshot versions only)
        #[arg(long)]
        skip_signing: bool,

        /// Override the project version
        #[arg(long = "set-version", value_name = "VERSION")]
        version: Option<String>,
    },

    /// Build the archives and POM without signing or uploading
    Package {
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        #[arg(long)]
        skip_format: bool,

        #[arg(long)]
        check_format: bool,

        #[arg(long = "set-version", value_name = "VERSION")]
        version: Option<String>,
    },

    /// Check whether the project is ready to publish
    Check {
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        #[arg(long = "set-version", value_name = "VERSION")]
        version: Option<String>,
    },

    /// Show the repository endpoint the version is published to
    Target {
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        #[arg(long = "set-version", value_name = "VERSION")]
        version: Option<String>,
    },

    /// Write the POM descriptor
    Pom {
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        /// Print the POM instead of writing it
        #[arg(long)]
        stdout: bool,
    },

    /// Generate a new passphrase-protected OpenPGP signing key
    Keygen {
        /// File the armored secret key is written to (mode 0600)
        #[arg(short, long, default_value = "signing-key.asc")]
        output: PathBuf,

        /// User id bound to the key, e.g. "DeepL SE <open-source@deepl.com>"
        #[arg(long, default_value = "maven-publisher")]
        user_id: String,

        /// Environment variable holding the passphrase
        #[arg(long, default_value = "SIGNING_PASSWORD")]
        passphrase_env: String,

        /// Overwrite an existing key file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the state of the last pipeline run
    Status {
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,
    },

    /// Create a starter configuration file
    Init {
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", masked(&e.to_string()));
            if let Some(publish_error) = e.downcast_ref::<PublishError>() {
                let actions = publish_error.suggested_actions();
                if !actions.is_empty() {
                    eprintln!("\n💡 対処方法:");
                    for action in actions {
                        eprintln!("  - {}", action);
                    }
                }
                if publish_error.leaves_artifacts() {
                    eprintln!("\n📦 ビルド済みのアーティファクトは build/libs に残っています");
                }
            }
            process::exit(1);
        }
    }
}

/// Hide credential values that may have leaked into an error message
fn masked(message: &str) -> String {
    let mut names = secret_env_names(&CredentialsConfig::default(), &SigningConfig::default());
    if let Some(configured) = SECRET_NAMES.get() {
        names.extend(configured.iter().cloned());
    }
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    SecureCredentialManager::from_env().mask_secrets_in_string(message, &names)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Publish {
            project_path,
            dry_run,
            skip_format,
            check_format,
            skip_signing,
            version,
        } => {
            let options = PipelineOptions {
                dry_run,
                package_only: false,
                skip_format,
                check_format,
                skip_signing,
            };
            pipeline_command(project_path, version, check_format, options).await
        }
        Commands::Package {
            project_path,
            skip_format,
            check_format,
            version,
        } => {
            let options = PipelineOptions {
                package_only: true,
                skip_format,
                check_format,
                ..PipelineOptions::default()
            };
            pipeline_command(project_path, version, check_format, options).await
        }
        Commands::Check {
            project_path,
            version,
        } => check_command(project_path, version).await,
        Commands::Target {
            project_path,
            version,
        } => target_command(project_path, version).await,
        Commands::Pom {
            project_path,
            stdout,
        } => pom_command(project_path, stdout).await,
        Commands::Keygen {
            output,
            user_id,
            passphrase_env,
            force,
        } => keygen_command(output, user_id, passphrase_env, force),
        Commands::Status { project_path } => status_command(project_path).await,
        Commands::Init {
            project_path,
            force,
        } => init_command(project_path, force).await,
    }
}

fn project_dir(project_path: Option<PathBuf>) -> PathBuf {
    project_path.unwrap_or_else(|| PathBuf::from("."))
}

async fn load_config(
    project_path: &Path,
    version: Option<String>,
    check_format: bool,
) -> Result<PublishConfig> {
    let overrides = ConfigOverrides {
        version,
        format_mode: check_format.then_some(FormatMode::Check),
    };
    let config = ConfigLoader::load(ConfigLoadOptions::from_env(project_path, overrides)).await?;
    let _ = SECRET_NAMES.set(secret_env_names(
        &config.publishing.credentials,
        &config.signing,
    ));
    Ok(config)
}

fn pipeline(project_path: &Path, config: PublishConfig) -> Result<ReleasePipeline> {
    let transport = Arc::new(HttpTransport::new()?);
    Ok(ReleasePipeline::new(
        project_path,
        config,
        transport,
        SecureCredentialManager::from_env(),
    ))
}

async fn pipeline_command(
    project_path: Option<PathBuf>,
    version: Option<String>,
    check_format: bool,
    options: PipelineOptions,
) -> Result<i32> {
    let project_path = project_dir(project_path);
    println!("\n📦 maven-publisher\n");

    let config = load_config(&project_path, version, check_format).await?;
    let mut pipeline = pipeline(&project_path, config)?;
    let report = pipeline.run(&options).await?;

    print_report(&report, options.package_only);
    Ok(0)
}

fn print_report(report: &PublishReport, package_only: bool) {
    if !report.warnings.is_empty() {
        println!("⚠️  Warnings:");
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
        println!();
    }

    let seconds = report.duration_ms as f64 / 1000.0;
    if package_only {
        println!(
            "✅ {} を {} 個のファイルにパッケージしました ({:.1}s)",
            report.coordinates,
            report.files.len(),
            seconds
        );
    } else if report.dry_run {
        println!(
            "✅ ドライラン完了: {} → {} ({} 件のアップロード予定, {:.1}s)",
            report.coordinates,
            report.target_url,
            report.uploaded.len(),
            seconds
        );
    } else {
        println!(
            "✅ {} を {} リポジトリに公開しました ({} 件, {:.1}s)",
            report.coordinates,
            report.channel,
            report.uploaded.len(),
            seconds
        );
    }
}

async fn check_command(project_path: Option<PathBuf>, version: Option<String>) -> Result<i32> {
    let project_path = project_dir(project_path);
    println!("\n🔍 Publication Check\n");

    let config = load_config(&project_path, version, false).await?;
    let validation = ConfigLoader::validate(&config);
    if !validation.errors.is_empty() || !validation.warnings.is_empty() {
        println!("{}\n", ConfigLoader::format_validation_result(&validation));
    }

    let pipeline = pipeline(&project_path, config)?;
    let target = pipeline.target();
    println!("📦 {}", pipeline.coordinates());
    println!("🎯 {} ({}): {}", target.repository_name, target.channel, target.url);
    let formatting = &pipeline.config().formatting;
    if formatting.enabled {
        println!(
            "🎨 {} {} ({:?})",
            formatting.tool,
            formatting.tool_version.as_deref().unwrap_or(""),
            formatting.mode
        );
    }
    println!();

    match pipeline.preflight(&PipelineOptions::default()) {
        Ok(warnings) => {
            println!("  ✅ Validation successful");
            if !warnings.is_empty() {
                println!("  ⚠️  Warnings:");
                for warning in &warnings {
                    println!("    - {}", warning);
                }
            }
            println!();
            Ok(0)
        }
        Err(e) => {
            println!("  ❌ {}", e);
            for action in e.suggested_actions() {
                println!("    - {}", action);
            }
            println!();
            Ok(1)
        }
    }
}

async fn target_command(project_path: Option<PathBuf>, version: Option<String>) -> Result<i32> {
    let project_path = project_dir(project_path);
    let config = load_config(&project_path, version, false).await?;
    let pipeline = pipeline(&project_path, config)?;
    let target = pipeline.target();

    println!("{} {} {}", pipeline.coordinates().version, target.channel, target.url);
    Ok(0)
}

async fn pom_command(project_path: Option<PathBuf>, stdout: bool) -> Result<i32> {
    let project_path = project_dir(project_path);
    let config = load_config(&project_path, None, false).await?;
    let generator = PomGenerator::new(&config);

    if stdout {
        print!("{}", generator.generate()?);
    } else {
        let layout = BuildLayout::new(&project_path, &config);
        let path = generator.write(&layout.publications_dir())?;
        println!("✅ {}", path.display());
    }
    Ok(0)
}

fn keygen_command(
    output: PathBuf,
    user_id: String,
    passphrase_env: String,
    force: bool,
) -> Result<i32> {
    if output.exists() && !force {
        eprintln!(
            "⚠️  {} は既に存在します（上書きするには --force を指定してください）",
            output.display()
        );
        return Ok(1);
    }

    let passphrase = SecureCredentialManager::from_env()
        .get_secret(&passphrase_env)
        .ok_or(PublishError::SigningKeyMissing {
            variable: passphrase_env.clone(),
        })?;

    let (signer, armored) = PgpSigner::generate(&user_id, passphrase.expose_secret())?;
    write_private_file(&output, &armored)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("🔑 署名鍵を作成しました: {}", output.display());
    println!("   User-Id: {}", user_id);
    println!("   Key-Id:  {}\n", signer.key_id());
    println!("{}", signer.export_public_key()?);
    println!("鍵ファイルの内容を環境変数 SIGNING_KEY に設定してください");
    Ok(0)
}

async fn status_command(project_path: Option<PathBuf>) -> Result<i32> {
    let project_path = project_dir(project_path);
    let mut state_machine = PipelineStateMachine::new(&project_path);

    if !state_machine.restore().await? {
        println!("実行履歴がありません");
        return Ok(0);
    }

    let data = state_machine.get_state_data();
    println!("\n📋 Pipeline Status\n");
    println!("  State:      {}", data.current_state);
    if let Some(version) = &data.version {
        println!("  Version:    {}", version);
    }
    if let Some(repository) = &data.repository {
        println!("  Repository: {}", repository);
    }
    if let Some(error) = state_machine.get_last_error() {
        println!("  Error:      {}", error);
    }
    println!("  Elapsed:    {}ms\n", state_machine.get_elapsed_time());
    println!("{}\n", state_machine.get_history());
    Ok(0)
}

async fn init_command(project_path: Option<PathBuf>, force: bool) -> Result<i32> {
    let project_path = project_dir(project_path);
    let config_path = project_path.join(CONFIG_FILENAME);
    println!("\n🎯 Initialize maven-publisher\n");

    if config_path.exists() && !force {
        eprintln!(
            "⚠️  {} は既に存在します（上書きするには --force を指定してください）",
            config_path.display()
        );
        return Ok(1);
    }

    // the starter must parse with the current schema
    ConfigLoader::from_yaml(STARTER_CONFIG)?;
    tokio::fs::write(&config_path, STARTER_CONFIG)
        .await
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    println!("✅ {} を作成しました", config_path.display());
    println!("   project と pom セクションを編集してから maven-publisher check を実行してください\n");
    Ok(0)
}
