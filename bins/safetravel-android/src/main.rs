//! SafeTravel Android CLI
//!
//! Resolves, checks and renders Android build-variant declarations for the
//! SafeTravel Flutter app.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use safetravel_android::render::gradle_kts;
use safetravel_android::{
    resolve, Declarations, DefaultProvider, FlutterDefaults, Resolution, ResolveOptions,
};
use safetravel_cli::output::{format_count, print_warnings, Status};
use safetravel_core::config::Config;
use safetravel_core::error::{exit_codes, Error};
use safetravel_telemetry::{Event, TelemetryConfig, Timer};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "safetravel-android")]
#[command(about = "Resolve Android build variants for the SafeTravel Flutter app")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Android project directory (holds local.properties)
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve declarations and print the build descriptor
    Resolve {
        /// Declarations file (TOML or JSON)
        file: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Show a single build variant
        #[arg(long)]
        variant: Option<String>,
    },

    /// Validate declarations without printing the descriptor
    Check {
        /// Declarations file (TOML or JSON)
        file: Option<PathBuf>,
    },

    /// Render the descriptor as build.gradle.kts blocks
    Render {
        /// Declarations file (TOML or JSON)
        file: Option<PathBuf>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the toolchain defaults in effect
    Defaults {
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Settings shared by every command
struct Context {
    config: Config,
    project_dir: PathBuf,
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => std::process::exit(report(&e)),
    };

    safetravel_telemetry::init_with_config(TelemetryConfig {
        log_level: safetravel_telemetry::level_for_verbosity(
            &config.schema.logging.level,
            cli.verbose,
            cli.quiet,
        ),
        json: config.schema.logging.json,
        ..TelemetryConfig::default()
    })?;

    if !cli.quiet {
        print_warnings(&config.warnings);
    }
    if let Some(path) = &config.path {
        tracing::debug!(path = %path.display(), "Loaded config");
    }

    let ctx = Context {
        project_dir: cli
            .project_dir
            .unwrap_or_else(|| PathBuf::from(&config.schema.general.project_dir)),
        quiet: cli.quiet,
        config,
    };

    let exit_code = match cli.command {
        Commands::Resolve {
            file,
            format,
            variant,
        } => run_resolve(&ctx, file.as_deref(), format, variant.as_deref()),
        Commands::Check { file } => run_check(&ctx, file.as_deref()),
        Commands::Render { file, output } => run_render(&ctx, file.as_deref(), output.as_deref()),
        Commands::Defaults { format } => run_defaults(&ctx, format),
    };

    std::process::exit(exit_code);
}

/// Print an error and map it to an exit code
fn report(err: &Error) -> i32 {
    Status::error(&err.to_string());
    err.exit_code()
}

/// Like [`report`], but emits the serialised error report on stdout for `--format json`
fn report_as(err: &Error, format: Format) -> i32 {
    if format == Format::Text {
        return report(err);
    }
    match serde_json::to_string_pretty(&err.to_report()) {
        Ok(json) => println!("{json}"),
        Err(_) => Status::error(&err.to_string()),
    }
    err.exit_code()
}

fn load_defaults(ctx: &Context) -> std::result::Result<FlutterDefaults, i32> {
    let defaults = FlutterDefaults::from_local_properties(&ctx.project_dir.join("local.properties"))
        .map_err(|e| report(&e))?;

    Ok(match &ctx.config.schema.general.application_id {
        Some(application_id) => defaults.with_application_id(application_id.as_str()),
        None => defaults,
    })
}

/// Load, resolve and gate on `warnings_as_errors`.
fn resolve_declarations(
    ctx: &Context,
    file: Option<&Path>,
    format: Format,
) -> std::result::Result<Resolution, i32> {
    let path = file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&ctx.config.schema.general.declarations));

    let declarations = Declarations::from_path(&path).map_err(|e| report_as(&e, format))?;
    let defaults = load_defaults(ctx)?;
    let options = ResolveOptions::from(&ctx.config.schema.resolve);

    let timer = Timer::start("resolve");
    let result = resolve(&declarations, &defaults, &options);
    timer.stop();

    let resolution = match result {
        Ok(resolution) => resolution,
        Err(err) => {
            Event::new(
                "resolution.failed",
                serde_json::json!({
                    "declarations": path.display().to_string(),
                    "code": err.code() as u32,
                    "field": err.field(),
                }),
            )
            .log();
            return Err(report_as(&Error::from(err), format));
        }
    };

    Event::new(
        "resolution.completed",
        serde_json::json!({
            "declarations": path.display().to_string(),
            "applicationId": resolution.config.application_id(),
            "warnings": resolution.warnings.len(),
        }),
    )
    .log();

    if !ctx.quiet || ctx.config.schema.resolve.warnings_as_errors {
        print_warnings(&resolution.warnings);
    }
    if ctx.config.schema.resolve.warnings_as_errors && resolution.has_warnings() {
        Status::error(&format!(
            "{} raised and warnings_as_errors is set",
            format_count(resolution.warnings.len(), "warning", "warnings")
        ));
        return Err(exit_codes::VALIDATION_ERROR);
    }

    Ok(resolution)
}

fn run_resolve(ctx: &Context, file: Option<&Path>, format: Format, variant: Option<&str>) -> i32 {
    let resolution = match resolve_declarations(ctx, file, format) {
        Ok(resolution) => resolution,
        Err(code) => return code,
    };
    let config = &resolution.config;

    if let Some(name) = variant {
        let Some(resolved) = config.variant(name) else {
            let known: Vec<&str> = config.build_variants().keys().map(String::as_str).collect();
            Status::error(&format!(
                "Unknown variant '{}' (known: {})",
                name,
                known.join(", ")
            ));
            return exit_codes::FAILURE;
        };
        let signing = config.signing_config_for(name);

        match format {
            Format::Json => {
                let value = serde_json::json!({
                    "variant": resolved,
                    "signingConfig": signing.map(|(_, signing)| signing),
                });
                return print_json(&value);
            }
            Format::Text => {
                Status::header(&format!("Variant {name}"));
                Status::field(
                    "signingIdentity",
                    signing.map_or("unsigned", |(identity, _)| identity),
                );
                if let Some((_, signing)) = signing {
                    if let Some(store) = signing.expanded_store_file() {
                        Status::field("storeFile", &store);
                    }
                    if let Some(alias) = &signing.key_alias {
                        Status::field("keyAlias", alias);
                    }
                }
                Status::field("minifyEnabled", &resolved.minify_enabled.to_string());
                Status::field("debuggable", &resolved.debuggable.to_string());
                return exit_codes::SUCCESS;
            }
        }
    }

    match format {
        Format::Json => print_json(&resolution),
        Format::Text => {
            let sdk = config.sdk();
            Status::header("Build descriptor");
            Status::field("namespace", config.namespace());
            Status::field("applicationId", config.application_id());
            Status::field("compileSdkVersion", &sdk.compile.to_string());
            Status::field("targetSdkVersion", &sdk.target.to_string());
            Status::field("minSdkVersion", &sdk.min.to_string());
            if let Some(ndk) = config.ndk_version() {
                Status::field("ndkVersion", ndk);
            }
            Status::field(
                "version",
                &format!("{} ({})", config.version_name(), config.version_code()),
            );
            Status::field("languageLevel", config.target_language_level().as_str());
            Status::field("kotlinJvmTarget", config.kotlin_jvm_target().as_str());
            Status::field("multiDexEnabled", &config.multi_dex_enabled().to_string());
            Status::field(
                "coreLibraryDesugaringEnabled",
                &config.core_library_desugaring_enabled().to_string(),
            );

            Status::header("Dependencies");
            for (coordinate, pin) in config.dependency_pins() {
                let suffix = if pin.injected { " (injected)" } else { "" };
                Status::field(&coordinate.to_string(), &format!("{}{}", pin.version, suffix));
            }

            Status::header("Variants");
            for (name, variant) in config.build_variants() {
                Status::field(
                    name,
                    variant.signing_identity.as_deref().unwrap_or("unsigned"),
                );
            }
            exit_codes::SUCCESS
        }
    }
}

fn run_check(ctx: &Context, file: Option<&Path>) -> i32 {
    match resolve_declarations(ctx, file, Format::Text) {
        Ok(resolution) => {
            if !ctx.quiet {
                Status::success(&format!(
                    "Declarations valid ({})",
                    format_count(resolution.warnings.len(), "warning", "warnings")
                ));
            }
            exit_codes::SUCCESS
        }
        Err(code) => code,
    }
}

fn run_render(ctx: &Context, file: Option<&Path>, output: Option<&Path>) -> i32 {
    let resolution = match resolve_declarations(ctx, file, Format::Text) {
        Ok(resolution) => resolution,
        Err(code) => return code,
    };
    let script = gradle_kts(&resolution.config);

    match output {
        Some(path) => match std::fs::write(path, &script) {
            Ok(()) => {
                if !ctx.quiet {
                    Status::success(&format!("Wrote {}", path.display()));
                }
                exit_codes::SUCCESS
            }
            Err(e) => report(
                &Error::from(e).with_context(format!("While writing {}", path.display())),
            ),
        },
        None => {
            print!("{script}");
            exit_codes::SUCCESS
        }
    }
}

fn run_defaults(ctx: &Context, format: Format) -> i32 {
    let defaults = match load_defaults(ctx) {
        Ok(defaults) => defaults,
        Err(code) => return code,
    };

    match format {
        Format::Json => print_json(&serde_json::json!({
            "provider": defaults.name(),
            "applicationId": defaults.application_id(),
            "compileSdkVersion": defaults.compile_sdk_version(),
            "targetSdkVersion": defaults.target_sdk_version(),
            "minSdkVersion": defaults.min_sdk_version(),
            "ndkVersion": defaults.ndk_version(),
            "versionCode": defaults.version_code(),
            "versionName": defaults.version_name(),
            "languageLevel": defaults.language_level().map(|level| level.as_str()),
        })),
        Format::Text => {
            let unset = || "-".to_string();
            Status::header(&format!("Defaults ({})", defaults.name()));
            Status::field("applicationId", &defaults.application_id().unwrap_or_else(unset));
            Status::field(
                "compileSdkVersion",
                &defaults.compile_sdk_version().map_or_else(unset, |v| v.to_string()),
            );
            Status::field(
                "targetSdkVersion",
                &defaults.target_sdk_version().map_or_else(unset, |v| v.to_string()),
            );
            Status::field(
                "minSdkVersion",
                &defaults.min_sdk_version().map_or_else(unset, |v| v.to_string()),
            );
            Status::field("ndkVersion", &defaults.ndk_version().unwrap_or_else(unset));
            Status::field(
                "versionCode",
                &defaults.version_code().map_or_else(unset, |v| v.to_string()),
            );
            Status::field("versionName", &defaults.version_name().unwrap_or_else(unset));
            Status::field(
                "languageLevel",
                defaults.language_level().map_or("-", |level| level.as_str()),
            );
            exit_codes::SUCCESS
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            exit_codes::SUCCESS
        }
        Err(e) => report(&Error::from(e)),
    }
}
