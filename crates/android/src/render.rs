//! Gradle Kotlin DSL rendering
//!
//! Emits the `android { … }` and `dependencies { … }` blocks of a
//! `build.gradle.kts` for a resolved [`BuildVariantConfig`]. Output order is
//! fixed, so rendering the same descriptor twice yields identical text.

use crate::dependency::DependencyScope;
use crate::model::BuildVariantConfig;
use crate::signing::{SigningConfig, DEBUG_IDENTITY, RELEASE_VARIANT};

const INDENT: &str = "    ";

/// Line buffer with block nesting
#[derive(Default)]
struct Script {
    lines: Vec<String>,
    depth: usize,
}

impl Script {
    fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{}", INDENT.repeat(self.depth), text));
        }
    }

    fn open(&mut self, header: impl AsRef<str>) {
        self.line(format!("{} {{", header.as_ref()));
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

/// Kotlin string literal
fn quoted(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$");
    format!("\"{escaped}\"")
}

/// `file(...)` for a keystore path. A leading `~` resolves to the home
/// directory of the machine running Gradle, never the one rendering.
fn store_file(path: &str) -> String {
    const HOME: &str = "System.getProperty(\"user.home\")";
    match path.strip_prefix('~') {
        Some("") => format!("file({HOME})"),
        Some(rest) if rest.starts_with('/') => format!("file({HOME} + {})", quoted(rest)),
        _ => format!("file({})", quoted(path)),
    }
}

/// Render the descriptor as `build.gradle.kts` blocks.
pub fn gradle_kts(config: &BuildVariantConfig) -> String {
    let mut script = Script::default();
    let sdk = config.sdk();

    script.open("android");
    script.line(format!("namespace = {}", quoted(config.namespace())));
    script.line(format!("compileSdk = {}", sdk.compile));
    if let Some(ndk) = config.ndk_version() {
        script.line(format!("ndkVersion = {}", quoted(ndk)));
    }

    script.line("");
    script.open("compileOptions");
    if config.core_library_desugaring_enabled() {
        script.line("isCoreLibraryDesugaringEnabled = true");
    }
    script.line(format!(
        "sourceCompatibility = {}",
        config.source_language_level().gradle_constant()
    ));
    script.line(format!(
        "targetCompatibility = {}",
        config.target_language_level().gradle_constant()
    ));
    script.close();

    script.line("");
    script.open("kotlinOptions");
    script.line(format!("jvmTarget = {}", quoted(config.kotlin_jvm_target().as_str())));
    script.close();

    script.line("");
    script.open("defaultConfig");
    script.line(format!("applicationId = {}", quoted(config.application_id())));
    script.line(format!("minSdk = {}", sdk.min));
    script.line(format!("targetSdk = {}", sdk.target));
    script.line(format!("versionCode = {}", config.version_code()));
    script.line(format!("versionName = {}", quoted(config.version_name())));
    if config.multi_dex_enabled() {
        script.line("multiDexEnabled = true");
    }
    script.close();

    render_signing_configs(&mut script, config);
    render_build_types(&mut script, config);
    script.close();

    render_dependencies(&mut script, config);
    script.finish()
}

fn render_signing_configs(script: &mut Script, config: &BuildVariantConfig) {
    let custom: Vec<(&String, &SigningConfig)> = config
        .signing_configs()
        .iter()
        .filter(|(name, signing)| {
            name.as_str() != DEBUG_IDENTITY || **signing != SigningConfig::debug()
        })
        .collect();
    if custom.is_empty() {
        return;
    }

    script.line("");
    script.open("signingConfigs");
    for (name, signing) in custom {
        if name == DEBUG_IDENTITY {
            script.open(format!("getByName({})", quoted(name)));
        } else {
            script.open(format!("create({})", quoted(name)));
        }
        if let Some(path) = &signing.store_file {
            script.line(format!("storeFile = {}", store_file(path)));
        }
        if let Some(alias) = &signing.key_alias {
            script.line(format!("keyAlias = {}", quoted(alias)));
        }
        if let Some(env) = &signing.store_password_env {
            script.line(format!("storePassword = System.getenv({})", quoted(env)));
        }
        if let Some(env) = &signing.key_password_env {
            script.line(format!("keyPassword = System.getenv({})", quoted(env)));
        }
        script.close();
    }
    script.close();
}

fn render_build_types(script: &mut Script, config: &BuildVariantConfig) {
    script.line("");
    script.open("buildTypes");
    for (name, variant) in config.build_variants() {
        if name == DEBUG_IDENTITY || name == RELEASE_VARIANT {
            script.open(format!("getByName({})", quoted(name)));
        } else {
            script.open(format!("create({})", quoted(name)));
        }
        if let Some(identity) = &variant.signing_identity {
            script.line(format!(
                "signingConfig = signingConfigs.getByName({})",
                quoted(identity)
            ));
        }
        script.line(format!("isMinifyEnabled = {}", variant.minify_enabled));
        script.line(format!("isDebuggable = {}", variant.debuggable));
        script.close();
    }
    script.close();
}

fn render_dependencies(script: &mut Script, config: &BuildVariantConfig) {
    let mut pins: Vec<_> = config.dependency_pins().iter().collect();
    if pins.is_empty() {
        return;
    }
    pins.sort_by(|(a, pa), (b, pb)| pa.scope.cmp(&pb.scope).then_with(|| a.cmp(b)));

    script.line("");
    script.open("dependencies");
    for (coordinate, pin) in pins {
        let notation = quoted(&format!("{coordinate}:{}", pin.version));
        match pin.scope {
            DependencyScope::CoreLibraryDesugaring => {
                script.line(format!("coreLibraryDesugaring({notation})"));
            }
            DependencyScope::Platform => {
                script.line(format!("implementation(platform({notation}))"));
            }
            DependencyScope::Implementation => {
                script.line(format!("implementation({notation})"));
            }
        }
    }
    script.close();
}
