//! Engine defaults from flag-style rc files.
//!
//! A global file in the platform config dir and a local `.notemarkrc`
//! override hold the same `--flag value` tokens a host may also pass in
//! directly. Later sources win for options; booleans OR together.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::document::{DEFAULT_CACHE_TTL, DEFAULT_MAX_CACHE_SIZE, RenderOptions};
use crate::highlight::ThemePreference;

/// Indent inserted by Tab when none is configured.
pub const DEFAULT_INDENT_WIDTH: usize = 2;

const DEBUG_LOG_ENV: &str = "NOTEMARK_RENDER_DEBUG_LOG";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub cache_size: Option<usize>,
    /// Cache entry lifetime in seconds.
    pub cache_ttl: Option<u64>,
    pub indent: Option<usize>,
    pub theme: Option<ThemePreference>,
    pub keep_frontmatter: bool,
    pub perf: bool,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            cache_size: other.cache_size.or(self.cache_size),
            cache_ttl: other.cache_ttl.or(self.cache_ttl),
            indent: other.indent.or(self.indent),
            theme: other.theme.or(self.theme),
            keep_frontmatter: self.keep_frontmatter || other.keep_frontmatter,
            perf: self.perf || other.perf,
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }

    /// Renderer settings, with defaults for anything unset.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            max_cache_size: self.cache_size.unwrap_or(DEFAULT_MAX_CACHE_SIZE),
            cache_ttl: self
                .cache_ttl
                .map_or(DEFAULT_CACHE_TTL, Duration::from_secs),
            strip_frontmatter: !self.keep_frontmatter,
            theme: self.theme.unwrap_or_default(),
        }
    }

    pub fn indent_width(&self) -> usize {
        self.indent.unwrap_or(DEFAULT_INDENT_WIDTH)
    }

    /// Turn on perf logging and the render debug log as configured.
    ///
    /// The debug log path falls back to `NOTEMARK_RENDER_DEBUG_LOG`.
    ///
    /// # Errors
    ///
    /// Returns an error if the debug log file cannot be created.
    pub fn apply_instrumentation(&self) -> Result<()> {
        crate::perf::set_enabled(self.perf);
        let path = self
            .render_debug_log
            .clone()
            .or_else(|| std::env::var_os(DEBUG_LOG_ENV).map(PathBuf::from));
        crate::perf::set_debug_log_path(path.as_deref()).with_context(|| {
            format!(
                "Failed to initialize render debug log {}",
                path.as_ref()
                    .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string())
            )
        })
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("notemark").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("notemark")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("notemark").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("notemark")
                .join("config");
        }
    }

    PathBuf::from(".notemarkrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".notemarkrc")
}

/// Global file, then local override, then `overrides`.
///
/// # Errors
///
/// Returns an error if an existing config file cannot be read.
pub fn load_effective(overrides: &ConfigFlags) -> Result<ConfigFlags> {
    let global = load_config_flags(&global_config_path())?;
    let local = load_config_flags(&local_override_path())?;
    Ok(global.union(&local).union(overrides))
}

/// Read flags from `path`; a missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# notemark defaults".to_string());
    if let Some(size) = flags.cache_size {
        lines.push(format!("--cache-size {size}"));
    }
    if let Some(ttl) = flags.cache_ttl {
        lines.push(format!("--cache-ttl {ttl}"));
    }
    if let Some(indent) = flags.indent {
        lines.push(format!("--indent {indent}"));
    }
    if let Some(theme) = flags.theme {
        let theme_str = match theme {
            ThemePreference::Auto => "auto",
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
        };
        lines.push(format!("--theme {theme_str}"));
    }
    if flags.keep_frontmatter {
        lines.push("--keep-frontmatter".to_string());
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Parse `--flag value` / `--flag=value` tokens; unknown tokens are skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };

        match name {
            "--keep-frontmatter" => flags.keep_frontmatter = true,
            "--perf" => flags.perf = true,
            "--cache-size" | "--cache-ttl" | "--indent" | "--theme" | "--render-debug-log" => {
                let value = match inline_value {
                    Some(value) => Some(value),
                    None => {
                        let next = tokens.get(i + 1).map(String::as_str);
                        if next.is_some() {
                            i += 1;
                        }
                        next
                    }
                };
                if let Some(value) = value {
                    apply_option(&mut flags, name, value);
                }
            }
            _ => {}
        }
        i += 1;
    }
    flags
}

fn apply_option(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--cache-size" => flags.cache_size = parse_number(name, value),
        "--cache-ttl" => flags.cache_ttl = parse_number(name, value),
        "--indent" => flags.indent = parse_number(name, value),
        "--theme" => {
            flags.theme = ThemePreference::parse(value);
            if flags.theme.is_none() {
                tracing::warn!(value, "unknown theme in config");
            }
        }
        "--render-debug-log" => flags.render_debug_log = Some(PathBuf::from(value)),
        _ => {}
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Option<T> {
    let parsed = value.parse().ok();
    if parsed.is_none() {
        tracing::warn!(flag = name, value, "ignoring invalid number in config");
    }
    parsed
}
