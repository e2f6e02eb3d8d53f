//! Operating-system proxy discovery.

// std
use std::sync::LazyLock;
// crates.io
use regex::Regex;
// self
use crate::_prelude::*;

static SHELL_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r#"(?m)^\s*(?:export\s+)?(http_proxy|HTTP_PROXY|https_proxy|HTTPS_PROXY|no_proxy|NO_PROXY)\s*=\s*['"]?([^'"\n\s]+)['"]?\s*$"#,
	)
	.expect("Shell export pattern is valid.")
});

/// Proxy settings found in the environment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemProxy {
	/// Proxy for plain HTTP targets.
	pub http_proxy: Option<String>,
	/// Proxy for HTTPS targets.
	pub https_proxy: Option<String>,
	/// Bypass list.
	pub no_proxy: Option<String>,
}
impl SystemProxy {
	/// Reads `http_proxy`, `https_proxy`, `no_proxy` (lowercase first, then uppercase).
	pub fn from_env_map(env: &HashMap<String, String>) -> Self {
		let pick = |lower: &str, upper: &str| {
			env.get(lower)
				.or_else(|| env.get(upper))
				.filter(|value| !value.is_empty())
				.cloned()
		};

		Self {
			http_proxy: pick("http_proxy", "HTTP_PROXY"),
			https_proxy: pick("https_proxy", "HTTPS_PROXY"),
			no_proxy: pick("no_proxy", "NO_PROXY"),
		}
	}

	/// Reads proxy `export` lines from shell rc content.
	pub fn from_shell_rc(content: &str) -> Self {
		let env = SHELL_EXPORT
			.captures_iter(content)
			.map(|caps| (caps[1].to_owned(), caps[2].to_owned()))
			.collect();

		Self::from_env_map(&env)
	}

	/// Discovers proxy settings for the current user.
	///
	/// On macOS the login shell's rc file wins when it exports any proxy variable, since GUI
	/// processes there do not inherit shell exports. Everywhere else, and as the macOS fallback,
	/// the process environment is used.
	pub fn detect() -> Self {
		if cfg!(target_os = "macos") {
			let from_rc =
				read_shell_rc().map(|content| Self::from_shell_rc(&content)).unwrap_or_default();

			if !from_rc.is_empty() {
				return from_rc;
			}
		}

		Self::from_env_map(&std::env::vars().collect())
	}

	/// Returns `true` when nothing is configured.
	pub fn is_empty(&self) -> bool {
		self.http_proxy.is_none() && self.https_proxy.is_none() && self.no_proxy.is_none()
	}
}

fn read_shell_rc() -> Option<String> {
	let home = std::env::var_os("HOME").map(PathBuf::from)?;
	let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/bash".into());
	let shell_name = Path::new(&shell).file_name()?.to_string_lossy().into_owned();
	let rc = if shell_name.contains("zsh") {
		".zshrc".to_owned()
	} else if shell_name.contains("bash") {
		".bashrc".to_owned()
	} else {
		format!(".{shell_name}rc")
	};

	std::fs::read_to_string(home.join(rc)).ok()
}
