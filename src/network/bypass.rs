//! `no_proxy`-style bypass lists.

// self
use crate::_prelude::*;

/// Returns `true` when `url` should go through the proxy given a bypass list.
///
/// `*` bypasses everything and an empty list bypasses nothing. Entries are separated by commas,
/// semicolons or whitespace and may carry a `:port`. Entries beginning with `.` or `*` match host
/// suffixes; anything else must match the host exactly. URLs without a scheme or host are never
/// proxied.
pub fn should_use_proxy(url: &str, bypass: &str) -> bool {
	let bypass = bypass.trim();

	if bypass == "*" {
		return false;
	}
	if bypass.is_empty() {
		return true;
	}

	let Ok(parsed) = Url::parse(url) else {
		return false;
	};
	let Some(host) = parsed.host_str() else {
		return false;
	};
	let port = parsed.port_or_known_default().unwrap_or(0);

	bypass
		.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
		.filter(|entry| !entry.is_empty())
		.all(|entry| !bypasses(entry, host, port))
}

fn bypasses(entry: &str, host: &str, port: u16) -> bool {
	let (pattern, entry_port) = split_port(entry);

	if entry_port.is_some_and(|entry_port| entry_port != port) {
		return false;
	}

	let pattern = pattern.to_ascii_lowercase();

	if !pattern.starts_with(['.', '*']) {
		return host == pattern;
	}

	host.ends_with(pattern.strip_prefix('*').unwrap_or(&pattern))
}

fn split_port(entry: &str) -> (&str, Option<u16>) {
	match entry.rsplit_once(':') {
		Some((host, port))
			if !host.is_empty() && !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) =>
			(host, port.parse().ok()),
		_ => (entry, None),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn wildcard_and_empty_lists() {
		assert!(!should_use_proxy("https://api.test", "*"));
		assert!(should_use_proxy("https://api.test", ""));
		assert!(should_use_proxy("https://api.test", "   "));
	}

	#[test]
	fn exact_and_suffix_entries() {
		let bypass = "localhost, .internal.test;*.corp.example";

		assert!(!should_use_proxy("http://localhost:3000/x", bypass));
		assert!(!should_use_proxy("https://svc.internal.test", bypass));
		assert!(!should_use_proxy("https://a.b.corp.example", bypass));
		assert!(should_use_proxy("https://api.test", bypass));
		assert!(should_use_proxy("https://notlocalhost", bypass));
	}

	#[test]
	fn entry_ports_must_match() {
		assert!(!should_use_proxy("https://api.test/x", "api.test:443"));
		assert!(should_use_proxy("http://api.test/x", "api.test:443"));
		assert!(!should_use_proxy("http://api.test:8080/x", "api.test:8080"));
	}

	#[test]
	fn unparseable_targets_are_never_proxied() {
		assert!(!should_use_proxy("not a url", "localhost"));
	}
}
