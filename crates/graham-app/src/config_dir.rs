// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware config file resolution.

use std::path::PathBuf;

use graham_core::config::ENV_CONFIG_PATH;

/// File name inside the per-user config directory.
const CONFIG_FILE: &str = "config.json";

/// Return the config file path.
///
/// `GRAHAM_BRIDGE_CONFIG` wins when set. Otherwise the file lives under a
/// `graham-bridge` directory in the conventional per-user location. Nothing
/// is created here: a missing file simply means defaults.
pub fn config_path<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(ENV_CONFIG_PATH) {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => config_base(&lookup).join("graham-bridge").join(CONFIG_FILE),
    }
}

fn config_base<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    // XDG first, then the Windows roaming profile, then home
    let set = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(xdg) = set("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg);
    }
    if let Some(appdata) = set("APPDATA") {
        return PathBuf::from(appdata);
    }
    if let Some(home) = set("HOME") {
        return PathBuf::from(home).join(".config");
    }
    // Last resort
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_owned())
        }
    }

    #[test]
    fn explicit_path_wins() {
        let path = config_path(env(&[
            (ENV_CONFIG_PATH, "/etc/graham/bridge.json"),
            ("XDG_CONFIG_HOME", "/xdg"),
        ]));
        assert_eq!(path, PathBuf::from("/etc/graham/bridge.json"));
    }

    #[test]
    fn xdg_config_home_is_preferred() {
        let path = config_path(env(&[("XDG_CONFIG_HOME", "/xdg"), ("HOME", "/home/u")]));
        assert_eq!(path, PathBuf::from("/xdg/graham-bridge/config.json"));
    }

    #[test]
    fn home_falls_back_to_dot_config() {
        let path = config_path(env(&[("HOME", "/home/u"), (ENV_CONFIG_PATH, "")]));
        assert_eq!(path, PathBuf::from("/home/u/.config/graham-bridge/config.json"));
    }

    #[test]
    fn nothing_set_uses_working_directory() {
        let path = config_path(env(&[]));
        assert_eq!(path, PathBuf::from("./graham-bridge/config.json"));
    }
}
