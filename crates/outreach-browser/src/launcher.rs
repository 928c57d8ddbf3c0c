use crate::{Error, Result};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

/// A plausible desktop user agent; Chrome under automation otherwise
/// advertises its headless build.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36";

/// Manages the Chrome process lifecycle.
pub struct ChromeLauncher {
    chrome_path: PathBuf,
    profile_path: PathBuf,
    headless: bool,
    debugging_port: u16,
}

impl ChromeLauncher {
    pub fn new(chrome_path: PathBuf, profile_path: PathBuf, headless: bool) -> Self {
        Self {
            chrome_path,
            profile_path,
            headless,
            debugging_port: 9222,
        }
    }

    /// Launch the Chrome process with the remote debugging port open.
    pub fn launch(&self) -> Result<Child> {
        let args = self.build_args();
        tracing::debug!("Launching Chrome: {} {}", self.chrome_path.display(), args.join(" "));

        Command::new(&self.chrome_path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Browser(format!("Failed to launch Chrome: {}", e)))
    }

    /// Chrome command-line arguments, including the flags that keep the
    /// automated session from announcing itself.
    fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.debugging_port),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            format!("--user-data-dir={}", self.profile_path.display()),
            // Keep the session looking like a normal browser.
            "--disable-blink-features=AutomationControlled".to_string(),
            format!("--user-agent={}", USER_AGENT),
            "--disable-notifications".to_string(),
            "--start-maximized".to_string(),
            // Quieter process.
            "--disable-gpu".to_string(),
            "--disable-extensions".to_string(),
            "--log-level=3".to_string(),
        ];

        if self.headless {
            args.push("--headless=new".to_string());
        }

        args.push("about:blank".to_string());
        args
    }

    pub fn debugging_port(&self) -> u16 {
        self.debugging_port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launcher(headless: bool) -> ChromeLauncher {
        ChromeLauncher::new(
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/tmp/profile"),
            headless,
        )
    }

    #[test]
    fn test_args_include_debugging_and_profile() {
        let args = launcher(false).build_args();

        assert!(args.contains(&"--remote-debugging-port=9222".to_string()));
        assert!(args.iter().any(|a| a.starts_with("--user-data-dir=")));
        assert!(args.contains(&"about:blank".to_string()));
    }

    #[test]
    fn test_args_mask_automation() {
        let args = launcher(false).build_args();

        assert!(args.contains(&"--disable-blink-features=AutomationControlled".to_string()));
        assert!(args.iter().any(|a| a.starts_with("--user-agent=")));
        assert!(!args.contains(&"--headless=new".to_string()));
    }

    #[test]
    fn test_headless_flag() {
        let args = launcher(true).build_args();
        assert!(args.contains(&"--headless=new".to_string()));
    }
}
