use color_eyre::eyre::{eyre, Result};
use tokio::process::Command;

/// Platform opener command for `url`.
fn opener(url: &str) -> (&'static str, Vec<&str>) {
    if cfg!(target_os = "macos") {
        ("open", vec![url])
    } else if cfg!(target_os = "windows") {
        ("cmd", vec!["/C", "start", "", url])
    } else {
        ("xdg-open", vec![url])
    }
}

/// Only http(s) links are handed to the system opener.
pub fn is_openable(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

pub async fn open_in_browser(url: &str) -> Result<()> {
    if !is_openable(url) {
        return Err(eyre!("Refusing to open non-http link: {url}"));
    }
    let (cmd, args) = opener(url);
    let status = Command::new(cmd)
        .args(&args)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await
        .map_err(|e| eyre!("Failed to open browser: {e}"))?;
    if !status.success() {
        return Err(eyre!("{cmd} exited with {status}"));
    }
    Ok(())
}
