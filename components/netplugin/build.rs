use std::process::Command;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Stamp the version banner with the commit and build time
    let commit = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let build_time = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    println!("cargo:rustc-env=NETPLUGIN_GIT_COMMIT={commit}");
    println!("cargo:rustc-env=NETPLUGIN_BUILD_TIME={build_time}");
    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}
