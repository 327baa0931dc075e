fn main() {
    // Embed UTC build timestamp; reported by `/health` in serve mode.
    let now = time_now_utc();
    println!("cargo:rustc-env=LFSGW_BUILD_TIME={now}");
}

/// Minimal UTC timestamp without pulling in chrono for the build script.
fn time_now_utc() -> String {
    use std::process::Command;
    // Minimal cross-compile images may not ship `date`.
    match Command::new("date").args(["-u", "+%Y-%m-%dT%H:%M:%SZ"]).output() {
        Ok(output) => String::from_utf8_lossy(&output.stdout).trim().to_string(),
        Err(_) => "unknown".to_string(),
    }
}
