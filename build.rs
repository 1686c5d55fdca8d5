// build.rs

use std::env;

fn main() -> anyhow::Result<()> {
    let espidf = env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "espidf");

    // Necessary because of this issue: https://github.com/rust-lang/cargo/issues/9641
    // see also https://github.com/rust-lang/cargo/issues/9554
    // esp-idf-sys only propagates these when building for the chip.
    if espidf {
        embuild::build::CfgArgs::output_propagated("ESP_IDF")?;
        embuild::build::LinkArgs::output_propagated("ESP_IDF")?;
    }

    let default_port = if espidf { "80" } else { "8080" };
    let wifi_ssid = env::var("WIFI_SSID").unwrap_or_else(|_| "internet".into());
    let wifi_pass = env::var("WIFI_PASS").unwrap_or_else(|_| "password".into());
    let api_port = env::var("API_PORT").unwrap_or_else(|_| default_port.into());

    println!("cargo:rustc-env=WIFI_SSID={wifi_ssid}");
    println!("cargo:rustc-env=WIFI_PASS={wifi_pass}");
    println!("cargo:rustc-env=API_PORT={api_port}");
    println!("cargo:rerun-if-env-changed=WIFI_SSID");
    println!("cargo:rerun-if-env-changed=WIFI_PASS");
    println!("cargo:rerun-if-env-changed=API_PORT");

    let _ = build_data::set_SOURCE_TIMESTAMP();
    let _ = build_data::no_debug_rebuilds();

    Ok(())
}

// EOF
