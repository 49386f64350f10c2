use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=D2XX_LIB_DIR");
    let linked = env::var("CARGO_FEATURE_LINKED").is_ok();
    let stubbed = env::var("CARGO_FEATURE_NO_D2XX").is_ok();
    if !linked || stubbed {
        return;
    }

    if let Ok(dir) = env::var("D2XX_LIB_DIR") {
        println!("cargo:rustc-link-search=native={dir}");
    }
    // The vendor archive depends on these system libraries.
    match env::var("CARGO_CFG_TARGET_OS").unwrap_or_default().as_str() {
        "macos" => {
            println!("cargo:rustc-link-lib=framework=CoreFoundation");
            println!("cargo:rustc-link-lib=framework=IOKit");
        }
        "linux" => {
            println!("cargo:rustc-link-lib=dylib=pthread");
            println!("cargo:rustc-link-lib=dylib=dl");
            println!("cargo:rustc-link-lib=dylib=rt");
        }
        _ => {}
    }
}
