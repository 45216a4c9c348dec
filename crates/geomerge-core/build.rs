// Build script for GDAL integration
// The actual linking is handled by the gdal-sys crate; this only
// surfaces configuration hints.

fn main() {
    println!("cargo:rerun-if-env-changed=GDAL_HOME");
    println!("cargo:rerun-if-env-changed=GDAL_DATA");
    println!("cargo:rerun-if-env-changed=GDAL_DRIVER_PATH");

    if std::env::var("GDAL_HOME").is_err() {
        println!("cargo:warning=GDAL_HOME not set. GDAL will be detected from system paths.");
    }
}
