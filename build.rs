use std::env;
use std::path::{Path, PathBuf};

const WATCHED_VARS: [&str; 4] = ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"];

fn main() {
    for var in WATCHED_VARS {
        println!("cargo:rerun-if-env-changed={var}");
    }

    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() != "windows" {
        return;
    }
    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=FFMPEG_DIR is not set. On Windows, install FFmpeg with libvpx via vcpkg (ffmpeg[vpx]) and set VCPKG_ROOT + FFMPEG_DIR."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let ffmpeg_dir = PathBuf::from(&vcpkg_root).join("installed").join(&triplet);
    if !ffmpeg_dir.exists() {
        println!(
            "cargo:warning=VCPKG_ROOT is set but no FFmpeg install was found at {}.",
            ffmpeg_dir.display(),
        );
        return;
    }

    println!(
        "cargo:warning=Detected vcpkg FFmpeg at {0}. Set FFMPEG_DIR={0} to make ffmpeg-sys-next discovery explicit.",
        ffmpeg_dir.display(),
    );
    if !has_vpx(&ffmpeg_dir) {
        println!(
            "cargo:warning=No libvpx found under {}; WebM export needs FFmpeg built with ffmpeg[vpx].",
            ffmpeg_dir.display(),
        );
    }
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        println!(
            "cargo:warning=Consider setting VCPKGRS_DYNAMIC=1 when using vcpkg dynamic FFmpeg builds on Windows."
        );
    }
}

fn has_vpx(ffmpeg_dir: &Path) -> bool {
    ["vpx.lib", "vpxmd.lib", "libvpx.lib"]
        .iter()
        .any(|name| ffmpeg_dir.join("lib").join(name).exists())
}
