use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    // Copy button templates and config next to the executable
    let Some(target_dir) = target_dir() else {
        return;
    };
    copy_templates(&target_dir);
    copy_config(&target_dir);
}

/// OUT_DIR is target/<profile>/build/<pkg>-<hash>/out; the executable lives
/// three levels up.
fn target_dir() -> Option<PathBuf> {
    let out_dir = env::var("OUT_DIR").ok()?;
    Path::new(&out_dir).ancestors().nth(3).map(Path::to_path_buf)
}

fn copy_templates(target_dir: &Path) {
    let template_src = Path::new("resources/template");
    let template_dst = target_dir.join("resources").join("template");

    if template_src.exists() {
        copy_dir_recursive(template_src, &template_dst);
        println!("cargo:rerun-if-changed=resources/template/");
    }
}

fn copy_dir_recursive(src: &Path, dst: &Path) {
    let _ = fs::create_dir_all(dst);

    if let Ok(entries) = fs::read_dir(src) {
        for entry in entries.flatten() {
            let src_path = entry.path();
            let dst_path = dst.join(entry.file_name());

            if src_path.is_dir() {
                copy_dir_recursive(&src_path, &dst_path);
            } else {
                let _ = fs::copy(&src_path, &dst_path);
            }
        }
    }
}

/// Only seeds config.json; an edited copy in the target directory is kept.
fn copy_config(target_dir: &Path) {
    let config_src = Path::new("config.json");
    let config_dst = target_dir.join("config.json");

    if config_src.exists() && !config_dst.exists() {
        let _ = fs::copy(config_src, &config_dst);
    }
    println!("cargo:rerun-if-changed=config.json");
}
