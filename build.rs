use std::env;
use std::fs;
use std::path::{Path, PathBuf};

// Place config.toml and the bundled sample logos next to the built binary so
// the app can be launched straight from target/.
fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let target_dir = Path::new(&out_dir)
        .ancestors()
        .nth(3)
        .map(PathBuf::from)
        .unwrap();

    fs::copy("config.toml", target_dir.join("config.toml")).unwrap();

    let samples_dest = target_dir.join("assets");
    fs::create_dir_all(&samples_dest).unwrap();
    for entry in fs::read_dir("assets").unwrap() {
        let entry = entry.unwrap();
        if entry.path().extension().map_or(false, |e| e == "svg") {
            fs::copy(entry.path(), samples_dest.join(entry.file_name())).unwrap();
        }
    }

    println!("cargo:rerun-if-changed=config.toml");
    println!("cargo:rerun-if-changed=assets");
}
