use std::process::Command;
use tempfile::tempdir;

fn bin() -> String {
    env!("CARGO_BIN_EXE_assetpack").to_string()
}

#[test]
fn cli_build_list_cat_roundtrip() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"hello world").unwrap();
    std::fs::write(dir.path().join("b.bin"), vec![0u8; 4096]).unwrap();

    let st = Command::new(bin())
        .current_dir(dir.path())
        .args(["build", "-o", "out.pak", "--build-number", "7", "b.bin", "a.txt"])
        .status()
        .unwrap();
    assert!(st.success());

    let out = Command::new(bin())
        .current_dir(dir.path())
        .args(["list", "out.pak"])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8(out.stdout).unwrap(), "a.txt\nb.bin\n");

    let out = Command::new(bin())
        .current_dir(dir.path())
        .args(["cat", "out.pak", "a.txt"])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(out.stdout, b"hello world");

    let out = Command::new(bin())
        .current_dir(dir.path())
        .args(["info", "out.pak"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.contains("build number: 7"), "{text}");
    assert!(text.contains("items:        2"), "{text}");
}

#[test]
fn cli_refuses_to_overwrite_without_force() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.bin");
    let output = dir.path().join("out.pak");
    std::fs::write(&input, b"payload").unwrap();
    std::fs::write(&output, b"existing").unwrap();

    let out = Command::new(bin())
        .args(["build", "-o"])
        .arg(&output)
        .arg(&input)
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).starts_with("assetpack: "));
    assert_eq!(std::fs::read(&output).unwrap(), b"existing");

    let st = Command::new(bin())
        .args(["--force", "build", "--store", "-o"])
        .arg(&output)
        .arg(&input)
        .status()
        .unwrap();
    assert!(st.success());
    assert_ne!(std::fs::read(&output).unwrap(), b"existing");
}

#[test]
fn cli_missing_item_fails() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("x"), b"data").unwrap();
    let st = Command::new(bin())
        .current_dir(dir.path())
        .args(["build", "-o", "p.pak", "x"])
        .status()
        .unwrap();
    assert!(st.success());

    let out = Command::new(bin())
        .current_dir(dir.path())
        .args(["cat", "p.pak", "nope"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("not found"));
}

#[test]
fn cli_extract_and_json_stats() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("maps")).unwrap();
    std::fs::write(dir.path().join("maps/level1.map"), vec![5u8; 2000]).unwrap();

    let out = Command::new(bin())
        .current_dir(dir.path())
        .args(["--json", "build", "-o", "m.pak", "maps/level1.map"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&out.stderr).unwrap();
    assert_eq!(stats["command"], "build");
    assert_eq!(stats["items"], 1);
    assert_eq!(stats["compressed_items"], 1);

    let st = Command::new(bin())
        .current_dir(dir.path())
        .args(["extract", "m.pak", "out"])
        .status()
        .unwrap();
    assert!(st.success());
    assert_eq!(
        std::fs::read(dir.path().join("out/maps-level1.map")).unwrap(),
        vec![5u8; 2000]
    );
}

#[test]
fn cli_config_prints_defaults() {
    let out = Command::new(bin()).arg("config").output().unwrap();
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stderr);
    assert!(text.contains("WINDOW_SIZE=131072"));
    assert!(text.contains("MIN_MATCH=4"));
}
