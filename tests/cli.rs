//! Exit codes and operator messages of the `skywall` binary.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn skywall(args: &[&Path], cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_skywall"));
    cmd.args(args).current_dir(cwd);
    cmd
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn directory_without_recipe_prints_usage() {
    let tmp = TempDir::new().unwrap();
    let out = skywall(&[tmp.path()], tmp.path()).output().unwrap();

    assert_eq!(out.status.code(), Some(1));
    let text = stdout(&out);
    assert!(
        text.contains("takes one command line argument: the pipeline directory"),
        "{text}"
    );
    assert!(text.contains("skywall pipelines/simple"), "{text}");
}

#[test]
fn missing_imagemagick_is_reported() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("recipe.toml"),
        "[[step]]\nop = \"blank\"\ncolor = \"black\"\nsize = [1, 1]\n",
    )
    .unwrap();

    let out = skywall(&[tmp.path()], tmp.path())
        .env_remove("PATH")
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).contains("ImageMagick was not found. Please install!"));
    assert!(!tmp.path().join("images").exists());
}

#[test]
fn gen_config_prints_stock_config() {
    let out = Command::new(env!("CARGO_BIN_EXE_skywall"))
        .arg("--gen-config")
        .output()
        .unwrap();

    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("[magick]"), "{text}");
    assert!(text.contains("[transfer]"), "{text}");
}
