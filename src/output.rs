//! Console output for a pipeline run.
//!
//! Everything the operator sees is built by a `format_*` function (pure,
//! returns a `String`) and written by a matching `print_*` wrapper, so
//! tests can check the exact text without capturing stdout.
//!
//! ```text
//! ==> Pipeline pipelines/simple
//! --> 1. clean as earth
//! Skipping download of GOES-East_Full_Disk_large.jpg, it's only 212 seconds old.
//! convert pipelines/simple/images/GOES-East_Full_Disk_large.jpg -crop 5424x5377+0+0 ...
//! ==> Done: 7 images generated
//! ```

use std::path::Path;

/// Single-quote an argument if it contains whitespace.
///
/// Embedded single quotes are closed, escaped, and reopened so the echoed
/// line can be pasted back into a POSIX shell.
pub fn quote_arg(arg: &str) -> String {
    if !arg.chars().any(char::is_whitespace) {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Format a command line for echoing before it runs.
pub fn format_command(program: &str, args: &[String]) -> String {
    std::iter::once(quote_arg(program))
        .chain(args.iter().map(|a| quote_arg(a)))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn print_command(program: &str, args: &[String]) {
    println!("{}", format_command(program, args));
}

/// Line printed when a cached download is fresh enough to reuse.
pub fn format_download_skip(filename: &str, age_secs: u64) -> String {
    format!("Skipping download of {filename}, it's only {age_secs} seconds old.")
}

pub fn print_download_skip(filename: &str, age_secs: u64) {
    println!("{}", format_download_skip(filename, age_secs));
}

pub fn format_run_header(pipeline_dir: &Path) -> String {
    format!("==> Pipeline {}", pipeline_dir.display())
}

pub fn format_run_footer(generated: u32) -> String {
    match generated {
        1 => "==> Done: 1 image generated".to_string(),
        n => format!("==> Done: {n} images generated"),
    }
}

/// Line printed before each recipe step; `index` counts from 1.
pub fn format_step(index: usize, op: &str, binding: Option<&str>) -> String {
    match binding {
        Some(name) => format!("--> {index}. {op} as {name}"),
        None => format!("--> {index}. {op}"),
    }
}

pub fn print_step(index: usize, op: &str, binding: Option<&str>) {
    println!("{}", format_step(index, op, binding));
}

pub fn print_run_header(pipeline_dir: &Path) {
    println!("{}", format_run_header(pipeline_dir));
}

pub fn print_run_footer(generated: u32) {
    println!("{}", format_run_footer(generated));
}

/// Usage text for a bad invocation.
pub fn format_usage(program: &str) -> String {
    format!(
        "{program} takes one command line argument: the pipeline directory (containing recipe.toml).\n\
         For example:\n    {program} pipelines/simple"
    )
}
