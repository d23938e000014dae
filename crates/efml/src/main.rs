use std::process::ExitCode;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use efml_errors::Renderer;
use efml_parse::SourceFile;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(version, about = "Tooling for efml templates")]
enum Options {
    /// Report the diagnostics of a file.
    Check { path: Utf8PathBuf },
    /// Print the syntax tree of a file.
    Ast { path: Utf8PathBuf },
    /// Run the language server on stdin/stdout.
    Lsp,
}

fn main() -> anyhow::Result<ExitCode> {
    let filter = EnvFilter::try_from_env("EFML_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match Options::parse() {
        Options::Check { path } => {
            let (text, file) = parse_file(&path)?;
            report(&path, &text, &file);

            let errors = file.diagnostics().iter().filter(|it| it.is_error()).count();
            if errors > 0 {
                tracing::debug!(errors, "check failed");
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
        Options::Ast { path } => {
            let (text, file) = parse_file(&path)?;
            print!("{}", file.debug_tree());
            report(&path, &text, &file);
            Ok(ExitCode::SUCCESS)
        }
        Options::Lsp => {
            efml_ide::Server::new()?.run()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn parse_file(path: &Utf8Path) -> anyhow::Result<(String, SourceFile)> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("failed to read `{path}`"))?;
    let file = efml_parse::parse(&text);
    Ok((text, file))
}

fn report(path: &Utf8Path, text: &str, file: &SourceFile) {
    let renderer = Renderer::styled();
    for diagnostic in file.diagnostics() {
        eprintln!("{}", diagnostic.render(&renderer, path.as_str(), text));
    }
}
