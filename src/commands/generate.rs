//! `generate` subcommand.
use anyhow::{Context, Result};
use clap::Command;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Renders man pages for `cmd` and, recursively, for each of its
/// subcommands (named `jorm-find.1`, `jorm-generate-man.1`, ...) into
/// `output_dir`, or the current directory when `None`.
///
/// Returns the written files in the order they were generated.
///
/// # Errors
///
/// Fails if the directory cannot be created or a page cannot be written.
pub fn generate_man_pages(
    cmd: &Command,
    output_dir: Option<PathBuf>,
) -> Result<Vec<PathBuf>> {
    let output_dir = match output_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Opening current directory")?,
    };
    std::fs::create_dir_all(&output_dir)
        .context("create output Man directories")?;

    let mut written = Vec::new();
    let name = cmd.get_name().to_owned();
    render(cmd.clone(), &output_dir, &name, &mut written)?;
    Ok(written)
}

fn render(
    cmd: Command,
    output_dir: &Path,
    name: &str,
    written: &mut Vec<PathBuf>,
) -> Result<()> {
    let page = output_dir.join(format!("{name}.1"));
    let mut file = File::create(&page)
        .with_context(|| format!("failed to create {}", page.display()))?;
    // clap_mangen takes NAME and SYNOPSIS from the command's own name.
    let renamed = cmd.clone().name(name.to_owned()).disable_help_subcommand(true);
    clap_mangen::Man::new(renamed)
        .render(&mut file)
        .with_context(|| format!("failed to render {}", page.display()))?;
    log::debug!("rendered {}", page.display());
    written.push(page);

    for sub in cmd.get_subcommands() {
        let prefixed = format!("{name}-{}", sub.get_name());
        render(sub.clone(), output_dir, &prefixed, written)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn one_page_per_command() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = Command::new("tool")
            .subcommand(Command::new("gen").subcommand(Command::new("man")));

        let pages =
            generate_man_pages(&cmd, Some(dir.path().to_path_buf())).unwrap();
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["tool.1", "tool-gen.1", "tool-gen-man.1"]);
        assert!(pages.iter().all(|p| p.exists()));
    }
}
