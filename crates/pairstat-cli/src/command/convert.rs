use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use pairstat_data::convert;
use tracing::info;

#[derive(Debug, Clone, Args)]
pub(crate) struct ConvertArg {
    /// Pipe-delimited text log
    pub input: PathBuf,
    /// CSV file to write
    #[arg(long, default_value = "input_data.csv")]
    pub output: PathBuf,
}

pub(crate) fn run(arg: &ConvertArg) -> anyhow::Result<()> {
    if let Some(parent) = arg.output.parent() {
        crate::util::create_dir(parent)?;
    }
    let summary = convert::convert_file(&arg.input, &arg.output).with_context(|| {
        format!(
            "Failed to convert {} to {}",
            arg.input.display(),
            arg.output.display()
        )
    })?;
    info!(
        "Wrote {} rows to {} ({} lines skipped)",
        summary.rows,
        arg.output.display(),
        summary.skipped
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("log.txt");
        std::fs::write(
            &input,
            "2024-01-05 08:12:44 | A=3.21 | B=1.98 | poměr=1.62 | odchylka=0.18% | pohlaví=1 | věk=20-40\n\
             garbage\n",
        )
        .unwrap();
        let arg = ConvertArg {
            input,
            output: dir.path().join("data/input_data.csv"),
        };
        run(&arg).unwrap();
        let csv = std::fs::read_to_string(&arg.output).unwrap();
        assert_eq!(
            csv,
            "datetime,A,B,poměr,odchylka,pohlaví,věk\n\
             2024-01-05 08:12:44,3.21,1.98,1.62,0.18,1,20-40\n"
        );
    }

    #[test]
    fn test_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let arg = ConvertArg {
            input: dir.path().join("missing.txt"),
            output: dir.path().join("out.csv"),
        };
        assert!(run(&arg).is_err());
    }
}
