//! `textDocument/formatting` (`spec.md` §4.8/§6): shells out to the
//! configured external formatter with the document text on stdin and
//! returns its stdout as a single full-file `TextEdit` iff it differs from
//! the input. A non-zero exit is surfaced as an error rather than silently
//! skipped, matching `spec.md` §4.8's "a non-zero exit is surfaced as an
//! error" and `perl-lsp-formatting`'s own `PerltidyError` path.

mod runner;

use nix_config::FormatterCommand;
use nix_position::WireRange;
use runner::{CommandRunner, OsCommandRunner};
use lsp_types::TextEdit;

#[derive(Debug, thiserror::Error)]
pub enum FormattingError {
    #[error("no formatter is configured (formatting.command)")]
    NotConfigured,
    #[error("failed to run formatter: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("formatter exited with a failure status: {stderr}")]
    NonZeroExit { stderr: String },
    #[error("formatter produced output that is not valid UTF-8")]
    InvalidUtf8,
}

/// Formats `source` with the OS formatter process configured by `command`.
/// Returns `None` when the formatter made no changes (the common case on an
/// already-formatted document).
pub fn format_document(source: &str, command: &FormatterCommand) -> Result<Option<TextEdit>, FormattingError> {
    format_with(&OsCommandRunner, source, command)
}

fn format_with<R: CommandRunner>(runner: &R, source: &str, command: &FormatterCommand) -> Result<Option<TextEdit>, FormattingError> {
    let argv = command.argv().ok_or(FormattingError::NotConfigured)?;
    let program = &argv[0];
    let args = &argv[1..];
    let output = runner.run(program, args, source.as_bytes())?;
    if !output.success {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        return Err(FormattingError::NonZeroExit { stderr });
    }
    let formatted = String::from_utf8(output.stdout).map_err(|_| FormattingError::InvalidUtf8)?;
    if formatted == source {
        return Ok(None);
    }
    Ok(Some(TextEdit { range: WireRange::whole_document(source).into(), new_text: formatted }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use runner::fake::FakeRunner;
    use runner::CommandOutput;

    fn argv_command() -> FormatterCommand {
        FormatterCommand::Argv(vec!["nixpkgs-fmt".to_string()])
    }

    #[test]
    fn unconfigured_formatter_is_an_error() {
        let err = format_document("1", &FormatterCommand::Unset).expect_err("unset command has no argv");
        assert!(matches!(err, FormattingError::NotConfigured));
    }

    #[test]
    fn unchanged_output_yields_no_edit() {
        let runner = FakeRunner { output: CommandOutput { stdout: b"{ a = 1; }".to_vec(), stderr: Vec::new(), success: true } };
        let edit = format_with(&runner, "{ a = 1; }", &argv_command()).expect("formatter ran");
        assert!(edit.is_none());
    }

    #[test]
    fn changed_output_yields_a_whole_document_edit() {
        let runner = FakeRunner { output: CommandOutput { stdout: b"{\n  a = 1;\n}\n".to_vec(), stderr: Vec::new(), success: true } };
        let edit = format_with(&runner, "{ a = 1; }", &argv_command()).expect("formatter ran").expect("output differs");
        assert_eq!(edit.new_text, "{\n  a = 1;\n}\n");
    }

    #[test]
    fn a_non_zero_exit_is_an_error() {
        let runner = FakeRunner { output: CommandOutput { stdout: Vec::new(), stderr: b"parse error".to_vec(), success: false } };
        let err = format_with(&runner, "{ a = 1 }", &argv_command()).expect_err("non-zero exit surfaces as an error");
        assert!(matches!(err, FormattingError::NonZeroExit { .. }));
    }
}
