//! Subprocess execution, behind a trait so formatting logic can be tested
//! without shelling out. Grounded on `perl-lsp-tooling::SubprocessRuntime`
//! (the teacher's own "spawn with piped stdio, write stdin, then
//! `wait_with_output`" shape and its mockable-trait boundary), reimplemented
//! locally rather than depended on directly — a formatter invocation is a
//! narrower need (one write, one wait, no separate stderr capture for the
//! caller) than the teacher's general-purpose runtime.

use std::io::Write;
use std::process::{Command, Stdio};

pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
}

pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String], stdin: &[u8]) -> std::io::Result<CommandOutput>;
}

#[derive(Debug, Default)]
pub struct OsCommandRunner;

impl CommandRunner for OsCommandRunner {
    fn run(&self, program: &str, args: &[String], stdin: &[u8]) -> std::io::Result<CommandOutput> {
        let mut child = Command::new(program).args(args).stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped()).spawn()?;
        if let Some(mut child_stdin) = child.stdin.take() {
            child_stdin.write_all(stdin)?;
        }
        let output = child.wait_with_output()?;
        Ok(CommandOutput { stdout: output.stdout, stderr: output.stderr, success: output.status.success() })
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    pub struct FakeRunner {
        pub output: CommandOutput,
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, _program: &str, _args: &[String], _stdin: &[u8]) -> std::io::Result<CommandOutput> {
            Ok(CommandOutput { stdout: self.output.stdout.clone(), stderr: self.output.stderr.clone(), success: self.output.success })
        }
    }
}
