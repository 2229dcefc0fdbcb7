//! Script runner
//!
//! Executes one command per input line, logging each to the command log
//! and writing search results to the output.

use std::io::{BufRead, Write};

use crate::engine::Engine;
use crate::error::Result;

use super::{parse, CommandLog};

/// Counts of logged outcomes for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

pub struct Runner<'a> {
    engine: &'a Engine,
    log: CommandLog,
}

impl<'a> Runner<'a> {
    pub fn new(engine: &'a Engine, log: CommandLog) -> Self {
        Self { engine, log }
    }

    /// Run every line of `input`
    ///
    /// Command errors are logged and skipped; only failures to read the
    /// input or write the output or log abort the run.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            let Some(parsed) = parse(line).transpose() else {
                continue;
            };

            self.log.begin(line)?;
            let result = parsed.and_then(|command| self.engine.execute(command));

            let success = match result {
                Ok(outcome) => {
                    if let Some(text) = outcome.output() {
                        writeln!(out, "{}", text)?;
                    }
                    tracing::info!("{}: {}", line, outcome);
                    outcome.took_effect()
                }
                Err(e) => {
                    tracing::warn!("{}: {}", line, e);
                    false
                }
            };

            self.log.finish(line, success)?;
            if success {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
        }

        out.flush()?;
        Ok(summary)
    }
}
