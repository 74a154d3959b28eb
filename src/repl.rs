//! The interactive loop. Meta-commands start with `:`; every other line is
//! handed to the session unchanged.

use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::dialect::Dialect;
use crate::format;
use crate::session::Session;
use crate::value::Value;

const COMMANDS: &str = "Commands: :help, :examples, :env, :load <file>, :reset, :quit";
const ROSA_COMMANDS: &str = "Commands: :help, :examples, :env, :facts, :load <file>, :reset, :quit";

/// What the loop should do after a meta-command.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Repl<R, W> {
    session: Session,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Repl<R, W> {
    pub fn new(session: Session, input: R, output: W) -> Self {
        Self {
            session,
            input,
            output,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Read lines until `:quit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        let dialect = self.session.dialect();
        writeln!(self.output, "{}", dialect.banner())?;

        let mut line = String::new();
        loop {
            write!(self.output, "{}", dialect.prompt())?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                break;
            }

            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(command) = trimmed.strip_prefix(':') {
                if self.meta_command(command)? == Flow::Quit {
                    break;
                }
                continue;
            }

            self.evaluate_line(trimmed)?;
        }
        Ok(())
    }

    fn evaluate_line(&mut self, line: &str) -> io::Result<()> {
        let result = self.session.run_interactive_line(line).map(|_| ());
        self.flush_program_output()?;
        if let Err(err) = result {
            writeln!(self.output, "Error: {}", err.kind)?;
        }
        Ok(())
    }

    fn meta_command(&mut self, command: &str) -> io::Result<Flow> {
        let mut parts = command.trim().splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or("").to_lowercase();
        let arg = parts.next().map(str::trim).unwrap_or("");
        let dialect = self.session.dialect();
        tracing::debug!(command = %name, "meta-command");

        match name.as_str() {
            "q" | "quit" | "exit" => return Ok(Flow::Quit),
            "h" | "help" => {
                let commands = if dialect == Dialect::Rosa { ROSA_COMMANDS } else { COMMANDS };
                writeln!(self.output, "{}", commands)?;
                writeln!(self.output, "{}", dialect.syntax())?;
            }
            "examples" => writeln!(self.output, "{}", dialect.example())?,
            "env" => write!(self.output, "{}", format::environment_to_text(self.session.environment()))?,
            "facts" if dialect == Dialect::Rosa => {
                let facts: Vec<Value> = self.session.facts().into_iter().map(Value::string).collect();
                writeln!(self.output, "{}", format::describe(&Value::list(facts)))?;
            }
            "load" if !arg.is_empty() => self.load(Path::new(arg))?,
            "reset" => {
                self.session.reset();
                writeln!(self.output, "reset")?;
            }
            _ => writeln!(self.output, "Unknown command; :help")?,
        }
        Ok(Flow::Continue)
    }

    /// Run a whole file into the current environment.
    fn load(&mut self, path: &Path) -> io::Result<()> {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                writeln!(self.output, "Load error: {}", err)?;
                return Ok(());
            }
        };

        let result = self.session.run_program(&source).map(|_| ());
        self.flush_program_output()?;
        match result {
            Ok(()) => writeln!(self.output, "Loaded {}", path.display()),
            Err(err) => writeln!(self.output, "Load error: {}", err),
        }
    }

    fn flush_program_output(&mut self) -> io::Result<()> {
        for line in self.session.take_output() {
            writeln!(self.output, "{}", line)?;
        }
        Ok(())
    }
}
