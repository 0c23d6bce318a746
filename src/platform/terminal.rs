use super::ConfirmDialog;
use std::cell::RefCell;
use std::io::{self, BufRead, Write};

/// Yes/no prompt on a reader/writer pair (stdin/stderr for the CLI)
///
/// Blocks until the user answers. Unrecognised input asks again; end of
/// input or an I/O failure counts as "no".
pub struct TerminalDialog<R, W> {
    input: RefCell<R>,
    output: RefCell<W>,
}

impl TerminalDialog<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalDialog<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: RefCell::new(input),
            output: RefCell::new(output),
        }
    }

    fn ask(&self, message: &str) -> io::Result<bool> {
        let mut input = self.input.borrow_mut();
        let mut output = self.output.borrow_mut();

        loop {
            write!(output, "{} [y/N] ", message)?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                return Ok(false);
            }

            match parse_answer(&line) {
                Some(answer) => return Ok(answer),
                None => writeln!(output, "Please answer y or n.")?,
            }
        }
    }

    /// Consume the dialog and hand back the writer
    pub fn into_output(self) -> W {
        self.output.into_inner()
    }
}

/// Interpret a typed answer; empty means the default ("no")
fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "" | "n" | "no" => Some(false),
        _ => None,
    }
}

impl<R: BufRead, W: Write> ConfirmDialog for TerminalDialog<R, W> {
    fn confirm(&self, message: &str) -> bool {
        match self.ask(message) {
            Ok(answer) => {
                tracing::debug!("Terminal dialog answered: {}", answer);
                answer
            }
            Err(e) => {
                tracing::warn!("Terminal dialog failed, treating as declined: {}", e);
                false
            }
        }
    }
}
