//! Line-oriented terminal abstraction.
//!
//! # Responsibility
//! - Block on one input line at a time.
//! - Map end-of-input and Ctrl+C to an interruption the shell can act on.
//!
//! # Invariants
//! - Implementations never apply styling; `Renderer` owns presentation.
//! - `StdTerminal` delivers lines and interrupts in the order they happened.

use log::{info, warn};
use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, IsTerminal, Read, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

/// Result of one blocking read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineInput {
    /// Line without its trailing newline.
    Line(String),
    /// The user cancelled the read (end-of-input or Ctrl+C).
    Interrupted,
}

/// Raw line I/O used by the shell and interactive prompts.
pub trait Terminal {
    /// Shows `prompt` and blocks until one line is available.
    fn read_line(&mut self, prompt: &str) -> io::Result<LineInput>;
    /// Writes `text` followed by a newline.
    fn write_line(&mut self, text: &str) -> io::Result<()>;
    /// Visible rows, when known. Used for paged output.
    fn height(&self) -> Option<u16> {
        None
    }
}

/// Input side events, queued by the reader thread and the interrupt handle.
#[derive(Debug)]
enum InputEvent {
    Line(String),
    /// End-of-input on a source that can be read again (Ctrl+D on a tty).
    EndOfInput,
    /// The source is exhausted; every later read is an interruption.
    Closed,
    Interrupt,
    Failed(io::Error),
}

/// Sends an interruption to the read currently blocked on a `StdTerminal`,
/// or to the next one when no read is pending.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    events: Sender<InputEvent>,
}

impl InterruptHandle {
    pub fn interrupt(&self) {
        // A dropped terminal has nobody left to interrupt.
        let _ = self.events.send(InputEvent::Interrupt);
    }
}

/// Terminal over a byte stream, read line by line on a background thread.
///
/// Stdin is read on its own thread so a Ctrl+C can end a blocked read
/// without waiting for the user to press Enter.
pub struct StdTerminal {
    events: Receiver<InputEvent>,
    interrupts: InterruptHandle,
    output: Box<dyn Write>,
    closed: bool,
    measure_height: bool,
}

impl StdTerminal {
    /// Process stdin/stdout. Call `catch_ctrl_c` to route SIGINT here.
    pub fn new() -> Self {
        let reopen = io::stdin().is_terminal();
        let mut terminal = Self::spawn(io::stdin(), io::stdout(), reopen);
        terminal.measure_height = true;
        terminal
    }

    /// Terminal over arbitrary streams. End-of-input on `input` is final.
    pub fn from_io(input: impl Read + Send + 'static, output: impl Write + 'static) -> Self {
        Self::spawn(input, output, false)
    }

    fn spawn(input: impl Read + Send + 'static, output: impl Write + 'static, reopen: bool) -> Self {
        let (sender, events) = mpsc::channel();
        let lines = sender.clone();
        thread::spawn(move || pump_lines(BufReader::new(input), lines, reopen));
        Self {
            events,
            interrupts: InterruptHandle { events: sender },
            output: Box::new(output),
            closed: false,
            measure_height: false,
        }
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupts.clone()
    }

    /// Installs the process SIGINT handler so Ctrl+C interrupts reads
    /// instead of killing the process.
    ///
    /// # Errors
    /// - `ctrlc::Error` when a handler is already installed or the platform
    ///   refuses one.
    pub fn catch_ctrl_c(&self) -> Result<(), ctrlc::Error> {
        let handle = self.interrupt_handle();
        ctrlc::set_handler(move || handle.interrupt())?;
        info!("event=interrupt_handler module=command status=ok");
        Ok(())
    }
}

impl Default for StdTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for StdTerminal {
    fn read_line(&mut self, prompt: &str) -> io::Result<LineInput> {
        self.output.write_all(prompt.as_bytes())?;
        self.output.flush()?;
        if self.closed {
            writeln!(self.output)?;
            return Ok(LineInput::Interrupted);
        }

        let event = match self.events.recv() {
            Ok(event) => event,
            Err(_) => InputEvent::Closed,
        };
        match event {
            InputEvent::Line(line) => Ok(LineInput::Line(line)),
            InputEvent::Failed(err) => {
                self.closed = true;
                Err(err)
            }
            other => {
                if matches!(other, InputEvent::Closed) {
                    self.closed = true;
                }
                // Keep the next output off the prompt line.
                writeln!(self.output)?;
                Ok(LineInput::Interrupted)
            }
        }
    }

    fn write_line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")?;
        self.output.flush()
    }

    fn height(&self) -> Option<u16> {
        if !self.measure_height {
            return None;
        }
        crossterm::terminal::size().ok().map(|(_, rows)| rows)
    }
}

fn pump_lines(mut input: impl BufRead, events: Sender<InputEvent>, reopen: bool) {
    let mut buffer = String::new();
    loop {
        buffer.clear();
        let event = match input.read_line(&mut buffer) {
            Ok(0) if reopen => InputEvent::EndOfInput,
            Ok(0) => InputEvent::Closed,
            Ok(_) => InputEvent::Line(buffer.trim_end_matches(['\n', '\r']).to_string()),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!("event=terminal_read module=command status=error error={err}");
                InputEvent::Failed(err)
            }
        };
        let last = matches!(event, InputEvent::Closed | InputEvent::Failed(_));
        if events.send(event).is_err() || last {
            return;
        }
    }
}


/// In-memory terminal fed from a fixed script.
///
/// Each scripted entry answers one `read_line`; an exhausted script reads as
/// `LineInput::Interrupted`. Prompts and output are recorded for inspection.
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
    inputs: VecDeque<LineInput>,
    prompts: Vec<String>,
    output: Vec<String>,
    height: Option<u16>,
}

impl ScriptedTerminal {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: lines
                .into_iter()
                .map(|line| LineInput::Line(line.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Queues an explicit interruption after the already scripted lines.
    pub fn then_interrupt(mut self) -> Self {
        self.inputs.push_back(LineInput::Interrupted);
        self
    }

    /// Queues more lines.
    pub fn then_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs
            .extend(lines.into_iter().map(|line| LineInput::Line(line.into())));
        self
    }

    pub fn with_height(mut self, rows: u16) -> Self {
        self.height = Some(rows);
        self
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Number of scripted answers not consumed yet.
    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }
}

impl Terminal for ScriptedTerminal {
    fn read_line(&mut self, prompt: &str) -> io::Result<LineInput> {
        self.prompts.push(prompt.to_string());
        Ok(self.inputs.pop_front().unwrap_or(LineInput::Interrupted))
    }

    fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.output.extend(text.split('\n').map(str::to_string));
        Ok(())
    }

    fn height(&self) -> Option<u16> {
        self.height
    }
}
