//! Connects the simulated teletype to this process's terminal.
use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use tracing::{event, Level};

use cpu::WritePrinter;

/// Start a thread which copies standard input, a byte at a time, to
/// the teletype keyboard.  When standard input is exhausted the
/// keyboard simply has nothing more to say.
pub fn keyboard() -> Result<Receiver<u8>, io::Error> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("keyboard".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for byte in stdin.lock().bytes() {
                match byte {
                    Ok(b) => {
                        if tx.send(b).is_err() {
                            // The simulator has gone away.
                            return;
                        }
                    }
                    Err(e) => {
                        event!(Level::WARN, "failed to read standard input: {e}");
                        return;
                    }
                }
            }
            event!(Level::DEBUG, "end of keyboard input");
        })?;
    Ok(rx)
}

pub fn printer() -> WritePrinter<io::Stdout> {
    WritePrinter::new(io::stdout())
}
