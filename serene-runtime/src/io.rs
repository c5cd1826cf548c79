// Output primitive used by emitted print statements:
//     Printer::stdout().write(a).write(b).endl();

use std::fmt::Display;
use std::io::{self, StdoutLock, Write};

use crate::error::{fatal, RuntimeError};

pub struct Printer<W: Write = StdoutLock<'static>> {
    out: W,
}

impl Printer {
    pub fn stdout() -> Self {
        Printer {
            out: io::stdout().lock(),
        }
    }
}

impl<W: Write> Printer<W> {
    pub fn new(out: W) -> Self {
        Printer { out }
    }

    #[track_caller]
    pub fn write<T: Display>(mut self, value: T) -> Self {
        if let Err(e) = write!(self.out, "{}", value) {
            fatal(RuntimeError::Output(e.to_string()));
        }
        self
    }

    /// Finish the line and flush.
    #[track_caller]
    pub fn endl(self) {
        let _ = self.finish();
    }

    /// `endl`, handing back the underlying writer.
    #[track_caller]
    pub fn finish(mut self) -> W {
        if let Err(e) = writeln!(self.out).and_then(|_| self.out.flush()) {
            fatal(RuntimeError::Output(e.to_string()));
        }
        self.out
    }
}
