#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::error::Diagnostics;
use rox::RunStatus;

/// `Write` sink whose contents stay readable after the interpreter takes
/// ownership of a clone.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Outcome {
    pub status: RunStatus,
    pub stdout: String,
    pub errors: Vec<String>,
}

impl Outcome {
    /// Printed lines, without the trailing newline.
    pub fn lines(&self) -> Vec<&str> {
        self.stdout.lines().collect()
    }
}

/// Runs `source` through the whole pipeline with captured output.
pub fn run(source: &str) -> Outcome {
    let buffer = SharedBuffer::default();
    let mut diagnostics = Diagnostics::new();

    let status = rox::run(source, Box::new(buffer.clone()), &mut diagnostics);

    Outcome {
        status,
        stdout: buffer.contents(),
        errors: diagnostics.messages(),
    }
}
