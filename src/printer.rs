use std::io::Write;

use log::{error, info};

use crate::error::Result;

/// Address prefix shared by the sticker printers.
pub const ADDRESS_PREFIX: &str = "42:21:BB:2C";

/// Anything that can carry one encoded frame to the printer.
///
/// A send is a single attempt: the first failure is returned to the caller
/// and nothing is retried.
pub trait FrameSink {
    fn send(&mut self, frame: &[u8]) -> Result<()>;
}

/// Blocking sink over any byte stream: a bound RFCOMM node such as
/// `/dev/rfcomm0`, a file, or stdout.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for WriterSink<W> {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        info!("Sending frame ({} bytes)", frame.len());
        let result = self
            .writer
            .write_all(frame)
            .and_then(|()| self.writer.flush());
        if let Err(e) = result {
            error!("Print error: {}", e);
            return Err(e.into());
        }
        info!("Print complete");
        Ok(())
    }
}

/// Send `frame` through `sink`.
pub fn send_frame<S: FrameSink + ?Sized>(sink: &mut S, frame: &[u8]) -> Result<()> {
    sink.send(frame)
}
