use std::io::{Cursor, Read, Write};

/// Stream that replays canned replies and captures what was written.
pub struct Scripted {
    replies: Cursor<Vec<u8>>,
    pub written: Vec<u8>,
}

impl Scripted {
    pub fn new(replies: Vec<u8>) -> Self {
        Self {
            replies: Cursor::new(replies),
            written: Vec::new(),
        }
    }
}

impl Read for Scripted {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.replies.read(buf)
    }
}

impl Write for Scripted {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
