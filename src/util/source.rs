// Message Sources
// Flat buffers or readers consumed in fixed-size chunks

use std::io::{self, Read};

use crate::error::{Result, RsaError};

/// Default chunk size when hashing a reader
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Where the bytes of a message come from
pub enum ByteSource<'a> {
    /// Whole message already in memory
    Bytes(&'a [u8]),
    /// Read in chunks until exhausted
    Reader(&'a mut dyn Read),
}

impl<'a> From<&'a [u8]> for ByteSource<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        ByteSource::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for ByteSource<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        ByteSource::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for ByteSource<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        ByteSource::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for ByteSource<'a> {
    fn from(text: &'a str) -> Self {
        ByteSource::Bytes(text.as_bytes())
    }
}

impl<'a, R: Read> From<&'a mut R> for ByteSource<'a> {
    fn from(reader: &'a mut R) -> Self {
        ByteSource::Reader(reader)
    }
}

/// Configuration for reading a `ByteSource`
#[derive(Clone, Debug)]
pub struct SourceConfig {
    pub chunk_size: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl SourceConfig {
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }
}

impl ByteSource<'_> {
    /// Feed every chunk of the source to `sink`, in order.
    /// A flat buffer is passed as a single chunk.
    pub fn for_each_chunk<F>(self, config: &SourceConfig, mut sink: F) -> Result<()>
    where
        F: FnMut(&[u8]),
    {
        if config.chunk_size == 0 {
            return Err(RsaError::InvalidArgument(
                "chunk size must be positive".to_string(),
            ));
        }

        match self {
            ByteSource::Bytes(bytes) => sink(bytes),
            ByteSource::Reader(reader) => {
                let mut block = vec![0u8; config.chunk_size];
                loop {
                    match reader.read(&mut block) {
                        Ok(0) => break,
                        Ok(read) => sink(&block[..read]),
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        Ok(())
    }
}
