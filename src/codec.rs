use bytes::{Buf, BytesMut};
use encoding_rs::{CoderResult, Encoding};
use std::io;
use tokio_util::codec::Decoder;

/// Frames an arbitrary-charset byte stream into UTF-8 chunks.
///
/// Multi-byte sequences split across reads are held by the inner
/// `encoding_rs` decoder until the rest arrives.
pub struct CharsetDecoder {
    inner: encoding_rs::Decoder,
    out: Vec<u8>,
}

impl CharsetDecoder {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            inner: encoding.new_decoder_without_bom_handling(),
            out: Vec::new(),
        }
    }

    fn transcode(&mut self, src: &mut BytesMut, last: bool) -> io::Result<Option<BytesMut>> {
        let needed = self
            .inner
            .max_utf8_buffer_length(src.len())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "chunk too large to transcode"))?;
        self.out.clear();
        self.out.resize(needed.max(4), 0);

        let (result, read, written, _replaced) = self.inner.decode_to_utf8(src, &mut self.out, last);
        if result == CoderResult::OutputFull && read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "transcoder made no progress",
            ));
        }
        src.advance(read);

        if written == 0 {
            return Ok(None);
        }
        Ok(Some(BytesMut::from(&self.out[..written])))
    }
}

impl Decoder for CharsetDecoder {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        self.transcode(src, false)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let chunk = self.transcode(buf, true)?;
        buf.clear();
        Ok(chunk)
    }
}
