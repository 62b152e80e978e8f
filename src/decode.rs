//! Incremental UTF-8 decoding for streamed response bodies.
//!
//! Transports chunk bytes with no regard for character boundaries, so a
//! multi-byte sequence can arrive split across two reads. The decoder holds
//! the incomplete tail until the next chunk completes it instead of dropping
//! or substituting it.

#[derive(Default)]
pub struct StreamDecoder {
    carry: Vec<u8>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning every complete character seen so far.
    /// An incomplete trailing sequence is carried over to the next call.
    /// Genuinely invalid bytes are substituted so a broken upstream cannot
    /// stall the stream.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.carry);
        bytes.extend_from_slice(chunk);

        match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => {
                let valid_up_to = err.utf8_error().valid_up_to();
                let incomplete = err.utf8_error().error_len().is_none();
                let bytes = err.into_bytes();

                if incomplete {
                    self.carry = bytes[valid_up_to..].to_vec();
                    String::from_utf8_lossy(&bytes[..valid_up_to]).into_owned()
                } else {
                    String::from_utf8_lossy(&bytes).into_owned()
                }
            }
        }
    }

    /// True when no partial sequence is pending. A stream that ends with
    /// bytes still carried was truncated mid-character by the producer.
    pub fn is_clean(&self) -> bool {
        self.carry.is_empty()
    }
}
