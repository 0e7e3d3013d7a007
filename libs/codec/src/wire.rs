//! Primitive big-endian reader/writer for payload fields.
//!
//! Variable-length sections carry a length or count prefix; optional blobs a
//! one-byte presence flag. The reader is bounds-checked on every access and
//! never panics on short input.

use crate::{CodecError, CodecResult};
use byteorder::{BigEndian, ByteOrder};
use types::{Address, Hash, TokenId, U256};

/// Largest nested blob (success/fail payloads) the codec will accept.
pub const MAX_BLOB_LEN: usize = 64 * 1024;

/// Append-only payload builder.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn put_u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        let mut raw = [0u8; 4];
        BigEndian::write_u32(&mut raw, value);
        self.buf.extend_from_slice(&raw);
        self
    }

    pub fn put_u64(&mut self, value: u64) -> &mut Self {
        let mut raw = [0u8; 8];
        BigEndian::write_u64(&mut raw, value);
        self.buf.extend_from_slice(&raw);
        self
    }

    pub fn put_u256(&mut self, value: U256) -> &mut Self {
        let mut raw = [0u8; 32];
        value.to_big_endian(&mut raw);
        self.buf.extend_from_slice(&raw);
        self
    }

    pub fn put_address(&mut self, value: &Address) -> &mut Self {
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    pub fn put_hash(&mut self, value: &Hash) -> &mut Self {
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    pub fn put_token(&mut self, value: &TokenId) -> &mut Self {
        match value {
            TokenId::Native => {
                self.put_u8(0);
            }
            TokenId::Contract(addr) => {
                self.put_u8(1).put_address(addr);
            }
        }
        self
    }

    pub fn put_blob(&mut self, value: &[u8]) -> &mut Self {
        self.put_u32(value.len() as u32);
        self.buf.extend_from_slice(value);
        self
    }

    pub fn put_opt_blob(&mut self, value: Option<&[u8]>) -> &mut Self {
        match value {
            Some(bytes) => {
                self.put_u8(1).put_blob(bytes);
            }
            None => {
                self.put_u8(0);
            }
        }
        self
    }
}

/// Bounds-checked payload cursor.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Fails unless every byte has been consumed.
    pub fn expect_end(&self, context: &'static str) -> CodecResult<()> {
        if self.remaining() != 0 {
            return Err(CodecError::TrailingBytes {
                remaining: self.remaining(),
                context,
            });
        }
        Ok(())
    }

    fn take(&mut self, len: usize, context: &'static str) -> CodecResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(CodecError::PayloadTooSmall {
                need: len,
                got: self.remaining(),
                context,
            });
        }
        let slice = &self.buf[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub fn u8(&mut self, context: &'static str) -> CodecResult<u8> {
        Ok(self.take(1, context)?[0])
    }

    pub fn u32(&mut self, context: &'static str) -> CodecResult<u32> {
        Ok(BigEndian::read_u32(self.take(4, context)?))
    }

    pub fn u64(&mut self, context: &'static str) -> CodecResult<u64> {
        Ok(BigEndian::read_u64(self.take(8, context)?))
    }

    pub fn u256(&mut self, context: &'static str) -> CodecResult<U256> {
        Ok(U256::from_big_endian(self.take(32, context)?))
    }

    pub fn address(&mut self, context: &'static str) -> CodecResult<Address> {
        let raw: [u8; 32] = self.take(32, context)?.try_into().expect("fixed width");
        Ok(Address(raw))
    }

    pub fn hash(&mut self, context: &'static str) -> CodecResult<Hash> {
        let raw: [u8; 32] = self.take(32, context)?.try_into().expect("fixed width");
        Ok(Hash(raw))
    }

    pub fn token(&mut self, context: &'static str) -> CodecResult<TokenId> {
        match self.u8(context)? {
            0 => Ok(TokenId::Native),
            1 => Ok(TokenId::Contract(self.address(context)?)),
            tag => Err(CodecError::InvalidTag { tag, context }),
        }
    }

    pub fn blob(&mut self, context: &'static str) -> CodecResult<Vec<u8>> {
        let len = self.u32(context)? as usize;
        if len > MAX_BLOB_LEN {
            return Err(CodecError::CountOutOfBounds {
                got: len,
                limit: MAX_BLOB_LEN,
                context,
            });
        }
        Ok(self.take(len, context)?.to_vec())
    }

    pub fn opt_blob(&mut self, context: &'static str) -> CodecResult<Option<Vec<u8>>> {
        match self.u8(context)? {
            0 => Ok(None),
            1 => Ok(Some(self.blob(context)?)),
            tag => Err(CodecError::InvalidTag { tag, context }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_round_trip() {
        let mut w = Writer::new();
        w.put_u8(7)
            .put_u32(0xfeed_beef)
            .put_u64(42)
            .put_u256(U256::from(10u8).pow(U256::from(30u8)))
            .put_token(&TokenId::Native)
            .put_token(&TokenId::Contract(Address([9u8; 32])))
            .put_opt_blob(Some(b"hello"))
            .put_opt_blob(None);
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        assert_eq!(r.u8("t").unwrap(), 7);
        assert_eq!(r.u32("t").unwrap(), 0xfeed_beef);
        assert_eq!(r.u64("t").unwrap(), 42);
        assert_eq!(
            r.u256("t").unwrap(),
            U256::from(10u8).pow(U256::from(30u8))
        );
        assert_eq!(r.token("t").unwrap(), TokenId::Native);
        assert_eq!(r.token("t").unwrap(), TokenId::Contract(Address([9u8; 32])));
        assert_eq!(r.opt_blob("t").unwrap(), Some(b"hello".to_vec()));
        assert_eq!(r.opt_blob("t").unwrap(), None);
        r.expect_end("t").unwrap();
    }

    #[test]
    fn short_reads_carry_context() {
        let mut r = Reader::new(&[0u8; 3]);
        let err = r.u32("deadline").unwrap_err();
        assert_eq!(
            err,
            CodecError::PayloadTooSmall {
                need: 4,
                got: 3,
                context: "deadline"
            }
        );
    }

    #[test]
    fn bad_token_tag_is_rejected() {
        let mut r = Reader::new(&[2u8]);
        assert!(matches!(
            r.token("token"),
            Err(CodecError::InvalidTag { tag: 2, .. })
        ));
    }
}
