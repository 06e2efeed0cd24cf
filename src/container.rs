//! Self-contained byte layout for compressed byte streams.
//!
//! ```text
//! "HUF1" | padding: u8 | entries: u16 BE
//! entries x (symbol: u8 | code length: u8 | code bits, MSB first, zero filled)
//! packed data
//! ```
//!
//! Entries are written in symbol order so equal inputs give equal output.

use crate::code::{code_from_bytes, code_to_bytes, CodeTable};
use crate::error::{Error, Result};
use crate::pack::{encode, Compressed, Packed};
use log::debug;

const MAGIC: &[u8; 4] = b"HUF1";

impl Compressed<u8> {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let codes = self.codes();
        let packed = self.packed();

        let count = u16::try_from(codes.len()).map_err(|_| Error::Format("too many entries"))?;
        let mut out = Vec::with_capacity(7 + codes.len() * 3 + packed.bytes().len());
        out.extend_from_slice(MAGIC);
        out.push(packed.padding());
        out.extend_from_slice(&count.to_be_bytes());

        let mut entries: Vec<_> = codes.iter().collect();
        entries.sort_by_key(|&(s, _)| *s);
        for (s, code) in entries {
            let len =
                u8::try_from(code.len()).map_err(|_| Error::Format("code longer than 255 bits"))?;
            out.push(*s);
            out.push(len);
            out.extend_from_slice(&code_to_bytes(code));
        }

        out.extend_from_slice(packed.bytes());
        Ok(out)
    }

    pub fn from_bytes(input: &[u8]) -> Result<Self> {
        let mut rest = input;
        if take(&mut rest, 4)? != MAGIC {
            return Err(Error::Format("bad magic"));
        }
        let padding = take(&mut rest, 1)?[0];
        let head = take(&mut rest, 2)?;
        let count = u16::from_be_bytes([head[0], head[1]]);

        let mut codes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let entry = take(&mut rest, 2)?;
            let (symbol, len) = (entry[0], entry[1] as usize);
            let bits = take(&mut rest, (len + 7) / 8)?;
            let code = code_from_bytes(bits, len).ok_or(Error::Format("truncated code"))?;
            codes.push((symbol, code));
        }

        let codes = CodeTable::from_codes(codes)?;
        let packed = Packed::from_parts(rest.to_vec(), padding)?;
        Ok(Compressed::new(codes, packed))
    }
}

fn take<'a>(input: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    if input.len() < n {
        return Err(Error::Format("truncated input"));
    }
    let (head, tail) = input.split_at(n);
    *input = tail;
    Ok(head)
}

/// Compresses `data` into the container layout.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let out = encode(data)?.to_bytes()?;
    debug!("compressed {} bytes to {}", data.len(), out.len());
    Ok(out)
}

/// Reverses [`compress`].
pub fn decompress(container: &[u8]) -> Result<Vec<u8>> {
    Ok(Compressed::from_bytes(container)?.decompress()?)
}
