//! Block-encoded posting lists
//!
//! A posting list is a vbyte block count followed by blocks of up to
//! `BLOCK_SIZE` doc numbers. Each block is a vbyte length and the bitpacked
//! doc deltas. Deltas continue across block boundaries.

use std::io;

use super::types::{DocNo, PostingListMeta, BLOCK_SIZE};

/// Variable-byte encoding for integers
pub fn encode_vbyte(value: u32, output: &mut Vec<u8>) {
    let mut v = value;
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            output.push(byte | 0x80); // high bit marks the last byte
            break;
        } else {
            output.push(byte);
        }
    }
}

/// Decode a variable-byte encoded integer
pub fn decode_vbyte(input: &[u8], pos: &mut usize) -> io::Result<u32> {
    let mut result: u32 = 0;
    let mut shift = 0;

    loop {
        let byte = *input.get(*pos).ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "Unexpected end of vbyte")
        })?;
        *pos += 1;

        result |= ((byte & 0x7F) as u32) << shift;

        if byte & 0x80 != 0 {
            return Ok(result);
        }

        shift += 7;
        if shift > 28 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "VByte value too large",
            ));
        }
    }
}

/// Bitpack a block of integers using the width of the largest one
pub fn bitpack_encode(values: &[u32], output: &mut Vec<u8>) {
    let max_val = values.iter().copied().max().unwrap_or(0);
    if values.is_empty() {
        output.push(0);
        return;
    }
    let bits_needed = if max_val == 0 {
        1
    } else {
        32 - max_val.leading_zeros()
    } as u8;

    output.push(bits_needed);

    let mut current: u64 = 0;
    let mut bits_in_current = 0;

    for &value in values {
        current |= (value as u64) << bits_in_current;
        bits_in_current += bits_needed as u32;

        while bits_in_current >= 8 {
            output.push(current as u8);
            current >>= 8;
            bits_in_current -= 8;
        }
    }

    if bits_in_current > 0 {
        output.push(current as u8);
    }
}

/// Decode `count` bitpacked integers into `out`
pub fn bitpack_decode(
    input: &[u8],
    pos: &mut usize,
    count: usize,
    out: &mut Vec<u32>,
) -> io::Result<()> {
    let bits_needed = *input.get(*pos).ok_or_else(|| {
        io::Error::new(io::ErrorKind::UnexpectedEof, "Unexpected end of bitpack")
    })? as u32;
    *pos += 1;

    out.clear();
    if bits_needed == 0 {
        out.resize(count, 0);
        return Ok(());
    }
    if bits_needed > 32 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid bitpack width {}", bits_needed),
        ));
    }

    let total_bits = count as u64 * bits_needed as u64;
    let bytes_needed = total_bits.div_ceil(8) as usize;
    if *pos + bytes_needed > input.len() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "Not enough bytes for bitpack",
        ));
    }

    let mut current: u64 = 0;
    let mut bits_available = 0;
    let mask = (1u64 << bits_needed) - 1;
    let end = *pos + bytes_needed;

    for _ in 0..count {
        while bits_available < bits_needed {
            if *pos < end {
                current |= (input[*pos] as u64) << bits_available;
                *pos += 1;
            }
            bits_available += 8;
        }

        out.push((current & mask) as u32);
        current >>= bits_needed;
        bits_available -= bits_needed;
    }
    *pos = end;

    Ok(())
}

/// Writer for a sequence of posting lists sharing one data buffer
#[derive(Debug, Default)]
pub struct PostingsWriter {
    data: Vec<u8>,
    deltas: Vec<u32>,
}

impl PostingsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one posting list. `docs` must be strictly increasing.
    pub fn write_posting_list(&mut self, docs: &[DocNo]) -> PostingListMeta {
        let offset = self.data.len() as u64;
        let block_count = docs.len().div_ceil(BLOCK_SIZE);
        encode_vbyte(block_count as u32, &mut self.data);

        let mut prev = 0u32;
        for block in docs.chunks(BLOCK_SIZE) {
            encode_vbyte(block.len() as u32, &mut self.data);
            self.deltas.clear();
            for docno in block {
                self.deltas.push(docno.0 - prev);
                prev = docno.0;
            }
            bitpack_encode(&self.deltas, &mut self.data);
        }

        PostingListMeta {
            offset,
            length: self.data.len() as u64 - offset,
            doc_frequency: docs.len() as u32,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Reader for posting lists
#[derive(Debug, Clone, Default)]
pub struct PostingsReader {
    data: Vec<u8>,
}

impl PostingsReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decode the posting list described by `meta` into `out`.
    ///
    /// `deltas` is a scratch buffer reused across calls.
    pub fn read_posting_list(
        &self,
        meta: &PostingListMeta,
        out: &mut Vec<DocNo>,
        deltas: &mut Vec<u32>,
    ) -> io::Result<()> {
        let start = meta.offset as usize;
        let end = meta
            .offset
            .checked_add(meta.length)
            .map(|e| e as usize)
            .filter(|&e| e <= self.data.len())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    "Posting list extends beyond data",
                )
            })?;
        let list = &self.data[start..end];

        out.clear();
        let mut pos = 0;
        let block_count = decode_vbyte(list, &mut pos)?;
        let mut prev: Option<u32> = None;

        for _ in 0..block_count {
            let len = decode_vbyte(list, &mut pos)? as usize;
            if len == 0 || len > BLOCK_SIZE {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Invalid posting block length {}", len),
                ));
            }
            bitpack_decode(list, &mut pos, len, deltas)?;
            for &delta in deltas.iter() {
                let doc = match prev {
                    None => delta,
                    Some(_) if delta == 0 => {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            "Posting list is not strictly increasing",
                        ))
                    }
                    Some(p) => p.checked_add(delta).ok_or_else(|| {
                        io::Error::new(io::ErrorKind::InvalidData, "Doc number overflow")
                    })?,
                };
                out.push(DocNo(doc));
                prev = Some(doc);
            }
        }

        if pos != list.len() || out.len() != meta.doc_frequency as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Posting list length mismatch: decoded {} docs, expected {}",
                    out.len(),
                    meta.doc_frequency
                ),
            ));
        }

        Ok(())
    }
}
