//! Bounds-checked big-endian cursor over class file bytes

use crate::error::{Error, Result};

/// Forward-only reader that reports the offset of every short read
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Start reading at `pos`
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Borrow the next `len` bytes and advance past them
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    /// Hand out a reader bounded to the next `len` bytes and advance past them.
    /// Offsets reported by the returned reader stay absolute.
    pub fn split(&mut self, len: usize) -> Result<ByteReader<'a>> {
        let start = self.pos;
        self.take(len)?;
        Ok(ByteReader {
            data: &self.data[..self.pos],
            pos: start,
        })
    }

    /// Read an attribute table header-by-header, skipping every body
    pub fn skip_attributes(&mut self) -> Result<()> {
        let count = self.read_u16()?;
        for _ in 0..count {
            let _name_index = self.read_u16()?;
            let length = self.read_u32()? as usize;
            self.skip(length)?;
        }
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| Error::truncated(self.pos, len - self.remaining().min(len)))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_big_endian() {
        let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x34, 0x07];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u32().unwrap(), 0xCAFE_BABE);
        assert_eq!(reader.read_u16().unwrap(), 52);
        assert_eq!(reader.read_u8().unwrap(), 7);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_short_read_reports_offset() {
        let data = [0x00, 0x01, 0x02];
        let mut reader = ByteReader::new(&data);
        reader.read_u16().unwrap();
        match reader.read_u32() {
            Err(Error::Truncated { offset, needed }) => {
                assert_eq!(offset, 2);
                assert_eq!(needed, 3);
            }
            other => panic!("unexpected: {:?}", other),
        }
        // a failed read does not move the cursor
        assert_eq!(reader.position(), 2);
    }

    #[test]
    fn test_skip_attributes() {
        // two attributes: lengths 2 and 0, then a trailing marker byte
        let data = [0x00, 0x02, 0x00, 0x05, 0, 0, 0, 2, 0xAA, 0xBB, 0x00, 0x06, 0, 0, 0, 0, 0x42];
        let mut reader = ByteReader::new(&data);
        reader.skip_attributes().unwrap();
        assert_eq!(reader.read_u8().unwrap(), 0x42);
    }

    #[test]
    fn test_split_bounds_the_child() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        let mut reader = ByteReader::new(&data);
        reader.skip(1).unwrap();
        let mut child = reader.split(2).unwrap();
        assert_eq!(reader.position(), 3);
        assert_eq!(child.read_u16().unwrap(), 0x0203);
        match child.read_u8() {
            Err(Error::Truncated { offset, .. }) => assert_eq!(offset, 3),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
