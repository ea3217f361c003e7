//! Endian-aware access to a fixed-length byte region (one binary cell or buffer).
//!
//! Reads copy the requested bytes into a native word and swap them when the
//! requested order disagrees with the host. The host order is probed once per
//! process. Every access is bounds-checked; nothing is truncated and nothing
//! past the end of the region is ever touched.

use std::ops::Range;
use std::sync::OnceLock;

use pgtree_api::error::DecodeError;
use pgtree_api::value::Hex;

/// Byte order of a multi-byte word inside the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Most-significant byte first (PostgreSQL binary wire format).
    Network,
    /// Least-significant byte first.
    Swapped,
}

impl ByteOrder {
    pub fn opposite(self) -> Self {
        match self {
            ByteOrder::Network => ByteOrder::Swapped,
            ByteOrder::Swapped => ByteOrder::Network,
        }
    }

    fn is_host_order(self) -> bool {
        match self {
            ByteOrder::Network => host_is_big_endian(),
            ByteOrder::Swapped => !host_is_big_endian(),
        }
    }
}

/// Host byte order, probed on first use by writing a known word and
/// inspecting its first byte.
pub fn host_is_big_endian() -> bool {
    static BIG_ENDIAN: OnceLock<bool> = OnceLock::new();
    *BIG_ENDIAN.get_or_init(|| {
        let probe = 0x0000_0001u32.to_ne_bytes();
        probe[0] == 0
    })
}

mod sealed {
    pub trait Sealed {}
}

/// Fixed-width integer readable from / writable to a `BufferView`.
pub trait Word: sealed::Sealed + Copy {
    const WIDTH: usize;

    fn read_native(bytes: &[u8]) -> Self;
    fn write_native(self, out: &mut [u8]);
    fn swap(self) -> Self;
}

macro_rules! impl_word {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Word for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn read_native(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_ne_bytes(raw)
                }

                fn write_native(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_ne_bytes());
                }

                fn swap(self) -> Self {
                    self.swap_bytes()
                }
            }
        )*
    };
}

impl_word!(i16, u16, i32, u32, i64, u64);

/// Typed, offset-based view over a byte region.
///
/// Read access needs `B: AsRef<[u8]>`; writes additionally need `AsMut<[u8]>`
/// (`&mut [u8]`, `Vec<u8>`, arrays).
#[derive(Debug, Clone)]
pub struct BufferView<B> {
    bytes: B,
}

impl<B: AsRef<[u8]>> BufferView<B> {
    pub fn new(bytes: B) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.as_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_ref()
    }

    pub fn into_inner(self) -> B {
        self.bytes
    }

    pub fn get_u8(&self, offset: usize) -> Result<u8, DecodeError> {
        let range = self.range(offset, 1)?;
        Ok(self.as_bytes()[range.start])
    }

    pub fn get_i8(&self, offset: usize) -> Result<i8, DecodeError> {
        self.get_u8(offset).map(|b| b as i8)
    }

    pub fn get<W: Word>(&self, offset: usize, order: ByteOrder) -> Result<W, DecodeError> {
        let range = self.range(offset, W::WIDTH)?;
        let word = W::read_native(&self.as_bytes()[range]);
        Ok(if order.is_host_order() { word } else { word.swap() })
    }

    /// Lowercase hex of the whole region.
    pub fn to_hex(&self) -> String {
        bytes_to_hex(self.as_bytes())
    }

    fn range(&self, offset: usize, width: usize) -> Result<Range<usize>, DecodeError> {
        let len = self.len();
        match offset.checked_add(width) {
            Some(end) if end <= len => Ok(offset..end),
            _ => Err(DecodeError::bounds(format!(
                "{width}-byte access at offset {offset} exceeds buffer of {len} bytes"
            ))),
        }
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> BufferView<B> {
    pub fn set_u8(&mut self, offset: usize, value: u8) -> Result<&mut Self, DecodeError> {
        let range = self.range(offset, 1)?;
        self.bytes.as_mut()[range.start] = value;
        Ok(self)
    }

    pub fn set_i8(&mut self, offset: usize, value: i8) -> Result<&mut Self, DecodeError> {
        self.set_u8(offset, value as u8)
    }

    pub fn set<W: Word>(
        &mut self,
        offset: usize,
        value: W,
        order: ByteOrder,
    ) -> Result<&mut Self, DecodeError> {
        let range = self.range(offset, W::WIDTH)?;
        let word = if order.is_host_order() { value } else { value.swap() };
        word.write_native(&mut self.bytes.as_mut()[range]);
        Ok(self)
    }

    pub fn zero_fill(&mut self) -> &mut Self {
        self.bytes.as_mut().fill(0);
        self
    }
}

// ---------------------------------------------------------------------------
// Hex conversions
// ---------------------------------------------------------------------------

/// Digit value per byte; anything that is not a hex digit maps to 0.
const HEX_VALUES: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 10 {
        table[b'0' as usize + i] = i as u8;
        i += 1;
    }
    let mut i = 0;
    while i < 6 {
        table[b'a' as usize + i] = 10 + i as u8;
        table[b'A' as usize + i] = 10 + i as u8;
        i += 1;
    }
    table
};

pub fn bytes_to_hex(bytes: &[u8]) -> String {
    Hex(bytes).to_string()
}

/// Lenient hex decode: two digits per byte, non-hex characters read as 0,
/// a trailing odd digit is ignored. Never fails.
pub fn hex_to_bytes(hex: &str) -> Vec<u8> {
    let mut out = vec![0u8; hex.len() / 2];
    decode_hex_into(hex.as_bytes(), &mut out);
    out
}

/// Decode into a caller-provided buffer (e.g. arena-owned). Returns the number
/// of bytes written: `min(out.len(), hex.len() / 2)`.
pub fn decode_hex_into(hex: &[u8], out: &mut [u8]) -> usize {
    let mut written = 0;
    for (slot, pair) in out.iter_mut().zip(hex.chunks_exact(2)) {
        *slot = HEX_VALUES[usize::from(pair[0])] << 4 | HEX_VALUES[usize::from(pair[1])];
        written += 1;
    }
    written
}
