use crate::code::{code_string, generate_codes, Code, CodeTable, ReverseCodeTable};
use crate::error::{DecodeError, EncodeError};
use crate::frequency::FrequencyTable;
use crate::tree::HuffmanTree;
use bitvec::prelude::*;
use derivative::Derivative;
use log::debug;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// A bitstream packed into bytes, MSB first, with the number of zero bits
/// appended to fill the last byte.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPacked")]
pub struct Packed {
    bytes: Vec<u8>,
    padding: u8,
}

#[derive(Deserialize)]
struct RawPacked {
    bytes: Vec<u8>,
    padding: u8,
}

fn check_padding(bytes: &[u8], padding: u8) -> Result<(), DecodeError> {
    if padding > 7 || (bytes.is_empty() && padding != 0) {
        return Err(DecodeError::InvalidPadding {
            padding,
            len: bytes.len(),
        });
    }
    Ok(())
}

impl TryFrom<RawPacked> for Packed {
    type Error = DecodeError;

    fn try_from(raw: RawPacked) -> Result<Self, Self::Error> {
        Self::from_parts(raw.bytes, raw.padding)
    }
}

impl Packed {
    /// Pads `bits` with zeros to a byte boundary.
    pub fn from_bits(mut bits: Code) -> Self {
        let len = bits.len();
        let padding = (8 - len % 8) % 8;
        bits.resize(len + padding, false);

        Self {
            bytes: bits.into_vec(),
            padding: padding as u8,
        }
    }

    /// Reassembles stored bytes and padding, rejecting padding outside
    /// `0..=7` or on an empty stream.
    pub fn from_parts(bytes: Vec<u8>, padding: u8) -> Result<Self, DecodeError> {
        check_padding(&bytes, padding)?;
        Ok(Self { bytes, padding })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn padding(&self) -> u8 {
        self.padding
    }

    pub fn into_parts(self) -> (Vec<u8>, u8) {
        (self.bytes, self.padding)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Length of the stream without padding.
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 - self.padding as usize
    }

    pub fn bits(&self) -> &BitSlice<u8, Msb0> {
        &self.bytes.view_bits::<Msb0>()[..self.bit_len()]
    }

    pub fn bit_string(&self) -> String {
        code_string(self.bits())
    }
}

/// Everything needed to reconstruct an input: its codes and packed stream.
#[derive(Debug, Clone, Derivative, Serialize, Deserialize)]
#[derivative(
    PartialEq(bound = "Symbol: Eq + Hash"),
    Eq(bound = "Symbol: Eq + Hash")
)]
#[serde(bound(
    serialize = "Symbol: Serialize",
    deserialize = "Symbol: Deserialize<'de> + Eq + Hash"
))]
pub struct Compressed<Symbol> {
    codes: CodeTable<Symbol>,
    packed: Packed,
}

impl<Symbol> Compressed<Symbol> {
    pub fn new(codes: CodeTable<Symbol>, packed: Packed) -> Self {
        Self { codes, packed }
    }

    pub fn codes(&self) -> &CodeTable<Symbol> {
        &self.codes
    }

    pub fn packed(&self) -> &Packed {
        &self.packed
    }

    pub fn into_parts(self) -> (CodeTable<Symbol>, Packed) {
        (self.codes, self.packed)
    }
}

impl<Symbol> Compressed<Symbol>
where
    Symbol: Eq + Hash + Clone,
{
    pub fn decompress(&self) -> Result<Vec<Symbol>, DecodeError> {
        self.codes.reverse().decode(&self.packed)
    }
}

/// Builds the tree and codes for `symbols` and encodes them.
///
/// Empty input yields an empty table and an empty stream.
pub fn encode<Symbol>(symbols: &[Symbol]) -> Result<Compressed<Symbol>, EncodeError>
where
    Symbol: Eq + Hash + Clone,
{
    let freq = FrequencyTable::from_symbols(symbols.iter().cloned());
    debug!("encode: {} symbols, {} distinct", freq.total(), freq.len());

    match HuffmanTree::from_frequencies(&freq) {
        Some(tree) => encode_with_tree(symbols, &tree),
        None => Ok(Compressed::new(CodeTable::default(), Packed::default())),
    }
}

/// Encodes `symbols` with the codes of an existing tree.
pub fn encode_with_tree<Symbol>(
    symbols: &[Symbol],
    tree: &HuffmanTree<Symbol>,
) -> Result<Compressed<Symbol>, EncodeError>
where
    Symbol: Eq + Hash + Clone,
{
    let (codes, _) = generate_codes(tree);
    let packed = codes.encode(symbols)?;
    Ok(Compressed::new(codes, packed))
}

/// Decodes stored bytes, stripping `padding` trailing bits first.
pub fn decode<Symbol>(
    bytes: &[u8],
    padding: u8,
    table: &ReverseCodeTable<Symbol>,
) -> Result<Vec<Symbol>, DecodeError>
where
    Symbol: Clone,
{
    check_padding(bytes, padding)?;

    let bits = bytes.view_bits::<Msb0>();
    let out = table.decode_bits(&bits[..bits.len() - padding as usize])?;
    debug!("decoded {} bytes into {} symbols", bytes.len(), out.len());
    Ok(out)
}
