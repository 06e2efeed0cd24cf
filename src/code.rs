use crate::error::{CorruptTableError, DecodeError, EncodeError};
use crate::frequency::FrequencyTable;
use crate::pack::Packed;
use crate::tree::{HuffmanTree, NodeKind};
use bitvec::prelude::*;
use derivative::Derivative;
use log::{debug, trace};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// A single code word, most significant bit first.
pub type Code = BitVec<u8, Msb0>;

pub fn code_string(code: &BitSlice<u8, Msb0>) -> String {
    code.iter().by_vals().map(|b| if b { '1' } else { '0' }).collect()
}

pub(crate) fn code_to_bytes(code: &BitSlice<u8, Msb0>) -> Vec<u8> {
    let mut bv = code.to_bitvec();
    bv.resize((code.len() + 7) / 8 * 8, false);
    bv.into_vec()
}

pub(crate) fn code_from_bytes(bytes: &[u8], len: usize) -> Option<Code> {
    bytes.view_bits::<Msb0>().get(..len).map(|b| b.to_bitvec())
}

fn check_prefix_free<'a>(
    mut codes: Vec<&'a BitSlice<u8, Msb0>>,
) -> Result<(), CorruptTableError> {
    if codes.iter().any(|c| c.is_empty()) {
        return Err(CorruptTableError::EmptyCode);
    }

    // in lexicographic order a code's extensions directly follow it
    codes.sort_by(|a, b| a.iter().by_vals().cmp(b.iter().by_vals()));
    for pair in codes.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a == b {
            return Err(CorruptTableError::DuplicateCode);
        }
        if b.starts_with(a) {
            return Err(CorruptTableError::NotPrefixFree {
                prefix: code_string(a),
                code: code_string(b),
            });
        }
    }

    Ok(())
}

/// Symbol to code mapping, used for encoding.
#[derive(Debug, Clone, Derivative)]
#[derivative(
    Default(bound = ""),
    PartialEq(bound = "Symbol: Eq + Hash"),
    Eq(bound = "Symbol: Eq + Hash")
)]
pub struct CodeTable<Symbol> {
    encode_table: HashMap<Symbol, Code>,
}

impl<Symbol> CodeTable<Symbol>
where
    Symbol: Eq + Hash,
{
    /// Builds a table from externally supplied codes, rejecting anything
    /// that is not a prefix code.
    pub fn from_codes(
        codes: impl IntoIterator<Item = (Symbol, Code)>,
    ) -> Result<Self, CorruptTableError> {
        let mut encode_table = HashMap::new();
        for (s, code) in codes {
            if encode_table.insert(s, code).is_some() {
                return Err(CorruptTableError::DuplicateSymbol);
            }
        }

        check_prefix_free(encode_table.values().map(|c| c.as_bitslice()).collect())?;
        Ok(Self { encode_table })
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&BitSlice<u8, Msb0>> {
        self.encode_table.get(symbol).map(|c| c.as_bitslice())
    }

    /// Concatenates the code of every symbol and packs the result into bytes.
    pub fn encode<B>(&self, stream: impl IntoIterator<Item = B>) -> Result<Packed, EncodeError>
    where
        B: Borrow<Symbol>,
    {
        let mut out = Code::new();
        for (position, s) in stream.into_iter().enumerate() {
            let code = self
                .encode_table
                .get(s.borrow())
                .ok_or(EncodeError::MissingCode { position })?;
            out.extend_from_bitslice(code);
        }

        let packed = Packed::from_bits(out);
        debug!(
            "encoded {} bits into {} bytes, padding {}",
            packed.bit_len(),
            packed.bytes().len(),
            packed.padding()
        );
        Ok(packed)
    }

    /// Sum of `count * code length` over the table, or `None` if a counted
    /// symbol has no code.
    pub fn weighted_length(&self, freq: &FrequencyTable<Symbol>) -> Option<usize> {
        freq.iter()
            .map(|(s, count)| self.encode_table.get(s).map(|c| c.len() * count))
            .sum()
    }
}

impl<Symbol> CodeTable<Symbol>
where
    Symbol: Eq + Hash + Clone,
{
    /// The inverse mapping. Codes are already known to be distinct.
    pub fn reverse(&self) -> ReverseCodeTable<Symbol> {
        ReverseCodeTable {
            decode_table: self
                .encode_table
                .iter()
                .map(|(s, c)| (c.clone(), s.clone()))
                .collect(),
            max_len: self.max_len(),
        }
    }
}

impl<Symbol> CodeTable<Symbol> {
    pub fn len(&self) -> usize {
        self.encode_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encode_table.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.encode_table.values().map(|c| c.len()).max().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &BitSlice<u8, Msb0>)> {
        self.encode_table.iter().map(|(s, c)| (s, c.as_bitslice()))
    }

    /// Entries ordered by code length, then by code.
    pub fn by_length(&self) -> Vec<(&Symbol, &BitSlice<u8, Msb0>)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|(_, a), (_, b)| {
            a.len()
                .cmp(&b.len())
                .then_with(|| a.iter().by_vals().cmp(b.iter().by_vals()))
        });
        entries
    }
}

impl<Symbol> Serialize for CodeTable<Symbol>
where
    Symbol: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // serialize a code as its bit length and MSB-first bytes
        serializer.collect_seq(
            self.by_length()
                .into_iter()
                .map(|(s, c)| (s, c.len(), code_to_bytes(c))),
        )
    }
}

impl<'de, Symbol> Deserialize<'de> for CodeTable<Symbol>
where
    Symbol: Deserialize<'de> + Eq + Hash,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<(Symbol, usize, Vec<u8>)>::deserialize(deserializer)?;
        let codes = entries
            .into_iter()
            .map(|(s, len, bytes)| {
                code_from_bytes(&bytes, len)
                    .map(|c| (s, c))
                    .ok_or_else(|| D::Error::custom("code length exceeds its bytes"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_codes(codes).map_err(D::Error::custom)
    }
}

/// Code to symbol mapping, used for decoding.
#[derive(Debug, Clone, Derivative)]
#[derivative(Default(bound = ""), PartialEq)]
pub struct ReverseCodeTable<Symbol> {
    decode_table: HashMap<Code, Symbol>,

    #[derivative(PartialEq = "ignore")]
    max_len: usize,
}

impl<Symbol> ReverseCodeTable<Symbol>
where
    Symbol: Eq + Hash,
{
    pub fn from_codes(
        codes: impl IntoIterator<Item = (Code, Symbol)>,
    ) -> Result<Self, CorruptTableError> {
        let mut decode_table = HashMap::new();
        for (code, s) in codes {
            if decode_table.insert(code, s).is_some() {
                return Err(CorruptTableError::DuplicateCode);
            }
        }

        let mut seen = HashSet::new();
        if !decode_table.values().all(|s| seen.insert(s)) {
            return Err(CorruptTableError::DuplicateSymbol);
        }
        check_prefix_free(decode_table.keys().map(|c| c.as_bitslice()).collect())?;

        let max_len = decode_table.keys().map(|c| c.len()).max().unwrap_or(0);
        Ok(Self {
            decode_table,
            max_len,
        })
    }
}

impl<Symbol> ReverseCodeTable<Symbol> {
    pub fn len(&self) -> usize {
        self.decode_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decode_table.is_empty()
    }

    pub fn get(&self, code: &BitSlice<u8, Msb0>) -> Option<&Symbol> {
        self.decode_table.get(code)
    }
}

impl<Symbol> ReverseCodeTable<Symbol>
where
    Symbol: Clone,
{
    pub fn decode(&self, packed: &Packed) -> Result<Vec<Symbol>, DecodeError> {
        self.decode_bits(packed.bits())
    }

    /// Matches codes left to right against the table.
    ///
    /// Fails if a candidate grows past the longest code without matching, or
    /// if the stream ends inside a code.
    pub fn decode_bits(&self, input: &BitSlice<u8, Msb0>) -> Result<Vec<Symbol>, DecodeError> {
        let mut out = Vec::new();

        let mut cursor = Code::new();
        let mut start = 0;
        for (i, b) in input.iter().by_vals().enumerate() {
            cursor.push(b);
            if let Some(sym) = self.decode_table.get(&cursor) {
                cursor.clear();
                out.push(sym.clone());
                start = i + 1;
            } else if cursor.len() >= self.max_len {
                return Err(DecodeError::InvalidCode { offset: start });
            }
        }

        if !cursor.is_empty() {
            return Err(DecodeError::TrailingBits { bits: cursor.len() });
        }

        Ok(out)
    }
}

/// Walks the tree to assign codes: `0` for a left edge, `1` for a right one.
///
/// A tree that is a single leaf gets the code `0`.
pub fn generate_codes<Symbol>(
    tree: &HuffmanTree<Symbol>,
) -> (CodeTable<Symbol>, ReverseCodeTable<Symbol>)
where
    Symbol: Eq + Hash + Clone,
{
    let mut encode_table = HashMap::new();
    let root = tree.root();

    if let Some(sym) = tree.node(root).symbol() {
        let mut code = Code::new();
        code.push(false);
        encode_table.insert(sym.clone(), code);
    } else {
        let mut stack = vec![(root, Code::new())];
        while let Some((id, code)) = stack.pop() {
            match tree.node(id).kind() {
                NodeKind::Leaf(sym) => {
                    encode_table.insert(sym.clone(), code);
                }
                NodeKind::Internal { left, right } => {
                    let mut r = code.clone();
                    r.push(true);
                    let mut l = code;
                    l.push(false);
                    stack.push((*right, r));
                    stack.push((*left, l));
                }
            }
        }
    }

    let codes = CodeTable { encode_table };
    trace!("generated {} codes, longest {} bits", codes.len(), codes.max_len());
    let reverse = codes.reverse();
    (codes, reverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build_tree;

    fn code(s: &str) -> Code {
        s.chars().map(|c| c == '1').collect()
    }

    fn codes_of(s: &str) -> CodeTable<char> {
        generate_codes(&build_tree(s.chars()).unwrap()).0
    }

    #[test]
    fn single_symbol_gets_zero() {
        let codes = codes_of("aaaa");
        assert_eq!(codes.len(), 1);
        assert_eq!(code_string(codes.get(&'a').unwrap()), "0");
    }

    #[test]
    fn left_zero_right_one() {
        let codes = codes_of("aabbbcc");
        assert_eq!(code_string(codes.get(&'b').unwrap()), "0");
        assert_eq!(code_string(codes.get(&'a').unwrap()), "10");
        assert_eq!(code_string(codes.get(&'c').unwrap()), "11");
    }

    #[test]
    fn most_frequent_gets_shortest() {
        let codes = codes_of("aabbbcc");
        let b = codes.get(&'b').unwrap().len();
        assert!(codes.get(&'a').unwrap().len() >= b);
        assert!(codes.get(&'c').unwrap().len() >= b);
    }

    #[test]
    fn reverse_is_inverse() {
        let tree = build_tree("this is an example for huffman encoding".chars()).unwrap();
        let (codes, rev) = generate_codes(&tree);
        assert_eq!(codes.len(), rev.len());
        for (s, c) in codes.iter() {
            assert_eq!(rev.get(c), Some(s));
        }
    }

    #[test]
    fn weighted_length_known_distribution() {
        // frequencies 1,1,2,4,8 give code lengths 4,4,3,2,1
        let input = "abccddddeeeeeeee";
        let codes = codes_of(input);
        let freq = FrequencyTable::from_symbols(input.chars());
        assert_eq!(codes.weighted_length(&freq), Some(30));
        assert_eq!(codes.get(&'e').unwrap().len(), 1);
        assert_eq!(codes.get(&'a').unwrap().len(), 4);
    }

    #[test]
    fn weighted_length_missing_symbol() {
        let codes = codes_of("ab");
        let freq = FrequencyTable::from_symbols("abc".chars());
        assert_eq!(codes.weighted_length(&freq), None);
    }

    #[test]
    fn encode_missing_symbol() {
        let codes = codes_of("ab");
        assert_eq!(
            codes.encode("abc".chars()),
            Err(EncodeError::MissingCode { position: 2 })
        );
    }

    #[test]
    fn from_codes_validation() {
        assert_eq!(
            CodeTable::from_codes([('a', code("")), ('b', code("1"))]),
            Err(CorruptTableError::EmptyCode)
        );
        assert_eq!(
            CodeTable::from_codes([('a', code("0")), ('b', code("01"))]),
            Err(CorruptTableError::NotPrefixFree {
                prefix: "0".into(),
                code: "01".into()
            })
        );
        assert_eq!(
            CodeTable::from_codes([('a', code("10")), ('b', code("10"))]),
            Err(CorruptTableError::DuplicateCode)
        );
        assert!(CodeTable::from_codes([('a', code("0")), ('b', code("10"))]).is_ok());

        assert_eq!(
            ReverseCodeTable::from_codes([(code("0"), 'a'), (code("1"), 'a')]),
            Err(CorruptTableError::DuplicateSymbol)
        );
        assert_eq!(
            ReverseCodeTable::from_codes([(code("1"), 'a'), (code("110"), 'b')]),
            Err(CorruptTableError::NotPrefixFree {
                prefix: "1".into(),
                code: "110".into()
            })
        );
    }

    #[test]
    fn decode_invalid_code() {
        let rev = ReverseCodeTable::from_codes([(code("0"), 'a')]).unwrap();
        let bits = code("001");
        assert_eq!(
            rev.decode_bits(&bits),
            Err(DecodeError::InvalidCode { offset: 2 })
        );
    }

    #[test]
    fn decode_trailing_bits() {
        let rev = ReverseCodeTable::from_codes([(code("0"), 'a'), (code("10"), 'b')]).unwrap();
        assert_eq!(rev.decode_bits(&code("0100")), Ok(vec!['a', 'b', 'a']));
        assert_eq!(
            rev.decode_bits(&code("01")),
            Err(DecodeError::TrailingBits { bits: 1 })
        );
    }

    #[test]
    fn empty_table_decodes_empty() {
        let rev = ReverseCodeTable::<u8>::default();
        assert_eq!(rev.decode_bits(BitSlice::empty()), Ok(vec![]));
        assert_eq!(
            rev.decode_bits(&code("0")),
            Err(DecodeError::InvalidCode { offset: 0 })
        );
    }

    #[test]
    fn serde_roundtrip() {
        let codes = codes_of("abracadabra");
        let data = rmp_serde::to_vec(&codes).unwrap();
        let back: CodeTable<char> = rmp_serde::from_slice(&data).unwrap();
        assert_eq!(back, codes);
    }

    #[test]
    fn serde_rejects_overlong_code() {
        let data = rmp_serde::to_vec(&vec![('a', 9usize, vec![0u8])]).unwrap();
        assert!(rmp_serde::from_slice::<CodeTable<char>>(&data).is_err());
    }

    #[test]
    fn serde_rejects_prefix_code() {
        let data = rmp_serde::to_vec(&vec![('a', 1usize, vec![0u8]), ('b', 2, vec![0x40])]).unwrap();
        assert!(rmp_serde::from_slice::<CodeTable<char>>(&data).is_err());
    }
}
