//! Huffman coding over arbitrary symbol types.
//!
//! ```
//! let input = b"this is an example for huffman encoding";
//! let compressed = huffpack::encode(input)?;
//! assert_eq!(compressed.decompress()?, input);
//! # Ok::<(), huffpack::Error>(())
//! ```

pub mod code;
pub mod container;
pub mod error;
pub mod frequency;
pub mod pack;
pub mod tree;

pub use code::{code_string, generate_codes, Code, CodeTable, ReverseCodeTable};
pub use container::{compress, decompress};
pub use error::{CorruptTableError, DecodeError, EncodeError, Error, Result};
pub use frequency::FrequencyTable;
pub use pack::{decode, encode, encode_with_tree, Compressed, Packed};
pub use tree::{build_tree, HuffmanTree, Node, NodeId, NodeKind};
