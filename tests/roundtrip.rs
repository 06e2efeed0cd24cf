use huffpack::{
    build_tree, code_string, compress, decode, decompress, encode, generate_codes, DecodeError,
    FrequencyTable, HuffmanTree, ReverseCodeTable,
};
use proptest::prelude::*;

/// Cost of an optimal prefix code, computed by merging a sorted list.
fn optimal_cost(mut weights: Vec<usize>) -> usize {
    let mut cost = 0;
    while weights.len() > 1 {
        weights.sort_unstable_by(|a, b| b.cmp(a));
        let (Some(a), Some(b)) = (weights.pop(), weights.pop()) else {
            unreachable!()
        };
        cost += a + b;
        weights.push(a + b);
    }
    cost
}

fn entropy_bits(freq: &FrequencyTable<u8>) -> f64 {
    let n = freq.total() as f64;
    freq.iter()
        .map(|(_, c)| {
            let p = c as f64 / n;
            -(c as f64) * p.log2()
        })
        .sum()
}

#[test]
fn concrete_scenario() {
    let input: Vec<char> = "aabbbcc".chars().collect();
    let compressed = encode(&input).unwrap();
    let codes = compressed.codes();

    let b = codes.get(&'b').unwrap().len();
    assert!(codes.get(&'a').unwrap().len() >= b);
    assert!(codes.get(&'c').unwrap().len() >= b);
    assert!(compressed.packed().bit_len() <= input.len() * 8);
    assert_eq!(compressed.decompress().unwrap(), input);
}

#[test]
fn singleton_scenario() {
    let compressed = encode(b"aaaa").unwrap();
    assert_eq!(compressed.codes().len(), 1);
    assert_eq!(code_string(compressed.codes().get(&b'a').unwrap()), "0");
    assert_eq!(compressed.packed().bytes().len(), 1);
    assert_eq!(compressed.packed().padding(), 4);
}

#[test]
fn empty_scenario() {
    assert!(build_tree(Vec::<char>::new()).is_none());
    let compressed = encode::<char>(&[]).unwrap();
    assert_eq!(compressed.packed().bytes(), &[] as &[u8]);
    assert_eq!(compressed.packed().padding(), 0);
    assert_eq!(decode(&[], 0, &ReverseCodeTable::<char>::default()), Ok(vec![]));
}

#[test]
fn corruption_is_reported() {
    let input: Vec<char> = "aabbbcc".chars().collect();
    let compressed = encode(&input).unwrap();
    let reverse = compressed.codes().reverse();
    let bytes = compressed.packed().bytes();
    let padding = compressed.packed().padding();

    assert!(matches!(
        decode(bytes, padding + 1, &reverse),
        Err(DecodeError::TrailingBits { .. })
    ));
}

#[test]
fn tree_and_table_agree() {
    let input = "the quick brown fox jumps over the lazy dog".as_bytes();
    let tree = build_tree(input.iter().copied()).unwrap();
    let (codes, reverse) = generate_codes(&tree);
    let packed = codes.encode(input).unwrap();

    assert_eq!(tree.decode(&packed).unwrap(), input);
    assert_eq!(reverse.decode(&packed).unwrap(), input);
    assert_eq!(
        decode(packed.bytes(), packed.padding(), &reverse).unwrap(),
        input
    );
}

#[test]
fn serialized_tree_decodes() {
    let input = b"serialize the tree shape instead of the table";
    let tree = build_tree(input.iter().copied()).unwrap();
    let packed = generate_codes(&tree).0.encode(input).unwrap();

    let data = rmp_serde::to_vec(&tree).unwrap();
    let restored: HuffmanTree<u8> = rmp_serde::from_slice(&data).unwrap();
    assert_eq!(restored.decode(&packed).unwrap(), input);
}

proptest! {
    #[test]
    fn prop_roundtrip_bytes(input in proptest::collection::vec(any::<u8>(), 0..512)) {
        let compressed = encode(&input)?;
        prop_assert_eq!(compressed.decompress()?, input);
    }

    #[test]
    fn prop_roundtrip_chars(input in ".{0,128}") {
        let symbols: Vec<char> = input.chars().collect();
        let compressed = encode(&symbols)?;
        let decoded: String = compressed.decompress()?.into_iter().collect();
        prop_assert_eq!(decoded, input);
    }

    #[test]
    fn prop_container_roundtrip(input in proptest::collection::vec(any::<u8>(), 0..512)) {
        let packed = compress(&input)?;
        prop_assert_eq!(decompress(&packed)?, input);
    }

    #[test]
    fn prop_prefix_free(input in proptest::collection::vec(0u8..32, 1..256)) {
        let tree = build_tree(input.iter().copied()).unwrap();
        let (codes, _) = generate_codes(&tree);
        let all: Vec<_> = codes.iter().map(|(_, c)| c).collect();
        for (i, a) in all.iter().enumerate() {
            prop_assert!(!a.is_empty());
            for (j, b) in all.iter().enumerate() {
                if i != j {
                    prop_assert!(!b.starts_with(*a));
                }
            }
        }
    }

    #[test]
    fn prop_padding_bound(input in proptest::collection::vec(any::<u8>(), 0..256)) {
        let compressed = encode(&input)?;
        let packed = compressed.packed();
        prop_assert!(packed.padding() <= 7);
        prop_assert_eq!(packed.padding() == 0, packed.bit_len() % 8 == 0);
        prop_assert_eq!(packed.bytes().len() * 8, packed.bit_len() + packed.padding() as usize);
    }

    #[test]
    fn prop_kraft_equality(input in proptest::collection::vec(0u8..16, 2..256)) {
        prop_assume!(input.iter().any(|&b| b != input[0]));
        let tree = build_tree(input.iter().copied()).unwrap();
        let (codes, _) = generate_codes(&tree);
        let max = codes.max_len() as u32;
        prop_assert!(max < 64);
        let sum: u64 = codes.iter().map(|(_, c)| 1u64 << (max - c.len() as u32)).sum();
        prop_assert_eq!(sum, 1u64 << max);
    }

    #[test]
    fn prop_optimal_length(input in proptest::collection::vec(0u8..24, 2..512)) {
        prop_assume!(input.iter().any(|&b| b != input[0]));
        let freq = FrequencyTable::from_symbols(input.iter().copied());
        let tree = HuffmanTree::from_frequencies(&freq).unwrap();
        let (codes, _) = generate_codes(&tree);
        let cost = codes.weighted_length(&freq).unwrap();

        prop_assert_eq!(cost, optimal_cost(freq.iter().map(|(_, c)| c).collect()));
        let h = entropy_bits(&freq);
        prop_assert!(cost as f64 >= h - 1e-6);
        prop_assert!((cost as f64) < h + freq.total() as f64);
    }

    #[test]
    fn prop_deterministic(input in proptest::collection::vec(any::<u8>(), 0..256)) {
        prop_assert_eq!(compress(&input)?, compress(&input)?);
        prop_assert_eq!(build_tree(input.iter().copied()), build_tree(input.iter().copied()));
    }
}
