use clap::Parser;
use huffpack::{build_tree, code_string, generate_codes, FrequencyTable, HuffmanTree, NodeId};
use std::time::Instant;

/// Encode a piece of text and show what the codec produced.
#[derive(Parser)]
struct Args {
    /// Text to encode
    #[arg(default_value = "this is an example for huffman encoding")]
    text: String,
}

fn display(c: char) -> String {
    match c {
        ' ' => "'space'".into(),
        '\n' => "'\\n'".into(),
        '\t' => "'\\t'".into(),
        '\r' => "'\\r'".into(),
        c if c.is_control() => format!("'\\x{:02x}'", c as u32),
        c => format!("'{c}'"),
    }
}

/// Draws the tree with the right child above the left one.
fn render_tree(tree: &HuffmanTree<char>) -> String {
    fn walk(tree: &HuffmanTree<char>, id: NodeId, prefix: &str, last: bool, out: &mut String) {
        let node = tree.node(id);
        let branch = if last { "└── " } else { "├── " };
        let label = match node.symbol() {
            Some(s) => format!("{}: {}", display(*s), node.weight()),
            None => format!("internal: {}", node.weight()),
        };
        out.push_str(&format!("{prefix}{branch}{label}\n"));

        if let Some((left, right)) = node.children() {
            let prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            walk(tree, right, &prefix, false, out);
            walk(tree, left, &prefix, true, out);
        }
    }

    let mut out = String::new();
    walk(tree, tree.root(), "", true, &mut out);
    out
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let symbols: Vec<char> = args.text.chars().collect();

    let start = Instant::now();
    let Some(tree) = build_tree(symbols.iter().copied()) else {
        println!("empty input");
        return Ok(());
    };
    let (codes, reverse) = generate_codes(&tree);
    let packed = codes.encode(&symbols)?;
    let encode_time = start.elapsed();

    println!("codes:");
    for (s, c) in codes.by_length() {
        println!("  {}: {}", display(*s), code_string(c));
    }

    let sample: Vec<String> = symbols
        .iter()
        .take(10)
        .filter_map(|s| Some(format!("{}->{}", display(*s), code_string(codes.get(s)?))))
        .collect();
    println!("\n{}", sample.join(" | "));

    println!("\nbits: {}", packed.bit_string());
    let groups: Vec<String> = packed
        .bytes()
        .iter()
        .map(|b| format!("{b:08b}"))
        .collect();
    println!("bytes: {} (padding {})", groups.join(" "), packed.padding());

    let freq = FrequencyTable::from_symbols(symbols.iter().copied());
    let original = args.text.len();
    let compressed = packed.bytes().len();
    println!(
        "\n{} bytes -> {} bytes, ratio {:.2}x, saved {:.2}%, {:.2} bits/symbol",
        original,
        compressed,
        original as f64 / compressed as f64,
        (original - compressed.min(original)) as f64 / original as f64 * 100.0,
        codes.weighted_length(&freq).unwrap_or(0) as f64 / symbols.len() as f64
    );
    println!("encode time: {encode_time:?}");

    println!("\ntree:\n{}", render_tree(&tree));

    let start = Instant::now();
    let decoded: String = reverse.decode(&packed)?.into_iter().collect();
    println!("decode time: {:?}", start.elapsed());
    println!("round trip ok: {}", decoded == args.text);
    Ok(())
}
