use clap::Parser;
use huffpack::{compress, decompress, Compressed};
use std::fs;
use std::path::PathBuf;

/// Compress a file, read it back and check the result.
#[derive(Parser)]
struct Args {
    /// Input file
    input: PathBuf,

    /// Where to write the compressed data
    #[arg(short, long, default_value = "encoded.huf")]
    output: PathBuf,

    /// Write MessagePack instead of the compact container
    #[arg(long)]
    msgpack: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let input_bytes = fs::read(&args.input)?;

    // encode scope - save to file
    {
        let data = if args.msgpack {
            rmp_serde::to_vec(&huffpack::encode(&input_bytes)?)?
        } else {
            compress(&input_bytes)?
        };
        println!("{} -> {} bytes", input_bytes.len(), data.len());
        fs::write(&args.output, data)?;
    }

    // decode scope - read from file
    {
        let file_data = fs::read(&args.output)?;
        let decoded = if args.msgpack {
            rmp_serde::from_slice::<Compressed<u8>>(&file_data)?.decompress()?
        } else {
            decompress(&file_data)?
        };

        if decoded != input_bytes {
            return Err("decoded data does not match input".into());
        }
        println!("round trip ok");
    }

    Ok(())
}
