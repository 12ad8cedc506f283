use std::fs;
use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};

use hatsuon::dict::PhonemeDictionary;

#[derive(Parser)]
#[command(name = "hatsuondict", about = "Hatsuon dictionary build tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a phoneme map file into the binary JPHO format
    Compile {
        /// Input map file (flat {"surface": "phoneme"} pairs)
        input_file: String,
        /// Output .trie file
        output_file: String,
    },

    /// Show entry count and size of a dictionary file
    Info {
        /// Dictionary file (.trie or map file, auto-detected by magic bytes)
        file: String,
    },

    /// Look up the phoneme for a surface form
    Lookup {
        /// Dictionary file (.trie or map file, auto-detected by magic bytes)
        file: String,
        /// Surface form to look up
        surface: String,
    },
}

fn open_any(path: &str) -> PhonemeDictionary {
    let result = match fs::read(path) {
        Ok(bytes) if bytes.starts_with(b"JPHO") => PhonemeDictionary::from_binary_slice(&bytes),
        Ok(bytes) => PhonemeDictionary::from_map_slice(&bytes),
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            process::exit(1);
        }
    };
    result.unwrap_or_else(|e| {
        eprintln!("Failed to load {}: {}", path, e);
        process::exit(1);
    })
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Compile {
            input_file,
            output_file,
        } => {
            let dict = PhonemeDictionary::from_map_file(Path::new(&input_file))
                .unwrap_or_else(|e| {
                    eprintln!("Failed to load {}: {}", input_file, e);
                    process::exit(1);
                });
            dict.save_binary(Path::new(&output_file)).unwrap_or_else(|e| {
                eprintln!("Failed to write {}: {}", output_file, e);
                process::exit(1);
            });
            eprintln!(
                "Compiled {} entries: {} -> {}",
                dict.entry_count(),
                input_file,
                output_file
            );
        }

        Command::Info { file } => {
            let dict = open_any(&file);
            let size = fs::metadata(&file).map(|m| m.len()).unwrap_or(0);
            println!("file:    {}", file);
            println!("size:    {} bytes", size);
            println!("entries: {}", dict.entry_count());
        }

        Command::Lookup { file, surface } => {
            let dict = open_any(&file);
            match dict.lookup(&surface) {
                Some(phoneme) => println!("{} -> {}", surface, phoneme),
                None => {
                    eprintln!("{} not found", surface);
                    process::exit(1);
                }
            }
        }
    }
}
