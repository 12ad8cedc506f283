use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;
use std::sync::Arc;

use clap::Parser;

use hatsuon::dict::{PhonemeDictionary, WordDictionary};
use hatsuon::engine::Engine;

#[derive(Parser)]
#[command(name = "hatsuon", about = "Japanese text to IPA phoneme converter")]
struct Cli {
    /// Phoneme dictionary map file (a compiled sibling .trie is preferred)
    #[arg(long, default_value = "ja_phonemes.json")]
    dict: String,

    /// Word list for segmentation (one word per line)
    #[arg(long)]
    words: Option<String>,

    /// Disable word segmentation (no spaces in output)
    #[arg(long)]
    no_segmentation: bool,

    /// Emit one JSON report per input instead of text
    #[arg(long)]
    json: bool,

    /// Directory for JSON trace logs (needs the `trace` build feature)
    #[arg(long)]
    trace_dir: Option<String>,

    /// Texts to convert; with none, reads lines interactively
    texts: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    // Held until exit so buffered trace events flush.
    let _trace_guard = cli
        .trace_dir
        .as_deref()
        .map(|dir| hatsuon::trace_init::init_tracing(Path::new(dir)));

    let phonemes = PhonemeDictionary::load_auto(Path::new(&cli.dict)).unwrap_or_else(|e| {
        eprintln!("Failed to load phoneme dictionary {}: {}", cli.dict, e);
        process::exit(1);
    });
    let mut engine = Engine::new(Arc::new(phonemes));

    if let Some(words_path) = &cli.words {
        match WordDictionary::from_list_file(Path::new(words_path)) {
            Ok(words) => engine.set_words(Arc::new(words)),
            Err(e) => {
                eprintln!("Warning: could not load word list {}: {}", words_path, e);
                eprintln!("Continuing without word segmentation");
            }
        }
    }
    engine.set_segmentation(!cli.no_segmentation);

    if cli.texts.is_empty() {
        repl(&engine, cli.json);
    } else {
        for text in &cli.texts {
            report(&engine, text, cli.json);
        }
    }
}

fn repl(engine: &Engine, json: bool) {
    let stdin = io::stdin();
    loop {
        print!("Japanese text (or \"quit\" to exit): ");
        io::stdout().flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim_end_matches(['\r', '\n']);
        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "exit" {
            break;
        }
        report(engine, input, json);
    }
}

fn report(engine: &Engine, text: &str, json: bool) {
    let result = engine.convert_detailed(text);

    if json {
        println!(
            "{}",
            serde_json::to_string(&result).expect("JSON serialization failed")
        );
        return;
    }

    println!("Input:    {}", text);
    println!("Phonemes: {}", result.phonemes);
    println!("Time:     {}us", result.elapsed_us);

    if !result.matches.is_empty() {
        println!("Matches ({}):", result.matches.len());
        for m in &result.matches {
            println!(
                "  \"{}\" -> \"{}\" (pos: {})",
                m.surface, m.phoneme, m.start_byte
            );
        }
    }
    if !result.unmatched.is_empty() {
        println!("Unmatched: {}", result.unmatched.join(", "));
    }
    println!();
}
