//! Synthetic Corpus Generator
//!
//! Produces the CPU workload's input: deterministic text files drawn from
//! a seeded vocabulary. A small "hot" subset of the vocabulary receives a
//! disproportionate share of draws so the resulting histogram has a
//! realistic skew instead of a flat distribution.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Words per output line
const CHUNK_SIZE: usize = 2000;

/// Share of draws that come from the hot subset
const HOT_SHARE: f64 = 0.35;

/// Generator parameters
pub struct GenerateArgs {
    /// Target directory for the `.txt` files
    pub out_dir: PathBuf,
    /// Number of files to write
    pub files: usize,
    /// Words per file
    pub words_per_file: usize,
    /// Vocabulary size (distinct words)
    pub vocab: usize,
    /// RNG seed; identical seeds produce identical corpora
    pub seed: u64,
}

fn make_vocab(rng: &mut StdRng, size: usize) -> Vec<String> {
    (0..size)
        .map(|_| {
            let len = rng.gen_range(3..=10);
            (0..len)
                .map(|_| rng.gen_range(b'a'..=b'z') as char)
                .collect()
        })
        .collect()
}

/// Generate the corpus.
pub fn run(args: &GenerateArgs) -> anyhow::Result<()> {
    let files = args.files.max(1);
    let words_per_file = args.words_per_file.max(1);
    let vocab_size = args.vocab.max(10);

    let mut rng = StdRng::seed_from_u64(args.seed);
    std::fs::create_dir_all(&args.out_dir)?;

    let vocab = make_vocab(&mut rng, vocab_size);
    let hot = &vocab[..(vocab.len() / 20).max(1)];

    for i in 1..=files {
        let path = args.out_dir.join(format!("gen_{i:04}.txt"));
        let mut writer = BufWriter::new(File::create(&path)?);
        let mut chunk: Vec<&str> = Vec::with_capacity(CHUNK_SIZE);

        for _ in 0..words_per_file {
            let word = if rng.gen::<f64>() < HOT_SHARE {
                hot.choose(&mut rng).expect("hot subset is non-empty")
            } else {
                vocab.choose(&mut rng).expect("vocab is non-empty")
            };
            chunk.push(word.as_str());

            if chunk.len() >= CHUNK_SIZE {
                writeln!(writer, "{}", chunk.join(" "))?;
                chunk.clear();
            }
        }

        if !chunk.is_empty() {
            writeln!(writer, "{}", chunk.join(" "))?;
        }
        writer.flush()?;
    }

    println!("Generated {} files in: {}", files, args.out_dir.display());
    Ok(())
}
