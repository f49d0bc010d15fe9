//! Interactive explorer: type three words for an analogy, one or more
//! words for a nearest-to-sum ranking, EXIT to quit.

use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;

use analogy_rs::analogy::{self, AnalogyQuery, SearchOptions};
use analogy_rs::provider::{self, GloveCorpus, ModelSpec, ProviderConfig};
use analogy_rs::store::VectorStore;

#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive word-embedding explorer", long_about = None)]
struct Cli {
    /// Embedding family to load
    #[arg(long, value_enum, default_value_t = ModelArg::Glove)]
    model: ModelArg,

    /// Corpus variant for GloVe models
    #[arg(long, value_enum, default_value_t = CorpusArg::WikiGigaword)]
    glove_corpus: CorpusArg,

    /// Vector dimension for GloVe models
    #[arg(long, default_value_t = 100)]
    glove_dim: usize,

    /// Load vectors from a local file instead of a named model
    #[arg(long, value_name = "FILE")]
    custom_file: Option<PathBuf>,

    /// The custom file is in the word2vec binary format
    #[arg(long, requires = "custom_file")]
    binary: bool,

    /// Directory for downloaded and parsed models
    #[arg(long, default_value = "data/models")]
    cache_dir: PathBuf,

    /// How many candidates to show
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Restrict the scan to the N most frequent vocabulary entries
    #[arg(long, value_name = "N")]
    search_space: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModelArg {
    Word2vec,
    Glove,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CorpusArg {
    WikiGigaword,
    Twitter,
}

fn get_input() -> io::Result<String> {
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

fn session(store: &VectorStore, opts: &SearchOptions) -> io::Result<()> {
    println!("Word embedding explorer - type 'EXIT' to quit");
    println!("3 words: analogy (A is to B as C is to ?)");
    println!("other:   words nearest to the sum of the input\n");

    loop {
        print!("> ");
        io::stdout().flush()?;
        let line = get_input()?;
        if line == "EXIT" {
            println!("Goodbye!");
            return Ok(());
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let oov_words: Vec<&str> = words
            .iter()
            .filter(|&&w| !store.contains(w))
            .copied()
            .collect();
        if !oov_words.is_empty() {
            for word in &oov_words {
                println!("'{word}' is out of vocabulary");
            }
            continue;
        }

        let result = if words.len() == 3 {
            let query = AnalogyQuery::new(words[0], words[1], words[2], None, "interactive");
            analogy::evaluate(store, query, opts).map(|r| r.neighbors)
        } else {
            let positive: Vec<String> = words.iter().map(|w| w.to_string()).collect();
            analogy::arithmetic(store, &positive, &[], opts)
        };

        match result {
            Ok(neighbors) => {
                println!("{:>4} {:>10} Word", "Rank", "Score");
                println!("{}", "-".repeat(30));
                for (i, n) in neighbors.iter().enumerate() {
                    println!("{:4}: {:10.6} {}", i + 1, n.score, n.token);
                }
            }
            Err(e) => println!("{e}"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let spec = if let Some(path) = &cli.custom_file {
        ModelSpec::Custom {
            path: path.clone(),
            binary: cli.binary,
        }
    } else {
        match cli.model {
            ModelArg::Word2vec => ModelSpec::Word2VecGoogleNews,
            ModelArg::Glove => ModelSpec::Glove {
                corpus: match cli.glove_corpus {
                    CorpusArg::WikiGigaword => GloveCorpus::WikiGigaword,
                    CorpusArg::Twitter => GloveCorpus::Twitter,
                },
                dim: cli.glove_dim,
            },
        }
    };

    let config = ProviderConfig {
        cache_dir: cli.cache_dir.clone(),
    };
    let store = provider::load_model(&spec, &config)?;
    let opts = SearchOptions {
        top_k: cli.top,
        search_space: cli.search_space,
    };

    session(&store, &opts)?;
    Ok(())
}
