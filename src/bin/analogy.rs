use anyhow::Context;
use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

use analogy_rs::analogy::{self, AnalogyQuery, SearchOptions};
use analogy_rs::provider::{self, GloveCorpus, ModelSpec, ProviderConfig};
use analogy_rs::store::{Neighbor, VectorStore};
use analogy_rs::{dataset, report};

/// Command-line arguments parsed by Clap.
#[derive(Parser, Debug)]
#[command(author, version, about = "Explore word-embedding analogies", long_about = None)]
#[command(group(ArgGroup::new("action").args(["test", "neighbors", "arithmetic", "list_models"])))]
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

    /// Evaluate one analogy: A is to B as C is to D (D optional)
    #[arg(long, num_args = 3..=4, value_names = ["A", "B", "C", "D"])]
    test: Option<Vec<String>>,

    /// List the nearest neighbors of a word
    #[arg(long, value_name = "WORD")]
    neighbors: Option<String>,

    /// Rank words nearest to sum(--positive) - sum(--negative)
    #[arg(long)]
    arithmetic: bool,

    #[arg(long, num_args = 1.., requires = "arithmetic")]
    positive: Vec<String>,

    #[arg(long, num_args = 1.., requires = "arithmetic")]
    negative: Vec<String>,

    /// Print the named models this tool can download, then exit
    #[arg(long)]
    list_models: bool,

    /// Analogy dataset evaluated when no other action is chosen
    #[arg(long, default_value = "data/analogies.csv")]
    data: PathBuf,

    /// How many candidates to report per query
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

impl From<CorpusArg> for GloveCorpus {
    fn from(arg: CorpusArg) -> Self {
        match arg {
            CorpusArg::WikiGigaword => GloveCorpus::WikiGigaword,
            CorpusArg::Twitter => GloveCorpus::Twitter,
        }
    }
}

fn model_spec(cli: &Cli) -> ModelSpec {
    if let Some(path) = &cli.custom_file {
        return ModelSpec::Custom {
            path: path.clone(),
            binary: cli.binary,
        };
    }
    match cli.model {
        ModelArg::Word2vec => ModelSpec::Word2VecGoogleNews,
        ModelArg::Glove => ModelSpec::Glove {
            corpus: cli.glove_corpus.into(),
            dim: cli.glove_dim,
        },
    }
}

fn print_ranked(neighbors: &[Neighbor]) {
    for (i, n) in neighbors.iter().enumerate() {
        println!("{:3}: {:>8.5} {}", i + 1, n.score, n.token);
    }
}

fn run_test(store: &VectorStore, words: &[String], opts: &SearchOptions) -> anyhow::Result<()> {
    let expected = words.get(3).map(String::as_str);
    let query = AnalogyQuery::new(&words[0], &words[1], &words[2], expected, "adhoc");
    let result = analogy::evaluate(store, query, opts)?;

    println!(
        "{} is to {} as {} is to ?",
        words[0], words[1], words[2]
    );
    print_ranked(&result.neighbors);

    if let Some(d) = expected {
        let rank = result
            .neighbors
            .iter()
            .position(|n| n.token.to_lowercase() == d.to_lowercase());
        match rank {
            Some(r) => println!("✓ expected '{d}' found at rank {}", r + 1),
            None => println!("✗ expected '{d}' not in the top {}", opts.top_k),
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.list_models {
        for name in provider::known_models() {
            println!("{name}");
        }
        return Ok(());
    }

    let spec = model_spec(&cli);
    let config = ProviderConfig {
        cache_dir: cli.cache_dir.clone(),
    };
    let store = provider::load_model(&spec, &config).context("loading model")?;
    let opts = SearchOptions {
        top_k: cli.top,
        search_space: cli.search_space,
    };

    if let Some(words) = &cli.test {
        run_test(&store, words, &opts)?;
    } else if let Some(word) = &cli.neighbors {
        let hits = analogy::neighbors(&store, word, &opts)?;
        println!("Nearest neighbors of '{word}':");
        print_ranked(&hits);
    } else if cli.arithmetic {
        let hits = analogy::arithmetic(&store, &cli.positive, &cli.negative, &opts)?;
        println!(
            "Nearest to [{}] - [{}]:",
            cli.positive.join(" + "),
            cli.negative.join(" + ")
        );
        print_ranked(&hits);
    } else {
        let queries = dataset::load_analogies(&cli.data)
            .with_context(|| format!("loading dataset {}", cli.data.display()))?;
        log::info!("loaded {} analogies from {}", queries.len(), cli.data.display());
        let suite = report::run_suite(&store, &queries, &opts);
        println!("{suite}");
    }

    Ok(())
}
