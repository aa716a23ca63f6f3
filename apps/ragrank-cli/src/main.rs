use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ragrank_core::config::{Config, Settings};
use ragrank_core::types::RankedResult;
use ragrank_embed::LocalModelLoader;
use ragrank_engine::{Answer, ModelCache, QueryEngine, QueryRequest, StageTimings};
use ragrank_vector::LanceChunkStore;

mod generator;

use generator::SourceListGenerator;

const EXIT_WORDS: &[&str] = &["exit", "quit", "יציאה"];
const DEFAULT_COMPARE_MODELS: &[&str] = &["fast", "balanced", "best"];

fn usage(prog: &str) -> ! {
    eprintln!("Usage: {prog} ask [question] [--timing]");
    eprintln!("       {prog} compare <question> [model...]");
    eprintln!("Example: {prog} compare 'מהי תודעה אקטיבית?' fast balanced");
    std::process::exit(1);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RAGRANK_LOG").unwrap_or_else(|_| EnvFilter::new("ragrank=info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(io::stderr).init();
}

fn build_engine(settings: &Settings) -> anyhow::Result<QueryEngine> {
    let base = env::current_dir()?;
    let loader = LocalModelLoader::from_settings(&settings.models, &base, settings.store.dim);
    if loader.uses_fake() {
        info!("using deterministic stand-in models");
    } else {
        info!(root = %loader.root().display(), "loading models from disk");
    }
    let uri = settings.store.resolved_uri(&base);
    let store = LanceChunkStore::open(&uri.to_string_lossy(), &settings.store.table, settings.store.dim)
        .with_context(|| format!("opening vector store at {}", uri.display()))?;
    println!("📦 Store: {} (table {}, dim {})", uri.display(), store.table_name(), store.dim());
    let engine = QueryEngine::new(Arc::new(ModelCache::new(loader)), Arc::new(store), &settings.retrieval);
    println!(
        "🧠 Models: embedding={} rerank={}",
        engine.retriever().embedding_model(),
        engine.reranker().model()
    );
    Ok(engine)
}

/// Case-insensitive match against the words that end the interactive loop.
fn is_exit_word(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    EXIT_WORDS.contains(&lower.as_str())
}

fn print_sources(chunks: &[RankedResult]) {
    for (i, c) in chunks.iter().enumerate() {
        println!(
            "  [{}] {} (chunk {}) | rerank_score={:.3} | distance={:.3}",
            i + 1,
            c.source(),
            c.order(),
            c.rerank_score,
            c.distance()
        );
    }
}

fn print_timings(t: &StageTimings) {
    let ms = |d: Option<std::time::Duration>| d.map_or_else(|| "-".to_string(), |d| format!("{:.0}ms", d.as_secs_f64() * 1000.0));
    println!("⏱  retrieve={} rerank={} generate={}", ms(t.retrieve), ms(t.rerank), ms(t.generate));
    println!(
        "   chunks_total={} total={} candidates={} final={}",
        ms(t.chunks_total()),
        ms(t.total()),
        t.num_candidates.map_or_else(|| "-".to_string(), |n| n.to_string()),
        t.num_final_chunks.map_or_else(|| "-".to_string(), |n| n.to_string())
    );
}

fn print_answer(answer: &Answer) {
    println!("\n{}", answer.outcome);
    if !answer.chunks.is_empty() {
        println!("\n📚 Sources:");
        print_sources(&answer.chunks);
    }
    if let Some(t) = &answer.timings {
        print_timings(t);
    }
}

fn ask(engine: &QueryEngine, question: Option<&str>, timing: bool) -> anyhow::Result<()> {
    let generator = SourceListGenerator;
    if let Some(q) = question {
        let answer = engine.answer(&QueryRequest::new(q).measure_time(timing), &generator)?;
        print_answer(&answer);
        return Ok(());
    }

    println!("🔍 ragrank - type a question, or exit / quit / יציאה to leave");
    let stdin = io::stdin();
    let mut previous: Option<String> = None;
    loop {
        print!("\n> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let q = line.trim();
        if q.is_empty() {
            continue;
        }
        if is_exit_word(q) {
            break;
        }
        // The previous question widens retrieval for follow-ups; the generator sees only this one.
        let search_query = previous.as_deref().map_or_else(|| q.to_string(), |p| format!("{p}\n{q}"));
        let request = QueryRequest::new(search_query).with_question(q).measure_time(timing);
        match engine.answer(&request, &generator) {
            Ok(answer) => print_answer(&answer),
            Err(e) => eprintln!("❌ {e}"),
        }
        previous = Some(q.to_string());
    }
    Ok(())
}

fn compare(engine: &QueryEngine, question: &str, models: &[&str], top_n: usize) -> anyhow::Result<()> {
    let candidates = engine.retriever().retrieve_candidates(question, engine.top_k())?;
    println!("🔍 {} candidates for: \"{question}\"", candidates.len());
    for (model, ranked) in engine.reranker().compare_models(question, &candidates, models, top_n)? {
        println!("\n== {model} ==");
        print_sources(&ranked);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        usage(&prog);
    }
    let cmd = args.remove(0);
    let timing = args.iter().any(|a| a == "--timing");
    let positional: Vec<&str> = args.iter().filter(|a| !a.starts_with("--")).map(String::as_str).collect();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let settings = config.settings()?;
    let engine = build_engine(&settings)?;

    match cmd.as_str() {
        "ask" => ask(&engine, positional.first().copied(), timing),
        "compare" => {
            let Some((question, models)) = positional.split_first() else { usage(&prog) };
            let models = if models.is_empty() { DEFAULT_COMPARE_MODELS } else { models };
            compare(&engine, question, models, engine.top_n())
        }
        _ => {
            eprintln!("Unknown command: {cmd}");
            usage(&prog)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_words_ignore_case_and_padding() {
        for word in ["exit", "Exit", "QUIT", " quit ", "יציאה"] {
            assert!(is_exit_word(word), "{word:?} should end the loop");
        }
        for line in ["exit now", "מה זה יציאה?", ""] {
            assert!(!is_exit_word(line), "{line:?} is a question");
        }
    }
}
