//! Subcommand implementations: wiring env config into the library crates.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use ai_llm_service::{LlmServiceProfiles, ProfileCompleter};
use anyhow::{Context, Result};
use colored::Colorize;
use contextor::{ChatMessage, QueryProcessor, RetrievalConfig, RetrievalResult};
use rag_eval::{AggregateReport, EvalConfig, MetricSummary, ProcessorRetriever};
use rag_store::{GatewayEmbedder, IndicatifProgress, IngestReport, RagConfig, RagStore, SpecSource};
use spec_chunker::{ChunkBuilder, ChunkerConfig, Contextualizer};
use tracing::info;

struct Runtime {
    svc: Arc<LlmServiceProfiles>,
    store: RagStore,
}

fn runtime() -> Result<Runtime> {
    let svc = Arc::new(LlmServiceProfiles::from_env().context("LLM configuration")?);
    let rag_cfg = RagConfig::from_env().context("vector store configuration")?;
    let embedder = Arc::new(GatewayEmbedder::new(Arc::clone(&svc), rag_cfg.embedding_dim));
    let store = RagStore::new(rag_cfg, embedder).context("opening vector store")?;
    Ok(Runtime { svc, store })
}

fn retrieval_config(k: Option<usize>, threshold: Option<f32>) -> Result<RetrievalConfig> {
    let mut cfg = RetrievalConfig::from_env().context("retrieval configuration")?;
    if let Some(k) = k {
        cfg.top_k = k;
    }
    if let Some(t) = threshold {
        cfg.distance_threshold = t;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn processor(rt: &Runtime) -> QueryProcessor {
    QueryProcessor::from_rag_store(&rt.store)
        .with_rewriter(Arc::new(ProfileCompleter::fast(Arc::clone(&rt.svc))))
}

pub async fn ingest(sources: &[String], reset: bool, no_context: bool) -> Result<()> {
    let chunker = ChunkerConfig::from_env().context("chunker configuration")?;
    let rt = runtime()?;

    let contextualizer = if no_context || !chunker.contextualize {
        Contextualizer::disabled()
    } else {
        Contextualizer::new(
            Arc::new(ProfileCompleter::fast(Arc::clone(&rt.svc))),
            chunker.context_concurrency,
        )
    };
    let builder = ChunkBuilder::new(contextualizer);

    let sources: Vec<SpecSource> = sources.iter().map(|s| SpecSource::parse(s)).collect();
    let progress = IndicatifProgress::bar(sources.len() as u64);
    let report = rt
        .store
        .ingest_sources(&builder, &sources, reset, &progress)
        .await
        .context("ingestion failed")?;
    print_ingest(&report);
    Ok(())
}

fn print_ingest(r: &IngestReport) {
    println!(
        "{} {} documents, {} chunks built, {} upserted",
        "Ingested".green().bold(),
        r.documents,
        r.chunks_built,
        r.upserted
    );
    if r.contextualization_fallbacks > 0 {
        println!(
            "{} {} chunks stored without context prefix",
            "note:".yellow(),
            r.contextualization_fallbacks
        );
    }
    for u in &r.rejected {
        println!("{} {}: {}", "rejected".yellow(), u.unit, u.reason);
    }
}

pub async fn ask(
    question: &str,
    k: Option<usize>,
    threshold: Option<f32>,
    no_llm: bool,
    json: bool,
) -> Result<()> {
    let cfg = retrieval_config(k, threshold)?;
    let rt = runtime()?;
    let processor = processor(&rt);

    if no_llm {
        let result = processor
            .retrieve(question, cfg.top_k, cfg.distance_threshold)
            .await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_hits(&result);
        }
        return Ok(());
    }

    let chat = ProfileCompleter::chat(Arc::clone(&rt.svc));
    let qa = contextor::answer(&processor, &chat, question, &[], &cfg).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&qa)?);
    } else {
        print_hits(&qa.retrieval);
        println!("\n{}\n{}", "Answer".cyan().bold(), qa.answer);
    }
    Ok(())
}

fn print_hits(r: &RetrievalResult) {
    if let Some(q) = &r.rewritten_query {
        println!("{} {}", "rewritten:".dimmed(), q.dimmed());
    }
    if r.is_empty() {
        println!("{}", "No relevant information found.".yellow());
        return;
    }
    for (i, h) in r.hits.iter().enumerate() {
        println!(
            "{:>2}. {} {}",
            i + 1,
            h.id.bold(),
            format!("(distance {:.4})", h.distance).dimmed()
        );
    }
}

pub async fn chat(k: Option<usize>, threshold: Option<f32>) -> Result<()> {
    let cfg = retrieval_config(k, threshold)?;
    let rt = runtime()?;
    let processor = processor(&rt);
    let chat = ProfileCompleter::chat(Arc::clone(&rt.svc));
    let mut history: Vec<ChatMessage> = Vec::new();

    println!("{}", "Ask about the ingested APIs; an empty line exits.".dimmed());
    let stdin = io::stdin();
    loop {
        print!("{} ", ">".cyan().bold());
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() || question == "exit" {
            break;
        }
        match contextor::answer(&processor, &chat, question, &history, &cfg).await {
            Ok(qa) => {
                if let Some(q) = &qa.retrieval.rewritten_query {
                    println!("{} {}", "rewritten:".dimmed(), q.dimmed());
                }
                println!("{}\n", qa.answer);
                history = qa.history;
            }
            Err(e) => println!("{} {e}", "error:".red().bold()),
        }
    }
    Ok(())
}

pub async fn evaluate(
    dataset: &Path,
    k: Option<&str>,
    threshold: Option<f32>,
    out: Option<&Path>,
) -> Result<()> {
    let mut eval_cfg = EvalConfig::from_env().context("evaluation configuration")?;
    if let Some(k) = k {
        eval_cfg.k_values = rag_eval::parse_k_values(k)?;
    }
    eval_cfg.validate()?;
    let retrieval = retrieval_config(None, threshold)?;
    let queries = rag_eval::load_dataset(dataset)
        .with_context(|| format!("reading dataset {}", dataset.display()))?;

    let rt = runtime()?;
    let retriever =
        ProcessorRetriever::new(QueryProcessor::from_rag_store(&rt.store), retrieval.distance_threshold);
    let progress = IndicatifProgress::bar(queries.len() as u64);
    let report = rag_eval::evaluate(&queries, &retriever, &eval_cfg, &progress).await?;

    print_report(&report);
    if let Some(path) = out {
        report.write_json(path)?;
        info!(path = %path.display(), "report written");
        println!("{} {}", "Report written to".green(), path.display());
    }
    Ok(())
}

fn print_summary(title: &str, s: &MetricSummary) {
    println!(
        "{} {}",
        title.bold(),
        format!("({} queries, MRR {:.3})", s.queries, s.mrr).dimmed()
    );
    println!("    {:>4} {:>9} {:>7} {:>7} {:>7} {:>8}", "K", "Precision", "Recall", "F1", "NDCG", "HitRate");
    for m in &s.at_k {
        println!(
            "    {:>4} {:>9.3} {:>7.3} {:>7.3} {:>7.3} {:>8.3}",
            m.k, m.precision, m.recall, m.f1, m.ndcg, m.hit_rate
        );
    }
}

fn print_report(r: &AggregateReport) {
    println!(
        "\n{} {} evaluated, {} failed, {} rejected (error rate {:.1}%)",
        "Evaluation".cyan().bold(),
        r.evaluated,
        r.failed.len(),
        r.rejected.len(),
        r.error_rate * 100.0
    );
    match &r.overall {
        Some(s) => print_summary("Overall", s),
        None => println!("{}", "No query completed; no metrics to report.".yellow()),
    }
    for (cat, s) in &r.per_category {
        print_summary(cat, s);
    }
    println!(
        "no-hit queries: {}, empty results: {}",
        r.no_hit_count, r.empty_result_count
    );
    for f in &r.failed {
        println!("{} {}: {}", "failed".red(), f.question, f.reason);
    }
    for q in &r.rejected {
        println!("{} {}: {}", "rejected".yellow(), q.question, q.reason);
    }
}
