//! One-shot question answering from the command line.
//!
//! `navi ask` prints the reply exactly as the HTTP endpoint would return
//! it. A degraded outcome is still a successful command: the fallback text
//! is the answer the user sees.

use anyhow::Result;

use navi_core::pipeline::PipelineRun;

use crate::config::Config;
use crate::pipeline::build_pipeline;

/// Run the pipeline once and print the reply, plus diagnostics with `explain`.
pub async fn run_ask(
    config: &Config,
    message: &str,
    category: Option<&str>,
    explain: bool,
) -> Result<()> {
    let pipeline = build_pipeline(config).await?;

    let run = match category {
        Some(category) => pipeline.run_scoped(category, message).await,
        None => pipeline.run(message).await,
    };

    println!("{}", run.outcome.reply());

    if explain {
        print!("{}", explain_run(&run));
    }

    Ok(())
}

/// Render the stages of a run for `--explain`.
pub fn explain_run(run: &PipelineRun) -> String {
    let mut out = String::new();
    out.push_str("\n--- explain ---\n");

    match &run.query {
        Some(query) => {
            out.push_str(&format!("category: {}\n", query.category));
            out.push_str(&format!("question: {}\n", query.clean_message));
        }
        None => out.push_str("category: -\n"),
    }

    match &run.retrieval {
        Some(result) if result.is_empty() => out.push_str("matches:  none\n"),
        Some(result) => {
            out.push_str(&format!("matches:  {}\n", result.len()));
            for (i, m) in result.iter().enumerate() {
                out.push_str(&format!(
                    "  {}. [{:.3}] {}\n",
                    i + 1,
                    m.score,
                    truncate(&m.entry.content, 80)
                ));
            }
        }
        None => out.push_str("matches:  -\n"),
    }

    out.push_str(&format!("stage:    {:?}\n", run.decided_at));
    match run.outcome.reason() {
        Some(reason) => out.push_str(&format!("outcome:  degraded ({})\n", reason.code())),
        None => out.push_str("outcome:  answered\n"),
    }
    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let cut: String = single_line.chars().take(max_chars).collect();
    format!("{}...", cut)
}
