use std::path::PathBuf;

use clap::Parser;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use finq_domain::normalize::NormalizedQuery;
use finq_service::{AskResponse, Session};

pub const GREETING: &str = "Type a question. Type 'exit' to quit.";
pub const PROMPT: &str = "You: ";
pub const FAREWELL: &str = "Bye!";

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "q"];

#[derive(Debug, Parser)]
#[command(
	version = finq_cli::VERSION,
	rename_all = "kebab",
	styles = finq_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE", default_value = "finq.toml")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let cfg = finq_config::load(&args.config)?;

	init_tracing(&cfg);

	let session = Session::open(cfg)?;
	let mut stdout = io::stdout();

	repl(&session, BufReader::new(io::stdin()), &mut stdout).await
}

/// Reads questions line by line until an exit word or end of input. A failed question is
/// reported and the loop keeps going.
pub async fn repl<R, W>(session: &Session, input: R, output: &mut W) -> color_eyre::Result<()>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let mut lines = input.lines();

	output.write_all(format!("{GREETING}\n\n").as_bytes()).await?;

	loop {
		output.write_all(PROMPT.as_bytes()).await?;
		output.flush().await?;

		let Some(line) = lines.next_line().await? else {
			output.write_all(b"\n").await?;

			break;
		};
		let question = line.trim();

		if question.is_empty() {
			continue;
		}
		if EXIT_WORDS.contains(&question.to_lowercase().as_str()) {
			output.write_all(format!("{FAREWELL}\n").as_bytes()).await?;

			break;
		}

		let reply = match session.ask(question).await {
			Ok(response) => render(&response),
			Err(err) => {
				tracing::warn!(error = %err, "Question failed.");

				format!("\nAssistant: {err}\n\n")
			},
		};

		output.write_all(reply.as_bytes()).await?;
	}

	output.flush().await?;

	Ok(())
}

pub fn render(response: &AskResponse) -> String {
	let mut out = String::new();

	if let Some(notice) = did_you_mean(&response.normalized) {
		out.push_str(&notice);
		out.push('\n');
	}

	out.push_str(&format!("\nAssistant: {}\n\n", response.answer));

	out
}

/// Correction notice shown before the answer, `None` when the query was used as typed.
pub fn did_you_mean(normalized: &NormalizedQuery) -> Option<String> {
	if !normalized.changed {
		return None;
	}

	let corrections = normalized
		.corrections
		.iter()
		.map(|correction| format!("{}→{}", correction.from, correction.to))
		.collect::<Vec<_>>()
		.join(", ");

	Some(format!("(did you mean: {}  — corrected [{corrections}])", normalized.text))
}

fn init_tracing(cfg: &finq_config::Config) {
	let filter =
		EnvFilter::try_new(&cfg.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[cfg(test)]
mod tests {
	use finq_domain::normalize::Correction;

	use super::*;

	#[test]
	fn notice_lists_every_correction() {
		let normalized = NormalizedQuery {
			text: "main risk factors".to_string(),
			changed: true,
			corrections: vec![
				Correction { from: "rish".to_string(), to: "risk".to_string() },
				Correction { from: "facors".to_string(), to: "factors".to_string() },
			],
		};

		assert_eq!(
			did_you_mean(&normalized).as_deref(),
			Some("(did you mean: main risk factors  — corrected [rish→risk, facors→factors])")
		);
	}

	#[test]
	fn unchanged_query_has_no_notice() {
		let normalized =
			NormalizedQuery { text: "bullets".to_string(), changed: false, corrections: Vec::new() };

		assert_eq!(did_you_mean(&normalized), None);
	}
}
