use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use wander_threads::{ProjectorConfig, ReplyForest, ReplyTreeProjector, ThreadView};
use wander_types::ThreadAction;
use wander_types::api::{DiscussionResponse, parse_discussion};

fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wander=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Config
    let discussion_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("WANDER_DISCUSSION_PATH").ok())
        .map(PathBuf::from)
        .context("usage: wander-preview <discussion.json> (or set WANDER_DISCUSSION_PATH)")?;
    let actions_path = std::env::var("WANDER_ACTIONS_PATH").ok().map(PathBuf::from);
    let json_output = std::env::var("WANDER_PREVIEW_FORMAT").is_ok_and(|f| f == "json");

    let config = ProjectorConfig::from_env()?;
    info!(?config, "projector configured");

    let raw = fs::read_to_string(&discussion_path)
        .with_context(|| format!("reading {}", discussion_path.display()))?;
    let discussion = parse_discussion(&raw)
        .with_context(|| format!("parsing discussion in {}", discussion_path.display()))?;

    let mut projector = ReplyTreeProjector::new(config)?;
    let forest = projector.assemble(discussion.replies.clone())?;
    info!(discussion = %discussion.id, replies = forest.len(), "discussion loaded");

    if let Some(path) = actions_path {
        replay_actions(&mut projector, &path)?;
    }

    let views = projector.project(&forest)?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&views)?);
    } else {
        print_discussion(&discussion, &forest, &views);
    }

    Ok(())
}

/// Apply newline-delimited `ThreadAction` JSON, in order, as the UI would dispatch clicks.
fn replay_actions(projector: &mut ReplyTreeProjector, path: &Path) -> Result<()> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    for (line_no, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let action: ThreadAction = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: malformed action", path.display(), line_no + 1))?;
        if let Err(e) = projector.apply(&action) {
            if e.is_structural() {
                bail!("{}:{}: {}", path.display(), line_no + 1, e);
            }
            warn!(line = line_no + 1, node = ?action.node_id(), "skipping action: {}", e);
        }
    }
    Ok(())
}

fn print_discussion(discussion: &DiscussionResponse, forest: &ReplyForest, views: &[ThreadView<'_>]) {
    println!("# {}", discussion.title);
    if !discussion.tags.is_empty() {
        println!("  [{}]", discussion.tags.join(", "));
    }
    println!("  {} replies", forest.len());
    println!();

    for view in views {
        let author = view
            .reply
            .payload
            .author_ref
            .as_ref()
            .map_or("anonymous", |a| a.username.as_str());
        let reactions = &view.reply.payload.reaction_state;
        println!(
            "- {} ({}) +{} -{}",
            author, view.reply.id, reactions.likes, reactions.dislikes
        );
        println!("  {}", view.reply.payload.content);

        for row in &view.rows {
            let indent = "    ".repeat(row.display_depth);
            let author = row
                .reply
                .payload
                .author_ref
                .as_ref()
                .map_or("anonymous", |a| a.username.as_str());
            let reply_to = row
                .reply_to
                .author
                .map_or_else(|| row.reply_to.id.to_string(), |a| format!("@{}", a.username));
            println!("{}- {} -> {}: {}", indent, author, reply_to, row.reply.payload.content);
        }

        if view.has_more {
            println!("    [load {} more]", view.hidden_count);
        } else if !view.is_expanded && view.descendant_count > 0 {
            println!("    [show {} replies]", view.descendant_count);
        }
        println!();
    }
}
