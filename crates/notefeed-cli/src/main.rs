use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use notefeed_core::{
    CancellationToken, FeedConfig, FeedEngine, MemoryQueryClient, NotePreview, PreviewNode,
    PreviewStatus,
};
use notefeed_extract::{decode_pointer, POINTER_SCHEME};
use notefeed_model::ContentItem;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn common_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("items")
                .long("items")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON array of content items to answer queries from"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML feed configuration"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
}

fn cli() -> Command {
    Command::new("notefeed")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolve note previews and engagement from a fixture of content items")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log at debug level"),
        )
        .subcommand(common_args(
            Command::new("preview")
                .about("Render a note with its nested references and engagement")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .help("Item id (hex) or note1/nevent1 pointer"),
                ),
        ))
        .subcommand(common_args(
            Command::new("engagement")
                .about("Count reactions, comments and zaps for a note")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .help("Item id (hex) or note1/nevent1 pointer"),
                ),
        ))
        .subcommand(common_args(
            Command::new("author")
                .about("List an author's most recent notes")
                .arg(
                    Arg::new("author")
                        .long("author")
                        .required(true)
                        .help("Author key (hex)"),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .help("Number of notes (default from config)"),
                ),
        ))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Cancelled on Ctrl-C
fn lifecycle_signal() -> CancellationToken {
    let signal = CancellationToken::new();
    let trigger = signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, abandoning pending lookups");
            trigger.cancel();
        }
    });
    signal
}

fn load_engine(args: &ArgMatches) -> Result<(Arc<MemoryQueryClient>, FeedEngine<MemoryQueryClient>)> {
    let items_path = args
        .get_one::<PathBuf>("items")
        .context("--items is required")?;
    let text = std::fs::read_to_string(items_path)
        .with_context(|| format!("reading {}", items_path.display()))?;
    let client = Arc::new(
        MemoryQueryClient::from_json(&text)
            .with_context(|| format!("parsing {}", items_path.display()))?,
    );

    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => FeedConfig::load(path)?,
        None => FeedConfig::default(),
    };
    tracing::debug!(items = client.len(), max_depth = config.max_depth, "fixture loaded");

    let engine = FeedEngine::new(Arc::clone(&client), config);
    Ok((client, engine))
}

/// Accept a hex id or a (optionally `nostr:`-prefixed) pointer
fn normalize_id(input: &str) -> Result<String> {
    let input = input.trim();
    let bare = input.strip_prefix(POINTER_SCHEME).unwrap_or(input);
    if bare.starts_with("note1") || bare.starts_with("nevent1") {
        let reference = decode_pointer(bare).with_context(|| format!("decoding {bare}"))?;
        return reference
            .target_id
            .with_context(|| format!("{bare} carries no id"));
    }
    if bare.len() != 64 || !bare.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("expected a 64-character hex id or a note1/nevent1 pointer, got {bare:?}");
    }
    Ok(bare.to_ascii_lowercase())
}

fn find_item(client: &MemoryQueryClient, args: &ArgMatches) -> Result<ContentItem> {
    let raw = args.get_one::<String>("id").context("--id is required")?;
    let id = normalize_id(raw)?;
    client
        .get(&id)
        .with_context(|| format!("no item {id} in fixture"))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn short(key: &str) -> &str {
    key.get(..8).unwrap_or(key)
}

fn render_node(node: &PreviewNode, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match &node.status {
        PreviewStatus::Loading => {
            let _ = writeln!(out, "{pad}> (loading) {}", node.pointer);
        }
        PreviewStatus::Resolved {
            author,
            date_label,
            body,
            media,
            ..
        } => {
            let _ = writeln!(out, "{pad}> {} · {date_label}", short(author));
            for line in body.lines() {
                let _ = writeln!(out, "{pad}> {line}");
            }
            for attachment in media {
                let _ = writeln!(out, "{pad}> [{}] {}", attachment.alt_or_default(), attachment.url);
            }
        }
        PreviewStatus::Missing { label, href } | PreviewStatus::Disabled { label, href } => {
            let _ = writeln!(out, "{pad}> {label} ({href})");
        }
    }
    for child in &node.children {
        render_node(child, indent + 1, out);
    }
}

fn render_preview(preview: &NotePreview) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} · {}", short(&preview.author), preview.date_label);
    if !preview.body.is_empty() {
        let _ = writeln!(out, "{}", preview.body);
    }
    for attachment in &preview.media {
        let _ = writeln!(out, "[{}] {}", attachment.alt_or_default(), attachment.url);
    }
    for node in &preview.references {
        render_node(node, 1, &mut out);
    }
    let engagement = preview.engagement;
    let _ = writeln!(
        out,
        "Reactions {} · Comments {} · Zaps {}",
        engagement.reaction_count, engagement.comment_count, engagement.zap_count
    );
    out
}

async fn preview(args: &ArgMatches) -> Result<()> {
    let (client, engine) = load_engine(args)?;
    let item = find_item(&client, args)?;
    let preview = engine.preview(&item, &lifecycle_signal()).await;

    if args.get_flag("json") {
        print_json(&preview)
    } else {
        print!("{}", render_preview(&preview));
        Ok(())
    }
}

async fn engagement(args: &ArgMatches) -> Result<()> {
    let (client, engine) = load_engine(args)?;
    let item = find_item(&client, args)?;
    let snapshot = engine.engagement(&item.id, &lifecycle_signal()).await;

    if args.get_flag("json") {
        print_json(&snapshot)
    } else {
        println!("Reactions: {}", snapshot.reaction_count);
        println!("Comments:  {}", snapshot.comment_count);
        println!("Zaps:      {}", snapshot.zap_count);
        Ok(())
    }
}

async fn author(args: &ArgMatches) -> Result<()> {
    let (_client, engine) = load_engine(args)?;
    let author = args
        .get_one::<String>("author")
        .context("--author is required")?;
    let limit = args.get_one::<usize>("limit").copied();
    let notes = engine.author_notes(author, limit, &lifecycle_signal()).await;

    if args.get_flag("json") {
        return print_json(&notes);
    }
    if notes.is_empty() {
        println!("No notes by {}", short(author));
    }
    for note in &notes {
        let first_line = note.body.lines().next().unwrap_or_default();
        println!("{}  {}", short(&note.id), first_line);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("preview", args)) => preview(args).await,
        Some(("engagement", args)) => engagement(args).await,
        Some(("author", args)) => author(args).await,
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notefeed_extract::encode_note;
    use notefeed_model::{EngagementSnapshot, MediaAttachment};
    use std::io::Write;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn normalize_accepts_hex_and_pointers() {
        let id = "ab".repeat(32);
        let pointer = encode_note(&id).unwrap();

        assert_eq!(normalize_id(&id.to_uppercase()).unwrap(), id);
        assert_eq!(normalize_id(&pointer).unwrap(), id);
        assert_eq!(normalize_id(&format!("nostr:{pointer}")).unwrap(), id);
        assert!(normalize_id("xyz").is_err());
        assert!(normalize_id("note1qqqq").is_err());
    }

    #[test]
    fn render_shows_nested_fallbacks_and_counts() {
        let preview = NotePreview {
            id: "00".repeat(32),
            author: "cd".repeat(32),
            date_label: "Mar 4".to_string(),
            body: "hello".to_string(),
            media: vec![MediaAttachment::from_url("https://x/a.png")],
            references: vec![PreviewNode {
                pointer: "note1abc".to_string(),
                depth: 1,
                status: PreviewStatus::Disabled {
                    label: "View note: note1abc...".to_string(),
                    href: "/note1abc".to_string(),
                },
                children: Vec::new(),
            }],
            engagement: EngagementSnapshot::new(3, 1, 0),
        };

        let text = render_preview(&preview);
        assert!(text.starts_with("cdcdcdcd · Mar 4\nhello\n"));
        assert!(text.contains("[Media attachment] https://x/a.png"));
        assert!(text.contains("  > View note: note1abc... (/note1abc)"));
        assert!(text.ends_with("Reactions 3 · Comments 1 · Zaps 0\n"));
    }

    #[tokio::test]
    async fn demo_fixture_previews() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos/feed.json");
        let client = Arc::new(MemoryQueryClient::from_json(&std::fs::read_to_string(path).unwrap()).unwrap());
        let engine = FeedEngine::new(Arc::clone(&client), FeedConfig::default());
        let root = client.get(&"01".repeat(32)).unwrap();

        let preview = engine.preview(&root, &CancellationToken::new()).await;

        assert_eq!(preview.engagement, EngagementSnapshot::new(2, 1, 1));
        assert_eq!(preview.media.len(), 1);
        assert_eq!(preview.references.len(), 2);
        assert!(matches!(
            preview.references[0].children[0].status,
            PreviewStatus::Disabled { .. }
        ));
    }

    #[test]
    fn load_engine_reads_fixture_and_config() {
        let mut items = tempfile::NamedTempFile::new().unwrap();
        write!(
            items,
            r#"[{{"id":"{}","pubkey":"p","created_at":0,"kind":1,"content":"gm","tags":[]}}]"#,
            "ef".repeat(32)
        )
        .unwrap();
        let mut config = tempfile::NamedTempFile::new().unwrap();
        writeln!(config, "max_depth = 3").unwrap();

        let matches = cli()
            .try_get_matches_from([
                "notefeed",
                "preview",
                "--items",
                items.path().to_str().unwrap(),
                "--config",
                config.path().to_str().unwrap(),
                "--id",
                &"ef".repeat(32),
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();

        let (client, engine) = load_engine(args).unwrap();
        assert_eq!(engine.config().max_depth, 3);
        assert_eq!(find_item(&client, args).unwrap().body, "gm");
    }
}
