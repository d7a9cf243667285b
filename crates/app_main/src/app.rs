//! Application main loop
//! Runs one CLI command, or the interactive key session, against a session

use crate::cli::{Cli, Commands};
use anyhow::{bail, Result};
use app_core::{
    AppConfig, DirectorySource, GradeGroup, ManifestLoader, Screen, Session, ViewConfig, ViewMode,
};
use std::fmt::Write as _;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Fold command line options into the loaded configuration
pub fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(assets) = &cli.assets {
        config.general.assets_root = assets.clone();
    }
    if let Some(db) = &cli.db {
        config.general.database_path = Some(db.clone());
    }
    if let Some(collection) = &cli.collection {
        config.general.default_collection = Some(collection.clone());
    }
}

pub async fn run(command: Commands, config: AppConfig) -> Result<()> {
    let db_path = config
        .general
        .database_path
        .clone()
        .unwrap_or_else(app_db::default_db_path);
    let store = app_db::open(&db_path)?;
    tracing::info!("Ratings database: {:?}", db_path);

    let loader = ManifestLoader::new(DirectorySource::new(&config.general.assets_root));
    let mut session = Session::new(loader, store, &config);
    session.open().await;

    execute(&mut session, command, &config).await
}

async fn execute(session: &mut Session, command: Commands, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Collections => {
            for info in session.collections() {
                let marker = if &info.id == session.collection() { "*" } else { " " };
                println!("{} {}\t{}", marker, info.id, info.name);
            }
        }
        Commands::Stats => print!("{}", render_stats(session)),
        Commands::Review { columns, single } => {
            let mut view = session.view();
            if let Some(columns) = columns {
                view = view.with_columns(columns);
            }
            if single {
                view = view.with_mode(ViewMode::SingleGrid);
            }
            session.set_view(view);
            session.show_review();
            print!("{}", render_grid(session));
        }
        Commands::Next => match session.catalog().next_unrated() {
            Some(image_id) => println!("{}", session.image_path(image_id)),
            None => println!("No images in {}", session.collection()),
        },
        Commands::Rate { filename, grade } => {
            session.rate(&filename, grade.0)?;
            match grade.0 {
                Some(grade) => println!("{} -> {}", filename, grade),
                None => println!("{} -> unrated", filename),
            }
        }
        Commands::Export { dir } => {
            let dir = dir
                .or_else(|| config.general.export_dir.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            match session.export(&dir) {
                Some(path) => println!("Exported to {}", path.display()),
                None => bail!("Export to {} failed", dir.display()),
            }
        }
        Commands::Import { file } => {
            let summary = session.import_file(&file).await?;
            println!(
                "Imported {} ratings, cleared {}, {} unrecognized",
                summary.imported, summary.removed, summary.unrecognized
            );
        }
        Commands::Clear { yes } => {
            if !yes {
                bail!("Refusing to clear {} without --yes", session.collection());
            }
            session.clear().await?;
            println!("Cleared ratings for {}", session.collection());
        }
        Commands::Session => run_session(session).await?,
    }
    Ok(())
}

/// Interactive loop: one key name per line on stdin
async fn run_session(session: &mut Session) -> Result<()> {
    println!("{}", render_state(session));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let key = line.trim();
        if key.is_empty() {
            continue;
        }

        match session.handle_key(key, false).await {
            Ok(true) => println!("{}", render_state(session)),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("Key {} failed: {}", key, e);
                println!("! {}", e.user_message());
            }
        }
    }

    tracing::info!("Session ended");
    Ok(())
}

/// One-line summary of the screen, focus and lightbox
fn render_state(session: &Session) -> String {
    let screen = match session.screen() {
        Screen::Deck => "deck",
        Screen::Review => "review",
    };
    let view = session.view();
    let mode = match view.mode() {
        ViewMode::Grouped => "grouped",
        ViewMode::SingleGrid => "single",
    };
    let focus = session.selection().focused().unwrap_or("-");
    let grade = session
        .selection()
        .focused()
        .and_then(|id| session.catalog().entry(id))
        .and_then(|e| e.grade)
        .map_or("-", |g| g.code());
    let zoom = match (session.selection().is_zoom_open(), session.selection().focused()) {
        (true, Some(id)) => format!(" lightbox={}", session.image_path(id)),
        _ => String::new(),
    };

    format!(
        "{} focus={} grade={} view={}/{}{}",
        screen,
        focus,
        grade,
        mode,
        view.columns(),
        zoom
    )
}

fn render_stats(session: &Session) -> String {
    let stats = session.stats();
    let mut out = String::new();
    let _ = writeln!(out, "collection: {}", session.collection());
    let _ = writeln!(out, "total:      {}", stats.total);
    let _ = writeln!(out, "rated:      {}", stats.rated);
    let _ = writeln!(out, "unrated:    {}", stats.unrated);
    for (group, count) in &stats.per_group {
        let _ = writeln!(out, "  {:<8} {}", group.label(), count);
    }
    out
}

fn cell(session: &Session, image_id: &str, view: ViewConfig) -> String {
    let mut text = image_id.to_string();
    if view.show_ratings() {
        let code = session
            .catalog()
            .entry(image_id)
            .and_then(|e| e.grade)
            .map_or("-", |g| g.code());
        text = format!("{}:{}", text, code);
    }
    if session.selection().focused() == Some(image_id) {
        format!("[{}]", text)
    } else {
        format!(" {} ", text)
    }
}

fn write_rows<'a>(
    out: &mut String,
    session: &Session,
    images: impl Iterator<Item = &'a str>,
    view: ViewConfig,
) {
    let cells: Vec<String> = images.map(|id| cell(session, id, view)).collect();
    for row in cells.chunks(view.columns()) {
        let _ = writeln!(out, "  {}", row.join(" "));
    }
}

/// The review grid as text; the focused image is bracketed
fn render_grid(session: &Session) -> String {
    let view = session.view();
    let mut out = String::new();

    match view.mode() {
        ViewMode::Grouped => {
            for group in GradeGroup::ORDER {
                let images = session.catalog().grouped().get(group);
                if images.is_empty() {
                    continue;
                }
                let _ = writeln!(out, "{} ({})", group.label(), images.len());
                write_rows(&mut out, session, images.iter().map(String::as_str), view);
            }
        }
        ViewMode::SingleGrid => {
            let flat = session.catalog().flat();
            write_rows(&mut out, session, flat.iter().map(|e| e.image_id.as_str()), view);
        }
    }

    if out.is_empty() {
        out.push_str("(no images)\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_core::{Action, Grade, MemorySource, COLLECTIONS_PATH};
    use clap::Parser;
    use tempfile::TempDir;

    async fn session() -> (TempDir, Session) {
        let temp_dir = TempDir::new().unwrap();
        let store = app_db::open(&temp_dir.path().join("ratings.db")).unwrap();
        let source = MemorySource::new()
            .with(COLLECTIONS_PATH, r#"[{"id": "pets", "name": "Pets"}]"#)
            .with("pets/manifest.json", r#"["dog.png", "cat.png", "owl.png"]"#);

        let mut session = Session::new(ManifestLoader::new(source), store, &AppConfig::default());
        session.open().await;
        (temp_dir, session)
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "image_triage",
            "--assets",
            "/srv/assets",
            "--collection",
            "pets",
            "stats",
        ]);
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.general.assets_root, PathBuf::from("/srv/assets"));
        assert_eq!(config.general.default_collection.as_deref(), Some("pets"));
        assert_eq!(config.general.database_path, None);
    }

    #[tokio::test]
    async fn test_render_state() {
        let (_dir, mut session) = session().await;
        assert_eq!(render_state(&session), "deck focus=dog.png grade=- view=grouped/5");

        session.handle_action(Action::Rate(Grade::A)).await.unwrap();
        session.handle_action(Action::ShowReview).await.unwrap();
        session.handle_action(Action::Activate).await.unwrap();
        // Rating dog.png advanced the deck to owl.png, next in filename order
        assert_eq!(
            render_state(&session),
            "review focus=owl.png grade=- view=grouped/5 lightbox=pets/owl.png"
        );
    }

    #[tokio::test]
    async fn test_render_grid() {
        let (_dir, mut session) = session().await;
        session.rate("cat.png", Some(Grade::B)).unwrap();
        session.set_view(session.view().with_columns(2));
        session.show_review();

        // Deck focus (dog.png) is still valid on the review screen
        let grid = render_grid(&session);
        assert_eq!(
            grid,
            "B (1)\n   cat.png:b \nUnrated (2)\n  [dog.png:-]  owl.png:- \n"
        );

        session.set_view(session.view().with_mode(ViewMode::SingleGrid).toggled_ratings());
        assert_eq!(render_grid(&session), "   cat.png  [dog.png]\n   owl.png \n");
    }

    #[tokio::test]
    async fn test_render_stats() {
        let (_dir, mut session) = session().await;
        session.rate("owl.png", Some(Grade::F)).unwrap();

        let stats = render_stats(&session);
        assert!(stats.contains("total:      3"));
        assert!(stats.contains("rated:      1"));
        assert!(stats.contains("unrated:    2"));
    }
}
