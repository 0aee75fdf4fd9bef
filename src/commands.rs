use crate::cli::{Cli, Command, EditArgs};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::StreamExt;
use romshelf_config::Config;
use romshelf_index::{Database, PlayStatus, Repository, TitleId, TitleRecord};
use romshelf_library::import::import;
use romshelf_library::manage::{delete_title, edit_title, replace_file};
use romshelf_library::resolve::resolve_by_id;
use romshelf_library::scan::{collect_candidates, scan};
use romshelf_library::{Context, ImportEvent, ImportStatus, PlacementPolicy, ScanEvent, TitleEdit};
use romshelf_storage::ManagedRoot;
use std::path::Path;

/// Everything a command needs, opened once per invocation.
struct Library {
    store: ManagedRoot,
    db: Database,
    ctx: Context,
}

impl Library {
    async fn open(config: &Config) -> Result<Self> {
        let store = ManagedRoot::new(&config.library.root).or_raise(|| ErrorKind::Storage)?;
        let index_path = config.index_path().or_raise(|| ErrorKind::Config)?;
        let db = Database::connect(&index_path).await.or_raise(|| ErrorKind::Index)?;
        let ctx = Context::from_config(config).or_raise(|| ErrorKind::Config)?;
        tracing::debug!(root = %store.path().display(), index = %index_path.display(), "Opened library");
        Ok(Self { store, db, ctx })
    }

    fn index(&self) -> Repository {
        Repository::from(&self.db)
    }
}

fn print_record(record: &TitleRecord) {
    println!(
        "{:>5}  {:<30}  {:<40}  {:<9}  {}",
        record.id,
        record.platform,
        record.title,
        record.placement,
        record.stored_path.display()
    );
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let library = Library::open(&config).await?;
    let result = match cli.command {
        Command::Scan { dir } => scan_dir(&library, &dir).await,
        Command::Import { dir, policy } => import_dir(&library, &dir, policy.unwrap_or(library.ctx.default_policy)).await,
        Command::List { platform } => list(&library, platform.as_deref()).await,
        Command::Resolve { id } => show_plan(&library, TitleId::from(id)).await,
        Command::Edit(args) => edit(&library, args).await,
        Command::Replace { id, file } => replace(&library, TitleId::from(id), &file).await,
        Command::Delete { id } => delete(&library, TitleId::from(id)).await,
    };
    library.db.close().await;
    result
}

async fn scan_dir(library: &Library, dir: &Path) -> Result<()> {
    let index = library.index();
    let events = scan(&library.store, &index, &library.ctx, dir);
    futures::pin_mut!(events);
    while let Some(event) = events.next().await {
        match event.or_raise(|| ErrorKind::Scan)? {
            ScanEvent::Started => {},
            ScanEvent::Found(candidate) => {
                println!("new      {:<30}  {:<40}  {}", candidate.platform.as_str(), candidate.title, candidate.source_path.display())
            },
            ScanEvent::Known { path } => println!("known    {}", path.display()),
            ScanEvent::Skipped { path, diagnostic } => println!("skipped  {}  ({})", path.display(), diagnostic.message),
            ScanEvent::Complete(summary) => {
                println!("{} new, {} already imported, {} skipped", summary.found, summary.known, summary.skipped)
            },
        }
    }
    Ok(())
}

async fn import_dir(library: &Library, dir: &Path, policy: PlacementPolicy) -> Result<()> {
    let index = library.index();
    let candidates =
        collect_candidates(&library.store, &index, &library.ctx, dir).await.or_raise(|| ErrorKind::Scan)?;
    let events = import(&library.store, &index, candidates, policy);
    futures::pin_mut!(events);
    while let Some(event) = events.next().await {
        match event {
            ImportEvent::Started { total } => println!("importing {total} file(s) ({policy})"),
            ImportEvent::Processed(outcome) => match &outcome.status {
                ImportStatus::Imported(record) => print_record(record),
                ImportStatus::Failed(kind) => {
                    let reason = outcome.diagnostics.last().map(|d| d.message.as_str()).unwrap_or_default();
                    println!("failed   {}  {kind}: {reason}", outcome.source_path.display());
                },
            },
            ImportEvent::Complete(summary) => println!("{} imported, {} failed", summary.imported, summary.failed),
        }
    }
    Ok(())
}

async fn list(library: &Library, platform: Option<&str>) -> Result<()> {
    let index = library.index();
    let records = match platform {
        Some(platform) => index.list_by_platform(platform).await,
        None => index.list().await,
    }
    .or_raise(|| ErrorKind::Index)?;
    records.iter().for_each(print_record);
    Ok(())
}

async fn show_plan(library: &Library, id: TitleId) -> Result<()> {
    let index = library.index();
    let plan = resolve_by_id(&library.store, &index, &library.ctx, id).await.or_raise(|| ErrorKind::Title)?;
    println!("download name:     {}", plan.download_name);
    match &plan.actual_file {
        Some(file) => println!("file:              {}", file.display()),
        None => println!("file:              (no playable file)"),
    }
    println!("serving directory: {}", plan.serving_directory.display());
    println!("playable:          {}", plan.playable);
    Ok(())
}

async fn edit(library: &Library, args: EditArgs) -> Result<()> {
    let play_status = args
        .status
        .map(|status| status.parse::<PlayStatus>().or_raise(|| ErrorKind::Argument(status)))
        .transpose()?;
    let edit = TitleEdit {
        title: args.title,
        platform: args.platform,
        genre: args.genre,
        release_year: args.year,
        developer: args.developer,
        publisher: args.publisher,
        description: args.description,
        play_status,
    };
    let record =
        edit_title(&library.index(), TitleId::from(args.id), &edit).await.or_raise(|| ErrorKind::Title)?;
    print_record(&record);
    Ok(())
}

async fn replace(library: &Library, id: TitleId, file: &Path) -> Result<()> {
    let index = library.index();
    let record =
        replace_file(&library.store, &index, &library.ctx, id, file).await.or_raise(|| ErrorKind::Title)?;
    print_record(&record);
    Ok(())
}

async fn delete(library: &Library, id: TitleId) -> Result<()> {
    let outcome = delete_title(&library.store, &library.index(), id).await.or_raise(|| ErrorKind::Title)?;
    println!("deleted {} ({:?})", outcome.record.title, outcome.backing);
    Ok(())
}
