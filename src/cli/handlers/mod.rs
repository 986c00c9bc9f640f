mod init;
pub use init::cmd_init;

use std::collections::HashSet;
use std::error::Error;
use std::path::{Path, PathBuf};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::DataDirLock;
use crate::io::remote::{RemoteClient, RemoteState};
use crate::io::storage::{FileStore, atomic_write};
use crate::model::config::Config;
use crate::model::list::{ItemId, List, ListId};
use crate::ops::export::{self, Layout};
use crate::ops::search;
use crate::session::{BulkAction, Effect, Session};

type CmdResult = Result<(), Box<dyn Error>>;

/// Everything a command needs: the resolved data directory and its config
struct Context {
    data_dir: PathBuf,
    config: Config,
    json: bool,
}

impl Context {
    fn session(&self) -> Session<FileStore> {
        Session::open(FileStore::new(&self.data_dir), self.config.undo.limit)
    }

    fn lock(&self) -> Result<DataDirLock, Box<dyn Error>> {
        Ok(DataDirLock::acquire_default(&self.data_dir)?)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let data_dir = match cli.data_dir {
        Some(ref dir) => PathBuf::from(dir),
        None => config_io::default_data_dir(),
    };
    tracing::debug!(data_dir = %data_dir.display(), "resolved data directory");

    let command = match cli.command {
        Commands::Init(args) => return cmd_init(&config_path(&data_dir), args),
        other => other,
    };

    let ctx = Context {
        config: config_io::read_config(&data_dir)?,
        data_dir,
        json: cli.json,
    };

    match command {
        Commands::Init(_) => Ok(()),

        // Read commands
        Commands::Lists => cmd_lists(&ctx),
        Commands::Show => cmd_show(&ctx),
        Commands::Search(args) => cmd_search(&ctx, args),
        Commands::Export(args) => cmd_export(&ctx, args),

        // List commands
        Commands::New(args) => cmd_new(&ctx, args),
        Commands::Rename(args) => cmd_rename(&ctx, args),
        Commands::Delete(args) => cmd_delete(&ctx, args),
        Commands::Select(args) => cmd_select(&ctx, args),
        Commands::Pin(args) => cmd_pin(&ctx, args),

        // Item commands
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::Edit(args) => cmd_edit(&ctx, args),
        Commands::Toggle(args) => cmd_toggle(&ctx, args),
        Commands::Rm(args) => cmd_rm(&ctx, args),
        Commands::Undo => cmd_undo(&ctx),
        Commands::Mv(args) => cmd_mv(&ctx, args),
        Commands::Bulk(args) => cmd_bulk(&ctx, args),
        Commands::Split(args) => cmd_split(&ctx, args),

        Commands::Remote(args) => cmd_remote(&ctx, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_list_id(s: &str) -> Result<ListId, String> {
    s.parse().map_err(|_| format!("invalid list ID '{}'", s))
}

fn parse_item_id(s: &str) -> Result<ItemId, String> {
    s.parse().map_err(|_| format!("invalid item ID '{}'", s))
}

fn parse_item_ids(ids: &[String]) -> Result<Vec<ItemId>, String> {
    ids.iter().map(|s| parse_item_id(s)).collect()
}

fn require_selected<S: crate::io::storage::KeyValueStore>(
    session: &Session<S>,
) -> Result<&List, String> {
    session
        .selected()
        .ok_or_else(|| "no list selected (try `lm new <name>` or `lm select <id>`)".to_string())
}

/// Print notices; a rejection becomes the command's error.
fn report(effects: Vec<Effect>) -> CmdResult {
    for effect in effects {
        match effect {
            Effect::Rejected(msg) => return Err(msg.into()),
            other => {
                if let Some(msg) = other.message() {
                    println!("{}", msg);
                }
            }
        }
    }
    Ok(())
}

/// Ask a yes/no question on stderr. Anything but `y` declines.
fn confirm_prompt(question: &str) -> Result<bool, Box<dyn Error>> {
    eprintln!("{}", question);
    eprint!("Proceed? [y/n] ");
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_lists(ctx: &Context) -> CmdResult {
    let session = ctx.session();
    if ctx.json {
        return print_json(&lists_to_json(session.lists(), session.selected_id()));
    }
    if session.lists().is_empty() {
        println!("no lists (try `lm new <name>`)");
        return Ok(());
    }
    for line in format_lists(session.lists(), session.selected_id()) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_show(ctx: &Context) -> CmdResult {
    let session = ctx.session();
    let list = require_selected(&session)?;
    if ctx.json {
        return print_json(&list_to_detail(list));
    }
    for line in format_list_detail(list) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_search(ctx: &Context, args: SearchArgs) -> CmdResult {
    let session = ctx.session();
    let re = search::smart_case_regex(&args.pattern)?;
    let filter = args.list.as_deref().map(parse_list_id).transpose()?;
    let hits = search::search_items(session.lists(), &re, filter);

    if ctx.json {
        let json: Vec<SearchHitJson> = hits
            .iter()
            .map(|h| hit_to_json(h, session.lists()))
            .collect();
        return print_json(&json);
    }
    for hit in &hits {
        if let Some(line) = format_search_hit(hit, session.lists()) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_export(ctx: &Context, args: ExportArgs) -> CmdResult {
    let session = ctx.session();
    let list = require_selected(&session)?;
    let doc = export::render(list, Layout::from(&ctx.config.export));
    let path = match args.out {
        Some(out) => PathBuf::from(out),
        None => PathBuf::from(export::file_name(list)),
    };
    atomic_write(&path, doc.to_text().as_bytes())
        .map_err(|e| format!("could not write {}: {}", path.display(), e))?;
    tracing::debug!(path = %path.display(), pages = doc.pages.len(), "exported list");
    println!(
        "{} ({} page{})",
        path.display(),
        doc.pages.len(),
        if doc.pages.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// List commands
// ---------------------------------------------------------------------------

fn cmd_new(ctx: &Context, args: NewArgs) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut session = ctx.session();
    report(session.create_list(&args.name)?)?;
    if let Some(id) = session.selected_id() {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_rename(ctx: &Context, args: RenameArgs) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut session = ctx.session();
    let id = require_selected(&session)?.id;
    report(session.rename_list(id, &args.name)?)
}

fn cmd_delete(ctx: &Context, args: DeleteArgs) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut session = ctx.session();
    let list = require_selected(&session)?;
    let id = list.id;
    if !args.yes {
        let question = format!(
            "Delete list \"{}\" and its {} item{}?",
            list.name,
            list.items.len(),
            if list.items.len() == 1 { "" } else { "s" }
        );
        if !confirm_prompt(&question)? {
            println!("cancelled");
            return Ok(());
        }
    }
    // undo records of the deleted list go with it; no toast for that
    let effects = session.delete_list(id)?;
    report(effects.into_iter().filter(|e| *e != Effect::UndoDismissed).collect())?;
    match session.selected() {
        Some(next) => println!("selected {} ({})", next.name, next.id),
        None => println!("no lists left"),
    }
    Ok(())
}

fn cmd_select(ctx: &Context, args: ListIdArg) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut session = ctx.session();
    report(session.select(parse_list_id(&args.id)?)?)
}

fn cmd_pin(ctx: &Context, args: PinArgs) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut session = ctx.session();
    let id = match args.id {
        Some(ref s) => parse_list_id(s)?,
        None => require_selected(&session)?.id,
    };
    report(session.toggle_pin(id)?)?;
    if let Some(list) = session.find_by_id(id) {
        println!("{} {}", if list.is_pinned { "pinned" } else { "unpinned" }, list.name);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Item commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut session = ctx.session();
    report(session.add_item(&args.text)?)?;
    if let Some(item) = session.selected().and_then(|l| l.items.last()) {
        println!("{}", item.id);
    }
    Ok(())
}

fn cmd_edit(ctx: &Context, args: EditArgs) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut session = ctx.session();
    report(session.edit_item(parse_item_id(&args.id)?, &args.text)?)
}

fn cmd_toggle(ctx: &Context, args: ItemIdArg) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut session = ctx.session();
    let id = parse_item_id(&args.id)?;
    report(session.toggle_item(id)?)?;
    if let Some(item) = session.selected().and_then(|l| l.item(id)) {
        println!("{}", format_item_line(item));
    }
    Ok(())
}

fn cmd_rm(ctx: &Context, args: ItemIdArg) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut session = ctx.session();
    report(session.delete_item(parse_item_id(&args.id)?)?)
}

fn cmd_undo(ctx: &Context) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut session = ctx.session();
    report(session.undo_delete()?)
}

fn cmd_mv(ctx: &Context, args: MvArgs) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut session = ctx.session();
    let active = parse_item_id(&args.active)?;
    let over = parse_item_id(&args.over)?;
    let list = require_selected(&session)?;
    for id in [active, over] {
        if list.item(id).is_none() {
            return Err(format!("Item {} not found", id).into());
        }
    }
    report(session.reorder(active, over)?)
}

/// Check the given items in multi-edit mode, failing on unknown ids.
fn check_items(session: &mut Session<FileStore>, ids: &[ItemId]) -> CmdResult {
    let list = require_selected(&*session)?;
    if let Some(missing) = ids.iter().find(|id| list.item(**id).is_none()) {
        return Err(format!("Item {} not found", missing).into());
    }
    session.enter_multi_edit();
    let unique: HashSet<ItemId> = ids.iter().copied().collect();
    for id in unique {
        session.select_item(id);
    }
    Ok(())
}

fn cmd_bulk(ctx: &Context, args: BulkCmd) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut session = ctx.session();

    let (action, ids_args) = match args.action {
        BulkCommand::Done(a) => (BulkAction::MarkDone, a),
        BulkCommand::Undone(a) => (BulkAction::MarkNotDone, a),
        BulkCommand::Delete(a) => (BulkAction::Delete, a),
        BulkCommand::Move(a) => {
            let target = parse_move_target(&a.to)?;
            let ids = parse_item_ids(&a.ids)?;
            check_items(&mut session, &ids)?;
            return report(session.bulk_move(target)?);
        }
    };

    let ids = parse_item_ids(&ids_args.ids)?;
    check_items(&mut session, &ids)?;
    let Some(request) = session.request_bulk(action) else {
        return Ok(());
    };
    if !ids_args.yes
        && !confirm_prompt(&format!("{} {}", request.title, request.description))?
    {
        println!("cancelled");
        return Ok(());
    }
    report(session.confirm(request)?)
}

fn cmd_split(ctx: &Context, args: SplitArgs) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut session = ctx.session();
    let ids = parse_item_ids(&args.ids)?;
    let list = require_selected(&session)?;
    if let Some(missing) = ids.iter().find(|id| list.item(**id).is_none()) {
        return Err(format!("Item {} not found", missing).into());
    }
    let ids: HashSet<ItemId> = ids.into_iter().collect();
    report(session.split_to_new_list(&args.name, &ids)?)?;
    if let Some(id) = session.selected_id() {
        println!("{}", id);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Remote
// ---------------------------------------------------------------------------

fn resolved<T>(state: RemoteState<T>) -> Result<T, Box<dyn Error>> {
    match state {
        RemoteState::Resolved(value) => Ok(value),
        RemoteState::Failed(msg) => Err(msg.into()),
        RemoteState::Pending => Err("remote request did not complete".into()),
    }
}

fn cmd_remote(ctx: &Context, args: RemoteCmd) -> CmdResult {
    let client = RemoteClient::new(&ctx.config.remote);
    match args.action {
        RemoteAction::List => {
            let lists = resolved(RemoteState::from(client.fetch_lists()))?;
            if ctx.json {
                return print_json(&lists);
            }
            for list in &lists {
                println!("{}", format_remote_list(list));
            }
            Ok(())
        }
        RemoteAction::Show(arg) => {
            let detail = resolved(RemoteState::from(client.fetch_list(&arg.id)))?;
            if ctx.json {
                return print_json(&detail);
            }
            for line in format_remote_detail(&detail) {
                println!("{}", line);
            }
            Ok(())
        }
        RemoteAction::Pull(arg) => {
            let detail = resolved(RemoteState::from(client.fetch_list(&arg.id)))?;
            let _lock = ctx.lock()?;
            let mut session = ctx.session();
            report(session.import_list(&detail.list.name, &detail.local_entries())?)?;
            if let Some(id) = session.selected_id() {
                println!("{}", id);
            }
            Ok(())
        }
    }
}

fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(config_io::CONFIG_FILE)
}
