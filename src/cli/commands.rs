use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lm", about = concat!("[x] listmachine v", env!("CARGO_PKG_VERSION"), " - lists that stay put"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config.toml to the data directory
    Init(InitArgs),
    /// Show all lists, pinned first
    Lists,
    /// Create a list and select it
    New(NewArgs),
    /// Rename the selected list
    Rename(RenameArgs),
    /// Delete the selected list
    Delete(DeleteArgs),
    /// Select a list by ID
    Select(ListIdArg),
    /// Pin or unpin a list (default: the selected list)
    Pin(PinArgs),
    /// Show the selected list's items
    Show,
    /// Add an item to the selected list
    Add(AddArgs),
    /// Change an item's text
    Edit(EditArgs),
    /// Toggle an item done/not done
    Toggle(ItemIdArg),
    /// Delete an item (undoable)
    Rm(ItemIdArg),
    /// Restore the most recently deleted item
    Undo,
    /// Move an item to another item's position
    Mv(MvArgs),
    /// Apply an action to several items at once
    Bulk(BulkCmd),
    /// Move items into a new list
    Split(SplitArgs),
    /// Search list names and items by regex
    Search(SearchArgs),
    /// Export the selected list as a paginated text document
    Export(ExportArgs),
    /// Read lists from the remote service
    Remote(RemoteCmd),
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config.toml
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// List command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct NewArgs {
    /// List name
    pub name: String,
}

#[derive(Args)]
pub struct RenameArgs {
    /// New name
    pub name: String,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Skip confirmation
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ListIdArg {
    /// List ID
    pub id: String,
}

#[derive(Args)]
pub struct PinArgs {
    /// List ID (default: the selected list)
    pub id: Option<String>,
}

// ---------------------------------------------------------------------------
// Item command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Item text
    pub text: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Item ID
    pub id: String,
    /// New text
    pub text: String,
}

#[derive(Args)]
pub struct ItemIdArg {
    /// Item ID
    pub id: String,
}

#[derive(Args)]
pub struct MvArgs {
    /// Item to move
    pub active: String,
    /// Item whose position it takes
    pub over: String,
}

#[derive(Args)]
pub struct BulkCmd {
    #[command(subcommand)]
    pub action: BulkCommand,
}

#[derive(Subcommand)]
pub enum BulkCommand {
    /// Mark items done
    Done(BulkIdsArgs),
    /// Mark items not done
    Undone(BulkIdsArgs),
    /// Delete items (not undoable)
    Delete(BulkIdsArgs),
    /// Move items to the top or bottom, or to another list
    Move(BulkMoveArgs),
}

#[derive(Args)]
pub struct BulkIdsArgs {
    /// Item IDs
    #[arg(required = true)]
    pub ids: Vec<String>,
    /// Skip confirmation
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct BulkMoveArgs {
    /// Item IDs
    #[arg(required = true)]
    pub ids: Vec<String>,
    /// Destination: top, bottom, or a list ID
    #[arg(long)]
    pub to: String,
}

#[derive(Args)]
pub struct SplitArgs {
    /// Name of the new list
    pub name: String,
    /// Item IDs to move into it
    #[arg(required = true)]
    pub ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Search / export / remote args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SearchArgs {
    /// Regex pattern (case-insensitive unless it contains uppercase)
    pub pattern: String,
    /// Limit search to one list
    #[arg(long)]
    pub list: Option<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output path (default: "<list name>.txt" in the current directory)
    #[arg(long)]
    pub out: Option<String>,
}

#[derive(Args)]
pub struct RemoteCmd {
    #[command(subcommand)]
    pub action: RemoteAction,
}

#[derive(Subcommand)]
pub enum RemoteAction {
    /// List remote lists
    List,
    /// Show a remote list with its items
    Show(RemoteIdArg),
    /// Copy a remote list into a new local list
    Pull(RemoteIdArg),
}

#[derive(Args)]
pub struct RemoteIdArg {
    /// Remote list ID
    pub id: String,
}
