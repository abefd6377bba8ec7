//! Command-line interface definitions.
//!
//! Defines the `osfcore` command tree using `clap`: database migrations,
//! configuration checks, registration schemas, OSF groups and the Dataverse
//! storage addon.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::{GroupRole, Permission};
use crate::infrastructure::config::paths;

/// Registration schemas, OSF groups and storage addons
#[derive(Parser, Debug)]
#[command(name = "osfcore")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Force or release colored output for the whole process.
    pub fn apply(&self) {
        match self {
            Self::Auto => owo_colors::unset_override(),
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

/// Top-level subcommands for the osfcore CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply, list or revert database migrations
    Migrate(MigrateArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Manage users
    #[command(subcommand)]
    User(UserCommand),

    /// Manage projects and components
    #[command(subcommand)]
    Node(NodeCommand),

    /// Import and inspect registration schemas
    #[command(subcommand)]
    Schema(SchemaCommand),

    /// Manage OSF groups and their project permissions
    #[command(subcommand)]
    Group(GroupCommand),

    /// Configure the Dataverse storage addon
    #[command(subcommand)]
    Dataverse(DataverseCommand),
}

/// Arguments for `osfcore migrate`.
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Only list pending migrations
    #[arg(long, conflicts_with = "revert")]
    pub status: bool,

    /// Revert the most recently applied migration
    #[arg(long)]
    pub revert: bool,
}

/// Subcommands for `osfcore config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration with defaults applied.
    Show,
    /// Validate a configuration file for correctness.
    Validate,
}

/// Subcommands for `osfcore user`.
#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a user.
    Create(UserCreateArgs),
    /// Show a user and their groups.
    Show(IdArg),
}

#[derive(Args, Debug)]
pub struct UserCreateArgs {
    /// Full name
    pub fullname: String,
    /// Email address
    pub email: String,
}

/// Subcommands for `osfcore node`.
#[derive(Subcommand, Debug)]
pub enum NodeCommand {
    /// Create a project, or a component with `--parent`.
    Create(NodeCreateArgs),
    /// Show a node and its log.
    Show(IdArg),
}

#[derive(Args, Debug)]
pub struct NodeCreateArgs {
    /// Title
    pub title: String,
    /// Parent project id; creates a component
    #[arg(long)]
    pub parent: Option<String>,
}

/// Subcommands for `osfcore schema`.
#[derive(Subcommand, Debug)]
pub enum SchemaCommand {
    /// Import schema documents from JSON files.
    Import(SchemaImportArgs),
    /// List the latest version of every schema.
    List(SchemaListArgs),
    /// Show a schema and its blocks.
    Show(IdArg),
    /// Validate registration responses against a schema.
    Validate(SchemaValidateArgs),
}

#[derive(Args, Debug)]
pub struct SchemaImportArgs {
    /// Schema document files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Import as file-metadata schemas
    #[arg(long)]
    pub file_metadata: bool,
}

#[derive(Args, Debug)]
pub struct SchemaListArgs {
    /// Every stored version, not only the latest
    #[arg(long)]
    pub all: bool,
    /// Include inactive schemas
    #[arg(long)]
    pub inactive: bool,
    /// List file-metadata schemas
    #[arg(long, conflicts_with = "all")]
    pub file_metadata: bool,
}

#[derive(Args, Debug)]
pub struct SchemaValidateArgs {
    /// Schema id
    pub id: String,
    /// JSON file with the responses
    pub responses: PathBuf,
    /// Treat the file as nested registration metadata
    #[arg(long)]
    pub metadata: bool,
    /// Skip required-question checks (draft mode)
    #[arg(long)]
    pub draft: bool,
}

/// Subcommands for `osfcore group`.
#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Create a group managed by its creator.
    Create(GroupCreateArgs),
    /// Show a group, its members and its projects.
    Show(IdArg),
    /// Add a user to a group, or change their role.
    Add(GroupAddArgs),
    /// Invite someone without an account by email.
    Invite(GroupInviteArgs),
    /// Remove a user from a group.
    Remove(GroupMemberArgs),
    /// Rename a group.
    Rename(GroupRenameArgs),
    /// Give a group permissions on a project.
    Connect(GroupConnectArgs),
    /// Revoke a group's permissions on a project.
    Disconnect(GroupNodeArgs),
    /// Delete a group.
    Delete(GroupDeleteArgs),
}

#[derive(Args, Debug)]
pub struct GroupCreateArgs {
    /// Group name
    pub name: String,
    /// Id of the creating user
    #[arg(long)]
    pub creator: String,
}

#[derive(Args, Debug)]
pub struct GroupAddArgs {
    /// Group id
    pub group: String,
    /// User id
    pub user: String,
    /// Role to grant
    #[arg(long = "as", value_enum, default_value_t = RoleArg::Member)]
    pub role: RoleArg,
    /// Id of the acting manager
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(Args, Debug)]
pub struct GroupInviteArgs {
    /// Group id
    pub group: String,
    /// Full name of the invitee
    pub fullname: String,
    /// Email address of the invitee
    pub email: String,
    /// Role to grant
    #[arg(long = "as", value_enum, default_value_t = RoleArg::Member)]
    pub role: RoleArg,
    /// Id of the inviting manager
    #[arg(long)]
    pub by: String,
}

#[derive(Args, Debug)]
pub struct GroupMemberArgs {
    /// Group id
    pub group: String,
    /// User id
    pub user: String,
    /// Id of the acting user
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(Args, Debug)]
pub struct GroupRenameArgs {
    /// Group id
    pub group: String,
    /// New name
    pub name: String,
    /// Id of the acting manager
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(Args, Debug)]
pub struct GroupConnectArgs {
    /// Group id
    pub group: String,
    /// Node id
    pub node: String,
    /// Permission to grant
    #[arg(long, value_enum, default_value_t = PermissionArg::Write)]
    pub permission: PermissionArg,
    /// Id of the acting manager
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(Args, Debug)]
pub struct GroupNodeArgs {
    /// Group id
    pub group: String,
    /// Node id
    pub node: String,
    /// Id of the acting manager
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(Args, Debug)]
pub struct GroupDeleteArgs {
    /// Group id
    pub group: String,
    /// Id of the acting manager
    #[arg(long)]
    pub by: Option<String>,
}

/// Subcommands for `osfcore dataverse`.
#[derive(Subcommand, Debug)]
pub enum DataverseCommand {
    /// Store an API token for a Dataverse host.
    Connect(DataverseConnectArgs),
    /// Authorize a project with one of the user's accounts.
    Authorize(DataverseAuthorizeArgs),
    /// Remove the project's authorization.
    Deauthorize(DataverseDeauthorizeArgs),
    /// Select the dataset a project stores files in.
    Dataset(DataverseDatasetArgs),
    /// Show a project's Dataverse settings.
    Show(DataverseShowArgs),
}

#[derive(Args, Debug)]
pub struct DataverseConnectArgs {
    /// User id
    pub user: String,
    /// Dataverse host, e.g. `dataverse.harvard.edu`
    pub host: String,
    /// API token
    #[arg(long)]
    pub token: String,
}

#[derive(Args, Debug)]
pub struct DataverseAuthorizeArgs {
    /// Node id
    pub node: String,
    /// User id
    pub user: String,
    /// External account id returned by `dataverse connect`
    pub account: String,
}

#[derive(Args, Debug)]
pub struct DataverseDeauthorizeArgs {
    /// Node id
    pub node: String,
    /// User id
    pub user: String,
}

#[derive(Args, Debug)]
pub struct DataverseDatasetArgs {
    /// Node id
    pub node: String,
    /// Dataverse alias
    #[arg(long)]
    pub alias: String,
    /// Dataverse title
    #[arg(long)]
    pub dataverse: String,
    /// Dataset DOI, e.g. `doi:10.7910/DVN/ABCDEF`
    #[arg(long)]
    pub doi: String,
    /// Dataset title
    #[arg(long)]
    pub title: String,
}

#[derive(Args, Debug)]
pub struct DataverseShowArgs {
    /// Node id
    pub node: String,
    /// Viewing user id
    #[arg(long)]
    pub user: String,
}

/// A single positional id.
#[derive(Args, Debug)]
pub struct IdArg {
    /// Object id
    pub id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Member,
    Manager,
}

impl From<RoleArg> for GroupRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Member => GroupRole::Member,
            RoleArg::Manager => GroupRole::Manager,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PermissionArg {
    Read,
    Write,
    Admin,
}

impl From<PermissionArg> for Permission {
    fn from(permission: PermissionArg) -> Self {
        match permission {
            PermissionArg::Read => Permission::Read,
            PermissionArg::Write => Permission::Write,
            PermissionArg::Admin => Permission::Admin,
        }
    }
}
