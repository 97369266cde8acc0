use clap::{ArgAction, Args, Parser, Subcommand};

pub const WF_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\nGlobal options:\n{options}\n";

pub const WF_BEFORE_HELP: &str = concat!(
    "wf ",
    env!("CARGO_PKG_VERSION"),
    " – focused installs for package.json monorepos\n\n",
    "\x1b[1;36mCommands\x1b[0m\n",
    "  focus            Install only the chosen workspaces and what they depend on.\n",
    "  install          Install every workspace of the project.\n",
    "  list             Show the workspaces of the project.\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "wf",
    author,
    version,
    propagate_version = false,
    disable_help_subcommand = true,
    before_help = WF_BEFORE_HELP,
    help_template = WF_HELP_TEMPLATE
)]
#[allow(clippy::struct_excessive_bools)]
pub struct WfCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still set the exit code)",
        global = true
    )]
    pub quiet: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging (-vv reaches trace)",
        global = true
    )]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[command(subcommand)]
    pub command: CommandGroupCli,
}

#[derive(Subcommand, Debug)]
pub enum CommandGroupCli {
    #[command(
        about = "Install a subset of workspaces; package.json files stay untouched.",
        override_usage = "wf focus [WORKSPACE ...] [--all] [--production]"
    )]
    Focus(FocusArgs),
    #[command(about = "Install every workspace and rewrite their manifests.")]
    Install,
    #[command(about = "List the workspaces of the current project.")]
    List,
}

#[derive(Args, Debug)]
pub struct FocusArgs {
    #[arg(
        value_name = "WORKSPACE",
        help = "Workspaces to focus on (defaults to the one containing the current directory)"
    )]
    pub workspaces: Vec<String>,
    #[arg(
        short = 'A',
        long,
        conflicts_with = "workspaces",
        help = "Focus on every workspace of the project"
    )]
    pub all: bool,
    #[arg(long, help = "Leave devDependencies out of the install")]
    pub production: bool,
}
