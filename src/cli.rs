use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tocedit")]
#[command(about = "View and edit PDF bookmarks (table of contents)")]
#[command(version)]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file layered over the user config
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive bookmark editor
    #[command(alias = "open")]
    Edit {
        /// PDF file to edit
        path: PathBuf,
    },

    /// Print the bookmarks as an indented tree
    #[command(alias = "toc")]
    Show {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Write the bookmarks as a JSON list of [level, title, page]
    Export {
        /// PDF file to read
        path: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the bookmarks from a JSON list of [level, title, page]
    Import {
        /// PDF file to update
        path: PathBuf,

        /// JSON file with the new bookmarks
        json: PathBuf,

        /// Write to a copy instead of updating the PDF in place
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run as MCP server
    Mcp,
}
