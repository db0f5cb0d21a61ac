//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand};
use dms_model::{AccessLevel, DocumentId, UserId};
use std::path::PathBuf;

/// Shift DMS document store
#[derive(Parser, Debug)]
#[command(name = "shift-dms", author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding settings.json and the document store.
    #[arg(long, env = "SHIFT_DMS_DATA_DIR", default_value = ".shift-dms")]
    pub data_dir: PathBuf,

    /// Token signing secret.
    #[arg(long, env = "SHIFT_DMS_SECRET_KEY", hide_env_values = true)]
    pub secret: Option<String>,

    /// Session token of the acting user.
    #[arg(long, env = "SHIFT_DMS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write default settings and create the store directory.
    Init {
        /// Overwrite existing settings.
        #[arg(long)]
        force: bool,
    },

    /// Issue a session token for a user.
    IssueToken {
        /// User id.
        #[arg(long)]
        user: UserId,

        /// Role title or id.
        #[arg(long)]
        role: String,
    },

    /// Create a document owned by the acting user.
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        content: String,

        /// private, public or shared (or 1, 2, 3).
        #[arg(long, default_value = "public")]
        access: AccessLevel,

        /// Role ids that may read a shared document.
        #[arg(long, value_delimiter = ',')]
        roles: Vec<u64>,
    },

    /// Show one document.
    Show { id: DocumentId },

    /// List readable documents.
    List,

    /// Change a document. Omitted fields keep their stored values.
    Update {
        id: DocumentId,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(long)]
        access: Option<AccessLevel>,

        /// Replacement role ids for a shared document.
        #[arg(long, value_delimiter = ',')]
        roles: Option<Vec<u64>>,
    },

    /// Delete a document.
    Delete { id: DocumentId },
}
