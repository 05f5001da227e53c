// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const QUICKSTART_HELP: &str = "\
Get started:
  toucan register --token <TOKEN>      Register this device
  toucan tags add news sports          Subscribe to tags
  toucan --offline tags list           Queue a call for later delivery
  toucan deliver                       Deliver queued calls now";

#[derive(Parser)]
#[command(name = "toucan")]
#[command(about = "Device-side client for the Toucan push-notification service")]
#[command(
    long_about = "Device-side client for the Toucan push-notification service.\n\n\
    Calls made while offline are stored on disk and delivered once connectivity returns."
)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Config file (default: $TOUCAN_CONFIG, then the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Treat the network as unavailable and queue every call
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register this device with a notification token
    #[command(after_help = "Examples:\n  \
        toucan register --token abc123                 Register with a token\n  \
        toucan register --token abc123 --external-id 7 Link to back-end user 7")]
    Register {
        /// Notification token issued by the push provider
        #[arg(long)]
        token: String,

        #[command(flatten)]
        ids: ExternalIdArgs,

        /// Install referral
        #[arg(long)]
        referral: Option<String>,
    },

    /// Report the install referral
    #[command(arg_required_else_help = true)]
    InformReferral {
        /// Referral string
        referral: String,
    },

    /// Link this device to back-end user and group ids
    InformExternalIds {
        #[command(flatten)]
        ids: ExternalIdArgs,
    },

    /// Stop notifications to this device
    Unregister,

    /// Re-enable a previously unregistered device
    Enable,

    /// Acknowledge a notification
    #[command(subcommand)]
    Ack(AckCommand),

    /// Manage device tags
    #[command(subcommand)]
    Tags(TagsCommand),

    /// List queued and dead-lettered calls
    Pending,

    /// Run one delivery pass over the queue
    Deliver,

    /// Deliver queued calls until interrupted
    Run,
}

/// Back-end ids shared by registration commands.
#[derive(Args, Clone, Debug, Default)]
pub struct ExternalIdArgs {
    /// Back-end user id
    #[arg(long)]
    pub external_id: Option<i32>,

    /// Back-end group id
    #[arg(long)]
    pub group_id: Option<i32>,
}

/// Notification identity for acknowledgements.
#[derive(Args, Clone, Debug)]
pub struct NotificationArgs {
    /// Notification id
    #[arg(long)]
    pub id: String,

    /// Notification reference
    #[arg(long = "ref")]
    pub reference: String,
}

#[derive(Subcommand)]
pub enum AckCommand {
    /// The notification was delivered to the device
    Received(NotificationArgs),
    /// The user opened the notification
    Read(NotificationArgs),
}

#[derive(Subcommand)]
pub enum TagsCommand {
    /// Add tags to this device
    #[command(arg_required_else_help = true)]
    Add {
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Remove tags from this device
    #[command(arg_required_else_help = true)]
    Remove {
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Replace all tags (no tags clears them)
    Reset { tags: Vec<String> },
    /// List this device's tags
    List,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
