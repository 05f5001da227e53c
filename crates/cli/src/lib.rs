// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! toucan - device-side client for the Toucan push-notification service.
//!
//! The client registers a device, manages its tags, and acknowledges
//! notifications. Calls made while the backend is unreachable are persisted
//! as jobs and replayed later by the delivery driver.
//!
//! # Main Components
//!
//! - [`ToucanClient`] - builds, signs, and routes every API call
//! - [`JobStore`] - durable on-disk queue of pending jobs
//! - [`DeliveryDriver`] - replays queued jobs with retry and backoff
//! - [`Config`] - credentials, endpoint, and delivery settings
//! - [`Error`] - error types for all operations
//!
//! ```rust,ignore
//! use toucan::{Collaborators, Config, Registration, ToucanClient};
//!
//! let config = Config::load(&Config::locate(None))?;
//! let client = ToucanClient::new(&config, collaborators)?;
//! client.register("token", Registration::default(), None)?;
//! ```

mod cli;
mod commands;

pub mod callback;
pub mod client;
pub mod config;
pub mod connectivity;
pub mod delivery;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod host;
pub mod id;
pub mod prefs;
pub mod queue;
pub mod transport;

#[cfg(test)]
mod test_helpers;

pub use callback::{CallbackRegistry, CallbackRouter, Completion, LogCallback, ResponseCallback};
pub use cli::{AckCommand, Cli, Command, ExternalIdArgs, NotificationArgs, TagsCommand};
pub use client::{Collaborators, Registration, Submission, ToucanClient};
pub use config::{Config, DeliveryConfig, DeviceConfig};
pub use connectivity::{Connectivity, ProbedConnectivity, StaticConnectivity, TcpProbe};
pub use delivery::{DeliveryDriver, PassReport};
pub use dispatch::{DispatchWorker, Dispatcher, WorkerState};
pub use error::{Error, Result};
pub use host::{NotifyHost, TaskHost};
pub use prefs::{FilePreferences, Preferences};
pub use queue::{JobStore, QueueError};
pub use transport::{HttpTransport, ReqwestTransport, TransportError};

use commands::Session;
use toucan_core::NotificationRef;

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&Config::locate(cli.config.as_deref()))?;

    if let Command::Pending = cli.command {
        let store = JobStore::open(&config.queue_dir())?;
        return commands::pending::run(&store, &mut std::io::stdout().lock());
    }

    let session = Session::open(&config, cli.offline)?;
    match cli.command {
        Command::Register { token, ids, referral } => {
            let options = Registration { external_id: ids.external_id, group_id: ids.group_id, referral };
            session.send(|c| c.register(&token, options, None))
        }
        Command::InformReferral { referral } => session.send(|c| c.inform_referral(&referral, None)),
        Command::InformExternalIds { ids } => session
            .send(|c| c.inform_external_ids(ids.external_id.unwrap_or(0), ids.group_id.unwrap_or(0), None)),
        Command::Unregister => session.send(|c| c.unregister(None)),
        Command::Enable => session.send(|c| c.enable(None)),
        Command::Ack(AckCommand::Received(n)) => {
            session.send(|c| c.ack_received(&NotificationRef::new(n.id, n.reference), None))
        }
        Command::Ack(AckCommand::Read(n)) => session.send(|c| c.ack_read(&NotificationRef::new(n.id, n.reference), None)),
        Command::Tags(TagsCommand::Add { tags }) => session.send(|c| c.add_tags(tags, None)),
        Command::Tags(TagsCommand::Remove { tags }) => session.send(|c| c.remove_tags(tags, None)),
        Command::Tags(TagsCommand::Reset { tags }) => session.send(|c| c.reset_tags(tags, None)),
        Command::Tags(TagsCommand::List) => session.send(|c| c.list_tags(None)),
        Command::Pending => commands::pending::run(session.client.store(), &mut std::io::stdout().lock()),
        Command::Deliver => commands::deliver::once(&session),
        Command::Run => commands::deliver::serve(&session),
    }
}
