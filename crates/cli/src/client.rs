// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The public client.
//!
//! Every call builds and signs its request, then either dispatches it
//! (online) or persists it for the delivery driver (offline). Calls return
//! as soon as that routing decision is made; the outcome arrives on the
//! callback. The online check reads cached connectivity state and never
//! touches the network.
//!
//! Calls that act on behalf of a registered device (acks, tags, informs)
//! require the notification token from a previous registration and fail
//! with [`Error::Precondition`] before doing anything else.

use std::sync::Arc;

use tokio::runtime::Handle;
use toucan_core::{
    AckRequest, ClockSource, DeviceQuery, DeviceRegistrationRecord, DeviceRegistrationRequest, Endpoints, Job,
    JobId, JobIdGenerator, NotificationRef, Operation, SignedRequest, Signer, SystemClock, TagsRequest,
};

use crate::callback::{CallbackRegistry, CallbackRouter, ResponseCallback};
use crate::config::{Config, DeviceConfig};
use crate::connectivity::Connectivity;
use crate::delivery::DeliveryDriver;
use crate::dispatch::{DispatchWorker, Dispatcher};
use crate::error::{Error, Result};
use crate::host::TaskHost;
use crate::prefs::{ensure_device_id, Preferences};
use crate::queue::{JobStore, QueueError};
use crate::transport::HttpTransport;

/// Fresh ids tried before a queued call is given up as lost.
const MAX_ENQUEUE_TRIES: usize = 16;

/// Where a call went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A worker is performing the call now.
    Dispatched(JobId),
    /// The job was persisted for later delivery.
    Queued(JobId),
}

impl Submission {
    pub fn job_id(&self) -> &JobId {
        match self {
            Submission::Dispatched(id) | Submission::Queued(id) => id,
        }
    }
}

/// Optional registration fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    /// Back-end user id; sent when 1 or more.
    pub external_id: Option<i32>,
    /// Back-end group id; sent when 1 or more.
    pub group_id: Option<i32>,
    /// Install referral; sent when non-empty.
    pub referral: Option<String>,
}

/// External collaborators the client depends on.
pub struct Collaborators {
    pub prefs: Arc<dyn Preferences>,
    pub connectivity: Arc<dyn Connectivity>,
    pub host: Arc<dyn TaskHost>,
    pub transport: Arc<dyn HttpTransport>,
    pub callbacks: CallbackRegistry,
    /// Runtime on which online calls run.
    pub runtime: Handle,
}

/// Push-notification client for one application and device.
pub struct ToucanClient {
    signer: Signer,
    endpoints: Endpoints,
    skip_tls_verify: bool,
    device: DeviceConfig,
    device_id: String,
    prefs: Arc<dyn Preferences>,
    connectivity: Arc<dyn Connectivity>,
    host: Arc<dyn TaskHost>,
    store: Arc<JobStore>,
    dispatcher: Dispatcher,
    callbacks: Arc<CallbackRouter>,
    ids: JobIdGenerator<Arc<dyn ClockSource>>,
    delivery: crate::config::DeliveryConfig,
}

impl ToucanClient {
    /// Opens the job store and loads (or creates) the device id.
    pub fn new(config: &Config, deps: Collaborators) -> Result<Self> {
        let state_dir = config.state_dir();
        let store = Arc::new(JobStore::open(&config.queue_dir())?);
        let device_id = ensure_device_id(deps.prefs.as_ref(), &state_dir.display().to_string())?;
        let dispatcher = Dispatcher::new(deps.transport, config.delivery.max_in_flight, deps.runtime);

        Ok(ToucanClient {
            signer: config.signer(),
            endpoints: config.endpoints(),
            skip_tls_verify: config.skip_tls_verify,
            device: config.device.clone(),
            device_id,
            prefs: deps.prefs,
            connectivity: deps.connectivity,
            host: deps.host,
            store,
            dispatcher,
            callbacks: Arc::new(CallbackRouter::new(deps.callbacks)),
            ids: JobIdGenerator::with_clock(Arc::new(SystemClock) as Arc<dyn ClockSource>),
            delivery: config.delivery.clone(),
        })
    }

    /// Replaces the signer, e.g. to use a platform digester.
    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = signer;
        self
    }

    /// Replaces the clock that stamps job ids.
    pub fn with_clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.ids = JobIdGenerator::with_clock(clock);
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn callbacks(&self) -> &Arc<CallbackRouter> {
        &self.callbacks
    }

    /// A delivery driver sharing this client's store, transport and callbacks.
    pub fn delivery_driver(&self) -> DeliveryDriver {
        DeliveryDriver::new(
            Arc::clone(&self.store),
            self.dispatcher.transport(),
            Arc::clone(&self.callbacks),
            self.delivery.clone(),
        )
    }

    /// Waits for every dispatched call to finish.
    pub async fn wait_idle(&self) {
        self.dispatcher.wait_idle().await;
    }

    /// Registers the device with a notification token and stores the token.
    pub fn register(
        &self,
        token: &str,
        options: Registration,
        callback: Option<Arc<dyn ResponseCallback>>,
    ) -> Result<Submission> {
        let operation = Operation::DeviceRegistration;
        if token.is_empty() {
            return Err(Error::Precondition { operation });
        }
        self.prefs.set_notification_token(token)?;

        let mut request = self.registration_request(token);
        if let Some(ext_id) = options.external_id.filter(|id| *id >= 1) {
            request = request.with_external_id(&self.signer, ext_id);
        }
        if let Some(group_id) = options.group_id.filter(|id| *id >= 1) {
            request = request.with_group_id(&self.signer, group_id);
        }
        if let Some(referral) = options.referral.filter(|r| !r.is_empty()) {
            request = request.with_install_referral(&self.signer, referral);
        }
        self.submit_post(operation, &request, callback)
    }

    /// Reports the install referral through a fresh registration.
    pub fn inform_referral(&self, referral: &str, callback: Option<Arc<dyn ResponseCallback>>) -> Result<Submission> {
        let operation = Operation::InformReferral;
        let token = self.require_token(operation)?;
        let mut request = self.registration_request(&token);
        if !referral.is_empty() {
            request = request.with_install_referral(&self.signer, referral);
        }
        self.submit_post(operation, &request, callback)
    }

    /// Links the device to back-end user and group ids. Zero leaves an id unset.
    pub fn inform_external_ids(
        &self,
        external_id: i32,
        group_id: i32,
        callback: Option<Arc<dyn ResponseCallback>>,
    ) -> Result<Submission> {
        let operation = Operation::DeviceRegistration;
        let token = self.require_token(operation)?;
        let mut request = self.registration_request(&token);
        if external_id != 0 {
            request = request.with_external_id(&self.signer, external_id);
        }
        if group_id != 0 {
            request = request.with_group_id(&self.signer, group_id);
        }
        self.submit_post(operation, &request, callback)
    }

    pub fn ack_received(
        &self,
        notification: &NotificationRef,
        callback: Option<Arc<dyn ResponseCallback>>,
    ) -> Result<Submission> {
        self.ack(Operation::AckReceived, notification, callback)
    }

    pub fn ack_read(
        &self,
        notification: &NotificationRef,
        callback: Option<Arc<dyn ResponseCallback>>,
    ) -> Result<Submission> {
        self.ack(Operation::AckRead, notification, callback)
    }

    fn ack(
        &self,
        operation: Operation,
        notification: &NotificationRef,
        callback: Option<Arc<dyn ResponseCallback>>,
    ) -> Result<Submission> {
        let token = self.require_token(operation)?;
        let request = AckRequest::build(&self.signer, &self.device_id, notification, token);
        self.submit_post(operation, &request, callback)
    }

    pub fn add_tags(&self, tags: Vec<String>, callback: Option<Arc<dyn ResponseCallback>>) -> Result<Submission> {
        self.tags(Operation::AddTags, tags, callback)
    }

    pub fn remove_tags(&self, tags: Vec<String>, callback: Option<Arc<dyn ResponseCallback>>) -> Result<Submission> {
        self.tags(Operation::RemoveTags, tags, callback)
    }

    /// Replaces all tags with `tags`. An empty list clears them.
    pub fn reset_tags(&self, tags: Vec<String>, callback: Option<Arc<dyn ResponseCallback>>) -> Result<Submission> {
        self.tags(Operation::ResetTags, tags, callback)
    }

    fn tags(
        &self,
        operation: Operation,
        tags: Vec<String>,
        callback: Option<Arc<dyn ResponseCallback>>,
    ) -> Result<Submission> {
        self.require_token(operation)?;
        let request = TagsRequest::build(&self.signer, &self.device_id, tags);
        self.submit_post(operation, &request, callback)
    }

    /// Lists the device's tags. The body arrives on the callback.
    pub fn list_tags(&self, callback: Option<Arc<dyn ResponseCallback>>) -> Result<Submission> {
        let operation = Operation::ListTags;
        self.require_token(operation)?;
        self.submit_get(operation, callback)
    }

    /// Stops notifications to this device.
    pub fn unregister(&self, callback: Option<Arc<dyn ResponseCallback>>) -> Result<Submission> {
        self.submit_get(Operation::DeviceUnregistration, callback)
    }

    /// Re-enables a previously unregistered device.
    pub fn enable(&self, callback: Option<Arc<dyn ResponseCallback>>) -> Result<Submission> {
        self.submit_get(Operation::DeviceEnable, callback)
    }

    fn require_token(&self, operation: Operation) -> Result<String> {
        match self.prefs.notification_token().filter(|t| !t.is_empty()) {
            Some(token) => Ok(token),
            None => {
                tracing::warn!(%operation, "notification token not established");
                Err(Error::Precondition { operation })
            }
        }
    }

    fn registration_request(&self, token: &str) -> DeviceRegistrationRequest {
        let now = chrono::Utc::now();
        let record = DeviceRegistrationRecord {
            app_version: self.device.app_version,
            not_token: Some(token.to_string()),
            dev_id: Some(self.device_id.clone()),
            dev_os: Some(self.device.os()),
            dev_extra: self.device.extra.clone(),
            dev_locale: Some(self.device.locale()),
            dev_res_type: Some(self.device.resolution.clone()),
            ts_creation: Some(now),
            ts_update: Some(now),
            ..Default::default()
        };
        DeviceRegistrationRequest::build(&self.signer, record)
    }

    fn submit_post<R: SignedRequest>(
        &self,
        operation: Operation,
        request: &R,
        callback: Option<Arc<dyn ResponseCallback>>,
    ) -> Result<Submission> {
        if !request.is_signed() {
            return Err(Error::Signing { operation });
        }
        let id = self.ids.next(operation);
        let job = Job::post(id, operation, self.endpoints.url(operation), request, self.skip_tls_verify)?;
        self.submit(job, callback)
    }

    fn submit_get(&self, operation: Operation, callback: Option<Arc<dyn ResponseCallback>>) -> Result<Submission> {
        let url = DeviceQuery::build(&self.signer, &self.device_id).url(operation, &self.endpoints.url(operation))?;
        let id = self.ids.next(operation);
        self.submit(Job::get(id, operation, url, self.skip_tls_verify), callback)
    }

    fn submit(&self, job: Job, callback: Option<Arc<dyn ResponseCallback>>) -> Result<Submission> {
        let id = job.id.clone();
        if self.connectivity.is_online() {
            let callback = callback.unwrap_or_else(|| self.callbacks.registry().resolve(job.operation));
            tracing::info!(job = %id, operation = %job.operation, "dispatching");
            self.dispatcher.spawn(DispatchWorker::new(job, Some(callback)));
            return Ok(Submission::Dispatched(id));
        }

        let id = self.enqueue(job, callback)?;
        self.host.schedule_delivery();
        Ok(Submission::Queued(id))
    }

    /// Persists a new job under a free id. The live callback is registered
    /// first so a pass that picks the file up at once still reaches it.
    fn enqueue(&self, mut job: Job, callback: Option<Arc<dyn ResponseCallback>>) -> Result<JobId> {
        let mut tries = 0;
        loop {
            tries += 1;
            if let Some(callback) = &callback {
                self.callbacks.remember(job.id.clone(), Arc::clone(callback));
            }
            let err = match self.store.persist(&job) {
                Ok(_) => return Ok(job.id),
                Err(e) => e,
            };
            if callback.is_some() {
                self.callbacks.forget(&job.id);
            }
            match err {
                QueueError::AlreadyExists(_) if tries < MAX_ENQUEUE_TRIES => {
                    let next = self.ids.next(job.operation);
                    tracing::debug!(job = %job.id, next = %next, "job id taken, retrying");
                    job.id = next;
                }
                e => {
                    tracing::error!(job = %job.id, operation = %job.operation, "job lost: {}", e);
                    return Err(Error::Persistence(e));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
