/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Runs registration operations on a single background thread.
//!
//! Every call to the endpoint service blocks, so callers on a UI thread hand
//! their operations to a [`RegistrationWorker`] instead. The worker owns one
//! thread which drains a bounded queue of tasks in submission order; each task
//! hands its result back through a [`PendingResult`].
//!
//! Interrupt scopes are taken when a task is queued, not when it runs, so
//! [`RegistrationWorker::interrupt`] cancels the queued backlog as well as the
//! task in flight.
//!
//! Submitting blocks while the queue is full, except for the
//! [`TokenUpdateObserver`] callbacks: those never block, and a token update
//! that finds the queue full is dropped with a warning.
//!
//! Dropping the worker stops the thread once the tasks already queued have
//! run. A `PendingResult` whose task can no longer run reports that the worker
//! has gone away.

use std::{
    sync::{
        mpsc::{
            sync_channel, Receiver, RecvTimeoutError, SyncSender, TryRecvError, TrySendError,
        },
        Arc,
    },
    thread,
    time::Duration,
};

use error_support::convert_log_error;
use interrupt_support::InterruptScope;

use crate::error::{debug, error, info, warn, ApiResult, Error, PushRegistrationApiError};
use crate::internal::token::{TokenSource, TokenUpdateObserver};
use crate::{PublishOutcome, PushRegistrationManager, RegistrationOutcome};

const MAX_QUEUED_TASKS: usize = 64;

type Reply<T> = SyncSender<ApiResult<T>>;

enum Task {
    Stop,
    TokenRefreshed {
        token: String,
        did_change: bool,
        scope: InterruptScope,
        reply: Reply<RegistrationOutcome>,
    },
    TokenRefreshFailed {
        reason: String,
    },
    RegisterDevice {
        source: Arc<dyn TokenSource + Send + Sync>,
        scope: InterruptScope,
        reply: Reply<RegistrationOutcome>,
    },
    SetDesiredEnabled {
        enabled: bool,
        scope: InterruptScope,
        reply: Reply<()>,
    },
    Publish {
        subject: String,
        message: String,
        target_id: String,
        scope: InterruptScope,
        reply: Reply<()>,
    },
    PublishToAll {
        subject: String,
        message: String,
        targets: Vec<String>,
        scope: InterruptScope,
        reply: Reply<Vec<PublishOutcome>>,
    },
}

impl Task {
    fn run(self, manager: &PushRegistrationManager) {
        // A send failure only means the caller dropped its `PendingResult`.
        match self {
            Task::Stop => {}
            Task::TokenRefreshed {
                token,
                did_change,
                scope,
                reply,
            } => {
                let _ = reply.send(manager.on_token_refreshed_scoped(&token, did_change, &scope));
            }
            Task::TokenRefreshFailed { reason } => manager.on_token_refresh_failed(&reason),
            Task::RegisterDevice {
                source,
                scope,
                reply,
            } => {
                let _ = reply.send(manager.register_device_scoped(&*source, &scope));
            }
            Task::SetDesiredEnabled {
                enabled,
                scope,
                reply,
            } => {
                let _ = reply.send(manager.set_desired_enabled_scoped(enabled, &scope));
            }
            Task::Publish {
                subject,
                message,
                target_id,
                scope,
                reply,
            } => {
                let _ = reply.send(manager.publish_scoped(&subject, &message, &target_id, &scope));
            }
            Task::PublishToAll {
                subject,
                message,
                targets,
                scope,
                reply,
            } => {
                let _ =
                    reply.send(manager.publish_to_all_scoped(&subject, &message, &targets, &scope));
            }
        }
    }
}

/// The result of a task queued on a [`RegistrationWorker`].
#[must_use = "dropping a PendingResult discards the outcome, not the task"]
pub struct PendingResult<T> {
    receiver: Receiver<ApiResult<T>>,
}

impl<T> PendingResult<T> {
    fn new() -> (Reply<T>, Self) {
        let (sender, receiver) = sync_channel(1);
        (sender, Self { receiver })
    }

    /// Block until the task has run.
    pub fn wait(self) -> ApiResult<T> {
        self.receiver
            .recv()
            .unwrap_or_else(|_| Err(convert_log_error(Error::WorkerGone)))
    }

    /// Block until the task has run or `timeout` elapses. A timeout doesn't cancel the task;
    /// use [`RegistrationWorker::interrupt`] for that.
    pub fn wait_timeout(self, timeout: Duration) -> ApiResult<T> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(convert_log_error(Error::Timeout(timeout))),
            Err(RecvTimeoutError::Disconnected) => Err(convert_log_error(Error::WorkerGone)),
        }
    }

    /// The result if the task has already run.
    pub fn try_result(&self) -> Option<ApiResult<T>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(convert_log_error(Error::WorkerGone))),
        }
    }
}

pub struct RegistrationWorker {
    manager: Arc<PushRegistrationManager>,
    sender: SyncSender<Task>,
    handle: Option<thread::JoinHandle<()>>,
}

impl RegistrationWorker {
    /// Spawn the worker thread for `manager`.
    pub fn start(manager: Arc<PushRegistrationManager>) -> ApiResult<Self> {
        let (sender, receiver) = sync_channel::<Task>(MAX_QUEUED_TASKS);
        let thread_manager = Arc::clone(&manager);
        let handle = thread::Builder::new()
            .name("push-registration".into())
            .spawn(move || {
                for task in receiver {
                    if let Task::Stop = task {
                        break;
                    }
                    task.run(&thread_manager);
                }
                debug!("push registration worker stopped");
            })
            .map_err(|e| PushRegistrationApiError::Internal {
                reason: format!("failed to spawn the registration worker: {}", e),
            })?;
        info!("push registration worker started");
        Ok(Self {
            manager,
            sender,
            handle: Some(handle),
        })
    }

    pub fn manager(&self) -> &Arc<PushRegistrationManager> {
        &self.manager
    }

    pub fn on_token_refreshed(
        &self,
        token: &str,
        did_change: bool,
    ) -> PendingResult<RegistrationOutcome> {
        let (task, pending) = self.token_refreshed_task(token, did_change);
        self.submit(task);
        pending
    }

    pub fn on_token_refresh_failed(&self, reason: &str) {
        self.submit(Task::TokenRefreshFailed {
            reason: reason.to_owned(),
        });
    }

    pub fn register_device(
        &self,
        source: Arc<dyn TokenSource + Send + Sync>,
    ) -> PendingResult<RegistrationOutcome> {
        let (reply, pending) = PendingResult::new();
        self.submit(Task::RegisterDevice {
            source,
            scope: self.manager.interrupt_scope(),
            reply,
        });
        pending
    }

    pub fn set_desired_enabled(&self, enabled: bool) -> PendingResult<()> {
        let (reply, pending) = PendingResult::new();
        self.submit(Task::SetDesiredEnabled {
            enabled,
            scope: self.manager.interrupt_scope(),
            reply,
        });
        pending
    }

    pub fn publish(&self, subject: &str, message: &str, target_id: &str) -> PendingResult<()> {
        let (reply, pending) = PendingResult::new();
        self.submit(Task::Publish {
            subject: subject.to_owned(),
            message: message.to_owned(),
            target_id: target_id.to_owned(),
            scope: self.manager.interrupt_scope(),
            reply,
        });
        pending
    }

    pub fn publish_to_all(
        &self,
        subject: &str,
        message: &str,
        targets: &[String],
    ) -> PendingResult<Vec<PublishOutcome>> {
        let (reply, pending) = PendingResult::new();
        self.submit(Task::PublishToAll {
            subject: subject.to_owned(),
            message: message.to_owned(),
            targets: targets.to_vec(),
            scope: self.manager.interrupt_scope(),
            reply,
        });
        pending
    }

    /// Publish to every recipient in the manager's configuration.
    pub fn publish_to_recipients(
        &self,
        subject: &str,
        message: &str,
    ) -> PendingResult<Vec<PublishOutcome>> {
        self.publish_to_all(subject, message, self.manager.recipients())
    }

    /// Interrupt the task in flight and everything queued so far.
    pub fn interrupt(&self) {
        self.manager.interrupt();
    }

    fn token_refreshed_task(
        &self,
        token: &str,
        did_change: bool,
    ) -> (Task, PendingResult<RegistrationOutcome>) {
        let (reply, pending) = PendingResult::new();
        let task = Task::TokenRefreshed {
            token: token.to_owned(),
            did_change,
            scope: self.manager.interrupt_scope(),
            reply,
        };
        (task, pending)
    }

    // Blocks while the queue is full. If the thread is gone the task, and with it the reply
    // sender, is dropped here, which resolves its `PendingResult` to an error.
    fn submit(&self, task: Task) {
        if self.sender.send(task).is_err() {
            warn!("push registration worker has stopped, dropping task");
        }
    }

    // Never blocks.
    fn offer(&self, task: Task) {
        match self.sender.try_send(task) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("push registration queue is full, dropping token update")
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("push registration worker has stopped, dropping task")
            }
        }
    }
}

impl TokenUpdateObserver for RegistrationWorker {
    fn on_token_update(&self, token: &str, did_change: bool) {
        // Nobody waits on this one; failures are logged by the manager.
        let (task, _pending) = self.token_refreshed_task(token, did_change);
        self.offer(task);
    }

    fn on_token_update_failed(&self, reason: &str) {
        self.offer(Task::TokenRefreshFailed {
            reason: reason.to_owned(),
        });
    }
}

impl Drop for RegistrationWorker {
    fn drop(&mut self) {
        // Fails only if the thread is already gone.
        let _ = self.sender.send(Task::Stop);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("push registration worker panicked");
            }
        }
    }
}
