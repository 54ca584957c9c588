//! In-process notification scheduler.

use std::sync::Mutex;

use super::{
    NotificationRequest, NotificationScheduler, NotificationTrigger, NotifyError, NotifyResult,
    ScheduledNotification,
};

#[derive(Debug, Default)]
struct SchedulerState {
    next_id: u64,
    pending: Vec<(String, NotificationRequest)>,
    presented: Vec<NotificationRequest>,
}

/// Scheduler that keeps notifications in memory.
///
/// Used by tests and by hosts without a notification subsystem. Immediate
/// notifications are recorded as presented and never show up as pending.
#[derive(Debug, Default)]
pub struct InMemoryScheduler {
    state: Mutex<SchedulerState>,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending requests with their identifiers, in scheduling order.
    pub fn pending_requests(&self) -> Vec<(String, NotificationRequest)> {
        self.state
            .lock()
            .map(|state| state.pending.clone())
            .unwrap_or_default()
    }

    /// Immediate notifications presented so far.
    pub fn presented(&self) -> Vec<NotificationRequest> {
        self.state
            .lock()
            .map(|state| state.presented.clone())
            .unwrap_or_default()
    }
}

impl NotificationScheduler for InMemoryScheduler {
    fn schedule(&self, request: NotificationRequest) -> NotifyResult<String> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| NotifyError::Platform(format!("Lock poisoned: {}", e)))?;

        state.next_id += 1;
        let identifier = format!("notification-{}", state.next_id);

        match request.trigger {
            NotificationTrigger::Immediate => state.presented.push(request),
            NotificationTrigger::Daily { .. } => state.pending.push((identifier.clone(), request)),
        }
        Ok(identifier)
    }

    fn cancel(&self, identifier: &str) -> NotifyResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| NotifyError::Platform(format!("Lock poisoned: {}", e)))?;
        state.pending.retain(|(id, _)| id != identifier);
        Ok(())
    }

    fn pending(&self) -> NotifyResult<Vec<ScheduledNotification>> {
        let state = self
            .state
            .lock()
            .map_err(|e| NotifyError::Platform(format!("Lock poisoned: {}", e)))?;
        Ok(state
            .pending
            .iter()
            .map(|(identifier, request)| ScheduledNotification {
                identifier: identifier.clone(),
                data: Some(request.data.clone()),
            })
            .collect())
    }
}
