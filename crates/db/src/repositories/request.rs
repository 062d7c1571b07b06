//! In-memory request repository.
//!
//! Each request sits behind its own async mutex, so writers to one
//! request serialize while different requests proceed in parallel.

use std::sync::Arc;

use custody_core::policy::Approver;
use custody_core::workflow::{
    ApprovableRequest, ApprovalStateMachine, RequestKind, RequestStatus, WorkflowError,
};
use custody_shared::types::{PageRequest, PageResponse, RequestId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;

/// Filter options for listing requests.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    /// Filter by request kind.
    pub kind: Option<RequestKind>,
    /// Filter by aggregate status.
    pub status: Option<RequestStatus>,
    /// Only requests whose chain includes this approver.
    pub approver: Option<Approver>,
}

impl RequestFilter {
    fn matches(&self, request: &ApprovableRequest) -> bool {
        self.kind.is_none_or(|k| request.kind() == k)
            && self
                .status
                .is_none_or(|s| ApprovalStateMachine::aggregate_status(request) == s)
            && self
                .approver
                .as_ref()
                .is_none_or(|a| request.position_of(a).is_some())
    }
}

/// Request repository backed by a concurrent map.
#[derive(Debug, Default)]
pub struct RequestRepository {
    requests: DashMap<RequestId, Arc<Mutex<ApprovableRequest>>>,
}

impl RequestRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a newly submitted request.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRequest` if the id is already taken.
    pub fn insert(&self, request: ApprovableRequest) -> Result<(), WorkflowError> {
        match self.requests.entry(request.id()) {
            Entry::Occupied(_) => Err(WorkflowError::DuplicateRequest(request.id())),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(request)));
                Ok(())
            }
        }
    }

    /// Returns a snapshot of a request.
    pub async fn get(&self, id: RequestId) -> Result<ApprovableRequest, WorkflowError> {
        let handle = self.handle(id)?;
        let request = handle.lock().await;
        Ok(request.clone())
    }

    /// Number of stored requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Lists requests matching `filter`, newest first.
    pub async fn list(
        &self,
        filter: &RequestFilter,
        page: &PageRequest,
    ) -> PageResponse<ApprovableRequest> {
        let page = page.normalized();

        // Clone the handles out so no map shard stays locked across an await.
        let handles: Vec<_> = self
            .requests
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut matching = Vec::new();
        for handle in handles {
            let request = handle.lock().await;
            if filter.matches(&request) {
                matching.push(request.clone());
            }
        }
        matching.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });

        let total = u64::try_from(matching.len()).unwrap_or(u64::MAX);
        let data = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
            .collect();

        PageResponse::new(data, page.page, page.per_page, total)
    }

    /// Applies `f` to a request under its lock.
    ///
    /// `f` works on a copy; the stored request is replaced only if `f`
    /// succeeds. When `expected_version` is given and differs from the
    /// stored version, nothing runs and `VersionConflict` is returned.
    pub async fn update<T, F>(
        &self,
        id: RequestId,
        expected_version: Option<u64>,
        f: F,
    ) -> Result<(ApprovableRequest, T), WorkflowError>
    where
        F: FnOnce(&mut ApprovableRequest) -> Result<T, WorkflowError>,
    {
        let handle = self.handle(id)?;
        let mut stored = handle.lock().await;

        if let Some(expected) = expected_version
            && expected != stored.version()
        {
            return Err(WorkflowError::VersionConflict {
                expected,
                actual: stored.version(),
            });
        }

        let mut working = stored.clone();
        let output = f(&mut working)?;
        *stored = working.clone();

        Ok((working, output))
    }

    fn handle(&self, id: RequestId) -> Result<Arc<Mutex<ApprovableRequest>>, WorkflowError> {
        self.requests
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(WorkflowError::RequestNotFound(id))
    }
}
