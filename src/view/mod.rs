//! The view's load/page state machine and the frames it hands to a renderer.

use std::sync::{Arc, Weak};

use log::{debug, error, info};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::loader::{self, LoadError, Transport};
use crate::paginator;
use crate::record::RecordSet;

pub const ERROR_MESSAGE: &str = "Unable to fetch Kickstarter projects. Please try again later.";

#[derive(Clone, Debug)]
pub enum LoadState {
    Loading,
    Failed(LoadError),
    Succeeded(RecordSet),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageState {
    pub current_page: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self { current_page: 1 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    SetPage(usize),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Row {
    pub ordinal: usize,
    pub percentage_funded: Value,
    pub amount_pledged: Value,
}

/// What a renderer draws for the current state.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Frame {
    Loading,
    Error {
        message: String,
        reason: String,
    },
    Empty,
    Table {
        rows: Vec<Row>,
        /// Empty when everything fits on one page.
        page_numbers: Vec<usize>,
        current_page: usize,
        total_pages: usize,
    },
}

#[derive(Clone, Debug)]
pub struct ViewState {
    load: LoadState,
    page: PageState,
    page_size: usize,
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        Self {
            load: LoadState::Loading,
            page: PageState::default(),
            page_size: page_size.max(1),
        }
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn current_page(&self) -> usize {
        self.page.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Moves out of `Loading`. Returns `false`, leaving the state untouched,
    /// if the load already resolved.
    pub fn resolve(&mut self, result: Result<RecordSet, LoadError>) -> bool {
        if !self.load.is_loading() {
            debug!("ignoring load result, view already resolved");
            return false;
        }
        self.load = match result {
            Ok(records) => {
                info!("loaded {} projects", records.len());
                LoadState::Succeeded(records)
            }
            Err(e) => {
                error!("error fetching projects: {e}");
                LoadState::Failed(e)
            }
        };
        true
    }

    /// Applies a selector event. Only a loaded view has pages to select.
    pub fn apply(&mut self, event: ViewEvent) -> bool {
        match event {
            ViewEvent::SetPage(n) => {
                if n == 0 || !matches!(self.load, LoadState::Succeeded(_)) {
                    return false;
                }
                self.page.current_page = n;
                true
            }
        }
    }

    pub fn frame(&self) -> Frame {
        match &self.load {
            LoadState::Loading => Frame::Loading,
            LoadState::Failed(e) => Frame::Error {
                message: ERROR_MESSAGE.to_string(),
                reason: e.to_string(),
            },
            LoadState::Succeeded(records) if records.is_empty() => Frame::Empty,
            LoadState::Succeeded(records) => {
                let page =
                    paginator::compute_page(records, self.page_size, self.page.current_page);
                let rows = page
                    .numbered()
                    .map(|(ordinal, record)| Row {
                        ordinal,
                        percentage_funded: record.percentage_funded.clone(),
                        amount_pledged: record.amount_pledged.clone(),
                    })
                    .collect();
                let page_numbers = if page.total_pages > 1 {
                    paginator::page_numbers(page.total_pages)
                } else {
                    Vec::new()
                };
                Frame::Table {
                    rows,
                    page_numbers,
                    current_page: self.page.current_page,
                    total_pages: page.total_pages,
                }
            }
        }
    }
}

/// A live view whose records load in the background.
///
/// Dropping the view aborts the pending load; a result that still arrives
/// after the view is gone is discarded.
#[derive(Debug)]
pub struct View {
    state: Arc<Mutex<ViewState>>,
    resolved: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl View {
    /// Enters `Loading` and starts the single load. Must be called inside a
    /// tokio runtime.
    pub fn start<T>(transport: Arc<T>, url: impl Into<String>, page_size: usize) -> Self
    where
        T: Transport + ?Sized + 'static,
    {
        let state = Arc::new(Mutex::new(ViewState::new(page_size)));
        let (done_tx, resolved) = watch::channel(false);
        let task = spawn_load(Arc::downgrade(&state), done_tx, transport, url.into());
        Self {
            state,
            resolved,
            task,
        }
    }

    /// Waits until the load has resolved. Returns immediately if it already
    /// has, and never returns if the transport never does.
    pub async fn resolved(&self) {
        let mut rx = self.resolved.clone();
        if rx.wait_for(|done| *done).await.is_err() {
            debug!("load task ended without resolving the view");
        }
    }

    pub async fn frame(&self) -> Frame {
        self.state.lock().await.frame()
    }

    pub async fn apply(&self, event: ViewEvent) -> bool {
        self.state.lock().await.apply(event)
    }

    pub async fn current_page(&self) -> usize {
        self.state.lock().await.current_page()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.load_state().is_loading()
    }
}

impl Drop for View {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub(crate) fn spawn_load<T>(
    state: Weak<Mutex<ViewState>>,
    done: watch::Sender<bool>,
    transport: Arc<T>,
    url: String,
) -> JoinHandle<()>
where
    T: Transport + ?Sized + 'static,
{
    tokio::spawn(async move {
        let result = loader::load(transport.as_ref(), &url).await;
        let Some(state) = state.upgrade() else {
            debug!("view torn down before load resolved, discarding result");
            return;
        };
        state.lock().await.resolve(result);
        let _ = done.send(true);
    })
}
