use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use serde_json::{json, Value};
use tokio::sync::{oneshot, watch};

use crate::loader::{self, LoadError, Transport, TransportError, TransportResponse};
use crate::paginator;
use crate::record::{self, Record};
use crate::view::{self, Frame, LoadState, View, ViewEvent, ViewState};

/// Answers every request with the same canned result and counts calls.
struct ScriptedTransport {
    result: Result<TransportResponse, TransportError>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    fn status(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(TransportResponse {
                status,
                body: body.as_bytes().to_vec(),
            }),
            calls: AtomicUsize::new(0),
        })
    }

    fn json(body: Value) -> Arc<Self> {
        Self::status(200, &body.to_string())
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(TransportError::new(message)),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    fn get<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.result.clone();
        Box::pin(async move { result })
    }
}

/// Holds the response until the test releases it.
struct GatedTransport {
    gate: Mutex<Option<oneshot::Receiver<TransportResponse>>>,
}

impl GatedTransport {
    fn new() -> (Arc<Self>, oneshot::Sender<TransportResponse>) {
        let (tx, rx) = oneshot::channel();
        (
            Arc::new(Self {
                gate: Mutex::new(Some(rx)),
            }),
            tx,
        )
    }
}

impl Transport for GatedTransport {
    fn get<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        let rx = self.gate.lock().ok().and_then(|mut g| g.take());
        Box::pin(async move {
            match rx {
                Some(rx) => rx
                    .await
                    .map_err(|_| TransportError::new("gate closed")),
                None => Err(TransportError::new("gate already used")),
            }
        })
    }
}

fn scenario_a() -> Value {
    json!([
        {"percentage_funded": 100, "amount_pledged": 10000},
        {"percentage_funded": 200, "amount_pledged": 20000},
        {"percentage_funded": 150, "amount_pledged": 15000},
        {"percentage_funded": 120, "amount_pledged": 12000},
        {"percentage_funded": 180, "amount_pledged": 18000},
        {"percentage_funded": 90, "amount_pledged": 9000}
    ])
}

fn numbered_records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| Record {
            percentage_funded: json!(i),
            amount_pledged: json!(i * 10),
        })
        .collect()
}

async fn resolved_view(transport: Arc<ScriptedTransport>) -> View {
    let view = View::start(transport, "http://example.com/projects.json", 5);
    view.resolved().await;
    view
}

#[test]
fn validate_keeps_complete_items_in_order() {
    let items = vec![
        json!({"percentage_funded": 1, "amount_pledged": 10, "title": "a"}),
        json!({"percentage_funded": 2}),
        json!(null),
        json!({"amount_pledged": 30}),
        json!({"percentage_funded": "4", "amount_pledged": [40]}),
        json!("percentage_funded amount_pledged"),
        json!({"percentage_funded": 5, "amount_pledged": null}),
    ];
    let kept = record::validate(items);
    let pcts: Vec<Value> = kept.iter().map(|r| r.percentage_funded.clone()).collect();
    assert_eq!(pcts, vec![json!(1), json!("4"), json!(5)]);
    assert_eq!(kept[1].amount_pledged, json!([40]));
}

#[test]
fn total_pages_matches_ceiling_division() {
    for n in 0..40usize {
        for size in 1..8usize {
            let expected = (n + size - 1) / size;
            assert_eq!(paginator::total_pages(n, size), expected);
            assert_eq!(paginator::total_pages(n, size) == 0, n == 0);
        }
    }
}

#[test]
fn pages_cover_every_record_exactly_once() {
    for n in 0..24usize {
        let records = numbered_records(n);
        for size in 1..8usize {
            let total = paginator::total_pages(n, size);
            let mut ordinals = Vec::new();
            for page_number in paginator::page_numbers(total) {
                let page = paginator::compute_page(&records, size, page_number);
                if page_number < total {
                    assert_eq!(page.rows.len(), size);
                } else {
                    assert_eq!(page.rows.len(), n - (total - 1) * size);
                }
                for (ordinal, record) in page.numbered() {
                    assert_eq!(record.percentage_funded, json!(ordinal - 1));
                    ordinals.push(ordinal);
                }
            }
            assert_eq!(ordinals, (1..=n).collect::<Vec<_>>());
        }
    }
}

#[tokio::test]
async fn loader_fetches_once_and_filters() {
    let transport = ScriptedTransport::json(scenario_a());
    let records = loader::load(transport.as_ref(), "http://example.com/").await.unwrap();
    assert_eq!(records.len(), 6);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn loader_treats_non_array_as_empty_success() {
    let transport = ScriptedTransport::json(json!({"projects": scenario_a()}));
    let records = loader::load(transport.as_ref(), "http://example.com/").await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn loader_reports_each_failure_kind() {
    let err = loader::load(ScriptedTransport::failing("dns error").as_ref(), "http://x/")
        .await
        .unwrap_err();
    assert_eq!(err, LoadError::Transport("dns error".to_string()));

    let err = loader::load(ScriptedTransport::status(404, "[]").as_ref(), "http://x/")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("404"));

    let err = loader::load(ScriptedTransport::status(200, "{not json").as_ref(), "http://x/")
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Parse(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn scenario_a_two_pages() {
    let view = resolved_view(ScriptedTransport::json(scenario_a())).await;

    match view.frame().await {
        Frame::Table {
            rows,
            page_numbers,
            current_page,
            total_pages,
        } => {
            assert_eq!(rows.iter().map(|r| r.ordinal).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
            assert_eq!(rows[1].amount_pledged, json!(20000));
            assert_eq!(page_numbers, vec![1, 2]);
            assert_eq!(current_page, 1);
            assert_eq!(total_pages, 2);
        }
        other => panic!("unexpected frame {other:?}"),
    }

    assert!(view.apply(ViewEvent::SetPage(2)).await);
    match view.frame().await {
        Frame::Table { rows, current_page, .. } => {
            assert_eq!(current_page, 2);
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].ordinal, 6);
            assert_eq!(rows[0].percentage_funded, json!(90));
        }
        other => panic!("unexpected frame {other:?}"),
    }
}

#[tokio::test]
async fn scenario_b_server_error_fails_view() {
    let transport = ScriptedTransport::status(500, "");
    let view = resolved_view(transport.clone()).await;

    match view.frame().await {
        Frame::Error { message, reason } => {
            assert!(message.contains("Unable to fetch"));
            assert!(reason.contains("500"));
        }
        other => panic!("unexpected frame {other:?}"),
    }
    assert!(!view.apply(ViewEvent::SetPage(1)).await);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn scenario_c_empty_list_is_empty_state() {
    let view = resolved_view(ScriptedTransport::json(json!([]))).await;
    assert_eq!(view.frame().await, Frame::Empty);
    assert!(!view.is_loading().await);
}

#[tokio::test]
async fn scenario_d_incomplete_item_is_dropped() {
    let mut items = scenario_a();
    if let Some(list) = items.as_array_mut() {
        list.insert(2, json!({"percentage_funded": 175}));
    }
    let view = resolved_view(ScriptedTransport::json(items)).await;
    view.apply(ViewEvent::SetPage(2)).await;

    match view.frame().await {
        Frame::Table { rows, total_pages, .. } => {
            assert_eq!(total_pages, 2);
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].ordinal, 6);
            assert_eq!(rows[0].amount_pledged, json!(9000));
        }
        other => panic!("unexpected frame {other:?}"),
    }
}

#[tokio::test]
async fn view_stays_loading_until_transport_answers() {
    let (transport, release) = GatedTransport::new();
    let view = View::start(transport, "http://example.com/", 5);

    tokio::task::yield_now().await;
    assert!(view.is_loading().await);
    assert_eq!(view.frame().await, Frame::Loading);
    assert!(!view.apply(ViewEvent::SetPage(2)).await);

    release
        .send(TransportResponse {
            status: 200,
            body: scenario_a().to_string().into_bytes(),
        })
        .unwrap();
    view.resolved().await;
    assert!(!view.is_loading().await);
    assert_eq!(view.current_page().await, 1);
}

#[tokio::test]
async fn result_after_teardown_is_discarded() {
    let (transport, release) = GatedTransport::new();
    let state = Arc::new(tokio::sync::Mutex::new(ViewState::new(5)));
    let (done_tx, done_rx) = watch::channel(false);
    let handle = view::spawn_load(
        Arc::downgrade(&state),
        done_tx,
        transport,
        "http://example.com/".to_string(),
    );

    drop(state);
    let _ = release.send(TransportResponse {
        status: 200,
        body: b"[]".to_vec(),
    });
    handle.await.unwrap();
    assert!(!*done_rx.borrow());
}

#[tokio::test]
async fn resolved_state_never_returns_to_loading() {
    let (transport, release) = GatedTransport::new();
    let state = Arc::new(tokio::sync::Mutex::new(ViewState::new(5)));
    let (done_tx, mut done_rx) = watch::channel(false);
    let handle = view::spawn_load(
        Arc::downgrade(&state),
        done_tx,
        transport,
        "http://example.com/".to_string(),
    );

    let _ = release.send(TransportResponse {
        status: 502,
        body: Vec::new(),
    });
    handle.await.unwrap();
    done_rx.wait_for(|done| *done).await.unwrap();

    let mut guard = state.lock().await;
    assert!(matches!(
        guard.load_state(),
        LoadState::Failed(LoadError::HttpStatus(502))
    ));
    assert!(!guard.resolve(Ok(Arc::from(numbered_records(3)))));
    assert!(matches!(guard.load_state(), LoadState::Failed(_)));
}
