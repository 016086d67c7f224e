use async_trait::async_trait;
use sheets::client::AppendSummary;
use serde_json::Value;
use sheets::{AppendTarget, RowAppender, SheetsConnector, SheetsError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted result of one append call.
pub enum FakeOutcome {
    Saved,
    Status(u16),
    /// Never completes
    Hang,
}

#[derive(Default)]
struct FakeState {
    outcomes: Mutex<VecDeque<FakeOutcome>>,
    connects: AtomicUsize,
    appends: AtomicUsize,
    rows: Mutex<Vec<(AppendTarget, Vec<Value>)>>,
}

/// In-memory stand-in for the spreadsheet API.
///
/// Plays back the scripted outcomes in order; once they run out every
/// append succeeds. Keys are parsed like the real connector does.
#[derive(Clone, Default)]
pub struct FakeSheets {
    state: Arc<FakeState>,
}

impl FakeSheets {
    pub fn new(outcomes: Vec<FakeOutcome>) -> Self {
        let fake = FakeSheets::default();
        *fake.state.outcomes.lock().unwrap() = outcomes.into();
        fake
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn appends(&self) -> usize {
        self.state.appends.load(Ordering::SeqCst)
    }

    pub fn rows(&self) -> Vec<(AppendTarget, Vec<Value>)> {
        self.state.rows.lock().unwrap().clone()
    }
}

impl SheetsConnector for FakeSheets {
    fn connect(&self, service_key_json: &str) -> Result<Box<dyn RowAppender>, SheetsError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        serde_json::from_str::<serde_json::Value>(service_key_json)?;
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl RowAppender for FakeSheets {
    async fn append_row(
        &self,
        target: &AppendTarget,
        row: &[Value],
    ) -> Result<AppendSummary, SheetsError> {
        self.state.appends.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .state
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(FakeOutcome::Saved);

        match outcome {
            FakeOutcome::Saved => {
                self.state
                    .rows
                    .lock()
                    .unwrap()
                    .push((target.clone(), row.to_vec()));
                Ok(AppendSummary {
                    updated_range: Some(target.range.clone()),
                    updated_rows: Some(1),
                })
            }
            FakeOutcome::Status(status) => Err(SheetsError::Api {
                status,
                message: format!("fake status {status}"),
            }),
            FakeOutcome::Hang => std::future::pending().await,
        }
    }
}
