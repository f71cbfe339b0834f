// dbt-contracts-core/src/application/batch.rs
//
// Plans several products at once. Each product is independent, so they run
// as blocking tasks over a bounded buffer; results are re-sorted by path so
// the output never depends on completion order.

use futures::StreamExt;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::application::generate::{GenerationOutcome, Orchestrator};
use crate::domain::generation::overlapping_paths;
use crate::error::ContractsError;

const MAX_CONCURRENT_PRODUCTS: usize = 8;

pub struct ProductResult {
    pub path: PathBuf,
    pub outcome: Result<GenerationOutcome, ContractsError>,
}

pub struct BatchOutcome {
    /// One entry per input path, sorted by path.
    pub results: Vec<ProductResult>,
    /// Target paths produced by more than one successful product.
    pub overlapping: Vec<PathBuf>,
}

impl BatchOutcome {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_err()).count()
    }
}

pub async fn plan_products(orchestrator: &Orchestrator, paths: Vec<PathBuf>) -> BatchOutcome {
    let tasks = paths.into_iter().map(|path| {
        let orchestrator = orchestrator.clone();
        async move {
            let task_path = path.clone();
            let outcome = tokio::task::spawn_blocking(move || orchestrator.plan_file(&task_path))
                .await
                .unwrap_or_else(|e| Err(ContractsError::InternalError(e.to_string())));
            ProductResult { path, outcome }
        }
    });

    let mut results: Vec<ProductResult> = futures::stream::iter(tasks)
        .buffer_unordered(MAX_CONCURRENT_PRODUCTS)
        .collect()
        .await;
    results.sort_by(|a, b| a.path.cmp(&b.path));

    let overlapping = overlapping_paths(
        results
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok())
            .map(|outcome| &outcome.plan),
    );
    for path in &overlapping {
        warn!(path = %path.display(), "Target path produced by several products");
    }

    info!(products = results.len(), "Batch planned");
    BatchOutcome {
        results,
        overlapping,
    }
}
