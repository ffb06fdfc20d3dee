//! Scripted engine and resource reader for exercising switch and inference
//! ordering without real models.

use crate::error::AppError;
use crate::models::category::Category;
use crate::models::classify_types::Recognition;
use crate::services::classifier::engine::{InferenceEngine, LoadConfig, LoadedModel, RunParams};
use crate::services::resources::ResourceReader;
use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

#[derive(Clone, Copy, Debug)]
pub enum Script {
    Hit(u32, f32),
    Empty,
    Fail,
}

#[derive(Default)]
struct EngineState {
    scripts: HashMap<Category, Script>,
    failing: HashSet<Category>,
    gates: HashMap<Category, oneshot::Receiver<()>>,
    run_gates: HashMap<Category, oneshot::Receiver<()>>,
    loads: Vec<Category>,
    runs: Vec<PathBuf>,
    live: usize,
    max_live: usize,
    closed: usize,
}

#[derive(Default, Clone)]
pub struct FakeEngine {
    state: Arc<Mutex<EngineState>>,
}

impl FakeEngine {
    pub fn script(&self, category: Category, script: Script) {
        self.state.lock().unwrap().scripts.insert(category, script);
    }

    pub fn fail_load(&self, category: Category) {
        self.state.lock().unwrap().failing.insert(category);
    }

    /// The next load of `category` waits until the returned sender fires.
    pub fn gate_load(&self, category: Category) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().gates.insert(category, rx);
        tx
    }

    /// The next inference on `category`'s model waits until the returned
    /// sender fires. The run is recorded before it waits.
    pub fn gate_run(&self, category: Category) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().run_gates.insert(category, rx);
        tx
    }

    pub fn loads(&self) -> Vec<Category> {
        self.state.lock().unwrap().loads.clone()
    }

    pub fn runs(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().runs.clone()
    }

    pub fn live(&self) -> usize {
        self.state.lock().unwrap().live
    }

    pub fn max_live(&self) -> usize {
        self.state.lock().unwrap().max_live
    }

    pub fn closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }
}

fn category_of(config: &LoadConfig) -> Category {
    Category::ALL
        .into_iter()
        .find(|c| config.model.ends_with(c.config().model))
        .unwrap_or_default()
}

impl InferenceEngine for FakeEngine {
    fn load_model<'a>(&'a self, config: &'a LoadConfig) -> BoxFuture<'a, Result<Box<dyn LoadedModel>, AppError>> {
        Box::pin(async move {
            let category = category_of(config);
            let gate = {
                let mut state = self.state.lock().unwrap();
                state.loads.push(category);
                state.gates.remove(&category)
            };
            if let Some(gate) = gate {
                let _ = gate.await;
            }

            let mut state = self.state.lock().unwrap();
            if state.failing.contains(&category) {
                return Err(AppError::model_load(format!("no model for {}", category)));
            }
            state.live += 1;
            state.max_live = state.max_live.max(state.live);
            let script = state.scripts.get(&category).copied().unwrap_or(Script::Empty);

            Ok(Box::new(FakeModel {
                category,
                script,
                state: Arc::clone(&self.state),
            }) as Box<dyn LoadedModel>)
        })
    }
}

struct FakeModel {
    category: Category,
    script: Script,
    state: Arc<Mutex<EngineState>>,
}

impl LoadedModel for FakeModel {
    fn run_model_on_image<'a>(&'a mut self, params: &'a RunParams) -> BoxFuture<'a, Result<Vec<Recognition>, AppError>> {
        Box::pin(async move {
            let gate = {
                let mut state = self.state.lock().unwrap();
                state.runs.push(params.path.clone());
                state.run_gates.remove(&self.category)
            };
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            match self.script {
                Script::Hit(index, confidence) => Ok(vec![Recognition { index, confidence }]),
                Script::Empty => Ok(Vec::new()),
                Script::Fail => Err(AppError::inference("engine crashed")),
            }
        })
    }

    fn close(self: Box<Self>) {
        let mut state = self.state.lock().unwrap();
        state.live -= 1;
        state.closed += 1;
    }
}

#[derive(Default)]
pub struct FakeResources {
    files: Mutex<HashMap<String, String>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    reads: Mutex<Vec<String>>,
}

impl FakeResources {
    pub fn labels(&self, category: Category, text: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(category.config().labels.to_string(), text.to_string());
    }

    /// The next read of `category`'s labels waits until the sender fires.
    pub fn gate_labels(&self, category: Category) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .unwrap()
            .insert(category.config().labels.to_string(), rx);
        tx
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }
}

impl ResourceReader for FakeResources {
    fn read_text<'a>(&'a self, logical_path: &'a str) -> BoxFuture<'a, Result<String, AppError>> {
        Box::pin(async move {
            self.reads.lock().unwrap().push(logical_path.to_string());
            let gate = self.gates.lock().unwrap().remove(logical_path);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.files
                .lock()
                .unwrap()
                .get(logical_path)
                .cloned()
                .ok_or_else(|| AppError::resource_load(format!("{} not bundled", logical_path)))
        })
    }

    fn locate(&self, logical_path: &str) -> PathBuf {
        PathBuf::from(logical_path)
    }
}
