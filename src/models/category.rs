use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Plants,
    Birds,
    Insects,
    Mammals,
}

/// Bundled resource paths for one category, relative to the resource root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ModelConfig {
    pub model: &'static str,
    pub labels: &'static str,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Plants,
        Category::Birds,
        Category::Insects,
        Category::Mammals,
    ];

    pub fn config(&self) -> ModelConfig {
        match self {
            Category::Plants => ModelConfig {
                model: "models/plants/model_float32.onnx",
                labels: "models/plants/labels.csv",
            },
            Category::Birds => ModelConfig {
                model: "models/birds/model_float32.onnx",
                labels: "models/birds/labels.csv",
            },
            Category::Insects => ModelConfig {
                model: "models/insects/model_float32.onnx",
                labels: "models/insects/labels.csv",
            },
            Category::Mammals => ModelConfig {
                model: "models/mammals/model_float32.onnx",
                labels: "models/mammals/labels.csv",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Plants => "Plants",
            Category::Birds => "Birds",
            Category::Insects => "Insects",
            Category::Mammals => "Mammals",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
