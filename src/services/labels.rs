use crate::error::AppError;
use crate::models::category::Category;
use crate::services::resources::ResourceReader;
use csv::ReaderBuilder;
use std::collections::HashMap;

/// Class index to display name. Empty means no labels are available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    entries: HashMap<u32, String>,
}

impl LabelTable {
    pub fn get(&self, index: u32) -> Option<&str> {
        self.entries.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parses `id,scientific[,common]` rows. Rows whose id is not a
/// non-negative integer are skipped.
pub fn parse_label_table(text: &str) -> Result<LabelTable, AppError> {
    let text = text.trim_start_matches('\u{feff}');
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut entries = HashMap::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let Some(id) = record.get(0).and_then(|s| s.parse::<u32>().ok()) else {
            continue;
        };
        let scientific = record.get(1).unwrap_or_default();
        let common = record.get(2).unwrap_or_default();

        let label = if common.is_empty() {
            scientific.to_string()
        } else {
            format!("{} ({})", common, scientific)
        };
        entries.insert(id, label);
    }

    Ok(LabelTable { entries })
}

/// Fail-soft: any read or parse failure is logged and yields an empty table.
pub async fn load_label_table(resources: &dyn ResourceReader, category: Category) -> LabelTable {
    let path = category.config().labels;
    let result = match resources.read_text(path).await {
        Ok(text) => parse_label_table(&text),
        Err(e) => Err(e),
    };

    match result {
        Ok(table) => {
            log::info!("Loaded {} labels for {}", table.len(), category);
            table
        }
        Err(e) => {
            log::error!("CSV load error for {} ({}): {}", category, path, e);
            LabelTable::default()
        }
    }
}
