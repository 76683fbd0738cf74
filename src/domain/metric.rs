// Metric definition domain model
use serde::Serialize;

/// Metric definition as stored in the source `metrics` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDefinition {
    pub name: String,
    pub unit: String,
    pub description: String,
}

impl MetricDefinition {
    pub fn new(name: String, unit: String, description: String) -> Self {
        Self {
            name,
            unit,
            description,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricMigrationReport {
    pub created: Vec<String>,
    pub failed: Vec<(String, String)>,
}
