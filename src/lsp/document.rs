use crate::analysis::{analyze, AnalysisResult};
use crate::config::Config;
use crate::error::EngineError;
use crate::profile::MachineRegistry;

/// State for each open document
#[derive(Debug)]
pub struct DocumentState {
    pub content: String,
    /// Machine the document was checked against: its modeline, else the
    /// active machine
    pub machine: Option<String>,
    pub analysis: Result<AnalysisResult, EngineError>,
}

impl DocumentState {
    pub fn analyze(content: String, config: &Config, registry: &MachineRegistry) -> Self {
        let (analysis_config, machine) = config.analysis_config(registry, &content);
        let analysis = analyze(&content, &analysis_config);

        Self {
            machine: machine.map(|m| m.name.clone()),
            analysis,
            content,
        }
    }
}
