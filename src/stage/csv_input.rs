//! The CSV parser packaged as a pipeline stage.

use crate::codec::CodecRegistry;
use crate::codec::stream::CompressionInput;
use crate::error::{Error, Result};
use crate::parser::{CsvParser, CsvParserConfig};
use crate::schema::{FieldDescriptor, RowSchema};
use crate::stage::queue::RowProducer;
use crate::stage::{RowObserver, Stage};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

fn default_compression() -> String {
    "none".to_string()
}

/// Full configuration for one CSV input stage, hydratable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvInputConfig {
    /// Source file to read.
    pub path: PathBuf,
    /// Tokenizer options.
    #[serde(default)]
    pub parser: CsvParserConfig,
    /// Registry name of the decompression codec; `"none"` reads the file
    /// as-is through the same stream path.
    #[serde(default = "default_compression")]
    pub compression: String,
    /// Ordered field descriptors; defines the output schema.
    pub fields: Vec<FieldDescriptor>,
}

/// A [`Stage`] that streams typed rows out of a delimited text file.
///
/// Wire collaborators before `init`: [`CsvInputStage::add_observer`] for
/// synchronous per-row callbacks, [`CsvInputStage::add_output`] for each
/// downstream queue. Fan-out pushes one clone of the row per queue, so
/// every consumer observes the same total order.
pub struct CsvInputStage {
    config: CsvInputConfig,
    registry: Arc<CodecRegistry>,
    schema: Option<RowSchema>,
    parser: Option<CsvParser>,
    observers: Vec<Box<dyn RowObserver>>,
    outputs: Vec<RowProducer>,
    produced: u64,
}

impl CsvInputStage {
    pub fn new(config: CsvInputConfig, registry: Arc<CodecRegistry>) -> Self {
        Self {
            config,
            registry,
            schema: None,
            parser: None,
            observers: Vec::new(),
            outputs: Vec::new(),
            produced: 0,
        }
    }

    /// Register a row observer. Observers run in registration order.
    pub fn add_observer(&mut self, observer: Box<dyn RowObserver>) {
        self.observers.push(observer);
    }

    /// Attach a downstream queue.
    pub fn add_output(&mut self, output: RowProducer) {
        self.outputs.push(output);
    }

    /// The schema built at init, if init has run.
    pub fn schema(&self) -> Option<&RowSchema> {
        self.schema.as_ref()
    }

    /// Current 1-based parse line, for error reporting and progress.
    pub fn line_number(&self) -> Option<u64> {
        self.parser.as_ref().map(CsvParser::line_number)
    }

    fn close_outputs(&mut self) {
        for output in &mut self.outputs {
            output.close();
        }
    }
}

impl Stage for CsvInputStage {
    fn name(&self) -> &str {
        "csv-input"
    }

    fn init(&mut self) -> Result<()> {
        let schema = RowSchema::new(self.config.fields.clone())
            .map_err(|e| Error::Configuration(e.to_string()))?;
        let provider = self.registry.lookup(&self.config.compression)?;
        let file = File::open(&self.config.path).map_err(|e| {
            Error::Configuration(format!("cannot open {}: {e}", self.config.path.display()))
        })?;
        let input = CompressionInput::new(Box::new(file), provider);
        let parser = CsvParser::new(self.config.parser.clone(), schema.clone(), input)?;
        tracing::debug!(
            path = %self.config.path.display(),
            compression = %self.config.compression,
            columns = schema.len(),
            "csv input initialized"
        );
        self.schema = Some(schema);
        self.parser = Some(parser);
        Ok(())
    }

    fn process_one_unit(&mut self) -> Result<bool> {
        let (Some(parser), Some(schema)) = (self.parser.as_mut(), self.schema.as_ref()) else {
            return Err(Error::Configuration("stage was not initialized".into()));
        };
        match parser.next_row()? {
            None => {
                // Terminal: close owned queues so downstream sees clean
                // closure instead of blocking.
                self.close_outputs();
                Ok(false)
            }
            Some(row) => {
                for observer in &self.observers {
                    observer
                        .on_row_produced(schema, &row)
                        .map_err(|e| Error::Observer(e.to_string()))?;
                }
                for output in &self.outputs {
                    output.push(row.clone())?;
                }
                self.produced += 1;
                Ok(true)
            }
        }
    }

    fn dispose(&mut self) {
        if let Some(parser) = self.parser.as_mut() {
            parser.close();
        }
        self.close_outputs();
        tracing::debug!(produced = self.produced, "csv input disposed");
    }

    fn produced_row_count(&self) -> u64 {
        self.produced
    }
}
