//! JSON model persistence.
//!
//! A trained model is persisted as one [`ModelSchema`] document. Reading
//! validates the document before any tables are rebuilt, so a rejected file
//! never leaves a half-imported model behind.
//!
//! # Example
//!
//! ```no_run
//! use flightcast::persist;
//!
//! let schema = persist::read_path("model.json")?;
//! persist::write_path(&schema, "copy.json", true)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod convert;
mod error;
mod schema;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub use error::{ReadError, WriteError};
pub use schema::{ConditionalTableSchema, ModelSchema, PTablesSchema, StatusTableSchema};

/// Parse and validate a model document.
pub fn read_json<R: Read>(reader: R) -> Result<ModelSchema, ReadError> {
    let schema: ModelSchema = serde_json::from_reader(reader)?;
    schema.validate()?;
    Ok(schema)
}

/// Serialize a model document.
pub fn write_json<W: Write>(
    schema: &ModelSchema,
    writer: W,
    pretty: bool,
) -> Result<(), WriteError> {
    if pretty {
        serde_json::to_writer_pretty(writer, schema)?;
    } else {
        serde_json::to_writer(writer, schema)?;
    }
    Ok(())
}

pub fn read_path(path: impl AsRef<Path>) -> Result<ModelSchema, ReadError> {
    let file = File::open(path.as_ref())?;
    read_json(BufReader::new(file))
}

pub fn write_path(
    schema: &ModelSchema,
    path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), WriteError> {

    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_json(schema, &mut writer, pretty)?;
    writer.flush()?;
    Ok(())
}
