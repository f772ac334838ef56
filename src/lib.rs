//! rifftree - schema-driven codec for RIFF-family chunk trees
//!
//! RIFF containers (the format under WAV, AVI and friends) are streams of
//! tagged, length-prefixed chunks. `LIST` chunks nest further chunks and the
//! top-level `RIFF` form wraps the whole file. rifftree decodes such trees into
//! typed records and groups, driven by a [`format::Schema`] that maps each
//! 4-byte tag to a record shape or a nested group, and encodes them back
//! byte-for-byte.
//!
//! # Architecture
//!
//! - `format`: tags, headers, field layouts, records, groups, the chunk
//!   factory, schemas and the top-level form
//! - `util`: hex dumps and variable-length string packing
//!
//! # Example
//!
//! ```
//! use rifftree::format::{FieldDef, FieldType, Form, RecordShape, Schema, Value};
//!
//! let bar = RecordShape::fixed(
//!     "bar",
//!     vec![
//!         FieldDef::new("goober", FieldType::U8),
//!         FieldDef::new("rutabaga", FieldType::U8),
//!     ],
//! )?;
//! let schema = Schema::builder(b"test").record(b"bar ", bar).build()?;
//!
//! let mut data = Vec::new();
//! data.extend_from_slice(b"RIFF");
//! data.extend_from_slice(&14u32.to_le_bytes());
//! data.extend_from_slice(b"test");
//! data.extend_from_slice(b"bar ");
//! data.extend_from_slice(&2u32.to_le_bytes());
//! data.extend_from_slice(&[255, 128]);
//!
//! let form = Form::from_bytes(schema, &data)?;
//! assert_eq!(form[0].field("goober"), Some(&Value::U8(255)));
//! assert_eq!(form.to_bytes()?, data);
//! # Ok::<(), rifftree::Error>(())
//! ```

pub mod error;
pub mod format;
pub mod util;

pub use error::{Error, Result};

/// rifftree version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Process-level configuration for rifftree
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Enable verbose logging
    pub verbose: bool,
    /// Enable debug output
    pub debug: bool,
}

/// Initialize rifftree with the given configuration
///
/// Installs a `tracing` subscriber when `verbose` or `debug` is set. Calling
/// it again after a subscriber is installed fails with [`Error::Init`].
pub fn init(config: Config) -> Result<()> {
    if config.verbose || config.debug {
        let level = if config.debug { "debug" } else { "info" };
        tracing_subscriber::fmt()
            .with_env_filter(level)
            .try_init()
            .map_err(|e| Error::Init(format!("Failed to install logger: {}", e)))?;
    }

    Ok(())
}
