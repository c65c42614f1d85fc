use crate::column::Column;

/// Errors raised while reading or converting measurement files.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum DataError {
    #[display("I/O error: {_0}")]
    Io(std::io::Error),
    #[display("CSV error: {_0}")]
    Csv(csv::Error),
    /// A procedure needs a column the input file does not have.
    #[display("missing column '{}'", column.header())]
    #[from(skip)]
    MissingColumn { column: Column },
}

/// A column name that matches no known header or alias.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown column '{name}'")]
pub struct UnknownColumn {
    pub name: String,
}
