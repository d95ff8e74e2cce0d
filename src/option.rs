/// Maximum number of rows a single batch may hold.
pub const MAX_ROW_COUNT: usize = 65_536;

/// Maximum size, in bytes, of any single value buffer.
pub const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Capacity bounds applied to one row set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSetOptions {
    pub(crate) max_rows: usize,
    pub(crate) max_buffer_bytes: usize,
}

impl Default for RowSetOptions {
    fn default() -> Self {
        RowSetOptions {
            max_rows: MAX_ROW_COUNT,
            max_buffer_bytes: MAX_BUFFER_SIZE,
        }
    }
}

impl RowSetOptions {
    pub fn max_rows(self, max_rows: usize) -> Self {
        RowSetOptions { max_rows, ..self }
    }

    pub fn max_buffer_bytes(self, max_buffer_bytes: usize) -> Self {
        RowSetOptions {
            max_buffer_bytes,
            ..self
        }
    }

    pub fn row_limit(&self) -> usize {
        self.max_rows
    }

    pub fn buffer_limit(&self) -> usize {
        self.max_buffer_bytes
    }
}
