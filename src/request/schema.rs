/// Column types the schema compiler knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Auto-incrementing integer primary key.
    Increments,
    /// Auto-incrementing 64-bit primary key.
    BigIncrements,
    Integer,
    BigInteger,
    /// Variable-length string with a maximum length.
    String(u32),
    Text,
    Boolean,
    Float,
    Timestamp,
    Binary,
}

impl ColumnType {
    #[must_use]
    pub fn is_auto_increment(self) -> bool {
        matches!(self, ColumnType::Increments | ColumnType::BigIncrements)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    /// `Some(true)` renders ` null`, `Some(false)` renders ` not null`, `None` renders nothing.
    pub nullable: Option<bool>,
}

impl ColumnDef {
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: None,
        }
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = Some(true);
        self
    }

    #[must_use]
    pub fn not_nullable(mut self) -> Self {
        self.nullable = Some(false);
        self
    }
}

/// Schema operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaRequest {
    CreateTable {
        table: String,
        columns: Vec<ColumnDef>,
        quote_identifiers: Option<bool>,
    },
    DropTable {
        table: String,
        if_exists: bool,
        quote_identifiers: Option<bool>,
    },
}

impl SchemaRequest {
    #[must_use]
    pub fn create_table(table: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        SchemaRequest::CreateTable {
            table: table.into(),
            columns,
            quote_identifiers: None,
        }
    }

    #[must_use]
    pub fn drop_table(table: impl Into<String>) -> Self {
        SchemaRequest::DropTable {
            table: table.into(),
            if_exists: false,
            quote_identifiers: None,
        }
    }

    #[must_use]
    pub fn drop_table_if_exists(table: impl Into<String>) -> Self {
        SchemaRequest::DropTable {
            table: table.into(),
            if_exists: true,
            quote_identifiers: None,
        }
    }

    /// Override identifier quoting for this request.
    #[must_use]
    pub fn quote(mut self, enabled: bool) -> Self {
        match &mut self {
            SchemaRequest::CreateTable {
                quote_identifiers, ..
            }
            | SchemaRequest::DropTable {
                quote_identifiers, ..
            } => *quote_identifiers = Some(enabled),
        }
        self
    }

    #[must_use]
    pub fn quote_identifiers(&self) -> Option<bool> {
        match self {
            SchemaRequest::CreateTable {
                quote_identifiers, ..
            }
            | SchemaRequest::DropTable {
                quote_identifiers, ..
            } => *quote_identifiers,
        }
    }
}
