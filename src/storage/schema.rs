//! Catalog schema definitions
//!
//! Table and column names follow the Core Data layout of `Photos.sqlite`.
//! Only the columns relink reads or writes are declared here.

pub const BOOKMARK_TABLE: &str = "ZFILESYSTEMBOOKMARK";
pub const VOLUME_TABLE: &str = "ZFILESYSTEMVOLUME";
pub const RESOURCE_TABLE: &str = "ZINTERNALRESOURCE";
pub const PRIMARY_KEY_TABLE: &str = "Z_PRIMARYKEY";

/// Tables a catalog must have before relink touches it
pub const REQUIRED_TABLES: &[&str] = &[BOOKMARK_TABLE, VOLUME_TABLE, RESOURCE_TABLE, PRIMARY_KEY_TABLE];

/// Entity name of volume rows in `Z_PRIMARYKEY`
pub const ENTITY_FILE_SYSTEM_VOLUME: &str = "FileSystemVolume";

/// SQL to create the bookmark table
pub const CREATE_BOOKMARK_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS ZFILESYSTEMBOOKMARK (
    Z_PK INTEGER PRIMARY KEY,
    Z_ENT INTEGER,
    Z_OPT INTEGER,
    ZPATHRELATIVETOVOLUME VARCHAR,
    ZBOOKMARKDATA BLOB
)
"#;

/// SQL to create the volume table
pub const CREATE_VOLUME_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS ZFILESYSTEMVOLUME (
    Z_PK INTEGER PRIMARY KEY,
    Z_ENT INTEGER,
    Z_OPT INTEGER,
    ZNAME VARCHAR,
    ZUUID VARCHAR,
    ZVOLUMEUUIDSTRING VARCHAR
)
"#;

/// SQL to create the resource table linking assets to bookmarks and volumes
pub const CREATE_RESOURCE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS ZINTERNALRESOURCE (
    Z_PK INTEGER PRIMARY KEY,
    Z_ENT INTEGER,
    Z_OPT INTEGER,
    ZFILESYSTEMBOOKMARK INTEGER,
    ZFILESYSTEMVOLUME INTEGER
)
"#;

/// SQL to create the entity registry and primary-key counters
pub const CREATE_PRIMARY_KEY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS Z_PRIMARYKEY (
    Z_ENT INTEGER PRIMARY KEY,
    Z_NAME VARCHAR,
    Z_SUPER INTEGER,
    Z_MAX INTEGER
)
"#;

/// Entity registry rows for a freshly created catalog
pub const SEED_ENTITIES: &[(i64, &str)] = &[
    (22, "FileSystemBookmark"),
    (23, "FileSystemVolume"),
    (31, "InternalResource"),
];

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS Z_INTERNALRESOURCE_FILESYSTEMBOOKMARK ON ZINTERNALRESOURCE (ZFILESYSTEMBOOKMARK)",
    "CREATE INDEX IF NOT EXISTS Z_INTERNALRESOURCE_FILESYSTEMVOLUME ON ZINTERNALRESOURCE (ZFILESYSTEMVOLUME)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_BOOKMARK_TABLE,
        CREATE_VOLUME_TABLE,
        CREATE_RESOURCE_TABLE,
        CREATE_PRIMARY_KEY_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
